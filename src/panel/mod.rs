pub mod binding;
pub mod controller;
pub mod status;
pub mod types;
pub mod view;
