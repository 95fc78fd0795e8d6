pub mod application;
pub mod style;
pub mod types;
pub mod updates;
