pub mod adapter;
pub mod constants;
pub mod direct_http;
pub mod remote_store;
pub mod types;
