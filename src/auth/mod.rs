pub mod browser;
pub mod federated;
pub mod firebase;
pub mod messages;
pub mod provider;
pub mod types;
