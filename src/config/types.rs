use serde::{Deserialize, Serialize};

pub const DEFAULT_AUTH_ENDPOINT: &str = "https://identitytoolkit.googleapis.com/v1";
pub const DEFAULT_TOKEN_ENDPOINT: &str = "https://securetoken.googleapis.com/v1";

/// How device commands reach the heating pad controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum TransportKind {
    /// Write flags to the realtime database, the device polls it
    RemoteStore,
    /// Call the device's own web server
    DirectHttp,
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let result = match self {
            TransportKind::RemoteStore => "remote store",
            TransportKind::DirectHttp => "direct HTTP",
        };

        write!(f, "{}", result)
    }
}

fn default_auth_endpoint() -> String {
    DEFAULT_AUTH_ENDPOINT.to_string()
}

fn default_token_endpoint() -> String {
    DEFAULT_TOKEN_ENDPOINT.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_auth_endpoint")]
    pub auth_endpoint: String,
    #[serde(default = "default_token_endpoint")]
    pub token_endpoint: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        IdentityConfig {
            api_key: String::new(),
            auth_endpoint: default_auth_endpoint(),
            token_endpoint: default_token_endpoint(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteStoreConfig {
    #[serde(default)]
    pub database_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    // there is deliberately no default transport, it must be chosen
    #[serde(default)]
    pub transport: Option<TransportKind>,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub remote_store: RemoteStoreConfig,
    // manually entered address of the device, e.g. "192.168.1.40"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_address: Option<String>,
}
