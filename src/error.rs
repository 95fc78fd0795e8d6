use std::io;
use thiserror::Error;
use msgbox::IconType;
use std::fmt::Display;
use std::str::Utf8Error;
use iced;
use serde_json;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to determine path to config file")]
    NoConfigPath,

    #[error("Failed to acquire file lock on config file: {source}")]
    CanNotLock { source: io::Error },

    #[error("Failed to encode/decode config as utf-8: {source}")]
    Utf8Error { #[from] source: Utf8Error },

    #[error("Failed to read/write config file: {source}")]
    IOError { #[from] source: io::Error },

    #[error("Failed to parse/build config file: {source}")]
    JsonError { #[from] source: serde_json::Error },
}

impl ConfigError {
    pub fn is_file_not_found_error(&self) -> bool {
        match self {
            ConfigError::IOError { source } => source.kind() == io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppRunError {
    #[error("Failed to start application (iced): {source}")]
    Iced { #[from] source: iced::Error },

    #[error("Failed to start application (config): {source}")]
    ConfigError { #[from] source: ConfigError },

    #[error("Failed to start application (http client): {source}")]
    HttpClient { #[from] source: reqwest::Error },
}

#[derive(Error, Debug)]
pub enum LinkOpenError {
    #[error("Refusing to open a link that is not http(s)")]
    NotHttp,

    #[error("Failed to launch the browser: {source}")]
    Launch { #[from] source: io::Error },

    #[error("Failed to join the browser launch task: {source}")]
    Join { #[from] source: tokio::task::JoinError },
}

/// Errors reported by the identity provider.
///
/// `Provider` carries a provider error code such as `auth/invalid-email`; the
/// other variants are mapped onto a code by [`AuthError::code`] so that every
/// error can be run through the same user message table.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("{code}: {message}")]
    Provider { code: String, message: String },

    #[error("Failed to reach the identity provider: {source}")]
    Http { #[from] source: reqwest::Error },

    #[error("Unexpected response from the identity provider: {source}")]
    Decode { #[from] source: serde_json::Error },

    #[error("Federated sign-in failed: {reason}")]
    Federated { code: &'static str, reason: String },
}

impl AuthError {
    pub fn provider(code: &str, message: &str) -> Self {
        AuthError::Provider { code: code.to_string(), message: message.to_string() }
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            AuthError::Provider { code, .. } if !code.is_empty() => Some(code),
            AuthError::Provider { .. } => None,
            AuthError::Http { .. } => Some("auth/network-request-failed"),
            AuthError::Decode { .. } => Some("auth/internal-error"),
            AuthError::Federated { code, .. } => Some(code),
        }
    }

    pub fn message(&self) -> String {
        match self {
            AuthError::Provider { message, .. } => message.clone(),
            AuthError::Federated { reason, .. } => reason.clone(),
            other => other.to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("Unknown device: {0}")]
    UnknownDevice(String),

    #[error("Please enter device IP address")]
    MissingAddress,

    #[error("No device transport configured")]
    NotConfigured,

    #[error("Network error: {source}")]
    Network { #[from] source: reqwest::Error },

    #[error("Unexpected response from device: {0}")]
    Protocol(String),

    #[error("Device reported {status}: {message}")]
    Rejected { status: String, message: String },

    #[error("Subscription ended: {0}")]
    Subscription(String),

    #[error("Not authorized to access the remote store: {source}")]
    Auth { #[from] source: AuthError },
}

impl DeviceError {
    /// The text shown in the status line for this error.
    pub fn user_message(&self) -> String {
        match self {
            DeviceError::UnknownDevice(_) | DeviceError::MissingAddress | DeviceError::NotConfigured => self.to_string(),
            other => format!("Error: {}", other),
        }
    }
}

pub fn error_msgbox<T: Display>(message: &'static str, error: &T) {
    let message = format!("{}: {}", message, error);
    eprintln!("{}", &message);
    if let Err(err) = msgbox::create(concat!("CASH Panel ", env!("CARGO_PKG_VERSION")), &message, IconType::Error) {
        eprintln!("Failed to create msgbox: {:?}", err);
    }
}
