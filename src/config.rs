//! Client configuration.

use std::time::Duration;

/// Default time allowed for the connection to open.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default backend base URL.
pub const DEFAULT_BASE_URL: &str = "ws://127.0.0.1:8000";

/// Endpoint path of the document generation socket.
pub const DEFAULT_DOCUMENT_PATH: &str = "/lexer/api/ws/document";

/// Environment variable read by [`ClientConfig::from_env`].
pub const BASE_URL_ENV: &str = "DRAFTWIRE_WS_BASE_URL";

/// Configuration for a [`DocumentClient`](crate::DocumentClient).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Full WebSocket URL of the document endpoint.
    pub url: String,
    /// Timeout for the connect phase only.
    pub connect_timeout: Duration,
}

impl ClientConfig {
    /// Config for an explicit endpoint URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Config for a backend base URL; appends [`DEFAULT_DOCUMENT_PATH`].
    pub fn from_base_url(base_url: &str) -> Self {
        Self::new(format!(
            "{}{}",
            base_url.trim_end_matches('/'),
            DEFAULT_DOCUMENT_PATH
        ))
    }

    /// Config from `DRAFTWIRE_WS_BASE_URL`, falling back to [`DEFAULT_BASE_URL`].
    pub fn from_env() -> Self {
        match std::env::var(BASE_URL_ENV) {
            Ok(base) if !base.trim().is_empty() => Self::from_base_url(base.trim()),
            _ => Self::default(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::from_base_url(DEFAULT_BASE_URL)
    }
}
