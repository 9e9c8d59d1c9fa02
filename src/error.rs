//! Error types for draftwire-client.

use std::time::Duration;

use thiserror::Error;

/// Failure to open the transport.
///
/// `Clone` so one single-flight attempt can hand the same outcome to every
/// caller awaiting it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    /// The connection did not open within the configured timeout.
    #[error("WebSocket connection timeout after {0:?}")]
    Timeout(Duration),

    /// The transport refused or failed to open.
    #[error("WebSocket connection failed: {0}")]
    Failure(String),
}

/// Main error type for all draftwire operations.
#[derive(Debug, Error)]
pub enum DraftwireError {
    /// Connect phase failed (timeout or open failure).
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// JSON serialization error while encoding an outbound request.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Socket-level error while a request was streaming.
    #[error("Stream error: {0}")]
    Stream(String),

    /// No open transport to send on.
    #[error("Not connected")]
    NotConnected,

    /// The connection was torn down by `disconnect()` before the request resolved.
    #[error("Disconnected before the request resolved")]
    Disconnected,
}

impl DraftwireError {
    /// True if this is a connect timeout.
    pub fn is_connect_timeout(&self) -> bool {
        matches!(self, DraftwireError::Connect(ConnectError::Timeout(_)))
    }
}

/// Result type alias using DraftwireError.
pub type Result<T> = std::result::Result<T, DraftwireError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_timeout_is_detected() {
        let err: DraftwireError = ConnectError::Timeout(Duration::from_secs(10)).into();
        assert!(err.is_connect_timeout());
        assert_eq!(err.to_string(), "WebSocket connection timeout after 10s");
    }

    #[test]
    fn test_connect_failure_is_not_timeout() {
        let err: DraftwireError = ConnectError::Failure("refused".into()).into();
        assert!(!err.is_connect_timeout());
        assert_eq!(err.to_string(), "WebSocket connection failed: refused");
    }
}
