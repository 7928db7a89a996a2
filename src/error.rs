//! Error types for contextguard
//!
//! Follows the gateway's fail-open/fail-closed split:
//! - Policy decisions fail closed
//! - Everything auxiliary (logging, remote sink, config I/O) fails open

use thiserror::Error;

/// Result type for gateway operations
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// Top-level error type for contextguard
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum GatewayError {
    /// Invalid or missing configuration (bad `--config` path, malformed JSON)
    #[error("configuration error: {message}")]
    Configuration {
        message: String,
        key: Option<String>,
    },

    /// Failed to spawn the child MCP server
    #[error("failed to spawn child process: {message}")]
    Spawn { message: String },

    /// Transport-level I/O failure on either stdio direction
    #[error("transport error: {message}")]
    Transport { message: String },

    /// Serialization/deserialization failure
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GatewayError {
    /// Construct a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            key: None,
        }
    }

    /// Construct a configuration error naming the offending key
    pub fn configuration_with_key(message: impl Into<String>, key: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Construct a spawn error
    pub fn spawn(message: impl Into<String>) -> Self {
        Self::Spawn {
            message: message.into(),
        }
    }

    /// Construct a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// User-facing, detail-free message suitable for a one-line stderr report
    pub fn sanitize(&self) -> String {
        match self {
            Self::Configuration { .. } => "configuration error".to_string(),
            Self::Spawn { .. } => "failed to start child server".to_string(),
            Self::Transport { .. } => "transport error".to_string(),
            Self::Serialization(_) => "serialization error".to_string(),
            Self::Io(_) => "I/O error".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_error_carries_key() {
        let err = GatewayError::configuration_with_key("bad value", "maxToolCallsPerMinute");
        match err {
            GatewayError::Configuration { message, key } => {
                assert_eq!(message, "bad value");
                assert_eq!(key, Some("maxToolCallsPerMinute".to_string()));
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn sanitize_hides_details() {
        let err = GatewayError::configuration_with_key("API key leaked here", "logPath");
        assert_eq!(err.sanitize(), "configuration error");
        assert!(!err.sanitize().contains("leaked"));
    }
}
