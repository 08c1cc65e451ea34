//! Error types for hbase-link.

use thiserror::Error;

/// Result type for hbase-link operations
pub type Result<T> = std::result::Result<T, HBaseLinkError>;

/// Errors that can occur while talking to the HBase REST gateway
#[derive(Debug, Clone, Error)]
pub enum HBaseLinkError {
    /// A required scan option (the table name) is absent or empty
    #[error("Missing required option \"{0}\"")]
    MissingRequiredOption(String),

    /// A scanner operation was invoked in a phase that does not allow it
    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    /// The underlying put/get/delete call failed
    #[error("Transport error: {0}")]
    TransportError(String),

    /// The gateway answered with a non-success status
    #[error("Server error ({status_code}): {message}")]
    ServerError { status_code: u16, message: String },

    /// A filter leaf carries a value that cannot be encoded
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    /// A value is not representable in the requested encoding
    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Timeout: {0}")]
    TimeoutError(String),
}

impl HBaseLinkError {
    /// True for errors raised by the transport collaborator rather than by the
    /// scanner itself.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::TransportError(_) | Self::ServerError { .. } | Self::TimeoutError(_)
        )
    }
}

impl From<reqwest::Error> for HBaseLinkError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            HBaseLinkError::TimeoutError(err.to_string())
        } else {
            HBaseLinkError::TransportError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for HBaseLinkError {
    fn from(err: serde_json::Error) -> Self {
        HBaseLinkError::SerializationError(err.to_string())
    }
}
