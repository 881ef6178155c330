//! Error types for the client.

use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in client operations.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The segment store reported a failure.
    #[error("segment store error: {0}")]
    Store(#[from] segstore_core::SegmentError),

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        /// Description of the invalid value.
        message: String,
    },

    /// No tokio runtime was available for background reads.
    #[error("no async runtime available: {message}")]
    NoRuntime {
        /// Description from the runtime lookup.
        message: String,
    },
}

impl ClientError {
    /// Creates an invalid configuration error.
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            message: message.into(),
        }
    }

    /// Returns true if the error can be retried after the condition clears.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Store(err) => err.kind() == segstore_core::ErrorKind::Timeout,
            ClientError::InvalidConfiguration { .. } | ClientError::NoRuntime { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use segstore_core::SegmentError;
    use std::time::Duration;

    #[test]
    fn retryable_errors() {
        let timeout = ClientError::from(SegmentError::Timeout {
            operation: "read",
            timeout: Duration::from_secs(1),
        });
        assert!(timeout.is_retryable());
        assert!(!ClientError::from(SegmentError::not_found("s")).is_retryable());
        assert!(!ClientError::invalid_configuration("bad").is_retryable());
    }

    #[test]
    fn error_display() {
        let err = ClientError::from(SegmentError::sealed("orders"));
        assert_eq!(err.to_string(), "segment store error: segment is sealed: orders");
    }
}
