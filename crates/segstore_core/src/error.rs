//! Error types for segment store operations.

use std::time::Duration;
use thiserror::Error;

/// Result type for segment store operations.
pub type SegmentResult<T> = Result<T, SegmentError>;

/// Broad classification of a [`SegmentError`].
///
/// Usage errors are returned synchronously when an operation is issued.
/// Everything else arrives through the operation's [`crate::Pending`] result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid arguments; the caller's responsibility to avoid.
    Usage,
    /// The segment is not in a state that permits the operation.
    State,
    /// The operation's deadline elapsed.
    Timeout,
    /// A contract violation by the calling code, such as reading content
    /// from an end-of-segment entry.
    IllegalState,
    /// A storage backend or runtime failure.
    Internal,
}

/// Errors that can occur in segment store operations.
#[derive(Debug, Error)]
pub enum SegmentError {
    /// An argument was rejected before any work started.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of the rejected argument.
        message: String,
    },

    /// The segment (or batch) does not exist.
    #[error("segment not found: {name}")]
    SegmentNotFound {
        /// Name of the segment.
        name: String,
    },

    /// A segment with this name already exists.
    #[error("segment already exists: {name}")]
    SegmentExists {
        /// Name of the segment.
        name: String,
    },

    /// The segment is sealed and rejects the modification.
    #[error("segment is sealed: {name}")]
    SegmentSealed {
        /// Name of the sealed segment.
        name: String,
    },

    /// A merge was requested for a batch that is not sealed yet.
    #[error("batch is not sealed: {name}")]
    BatchNotSealed {
        /// Name of the batch.
        name: String,
    },

    /// Operation not permitted for this kind of segment.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why the operation is invalid.
        message: String,
    },

    /// The operation did not complete before its deadline.
    ///
    /// The underlying work may still complete in the background.
    #[error("{operation} timed out after {timeout:?}")]
    Timeout {
        /// Name of the operation that timed out.
        operation: &'static str,
        /// The timeout that elapsed.
        timeout: Duration,
    },

    /// The calling code violated an access contract.
    #[error("illegal state: {message}")]
    IllegalState {
        /// Description of the violation.
        message: String,
    },

    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] segstore_storage::StorageError),

    /// No tokio runtime was available to run store operations.
    #[error("no async runtime available: {message}")]
    NoRuntime {
        /// Description from the runtime lookup.
        message: String,
    },

    /// The background task running the operation failed.
    #[error("background task failed: {message}")]
    TaskFailed {
        /// Description of the failure.
        message: String,
    },
}

impl SegmentError {
    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a segment not found error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::SegmentNotFound { name: name.into() }
    }

    /// Creates a segment exists error.
    pub fn exists(name: impl Into<String>) -> Self {
        Self::SegmentExists { name: name.into() }
    }

    /// Creates a segment sealed error.
    pub fn sealed(name: impl Into<String>) -> Self {
        Self::SegmentSealed { name: name.into() }
    }

    /// Creates a batch not sealed error.
    pub fn batch_not_sealed(name: impl Into<String>) -> Self {
        Self::BatchNotSealed { name: name.into() }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Creates an illegal state error.
    pub fn illegal_state(message: impl Into<String>) -> Self {
        Self::IllegalState {
            message: message.into(),
        }
    }

    /// Creates a task failed error.
    pub fn task_failed(message: impl Into<String>) -> Self {
        Self::TaskFailed {
            message: message.into(),
        }
    }

    /// Returns the classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument { .. } => ErrorKind::Usage,
            Self::SegmentNotFound { .. }
            | Self::SegmentExists { .. }
            | Self::SegmentSealed { .. }
            | Self::BatchNotSealed { .. }
            | Self::InvalidOperation { .. } => ErrorKind::State,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::IllegalState { .. } => ErrorKind::IllegalState,
            Self::Storage(_) | Self::NoRuntime { .. } | Self::TaskFailed { .. } => {
                ErrorKind::Internal
            }
        }
    }

    /// Returns true if the error reports a missing segment.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::SegmentNotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kinds() {
        assert_eq!(SegmentError::invalid_argument("x").kind(), ErrorKind::Usage);
        assert_eq!(SegmentError::not_found("a").kind(), ErrorKind::State);
        assert_eq!(SegmentError::exists("a").kind(), ErrorKind::State);
        assert_eq!(SegmentError::sealed("a").kind(), ErrorKind::State);
        assert_eq!(SegmentError::batch_not_sealed("a").kind(), ErrorKind::State);
        assert_eq!(
            SegmentError::Timeout {
                operation: "append",
                timeout: Duration::from_millis(5),
            }
            .kind(),
            ErrorKind::Timeout
        );
        assert_eq!(SegmentError::illegal_state("eos").kind(), ErrorKind::IllegalState);
        assert_eq!(SegmentError::task_failed("panic").kind(), ErrorKind::Internal);
    }

    #[test]
    fn error_display() {
        let err = SegmentError::sealed("orders");
        assert_eq!(err.to_string(), "segment is sealed: orders");

        let err = SegmentError::Timeout {
            operation: "seal",
            timeout: Duration::from_secs(1),
        };
        assert!(err.to_string().contains("seal"));
        assert!(err.to_string().contains("1s"));
    }
}
