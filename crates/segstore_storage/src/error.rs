//! Errors raised by storage backends.

use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors raised by storage backends.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not read or write its medium.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A read range ends past the stored bytes.
    #[error("range {offset}+{len} is outside the {length} stored bytes")]
    OutOfRange {
        /// Start of the requested range.
        offset: u64,
        /// Requested length.
        len: usize,
        /// Stored length at the time of the read.
        length: u64,
    },

    /// The backend was sealed and takes no more bytes.
    #[error("backend is sealed at length {length}")]
    Sealed {
        /// Final length.
        length: u64,
    },
}
