//! The per-segment backend contract.

use crate::error::StorageResult;
use bytes::Bytes;

/// Where one segment keeps its bytes.
///
/// A backend is append-only: bytes land at the current length and stay there
/// until the backend is dropped. The segment store decides offsets, sealing
/// and merging and calls into the backend with its segment lock held, so
/// implementations never see concurrent mutation.
///
/// Contract:
///
/// - `append` places `data` at `length()` and returns that offset; on error
///   the length is unchanged
/// - `read` returns exactly the bytes of `[offset, offset + len)`
/// - once `seal` succeeds every later `append` fails with
///   [`StorageError::Sealed`](crate::StorageError::Sealed)
pub trait StorageBackend: Send + Sync {
    /// Current length in bytes.
    fn length(&self) -> u64;

    /// Returns the bytes of `[offset, offset + len)`.
    ///
    /// # Errors
    ///
    /// [`StorageError::OutOfRange`](crate::StorageError::OutOfRange) if the
    /// range ends past `length()`, or any backend failure.
    fn read(&self, offset: u64, len: usize) -> StorageResult<Bytes>;

    /// Appends `data` and returns the offset it starts at.
    ///
    /// # Errors
    ///
    /// Fails if the backend is sealed or cannot take the bytes.
    fn append(&mut self, data: Bytes) -> StorageResult<u64>;

    /// Makes every appended byte durable and refuses further appends.
    ///
    /// # Errors
    ///
    /// Fails if the backend is already sealed or cannot persist its bytes.
    fn seal(&mut self) -> StorageResult<()>;

    /// Returns true once `seal` has succeeded.
    fn is_sealed(&self) -> bool;
}
