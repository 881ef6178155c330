//! The segment store contract and its in-process implementation.

mod local;
mod state;
mod validate;

pub use local::{default_backend_factory, BackendFactory, LocalSegmentStore};

use crate::error::SegmentResult;
use crate::pending::Pending;
use crate::read::ReadResult;
use crate::types::SegmentInfo;
use bytes::Bytes;
use std::time::Duration;

/// Defines all operations supported on segments.
///
/// # Call Contract
///
/// Every operation returns immediately. Invalid arguments are rejected
/// synchronously with [`crate::SegmentError::InvalidArgument`]; everything
/// else, including not-found, sealed and timeout failures, is delivered
/// through the returned [`Pending`] result.
///
/// Each operation takes a timeout. When it elapses the pending result fails
/// with [`crate::SegmentError::Timeout`], but the operation itself is not
/// cancelled and still takes effect atomically or not at all.
///
/// # Invariants
///
/// - Segment names are unique among existing segments
/// - Offsets returned by `append` and `merge_batch` for one segment are
///   unique and their ranges never overlap; the order between concurrent
///   appends is unspecified
/// - Sealed segments reject appends and merges; sealing is irrevocable
/// - A batch merges into its parent only after it is sealed, and only once
pub trait SegmentStore: Send + Sync {
    /// Creates a new, empty segment.
    ///
    /// Fails with `SegmentExists` if the name is taken.
    fn create_segment(&self, name: &str, timeout: Duration) -> SegmentResult<Pending<()>>;

    /// Appends `data` at the end of the segment as one contiguous block.
    ///
    /// Resolves to the offset where the data starts. Fails with
    /// `SegmentNotFound` or `SegmentSealed`.
    fn append(&self, name: &str, data: Bytes, timeout: Duration) -> SegmentResult<Pending<u64>>;

    /// Starts a read of up to `max_length` bytes at `offset`.
    ///
    /// Resolves to a lazy [`ReadResult`]. Fails with `SegmentNotFound`.
    fn read(
        &self,
        name: &str,
        offset: u64,
        max_length: usize,
        timeout: Duration,
    ) -> SegmentResult<Pending<ReadResult>>;

    /// Gets information about a segment.
    fn get_info(&self, name: &str, timeout: Duration) -> SegmentResult<Pending<SegmentInfo>>;

    /// Seals a segment for modifications.
    ///
    /// Resolves to the final length. Sealing an already sealed segment fails
    /// with `SegmentSealed`.
    fn seal_segment(&self, name: &str, timeout: Duration) -> SegmentResult<Pending<u64>>;

    /// Creates a new batch mapped to `parent`.
    ///
    /// Resolves to the batch name.
    fn create_batch(&self, parent: &str, timeout: Duration) -> SegmentResult<Pending<String>>;

    /// Merges a sealed batch into its parent.
    ///
    /// Resolves to the offset in the parent where the batch's bytes were
    /// placed. Afterwards the batch no longer exists.
    fn merge_batch(&self, batch: &str, timeout: Duration) -> SegmentResult<Pending<u64>>;

    /// Deletes a segment, and any batches still mapped to it.
    fn delete_segment(&self, name: &str, timeout: Duration) -> SegmentResult<Pending<()>>;
}
