//! Lazy read results.
//!
//! A read against a segment produces a [`ReadResult`]: a pull-based,
//! finite sequence of [`ReadResultEntry`] values covering the requested
//! range. Data entries carry a deferred content accessor; the
//! end-of-segment entry carries none and ends the sequence.
//!
//! ```text
//! read(offset = 10, max_length = 100) on a segment of length 50
//!
//!   Data { offset 10, length 40 }      content() -> Pending<Bytes>
//!   EndOfSegment { offset 50 }         content() -> Err(IllegalState)
//! ```

mod entry;
mod result;

pub use entry::{DataEntry, EndOfSegmentEntry, ReadResultEntry};
pub use result::{ReadResult, ReadSource, SegmentTail};
