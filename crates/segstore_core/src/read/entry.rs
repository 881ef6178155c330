//! Read result entries.

use crate::error::{SegmentError, SegmentResult};
use crate::pending::Pending;
use crate::read::result::ReadSource;
use bytes::Bytes;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// One step of a [`crate::ReadResult`].
///
/// Callers must branch on [`ReadResultEntry::is_end_of_segment`] (or match
/// the variant) before requesting content: the end-of-segment entry has none.
#[derive(Debug)]
pub enum ReadResultEntry {
    /// A byte range that can be fetched now or later.
    Data(DataEntry),
    /// The read caught up with the current end of the segment.
    EndOfSegment(EndOfSegmentEntry),
}

impl ReadResultEntry {
    /// Returns the segment offset this entry starts at.
    pub fn offset(&self) -> u64 {
        match self {
            Self::Data(entry) => entry.offset(),
            Self::EndOfSegment(entry) => entry.offset(),
        }
    }

    /// Returns how many bytes the read still wanted when this entry was
    /// produced.
    pub fn requested_length(&self) -> usize {
        match self {
            Self::Data(entry) => entry.requested_length(),
            Self::EndOfSegment(entry) => entry.requested_length(),
        }
    }

    /// Returns true if this is the end-of-segment entry.
    pub fn is_end_of_segment(&self) -> bool {
        matches!(self, Self::EndOfSegment(_))
    }

    /// Requests the entry's content.
    ///
    /// # Errors
    ///
    /// Returns [`SegmentError::IllegalState`] for the end-of-segment entry.
    pub fn content(&self, timeout: Duration) -> SegmentResult<Pending<Bytes>> {
        match self {
            Self::Data(entry) => Ok(entry.content(timeout)),
            Self::EndOfSegment(entry) => entry.content(),
        }
    }
}

/// A read result entry backed by bytes of the segment.
pub struct DataEntry {
    offset: u64,
    requested_length: usize,
    length: usize,
    source: Arc<dyn ReadSource>,
}

impl DataEntry {
    pub(crate) fn new(
        offset: u64,
        requested_length: usize,
        length: usize,
        source: Arc<dyn ReadSource>,
    ) -> Self {
        Self {
            offset,
            requested_length,
            length,
            source,
        }
    }

    /// Returns the segment offset this entry starts at.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Returns how many bytes the read still wanted.
    pub fn requested_length(&self) -> usize {
        self.requested_length
    }

    /// Returns the number of bytes this entry covers.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Fetches the bytes `[offset, offset + length)` of the segment.
    ///
    /// The pending result fails with `SegmentNotFound` if the segment was
    /// deleted or merged away in the meantime.
    pub fn content(&self, timeout: Duration) -> Pending<Bytes> {
        self.source.fetch(self.offset, self.length, timeout)
    }
}

impl fmt::Debug for DataEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataEntry")
            .field("segment", &self.source.name())
            .field("offset", &self.offset)
            .field("requested_length", &self.requested_length)
            .field("length", &self.length)
            .finish()
    }
}

/// Read result entry with no content that marks the current end of a
/// segment.
///
/// For an unsealed segment this is a temporary condition: more bytes may be
/// appended later and a new read will return them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndOfSegmentEntry {
    offset: u64,
    requested_length: usize,
    sealed: bool,
}

impl EndOfSegmentEntry {
    pub(crate) fn new(offset: u64, requested_length: usize, sealed: bool) -> Self {
        Self {
            offset,
            requested_length,
            sealed,
        }
    }

    /// Returns the offset at which the end was observed.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Returns how many bytes the read still wanted.
    pub fn requested_length(&self) -> usize {
        self.requested_length
    }

    /// Returns true if the segment was sealed when the end was observed,
    /// meaning no more bytes will ever follow.
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Always fails: the end-of-segment entry has no content.
    ///
    /// # Errors
    ///
    /// Always returns [`SegmentError::IllegalState`].
    pub fn content(&self) -> SegmentResult<Pending<Bytes>> {
        Err(SegmentError::illegal_state(
            "end-of-segment read result entry does not have any content",
        ))
    }
}
