//! The read result sequence.

use crate::pending::Pending;
use crate::read::entry::{DataEntry, EndOfSegmentEntry, ReadResultEntry};
use bytes::Bytes;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Snapshot of a segment's end at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentTail {
    /// Length of the segment.
    pub length: u64,
    /// Whether the segment is sealed.
    pub sealed: bool,
}

/// The segment side of a [`ReadResult`].
///
/// Implemented by segment stores; a read result only ever asks for the
/// current tail and for byte ranges below it.
pub trait ReadSource: Send + Sync {
    /// Returns the segment name.
    fn name(&self) -> &str;

    /// Returns the current tail, or `None` once the segment no longer exists.
    fn tail(&self) -> Option<SegmentTail>;

    /// Fetches `length` bytes starting at `offset`.
    fn fetch(&self, offset: u64, length: usize, timeout: Duration) -> Pending<Bytes>;
}

/// A lazy, pull-based sequence of entries for one read call.
///
/// Every call to [`Iterator::next`] looks at the segment's current tail:
///
/// - below the tail, a [`ReadResultEntry::Data`] entry covers everything
///   available up to the remaining requested length;
/// - at or past the tail, a [`ReadResultEntry::EndOfSegment`] entry is
///   produced and the sequence ends;
/// - the sequence also ends once `max_length` bytes have been covered or the
///   segment disappears.
///
/// A read result cannot be restarted; issue a new read instead.
pub struct ReadResult {
    source: Arc<dyn ReadSource>,
    start_offset: u64,
    max_length: usize,
    consumed: usize,
    finished: bool,
}

impl ReadResult {
    /// Creates a read result over `source` for `[start_offset, start_offset + max_length)`.
    pub fn new(source: Arc<dyn ReadSource>, start_offset: u64, max_length: usize) -> Self {
        Self {
            source,
            start_offset,
            max_length,
            consumed: 0,
            finished: false,
        }
    }

    /// Returns the name of the segment being read.
    pub fn segment_name(&self) -> &str {
        self.source.name()
    }

    /// Returns the offset the read started at.
    pub fn start_offset(&self) -> u64 {
        self.start_offset
    }

    /// Returns the maximum number of bytes this read may cover.
    pub fn max_result_length(&self) -> usize {
        self.max_length
    }

    /// Returns the number of bytes covered by data entries so far.
    pub fn consumed_length(&self) -> usize {
        self.consumed
    }

    /// Returns true once the sequence has ended.
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl Iterator for ReadResult {
    type Item = ReadResultEntry;

    fn next(&mut self) -> Option<ReadResultEntry> {
        if self.finished {
            return None;
        }
        if self.consumed >= self.max_length {
            self.finished = true;
            return None;
        }

        let offset = self.start_offset + self.consumed as u64;
        let remaining = self.max_length - self.consumed;

        let Some(tail) = self.source.tail() else {
            self.finished = true;
            return None;
        };

        if offset >= tail.length {
            self.finished = true;
            return Some(ReadResultEntry::EndOfSegment(EndOfSegmentEntry::new(
                offset,
                remaining,
                tail.sealed,
            )));
        }

        let available = (tail.length - offset).min(remaining as u64) as usize;
        self.consumed += available;
        Some(ReadResultEntry::Data(DataEntry::new(
            offset,
            remaining,
            available,
            Arc::clone(&self.source),
        )))
    }
}

impl fmt::Debug for ReadResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadResult")
            .field("segment", &self.source.name())
            .field("start_offset", &self.start_offset)
            .field("max_length", &self.max_length)
            .field("consumed", &self.consumed)
            .field("finished", &self.finished)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, SegmentError};
    use parking_lot::Mutex;

    /// A growable in-test segment.
    struct VecSource {
        data: Mutex<Vec<u8>>,
        sealed: Mutex<bool>,
        gone: Mutex<bool>,
    }

    impl VecSource {
        fn new(data: &[u8]) -> Arc<Self> {
            Arc::new(Self {
                data: Mutex::new(data.to_vec()),
                sealed: Mutex::new(false),
                gone: Mutex::new(false),
            })
        }
    }

    impl ReadSource for VecSource {
        fn name(&self) -> &str {
            "test"
        }

        fn tail(&self) -> Option<SegmentTail> {
            if *self.gone.lock() {
                return None;
            }
            Some(SegmentTail {
                length: self.data.lock().len() as u64,
                sealed: *self.sealed.lock(),
            })
        }

        fn fetch(&self, offset: u64, length: usize, _timeout: Duration) -> Pending<Bytes> {
            let data = self.data.lock();
            let start = offset as usize;
            let result = data
                .get(start..start + length)
                .map(Bytes::copy_from_slice)
                .ok_or_else(|| SegmentError::not_found("test"));
            Pending::ready("read", result)
        }
    }

    const TIMEOUT: Duration = Duration::from_secs(1);

    #[tokio::test]
    async fn data_then_end_of_segment() {
        let source = VecSource::new(b"hello world");
        let mut result = ReadResult::new(source, 6, 100);

        let entry = result.next().unwrap();
        assert!(!entry.is_end_of_segment());
        assert_eq!(entry.offset(), 6);
        assert_eq!(entry.requested_length(), 100);
        let content = entry.content(TIMEOUT).unwrap().await.unwrap();
        assert_eq!(&content[..], b"world");

        let end = result.next().unwrap();
        assert!(end.is_end_of_segment());
        assert_eq!(end.offset(), 11);
        assert_eq!(end.requested_length(), 95);

        assert!(result.next().is_none());
        assert!(result.is_finished());
        assert_eq!(result.consumed_length(), 5);
    }

    #[test]
    fn stops_after_max_length() {
        let source = VecSource::new(b"0123456789");
        let mut result = ReadResult::new(source, 2, 4);

        match result.next().unwrap() {
            ReadResultEntry::Data(entry) => {
                assert_eq!(entry.offset(), 2);
                assert_eq!(entry.length(), 4);
            }
            ReadResultEntry::EndOfSegment(_) => panic!("expected data"),
        }
        assert!(result.next().is_none());
    }

    #[test]
    fn picks_up_bytes_appended_between_pulls() {
        let source = VecSource::new(b"abc");
        let mut result = ReadResult::new(Arc::clone(&source) as Arc<dyn ReadSource>, 0, 10);

        assert_eq!(result.next().unwrap().offset(), 0);
        source.data.lock().extend_from_slice(b"def");

        match result.next().unwrap() {
            ReadResultEntry::Data(entry) => {
                assert_eq!(entry.offset(), 3);
                assert_eq!(entry.length(), 3);
            }
            ReadResultEntry::EndOfSegment(_) => panic!("expected data"),
        }
        assert!(result.next().unwrap().is_end_of_segment());
    }

    #[test]
    fn end_of_segment_reports_seal_state() {
        let source = VecSource::new(b"abc");
        let mut unsealed = ReadResult::new(Arc::clone(&source) as Arc<dyn ReadSource>, 3, 1);
        match unsealed.next().unwrap() {
            ReadResultEntry::EndOfSegment(entry) => assert!(!entry.is_sealed()),
            ReadResultEntry::Data(_) => panic!("expected end of segment"),
        }

        *source.sealed.lock() = true;
        let mut sealed = ReadResult::new(source, 10, 1);
        match sealed.next().unwrap() {
            ReadResultEntry::EndOfSegment(entry) => {
                assert!(entry.is_sealed());
                assert_eq!(entry.offset(), 10);
            }
            ReadResultEntry::Data(_) => panic!("expected end of segment"),
        }
    }

    #[test]
    fn end_of_segment_content_is_illegal() {
        let mut result = ReadResult::new(VecSource::new(b""), 0, 8);
        let entry = result.next().unwrap();

        let err = entry.content(TIMEOUT).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IllegalState);
    }

    #[test]
    fn vanished_segment_ends_sequence() {
        let source = VecSource::new(b"abc");
        let mut result = ReadResult::new(Arc::clone(&source) as Arc<dyn ReadSource>, 0, 10);
        *source.gone.lock() = true;

        assert!(result.next().is_none());
        assert!(result.is_finished());
    }
}
