//! Selection of the next segment to read from.

use std::sync::atomic::{AtomicUsize, Ordering};

/// The view of a segment reader the [`Orderer`] needs.
pub trait SegmentReader {
    /// Returns true if a read would complete without waiting on the store.
    fn can_read_without_blocking(&self) -> bool;

    /// Starts filling the reader's buffer in the background.
    ///
    /// Must not block, and may be called repeatedly.
    fn fill_buffer(&self);
}

/// Chooses which segment a reader should read from next.
///
/// Segments that can be read without blocking are preferred. Every segment
/// passed over on the way to a ready one is asked to prefetch, so it is
/// likely to be ready the next time around. If no segment is ready, each one
/// is asked to prefetch once and the orderer falls back to the plain
/// round-robin choice, which guarantees every segment is eventually read.
///
/// The orderer keeps a single rotating position and is safe to share
/// between threads.
#[derive(Debug, Default)]
pub struct Orderer {
    counter: AtomicUsize,
}

impl Orderer {
    /// Creates an orderer at the start of its rotation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an orderer whose rotation continues after `position`.
    ///
    /// The first segment considered is the one at `position + 1`.
    pub fn with_position(position: usize) -> Self {
        Self {
            counter: AtomicUsize::new(position),
        }
    }

    /// Returns the segment to read from next, or `None` if `segments` is empty.
    pub fn next_segment<'a, S: SegmentReader>(&self, segments: &'a [S]) -> Option<&'a S> {
        self.next_index(segments).map(|index| &segments[index])
    }

    /// Returns the index of the segment to read from next, or `None` if
    /// `segments` is empty.
    pub fn next_index<S: SegmentReader>(&self, segments: &[S]) -> Option<usize> {
        if segments.is_empty() {
            return None;
        }

        for _ in 0..segments.len() {
            let index = self.advance() % segments.len();
            let candidate = &segments[index];
            if candidate.can_read_without_blocking() {
                return Some(index);
            }
            candidate.fill_buffer();
        }

        Some(self.advance() % segments.len())
    }

    /// Moves the rotation forward and returns the new position.
    fn advance(&self) -> usize {
        self.counter.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
    }
}
