//! Reading several segments as one sequence.

use crate::config::ReaderConfig;
use crate::error::ClientResult;
use crate::input_stream::{SegmentChunk, SegmentInputStream};
use crate::orderer::{Orderer, SegmentReader};
use segstore_core::SegmentStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Reads chunks from a set of segments.
///
/// The [`Orderer`] decides which segment to read next. Segments that are
/// sealed and fully read are dropped from the set; the reader is finished
/// once none are left.
#[derive(Debug)]
pub struct EventReader {
    streams: Vec<SegmentInputStream>,
    orderer: Orderer,
    poll_interval: Duration,
}

impl EventReader {
    /// Creates a reader over existing streams.
    pub fn new(streams: Vec<SegmentInputStream>, config: &ReaderConfig) -> Self {
        Self {
            streams,
            orderer: Orderer::new(),
            poll_interval: config.poll_interval,
        }
    }

    /// Opens a stream at offset zero for each of `segments`.
    pub fn open<I, S>(store: Arc<dyn SegmentStore>, segments: I, config: ReaderConfig) -> ClientResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let streams = segments
            .into_iter()
            .map(|segment| SegmentInputStream::new(Arc::clone(&store), segment, 0, config.clone()))
            .collect::<ClientResult<Vec<_>>>()?;
        Ok(Self::new(streams, &config))
    }

    /// Adds a stream to the set.
    pub fn add_stream(&mut self, stream: SegmentInputStream) {
        self.streams.push(stream);
    }

    /// Returns the names of the segments still being read.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.streams.iter().map(SegmentInputStream::segment)
    }

    /// Returns true once every segment has been read to its sealed end.
    pub fn is_finished(&self) -> bool {
        self.streams.is_empty()
    }

    /// Returns the next chunk from any segment.
    ///
    /// Returns `Ok(None)` if nothing arrived within `timeout` or the reader
    /// is finished; use [`is_finished`](Self::is_finished) to tell the two
    /// apart. A failure of the chosen segment is returned as is and leaves
    /// the segment in the set.
    pub async fn read_next(&mut self, timeout: Duration) -> ClientResult<Option<SegmentChunk>> {
        let deadline = Instant::now().checked_add(timeout);

        loop {
            let Some(index) = self.orderer.next_index(&self.streams) else {
                return Ok(None);
            };

            let stream = &self.streams[index];
            let outcome = if stream.can_read_without_blocking() {
                stream.read().await
            } else {
                // Wait a little on this segment, then give the others a turn.
                let slice_end = Instant::now() + self.poll_interval.max(Duration::from_millis(1));
                let wait_until = deadline.map_or(slice_end, |d| d.min(slice_end));
                match tokio::time::timeout_at(wait_until, stream.read()).await {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        if deadline.is_some_and(|d| Instant::now() >= d) {
                            return Ok(None);
                        }
                        continue;
                    }
                }
            };

            match outcome? {
                Some(chunk) => return Ok(Some(chunk)),
                None => {
                    let finished = self.streams.remove(index);
                    debug!(segment = finished.segment(), "segment read to end");
                }
            }
        }
    }
}
