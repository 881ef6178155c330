//! Buffered, prefetching reads of a single segment.

use crate::config::ReaderConfig;
use crate::error::{ClientError, ClientResult};
use crate::orderer::SegmentReader;
use bytes::{Bytes, BytesMut};
use parking_lot::Mutex;
use segstore_core::{ReadResultEntry, SegmentError, SegmentResult, SegmentStore};
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Weak};
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tracing::{debug, warn};

/// A run of bytes read from a segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentChunk {
    /// Segment the bytes were read from.
    pub segment: String,
    /// Offset of the first byte.
    pub offset: u64,
    /// The bytes.
    pub data: Bytes,
}

impl SegmentChunk {
    /// Returns the offset just past the last byte.
    pub fn end_offset(&self) -> u64 {
        self.offset + self.data.len() as u64
    }
}

/// Reads one segment sequentially, prefetching into a local buffer.
///
/// Fills run as tokio tasks. A fill that catches up with an unsealed
/// segment keeps polling the store until new bytes arrive, so a stream can
/// tail a segment that is still being written. Once a fill reaches the end
/// of a sealed segment the stream is finished.
///
/// A failed fill is reported by the next [`read`](Self::read); the read
/// after that retries from the same offset.
pub struct SegmentInputStream {
    shared: Arc<StreamShared>,
    handle: Handle,
}

struct StreamShared {
    store: Arc<dyn SegmentStore>,
    segment: String,
    config: ReaderConfig,
    state: Mutex<BufferState>,
    notify: Notify,
}

#[derive(Default)]
struct BufferState {
    chunks: VecDeque<(u64, Bytes)>,
    buffered: usize,
    read_offset: u64,
    fetch_offset: u64,
    filling: bool,
    sealed_end: bool,
    error: Option<SegmentError>,
}

struct Fetched {
    data: Bytes,
    sealed: bool,
}

impl SegmentInputStream {
    /// Opens a stream over `segment` starting at `offset`.
    ///
    /// Must be called within a tokio runtime; fills are spawned on it.
    pub fn new(
        store: Arc<dyn SegmentStore>,
        segment: impl Into<String>,
        offset: u64,
        config: ReaderConfig,
    ) -> ClientResult<Self> {
        config.validate()?;
        let handle = Handle::try_current().map_err(|e| ClientError::NoRuntime {
            message: e.to_string(),
        })?;

        Ok(Self {
            shared: Arc::new(StreamShared {
                store,
                segment: segment.into(),
                config,
                state: Mutex::new(BufferState {
                    read_offset: offset,
                    fetch_offset: offset,
                    ..BufferState::default()
                }),
                notify: Notify::new(),
            }),
            handle,
        })
    }

    /// Returns the segment name.
    pub fn segment(&self) -> &str {
        &self.shared.segment
    }

    /// Returns the offset of the next byte [`read`](Self::read) will return.
    pub fn offset(&self) -> u64 {
        self.shared.state.lock().read_offset
    }

    /// Returns the number of buffered bytes.
    pub fn buffered_len(&self) -> usize {
        self.shared.state.lock().buffered
    }

    /// Returns true once every byte of the sealed segment has been read.
    pub fn is_finished(&self) -> bool {
        let state = self.shared.state.lock();
        state.sealed_end && state.chunks.is_empty()
    }

    /// Returns the next chunk of the segment, waiting for it if necessary.
    ///
    /// Returns `Ok(None)` once the segment is sealed and fully read. Waits
    /// indefinitely on an unsealed segment that receives no more data; wrap
    /// the call in a timeout to bound it. Cancelling the call loses nothing.
    pub async fn read(&self) -> ClientResult<Option<SegmentChunk>> {
        loop {
            {
                let mut state = self.shared.state.lock();
                if let Some(err) = state.error.take() {
                    return Err(err.into());
                }
                if let Some((offset, data)) = state.chunks.pop_front() {
                    state.buffered -= data.len();
                    state.read_offset = offset + data.len() as u64;
                    drop(state);
                    self.fill_buffer();
                    return Ok(Some(SegmentChunk {
                        segment: self.shared.segment.clone(),
                        offset,
                        data,
                    }));
                }
                if state.sealed_end {
                    return Ok(None);
                }
            }

            self.fill_buffer();
            self.shared.notify.notified().await;
        }
    }
}

impl SegmentReader for SegmentInputStream {
    fn can_read_without_blocking(&self) -> bool {
        let state = self.shared.state.lock();
        !state.chunks.is_empty() || state.sealed_end || state.error.is_some()
    }

    fn fill_buffer(&self) {
        let offset = {
            let mut state = self.shared.state.lock();
            if state.filling
                || state.sealed_end
                || state.error.is_some()
                || state.buffered >= self.shared.config.read_length
            {
                return;
            }
            state.filling = true;
            state.fetch_offset
        };

        self.handle.spawn(fill(Arc::downgrade(&self.shared), offset));
    }
}

impl fmt::Debug for SegmentInputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("SegmentInputStream")
            .field("segment", &self.shared.segment)
            .field("read_offset", &state.read_offset)
            .field("fetch_offset", &state.fetch_offset)
            .field("buffered", &state.buffered)
            .field("sealed_end", &state.sealed_end)
            .finish_non_exhaustive()
    }
}

/// Fetches from `offset` until there is something to publish.
///
/// Stops early once the stream has been dropped.
async fn fill(shared: Weak<StreamShared>, offset: u64) {
    loop {
        let Some(stream) = shared.upgrade() else {
            return;
        };
        let outcome = stream.fetch(offset).await;
        match outcome {
            Ok(fetched) if fetched.data.is_empty() && !fetched.sealed => {
                let interval = stream.config.poll_interval;
                drop(stream);
                tokio::time::sleep(interval).await;
            }
            outcome => {
                stream.publish(offset, outcome);
                return;
            }
        }
    }
}

impl StreamShared {
    async fn fetch(&self, offset: u64) -> SegmentResult<Fetched> {
        let timeout = self.config.timeout;
        let result = self
            .store
            .read(&self.segment, offset, self.config.read_length, timeout)?
            .await?;

        let mut data = BytesMut::new();
        let mut sealed = false;
        for entry in result {
            match entry {
                ReadResultEntry::Data(entry) => {
                    let content = entry.content(timeout).await?;
                    data.extend_from_slice(&content);
                }
                ReadResultEntry::EndOfSegment(end) => sealed = end.is_sealed(),
            }
        }

        Ok(Fetched {
            data: data.freeze(),
            sealed,
        })
    }

    fn publish(&self, offset: u64, outcome: SegmentResult<Fetched>) {
        let mut state = self.state.lock();
        state.filling = false;
        match outcome {
            Ok(Fetched { data, sealed }) => {
                if !data.is_empty() {
                    state.fetch_offset = offset + data.len() as u64;
                    state.buffered += data.len();
                    state.chunks.push_back((offset, data));
                }
                if sealed {
                    debug!(segment = %self.segment, offset = state.fetch_offset, "reached end of sealed segment");
                    state.sealed_end = true;
                }
            }
            Err(err) => {
                warn!(segment = %self.segment, offset, error = %err, "segment fill failed");
                state.error = Some(err);
            }
        }
        drop(state);
        self.notify.notify_one();
    }
}
