//! Chunked in-memory backend.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use bytes::{Bytes, BytesMut};

/// Keeps a segment as the list of buffers it was appended as.
///
/// Appends store the caller's `Bytes` without copying. A read that falls
/// inside one appended chunk is a slice of that chunk; a read spanning
/// chunks is gathered into a new buffer.
///
/// This is the backend `LocalSegmentStore` uses unless told otherwise.
///
/// ```rust
/// use bytes::Bytes;
/// use segstore_storage::{InMemoryBackend, StorageBackend};
///
/// let mut backend = InMemoryBackend::new();
/// assert_eq!(backend.append(Bytes::from_static(b"head-")).unwrap(), 0);
/// assert_eq!(backend.append(Bytes::from_static(b"tail")).unwrap(), 5);
/// assert_eq!(&backend.read(3, 4).unwrap()[..], b"d-ta");
/// ```
#[derive(Debug, Default, Clone)]
pub struct InMemoryBackend {
    chunks: Vec<Chunk>,
    length: u64,
    sealed: bool,
}

#[derive(Debug, Clone)]
struct Chunk {
    start: u64,
    data: Bytes,
}

impl Chunk {
    fn end(&self) -> u64 {
        self.start + self.data.len() as u64
    }
}

impl InMemoryBackend {
    /// Creates an empty, unsealed backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of appended chunks held.
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Index of the first chunk ending after `offset`.
    fn chunk_index(&self, offset: u64) -> usize {
        self.chunks.partition_point(|chunk| chunk.end() <= offset)
    }
}

impl StorageBackend for InMemoryBackend {
    fn length(&self) -> u64 {
        self.length
    }

    fn read(&self, offset: u64, len: usize) -> StorageResult<Bytes> {
        let end = offset
            .checked_add(len as u64)
            .filter(|&end| end <= self.length)
            .ok_or(StorageError::OutOfRange {
                offset,
                len,
                length: self.length,
            })?;
        if len == 0 {
            return Ok(Bytes::new());
        }

        let first = self.chunk_index(offset);
        let chunk = &self.chunks[first];
        if end <= chunk.end() {
            let from = (offset - chunk.start) as usize;
            return Ok(chunk.data.slice(from..from + len));
        }

        let mut gathered = BytesMut::with_capacity(len);
        for chunk in self.chunks[first..].iter().take_while(|c| c.start < end) {
            let from = offset.saturating_sub(chunk.start) as usize;
            let to = (end.min(chunk.end()) - chunk.start) as usize;
            gathered.extend_from_slice(&chunk.data[from..to]);
        }
        Ok(gathered.freeze())
    }

    fn append(&mut self, data: Bytes) -> StorageResult<u64> {
        if self.sealed {
            return Err(StorageError::Sealed {
                length: self.length,
            });
        }
        let start = self.length;
        if !data.is_empty() {
            self.length += data.len() as u64;
            self.chunks.push(Chunk { start, data });
        }
        Ok(start)
    }

    fn seal(&mut self) -> StorageResult<()> {
        if self.sealed {
            return Err(StorageError::Sealed {
                length: self.length,
            });
        }
        self.sealed = true;
        Ok(())
    }

    fn is_sealed(&self) -> bool {
        self.sealed
    }
}
