//! Per-segment state held by the local store.

use crate::error::{SegmentError, SegmentResult};
use crate::pending::{Executor, Pending};
use crate::read::{ReadSource, SegmentTail};
use crate::types::SegmentInfo;
use bytes::Bytes;
use parking_lot::{Mutex, MutexGuard};
use segstore_storage::StorageBackend;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Lifecycle status of a segment.
///
/// Sealing is tracked separately because a sealed segment is still live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SegmentStatus {
    Active,
    Merged,
    Deleted,
}

/// A segment or batch.
///
/// A batch holds its parent by reference, so a parent that was deleted and
/// re-created under the same name is never merged into.
pub(crate) struct SegmentState {
    name: String,
    parent: Option<Arc<SegmentState>>,
    inner: Mutex<SegmentInner>,
}

pub(crate) struct SegmentInner {
    backend: Box<dyn StorageBackend>,
    status: SegmentStatus,
    last_modified: SystemTime,
}

impl SegmentState {
    pub(crate) fn new(
        name: String,
        parent: Option<Arc<SegmentState>>,
        backend: Box<dyn StorageBackend>,
    ) -> Self {
        Self {
            name,
            parent,
            inner: Mutex::new(SegmentInner {
                backend,
                status: SegmentStatus::Active,
                last_modified: SystemTime::now(),
            }),
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn parent(&self) -> Option<&Arc<SegmentState>> {
        self.parent.as_ref()
    }

    pub(crate) fn is_batch_of(&self, parent: &Arc<SegmentState>) -> bool {
        self.parent.as_ref().is_some_and(|p| Arc::ptr_eq(p, parent))
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, SegmentInner> {
        self.inner.lock()
    }

    pub(crate) fn info(&self) -> SegmentResult<SegmentInfo> {
        let inner = self.lock();
        inner.ensure_live(&self.name)?;
        Ok(SegmentInfo {
            name: self.name.clone(),
            length: inner.length(),
            sealed: inner.is_sealed(),
            deleted: false,
            parent: self.parent.as_ref().map(|p| p.name.clone()),
            last_modified: inner.last_modified,
        })
    }
}

impl fmt::Debug for SegmentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SegmentState")
            .field("name", &self.name)
            .field("parent", &self.parent.as_ref().map(|p| p.name.as_str()))
            .finish_non_exhaustive()
    }
}

impl SegmentInner {
    /// Fails with `SegmentNotFound` unless the segment is still active.
    pub(crate) fn ensure_live(&self, name: &str) -> SegmentResult<()> {
        match self.status {
            SegmentStatus::Active => Ok(()),
            SegmentStatus::Merged | SegmentStatus::Deleted => Err(SegmentError::not_found(name)),
        }
    }

    /// Fails unless the segment is live and unsealed.
    pub(crate) fn ensure_writable(&self, name: &str) -> SegmentResult<()> {
        self.ensure_live(name)?;
        if self.is_sealed() {
            return Err(SegmentError::sealed(name));
        }
        Ok(())
    }

    pub(crate) fn length(&self) -> u64 {
        self.backend.length()
    }

    pub(crate) fn is_sealed(&self) -> bool {
        self.backend.is_sealed()
    }

    /// Writes `data` at the end of the backend.
    ///
    /// Callers check writability first. A backend failure leaves the length
    /// where it was.
    pub(crate) fn write(&mut self, data: Bytes) -> SegmentResult<u64> {
        let offset = self.backend.append(data)?;
        self.last_modified = SystemTime::now();
        Ok(offset)
    }

    /// Reads `[offset, offset + len)` from the backend.
    pub(crate) fn read(&self, offset: u64, len: usize) -> SegmentResult<Bytes> {
        Ok(self.backend.read(offset, len)?)
    }

    /// Seals the backend and returns the final length.
    pub(crate) fn seal(&mut self, name: &str) -> SegmentResult<u64> {
        self.ensure_writable(name)?;
        self.backend.seal()?;
        self.last_modified = SystemTime::now();
        Ok(self.length())
    }

    pub(crate) fn mark(&mut self, status: SegmentStatus) {
        self.status = status;
    }
}

/// [`ReadSource`] over a segment of the local store.
pub(crate) struct SegmentReadSource {
    state: Arc<SegmentState>,
    executor: Executor,
}

impl SegmentReadSource {
    pub(crate) fn new(state: Arc<SegmentState>, executor: Executor) -> Self {
        Self { state, executor }
    }
}

impl ReadSource for SegmentReadSource {
    fn name(&self) -> &str {
        self.state.name()
    }

    fn tail(&self) -> Option<SegmentTail> {
        let inner = self.state.lock();
        inner.ensure_live(self.state.name()).ok()?;
        Some(SegmentTail {
            length: inner.length(),
            sealed: inner.is_sealed(),
        })
    }

    fn fetch(&self, offset: u64, length: usize, timeout: Duration) -> Pending<Bytes> {
        let state = Arc::clone(&self.state);
        let stats = Arc::clone(self.executor.stats());
        self.executor.submit("read", timeout, move || {
            let inner = state.lock();
            inner.ensure_live(state.name())?;
            let data = inner.read(offset, length)?;
            stats.record_read(data.len() as u64);
            Ok(data)
        })
    }
}
