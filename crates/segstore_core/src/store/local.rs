//! In-process segment store.

use crate::config::StoreConfig;
use crate::error::{SegmentError, SegmentResult};
use crate::pending::{Executor, Pending};
use crate::read::ReadResult;
use crate::stats::StoreStats;
use crate::store::state::{SegmentReadSource, SegmentState, SegmentStatus};
use crate::store::validate::{validate_name, validate_new_name, validate_payload, validate_read_range};
use crate::store::SegmentStore;
use crate::types::SegmentInfo;
use bytes::Bytes;
use parking_lot::RwLock;
use segstore_storage::{InMemoryBackend, StorageBackend, StorageResult};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{debug, info};
use uuid::Uuid;

/// Creates the storage backend for a newly created segment or batch.
///
/// Receives the segment name.
pub type BackendFactory =
    Arc<dyn Fn(&str) -> StorageResult<Box<dyn StorageBackend>> + Send + Sync>;

/// Returns a factory producing [`InMemoryBackend`]s.
pub fn default_backend_factory() -> BackendFactory {
    Arc::new(|_: &str| -> StorageResult<Box<dyn StorageBackend>> {
        Ok(Box::new(InMemoryBackend::new()))
    })
}

/// A [`SegmentStore`] that keeps its segments in this process.
///
/// Each segment's bytes live in a [`StorageBackend`] produced by the
/// configured [`BackendFactory`]; operations run on the tokio blocking pool
/// of the runtime the store was created in.
///
/// # Locking
///
/// Per-segment state sits behind its own mutex, which serializes offset
/// assignment for that segment. The name table is a read-write lock. The name
/// table may be held while locking a segment, never the other way around;
/// merges lock the batch before its parent.
pub struct LocalSegmentStore {
    config: StoreConfig,
    inner: Arc<StoreInner>,
    executor: Executor,
}

struct StoreInner {
    segments: RwLock<HashMap<String, Arc<SegmentState>>>,
    backend_factory: BackendFactory,
    stats: Arc<StoreStats>,
}

impl LocalSegmentStore {
    /// Creates a store with in-memory backends on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`SegmentError::NoRuntime`] if called outside a tokio runtime.
    pub fn new(config: StoreConfig) -> SegmentResult<Self> {
        Self::with_backend_factory(config, default_backend_factory())
    }

    /// Creates a store with custom backends on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`SegmentError::NoRuntime`] if called outside a tokio runtime.
    pub fn with_backend_factory(
        config: StoreConfig,
        backend_factory: BackendFactory,
    ) -> SegmentResult<Self> {
        let handle = Handle::try_current().map_err(|e| SegmentError::NoRuntime {
            message: e.to_string(),
        })?;
        Ok(Self::with_handle(config, backend_factory, handle))
    }

    /// Creates a store that runs its operations on the given runtime.
    pub fn with_handle(config: StoreConfig, backend_factory: BackendFactory, handle: Handle) -> Self {
        let stats = Arc::new(StoreStats::new());
        Self {
            config,
            inner: Arc::new(StoreInner {
                segments: RwLock::new(HashMap::new()),
                backend_factory,
                stats: Arc::clone(&stats),
            }),
            executor: Executor::new(handle, stats),
        }
    }

    /// Returns the store configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Returns the store statistics.
    pub fn stats(&self) -> &StoreStats {
        &self.inner.stats
    }

    /// Returns the number of live segments and batches.
    pub fn segment_count(&self) -> usize {
        self.inner.segments.read().len()
    }

    /// Returns true if a segment or batch with this name is registered.
    ///
    /// This is a diagnostic snapshot; use `get_info` for a checked answer.
    pub fn contains(&self, name: &str) -> bool {
        self.inner.segments.read().contains_key(name)
    }
}

impl SegmentStore for LocalSegmentStore {
    fn create_segment(&self, name: &str, timeout: Duration) -> SegmentResult<Pending<()>> {
        validate_new_name(name, self.config.max_name_length)?;
        let inner = Arc::clone(&self.inner);
        let name = name.to_owned();
        Ok(self.executor.submit("create_segment", timeout, move || {
            inner.create_segment(name)
        }))
    }

    fn append(&self, name: &str, data: Bytes, timeout: Duration) -> SegmentResult<Pending<u64>> {
        validate_name(name)?;
        validate_payload(&data, self.config.max_append_length)?;
        let inner = Arc::clone(&self.inner);
        let name = name.to_owned();
        Ok(self
            .executor
            .submit("append", timeout, move || inner.append(&name, data)))
    }

    fn read(
        &self,
        name: &str,
        offset: u64,
        max_length: usize,
        timeout: Duration,
    ) -> SegmentResult<Pending<ReadResult>> {
        validate_name(name)?;
        validate_read_range(offset, max_length)?;
        let inner = Arc::clone(&self.inner);
        let executor = self.executor.clone();
        let name = name.to_owned();
        Ok(self.executor.submit("read", timeout, move || {
            let state = inner.get(&name)?;
            state.lock().ensure_live(&name)?;
            debug!(segment = %name, offset, max_length, "read started");
            let source = SegmentReadSource::new(state, executor);
            Ok(ReadResult::new(Arc::new(source), offset, max_length))
        }))
    }

    fn get_info(&self, name: &str, timeout: Duration) -> SegmentResult<Pending<SegmentInfo>> {
        validate_name(name)?;
        let inner = Arc::clone(&self.inner);
        let name = name.to_owned();
        Ok(self
            .executor
            .submit("get_info", timeout, move || inner.get(&name)?.info()))
    }

    fn seal_segment(&self, name: &str, timeout: Duration) -> SegmentResult<Pending<u64>> {
        validate_name(name)?;
        let inner = Arc::clone(&self.inner);
        let name = name.to_owned();
        Ok(self
            .executor
            .submit("seal_segment", timeout, move || inner.seal(&name)))
    }

    fn create_batch(&self, parent: &str, timeout: Duration) -> SegmentResult<Pending<String>> {
        validate_name(parent)?;
        let inner = Arc::clone(&self.inner);
        let parent = parent.to_owned();
        Ok(self
            .executor
            .submit("create_batch", timeout, move || inner.create_batch(&parent)))
    }

    fn merge_batch(&self, batch: &str, timeout: Duration) -> SegmentResult<Pending<u64>> {
        validate_name(batch)?;
        let inner = Arc::clone(&self.inner);
        let batch = batch.to_owned();
        Ok(self
            .executor
            .submit("merge_batch", timeout, move || inner.merge_batch(&batch)))
    }

    fn delete_segment(&self, name: &str, timeout: Duration) -> SegmentResult<Pending<()>> {
        validate_name(name)?;
        let inner = Arc::clone(&self.inner);
        let name = name.to_owned();
        Ok(self
            .executor
            .submit("delete_segment", timeout, move || inner.delete(&name)))
    }
}

impl fmt::Debug for LocalSegmentStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalSegmentStore")
            .field("config", &self.config)
            .field("segment_count", &self.segment_count())
            .finish_non_exhaustive()
    }
}

/// Builds the name of a new batch of `parent`.
fn batch_name(parent: &str) -> String {
    format!("{parent}#batch.{}", Uuid::new_v4().simple())
}

impl StoreInner {
    fn get(&self, name: &str) -> SegmentResult<Arc<SegmentState>> {
        self.segments
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| SegmentError::not_found(name))
    }

    /// Builds the state for a new segment. Callers must not hold the name table.
    fn build(&self, name: &str, parent: Option<Arc<SegmentState>>) -> SegmentResult<SegmentState> {
        let backend = (self.backend_factory)(name)?;
        Ok(SegmentState::new(name.to_owned(), parent, backend))
    }

    fn create_segment(&self, name: String) -> SegmentResult<()> {
        if self.segments.read().contains_key(&name) {
            return Err(SegmentError::exists(name));
        }
        let state = self.build(&name, None)?;

        let mut segments = self.segments.write();
        if segments.contains_key(&name) {
            return Err(SegmentError::exists(name));
        }
        segments.insert(name.clone(), Arc::new(state));
        drop(segments);

        self.stats.record_create(false);
        info!(segment = %name, "segment created");
        Ok(())
    }

    fn append(&self, name: &str, data: Bytes) -> SegmentResult<u64> {
        let state = self.get(name)?;
        let length = data.len();
        let offset = {
            let mut inner = state.lock();
            inner.ensure_writable(name)?;
            inner.write(data)?
        };
        self.stats.record_append(length as u64);
        debug!(segment = %name, offset, length, "append accepted");
        Ok(offset)
    }

    fn seal(&self, name: &str) -> SegmentResult<u64> {
        let state = self.get(name)?;
        let length = state.lock().seal(name)?;
        self.stats.record_seal();
        info!(segment = %name, length, "segment sealed");
        Ok(length)
    }

    fn create_batch(&self, parent_name: &str) -> SegmentResult<String> {
        let parent = self.get(parent_name)?;
        if parent.parent().is_some() {
            return Err(SegmentError::invalid_operation(format!(
                "cannot create a batch of batch {parent_name}"
            )));
        }
        parent.lock().ensure_writable(parent_name)?;

        let name = batch_name(parent_name);
        let state = self.build(&name, Some(Arc::clone(&parent)))?;

        // The parent may have been deleted or sealed while the backend was built.
        let mut segments = self.segments.write();
        if !segments.get(parent_name).is_some_and(|s| Arc::ptr_eq(s, &parent)) {
            return Err(SegmentError::not_found(parent_name));
        }
        parent.lock().ensure_writable(parent_name)?;
        if segments.contains_key(&name) {
            return Err(SegmentError::exists(name));
        }
        segments.insert(name.clone(), Arc::new(state));
        drop(segments);

        self.stats.record_create(true);
        info!(batch = %name, parent = %parent_name, "batch created");
        Ok(name)
    }

    fn merge_batch(&self, name: &str) -> SegmentResult<u64> {
        let batch = self.get(name)?;
        let Some(parent) = batch.parent().cloned() else {
            return Err(SegmentError::invalid_operation(format!(
                "{name} is not a batch"
            )));
        };

        let (offset, length) = {
            let mut batch_inner = batch.lock();
            batch_inner.ensure_live(name)?;
            if !batch_inner.is_sealed() {
                return Err(SegmentError::batch_not_sealed(name));
            }

            let mut parent_inner = parent.lock();
            parent_inner.ensure_writable(parent.name())?;

            let length = batch_inner.length();
            let data = batch_inner.read(0, to_usize(length)?)?;
            let offset = if data.is_empty() {
                parent_inner.length()
            } else {
                parent_inner.write(data)?
            };
            batch_inner.mark(SegmentStatus::Merged);
            (offset, length)
        };

        // Merged batches leave the name table.
        let mut segments = self.segments.write();
        if segments.get(name).is_some_and(|s| Arc::ptr_eq(s, &batch)) {
            segments.remove(name);
        }
        drop(segments);

        self.stats.record_merge(length);
        info!(batch = %name, parent = %parent.name(), offset, length, "batch merged");
        Ok(offset)
    }

    fn delete(&self, name: &str) -> SegmentResult<()> {
        let mut segments = self.segments.write();
        let state = segments
            .get(name)
            .cloned()
            .ok_or_else(|| SegmentError::not_found(name))?;
        state.lock().ensure_live(name)?;

        segments.remove(name);
        state.lock().mark(SegmentStatus::Deleted);

        let batches: Vec<String> = segments
            .iter()
            .filter(|(_, s)| s.is_batch_of(&state))
            .map(|(n, _)| n.clone())
            .collect();
        for batch_name in &batches {
            if let Some(batch) = segments.remove(batch_name) {
                batch.lock().mark(SegmentStatus::Deleted);
            }
        }
        drop(segments);

        self.stats.record_deletes(1 + batches.len() as u64);
        info!(segment = %name, batches = batches.len(), "segment deleted");
        Ok(())
    }
}

fn to_usize(length: u64) -> SegmentResult<usize> {
    usize::try_from(length)
        .map_err(|_| SegmentError::invalid_operation(format!("length {length} exceeds address space")))
}
