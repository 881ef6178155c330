//! Test fixtures and store helpers.
//!
//! Provides convenience wrappers for setting up stores and driving them
//! in tests, plus backends that fail on demand.

use bytes::Bytes;
use segstore_core::{
    BackendFactory, LocalSegmentStore, ReadResultEntry, SegmentInfo, SegmentStore, StoreConfig,
};
use segstore_storage::{InMemoryBackend, StorageBackend, StorageError, StorageResult};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Timeout used by all helpers.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

const READ_ALL_LENGTH: usize = u32::MAX as usize;

/// Installs a tracing subscriber for tests.
///
/// Honors `RUST_LOG` and defaults to `warn`. Safe to call from every test.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// A shared in-process store with panicking helpers.
///
/// Must be created inside a tokio runtime.
pub struct TestStore {
    /// The store instance.
    pub store: Arc<LocalSegmentStore>,
}

impl TestStore {
    /// Creates a store with default configuration.
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Creates a store with the given configuration.
    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            store: Arc::new(LocalSegmentStore::new(config).expect("Failed to create store")),
        }
    }

    /// Creates a store whose segments use backends from `factory`.
    pub fn with_backend_factory(factory: BackendFactory) -> Self {
        Self {
            store: Arc::new(
                LocalSegmentStore::with_backend_factory(StoreConfig::default(), factory)
                    .expect("Failed to create store"),
            ),
        }
    }

    /// Returns the store as a trait object.
    pub fn shared(&self) -> Arc<dyn SegmentStore> {
        Arc::clone(&self.store) as Arc<dyn SegmentStore>
    }

    /// Creates a segment.
    pub async fn create(&self, name: &str) {
        self.store
            .create_segment(name, TEST_TIMEOUT)
            .expect("Invalid create arguments")
            .await
            .expect("Failed to create segment");
    }

    /// Appends `data` and returns its offset.
    pub async fn append(&self, name: &str, data: &[u8]) -> u64 {
        self.store
            .append(name, Bytes::copy_from_slice(data), TEST_TIMEOUT)
            .expect("Invalid append arguments")
            .await
            .expect("Failed to append")
    }

    /// Seals a segment and returns its final length.
    pub async fn seal(&self, name: &str) -> u64 {
        self.store
            .seal_segment(name, TEST_TIMEOUT)
            .expect("Invalid seal arguments")
            .await
            .expect("Failed to seal segment")
    }

    /// Creates a batch of `parent` and returns its name.
    pub async fn batch(&self, parent: &str) -> String {
        self.store
            .create_batch(parent, TEST_TIMEOUT)
            .expect("Invalid batch arguments")
            .await
            .expect("Failed to create batch")
    }

    /// Merges a sealed batch and returns the offset it landed at.
    pub async fn merge(&self, batch: &str) -> u64 {
        self.store
            .merge_batch(batch, TEST_TIMEOUT)
            .expect("Invalid merge arguments")
            .await
            .expect("Failed to merge batch")
    }

    /// Gets segment information.
    pub async fn info(&self, name: &str) -> SegmentInfo {
        self.store
            .get_info(name, TEST_TIMEOUT)
            .expect("Invalid info arguments")
            .await
            .expect("Failed to get segment info")
    }

    /// Reads a segment from the start up to its current end.
    pub async fn read_all(&self, name: &str) -> Vec<u8> {
        self.read_from(name, 0).await
    }

    /// Reads a segment from `offset` up to its current end.
    pub async fn read_from(&self, name: &str, offset: u64) -> Vec<u8> {
        let result = self
            .store
            .read(name, offset, READ_ALL_LENGTH, TEST_TIMEOUT)
            .expect("Invalid read arguments")
            .await
            .expect("Failed to read");

        let mut out = Vec::new();
        for entry in result {
            match entry {
                ReadResultEntry::Data(entry) => {
                    let content = entry.content(TEST_TIMEOUT).await.expect("Failed to read content");
                    out.extend_from_slice(&content);
                }
                ReadResultEntry::EndOfSegment(_) => break,
            }
        }
        out
    }
}

impl Default for TestStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for TestStore {
    type Target = LocalSegmentStore;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

/// An in-memory backend that fails appends once its budget is spent.
#[derive(Debug)]
pub struct FailingBackend {
    inner: InMemoryBackend,
    appends_left: Arc<AtomicUsize>,
}

impl FailingBackend {
    /// Creates a backend that accepts `appends` appends and then fails.
    pub fn after(appends: usize) -> Self {
        Self::sharing(Arc::new(AtomicUsize::new(appends)))
    }

    /// Creates a backend drawing from a shared append budget.
    pub fn sharing(budget: Arc<AtomicUsize>) -> Self {
        Self {
            inner: InMemoryBackend::new(),
            appends_left: budget,
        }
    }
}

impl StorageBackend for FailingBackend {
    fn length(&self) -> u64 {
        self.inner.length()
    }

    fn read(&self, offset: u64, len: usize) -> StorageResult<Bytes> {
        self.inner.read(offset, len)
    }

    fn append(&mut self, data: Bytes) -> StorageResult<u64> {
        let spent = self
            .appends_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_err();
        if spent {
            return Err(StorageError::Io(io::Error::other("injected append failure")));
        }
        self.inner.append(data)
    }

    fn seal(&mut self) -> StorageResult<()> {
        self.inner.seal()
    }

    fn is_sealed(&self) -> bool {
        self.inner.is_sealed()
    }
}

/// A backend factory whose segments share one append budget.
///
/// Once `appends` appends have succeeded across all segments, every further
/// append fails with an I/O error.
pub fn failing_backend_factory(appends: usize) -> BackendFactory {
    let budget = Arc::new(AtomicUsize::new(appends));
    Arc::new(move |_: &str| -> StorageResult<Box<dyn StorageBackend>> {
        Ok(Box::new(FailingBackend::sharing(Arc::clone(&budget))))
    })
}
