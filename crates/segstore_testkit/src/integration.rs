//! Model-checking harness for store integration tests.
//!
//! Mirrors every operation in a simple in-memory model and verifies the
//! store against it.

use crate::fixtures::{TestStore, TEST_TIMEOUT};
use crate::generators::StoreOp;
use bytes::Bytes;
use segstore_core::{SegmentError, SegmentStore};
use std::collections::HashMap;

#[derive(Debug, Default, Clone)]
struct ModelSegment {
    data: Vec<u8>,
    sealed: bool,
}

/// A test harness that tracks expected segment contents.
pub struct StoreHarness {
    /// The store under test.
    pub store: TestStore,
    model: HashMap<String, ModelSegment>,
}

impl StoreHarness {
    /// Creates a harness over a fresh store.
    ///
    /// Must be created inside a tokio runtime.
    pub fn new() -> Self {
        Self {
            store: TestStore::new(),
            model: HashMap::new(),
        }
    }

    /// Creates a segment and starts tracking it.
    pub async fn create(&mut self, name: &str) {
        self.store.create(name).await;
        self.model.insert(name.to_string(), ModelSegment::default());
    }

    /// Applies one scenario step to `name`.
    ///
    /// Steps against a sealed segment are expected to fail with
    /// [`SegmentError::SegmentSealed`] and leave it unchanged.
    pub async fn apply(&mut self, name: &str, op: &StoreOp) {
        let sealed = self.segment(name).sealed;
        match op {
            StoreOp::Append(data) if sealed => {
                let err = self
                    .store
                    .store
                    .append(name, Bytes::copy_from_slice(data), TEST_TIMEOUT)
                    .expect("Invalid append arguments")
                    .await
                    .expect_err("Append to sealed segment succeeded");
                assert!(matches!(err, SegmentError::SegmentSealed { .. }), "{err}");
            }
            StoreOp::Append(data) => {
                let offset = self.store.append(name, data).await;
                let segment = self.segment_mut(name);
                assert_eq!(offset, segment.data.len() as u64, "append offset mismatch");
                segment.data.extend_from_slice(data);
            }
            StoreOp::MergeBatch(_) if sealed => {
                let err = self
                    .store
                    .store
                    .create_batch(name, TEST_TIMEOUT)
                    .expect("Invalid batch arguments")
                    .await
                    .expect_err("Batch of sealed segment created");
                assert!(matches!(err, SegmentError::SegmentSealed { .. }), "{err}");
            }
            StoreOp::MergeBatch(data) => {
                let batch = self.store.batch(name).await;
                self.store.append(&batch, data).await;
                self.store.seal(&batch).await;
                let offset = self.store.merge(&batch).await;
                let segment = self.segment_mut(name);
                assert_eq!(offset, segment.data.len() as u64, "merge offset mismatch");
                segment.data.extend_from_slice(data);
            }
            StoreOp::Seal if sealed => {
                let err = self
                    .store
                    .store
                    .seal_segment(name, TEST_TIMEOUT)
                    .expect("Invalid seal arguments")
                    .await
                    .expect_err("Second seal succeeded");
                assert!(matches!(err, SegmentError::SegmentSealed { .. }), "{err}");
            }
            StoreOp::Seal => {
                let length = self.store.seal(name).await;
                let segment = self.segment_mut(name);
                assert_eq!(length, segment.data.len() as u64);
                segment.sealed = true;
            }
        }
    }

    /// Verifies that the store matches the model for `name`.
    pub async fn verify(&self, name: &str) {
        let expected = self.segment(name);
        let info = self.store.info(name).await;
        assert_eq!(info.length, expected.data.len() as u64, "length mismatch for {name}");
        assert_eq!(info.sealed, expected.sealed, "seal state mismatch for {name}");
        assert_eq!(self.store.read_all(name).await, expected.data, "content mismatch for {name}");
    }

    /// Verifies every tracked segment.
    pub async fn verify_all(&self) {
        for name in self.model.keys() {
            self.verify(name).await;
        }
    }

    fn segment(&self, name: &str) -> &ModelSegment {
        self.model
            .get(name)
            .unwrap_or_else(|| panic!("Segment {name} is not tracked"))
    }

    fn segment_mut(&mut self, name: &str) -> &mut ModelSegment {
        self.model
            .get_mut(name)
            .unwrap_or_else(|| panic!("Segment {name} is not tracked"))
    }
}

impl Default for StoreHarness {
    fn default() -> Self {
        Self::new()
    }
}
