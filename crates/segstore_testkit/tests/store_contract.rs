//! Integration tests for the segment store contract.

use bytes::Bytes;
use proptest::prelude::*;
use segstore_core::{ErrorKind, ReadResultEntry, SegmentError, SegmentStore, StoreConfig};
use segstore_storage::{InMemoryBackend, StorageBackend, StorageResult};
use segstore_testkit::prelude::*;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_appends_tile_the_segment() {
    init_tracing();
    let store = TestStore::new();
    store.create("tiles").await;

    let config = StressConfig {
        tasks: 8,
        appends_per_task: 50,
        max_payload: 32,
    };
    let (result, ranges) = stress_concurrent_appends(store.shared(), "tiles", &config).await;
    assert_eq!(result.failed_ops, 0);
    assert_eq!(ranges.len(), 400);

    let total = check_tiling(&ranges).expect("ranges must tile the segment");
    assert_eq!(store.info("tiles").await.length, total);

    // Every accepted range holds one appender's bytes and nothing else.
    let content = store.read_all("tiles").await;
    for (offset, len) in ranges {
        let range = &content[offset as usize..(offset + len) as usize];
        assert!(range.iter().all(|&b| b == range[0]), "torn append at {offset}");
    }
}

#[tokio::test]
async fn seal_is_irrevocable() {
    let store = TestStore::new();
    store.create("s").await;
    store.append("s", b"data").await;
    let batch = store.batch("s").await;
    store.append(&batch, b"more").await;
    store.seal(&batch).await;

    assert_eq!(store.seal("s").await, 4);

    let append = store
        .store
        .append("s", Bytes::from_static(b"x"), TEST_TIMEOUT)
        .unwrap()
        .await;
    assert!(matches!(append, Err(SegmentError::SegmentSealed { .. })));

    let merge = store.store.merge_batch(&batch, TEST_TIMEOUT).unwrap().await;
    assert!(matches!(merge, Err(SegmentError::SegmentSealed { .. })));

    // Sealing again is consistently rejected.
    for _ in 0..2 {
        let again = store.store.seal_segment("s", TEST_TIMEOUT).unwrap().await;
        assert!(matches!(again, Err(SegmentError::SegmentSealed { .. })));
    }

    let info = store.info("s").await;
    assert!(info.sealed);
    assert_eq!(info.length, 4);
}

#[tokio::test]
async fn merge_requires_sealed_batch_and_happens_once() {
    let store = TestStore::new();
    store.create("parent").await;
    store.append("parent", b"head-").await;

    let batch = store.batch("parent").await;
    store.append(&batch, b"batched").await;

    let unsealed = store.store.merge_batch(&batch, TEST_TIMEOUT).unwrap().await;
    assert!(matches!(unsealed, Err(SegmentError::BatchNotSealed { .. })));

    // Bytes appended directly after the batch was created land first.
    store.append("parent", b"mid-").await;
    let before = store.info("parent").await.length;
    let batch_length = store.seal(&batch).await;

    assert_eq!(store.merge(&batch).await, before);
    assert_eq!(store.info("parent").await.length, before + batch_length);
    assert_eq!(store.read_all("parent").await, b"head-mid-batched");

    let twice = store.store.merge_batch(&batch, TEST_TIMEOUT).unwrap().await;
    assert!(twice.unwrap_err().is_not_found());
    let gone = store.store.get_info(&batch, TEST_TIMEOUT).unwrap().await;
    assert!(gone.unwrap_err().is_not_found());
}

#[tokio::test]
async fn end_of_segment_content_is_illegal_in_every_state() {
    let store = TestStore::new();

    async fn end_entry_content_kind(store: &TestStore, name: &str, offset: u64) -> ErrorKind {
        let mut result = store
            .store
            .read(name, offset, 16, TEST_TIMEOUT)
            .unwrap()
            .await
            .unwrap();
        let entry = result
            .find(ReadResultEntry::is_end_of_segment)
            .expect("read must end with an end-of-segment entry");
        entry.content(TEST_TIMEOUT).unwrap_err().kind()
    }

    // Empty and active.
    store.create("s").await;
    assert_eq!(end_entry_content_kind(&store, "s", 0).await, ErrorKind::IllegalState);

    // Mid-growth, reading past the current end.
    store.append("s", b"abc").await;
    assert_eq!(end_entry_content_kind(&store, "s", 3).await, ErrorKind::IllegalState);
    assert_eq!(end_entry_content_kind(&store, "s", 100).await, ErrorKind::IllegalState);

    // Sealed.
    store.seal("s").await;
    assert_eq!(end_entry_content_kind(&store, "s", 0).await, ErrorKind::IllegalState);
}

#[tokio::test]
async fn end_of_segment_entry_reports_position() {
    let store = TestStore::new();
    store.create("s").await;
    store.append("s", b"hello").await;

    let mut result = store.store.read("s", 2, 10, TEST_TIMEOUT).unwrap().await.unwrap();
    match result.next().unwrap() {
        ReadResultEntry::Data(entry) => {
            assert_eq!(entry.offset(), 2);
            assert_eq!(entry.length(), 3);
        }
        ReadResultEntry::EndOfSegment(_) => panic!("expected data"),
    }
    match result.next().unwrap() {
        ReadResultEntry::EndOfSegment(entry) => {
            assert_eq!(entry.offset(), 5);
            assert_eq!(entry.requested_length(), 7);
            assert!(!entry.is_sealed());
        }
        ReadResultEntry::Data(_) => panic!("expected end of segment"),
    }
    assert!(result.next().is_none());
}

#[tokio::test]
async fn deleted_name_is_gone_and_reusable() {
    let store = TestStore::new();
    store.create("victim").await;
    store.append("victim", b"old").await;
    let batch = store.batch("victim").await;

    store
        .store
        .delete_segment("victim", TEST_TIMEOUT)
        .unwrap()
        .await
        .unwrap();

    let info = store.store.get_info("victim", TEST_TIMEOUT).unwrap().await;
    assert!(info.unwrap_err().is_not_found());
    let append = store
        .store
        .append("victim", Bytes::from_static(b"x"), TEST_TIMEOUT)
        .unwrap()
        .await;
    assert!(append.unwrap_err().is_not_found());
    let read = store.store.read("victim", 0, 8, TEST_TIMEOUT).unwrap().await;
    assert!(read.unwrap_err().is_not_found());
    let orphan = store.store.get_info(&batch, TEST_TIMEOUT).unwrap().await;
    assert!(orphan.unwrap_err().is_not_found());

    store.create("victim").await;
    let info = store.info("victim").await;
    assert_eq!(info.length, 0);
    assert!(!info.sealed);
    assert_eq!(store.append("victim", b"new").await, 0);
    assert_eq!(store.read_all("victim").await, b"new");
}

#[tokio::test]
async fn usage_errors_are_returned_at_call_time() {
    let store = TestStore::with_config(StoreConfig::new().max_append_length(4));
    store.create("s").await;

    let checks = [
        store.store.create_segment("", TEST_TIMEOUT).map(drop),
        store.store.append("s", Bytes::new(), TEST_TIMEOUT).map(drop),
        store
            .store
            .append("s", Bytes::from_static(b"too long"), TEST_TIMEOUT)
            .map(drop),
        store.store.read("s", 0, 0, TEST_TIMEOUT).map(drop),
        store.store.read("s", u64::MAX, 2, TEST_TIMEOUT).map(drop),
        store.store.get_info("bad\nname", TEST_TIMEOUT).map(drop),
    ];
    for check in checks {
        assert_eq!(check.unwrap_err().kind(), ErrorKind::Usage);
    }
    assert_eq!(store.info("s").await.length, 0);
}

/// A backend whose appends take a while.
struct SlowBackend(InMemoryBackend);

impl StorageBackend for SlowBackend {
    fn length(&self) -> u64 {
        self.0.length()
    }

    fn read(&self, offset: u64, len: usize) -> StorageResult<Bytes> {
        self.0.read(offset, len)
    }

    fn append(&mut self, data: Bytes) -> StorageResult<u64> {
        std::thread::sleep(Duration::from_millis(200));
        self.0.append(data)
    }

    fn seal(&mut self) -> StorageResult<()> {
        self.0.seal()
    }

    fn is_sealed(&self) -> bool {
        self.0.is_sealed()
    }
}

#[tokio::test]
async fn timed_out_append_still_completes() {
    let store = TestStore::with_backend_factory(Arc::new(
        |_: &str| -> StorageResult<Box<dyn StorageBackend>> {
            Ok(Box::new(SlowBackend(InMemoryBackend::new())))
        },
    ));
    store.create("slow").await;

    let err = store
        .store
        .append("slow", Bytes::from_static(b"late"), Duration::from_millis(10))
        .unwrap()
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert_eq!(store.stats().timeouts(), 1);

    // The append was not cancelled and lands whole.
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(store.read_all("slow").await, b"late");
}

#[tokio::test]
async fn failed_append_leaves_no_trace() {
    let store = TestStore::with_backend_factory(failing_backend_factory(1));
    store.create("f").await;
    store.append("f", b"kept").await;

    let err = store
        .store
        .append("f", Bytes::from_static(b"lost"), TEST_TIMEOUT)
        .unwrap()
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);
    assert_eq!(store.info("f").await.length, 4);
    assert_eq!(store.read_all("f").await, b"kept");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn store_matches_model(name in segment_name_strategy(), ops in store_ops_strategy(12)) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async {
            let mut harness = StoreHarness::new();
            harness.create(&name).await;
            for op in &ops {
                harness.apply(&name, op).await;
            }
            harness.verify_all().await;
        });
    }

    #[test]
    fn reads_return_requested_window(
        payloads in payloads_strategy(8),
        (offset, len) in read_window_strategy(2048),
    ) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let (expected, actual) = runtime.block_on(async {
            let store = TestStore::new();
            store.create("w").await;
            let mut all = Vec::new();
            for payload in &payloads {
                store.append("w", payload).await;
                all.extend_from_slice(payload);
            }

            let start = (offset as usize).min(all.len());
            let end = start.saturating_add(len).min(all.len());
            let expected = all[start..end].to_vec();

            let result = store.store.read("w", offset, len, TEST_TIMEOUT).unwrap().await.unwrap();
            let mut actual = Vec::new();
            for entry in result {
                if let ReadResultEntry::Data(entry) = entry {
                    actual.extend_from_slice(&entry.content(TEST_TIMEOUT).await.unwrap());
                }
            }
            (expected, actual)
        });
        prop_assert_eq!(expected, actual);
    }
}
