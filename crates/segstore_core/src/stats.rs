//! Segment store statistics.
//!
//! Counters are updated by the background tasks that run store operations,
//! so they reflect completed work, including work whose caller already gave
//! up waiting.
//!
//! # Usage
//!
//! ```rust,ignore
//! let store = LocalSegmentStore::new(StoreConfig::default())?;
//! // Perform operations...
//! let snapshot = store.stats().snapshot();
//! println!("Appends: {}", snapshot.appends);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

/// Segment store statistics.
///
/// All counters are atomic and can be read while operations are in progress.
/// Values are monotonically increasing.
#[derive(Debug, Default)]
pub struct StoreStats {
    /// Total number of segments created (batches excluded).
    segments_created: AtomicU64,
    /// Total number of batches created.
    batches_created: AtomicU64,
    /// Total number of accepted appends.
    appends: AtomicU64,
    /// Total bytes accepted by appends.
    bytes_appended: AtomicU64,
    /// Total number of content reads served.
    reads: AtomicU64,
    /// Total bytes served by content reads.
    bytes_read: AtomicU64,
    /// Total number of seals.
    seals: AtomicU64,
    /// Total number of batch merges.
    merges: AtomicU64,
    /// Total bytes moved into parents by merges.
    bytes_merged: AtomicU64,
    /// Total number of deleted segments, including cascaded batches.
    deletes: AtomicU64,
    /// Total number of operations whose deadline elapsed.
    timeouts: AtomicU64,
    /// Total number of operations that failed.
    errors: AtomicU64,
}

impl StoreStats {
    /// Creates a new stats instance.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_create(&self, batch: bool) {
        if batch {
            self.batches_created.fetch_add(1, Ordering::Relaxed);
        } else {
            self.segments_created.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_append(&self, bytes: u64) {
        self.appends.fetch_add(1, Ordering::Relaxed);
        self.bytes_appended.fetch_add(bytes, Ordering::Relaxed);
    }

    pub(crate) fn record_read(&self, bytes: u64) {
        self.reads.fetch_add(1, Ordering::Relaxed);
        self.bytes_read.fetch_add(bytes, Ordering::Relaxed);
    }

    pub(crate) fn record_seal(&self) {
        self.seals.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_merge(&self, bytes: u64) {
        self.merges.fetch_add(1, Ordering::Relaxed);
        self.bytes_merged.fetch_add(bytes, Ordering::Relaxed);
    }

    pub(crate) fn record_deletes(&self, count: u64) {
        self.deletes.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn record_timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the total number of accepted appends.
    pub fn appends(&self) -> u64 {
        self.appends.load(Ordering::Relaxed)
    }

    /// Returns the total bytes accepted by appends.
    pub fn bytes_appended(&self) -> u64 {
        self.bytes_appended.load(Ordering::Relaxed)
    }

    /// Returns the total number of timed out operations.
    pub fn timeouts(&self) -> u64 {
        self.timeouts.load(Ordering::Relaxed)
    }

    /// Returns the total number of failed operations.
    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    /// Returns a snapshot of all stats.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            segments_created: self.segments_created.load(Ordering::Relaxed),
            batches_created: self.batches_created.load(Ordering::Relaxed),
            appends: self.appends(),
            bytes_appended: self.bytes_appended(),
            reads: self.reads.load(Ordering::Relaxed),
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            seals: self.seals.load(Ordering::Relaxed),
            merges: self.merges.load(Ordering::Relaxed),
            bytes_merged: self.bytes_merged.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            timeouts: self.timeouts(),
            errors: self.errors(),
        }
    }
}

/// A point-in-time snapshot of store statistics.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    /// Total number of segments created.
    pub segments_created: u64,
    /// Total number of batches created.
    pub batches_created: u64,
    /// Total number of accepted appends.
    pub appends: u64,
    /// Total bytes accepted by appends.
    pub bytes_appended: u64,
    /// Total number of content reads served.
    pub reads: u64,
    /// Total bytes served by content reads.
    pub bytes_read: u64,
    /// Total number of seals.
    pub seals: u64,
    /// Total number of batch merges.
    pub merges: u64,
    /// Total bytes moved by merges.
    pub bytes_merged: u64,
    /// Total number of deleted segments.
    pub deletes: u64,
    /// Total number of timed out operations.
    pub timeouts: u64,
    /// Total number of failed operations.
    pub errors: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_stats_are_zero() {
        let stats = StoreStats::new();
        assert_eq!(stats.snapshot(), StatsSnapshot::default());
    }

    #[test]
    fn record_operations() {
        let stats = StoreStats::new();

        stats.record_create(false);
        stats.record_create(true);
        stats.record_append(100);
        stats.record_append(50);
        stats.record_read(30);
        stats.record_seal();
        stats.record_merge(150);
        stats.record_deletes(2);

        let snap = stats.snapshot();
        assert_eq!(snap.segments_created, 1);
        assert_eq!(snap.batches_created, 1);
        assert_eq!(snap.appends, 2);
        assert_eq!(snap.bytes_appended, 150);
        assert_eq!(snap.reads, 1);
        assert_eq!(snap.bytes_read, 30);
        assert_eq!(snap.seals, 1);
        assert_eq!(snap.merges, 1);
        assert_eq!(snap.bytes_merged, 150);
        assert_eq!(snap.deletes, 2);
    }

    #[test]
    fn concurrent_updates() {
        use std::sync::Arc;
        use std::thread;

        let stats = Arc::new(StoreStats::new());
        let mut handles = vec![];

        for _ in 0..10 {
            let s = Arc::clone(&stats);
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    s.record_append(1);
                    s.record_error();
                }
            }));
        }

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(stats.appends(), 1000);
        assert_eq!(stats.bytes_appended(), 1000);
        assert_eq!(stats.errors(), 1000);
    }
}
