//! Stress tests for SegStore.
//!
//! These helpers drive a store with many concurrent callers and check the
//! resulting offset assignment.

use crate::fixtures::TEST_TIMEOUT;
use bytes::Bytes;
use segstore_core::SegmentStore;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total operations performed.
    pub total_ops: usize,
    /// Successful operations.
    pub successful_ops: usize,
    /// Failed operations.
    pub failed_ops: usize,
    /// Total duration.
    pub duration: Duration,
    /// Operations per second.
    pub ops_per_second: f64,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(successful: usize, failed: usize, duration: Duration) -> Self {
        let total = successful + failed;
        let ops_per_second = if duration.as_secs_f64() > 0.0 {
            total as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            total_ops: total,
            successful_ops: successful,
            failed_ops: failed,
            duration,
            ops_per_second,
        }
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of concurrent appenders.
    pub tasks: usize,
    /// Appends issued by each appender.
    pub appends_per_task: usize,
    /// Largest payload size in bytes; payload sizes cycle from 1 up to this.
    pub max_payload: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            tasks: 8,
            appends_per_task: 100,
            max_payload: 64,
        }
    }
}

/// Accepted byte ranges from a stress run, as `(offset, length)`.
pub type AcceptedRanges = Vec<(u64, u64)>;

/// Appends concurrently to `segment` from `config.tasks` tokio tasks.
///
/// Each payload is filled with a byte identifying its appender so contents
/// can be checked afterwards. Returns the accepted ranges alongside the
/// summary.
pub async fn stress_concurrent_appends(
    store: Arc<dyn SegmentStore>,
    segment: &str,
    config: &StressConfig,
) -> (StressTestResult, AcceptedRanges) {
    let start = Instant::now();

    let handles: Vec<_> = (0..config.tasks)
        .map(|task| {
            let store = Arc::clone(&store);
            let segment = segment.to_string();
            let config = config.clone();
            tokio::spawn(async move {
                let mut accepted = Vec::new();
                let mut failed = 0usize;
                for i in 0..config.appends_per_task {
                    let len = 1 + (task + i) % config.max_payload.max(1);
                    let payload = Bytes::from(vec![task as u8; len]);
                    let outcome = match store.append(&segment, payload, TEST_TIMEOUT) {
                        Ok(pending) => pending.await,
                        Err(err) => Err(err),
                    };
                    match outcome {
                        Ok(offset) => accepted.push((offset, len as u64)),
                        Err(_) => failed += 1,
                    }
                }
                (accepted, failed)
            })
        })
        .collect();

    let mut ranges = Vec::new();
    let mut failed = 0usize;
    for handle in handles {
        match handle.await {
            Ok((accepted, task_failed)) => {
                ranges.extend(accepted);
                failed += task_failed;
            }
            Err(_) => failed += config.appends_per_task,
        }
    }

    let result = StressTestResult::new(ranges.len(), failed, start.elapsed());
    (result, ranges)
}

/// Checks that `ranges` tile `[0, total)` with no gaps or overlaps.
///
/// Returns the total length covered.
pub fn check_tiling(ranges: &[(u64, u64)]) -> Result<u64, String> {
    let mut sorted = ranges.to_vec();
    sorted.sort_unstable();

    let mut expected = 0u64;
    for (offset, len) in sorted {
        if offset != expected {
            return Err(if offset < expected {
                format!("range at {offset} overlaps previous range ending at {expected}")
            } else {
                format!("gap between {expected} and {offset}")
            });
        }
        expected = offset + len;
    }
    Ok(expected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::TestStore;

    #[test]
    fn tiling_detects_gaps_and_overlaps() {
        assert_eq!(check_tiling(&[(3, 2), (0, 3)]), Ok(5));
        assert_eq!(check_tiling(&[]), Ok(0));
        assert!(check_tiling(&[(0, 3), (4, 1)]).unwrap_err().contains("gap"));
        assert!(check_tiling(&[(0, 3), (2, 1)]).unwrap_err().contains("overlaps"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn small_stress_run() {
        let store = TestStore::new();
        store.create("stress").await;

        let config = StressConfig {
            tasks: 4,
            appends_per_task: 20,
            max_payload: 8,
        };
        let (result, ranges) = stress_concurrent_appends(store.shared(), "stress", &config).await;

        assert_eq!(result.successful_ops, 80);
        assert_eq!(result.failed_ops, 0);
        let total = check_tiling(&ranges).unwrap();
        assert_eq!(store.info("stress").await.length, total);
    }
}
