//! Pending operation results.
//!
//! Every segment store operation returns immediately with a [`Pending`]
//! handle. The work itself runs on the tokio blocking pool; the handle
//! resolves with the outcome, or with [`SegmentError::Timeout`] once the
//! operation's deadline passes. A timed out operation is not cancelled: the
//! background task still runs to completion and leaves the store consistent.

use crate::error::{SegmentError, SegmentResult};
use crate::stats::StoreStats;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::time::Instant;
use tracing::warn;

type BoxedResult<T> = Pin<Box<dyn Future<Output = SegmentResult<T>> + Send>>;

/// The pending result of an asynchronous store operation.
///
/// Await it to obtain the operation's outcome. Dropping it does not cancel
/// the operation.
#[must_use = "dropping a Pending discards the outcome but does not cancel the operation"]
pub struct Pending<T> {
    operation: &'static str,
    inner: BoxedResult<T>,
}

impl<T> Pending<T> {
    pub(crate) fn from_future<F>(operation: &'static str, future: F) -> Self
    where
        F: Future<Output = SegmentResult<T>> + Send + 'static,
    {
        Self {
            operation,
            inner: Box::pin(future),
        }
    }

    /// Creates a pending result that is already complete.
    pub fn ready(operation: &'static str, result: SegmentResult<T>) -> Self
    where
        T: Send + 'static,
    {
        Self::from_future(operation, std::future::ready(result))
    }

    /// Returns the name of the operation this result belongs to.
    pub fn operation(&self) -> &'static str {
        self.operation
    }
}

impl<T> Future for Pending<T> {
    type Output = SegmentResult<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.as_mut().poll(cx)
    }
}

impl<T> fmt::Debug for Pending<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pending")
            .field("operation", &self.operation)
            .finish_non_exhaustive()
    }
}

/// Runs store operations in the background and hands out [`Pending`] results.
#[derive(Clone)]
pub(crate) struct Executor {
    handle: Handle,
    stats: Arc<StoreStats>,
}

impl Executor {
    pub(crate) fn new(handle: Handle, stats: Arc<StoreStats>) -> Self {
        Self { handle, stats }
    }

    pub(crate) fn stats(&self) -> &Arc<StoreStats> {
        &self.stats
    }

    /// Starts `work` on the blocking pool and returns its pending result.
    ///
    /// The deadline is fixed when this is called, not when the result is
    /// first polled.
    pub(crate) fn submit<T, F>(&self, operation: &'static str, timeout: Duration, work: F) -> Pending<T>
    where
        T: Send + 'static,
        F: FnOnce() -> SegmentResult<T> + Send + 'static,
    {
        let deadline = Instant::now().checked_add(timeout);
        let task = self.handle.spawn_blocking(work);
        let stats = Arc::clone(&self.stats);

        Pending::from_future(operation, async move {
            let joined = match deadline {
                Some(deadline) => match tokio::time::timeout_at(deadline, task).await {
                    Ok(joined) => joined,
                    Err(_) => {
                        stats.record_timeout();
                        warn!(operation, ?timeout, "operation timed out, work continues in background");
                        return Err(SegmentError::Timeout { operation, timeout });
                    }
                },
                // Deadline beyond the clock's range: wait indefinitely.
                None => task.await,
            };

            let result = joined
                .map_err(|e| SegmentError::task_failed(e.to_string()))
                .and_then(|result| result);
            if result.is_err() {
                stats.record_error();
            }
            result
        })
    }
}

impl fmt::Debug for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executor").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn executor() -> Executor {
        Executor::new(Handle::current(), Arc::new(StoreStats::new()))
    }

    #[tokio::test]
    async fn submit_resolves_with_work_result() {
        let pending = executor().submit("answer", Duration::from_secs(5), || Ok(42u64));
        assert_eq!(pending.operation(), "answer");
        assert_eq!(pending.await.unwrap(), 42);
    }

    #[tokio::test]
    async fn submit_propagates_work_error() {
        let executor = executor();
        let pending: Pending<()> = executor.submit("fail", Duration::from_secs(5), || {
            Err(SegmentError::not_found("missing"))
        });

        assert!(pending.await.unwrap_err().is_not_found());
        assert_eq!(executor.stats().errors(), 1);
    }

    #[tokio::test]
    async fn timeout_fails_result_but_work_completes() {
        let executor = executor();
        let finished = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&finished);

        let pending = executor.submit("slow", Duration::from_millis(10), move || {
            std::thread::sleep(Duration::from_millis(200));
            flag.store(true, Ordering::SeqCst);
            Ok(())
        });

        let err = pending.await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert_eq!(executor.stats().timeouts(), 1);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn huge_timeout_waits_for_completion() {
        let pending = executor().submit("patient", Duration::MAX, || Ok("done"));
        assert_eq!(pending.await.unwrap(), "done");
    }

    #[tokio::test]
    async fn ready_is_already_complete() {
        let pending = Pending::ready("noop", Ok(7));
        assert_eq!(pending.await.unwrap(), 7);
    }
}
