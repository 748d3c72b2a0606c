//! Serial, interval-paced dispatch lane for one upstream target.

use std::future::Future;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::trace;

/// Serializes calls to one named upstream target at a minimum interval.
///
/// Tasks enqueued on the same queue run strictly FIFO: the dispatch lock is
/// held for the duration of each task, and the next task additionally waits
/// out the remainder of the minimum interval since the previous dispatch.
/// Queues for different targets never contend.
pub struct PacedQueue {
    name: String,
    min_interval: Duration,
    /// Timestamp of the last dispatch on this lane. Guarded by the lane
    /// mutex so exactly one dispatcher updates it at a time.
    lane: Mutex<Option<Instant>>,
}

impl PacedQueue {
    /// Create a queue for the given target name and minimum dispatch
    /// interval.
    pub fn new(name: impl Into<String>, min_interval: Duration) -> Self {
        Self {
            name: name.into(),
            min_interval,
            lane: Mutex::new(None),
        }
    }

    /// The upstream target name this queue paces.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run `task` after the previously enqueued task completes and the
    /// minimum interval has elapsed since the last dispatch.
    ///
    /// Returns the task's output unchanged; retry policy lives in the
    /// caller (see [`super::send_with_retry`]).
    pub async fn enqueue<T, F>(&self, task: F) -> T
    where
        F: Future<Output = T>,
    {
        let mut last_dispatch = self.lane.lock().await;

        if let Some(previous) = *last_dispatch {
            let since = previous.elapsed();
            if since < self.min_interval {
                let wait = self.min_interval - since;
                trace!(queue = %self.name, wait_ms = wait.as_millis() as u64, "Pacing dispatch");
                tokio::time::sleep(wait).await;
            }
        }

        *last_dispatch = Some(Instant::now());
        task.await
    }
}
