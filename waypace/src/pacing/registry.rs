//! Named-queue registry.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tracing::debug;

use super::queue::PacedQueue;

/// Default minimum interval between dispatches to one target.
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(1000);

/// Hands out the shared [`PacedQueue`] for each named upstream target.
///
/// Queues are created lazily on first use and shared by every call site that
/// asks for the same name, so all traffic to one target funnels through one
/// pacing lane. The registry is owned by the composition root and injected
/// into components that need a queue; there is no process-global state.
pub struct QueueRegistry {
    min_interval: Duration,
    queues: DashMap<String, Arc<PacedQueue>>,
}

impl QueueRegistry {
    /// Create a registry whose queues pace at the given minimum interval.
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            queues: DashMap::new(),
        }
    }

    /// Get the shared queue for `name`, creating it on first use.
    pub fn queue(&self, name: &str) -> Arc<PacedQueue> {
        self.queues
            .entry(name.to_string())
            .or_insert_with(|| {
                debug!(queue = name, interval_ms = self.min_interval.as_millis() as u64, "Creating paced queue");
                Arc::new(PacedQueue::new(name, self.min_interval))
            })
            .clone()
    }
}

impl Default for QueueRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_INTERVAL)
    }
}
