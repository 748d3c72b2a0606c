//! Request pacing for upstream routing targets.
//!
//! Each named upstream target gets one serial dispatch lane enforcing a
//! minimum interval between dispatches. All call sites funnel through the
//! same [`PacedQueue`] for a given name, handed out by a [`QueueRegistry`]
//! owned by the composition root. Different targets pace independently.

mod queue;
mod registry;
mod retry;

pub use queue::PacedQueue;
pub use registry::QueueRegistry;
pub use retry::{send_with_retry, PacingError, RetryPolicy};
