//! Day-level travel orchestration.
//!
//! Fills in missing segments for a day with as few provider calls as
//! possible: cache probes first, then one batched call over the day's
//! default-mode waypoint chain, then independent per-edge calls for
//! override-diverging pairs.

mod day;
mod types;

pub use day::DayTravelOrchestrator;
pub use types::SegmentOutcome;
