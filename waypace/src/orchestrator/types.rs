//! Orchestration outcome types.

use crate::model::CachedSegment;

/// Outcome of a single-pair route computation.
///
/// Absent credentials is an expected caller state, not an error: callers
/// fall back silently to haversine estimation when they see `NoApiKey`.
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentOutcome {
    /// Served from the cache.
    Cached(CachedSegment),
    /// Freshly computed via the provider (and written to the cache).
    Computed(CachedSegment),
    /// No provider credentials are configured.
    NoApiKey,
}

impl SegmentOutcome {
    /// The segment, if one was produced.
    pub fn segment(&self) -> Option<&CachedSegment> {
        match self {
            SegmentOutcome::Cached(seg) | SegmentOutcome::Computed(seg) => Some(seg),
            SegmentOutcome::NoApiKey => None,
        }
    }
}
