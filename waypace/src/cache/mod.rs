//! Segment cache: key derivation, TTL policy, and KV persistence.
//!
//! The engine persists exactly one kind of value - [`crate::model::CachedSegment`] -
//! through a namespaced key/value collaborator. Keys are deterministic and
//! versioned; values carry their own expiry stamp and are simply treated as
//! absent once it passes (no sweeper).

mod disk;
mod key;
mod kv;
mod memory;
mod segment;
mod types;

pub use disk::DiskKvStore;
pub use key::{segment_key, SCHEMA_VERSION};
pub use kv::{BoxFuture, KvStore};
pub use memory::MemoryKvStore;
pub use segment::{SegmentCache, TtlConfig};
pub use types::StoreError;
