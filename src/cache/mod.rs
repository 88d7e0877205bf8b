//! Cache Module
//!
//! Provides the unsynchronized TTL map and the serialized cache built on it.

mod entry;
mod map;
mod safe_cache;
mod stats;


// Re-export public types
pub use entry::{CacheEntry, Expiry};
pub use map::CacheMap;
pub use safe_cache::SafeCache;
pub use stats::CacheStats;

pub(crate) use entry::{deadline_after, FAR_FUTURE};
pub(crate) use safe_cache::{CacheState, SharedState};
