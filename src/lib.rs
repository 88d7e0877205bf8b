//! Safe CacheMap - a generic in-process cache with TTL expiry
//!
//! Values carry an absolute deadline and read as absent once it passes.
//! [`SafeCache`] serializes every operation through one lock and runs a
//! background task that sweeps expired entries on a fixed interval.
//!
//! ```ignore
//! use std::time::Duration;
//! use safe_cachemap::{Instant, SafeCache};
//!
//! let cache = SafeCache::new(Duration::from_secs(1))?;
//! cache.put("a", 100, Duration::from_secs(1)).await;
//! assert_eq!(cache.get("a", Instant::now()).await, Some(100));
//! cache.shutdown();
//! ```

pub mod cache;
pub mod config;
pub mod error;
mod tasks;

pub use cache::{CacheEntry, CacheMap, CacheStats, Expiry, SafeCache};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use tokio::time::Instant;
