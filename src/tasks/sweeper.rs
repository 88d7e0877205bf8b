//! Eviction Sweeper Task
//!
//! Background task that periodically removes expired cache entries, even
//! for keys nobody reads again.

use std::hash::Hash;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::cache::{deadline_after, SharedState, FAR_FUTURE};
use crate::config::CacheConfig;

/// Spawns the task that sweeps `state` every `config.eviction_interval`.
///
/// The first sweep runs one interval after spawning. Ticks missed while a
/// sweep holds the lock are delayed rather than replayed in a burst.
///
/// # Returns
/// A JoinHandle that the owning cache aborts on shutdown or drop.
pub(crate) fn spawn_sweeper<K, V>(
    runtime: &Handle,
    state: SharedState<K, V>,
    config: &CacheConfig,
) -> JoinHandle<()>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Send + 'static,
{
    // Longer periods would overflow Instant arithmetic inside the ticker
    let period = config.eviction_interval.min(FAR_FUTURE);
    let batch_size = config.sweep_batch_size;

    runtime.spawn(async move {
        info!(
            interval_ms = u64::try_from(period.as_millis()).unwrap_or(u64::MAX),
            batch_size = ?batch_size,
            "Starting eviction task"
        );

        let mut ticker = interval_at(deadline_after(Instant::now(), period), period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let removed = sweep_expired(&state, batch_size).await;
            if removed > 0 {
                info!("Eviction sweep: removed {} expired entries", removed);
            } else {
                debug!("Eviction sweep: no expired entries found");
            }
        }
    })
}

/// Runs one eviction pass over a snapshot of the key set.
///
/// All keys are checked against a single scan timestamp. With no batch
/// size the whole pass holds the lock once; otherwise the lock is taken
/// once per chunk of keys and other operations may run in between.
pub(crate) async fn sweep_expired<K, V>(
    state: &SharedState<K, V>,
    batch_size: Option<usize>,
) -> usize
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Send,
{
    let now = Instant::now();

    let Some(batch_size) = batch_size else {
        let mut guard = state.lock().await;
        let removed = guard.map.evict_expired(now);
        guard.stats.record_expirations(removed);
        return removed;
    };

    let keys = state.lock().await.map.keys();
    let mut removed = 0;
    for chunk in keys.chunks(batch_size.max(1)) {
        {
            let mut guard = state.lock().await;
            let count = guard.map.evict_keys(chunk, now);
            guard.stats.record_expirations(count);
            removed += count;
        }
        tokio::task::yield_now().await;
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::sync::Mutex;

    use crate::cache::{CacheEntry, CacheState};

    fn shared_with(entries: &[(u32, u64)]) -> SharedState<u32, &'static str> {
        let mut state = CacheState::new();
        let now = Instant::now();
        for (key, ttl_ms) in entries {
            state
                .map
                .put(*key, CacheEntry::with_ttl("v", now, Duration::from_millis(*ttl_ms)));
        }
        Arc::new(Mutex::new(state))
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_removes_only_expired() {
        let state = shared_with(&[(1, 100), (2, 100), (3, 10_000)]);

        tokio::time::advance(Duration::from_millis(200)).await;

        assert_eq!(sweep_expired(&state, None).await, 2);
        let guard = state.lock().await;
        assert_eq!(guard.map.len(), 1);
        assert_eq!(guard.stats.expirations, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_batched_sweep_matches_atomic_sweep() {
        let entries: Vec<(u32, u64)> = (0..25)
            .map(|i| (i, if i % 3 == 0 { 50 } else { 5_000 }))
            .collect();
        let atomic = shared_with(&entries);
        let batched = shared_with(&entries);

        tokio::time::advance(Duration::from_millis(100)).await;

        let removed_atomic = sweep_expired(&atomic, None).await;
        let removed_batched = sweep_expired(&batched, Some(4)).await;

        assert_eq!(removed_atomic, 9);
        assert_eq!(removed_atomic, removed_batched);
        assert_eq!(batched.lock().await.map.len(), 16);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_task_runs_on_interval() {
        let state = shared_with(&[(1, 150)]);
        let config = CacheConfig::new(Duration::from_millis(100));

        let handle = spawn_sweeper(&Handle::current(), Arc::clone(&state), &config);

        // First sweep at 100ms finds the entry still live
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(state.lock().await.map.len(), 1);

        // Second sweep at 200ms removes it
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(state.lock().await.map.len(), 0);

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_task_survives_huge_interval() {
        let state = shared_with(&[(1, 10)]);
        let config = CacheConfig::new(Duration::MAX);

        let handle = spawn_sweeper(&Handle::current(), Arc::clone(&state), &config);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!handle.is_finished(), "Sweeper should keep waiting for its first tick");
        assert_eq!(state.lock().await.map.len(), 1);

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_task_can_be_aborted() {
        let state = shared_with(&[]);
        let config = CacheConfig::new(Duration::from_millis(10));

        let handle = spawn_sweeper(&Handle::current(), state, &config);
        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
