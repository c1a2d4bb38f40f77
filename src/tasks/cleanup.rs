//! Expired Entry Sweep Task
//!
//! Background task that periodically removes expired cache entries.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::Maintenance;

/// Spawns a background task that periodically sweeps expired entries.
///
/// The task runs in an infinite loop, sleeping for the specified interval
/// between runs. Each sweep runs on the blocking pool since backends may do
/// disk I/O. A failed sweep is logged and retried on the next tick.
///
/// # Arguments
/// * `cache` - Shared cache supporting maintenance
/// * `cleanup_interval_secs` - Interval in seconds between sweeps
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during shutdown.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(CacheEngine::in_memory(300));
/// let cleanup_handle = spawn_cleanup_task(cache.clone(), 60);
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task<M>(cache: Arc<M>, cleanup_interval_secs: u64) -> JoinHandle<()>
where
    M: Maintenance + ?Sized + 'static,
{
    let interval = Duration::from_secs(cleanup_interval_secs);

    tokio::spawn(async move {
        info!(
            "Starting expired entry sweep with interval of {} seconds",
            cleanup_interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            let cache = Arc::clone(&cache);
            match tokio::task::spawn_blocking(move || cache.clean()).await {
                Ok(Ok(0)) => debug!("Expired sweep: no expired entries found"),
                Ok(Ok(removed)) => info!("Expired sweep: removed {} entries", removed),
                Ok(Err(e)) => warn!("Expired sweep failed: {}", e),
                Err(e) => warn!("Expired sweep task failed to complete: {}", e),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{Cache, CacheEngine, EntryOptions};
    use crate::storage::{SqliteStorage, Storage};
    use serde_json::json;

    #[tokio::test]
    async fn test_cleanup_task_removes_expired_entries() {
        let cache = Arc::new(CacheEngine::in_memory(300));

        cache
            .set(
                "expire_soon",
                json!("value").into(),
                EntryOptions::new().with_ttl(0).with_tag("t"),
            )
            .unwrap();
        assert_eq!(cache.storage().len().unwrap(), 1);

        let handle = spawn_cleanup_task(cache.clone(), 1);

        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert!(cache.storage().is_empty().unwrap(), "Expired entry should have been swept");
        assert!(cache.tagged_keys("t").unwrap().is_empty());

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_preserves_valid_entries() {
        let cache = Arc::new(CacheEngine::new(SqliteStorage::open_in_memory().unwrap(), 300));

        cache
            .set("long_lived", json!("value").into(), EntryOptions::new().with_ttl(3600))
            .unwrap();

        let handle = spawn_cleanup_task(cache.clone(), 1);

        tokio::time::sleep(Duration::from_millis(1500)).await;

        let result = cache.get("long_lived", None, EntryOptions::new()).unwrap();
        assert_eq!(result, Some(json!("value")), "Valid entry should not be removed");

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_accepts_trait_object() {
        let cache: Arc<dyn Maintenance> = Arc::new(CacheEngine::in_memory(300));

        let handle = spawn_cleanup_task(cache, 1);

        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
