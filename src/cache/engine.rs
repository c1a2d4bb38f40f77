//! Cache Engine Module
//!
//! Implements the cache contract over one storage backend: value
//! serialization, TTL resolution, tag de-duplication and the key and tag
//! scopes used by recursive delete and clear.

use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use crate::cache::path::dedup_tags;
use crate::cache::{
    current_timestamp_ms, Cache, CacheEntry, CacheStats, EntryOptions, Maintenance, Namespace,
    Scope, StatsRecorder, ValueSource,
};
use crate::config::Config;
use crate::error::Result;
use crate::storage::{MemoryStorage, SqliteStorage, Storage};

// == Cache Engine ==
/// Cache over a [`Storage`] backend.
///
/// Share it behind an `Arc`; every operation takes `&self` and the backend
/// provides the locking.
#[derive(Debug)]
pub struct CacheEngine<S> {
    /// Entry and tag storage
    storage: S,
    /// Default TTL in seconds for entries without explicit TTL
    default_ttl: u64,
    /// Activity counters
    stats: StatsRecorder,
}

impl<S: Storage> CacheEngine<S> {
    // == Constructor ==
    /// Creates a new engine over `storage`.
    ///
    /// # Arguments
    /// * `storage` - Backend holding entries and the tag index
    /// * `default_ttl` - Default TTL in seconds for entries without explicit TTL
    pub fn new(storage: S, default_ttl: u64) -> Self {
        Self {
            storage,
            default_ttl,
            stats: StatsRecorder::new(),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn default_ttl(&self) -> u64 {
        self.default_ttl
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }

    // == Tag Lookups ==
    /// Tags `key` was last set with, sorted.
    pub fn tags(&self, key: &str) -> Result<Vec<String>> {
        self.storage.tags_of(key)
    }

    /// Keys currently associated with `tag`, sorted.
    pub fn tagged_keys(&self, tag: &str) -> Result<Vec<String>> {
        self.storage.keys_tagged(tag)
    }
}

impl CacheEngine<MemoryStorage> {
    /// Creates a non-persistent engine.
    pub fn in_memory(default_ttl: u64) -> Self {
        Self::new(MemoryStorage::new(), default_ttl)
    }
}

impl CacheEngine<SqliteStorage> {
    /// Opens a persistent engine at `path`.
    ///
    /// When `clean_on_open` is set, expired entries are swept before
    /// returning. The decision belongs to the caller.
    pub fn open(path: impl AsRef<Path>, default_ttl: u64, clean_on_open: bool) -> Result<Self> {
        let engine = Self::new(SqliteStorage::open(path)?, default_ttl);
        if clean_on_open {
            engine.clean()?;
        }
        Ok(engine)
    }

    /// Opens the persistent engine described by `config`.
    pub fn from_config(config: &Config, clean_on_open: bool) -> Result<Self> {
        Self::open(&config.database_path, config.default_ttl, clean_on_open)
    }
}

impl<S: Storage + 'static> Cache for CacheEngine<S> {
    // == Get ==
    fn get(
        &self,
        key: &str,
        default: Option<ValueSource<'_>>,
        options: EntryOptions,
    ) -> Result<Option<Value>> {
        if let Some(raw) = self.storage.fetch(key, current_timestamp_ms())? {
            self.stats.record_hit();
            return Ok(Some(serde_json::from_str(&raw)?));
        }

        self.stats.record_miss();
        match default {
            Some(default) => self.set(key, default, options).map(Some),
            None => Ok(None),
        }
    }

    // == Set ==
    fn set(&self, key: &str, value: ValueSource<'_>, options: EntryOptions) -> Result<Value> {
        let value = value.resolve();
        let serialized = serde_json::to_string(&value)?;
        let ttl = options.ttl.unwrap_or(self.default_ttl);
        let tags = dedup_tags(options.tags);

        debug!("Storing '{}' for {}s with {} tag(s)", key, ttl, tags.len());
        self.storage
            .store(key, CacheEntry::new(serialized, ttl, tags))?;
        self.stats.record_write();

        Ok(value)
    }

    // == Has ==
    fn has(&self, key: &str) -> Result<bool> {
        self.storage.contains(key, current_timestamp_ms())
    }

    // == Delete ==
    fn delete(&self, key: &str, recursive: bool) -> Result<()> {
        let removed = self.storage.remove(&Scope::new(key, recursive))?;
        debug!(
            "Deleted '{}' (recursive: {}): {} entries removed",
            key, recursive, removed
        );
        self.stats.record_removals(removed);
        Ok(())
    }

    // == Clear ==
    fn clear(&self, tags: &[&str], recursive: bool) -> Result<()> {
        let scopes: Vec<Scope> = tags.iter().map(|tag| Scope::new(*tag, recursive)).collect();
        let removed = self.storage.remove_tagged(&scopes)?;
        debug!(
            "Cleared tags {:?} (recursive: {}): {} entries removed",
            tags, recursive, removed
        );
        self.stats.record_removals(removed);
        Ok(())
    }

    fn namespace(self: Arc<Self>, prefix: &str, options: EntryOptions) -> Arc<Namespace> {
        Arc::new(Namespace::new(self, prefix, options))
    }
}

impl<S: Storage> Maintenance for CacheEngine<S> {
    // == Flush ==
    fn flush(&self) -> Result<()> {
        let count = self.storage.len()?;
        self.storage.truncate()?;
        self.stats.record_removals(count);
        info!("Cache flushed: {} entries removed", count);
        Ok(())
    }

    // == Clean Expired ==
    fn clean(&self) -> Result<usize> {
        let removed = self.storage.remove_expired(current_timestamp_ms())?;
        self.stats.record_removals(removed);
        if removed > 0 {
            info!("Expired sweep: removed {} entries", removed);
        } else {
            debug!("Expired sweep: nothing to remove");
        }
        Ok(removed)
    }

    // == Compact ==
    fn compact(&self) -> Result<()> {
        info!("Compacting cache storage");
        self.storage.compact()
    }
}
