//! Storage Module
//!
//! Backends hold `(key -> value, expiration)` entries and the
//! `(tag -> keys)` index. Every mutating primitive applies to entries and
//! tag associations together or not at all, so the index never refers to a
//! key without an entry.
//!
//! # Backends
//! - [`MemoryStorage`]: ordered in-process maps, not persistent
//! - [`SqliteStorage`]: embedded SQLite database, durable across restarts

mod memory;
mod sqlite;

pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

use crate::cache::{CacheEntry, Scope};
use crate::error::Result;

// == Storage Trait ==
/// Primitives the cache engine is built from.
///
/// Timestamps are Unix milliseconds. An entry is live while
/// `expires_at > now`.
pub trait Storage: Send + Sync {
    /// Serialized value of the live entry for `key`.
    fn fetch(&self, key: &str, now: i64) -> Result<Option<String>>;

    /// True if a live entry exists for `key`.
    fn contains(&self, key: &str, now: i64) -> Result<bool>;

    /// Inserts or replaces the entry for `key`.
    ///
    /// Every previous tag association of `key` is dropped and replaced by
    /// `entry.tags`, which the caller has already de-duplicated.
    fn store(&self, key: &str, entry: CacheEntry) -> Result<()>;

    /// Removes the entries whose keys fall in `scope`, with their tags.
    fn remove(&self, scope: &Scope) -> Result<usize>;

    /// Removes the entries associated with any tag in any of `scopes`, with
    /// all of their tags. All scopes are removed in one atomic unit.
    fn remove_tagged(&self, scopes: &[Scope]) -> Result<usize>;

    /// Removes entries with `expires_at <= now`.
    fn remove_expired(&self, now: i64) -> Result<usize>;

    /// Removes everything.
    fn truncate(&self) -> Result<()>;

    /// Reclaims space held by removed rows.
    fn compact(&self) -> Result<()>;

    /// Number of stored entries, expired ones included.
    fn len(&self) -> Result<usize>;

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Tags associated with `key`, sorted.
    fn tags_of(&self, key: &str) -> Result<Vec<String>>;

    /// Keys associated with `tag`, sorted.
    fn keys_tagged(&self, tag: &str) -> Result<Vec<String>>;
}
