//! In-Memory Storage Module
//!
//! Non-persistent backend built from two ordered maps: entries by key (each
//! entry carries its own tag list) and keys by tag. Both maps sit behind a
//! single lock and are updated together.

use std::collections::{BTreeMap, BTreeSet};

use parking_lot::RwLock;

use crate::cache::{CacheEntry, Scope};
use crate::error::Result;
use crate::storage::Storage;

#[derive(Debug, Default)]
struct MemoryState {
    /// key -> entry (value, expiration, tags)
    entries: BTreeMap<String, CacheEntry>,
    /// tag -> keys
    tag_index: BTreeMap<String, BTreeSet<String>>,
}

impl MemoryState {
    /// Removes `key` and its tag associations. Returns false if absent.
    fn detach(&mut self, key: &str) -> bool {
        let Some(entry) = self.entries.remove(key) else {
            return false;
        };
        for tag in &entry.tags {
            if let Some(keys) = self.tag_index.get_mut(tag) {
                keys.remove(key);
                if keys.is_empty() {
                    self.tag_index.remove(tag);
                }
            }
        }
        true
    }

    fn keys_in(&self, scope: &Scope) -> Vec<String> {
        let mut keys = Vec::new();
        if self.entries.contains_key(scope.root()) {
            keys.push(scope.root().to_string());
        }
        if let Some((lower, upper)) = scope.descendant_bounds() {
            keys.extend(self.entries.range(lower..upper).map(|(key, _)| key.clone()));
        }
        keys
    }

    fn keys_tagged_in(&self, scope: &Scope) -> Vec<String> {
        let mut keys = Vec::new();
        if let Some(tagged) = self.tag_index.get(scope.root()) {
            keys.extend(tagged.iter().cloned());
        }
        if let Some((lower, upper)) = scope.descendant_bounds() {
            for (_, tagged) in self.tag_index.range(lower..upper) {
                keys.extend(tagged.iter().cloned());
            }
        }
        keys
    }

    fn detach_all<I>(&mut self, keys: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        keys.into_iter().filter(|key| self.detach(key)).count()
    }
}

// == Memory Storage ==
/// In-process storage. Mutations take the write lock, reads the read lock.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    state: RwLock<MemoryState>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn fetch(&self, key: &str, now: i64) -> Result<Option<String>> {
        let state = self.state.read();
        Ok(state
            .entries
            .get(key)
            .filter(|entry| !entry.is_expired_at(now))
            .map(|entry| entry.value.clone()))
    }

    fn contains(&self, key: &str, now: i64) -> Result<bool> {
        let state = self.state.read();
        Ok(state
            .entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired_at(now)))
    }

    fn store(&self, key: &str, entry: CacheEntry) -> Result<()> {
        let mut state = self.state.write();
        state.detach(key);
        for tag in &entry.tags {
            state
                .tag_index
                .entry(tag.clone())
                .or_default()
                .insert(key.to_string());
        }
        state.entries.insert(key.to_string(), entry);
        Ok(())
    }

    fn remove(&self, scope: &Scope) -> Result<usize> {
        let mut state = self.state.write();
        let keys = state.keys_in(scope);
        Ok(state.detach_all(keys))
    }

    fn remove_tagged(&self, scopes: &[Scope]) -> Result<usize> {
        let mut state = self.state.write();
        let mut keys = BTreeSet::new();
        for scope in scopes {
            keys.extend(state.keys_tagged_in(scope));
        }
        Ok(state.detach_all(keys))
    }

    fn remove_expired(&self, now: i64) -> Result<usize> {
        let mut state = self.state.write();
        let expired: Vec<String> = state
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();
        Ok(state.detach_all(expired))
    }

    fn truncate(&self) -> Result<()> {
        let mut state = self.state.write();
        state.entries.clear();
        state.tag_index.clear();
        Ok(())
    }

    fn compact(&self) -> Result<()> {
        // Ordered maps free their nodes on removal.
        Ok(())
    }

    fn len(&self) -> Result<usize> {
        Ok(self.state.read().entries.len())
    }

    fn tags_of(&self, key: &str) -> Result<Vec<String>> {
        let state = self.state.read();
        let mut tags = state
            .entries
            .get(key)
            .map(|entry| entry.tags.clone())
            .unwrap_or_default();
        tags.sort();
        Ok(tags)
    }

    fn keys_tagged(&self, tag: &str) -> Result<Vec<String>> {
        let state = self.state.read();
        Ok(state
            .tag_index
            .get(tag)
            .map(|keys| keys.iter().cloned().collect())
            .unwrap_or_default())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::current_timestamp_ms;

    fn entry(value: &str, tags: &[&str]) -> CacheEntry {
        CacheEntry::new(
            value.to_string(),
            300,
            tags.iter().map(|t| t.to_string()).collect(),
        )
    }

    #[test]
    fn test_store_and_fetch() {
        let storage = MemoryStorage::new();
        let now = current_timestamp_ms();

        storage.store("k", entry("1", &[])).unwrap();

        assert_eq!(storage.fetch("k", now).unwrap(), Some("1".to_string()));
        assert!(storage.contains("k", now).unwrap());
        assert_eq!(storage.fetch("missing", now).unwrap(), None);
    }

    #[test]
    fn test_fetch_ignores_expired() {
        let storage = MemoryStorage::new();
        let mut expired = entry("1", &["t"]);
        expired.expires_at = 1_000;
        storage.store("k", expired).unwrap();

        assert_eq!(storage.fetch("k", 1_000).unwrap(), None);
        assert!(!storage.contains("k", 1_000).unwrap());
        assert!(storage.contains("k", 999).unwrap());
        // Lazily detected, still stored
        assert_eq!(storage.len().unwrap(), 1);
    }

    #[test]
    fn test_overwrite_replaces_tags() {
        let storage = MemoryStorage::new();

        storage.store("k", entry("1", &["t1", "shared"])).unwrap();
        storage.store("k", entry("2", &["t2", "shared"])).unwrap();

        assert_eq!(storage.tags_of("k").unwrap(), vec!["shared", "t2"]);
        assert!(storage.keys_tagged("t1").unwrap().is_empty());
        assert_eq!(storage.keys_tagged("t2").unwrap(), vec!["k"]);
        assert_eq!(storage.keys_tagged("shared").unwrap(), vec!["k"]);
    }

    #[test]
    fn test_remove_drops_empty_tags() {
        let storage = MemoryStorage::new();

        storage.store("k", entry("1", &["t"])).unwrap();
        assert_eq!(storage.remove(&Scope::exact("k")).unwrap(), 1);

        assert!(storage.keys_tagged("t").unwrap().is_empty());
        assert!(storage.state.read().tag_index.is_empty());
    }

    #[test]
    fn test_remove_subtree() {
        let storage = MemoryStorage::new();
        for key in ["a", "a/b", "a/b/c", "ab", "a0", "b"] {
            storage.store(key, entry("1", &[])).unwrap();
        }

        assert_eq!(storage.remove(&Scope::subtree("a")).unwrap(), 3);

        let state = storage.state.read();
        let left: Vec<&str> = state.entries.keys().map(String::as_str).collect();
        assert_eq!(left, vec!["a0", "ab", "b"]);
    }

    #[test]
    fn test_remove_tagged_subtree() {
        let storage = MemoryStorage::new();
        storage.store("k1", entry("1", &["p"])).unwrap();
        storage.store("k2", entry("1", &["p/c"])).unwrap();
        storage.store("k3", entry("1", &["p/c/g", "other"])).unwrap();
        storage.store("k4", entry("1", &["pp", "other"])).unwrap();

        assert_eq!(storage.remove_tagged(&[Scope::subtree("p")]).unwrap(), 3);

        assert_eq!(storage.len().unwrap(), 1);
        assert_eq!(storage.keys_tagged("other").unwrap(), vec!["k4"]);
    }

    #[test]
    fn test_remove_tagged_several_scopes() {
        let storage = MemoryStorage::new();
        storage.store("k1", entry("1", &["a", "b"])).unwrap();
        storage.store("k2", entry("1", &["b/x"])).unwrap();
        storage.store("k3", entry("1", &["c", "b"])).unwrap();
        storage.store("k4", entry("1", &["c"])).unwrap();

        let removed = storage
            .remove_tagged(&[Scope::exact("a"), Scope::subtree("b")])
            .unwrap();

        assert_eq!(removed, 3);
        assert_eq!(storage.keys_tagged("c").unwrap(), vec!["k4"]);
        let state = storage.state.read();
        let tags: Vec<&str> = state.tag_index.keys().map(String::as_str).collect();
        assert_eq!(tags, vec!["c"]);
    }

    #[test]
    fn test_remove_expired() {
        let storage = MemoryStorage::new();
        let mut old = entry("1", &["t"]);
        old.expires_at = 10;
        storage.store("old", old).unwrap();
        storage.store("fresh", entry("1", &["t"])).unwrap();

        assert_eq!(storage.remove_expired(10).unwrap(), 1);
        assert_eq!(storage.keys_tagged("t").unwrap(), vec!["fresh"]);
    }

    #[test]
    fn test_truncate() {
        let storage = MemoryStorage::new();
        storage.store("k", entry("1", &["t"])).unwrap();

        storage.truncate().unwrap();

        assert!(storage.is_empty().unwrap());
        assert!(storage.keys_tagged("t").unwrap().is_empty());
    }
}
