//! SQLite Storage Module
//!
//! Persistent backend on an embedded SQLite database. Two tables:
//!
//! - `cache_entries(key UNIQUE, value, expires_at)`
//! - `cache_tags(tag, key)`, unique on `(tag, key)`, whose `key` references
//!   `cache_entries(key)` with `ON DELETE CASCADE`
//!
//! Each primitive runs in one transaction, however many scopes it covers. Removing an entry row drops
//! its tag rows through the cascade.

use std::path::Path;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

use crate::cache::{CacheEntry, Scope};
use crate::error::Result;
use crate::storage::Storage;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS cache_entries (
        key TEXT NOT NULL UNIQUE,
        value TEXT NOT NULL,
        expires_at INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_cache_entries_expires_at ON cache_entries(expires_at);
    CREATE TABLE IF NOT EXISTS cache_tags (
        tag TEXT NOT NULL,
        key TEXT NOT NULL REFERENCES cache_entries(key) ON DELETE CASCADE,
        UNIQUE (tag, key)
    );
    CREATE INDEX IF NOT EXISTS idx_cache_tags_key ON cache_tags(key);
";

// == SQLite Storage ==
/// Durable storage. One connection, serialized behind a mutex.
#[derive(Debug)]
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    // == Constructors ==
    /// Opens the database at `path`, creating the file and schema if needed.
    ///
    /// An existing database is used as-is.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        let storage = Self::init(conn)?;
        info!("Opened persistent cache at {}", path.display());
        Ok(storage)
    }

    /// Opens a private in-memory database. Nothing survives the instance.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        // Per-connection setting; required for the tag cascade
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Runs `exact` or `subtree` for each scope, binding the root as `?1` and
    /// the descendant bounds as `?2` and `?3`. All scopes share one
    /// transaction; a failing statement rolls back the earlier ones.
    fn delete_scoped(&self, scopes: &[Scope], exact: &str, subtree: &str) -> Result<usize> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let mut removed = 0;
        for scope in scopes {
            removed += match scope.descendant_bounds() {
                Some((lower, upper)) => tx.execute(subtree, params![scope.root(), lower, upper])?,
                None => tx.execute(exact, params![scope.root()])?,
            };
        }
        tx.commit()?;
        Ok(removed)
    }
}

impl Storage for SqliteStorage {
    fn fetch(&self, key: &str, now: i64) -> Result<Option<String>> {
        let conn = self.conn.lock();
        let value = conn
            .query_row(
                "SELECT value FROM cache_entries WHERE key = ?1 AND expires_at > ?2",
                params![key, now],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn contains(&self, key: &str, now: i64) -> Result<bool> {
        let conn = self.conn.lock();
        let exists = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM cache_entries WHERE key = ?1 AND expires_at > ?2)",
            params![key, now],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn store(&self, key: &str, entry: CacheEntry) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM cache_tags WHERE key = ?1", params![key])?;
        tx.execute(
            "INSERT INTO cache_entries (key, value, expires_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, expires_at = excluded.expires_at",
            params![key, entry.value, entry.expires_at],
        )?;
        {
            let mut insert_tag =
                tx.prepare("INSERT OR IGNORE INTO cache_tags (tag, key) VALUES (?1, ?2)")?;
            for tag in &entry.tags {
                insert_tag.execute(params![tag, key])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn remove(&self, scope: &Scope) -> Result<usize> {
        self.delete_scoped(
            std::slice::from_ref(scope),
            "DELETE FROM cache_entries WHERE key = ?1",
            "DELETE FROM cache_entries WHERE key = ?1 OR (key >= ?2 AND key < ?3)",
        )
    }

    fn remove_tagged(&self, scopes: &[Scope]) -> Result<usize> {
        self.delete_scoped(
            scopes,
            "DELETE FROM cache_entries WHERE key IN
                (SELECT key FROM cache_tags WHERE tag = ?1)",
            "DELETE FROM cache_entries WHERE key IN
                (SELECT key FROM cache_tags WHERE tag = ?1 OR (tag >= ?2 AND tag < ?3))",
        )
    }

    fn remove_expired(&self, now: i64) -> Result<usize> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let removed = tx.execute(
            "DELETE FROM cache_entries WHERE expires_at <= ?1",
            params![now],
        )?;
        tx.commit()?;
        Ok(removed)
    }

    fn truncate(&self) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM cache_tags", [])?;
        tx.execute("DELETE FROM cache_entries", [])?;
        tx.commit()?;
        Ok(())
    }

    fn compact(&self) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute_batch("VACUUM")?;
        Ok(())
    }

    fn len(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM cache_entries", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn tags_of(&self, key: &str) -> Result<Vec<String>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT tag FROM cache_tags WHERE key = ?1 ORDER BY tag")?;
        let tags = stmt
            .query_map(params![key], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(tags)
    }

    fn keys_tagged(&self, tag: &str) -> Result<Vec<String>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT key FROM cache_tags WHERE tag = ?1 ORDER BY key")?;
        let keys = stmt
            .query_map(params![tag], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(keys)
    }
}
