//! Tagcache - A key-value cache with tag invalidation
//!
//! Provides TTL expiration, tag-based grouped invalidation and `/`-structured
//! hierarchical keys and tags over interchangeable storage backends.

pub mod cache;
pub mod config;
pub mod error;
pub mod storage;
pub mod tasks;

pub use cache::{Cache, CacheEngine, EntryOptions, Maintenance, Namespace, ValueSource};
pub use config::Config;
pub use error::{CacheError, Result};
pub use storage::{MemoryStorage, SqliteStorage, Storage};
pub use tasks::spawn_cleanup_task;
