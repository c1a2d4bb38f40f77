//! Cache Module
//!
//! Provides the cache contract, the engine implementing it over a storage
//! backend, and the namespace decorator.

mod contract;
mod engine;
mod entry;
mod namespace;
pub mod path;
mod stats;


// Re-export public types
pub use contract::{Cache, EntryOptions, Maintenance, ValueSource};
pub use engine::CacheEngine;
pub use entry::{current_timestamp_ms, expiry_after, CacheEntry};
pub use namespace::Namespace;
pub use path::Scope;
pub use stats::{CacheStats, StatsRecorder};
