//! Cache Contract Module
//!
//! The operation set shared by the engine and the namespace decorator, so
//! that either can stand in for the other and decorators can nest.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::cache::path::dedup_tags;
use crate::cache::Namespace;
use crate::error::Result;

// == Value Source ==
/// A literal value, or a producer invoked to obtain one.
///
/// The engine resolves a source exactly once, before touching storage.
pub enum ValueSource<'a> {
    /// A concrete value
    Value(Value),
    /// A deferred computation
    Producer(Box<dyn FnOnce() -> Value + 'a>),
}

impl<'a> ValueSource<'a> {
    /// Wraps a zero-argument producer.
    pub fn producer<F>(f: F) -> Self
    where
        F: FnOnce() -> Value + 'a,
    {
        ValueSource::Producer(Box::new(f))
    }

    /// Returns the concrete value, running the producer if there is one.
    pub fn resolve(self) -> Value {
        match self {
            ValueSource::Value(value) => value,
            ValueSource::Producer(produce) => produce(),
        }
    }
}

impl From<Value> for ValueSource<'_> {
    fn from(value: Value) -> Self {
        ValueSource::Value(value)
    }
}

impl fmt::Debug for ValueSource<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueSource::Value(value) => f.debug_tuple("Value").field(value).finish(),
            ValueSource::Producer(_) => f.write_str("Producer(..)"),
        }
    }
}

// == Entry Options ==
/// Per-call TTL and tags for `set` and `get`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryOptions {
    /// TTL in seconds; `None` defers to the default of whoever handles the call
    pub ttl: Option<u64>,
    /// Tags to associate with the entry
    pub tags: Vec<String>,
}

impl EntryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(mut self, ttl: u64) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Layers these options over `inherited` ones.
    ///
    /// Tags are the de-duplicated union with inherited tags first; the TTL
    /// is ours if set, else the inherited one.
    pub fn merged_over(self, inherited: &EntryOptions) -> EntryOptions {
        EntryOptions {
            ttl: self.ttl.or(inherited.ttl),
            tags: dedup_tags(inherited.tags.iter().cloned().chain(self.tags)),
        }
    }
}

// == Cache Trait ==
/// Public cache contract.
///
/// Implemented by [`CacheEngine`](crate::cache::CacheEngine) and by
/// [`Namespace`], which wraps any other implementation.
pub trait Cache: Send + Sync {
    /// Returns the live value for `key`.
    ///
    /// On a miss with a `default`, behaves exactly as
    /// `set(key, default, options)` and returns what was stored. A producer
    /// default runs at most once per call and never on a hit. Two concurrent
    /// misses on the same key may both compute and store; the last write wins.
    fn get(
        &self,
        key: &str,
        default: Option<ValueSource<'_>>,
        options: EntryOptions,
    ) -> Result<Option<Value>>;

    /// Stores a value, replacing any entry for `key` along with all of its
    /// previous tag associations. Returns the stored value.
    fn set(&self, key: &str, value: ValueSource<'_>, options: EntryOptions) -> Result<Value>;

    /// True if a live entry exists for `key`. Never mutates state.
    fn has(&self, key: &str) -> Result<bool>;

    /// Removes `key`, and with `recursive` every key under `key/`.
    /// Absent keys are a no-op.
    fn delete(&self, key: &str, recursive: bool) -> Result<()>;

    /// Removes every entry tagged with one of `tags`, and with `recursive`
    /// every entry tagged with a tag under `tag/`. Absent tags are a no-op.
    fn clear(&self, tags: &[&str], recursive: bool) -> Result<()>;

    /// Wraps this cache in a [`Namespace`] that prefixes keys with `prefix`
    /// and applies `options` as inherited tags and TTL.
    fn namespace(self: Arc<Self>, prefix: &str, options: EntryOptions) -> Arc<Namespace>;
}

// == Maintenance Trait ==
/// Backend extensions outside the portable contract.
pub trait Maintenance: Send + Sync {
    /// Removes all entries and tag associations.
    fn flush(&self) -> Result<()>;

    /// Removes every entry whose expiration has passed, returning the count.
    fn clean(&self) -> Result<usize>;

    /// Reclaims backing storage space. May be slow and block other callers.
    fn compact(&self) -> Result<()>;
}
