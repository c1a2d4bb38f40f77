//! Namespace Module
//!
//! A decorator over any [`Cache`] that prefixes keys and layers inherited
//! tags and TTL onto every write. Namespaces nest: each level wraps the one
//! it was created from and merges its own options as a call passes through,
//! so `a.namespace("b").namespace("c").set("k", ..)` reaches the engine as
//! `a/b/c/k` with the tags of all three levels.
//!
//! # Clear is not scoped
//!
//! [`Namespace::clear`] forwards tags untouched. Clearing a tag through a
//! namespace removes every entry carrying that tag anywhere in the
//! underlying cache, not only entries under the namespace prefix. This is
//! the one operation that crosses namespace boundaries; callers who need
//! isolation should use tags that are themselves namespaced.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::cache::path::join;
use crate::cache::{Cache, EntryOptions, ValueSource};
use crate::error::Result;

// == Namespace ==
/// Prefixing view over a target cache. Holds no state of its own beyond its
/// immutable prefix and inherited options.
pub struct Namespace {
    target: Arc<dyn Cache>,
    prefix: String,
    inherited: EntryOptions,
}

impl Namespace {
    /// Wraps `target`.
    ///
    /// An empty `prefix` leaves keys unchanged; otherwise keys become
    /// `prefix/key`. The prefix is not validated.
    pub fn new(target: Arc<dyn Cache>, prefix: &str, inherited: EntryOptions) -> Self {
        Self {
            target,
            prefix: prefix.to_string(),
            inherited,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Tags and TTL applied to writes when a call does not override them.
    pub fn inherited(&self) -> &EntryOptions {
        &self.inherited
    }

    /// Key as seen by the target.
    fn qualify(&self, key: &str) -> String {
        join(&self.prefix, key)
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Namespace")
            .field("prefix", &self.prefix)
            .field("inherited", &self.inherited)
            .finish_non_exhaustive()
    }
}

impl Cache for Namespace {
    fn get(
        &self,
        key: &str,
        default: Option<ValueSource<'_>>,
        options: EntryOptions,
    ) -> Result<Option<Value>> {
        self.target.get(
            &self.qualify(key),
            default,
            options.merged_over(&self.inherited),
        )
    }

    fn set(&self, key: &str, value: ValueSource<'_>, options: EntryOptions) -> Result<Value> {
        self.target.set(
            &self.qualify(key),
            value,
            options.merged_over(&self.inherited),
        )
    }

    fn has(&self, key: &str) -> Result<bool> {
        self.target.has(&self.qualify(key))
    }

    fn delete(&self, key: &str, recursive: bool) -> Result<()> {
        self.target.delete(&self.qualify(key), recursive)
    }

    /// Forwards to the target unchanged. See the module docs: this affects
    /// the tag across the whole underlying cache.
    fn clear(&self, tags: &[&str], recursive: bool) -> Result<()> {
        self.target.clear(tags, recursive)
    }

    fn namespace(self: Arc<Self>, prefix: &str, options: EntryOptions) -> Arc<Namespace> {
        Arc::new(Namespace::new(self, prefix, options))
    }
}
