//! Hierarchy Module
//!
//! Rules shared by keys and tags: `/` separates segments, and a path is
//! "under" another when it starts with that path followed by `/`.
//! Nothing is trimmed or case-folded.

use std::collections::HashSet;

/// Hierarchy delimiter for keys and tags.
pub const SEPARATOR: char = '/';

// == Scope ==
/// Selects a path and, when recursive, everything nested under it.
///
/// Descendants of `root` are exactly the strings in the half-open byte range
/// `[root + "/", root + "0")` because `'0'` is the byte following `'/'`.
/// Backends use these bounds for ordered range scans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    root: String,
    recursive: bool,
}

impl Scope {
    /// Matches `root` only.
    pub fn exact(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            recursive: false,
        }
    }

    /// Matches `root` and every path under `root/`.
    pub fn subtree(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            recursive: true,
        }
    }

    pub fn new(root: impl Into<String>, recursive: bool) -> Self {
        Self {
            root: root.into(),
            recursive,
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn is_recursive(&self) -> bool {
        self.recursive
    }

    /// Inclusive lower and exclusive upper bound of the descendants,
    /// or `None` for an exact scope.
    pub fn descendant_bounds(&self) -> Option<(String, String)> {
        if !self.recursive {
            return None;
        }
        let mut lower = String::with_capacity(self.root.len() + 1);
        lower.push_str(&self.root);
        lower.push(SEPARATOR);

        let mut upper = String::with_capacity(self.root.len() + 1);
        upper.push_str(&self.root);
        upper.push('0');

        Some((lower, upper))
    }

    /// Returns true if `path` is selected by this scope.
    pub fn matches(&self, path: &str) -> bool {
        if path == self.root {
            return true;
        }
        self.recursive
            && path.len() > self.root.len()
            && path.starts_with(self.root.as_str())
            && path[self.root.len()..].starts_with(SEPARATOR)
    }
}

// == Prefixing ==
/// Joins a namespace prefix and a local key with the separator.
///
/// An empty prefix leaves the key unchanged. The prefix is not validated.
pub fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        return key.to_string();
    }
    let mut joined = String::with_capacity(prefix.len() + 1 + key.len());
    joined.push_str(prefix);
    joined.push(SEPARATOR);
    joined.push_str(key);
    joined
}

// == Tag De-duplication ==
/// Removes repeated tags, keeping the first occurrence of each.
pub fn dedup_tags<I, T>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = T>,
    T: Into<String>,
{
    let mut seen = HashSet::new();
    tags.into_iter()
        .map(Into::into)
        .filter(|tag| seen.insert(tag.clone()))
        .collect()
}
