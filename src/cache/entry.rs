//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use chrono::Utc;

// == Cache Entry ==
/// A single serialized entry with its absolute expiration and tag set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// The serialized value
    pub value: String,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: i64,
    /// De-duplicated tags the entry was last set with
    pub tags: Vec<String>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry expiring `ttl_seconds` from now.
    ///
    /// # Arguments
    /// * `value` - The serialized value to store
    /// * `ttl_seconds` - TTL in seconds
    /// * `tags` - Tags to associate, already de-duplicated
    pub fn new(value: String, ttl_seconds: u64, tags: Vec<String>) -> Self {
        Self {
            value,
            expires_at: expiry_after(current_timestamp_ms(), ttl_seconds),
            tags,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now`.
    ///
    /// An entry is live while `expires_at > now`, so it is expired from the
    /// exact millisecond its TTL has fully elapsed.
    pub fn is_expired_at(&self, now: i64) -> bool {
        now >= self.expires_at
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Absolute expiration for a TTL in seconds counted from `now`.
///
/// Saturates instead of overflowing for very large TTLs.
pub fn expiry_after(now: i64, ttl_seconds: u64) -> i64 {
    let ttl_ms = i64::try_from(ttl_seconds)
        .unwrap_or(i64::MAX)
        .saturating_mul(1000);
    now.saturating_add(ttl_ms)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_creation_with_ttl() {
        let before = current_timestamp_ms();
        let entry = CacheEntry::new("\"v\"".to_string(), 60, vec!["t".to_string()]);

        assert_eq!(entry.value, "\"v\"");
        assert_eq!(entry.tags, vec!["t"]);
        assert!(entry.expires_at >= before + 60_000);
        assert!(!entry.is_expired_at(current_timestamp_ms()));
    }

    #[test]
    fn test_zero_ttl_is_expired_immediately() {
        let entry = CacheEntry::new("1".to_string(), 0, Vec::new());
        assert!(entry.is_expired_at(current_timestamp_ms()));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let now = current_timestamp_ms();
        let entry = CacheEntry {
            value: "null".to_string(),
            expires_at: now,
            tags: Vec::new(),
        };

        assert!(entry.is_expired_at(now), "Entry should be expired at boundary");
        assert!(!entry.is_expired_at(now - 1));
    }

    #[test]
    fn test_expiry_after_saturates() {
        assert_eq!(expiry_after(1_000, 2), 3_000);
        assert_eq!(expiry_after(1_000, u64::MAX), i64::MAX);
    }
}
