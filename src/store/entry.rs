//! Store Entry Module
//!
//! A serialized value together with its absolute expiry instant.

use chrono::{Duration, Utc};

// == Store Entry ==
/// A single stored value with expiry metadata.
#[derive(Debug, Clone)]
pub struct StoreEntry {
    /// The serialized value
    pub value: String,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: i64,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: i64,
}

impl StoreEntry {
    // == Constructor ==
    /// Creates an entry that expires `ttl` from now.
    ///
    /// A zero or negative `ttl` yields an entry that is already expired.
    pub fn new(value: String, ttl: Duration) -> Self {
        let now = current_timestamp_ms();
        Self {
            value,
            created_at: now,
            expires_at: now.saturating_add(ttl.num_milliseconds()),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time reaches `expires_at`.
    pub fn is_expired(&self) -> bool {
        current_timestamp_ms() >= self.expires_at
    }

    // == Time To Live ==
    /// Returns the remaining lifetime, zero once expired.
    pub fn ttl_remaining(&self) -> Duration {
        let remaining = self.expires_at.saturating_sub(current_timestamp_ms());
        Duration::milliseconds(remaining.max(0))
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> i64 {
    Utc::now().timestamp_millis()
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ttl::forever;
    use std::thread::sleep;

    #[test]
    fn test_entry_creation() {
        let entry = StoreEntry::new("\"value\"".to_string(), Duration::seconds(60));

        assert_eq!(entry.value, "\"value\"");
        assert!(entry.expires_at > entry.created_at);
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_entry_expiration() {
        let entry = StoreEntry::new("1".to_string(), Duration::milliseconds(50));
        assert!(!entry.is_expired());

        sleep(std::time::Duration::from_millis(80));

        assert!(entry.is_expired());
        assert_eq!(entry.ttl_remaining(), Duration::zero());
    }

    #[test]
    fn test_zero_and_negative_ttl_expire_immediately() {
        assert!(StoreEntry::new("1".to_string(), Duration::zero()).is_expired());
        assert!(StoreEntry::new("1".to_string(), Duration::seconds(-5)).is_expired());
    }

    #[test]
    fn test_forever_ttl_does_not_overflow() {
        let entry = StoreEntry::new("1".to_string(), forever());
        assert!(!entry.is_expired());
        assert!(entry.ttl_remaining() > Duration::weeks(19_000));
    }

    #[test]
    fn test_ttl_remaining() {
        let entry = StoreEntry::new("1".to_string(), Duration::seconds(10));

        let remaining = entry.ttl_remaining();
        assert!(remaining <= Duration::seconds(10));
        assert!(remaining >= Duration::seconds(9));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let now = current_timestamp_ms();
        let entry = StoreEntry {
            value: "1".to_string(),
            created_at: now,
            expires_at: now,
        };

        assert!(entry.is_expired(), "Entry should be expired at boundary");
    }
}
