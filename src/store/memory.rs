//! In-Memory Store Module
//!
//! Reference backends keeping entries in process memory, partitioned by
//! namespace. Expired entries are dropped when read; there is no eviction.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use parking_lot::Mutex;
use tokio::sync::RwLock;
use tracing::debug;

use crate::key::split_key;
use crate::store::{BlockingStore, Store, StoreEntry, StoreStats};

// == Cache Store ==
/// Namespaced entry map shared by the in-memory backends.
#[derive(Debug, Default)]
pub struct CacheStore {
    /// Entries keyed by namespace, then by the key remainder
    namespaces: HashMap<String, HashMap<String, StoreEntry>>,
    /// Lookup statistics
    stats: StoreStats,
}

impl CacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    // == Get ==
    /// Returns the live value for a key.
    ///
    /// An expired entry is removed and reported as absent.
    pub fn get(&mut self, key: &str) -> Option<String> {
        let (namespace, rest) = split_key(key);
        let Some(entries) = self.namespaces.get_mut(namespace) else {
            self.stats.record_miss();
            return None;
        };

        match entries.get(rest) {
            Some(entry) if entry.is_expired() => {
                entries.remove(rest);
                if entries.is_empty() {
                    self.namespaces.remove(namespace);
                }
                self.stats.record_expiration();
                None
            }
            Some(entry) => {
                let value = entry.value.clone();
                self.stats.record_hit();
                Some(value)
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Set ==
    /// Stores a value, replacing any previous entry and its expiry.
    pub fn set(&mut self, key: &str, value: String, ttl: Duration) {
        let (namespace, rest) = split_key(key);
        self.namespaces
            .entry(namespace.to_string())
            .or_default()
            .insert(rest.to_string(), StoreEntry::new(value, ttl));
    }

    // == Clear ==
    /// Drops a whole namespace and returns how many entries it held.
    pub fn clear(&mut self, namespace: &str) -> usize {
        self.namespaces
            .remove(namespace)
            .map_or(0, |entries| entries.len())
    }

    // == Stats ==
    /// Returns current statistics.
    pub fn stats(&self) -> StoreStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.len());
        stats
    }

    // == Length ==
    /// Entries held across all namespaces, including not yet collected expired ones.
    pub fn len(&self) -> usize {
        self.namespaces.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty()
    }

    /// Namespaces currently holding entries, sorted.
    pub fn namespaces(&self) -> Vec<String> {
        let mut names: Vec<String> = self.namespaces.keys().cloned().collect();
        names.sort();
        names
    }
}

// == In-Memory Store ==
/// Async reference store over a shared [`CacheStore`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<RwLock<CacheStore>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn stats(&self) -> StoreStats {
        self.inner.read().await.stats()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        // Expiry removes the entry, so reads take the write lock.
        let value = self.inner.write().await.get(key);
        debug!(key, hit = value.is_some(), "Store get");
        Ok(value)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> anyhow::Result<()> {
        self.inner.write().await.set(key, value, ttl);
        debug!(key, ttl_ms = ttl.num_milliseconds(), "Store set");
        Ok(())
    }

    async fn clear(&self, namespace: &str) -> anyhow::Result<()> {
        let removed = self.inner.write().await.clear(namespace);
        debug!(namespace, removed, "Store clear");
        Ok(())
    }
}

// == Sync In-Memory Store ==
/// Blocking reference store over a [`CacheStore`].
#[derive(Debug, Default)]
pub struct SyncInMemoryStore {
    inner: Mutex<CacheStore>,
}

impl SyncInMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> StoreStats {
        self.inner.lock().stats()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

impl BlockingStore for SyncInMemoryStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let value = self.inner.lock().get(key);
        debug!(key, hit = value.is_some(), "Store get");
        Ok(value)
    }

    fn set(&self, key: &str, value: String, ttl: Duration) -> anyhow::Result<()> {
        self.inner.lock().set(key, value, ttl);
        debug!(key, ttl_ms = ttl.num_milliseconds(), "Store set");
        Ok(())
    }

    fn clear(&self, namespace: &str) -> anyhow::Result<()> {
        let removed = self.inner.lock().clear(namespace);
        debug!(namespace, removed, "Store clear");
        Ok(())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    fn minute() -> Duration {
        Duration::seconds(60)
    }

    #[test]
    fn test_store_set_and_get() {
        let mut store = CacheStore::new();

        store.set("default:abc", "1".to_string(), minute());

        assert_eq!(store.get("default:abc"), Some("1".to_string()));
        assert_eq!(store.len(), 1);
        assert_eq!(store.namespaces(), vec!["default".to_string()]);
    }

    #[test]
    fn test_store_get_nonexistent() {
        let mut store = CacheStore::new();
        assert_eq!(store.get("default:missing"), None);
        assert_eq!(store.stats().misses, 1);
    }

    #[test]
    fn test_store_overwrite() {
        let mut store = CacheStore::new();

        store.set("ns:key", "1".to_string(), minute());
        store.set("ns:key", "2".to_string(), minute());

        assert_eq!(store.get("ns:key"), Some("2".to_string()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_key_without_namespace_uses_default() {
        let mut store = CacheStore::new();

        store.set("plain", "1".to_string(), minute());

        assert_eq!(store.namespaces(), vec!["default".to_string()]);
        assert_eq!(store.get("default:plain"), Some("1".to_string()));
    }

    #[test]
    fn test_split_on_first_colon_only() {
        let mut store = CacheStore::new();

        store.set("ns:a:b", "1".to_string(), minute());

        assert_eq!(store.namespaces(), vec!["ns".to_string()]);
        assert_eq!(store.get("ns:a:b"), Some("1".to_string()));
        assert_eq!(store.get("ns:a"), None);
    }

    #[test]
    fn test_store_ttl_expiration() {
        let mut store = CacheStore::new();

        store.set("ns:key", "1".to_string(), Duration::milliseconds(50));
        assert!(store.get("ns:key").is_some());

        sleep(std::time::Duration::from_millis(80));

        assert_eq!(store.get("ns:key"), None);
        assert!(store.is_empty());
        assert_eq!(store.stats().expirations, 1);
    }

    #[test]
    fn test_negative_ttl_is_absent_immediately() {
        let mut store = CacheStore::new();

        store.set("ns:key", "1".to_string(), Duration::seconds(-1));

        assert_eq!(store.get("ns:key"), None);
    }

    #[test]
    fn test_clear_namespace() {
        let mut store = CacheStore::new();

        store.set("a:1", "1".to_string(), minute());
        store.set("a:2", "2".to_string(), minute());
        store.set("b:1", "3".to_string(), minute());

        assert_eq!(store.clear("a"), 2);
        assert_eq!(store.get("a:1"), None);
        assert_eq!(store.get("b:1"), Some("3".to_string()));
    }

    #[test]
    fn test_clear_unknown_namespace_is_noop() {
        let mut store = CacheStore::new();
        assert_eq!(store.clear("nothing"), 0);
        assert_eq!(store.clear("nothing"), 0);
    }

    #[test]
    fn test_store_stats() {
        let mut store = CacheStore::new();

        store.set("ns:key", "1".to_string(), minute());
        store.get("ns:key");
        store.get("ns:other");

        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_entries, 1);
    }

    #[tokio::test]
    async fn test_in_memory_store_round_trip() {
        let store = InMemoryStore::new();

        store.set("ns:key", "\"v\"".to_string(), minute()).await.unwrap();
        assert_eq!(store.get("ns:key").await.unwrap(), Some("\"v\"".to_string()));

        store.clear("ns").await.unwrap();
        assert_eq!(store.get("ns:key").await.unwrap(), None);
        assert!(store.is_empty().await);
        assert_eq!(store.stats().await.hits, 1);
    }

    #[tokio::test]
    async fn test_in_memory_store_clones_share_state() {
        let store = InMemoryStore::new();
        let clone = store.clone();

        store.set("ns:key", "1".to_string(), minute()).await.unwrap();

        assert_eq!(clone.get("ns:key").await.unwrap(), Some("1".to_string()));
        assert_eq!(clone.len().await, 1);
    }

    #[test]
    fn test_sync_in_memory_store() {
        let store = SyncInMemoryStore::new();

        store.set("ns:key", "1".to_string(), minute()).unwrap();
        assert_eq!(store.get("ns:key").unwrap(), Some("1".to_string()));
        store.clear("ns").unwrap();
        store.clear("ns").unwrap();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
    }
}
