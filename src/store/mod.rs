//! Store Module
//!
//! The three-operation capability every backend provides, plus reference
//! in-memory backends.
//!
//! Backends come in two forms: [`Store`] for non-blocking implementations
//! and [`BlockingStore`] for synchronous ones. [`Blocking`] adapts the
//! latter so the orchestrators only ever drive the async form.

mod entry;
mod memory;
mod stats;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;

// Re-export public types
pub use entry::StoreEntry;
pub use memory::{CacheStore, InMemoryStore, SyncInMemoryStore};
pub use stats::StoreStats;

// == Store ==
/// A non-blocking backend.
///
/// `get` must report expired entries as absent. `clear` removes every entry
/// stored under the namespace and is a no-op for unknown namespaces.
#[async_trait]
pub trait Store: Send + Sync {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>>;

    async fn set(&self, key: &str, value: String, ttl: Duration) -> anyhow::Result<()>;

    async fn clear(&self, namespace: &str) -> anyhow::Result<()>;
}

// == Blocking Store ==
/// A synchronous backend with the same contract as [`Store`].
pub trait BlockingStore: Send + Sync {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>>;

    fn set(&self, key: &str, value: String, ttl: Duration) -> anyhow::Result<()>;

    fn clear(&self, namespace: &str) -> anyhow::Result<()>;
}

/// Presents a [`BlockingStore`] as a [`Store`].
///
/// Each operation runs inline on the polling thread.
#[derive(Debug, Clone, Default)]
pub struct Blocking<S>(pub S);

impl<S> Blocking<S> {
    pub fn new(store: S) -> Self {
        Self(store)
    }

    pub fn inner(&self) -> &S {
        &self.0
    }
}

#[async_trait]
impl<S: BlockingStore> Store for Blocking<S> {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        self.0.get(key)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> anyhow::Result<()> {
        self.0.set(key, value, ttl)
    }

    async fn clear(&self, namespace: &str) -> anyhow::Result<()> {
        self.0.clear(namespace)
    }
}

#[async_trait]
impl<S: Store + ?Sized> Store for Arc<S> {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> anyhow::Result<()> {
        (**self).set(key, value, ttl).await
    }

    async fn clear(&self, namespace: &str) -> anyhow::Result<()> {
        (**self).clear(namespace).await
    }
}

impl<S: BlockingStore + ?Sized> BlockingStore for Arc<S> {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: String, ttl: Duration) -> anyhow::Result<()> {
        (**self).set(key, value, ttl)
    }

    fn clear(&self, namespace: &str) -> anyhow::Result<()> {
        (**self).clear(namespace)
    }
}
