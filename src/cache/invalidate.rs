//! Invalidate Module
//!
//! Clears a list of namespaces, then runs the wrapped function.

use std::future::{self, Future};
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, error};

use crate::cache::round_trip;
use crate::codec::{Codec, FromValue, ToValue};
use crate::error::{CacheError, Result};
use crate::runtime;
use crate::store::Store;

// == Invalidate ==
/// A configured clearing wrapper, created by [`Cache::invalidate`](crate::Cache::invalidate).
#[derive(Clone)]
pub struct Invalidate {
    store: Arc<dyn Store>,
    codec: Codec,
    namespaces: Vec<String>,
}

impl Invalidate {
    pub(crate) fn new(store: Arc<dyn Store>, codec: Codec, namespaces: Vec<String>) -> Self {
        Self {
            store,
            codec,
            namespaces,
        }
    }

    pub fn namespaces(&self) -> &[String] {
        &self.namespaces
    }

    // == Clear ==
    /// Clears every namespace concurrently and returns how many failed.
    ///
    /// Each failure is logged on its own; none stops the others.
    pub async fn clear(&self) -> usize {
        let clears = self.namespaces.iter().map(|namespace| async move {
            (namespace, self.store.clear(namespace).await)
        });

        let mut failed = 0;
        for (namespace, outcome) in join_all(clears).await {
            match outcome {
                Ok(()) => debug!(namespace = %namespace, "Cleared namespace"),
                Err(err) => {
                    failed += 1;
                    error!(
                        namespace = %namespace,
                        namespaces = ?self.namespaces,
                        error = %err,
                        "Error to clear cache"
                    );
                }
            }
        }
        failed
    }

    // == Call ==
    /// Clears the namespaces, then runs `f` and returns its result as it
    /// would read back from a store.
    pub async fn call<T, F, Fut>(&self, f: F) -> Result<T>
    where
        T: ToValue + FromValue,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        self.clear().await;
        let result = f().await.map_err(CacheError::Function)?;
        round_trip(&self.codec, &result)
    }

    /// [`call`](Self::call) for a synchronous caller and function.
    pub fn call_blocking<T, F>(&self, f: F) -> Result<T>
    where
        T: ToValue + FromValue + Send,
        F: FnOnce() -> anyhow::Result<T> + Send,
    {
        runtime::block_on(self.call(move || future::ready(f())))?
    }

    /// [`call`](Self::call) for a synchronous caller of an async function.
    pub fn call_blocking_async<T, F, Fut>(&self, f: F) -> Result<T>
    where
        T: ToValue + FromValue + Send,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = anyhow::Result<T>> + Send,
    {
        runtime::block_on(self.call(f))?
    }
}

impl std::fmt::Debug for Invalidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Invalidate")
            .field("namespaces", &self.namespaces)
            .finish()
    }
}
