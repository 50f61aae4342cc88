//! Memoize Module
//!
//! The get, compute, set, decode flow around one wrapped function.

use std::fmt;
use std::future::{self, Future};
use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, error};

use crate::codec::{Codec, FromValue, ToValue};
use crate::error::{CacheError, Result};
use crate::key::{derive_key, Args, FunctionId, KeyGenerator};
use crate::runtime;
use crate::store::Store;

// == Memoize ==
/// A configured memoizing wrapper, created by [`Cache::memoize`](crate::Cache::memoize).
///
/// Concurrent misses on the same key are not deduplicated: each caller runs
/// the function and writes, and the last `set` wins.
#[derive(Clone)]
pub struct Memoize {
    store: Arc<dyn Store>,
    codec: Codec,
    ttl: Duration,
    namespace: String,
    typed: bool,
    keygen: Option<Arc<dyn KeyGenerator>>,
}

impl Memoize {
    pub(crate) fn new(
        store: Arc<dyn Store>,
        codec: Codec,
        ttl: Duration,
        namespace: String,
        typed: bool,
        keygen: Option<Arc<dyn KeyGenerator>>,
    ) -> Self {
        Self {
            store,
            codec,
            ttl,
            namespace,
            typed,
            keygen,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn typed(&self) -> bool {
        self.typed
    }

    // == Key ==
    /// The cache key a call with these arguments reads and writes.
    pub async fn key(&self, func: &FunctionId, args: &Args) -> Result<String> {
        derive_key(
            &self.namespace,
            self.keygen.as_deref(),
            self.typed,
            func,
            args,
            &self.codec,
        )
        .await
    }

    // == Call ==
    /// Returns the cached result for the call, computing it with `f` on a miss.
    ///
    /// A failed lookup fails the call. A failed write is logged and the
    /// computed result is still returned. The result is always the codec's
    /// decoding of the stored text, so hits and misses yield equal values.
    pub async fn call<T, F, Fut>(&self, func: &FunctionId, args: &Args, f: F) -> Result<T>
    where
        T: ToValue + FromValue,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let key = self.key(func, args).await?;

        let cached = self.store.get(&key).await.map_err(CacheError::Store)?;
        if let Some(text) = cached {
            debug!(key = %key, function = %func, "Cache hit");
            return Ok(T::from_value(self.codec.decode(&text)?)?);
        }
        debug!(key = %key, function = %func, "Cache miss");

        let result = f().await.map_err(CacheError::Function)?;
        let encoded = self.codec.encode(&result.to_value())?;

        if let Err(err) = self.store.set(&key, encoded.clone(), self.ttl).await {
            error!(key = %key, error = %err, "Error to set cache");
        }

        Ok(T::from_value(self.codec.decode(&encoded)?)?)
    }

    /// [`call`](Self::call) for a synchronous caller and function.
    pub fn call_blocking<T, F>(&self, func: &FunctionId, args: &Args, f: F) -> Result<T>
    where
        T: ToValue + FromValue + Send,
        F: FnOnce() -> anyhow::Result<T> + Send,
    {
        runtime::block_on(self.call(func, args, move || future::ready(f())))?
    }

    /// [`call`](Self::call) for a synchronous caller of an async function.
    pub fn call_blocking_async<T, F, Fut>(&self, func: &FunctionId, args: &Args, f: F) -> Result<T>
    where
        T: ToValue + FromValue + Send,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = anyhow::Result<T>> + Send,
    {
        runtime::block_on(self.call(func, args, f))?
    }
}

impl fmt::Debug for Memoize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memoize")
            .field("namespace", &self.namespace)
            .field("ttl", &self.ttl)
            .field("typed", &self.typed)
            .field("keygen", &self.keygen.as_ref().map(|_| "custom"))
            .finish()
    }
}
