//! Cache Module
//!
//! Orchestrators wiring key derivation, a store and the codec around
//! arbitrary computations.

mod invalidate;
mod memoize;
mod options;

use std::sync::Arc;

use crate::codec::{Codec, FromValue, ToValue};
use crate::error::Result;
use crate::store::{Blocking, BlockingStore, Store};

// Re-export public types
pub use invalidate::Invalidate;
pub use memoize::Memoize;
pub use options::{CacheOptions, ClearOptions};

use options::validate_namespace;

// == Cache ==
/// Entry point binding a store to a codec.
#[derive(Clone)]
pub struct Cache {
    store: Arc<dyn Store>,
    codec: Codec,
}

impl Cache {
    // == Constructors ==
    /// Creates a cache over a non-blocking store and the global codec.
    pub fn new(store: impl Store + 'static) -> Self {
        Self {
            store: Arc::new(store),
            codec: Codec::global(),
        }
    }

    /// Creates a cache over a synchronous store.
    pub fn blocking(store: impl BlockingStore + 'static) -> Self {
        Self::new(Blocking::new(store))
    }

    /// Replaces the codec, e.g. with one over an isolated registry.
    pub fn with_codec(mut self, codec: Codec) -> Self {
        self.codec = codec;
        self
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    // == Decorators ==
    /// Builds a memoizing wrapper.
    pub fn memoize(&self, options: CacheOptions) -> Result<Memoize> {
        validate_namespace(&options.namespace)?;
        Ok(Memoize::new(
            Arc::clone(&self.store),
            self.codec.clone(),
            options.ttl.normalize(),
            options.namespace,
            options.typed,
            options.keygen,
        ))
    }

    /// Builds a wrapper that clears namespaces before each call.
    pub fn invalidate(&self, options: ClearOptions) -> Result<Invalidate> {
        for namespace in &options.namespaces {
            validate_namespace(namespace)?;
        }
        Ok(Invalidate::new(
            Arc::clone(&self.store),
            self.codec.clone(),
            options.namespaces,
        ))
    }
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache").field("codec", &self.codec).finish()
    }
}

/// Encodes and decodes a value, as a store round trip would.
pub(crate) fn round_trip<T: ToValue + FromValue>(codec: &Codec, value: &T) -> Result<T> {
    let encoded = codec.encode(&value.to_value())?;
    Ok(T::from_value(codec.decode(&encoded)?)?)
}
