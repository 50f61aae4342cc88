//! Memo Cache - memoize computations through a pluggable TTL store
//!
//! Results are keyed by function identity and arguments, written to any
//! backend implementing [`Store`] or [`BlockingStore`], and encoded with an
//! extensible JSON codec so sets, dates, bytes, network types and user
//! types survive the round trip.

pub mod cache;
pub mod codec;
pub mod config;
pub mod error;
pub mod key;
pub mod logging;
pub mod runtime;
pub mod store;
pub mod ttl;

pub use cache::{Cache, CacheOptions, ClearOptions, Invalidate, Memoize};
pub use codec::{
    Binary, Codec, FromValue, Pattern, Registration, Registry, Serializer, ToValue, Value,
};
pub use config::CacheConfig;
pub use error::{CacheError, CodecError, RegistryError, Result};
pub use key::{Args, FunctionId, KeyGenerator};
pub use store::{Blocking, BlockingStore, InMemoryStore, Store, SyncInMemoryStore};
pub use ttl::Ttl;
