//! Decorator Options Module
//!
//! Settings accepted by the memoizing and invalidating orchestrators.

use std::fmt;
use std::sync::Arc;

use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::key::{KeyGenerator, DEFAULT_NAMESPACE};
use crate::ttl::Ttl;

// == Cache Options ==
/// Options for [`Cache::memoize`](crate::Cache::memoize).
#[derive(Clone)]
pub struct CacheOptions {
    /// How long results stay cached
    pub ttl: Ttl,
    /// Key prefix and unit of invalidation
    pub namespace: String,
    /// Distinguish calls by argument type as well as value
    pub typed: bool,
    /// Replaces the default digest when set
    pub keygen: Option<Arc<dyn KeyGenerator>>,
}

impl CacheOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ttl(mut self, ttl: impl Into<Ttl>) -> Self {
        self.ttl = ttl.into();
        self
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn typed(mut self, typed: bool) -> Self {
        self.typed = typed;
        self
    }

    pub fn keygen(mut self, keygen: impl KeyGenerator + 'static) -> Self {
        self.keygen = Some(Arc::new(keygen));
        self
    }
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            ttl: Ttl::Infinite,
            namespace: DEFAULT_NAMESPACE.to_string(),
            typed: false,
            keygen: None,
        }
    }
}

impl From<&CacheConfig> for CacheOptions {
    fn from(config: &CacheConfig) -> Self {
        Self {
            ttl: config.ttl,
            namespace: config.namespace.clone(),
            typed: config.typed,
            keygen: None,
        }
    }
}

impl fmt::Debug for CacheOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheOptions")
            .field("ttl", &self.ttl)
            .field("namespace", &self.namespace)
            .field("typed", &self.typed)
            .field("keygen", &self.keygen.as_ref().map(|_| "custom"))
            .finish()
    }
}

// == Clear Options ==
/// Options for [`Cache::invalidate`](crate::Cache::invalidate).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearOptions {
    /// Namespaces cleared before each call, in order
    pub namespaces: Vec<String>,
}

impl ClearOptions {
    pub fn new<I, S>(namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            namespaces: namespaces.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for ClearOptions {
    fn default() -> Self {
        Self::new([DEFAULT_NAMESPACE])
    }
}

impl From<&CacheConfig> for ClearOptions {
    fn from(config: &CacheConfig) -> Self {
        Self::new([config.namespace.clone()])
    }
}

// == Validation ==
/// Namespaces must be non-empty and may not contain `:`.
pub(crate) fn validate_namespace(namespace: &str) -> Result<()> {
    if namespace.is_empty() || namespace.contains(':') {
        return Err(CacheError::InvalidNamespace(namespace.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{Args, FunctionId};

    #[test]
    fn test_cache_options_defaults() {
        let options = CacheOptions::default();
        assert_eq!(options.ttl, Ttl::Infinite);
        assert_eq!(options.namespace, "default");
        assert!(!options.typed);
        assert!(options.keygen.is_none());
    }

    #[test]
    fn test_cache_options_builder() {
        let options = CacheOptions::new()
            .ttl(30)
            .namespace("users")
            .typed(true)
            .keygen(|_: bool, func: &FunctionId, _: &Args| func.name.clone());

        assert_eq!(options.ttl, Ttl::from(30));
        assert_eq!(options.namespace, "users");
        assert!(options.typed);
        assert!(options.keygen.is_some());
        assert!(format!("{options:?}").contains("custom"));
    }

    #[test]
    fn test_options_from_config() {
        let config = CacheConfig {
            ttl: Ttl::Seconds(5.0),
            namespace: "orders".to_string(),
            typed: true,
            ..CacheConfig::default()
        };

        let options = CacheOptions::from(&config);
        assert_eq!(options.ttl, Ttl::Seconds(5.0));
        assert_eq!(options.namespace, "orders");
        assert!(options.typed);

        assert_eq!(ClearOptions::from(&config).namespaces, vec!["orders"]);
    }

    #[test]
    fn test_clear_options_default() {
        assert_eq!(ClearOptions::default().namespaces, vec!["default"]);
        assert_eq!(ClearOptions::new(["a", "b"]).namespaces, vec!["a", "b"]);
    }

    #[test]
    fn test_validate_namespace() {
        assert!(validate_namespace("default").is_ok());
        assert!(matches!(
            validate_namespace(""),
            Err(CacheError::InvalidNamespace(_))
        ));
        assert!(matches!(
            validate_namespace("a:b"),
            Err(CacheError::InvalidNamespace(_))
        ));
    }
}
