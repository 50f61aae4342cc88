//! Logging Module
//!
//! Installs a `tracing` subscriber for applications that do not set up
//! their own. The library itself only emits events.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::CacheConfig;

/// Installs a registry with an env filter and a fmt layer.
///
/// `RUST_LOG` wins over `default_filter`. Returns `false` when a global
/// subscriber was already installed, in which case nothing changes.
pub fn init(default_filter: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}

/// [`init`] with the filter from a [`CacheConfig`].
pub fn init_from_config(config: &CacheConfig) -> bool {
    init(&config.log_filter)
}
