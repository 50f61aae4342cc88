//! Key Module
//!
//! Derives `<namespace>:<digest>` cache keys from a function identity and
//! its arguments.
//!
//! The default digest is the first 128 bits of a SHA-256 over the compact
//! codec encoding of `[[module, name], positional, [[kw, value], ...]]`,
//! with `[type, ...]` appended in typed mode. Keyword arguments are kept
//! sorted by name, so the digest is stable across runs.

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use serde_json::Value as Json;
use sha2::{Digest, Sha256};

use crate::codec::{Codec, ToValue, Value};
use crate::error::{CacheError, CodecError, Result};

/// Namespace used when none is given, and for keys without a `:`.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Digest length in bytes before hex encoding.
const DIGEST_BYTES: usize = 16;

// == Function Identity ==
/// Stable identity of a memoized function.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionId {
    pub module: String,
    pub name: String,
}

impl FunctionId {
    pub fn new(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.module, self.name)
    }
}

/// Builds a [`FunctionId`] for `name` in the calling module.
#[macro_export]
macro_rules! function_id {
    ($name:expr) => {
        $crate::FunctionId::new(::std::module_path!(), $name)
    };
}

// == Arguments ==
/// Positional and keyword arguments of one call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    positional: Vec<Value>,
    keywords: BTreeMap<String, Value>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a positional argument.
    pub fn arg(mut self, value: impl ToValue) -> Self {
        self.positional.push(value.to_value());
        self
    }

    /// Sets a keyword argument, replacing an earlier one of the same name.
    pub fn kwarg(mut self, name: impl Into<String>, value: impl ToValue) -> Self {
        self.keywords.insert(name.into(), value.to_value());
        self
    }

    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    /// Keyword arguments in name order.
    pub fn keywords(&self) -> &BTreeMap<String, Value> {
        &self.keywords
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keywords.is_empty()
    }

    /// Every argument value, positional first, then keywords by name.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.positional.iter().chain(self.keywords.values())
    }
}

// == Key Generator ==
/// Replaces the default digest; the namespace is still prepended.
///
/// Any `Fn(bool, &FunctionId, &Args) -> String` closure is a key generator.
#[async_trait]
pub trait KeyGenerator: Send + Sync {
    async fn generate(&self, typed: bool, func: &FunctionId, args: &Args)
        -> anyhow::Result<String>;
}

#[async_trait]
impl<F> KeyGenerator for F
where
    F: Fn(bool, &FunctionId, &Args) -> String + Send + Sync,
{
    async fn generate(
        &self,
        typed: bool,
        func: &FunctionId,
        args: &Args,
    ) -> anyhow::Result<String> {
        Ok(self(typed, func, args))
    }
}

// == Derivation ==
/// Derives the full cache key for a call.
pub async fn derive_key(
    namespace: &str,
    keygen: Option<&dyn KeyGenerator>,
    typed: bool,
    func: &FunctionId,
    args: &Args,
    codec: &Codec,
) -> Result<String> {
    let digest = match keygen {
        Some(keygen) => keygen
            .generate(typed, func, args)
            .await
            .map_err(CacheError::KeyGeneration)?,
        None => default_digest(typed, func, args, codec)?,
    };
    Ok(format!("{namespace}:{digest}"))
}

/// The built-in digest: 32 lowercase hex characters.
pub fn default_digest(
    typed: bool,
    func: &FunctionId,
    args: &Args,
    codec: &Codec,
) -> std::result::Result<String, CodecError> {
    let prepare = |value: &Value| -> std::result::Result<Json, CodecError> {
        if typed {
            codec.to_json(value)
        } else {
            codec.to_json(&collapse_integral_floats(value.clone()))
        }
    };

    let positional = args
        .positional
        .iter()
        .map(prepare)
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let keywords = args
        .keywords
        .iter()
        .map(|(name, value)| -> std::result::Result<Json, CodecError> {
            Ok(Json::Array(vec![Json::String(name.clone()), prepare(value)?]))
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut material = vec![
        Json::Array(vec![
            Json::String(func.module.clone()),
            Json::String(func.name.clone()),
        ]),
        Json::Array(positional),
        Json::Array(keywords),
    ];
    if typed {
        material.push(Json::Array(
            args.values()
                .map(|value| Json::String(value.type_name().to_string()))
                .collect(),
        ));
    }

    let text = serde_json::to_string(&Json::Array(material))?;
    let hash = Sha256::digest(text.as_bytes());
    Ok(hex::encode(&hash[..DIGEST_BYTES]))
}

/// Rewrites finite integral floats as ints so `1` and `1.0` share a key.
fn collapse_integral_floats(value: Value) -> Value {
    // Beyond 2^63 an f64 no longer converts exactly.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;

    match value {
        Value::Float(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < LIMIT => {
            Value::Int(f as i64)
        }
        Value::List(items) => Value::List(items.into_iter().map(collapse_integral_floats).collect()),
        Value::Map(map) => Value::Map(
            map.into_iter()
                .map(|(key, item)| (key, collapse_integral_floats(item)))
                .collect(),
        ),
        Value::Set(items) => Value::set(items.into_iter().map(collapse_integral_floats)),
        Value::FrozenSet(items) => {
            Value::frozen_set(items.into_iter().map(collapse_integral_floats))
        }
        Value::Deque { items, maxlen } => {
            Value::deque(items.into_iter().map(collapse_integral_floats), maxlen)
        }
        other => other,
    }
}

/// Splits a key on its first `:` into `(namespace, remainder)`.
///
/// A key without `:` belongs to [`DEFAULT_NAMESPACE`].
pub fn split_key(key: &str) -> (&str, &str) {
    key.split_once(':').unwrap_or((DEFAULT_NAMESPACE, key))
}
