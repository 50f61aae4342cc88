//! Codec Module
//!
//! Converts native values to a JSON text form and back. Non-JSON types are
//! written as `{"val": <payload>, "decoder": "<tag>"}` records resolved
//! through an extensible [`Registry`].

mod builtin;
mod charset;
mod convert;
mod registry;
mod value;

#[cfg(test)]
mod property_tests;

use std::sync::Arc;

use once_cell::sync::Lazy;
use serde_json::{Map, Number, Value as Json};

use crate::error::{CodecError, RegistryError};

// Re-export public types
pub use convert::{Binary, FromValue, ToValue};
pub use registry::{Registration, Registry, Serializer};
pub use value::{Custom, Kind, Pattern, TypeKey, Value};

// == Wire Field Names ==
/// Field holding the encoded payload of a tagged value.
pub const VAL_FIELD: &str = "val";
/// Field holding the tag of a tagged value.
pub const DECODER_FIELD: &str = "decoder";

static DEFAULT_REGISTRY: Lazy<Arc<Registry>> = Lazy::new(|| Arc::new(Registry::with_builtins()));

// == Codec ==
/// Encoder/decoder bound to one registry.
#[derive(Debug, Clone)]
pub struct Codec {
    registry: Arc<Registry>,
}

impl Codec {
    // == Constructors ==
    /// Creates a codec over an independent registry.
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Returns a codec over the process-wide default registry.
    pub fn global() -> Self {
        Self::new(Arc::clone(&DEFAULT_REGISTRY))
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    // == Encode ==
    /// Serializes a value to compact JSON text.
    pub fn encode(&self, value: &Value) -> Result<String, CodecError> {
        let json = self.to_json(value)?;
        Ok(serde_json::to_string(&json)?)
    }

    /// Builds the JSON tree for a value, tagging every non-JSON type.
    pub fn to_json(&self, value: &Value) -> Result<Json, CodecError> {
        let json = match value {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Int(n) => Json::from(*n),
            Value::Float(f) => Number::from_f64(*f)
                .map(Json::Number)
                .ok_or(CodecError::NonFiniteFloat(*f))?,
            Value::Str(s) => Json::String(s.clone()),
            Value::List(items) => Json::Array(
                items
                    .iter()
                    .map(|item| self.to_json(item))
                    .collect::<Result<_, _>>()?,
            ),
            Value::Map(map) => {
                let mut object = Map::with_capacity(map.len());
                for (key, item) in map {
                    object.insert(key.clone(), self.to_json(item)?);
                }
                Json::Object(object)
            }
            tagged => {
                let key = tagged.type_key().ok_or_else(|| CodecError::UnknownEncoder {
                    type_name: tagged.type_name().to_string(),
                })?;
                let (tag, payload) = self.registry.encode(key, tagged)?;
                let mut object = Map::with_capacity(2);
                object.insert(VAL_FIELD.to_string(), self.to_json(&payload)?);
                object.insert(DECODER_FIELD.to_string(), Json::String(tag));
                Json::Object(object)
            }
        };
        Ok(json)
    }

    // == Decode ==
    /// Parses JSON text, resolving tagged values innermost first.
    pub fn decode(&self, text: &str) -> Result<Value, CodecError> {
        let json: Json = serde_json::from_str(text)?;
        self.from_json(json)
    }

    /// Rebuilds a value from a JSON tree.
    pub fn from_json(&self, json: Json) -> Result<Value, CodecError> {
        let value = match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => number_value(&n),
            Json::String(s) => Value::Str(s),
            Json::Array(items) => Value::List(
                items
                    .into_iter()
                    .map(|item| self.from_json(item))
                    .collect::<Result<_, _>>()?,
            ),
            Json::Object(object) => {
                let tag = tagged_name(&object);
                let mut map = object
                    .into_iter()
                    .map(|(key, item)| self.from_json(item).map(|item| (key, item)))
                    .collect::<Result<std::collections::BTreeMap<_, _>, _>>()?;
                match (tag, map.remove(VAL_FIELD)) {
                    (Some(tag), Some(payload)) => self.registry.decode(&tag, payload)?,
                    (_, payload) => {
                        if let Some(payload) = payload {
                            map.insert(VAL_FIELD.to_string(), payload);
                        }
                        Value::Map(map)
                    }
                }
            }
        };
        Ok(value)
    }

    // == Typed Helpers ==
    /// Encodes any convertible Rust value.
    pub fn encode_as<T: ToValue + ?Sized>(&self, value: &T) -> Result<String, CodecError> {
        self.encode(&value.to_value())
    }

    /// Decodes text straight into a Rust type.
    pub fn decode_as<T: FromValue>(&self, text: &str) -> Result<T, CodecError> {
        T::from_value(self.decode(text)?)
    }
}

impl Default for Codec {
    fn default() -> Self {
        Self::global()
    }
}

/// Registers a serializer on the process-wide default registry.
///
/// Call during start-up, before encode/decode traffic begins.
pub fn register<S: Serializer>(serializer: S) -> Result<(), RegistryError> {
    DEFAULT_REGISTRY.register(serializer)
}

fn number_value(n: &Number) -> Value {
    if let Some(i) = n.as_i64() {
        Value::Int(i)
    } else if let Some(u) = n.as_u64() {
        Value::Decimal(rust_decimal::Decimal::from(u))
    } else {
        Value::Float(n.as_f64().unwrap_or(f64::NAN))
    }
}

/// The tag of an object shaped exactly like a tagged value.
fn tagged_name(object: &Map<String, Json>) -> Option<String> {
    if object.len() != 2 || !object.contains_key(VAL_FIELD) {
        return None;
    }
    match object.get(DECODER_FIELD) {
        Some(Json::String(tag)) => Some(tag.clone()),
        _ => None,
    }
}
