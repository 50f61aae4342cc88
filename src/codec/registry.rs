//! Codec Registry Module
//!
//! Parallel encode/decode tables that make the codec extensible.
//!
//! The encode table is keyed by the runtime type of a value (a built-in
//! [`Kind`] or the `TypeId` of a custom type) and yields a `(tag, payload)`
//! pair. The decode table is keyed by tag and rebuilds the native value from
//! an already-decoded payload. Registration is meant to happen at start-up,
//! before encode/decode traffic begins.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::codec::builtin;
use crate::codec::value::{Kind, TypeKey, Value};
use crate::error::{CodecError, RegistryError};

type EncodeFn = Arc<dyn Fn(&Value) -> Result<Value, CodecError> + Send + Sync>;
type DecodeFn = Arc<dyn Fn(Value) -> Result<Value, CodecError> + Send + Sync>;

#[derive(Clone)]
struct EncodeEntry {
    tag: String,
    encode: EncodeFn,
}

#[derive(Clone)]
struct DecodeEntry {
    owner: TypeKey,
    owner_name: String,
    decode: DecodeFn,
}

#[derive(Default)]
struct Tables {
    encoders: HashMap<TypeKey, EncodeEntry>,
    decoders: HashMap<String, DecodeEntry>,
}

// == Serializer ==
/// Grouped encode/decode pair for a custom type.
///
/// The default tag is the implementing type's name in lowercase with
/// `serializer` removed, so `ColorSerializer` registers `color`.
pub trait Serializer: Send + Sync + 'static {
    type Target: Any + fmt::Debug + PartialEq + Clone + Send + Sync;

    /// Produces the payload; nested custom values are encoded recursively.
    fn encode(&self, value: &Self::Target) -> Value;

    /// Rebuilds the value from a payload whose children are already decoded.
    fn decode(&self, payload: Value) -> Result<Self::Target, CodecError>;

    fn tag(&self) -> String {
        default_tag(std::any::type_name::<Self>())
    }
}

fn default_tag(type_name: &str) -> String {
    let base = type_name.split('<').next().unwrap_or(type_name);
    let short = base.rsplit("::").next().unwrap_or(base);
    short
        .to_lowercase()
        .replace("serializer", "")
        .trim_matches('_')
        .to_string()
}

// == Registration ==
/// Closure-based registration for a custom type.
pub struct Registration<T> {
    tag: String,
    encode: Option<Arc<dyn Fn(&T) -> Value + Send + Sync>>,
    decode: Option<Arc<dyn Fn(Value) -> Result<T, CodecError> + Send + Sync>>,
}

impl<T> Registration<T>
where
    T: Any + fmt::Debug + PartialEq + Clone + Send + Sync,
{
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            encode: None,
            decode: None,
        }
    }

    pub fn encoder(mut self, encode: impl Fn(&T) -> Value + Send + Sync + 'static) -> Self {
        self.encode = Some(Arc::new(encode));
        self
    }

    pub fn decoder(
        mut self,
        decode: impl Fn(Value) -> Result<T, CodecError> + Send + Sync + 'static,
    ) -> Self {
        self.decode = Some(Arc::new(decode));
        self
    }

    /// Adapts a [`Serializer`] into a registration.
    pub fn from_serializer<S>(serializer: S) -> Self
    where
        S: Serializer<Target = T>,
    {
        let serializer = Arc::new(serializer);
        let decoding = Arc::clone(&serializer);
        Self::new(serializer.tag())
            .encoder(move |value| serializer.encode(value))
            .decoder(move |payload| decoding.decode(payload))
    }
}

// == Registry ==
/// The encode and decode tables shared by a codec.
pub struct Registry {
    tables: RwLock<Tables>,
}

impl Registry {
    /// A registry that only passes JSON-native values through.
    pub fn empty() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
        }
    }

    /// A registry preloaded with every built-in tag.
    pub fn with_builtins() -> Self {
        let registry = Self::empty();
        builtin::install(&registry);
        registry
    }

    pub(crate) fn insert_builtin(
        &self,
        kind: Kind,
        encode: fn(&Value) -> Result<Value, CodecError>,
        decode: fn(Value) -> Result<Value, CodecError>,
    ) {
        let key = TypeKey::Builtin(kind);
        let tag = kind.tag().to_string();
        let mut tables = self.tables.write();
        tables.encoders.insert(
            key,
            EncodeEntry {
                tag: tag.clone(),
                encode: Arc::new(encode),
            },
        );
        tables.decoders.insert(
            tag,
            DecodeEntry {
                owner: key,
                owner_name: format!("{:?}", kind),
                decode: Arc::new(decode),
            },
        );
    }

    // == Register ==
    /// Registers a grouped serializer for its target type.
    pub fn register<S: Serializer>(&self, serializer: S) -> Result<(), RegistryError> {
        self.register_with(Registration::from_serializer(serializer))
    }

    /// Installs both directions of a registration, or neither.
    pub fn register_with<T>(&self, registration: Registration<T>) -> Result<(), RegistryError>
    where
        T: Any + fmt::Debug + PartialEq + Clone + Send + Sync,
    {
        let Registration {
            tag,
            encode,
            decode,
        } = registration;

        if tag.is_empty()
            || !tag
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        {
            return Err(RegistryError::InvalidTag(tag));
        }
        let encode = encode.ok_or_else(|| RegistryError::MissingEncoder(tag.clone()))?;
        let decode = decode.ok_or_else(|| RegistryError::MissingDecoder(tag.clone()))?;

        let key = TypeKey::Custom(TypeId::of::<T>());
        let type_name = std::any::type_name::<T>();

        let mut tables = self.tables.write();
        if let Some(existing) = tables.decoders.get(&tag) {
            if existing.owner != key {
                return Err(RegistryError::TagConflict {
                    tag,
                    existing: existing.owner_name.clone(),
                });
            }
        }

        // A type owns exactly one tag.
        tables
            .decoders
            .retain(|existing, entry| entry.owner != key || *existing == tag);

        let encode_tag = tag.clone();
        tables.encoders.insert(
            key,
            EncodeEntry {
                tag: tag.clone(),
                encode: Arc::new(move |value: &Value| match value {
                    Value::Custom(custom) => custom
                        .downcast_ref::<T>()
                        .map(|inner| encode(inner))
                        .ok_or_else(|| {
                            CodecError::invalid_payload(&encode_tag, "value type changed")
                        }),
                    other => Err(CodecError::UnknownEncoder {
                        type_name: other.type_name().to_string(),
                    }),
                }),
            },
        );
        tables.decoders.insert(
            tag.clone(),
            DecodeEntry {
                owner: key,
                owner_name: type_name.to_string(),
                decode: Arc::new(move |payload: Value| decode(payload).map(Value::custom)),
            },
        );

        debug!(tag = %tag, type_name, "Registered serializer");
        Ok(())
    }

    // == Lookups ==
    /// Runs the encoder registered for the value's type.
    pub(crate) fn encode(&self, key: TypeKey, value: &Value) -> Result<(String, Value), CodecError> {
        let entry = self.tables.read().encoders.get(&key).cloned();
        let entry = entry.ok_or_else(|| CodecError::UnknownEncoder {
            type_name: value.type_name().to_string(),
        })?;
        let payload = (entry.encode)(value)?;
        Ok((entry.tag, payload))
    }

    /// Runs the decoder registered for the tag.
    pub(crate) fn decode(&self, tag: &str, payload: Value) -> Result<Value, CodecError> {
        let entry = self.tables.read().decoders.get(tag).cloned();
        let entry = entry.ok_or_else(|| CodecError::UnknownDecoder(tag.to_string()))?;
        (entry.decode)(payload)
    }

    /// Whether a decoder exists for the tag.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tables.read().decoders.contains_key(tag)
    }

    /// Registered tags, sorted.
    pub fn tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self.tables.read().decoders.keys().cloned().collect();
        tags.sort();
        tags
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry").field("tags", &self.tags()).finish()
    }
}
