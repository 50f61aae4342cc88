//! Error types for the memoization layer
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Codec Error Enum ==
/// Failures raised while turning values into wire text and back.
#[derive(Error, Debug)]
pub enum CodecError {
    /// No encoder is registered for the value's runtime type
    #[error("Encoder not implemented for type {type_name}")]
    UnknownEncoder { type_name: String },

    /// A tag in the serialized stream has no registered decoder
    #[error("Decoder \"{0}\" not registered")]
    UnknownDecoder(String),

    /// A tagged payload does not have the shape its decoder expects
    #[error("Invalid payload for \"{tag}\": {reason}")]
    InvalidPayload { tag: String, reason: String },

    /// NaN and infinities have no JSON representation
    #[error("Non-finite float {0} cannot be encoded")]
    NonFiniteFloat(f64),

    /// A decoded value could not be converted to the requested Rust type
    #[error("Expected {expected}, found {found}")]
    UnexpectedValue { expected: &'static str, found: String },

    /// The text is not valid JSON
    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl CodecError {
    pub(crate) fn invalid_payload(tag: &str, reason: impl Into<String>) -> Self {
        CodecError::InvalidPayload {
            tag: tag.to_string(),
            reason: reason.into(),
        }
    }
}

// == Registry Error Enum ==
/// A registration attempt that is structurally invalid.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    /// Tags must be non-empty lowercase words
    #[error("Invalid tag \"{0}\": tags must be non-empty and contain only [a-z0-9_]")]
    InvalidTag(String),

    /// The candidate has no encode direction
    #[error("Serializer \"{0}\" is not valid: it must implement encode")]
    MissingEncoder(String),

    /// The candidate has no decode direction
    #[error("Serializer \"{0}\" is not valid: it must implement decode")]
    MissingDecoder(String),

    /// The tag already decodes to a different type
    #[error("Tag \"{tag}\" is already registered for {existing}")]
    TagConflict { tag: String, existing: String },
}

// == Cache Error Enum ==
/// Unified error type for memoized and invalidating calls.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Encoding or decoding the result failed
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// A custom key generator failed
    #[error("Key generation failed: {0}")]
    KeyGeneration(#[source] anyhow::Error),

    /// The store failed to answer a lookup
    #[error("Store error: {0}")]
    Store(#[source] anyhow::Error),

    /// The wrapped computation failed
    #[error("Function error: {0}")]
    Function(#[source] anyhow::Error),

    /// Namespaces must be non-empty and free of ':'
    #[error("Invalid namespace: {0:?}")]
    InvalidNamespace(String),

    /// A runtime could not be started for a blocking caller
    #[error("Runtime error: {0}")]
    Runtime(#[from] std::io::Error),
}

// == Result Type Alias ==
/// Convenience Result type for cache calls.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_decoder_message_names_tag() {
        let err = CodecError::UnknownDecoder("unknown".to_string());
        assert_eq!(err.to_string(), "Decoder \"unknown\" not registered");
    }

    #[test]
    fn test_codec_error_converts_into_cache_error() {
        let err: CacheError = CodecError::NonFiniteFloat(f64::NAN).into();
        assert!(matches!(err, CacheError::Codec(CodecError::NonFiniteFloat(_))));
    }
}
