//! Conversions between in-memory values and their persisted string form.
//!
//! Two families live here:
//! - [`Codec`], the pluggable serialize/deserialize pair a storage binding is
//!   configured with (JSON by default, raw for plain strings);
//! - [`encode_value`] / [`decode_value`], the fixed encoding used for URL
//!   query parameters, where strings travel unquoted.

#[cfg(test)]
#[path = "codec_test.rs"]
mod codec_test;

use std::fmt;
use std::rc::Rc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::CodecError;

type SerializeFn<T> = Rc<dyn Fn(&T) -> String>;
type DeserializeFn<T> = Rc<dyn Fn(&str) -> Result<T, CodecError>>;

/// Serialize/deserialize pair used by a storage binding.
pub struct Codec<T> {
    serialize: SerializeFn<T>,
    deserialize: DeserializeFn<T>,
}

impl<T> Clone for Codec<T> {
    fn clone(&self) -> Self {
        Self { serialize: Rc::clone(&self.serialize), deserialize: Rc::clone(&self.deserialize) }
    }
}

impl<T> fmt::Debug for Codec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Codec")
    }
}

impl<T> Codec<T> {
    /// Build a codec from custom functions.
    pub fn new(
        serialize: impl Fn(&T) -> String + 'static,
        deserialize: impl Fn(&str) -> Result<T, CodecError> + 'static,
    ) -> Self {
        Self { serialize: Rc::new(serialize), deserialize: Rc::new(deserialize) }
    }

    #[must_use]
    pub fn serialize(&self, value: &T) -> String {
        (self.serialize)(value)
    }

    /// Parse a persisted raw string.
    ///
    /// # Errors
    ///
    /// Returns whatever the configured deserializer rejects.
    pub fn deserialize(&self, raw: &str) -> Result<T, CodecError> {
        (self.deserialize)(raw)
    }
}

impl<T: Serialize + DeserializeOwned + 'static> Codec<T> {
    /// JSON text via `serde_json`; the default for storage bindings.
    ///
    /// Serialization cannot fail from the caller's point of view. A value
    /// `serde_json` cannot represent (a map with non-string keys, a failing
    /// `Serialize` impl) is logged at `warn` and written as an empty string,
    /// which the next read resolves to the binding's default.
    #[must_use]
    pub fn json() -> Self {
        Self::new(|value: &T| to_json(value), |raw: &str| Ok(serde_json::from_str(raw)?))
    }
}

impl Codec<String> {
    /// Identity codec: the string is stored exactly as given.
    #[must_use]
    pub fn raw() -> Self {
        Self::new(String::clone, |raw: &str| Ok(raw.to_owned()))
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    match serde_json::to_string(value) {
        Ok(text) => text,
        Err(err) => {
            // Only reachable for maps with non-string keys and failing custom impls.
            tracing::warn!(error = %err, "value is not representable as JSON");
            String::new()
        }
    }
}

/// Encode a value for a URL parameter: strings verbatim, everything else JSON.
pub fn encode_value<T: Serialize + ?Sized>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(Value::String(text)) => text,
        Ok(other) => other.to_string(),
        Err(err) => {
            tracing::warn!(error = %err, "value is not representable as JSON");
            String::new()
        }
    }
}

/// Decode a URL parameter into `T`.
///
/// JSON is tried first; if that fails the raw text is offered to `T` as a JSON
/// string, so unquoted strings round-trip. `None` means neither reading
/// produced a `T`.
pub fn decode_value<T: DeserializeOwned>(raw: &str) -> Option<T> {
    if let Ok(value) = serde_json::from_str(raw) {
        return Some(value);
    }
    match serde_json::from_value(Value::String(raw.to_owned())) {
        Ok(value) => Some(value),
        Err(_) => None,
    }
}
