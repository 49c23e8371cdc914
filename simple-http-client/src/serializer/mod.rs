//! Pluggable body serializers.
//!
//! An [`HttpSerializer`] turns request bodies into text and response text
//! into typed values. The trait works on type-erased serde values so one
//! client can hold a serializer as `Arc<dyn HttpSerializer>` and a single
//! request can swap it for another. The typed entry point is
//! `<dyn HttpSerializer>::deserialize::<T>`.

mod json;
mod naming;
mod xml;

pub use json::JsonSerializer;
pub use naming::FieldNaming;
pub use xml::XmlSerializer;

use crate::SerializationError;
use serde::de::DeserializeOwned;

/// Callback receiving the format-specific deserializer for one decode.
pub type DecodeSink<'a> = dyn for<'de> FnMut(
        &mut dyn erased_serde::Deserializer<'de>,
    ) -> std::result::Result<(), erased_serde::Error>
    + 'a;

/// Encodes values to text and decodes text back into values.
pub trait HttpSerializer: Send + Sync {
    /// Short name of the wire format, used in error messages.
    fn format(&self) -> &'static str;

    /// Render a value as text.
    fn serialize(&self, value: &dyn erased_serde::Serialize) -> Result<String, SerializationError>;

    /// Parse `text` and hand the resulting deserializer to `sink`.
    ///
    /// Errors returned by `sink` must be reported as
    /// [`SerializationError::Decode`].
    fn decode(&self, text: &str, sink: &mut DecodeSink<'_>) -> Result<(), SerializationError>;
}

impl<'s> dyn HttpSerializer + 's {
    /// Decode `text` into `T`.
    pub fn deserialize<T: DeserializeOwned>(&self, text: &str) -> Result<T, SerializationError> {
        let mut decoded: Option<T> = None;
        self.decode(text, &mut |deserializer| {
            decoded = Some(erased_serde::deserialize::<T>(deserializer)?);
            Ok(())
        })?;
        decoded.ok_or_else(|| SerializationError::decode(self.format(), "no value was produced"))
    }
}

impl std::fmt::Debug for dyn HttpSerializer + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSerializer")
            .field("format", &self.format())
            .finish()
    }
}
