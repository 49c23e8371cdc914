//! XML serializer.

use super::{DecodeSink, HttpSerializer};
use crate::SerializationError;

const FORMAT: &str = "xml";
const DECLARATION: &str = r#"<?xml version="1.0" encoding="utf-16"?>"#;

/// Serializer rendering indented XML with a UTF-16 declaration.
///
/// The root element is named after the serialized type, so bodies must be
/// structs (or other named serde types).
#[derive(Debug, Clone, Default)]
pub struct XmlSerializer;

impl XmlSerializer {
    /// Create a new XML serializer.
    pub fn new() -> Self {
        Self
    }
}

impl HttpSerializer for XmlSerializer {
    fn format(&self) -> &'static str {
        FORMAT
    }

    fn serialize(&self, value: &dyn erased_serde::Serialize) -> Result<String, SerializationError> {
        let mut body = String::new();
        let mut serializer = quick_xml::se::Serializer::new(&mut body);
        serializer.indent(' ', 2);
        serde::Serialize::serialize(value, serializer)
            .map_err(|e| SerializationError::encode(FORMAT, e))?;

        Ok(format!("{DECLARATION}\n{body}"))
    }

    fn decode(&self, text: &str, sink: &mut DecodeSink<'_>) -> Result<(), SerializationError> {
        let mut reader = quick_xml::de::Deserializer::from_str(text);
        let mut deserializer = <dyn erased_serde::Deserializer>::erase(&mut reader);
        sink(&mut deserializer).map_err(|e| SerializationError::decode(FORMAT, e))
    }
}
