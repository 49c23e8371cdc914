//! JSON serializer.

use super::naming::{FieldNaming, ValueSerializer, WireValue};
use super::{DecodeSink, HttpSerializer};
use crate::SerializationError;
use serde_json::Value;

const FORMAT: &str = "json";

/// Default serializer: indented JSON, camelCase struct fields, null fields
/// omitted.
///
/// Map keys are written and read verbatim. When decoding into a struct, a
/// key matches a field if it spells the same name in any case style, so
/// `firstName` and `first_name` both fill `first_name`. Serde attributes
/// such as `rename_all` and `deny_unknown_fields` are honored.
#[derive(Debug, Clone)]
pub struct JsonSerializer {
    naming: FieldNaming,
    pretty: bool,
}

impl JsonSerializer {
    /// Create a serializer with the default settings.
    pub fn new() -> Self {
        Self {
            naming: FieldNaming::CamelCase,
            pretty: true,
        }
    }

    /// Set the field naming policy.
    pub fn with_field_naming(mut self, naming: FieldNaming) -> Self {
        self.naming = naming;
        self
    }

    /// Enable or disable indented output.
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

impl Default for JsonSerializer {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpSerializer for JsonSerializer {
    fn format(&self) -> &'static str {
        FORMAT
    }

    fn serialize(&self, value: &dyn erased_serde::Serialize) -> Result<String, SerializationError> {
        let naming = self.naming;
        let value = serde::Serialize::serialize(value, ValueSerializer { naming })
            .map_err(|e| SerializationError::encode(FORMAT, e))?;

        let rendered = if self.pretty {
            serde_json::to_string_pretty(&value)
        } else {
            serde_json::to_string(&value)
        };
        rendered.map_err(|e| SerializationError::encode(FORMAT, e))
    }

    fn decode(&self, text: &str, sink: &mut DecodeSink<'_>) -> Result<(), SerializationError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| SerializationError::decode(FORMAT, e))?;

        let wire = WireValue::new(value, self.naming);
        let mut deserializer = <dyn erased_serde::Deserializer>::erase(wire);
        sink(&mut deserializer).map_err(|e| SerializationError::decode(FORMAT, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use std::collections::BTreeMap;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TestSerializationObject {
        property_one: String,
        property_two: i32,
        property_three: bool,
        nickname: Option<String>,
    }

    fn sample() -> TestSerializationObject {
        TestSerializationObject {
            property_one: "property1 value".to_string(),
            property_two: 12,
            property_three: true,
            nickname: None,
        }
    }

    fn serializer() -> Box<dyn HttpSerializer> {
        Box::new(JsonSerializer::new())
    }

    #[test]
    fn test_serialization_uses_camel_case_and_omits_nulls() {
        let serialized = serializer().serialize(&sample()).unwrap();

        assert_eq!(
            serialized,
            concat!(
                "{\n",
                "  \"propertyOne\": \"property1 value\",\n",
                "  \"propertyTwo\": 12,\n",
                "  \"propertyThree\": true\n",
                "}"
            )
        );
    }

    #[test]
    fn test_round_trip() {
        let serializer = serializer();
        let serialized = serializer.serialize(&sample()).unwrap();
        let back: TestSerializationObject = serializer.deserialize(&serialized).unwrap();

        assert_eq!(back, sample());
    }

    #[test]
    fn test_deserialization_accepts_own_field_names() {
        let text = r#"{"property_one":"x","property_two":1,"property_three":false,"nickname":"n"}"#;
        let value: TestSerializationObject = serializer().deserialize(text).unwrap();

        assert_eq!(value.property_one, "x");
        assert_eq!(value.nickname.as_deref(), Some("n"));
    }

    #[test]
    fn test_deserialization_of_nested_arrays() {
        #[derive(Debug, Deserialize)]
        struct Page {
            total_count: u32,
            items: Vec<TestSerializationObject>,
        }

        let text = concat!(
            r#"{"totalCount":1,"#,
            r#""items":[{"propertyOne":"a","propertyTwo":2,"propertyThree":true}]}"#
        );
        let page: Page = serializer().deserialize(text).unwrap();

        assert_eq!(page.total_count, 1);
        assert_eq!(page.items[0].property_two, 2);
    }

    #[test]
    fn test_malformed_input_is_decode_error() {
        let result = serializer().deserialize::<TestSerializationObject>("not json");
        assert!(matches!(result, Err(SerializationError::Decode { format: "json", .. })));
    }

    #[test]
    fn test_type_mismatch_is_decode_error() {
        let result = serializer().deserialize::<TestSerializationObject>(r#"{"propertyOne":5}"#);
        assert!(result.unwrap_err().is_decode());
    }

    #[test]
    fn test_as_is_compact_output() {
        let serializer = JsonSerializer::new()
            .with_field_naming(FieldNaming::AsIs)
            .pretty(false);
        let serialized = serializer.serialize(&sample()).unwrap();

        assert_eq!(
            serialized,
            r#"{"property_one":"property1 value","property_two":12,"property_three":true}"#
        );
    }

    #[test]
    fn test_map_round_trip_keeps_keys() {
        let serializer = serializer();
        let mut map = BTreeMap::new();
        map.insert("user_id".to_string(), 1);
        map.insert("userName".to_string(), 2);

        let serialized = serializer.serialize(&map).unwrap();
        let back: BTreeMap<String, i32> = serializer.deserialize(&serialized).unwrap();

        assert_eq!(back, map);
    }

    #[test]
    fn test_untyped_value_is_decoded_verbatim() {
        let value: Value = serializer()
            .deserialize(r#"{"userId":5,"nested":{"first_name":"a"}}"#)
            .unwrap();

        assert_eq!(value, json!({"userId": 5, "nested": {"first_name": "a"}}));
    }

    #[test]
    fn test_deny_unknown_fields_with_rename_all() {
        #[derive(Debug, Deserialize)]
        #[serde(rename_all = "camelCase", deny_unknown_fields)]
        struct Strict {
            first_name: String,
        }

        let strict: Strict = serializer().deserialize(r#"{"firstName":"a"}"#).unwrap();
        assert_eq!(strict.first_name, "a");

        let result = serializer().deserialize::<Strict>(r#"{"firstName":"a","extra":1}"#);
        assert!(result.unwrap_err().is_decode());
    }

    #[test]
    fn test_deny_unknown_fields_with_own_field_names() {
        #[derive(Debug, Deserialize)]
        #[serde(deny_unknown_fields)]
        struct Strict {
            first_name: String,
        }

        let strict: Strict = serializer().deserialize(r#"{"firstName":"a"}"#).unwrap();
        assert_eq!(strict.first_name, "a");
    }

    #[test]
    fn test_struct_inside_map_is_renamed_but_keys_are_not() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Entry {
            item_count: u32,
        }

        let mut map = BTreeMap::new();
        map.insert("shelf_one", Entry { item_count: 3 });

        let serialized = JsonSerializer::new().pretty(false).serialize(&map).unwrap();
        assert_eq!(serialized, r#"{"shelf_one":{"itemCount":3}}"#);

        let back: BTreeMap<String, Entry> = serializer().deserialize(&serialized).unwrap();
        assert_eq!(back.get("shelf_one"), Some(&Entry { item_count: 3 }));
    }
}
