//! A string field that upstream data sometimes publishes as a number.

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Text plus a presence flag. Decodes from a JSON string, number or `null`.
///
/// Integers are rendered without exponent (`9999999999999` stays
/// `"9999999999999"`). Encodes back as a string, or `null` when unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FlexibleString {
    pub value: String,
    pub is_set: bool,
}

impl FlexibleString {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            is_set: true,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for FlexibleString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl Serialize for FlexibleString {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.is_set {
            serializer.serialize_some(&self.value)
        } else {
            serializer.serialize_none()
        }
    }
}

impl<'de> Deserialize<'de> for FlexibleString {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(FlexibleStringVisitor)
    }
}

fn format_float(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() {
        format!("{n:.0}")
    } else {
        n.to_string()
    }
}

struct FlexibleStringVisitor;

impl<'de> Visitor<'de> for FlexibleStringVisitor {
    type Value = FlexibleString;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string, a number or null")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(FlexibleString::new(v))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
        Ok(FlexibleString::new(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(FlexibleString::new(v.to_string()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(FlexibleString::new(v.to_string()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(FlexibleString::new(format_float(v)))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(FlexibleString::default())
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(FlexibleString::default())
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    struct Holder {
        tag_name: FlexibleString,
    }

    fn decode(input: &str) -> Result<FlexibleString, serde_json::Error> {
        serde_json::from_str(input)
    }

    #[test]
    fn test_decode_accepted_inputs() {
        let cases = [
            (r#""v1.2.3""#, "v1.2.3", true),
            (r#""""#, "", true),
            ("null", "", false),
            ("42", "42", true),
            ("1234567890", "1234567890", true),
            ("9999999999999", "9999999999999", true),
            ("3.14", "3.14", true),
            ("0", "0", true),
            ("-42", "-42", true),
            ("1e3", "1000", true),
        ];

        for (input, value, is_set) in cases {
            let decoded = decode(input).unwrap();
            assert_eq!(decoded.value, value, "input {input}");
            assert_eq!(decoded.is_set, is_set, "input {input}");
        }
    }

    #[test]
    fn test_decode_rejects_other_types() {
        for input in ["true", "false", "[1, 2]", r#"{"a": 1}"#] {
            assert!(decode(input).is_err(), "input {input}");
        }
    }

    #[test]
    fn test_encode() {
        assert_eq!(serde_json::to_value(FlexibleString::new("v1.0.0")).unwrap(), json!("v1.0.0"));
        assert_eq!(serde_json::to_value(FlexibleString::default()).unwrap(), json!(null));
    }

    #[test]
    fn test_large_integer_round_trip_becomes_string() {
        let holder: Holder = serde_json::from_str(r#"{"tag_name": 9999999999999}"#).unwrap();
        assert_eq!(holder.tag_name, FlexibleString::new("9999999999999"));

        let encoded = serde_json::to_string(&holder).unwrap();
        assert_eq!(encoded, r#"{"tag_name":"9999999999999"}"#);
    }

    #[test]
    fn test_missing_field_is_unset() {
        let holder: Holder = serde_json::from_str("{}").unwrap();
        assert!(!holder.tag_name.is_set);
    }
}
