//! Lenient decoding of YAML values into typed records.
//!
//! Hand-edited state files drift from the types that wrote them, so decoding
//! coerces between scalar kinds the way the target field asks for:
//!
//! | target   | accepted                                                     |
//! |----------|--------------------------------------------------------------|
//! | integer  | int, float (truncated), bool (0/1), numeric string, null (0) |
//! | float    | int, float, bool, numeric string, null (0.0)                 |
//! | bool     | bool, number (non-zero), `true/false/1/0/t/f`, null (false)  |
//! | string   | string, number, bool (`1`/`0`), null (empty)                 |
//! | sequence | sequence, null (empty), any single value (one element)       |
//!
//! Struct fields holding `null` are skipped, so they take the field default
//! when the record is `#[serde(default)]`.

use serde::de::{self, DeserializeOwned, DeserializeSeed, MapAccess, SeqAccess, Unexpected, Visitor};
use serde::forward_to_deserialize_any;
use serde_yaml::{Number, Value};

type Error = serde_yaml::Error;

/// Decode `value` into `T` with weak typing.
pub fn from_value_weak<T: DeserializeOwned>(value: Value) -> Result<T, Error> {
    T::deserialize(WeakValue(value))
}

struct WeakValue(Value);

impl WeakValue {
    fn untag(self) -> Value {
        let mut value = self.0;
        while let Value::Tagged(tagged) = value {
            value = tagged.value;
        }
        value
    }
}

fn unexpected(value: &Value) -> Unexpected<'_> {
    match value {
        Value::Null => Unexpected::Unit,
        Value::Bool(b) => Unexpected::Bool(*b),
        Value::Number(_) => Unexpected::Other("number"),
        Value::String(s) => Unexpected::Str(s),
        Value::Sequence(_) => Unexpected::Seq,
        Value::Mapping(_) => Unexpected::Map,
        Value::Tagged(_) => Unexpected::Other("tagged value"),
    }
}

fn number_to_string(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        i.to_string()
    } else if let Some(u) = n.as_u64() {
        u.to_string()
    } else {
        n.as_f64().unwrap_or_default().to_string()
    }
}

fn coerce_i64(value: &Value) -> Result<i64, Error> {
    match value {
        Value::Null => Ok(0),
        Value::Bool(b) => Ok(i64::from(*b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(i)
            } else if n.as_u64().is_some() {
                Err(de::Error::invalid_value(unexpected(value), &"an i64"))
            } else {
                Ok(n.as_f64().unwrap_or_default() as i64)
            }
        }
        Value::String(s) if s.trim().is_empty() => Ok(0),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| de::Error::invalid_value(unexpected(value), &"an integer")),
        other => Err(de::Error::invalid_type(unexpected(other), &"an integer")),
    }
}

fn coerce_u64(value: &Value) -> Result<u64, Error> {
    match value {
        Value::Number(n) if n.as_u64().is_some() => Ok(n.as_u64().unwrap_or_default()),
        Value::String(s) if !s.trim().is_empty() => s
            .trim()
            .parse::<u64>()
            .map_err(|_| de::Error::invalid_value(unexpected(value), &"an unsigned integer")),
        other => {
            let signed = coerce_i64(other)?;
            u64::try_from(signed)
                .map_err(|_| de::Error::invalid_value(unexpected(other), &"an unsigned integer"))
        }
    }
}

fn coerce_f64(value: &Value) -> Result<f64, Error> {
    match value {
        Value::Null => Ok(0.0),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::Number(n) => Ok(n.as_f64().unwrap_or_default()),
        Value::String(s) if s.trim().is_empty() => Ok(0.0),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| de::Error::invalid_value(unexpected(value), &"a float")),
        other => Err(de::Error::invalid_type(unexpected(other), &"a float")),
    }
}

fn coerce_bool(value: &Value) -> Result<bool, Error> {
    match value {
        Value::Null => Ok(false),
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => Ok(n.as_f64().is_some_and(|f| f != 0.0)),
        Value::String(s) => match s.trim() {
            "1" | "t" | "T" | "true" | "True" | "TRUE" => Ok(true),
            "" | "0" | "f" | "F" | "false" | "False" | "FALSE" => Ok(false),
            _ => Err(de::Error::invalid_value(unexpected(value), &"a boolean")),
        },
        other => Err(de::Error::invalid_type(unexpected(other), &"a boolean")),
    }
}

fn coerce_string(value: Value) -> Result<String, Error> {
    match value {
        Value::Null => Ok(String::new()),
        Value::Bool(b) => Ok(if b { "1" } else { "0" }.to_string()),
        Value::Number(n) => Ok(number_to_string(&n)),
        Value::String(s) => Ok(s),
        other => Err(de::Error::invalid_type(unexpected(&other), &"a string")),
    }
}

fn visit_seq<'de, V: Visitor<'de>>(items: Vec<Value>, visitor: V) -> Result<V::Value, Error> {
    let len = items.len();
    let mut seq = WeakSeq {
        iter: items.into_iter(),
    };
    let value = visitor.visit_seq(&mut seq)?;
    if seq.iter.len() == 0 {
        Ok(value)
    } else {
        Err(de::Error::invalid_length(len, &"fewer elements in sequence"))
    }
}

fn visit_map<'de, V: Visitor<'de>>(
    entries: Vec<(Value, Value)>,
    visitor: V,
) -> Result<V::Value, Error> {
    visitor.visit_map(WeakMap {
        iter: entries.into_iter(),
        value: None,
    })
}

macro_rules! weak_signed {
    ($($method:ident)*) => {$(
        fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
            visitor.visit_i64(coerce_i64(&self.untag())?)
        }
    )*};
}

macro_rules! weak_unsigned {
    ($($method:ident)*) => {$(
        fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
            visitor.visit_u64(coerce_u64(&self.untag())?)
        }
    )*};
}

impl<'de> de::Deserializer<'de> for WeakValue {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        match self.untag() {
            Value::Null => visitor.visit_unit(),
            Value::Bool(b) => visitor.visit_bool(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    visitor.visit_i64(i)
                } else if let Some(u) = n.as_u64() {
                    visitor.visit_u64(u)
                } else {
                    visitor.visit_f64(n.as_f64().unwrap_or_default())
                }
            }
            Value::String(s) => visitor.visit_string(s),
            Value::Sequence(items) => visit_seq(items, visitor),
            Value::Mapping(map) => visit_map(map.into_iter().collect(), visitor),
            tagged @ Value::Tagged(_) => de::Deserializer::deserialize_any(tagged, visitor),
        }
    }

    weak_signed! { deserialize_i8 deserialize_i16 deserialize_i32 deserialize_i64 }
    weak_unsigned! { deserialize_u8 deserialize_u16 deserialize_u32 deserialize_u64 }

    fn deserialize_f32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_f64(coerce_f64(&self.untag())?)
    }

    fn deserialize_f64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_f64(coerce_f64(&self.untag())?)
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_bool(coerce_bool(&self.untag())?)
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_string(coerce_string(self.untag())?)
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_string(coerce_string(self.untag())?)
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_string(coerce_string(self.untag())?)
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_string(coerce_string(self.untag())?)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        match self.untag() {
            Value::Null => visitor.visit_none(),
            value => visitor.visit_some(WeakValue(value)),
        }
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        match self.untag() {
            Value::Sequence(items) => visit_seq(items, visitor),
            Value::Null => visit_seq(Vec::new(), visitor),
            single => visit_seq(vec![single], visitor),
        }
    }

    fn deserialize_tuple<V: Visitor<'de>>(
        self,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, Error> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, Error> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        match self.untag() {
            Value::Mapping(map) => visit_map(map.into_iter().collect(), visitor),
            Value::Null => visit_map(Vec::new(), visitor),
            other => Err(de::Error::invalid_type(unexpected(&other), &"a mapping")),
        }
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Error> {
        match self.untag() {
            Value::Mapping(map) => visit_map(
                map.into_iter().filter(|(_, v)| !v.is_null()).collect(),
                visitor,
            ),
            Value::Null => visit_map(Vec::new(), visitor),
            other => Err(de::Error::invalid_type(unexpected(&other), &"a mapping")),
        }
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Error> {
        de::Deserializer::deserialize_enum(self.untag(), name, variants, visitor)
    }

    forward_to_deserialize_any! { bytes byte_buf unit unit_struct ignored_any }
}

struct WeakSeq {
    iter: std::vec::IntoIter<Value>,
}

impl<'de> SeqAccess<'de> for WeakSeq {
    type Error = Error;

    fn next_element_seed<T: DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> Result<Option<T::Value>, Error> {
        match self.iter.next() {
            Some(value) => seed.deserialize(WeakValue(value)).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct WeakMap {
    iter: std::vec::IntoIter<(Value, Value)>,
    value: Option<Value>,
}

impl<'de> MapAccess<'de> for WeakMap {
    type Error = Error;

    fn next_key_seed<K: DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> Result<Option<K::Value>, Error> {
        match self.iter.next() {
            Some((key, value)) => {
                self.value = Some(value);
                seed.deserialize(WeakValue(key)).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value, Error> {
        let value = self
            .value
            .take()
            .ok_or_else(|| <Error as de::Error>::custom("map value requested before key"))?;
        seed.deserialize(WeakValue(value))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}
