//! A format-neutral dynamic value used for revision bodies.
//!
//! Bodies are opaque structured documents: a closed set of scalar types
//! (null, bool, int64, float64, string, bytes, time-instant) plus recursive
//! map/list. [`Value`] serializes through any serde backend (JSON for CLI
//! output, CBOR for on-disk storage) without an intermediate conversion.
use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A single attribute map, body, or nested value.
#[derive(Debug, Clone)]
pub enum Value {
    /// Absence of a value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed 64-bit integer.
    Integer(i64),
    /// IEEE 754 double-precision float.
    Float(f64),
    /// UTF-8 string.
    String(String),
    /// Raw byte string, distinct from `String` so binary attributes round-trip.
    Bytes(Vec<u8>),
    /// A point in time, expressed as milliseconds since the Unix epoch.
    ///
    /// Two `Time` values compare equal iff their millisecond instant is
    /// equal, regardless of how each was constructed (see [`Value::eq`]).
    Time(i64),
    /// Ordered sequence of values.
    Array(Vec<Value>),
    /// String-keyed map of attributes, in sorted (canonical) order.
    Object(Body),
}

/// An attribute map: the type of a revision body and of nested objects.
pub type Body = BTreeMap<String, Value>;

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Bytes(a), Self::Bytes(b)) => a == b,
            (Self::Time(a), Self::Time(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Value {
    /// Returns the string slice if this is `Value::String`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Returns the inner map if this is `Value::Object`.
    pub fn as_object(&self) -> Option<&Body> {
        match self {
            Self::Object(m) => Some(m),
            _ => None,
        }
    }

    /// Looks up a dotted field path (`a.b.c`) against nested objects.
    ///
    /// Returns `None` as soon as a segment is missing or the current value
    /// is not an object, matching the "absent means non-match" rule used by
    /// the selector language (see [`crate::selector`]).
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut current = self;
        for segment in path.split('.') {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Self::Integer)
                .or_else(|| n.as_f64().map(Self::Float))
                .unwrap_or(Self::Null),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(a) => Self::Array(a.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(m) => {
                Self::Object(m.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Integer(i) => serde_json::Value::Number(i.into()),
            Value::Float(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s),
            Value::Bytes(b) => serde_json::Value::String(hex_encode(&b)),
            Value::Time(ms) => serde_json::Value::Number(ms.into()),
            Value::Array(a) => serde_json::Value::Array(a.into_iter().map(Into::into).collect()),
            Value::Object(m) => {
                let map: serde_json::Map<String, serde_json::Value> =
                    m.into_iter().map(|(k, v)| (k, v.into())).collect();
                serde_json::Value::Object(map)
            }
        }
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn decode_hex(s: &str) -> Result<Vec<u8>, String> {
    if s.len() % 2 != 0 {
        return Err(format!("odd-length hex string: {s:?}"));
    }
    (0..s.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&s[i..i + 2], 16).map_err(|e| format!("invalid hex byte: {e}"))
        })
        .collect()
}

// The serde wire representation uses small internally-tagged structs for the
// variants that JSON/CBOR cannot distinguish natively (Bytes vs String, Time
// vs Integer), and maps everything else directly.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Integer(i) => serializer.serialize_i64(*i),
            Self::Float(f) => serializer.serialize_f64(*f),
            Self::String(s) => serializer.serialize_str(s),
            Self::Bytes(b) => {
                let mut s = serializer.serialize_struct("Bytes", 1)?;
                s.serialize_field("$bytes", &hex_encode(b))?;
                s.end()
            }
            Self::Time(ms) => {
                let mut s = serializer.serialize_struct("Time", 1)?;
                s.serialize_field("$time", ms)?;
                s.end()
            }
            Self::Array(arr) => arr.serialize(serializer),
            Self::Object(map) => {
                let mut m = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map {
                    m.serialize_entry(k, v)?;
                }
                m.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("any valid revision body value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Value, E> {
        Ok(Value::Integer(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Value, E> {
        i64::try_from(v)
            .map(Value::Integer)
            .or(Ok(Value::Float(v as f64)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Value, E> {
        Ok(Value::Float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Value, E> {
        Ok(Value::String(v.to_owned()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Value, E> {
        Ok(Value::String(v))
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Value, E> {
        Ok(Value::Bytes(v.to_vec()))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        Value::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut arr = Vec::new();
        while let Some(elem) = seq.next_element()? {
            arr.push(elem);
        }
        Ok(Value::Array(arr))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Value, A::Error> {
        let mut obj = BTreeMap::new();
        while let Some((key, value)) = map.next_entry::<String, Value>()? {
            obj.insert(key, value);
        }
        if obj.len() == 1 {
            if let Some(Value::String(hex)) = obj.get("$bytes") {
                return decode_hex(hex).map(Value::Bytes).map_err(de::Error::custom);
            }
            if let Some(Value::Integer(ms)) = obj.get("$time") {
                return Ok(Value::Time(*ms));
            }
        }
        Ok(Value::Object(obj))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(s) => write!(f, "{s}"),
            Self::Bytes(b) => write!(f, "{}", hex_encode(b)),
            Self::Time(ms) => write!(f, "@{ms}"),
            Self::Array(_) => write!(f, "[...]"),
            Self::Object(_) => write!(f, "{{...}}"),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;

    #[test]
    fn null_round_trips_json() {
        let v = Value::Null;
        let json = serde_json::to_string(&v).expect("serialize");
        let back: Value = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(v, back);
    }

    #[test]
    fn integer_round_trips_json() {
        for i in [-1_i64, 0, 42, i64::MAX] {
            let v = Value::Integer(i);
            let json = serde_json::to_string(&v).expect("serialize");
            let back: Value = serde_json::from_str(&json).expect("deserialize");
            assert_eq!(v, back);
        }
    }

    #[test]
    fn time_compares_equal_on_instant_alone() {
        let a = Value::Time(1_700_000_000_000);
        let b = Value::Time(1_700_000_000_000);
        assert_eq!(a, b);
    }

    #[test]
    fn object_round_trips_cbor() {
        let mut map = BTreeMap::new();
        map.insert("k".to_owned(), Value::Integer(1));
        let v = Value::Object(map);
        let mut buf = Vec::new();
        ciborium::into_writer(&v, &mut buf).expect("encode");
        let back: Value = ciborium::from_reader(buf.as_slice()).expect("decode");
        assert_eq!(v, back);
    }

    #[test]
    fn get_path_nested() {
        let mut inner = BTreeMap::new();
        inner.insert("v".to_owned(), Value::String("C".to_owned()));
        let mut outer = BTreeMap::new();
        outer.insert("_id".to_owned(), Value::Object(inner));
        let doc = Value::Object(outer);
        assert_eq!(doc.get_path("_id.v"), Some(&Value::String("C".to_owned())));
        assert_eq!(doc.get_path("_id.missing"), None);
        assert_eq!(doc.get_path("missing.v"), None);
    }

    #[test]
    fn nan_float_equality_uses_bits() {
        assert_eq!(Value::Float(f64::NAN), Value::Float(f64::NAN));
    }

    #[test]
    fn bytes_into_json_value_is_hex_string() {
        let v = Value::Bytes(vec![0xde, 0xad, 0xbe, 0xef]);
        let json: serde_json::Value = v.clone().into();
        assert_eq!(json, serde_json::json!("deadbeef"));
    }

    #[test]
    fn bytes_round_trips_through_serde() {
        let v = Value::Bytes(vec![0xde, 0xad, 0xbe, 0xef]);
        let json = serde_json::to_string(&v).expect("serialize");
        let back: Value = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(v, back);
    }

    #[test]
    fn time_round_trips_through_serde() {
        let v = Value::Time(1_700_000_000_000);
        let json = serde_json::to_string(&v).expect("serialize");
        let back: Value = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(v, back);
    }
}
