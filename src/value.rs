use crate::field::{Field, FieldTag, Payload};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// Generic, sink-agnostic representation of one field value.
///
/// Produced by [`normalize`]; each variant corresponds to one family of
/// [`FieldTag`]s. Both the remote payload map and the local JSON sink
/// serialize this type.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    Duration(Duration),
    Timestamp(DateTime<FixedOffset>),
    Complex { re: f64, im: f64 },
    Json(serde_json::Value),
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Bool(v) => serializer.serialize_bool(*v),
            Value::Int(v) => serializer.serialize_i64(*v),
            Value::Uint(v) => serializer.serialize_u64(*v),
            Value::Float(v) => serializer.serialize_f64(*v),
            Value::Str(v) => serializer.serialize_str(v),
            Value::Bytes(v) => serializer.serialize_str(&BASE64.encode(v)),
            Value::Duration(v) => serializer.serialize_i64(v.num_nanoseconds().unwrap_or(0)),
            Value::Timestamp(v) => serializer.serialize_str(&v.to_rfc3339()),
            Value::Complex { re, im } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("re", re)?;
                map.serialize_entry("im", im)?;
                map.end()
            }
            Value::Json(v) => v.serialize(serializer),
        }
    }
}

/// Convert one typed field into its generic representation.
///
/// Total over every tag: markers (`Namespace`, `Skip`) yield `None`, and an
/// unrecognized tag or a tag whose payload slot does not match degrades to
/// a diagnostic string rather than an error.
pub fn normalize(field: &Field) -> Option<Value> {
    let value = match (field.tag, &field.payload) {
        (FieldTag::Bool, _) => Value::Bool(field.integer != 0),
        (FieldTag::Int8, _) => Value::Int(field.integer as i8 as i64),
        (FieldTag::Int16, _) => Value::Int(field.integer as i16 as i64),
        (FieldTag::Int32, _) => Value::Int(field.integer as i32 as i64),
        (FieldTag::Int64, _) => Value::Int(field.integer),
        (FieldTag::Uint8, _) => Value::Uint(field.integer as u8 as u64),
        (FieldTag::Uint16, _) => Value::Uint(field.integer as u16 as u64),
        (FieldTag::Uint32, _) => Value::Uint(field.integer as u32 as u64),
        (FieldTag::Uint64, _) => Value::Uint(field.integer as u64),
        (FieldTag::Float32, _) => Value::Float(f32::from_bits(field.integer as u32) as f64),
        (FieldTag::Float64, _) => Value::Float(f64::from_bits(field.integer as u64)),
        (FieldTag::Str, _) => Value::Str(field.string.clone()),
        (FieldTag::ByteString | FieldTag::Binary, Some(Payload::Bytes(b))) => {
            Value::Bytes(b.clone())
        }
        (FieldTag::Duration, _) => Value::Duration(Duration::nanoseconds(field.integer)),
        (FieldTag::Time, payload) => {
            let utc = Utc.timestamp_nanos(field.integer);
            match payload {
                Some(Payload::Zone(offset)) => Value::Timestamp(utc.with_timezone(offset)),
                // No location attached, fall back to UTC.
                _ => Value::Timestamp(utc.fixed_offset()),
            }
        }
        (FieldTag::Complex64 | FieldTag::Complex128, Some(Payload::Complex { re, im })) => {
            Value::Complex { re: *re, im: *im }
        }
        (FieldTag::Array | FieldTag::Object | FieldTag::Reflect, Some(Payload::Json(v))) => {
            Value::Json(v.clone())
        }
        (FieldTag::Stringer | FieldTag::Error, Some(Payload::Text(t))) => Value::Str(t.clone()),
        (FieldTag::Namespace, _) => return None,
        (FieldTag::Skip, _) => return None,
        (tag, _) => Value::Str(format!("unknown field tag: {:?} (key {:?})", tag, field.key)),
    };
    Some(value)
}
