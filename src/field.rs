use chrono::{DateTime, Duration, FixedOffset, Utc};
use serde::Serialize;

/// Tag identifying how a [`Field`]'s storage slots must be interpreted.
///
/// Marked non-exhaustive so new tags can be introduced without breaking
/// downstream matches; the normalizer degrades unrecognized tags to a
/// diagnostic string instead of failing.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldTag {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Float32,
    Float64,
    Str,
    ByteString,
    Binary,
    Duration,
    Time,
    Complex64,
    Complex128,
    Array,
    Object,
    Reflect,
    Stringer,
    Error,
    Namespace,
    Skip,
}

/// Opaque-object slot of a [`Field`]. Only meaningful for tags that carry
/// data the integer and string slots cannot hold.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Bytes(Vec<u8>),
    Text(String),
    Json(serde_json::Value),
    Zone(FixedOffset),
    Complex { re: f64, im: f64 },
}

/// One unit of structured log data: a key plus a tagged value.
///
/// Storage is split across three slots (integer, string, opaque payload);
/// the tag alone decides which slot holds the value and how it is read.
/// Constructors below are the only way slots are written, so a tag/slot
/// mismatch can only come from manual construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub key: String,
    pub tag: FieldTag,
    pub integer: i64,
    pub string: String,
    pub payload: Option<Payload>,
}

impl Field {
    fn new(key: impl Into<String>, tag: FieldTag) -> Self {
        Field {
            key: key.into(),
            tag,
            integer: 0,
            string: String::new(),
            payload: None,
        }
    }

    pub fn bool(key: impl Into<String>, value: bool) -> Self {
        let mut f = Field::new(key, FieldTag::Bool);
        f.integer = value as i64;
        f
    }

    pub fn i8(key: impl Into<String>, value: i8) -> Self {
        let mut f = Field::new(key, FieldTag::Int8);
        f.integer = value as i64;
        f
    }

    pub fn i16(key: impl Into<String>, value: i16) -> Self {
        let mut f = Field::new(key, FieldTag::Int16);
        f.integer = value as i64;
        f
    }

    pub fn i32(key: impl Into<String>, value: i32) -> Self {
        let mut f = Field::new(key, FieldTag::Int32);
        f.integer = value as i64;
        f
    }

    pub fn i64(key: impl Into<String>, value: i64) -> Self {
        let mut f = Field::new(key, FieldTag::Int64);
        f.integer = value;
        f
    }

    pub fn u8(key: impl Into<String>, value: u8) -> Self {
        let mut f = Field::new(key, FieldTag::Uint8);
        f.integer = value as i64;
        f
    }

    pub fn u16(key: impl Into<String>, value: u16) -> Self {
        let mut f = Field::new(key, FieldTag::Uint16);
        f.integer = value as i64;
        f
    }

    pub fn u32(key: impl Into<String>, value: u32) -> Self {
        let mut f = Field::new(key, FieldTag::Uint32);
        f.integer = value as i64;
        f
    }

    pub fn u64(key: impl Into<String>, value: u64) -> Self {
        let mut f = Field::new(key, FieldTag::Uint64);
        f.integer = value as i64;
        f
    }

    /// Stores the raw bit pattern; the normalizer reinterprets it.
    pub fn f32(key: impl Into<String>, value: f32) -> Self {
        let mut f = Field::new(key, FieldTag::Float32);
        f.integer = value.to_bits() as i64;
        f
    }

    pub fn f64(key: impl Into<String>, value: f64) -> Self {
        let mut f = Field::new(key, FieldTag::Float64);
        f.integer = value.to_bits() as i64;
        f
    }

    pub fn str(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut f = Field::new(key, FieldTag::Str);
        f.string = value.into();
        f
    }

    /// UTF-8 text carried as bytes.
    pub fn byte_string(key: impl Into<String>, value: Vec<u8>) -> Self {
        let mut f = Field::new(key, FieldTag::ByteString);
        f.payload = Some(Payload::Bytes(value));
        f
    }

    /// Arbitrary binary data, no text interpretation implied.
    pub fn binary(key: impl Into<String>, value: Vec<u8>) -> Self {
        let mut f = Field::new(key, FieldTag::Binary);
        f.payload = Some(Payload::Bytes(value));
        f
    }

    /// Out-of-range durations clamp to zero nanoseconds.
    pub fn duration(key: impl Into<String>, value: Duration) -> Self {
        let mut f = Field::new(key, FieldTag::Duration);
        f.integer = value.num_nanoseconds().unwrap_or(0);
        f
    }

    /// Absolute time in UTC. Out-of-range timestamps clamp to the epoch.
    pub fn time(key: impl Into<String>, value: DateTime<Utc>) -> Self {
        let mut f = Field::new(key, FieldTag::Time);
        f.integer = value.timestamp_nanos_opt().unwrap_or(0);
        f
    }

    /// Absolute time carrying its own fixed offset.
    pub fn time_in(key: impl Into<String>, value: DateTime<FixedOffset>) -> Self {
        let mut f = Field::new(key, FieldTag::Time);
        f.integer = value.timestamp_nanos_opt().unwrap_or(0);
        f.payload = Some(Payload::Zone(*value.offset()));
        f
    }

    pub fn complex64(key: impl Into<String>, re: f32, im: f32) -> Self {
        let mut f = Field::new(key, FieldTag::Complex64);
        f.payload = Some(Payload::Complex {
            re: re as f64,
            im: im as f64,
        });
        f
    }

    pub fn complex128(key: impl Into<String>, re: f64, im: f64) -> Self {
        let mut f = Field::new(key, FieldTag::Complex128);
        f.payload = Some(Payload::Complex { re, im });
        f
    }

    pub fn array(key: impl Into<String>, value: impl Serialize) -> Self {
        Field::json_tagged(key, FieldTag::Array, value)
    }

    pub fn object(key: impl Into<String>, value: impl Serialize) -> Self {
        Field::json_tagged(key, FieldTag::Object, value)
    }

    /// Catch-all for values without a dedicated constructor; the value is
    /// captured through its `Serialize` impl.
    pub fn reflect(key: impl Into<String>, value: impl Serialize) -> Self {
        Field::json_tagged(key, FieldTag::Reflect, value)
    }

    fn json_tagged(key: impl Into<String>, tag: FieldTag, value: impl Serialize) -> Self {
        let mut f = Field::new(key, tag);
        // A value that cannot be serialized lands in the text slot so the
        // normalizer reports it as malformed instead of dropping it.
        f.payload = Some(match serde_json::to_value(value) {
            Ok(v) => Payload::Json(v),
            Err(e) => Payload::Text(e.to_string()),
        });
        f
    }

    /// Captures the value's `Display` rendering at construction time.
    pub fn stringer(key: impl Into<String>, value: &dyn std::fmt::Display) -> Self {
        let mut f = Field::new(key, FieldTag::Stringer);
        f.payload = Some(Payload::Text(value.to_string()));
        f
    }

    /// Captures the error's rendering at construction time.
    pub fn error(key: impl Into<String>, err: &dyn std::error::Error) -> Self {
        let mut f = Field::new(key, FieldTag::Error);
        f.payload = Some(Payload::Text(err.to_string()));
        f
    }

    /// Grouping marker, carries no value.
    pub fn namespace(key: impl Into<String>) -> Self {
        Field::new(key, FieldTag::Namespace)
    }

    /// No-op marker; omitted entirely from every output.
    pub fn skip() -> Self {
        Field::new("", FieldTag::Skip)
    }
}
