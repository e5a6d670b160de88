//! CBOR value model
//!
//! A decoded document is a tree of [`Value`]s. Every node owns its children, so a
//! value can be moved, cloned or dropped without regard to where it came from.

use std::collections::BTreeMap;

use derive_more::Display;

/// A decoded CBOR data item
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Unsigned or negative integer that fits in `i64`
    Integer(i64),
    /// Definite-length byte string
    Bytes(Vec<u8>),
    /// Definite-length UTF-8 text string
    Text(String),
    /// Definite-length array
    Array(Vec<Value>),
    /// Definite-length map with integer keys
    Map(BTreeMap<i64, Value>),
    /// Single precision float
    Float32(f32),
    /// Double precision float
    Float64(f64),
    /// `true` or `false`
    Bool(bool),
    /// `null`
    Null,
}

/// Variant tag of a [`Value`], used in type mismatch errors
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// [`Value::Integer`]
    #[display("integer")]
    Integer,
    /// [`Value::Bytes`]
    #[display("byte string")]
    ByteString,
    /// [`Value::Text`]
    #[display("text string")]
    TextString,
    /// [`Value::Array`]
    #[display("array")]
    Array,
    /// [`Value::Map`]
    #[display("map")]
    Map,
    /// [`Value::Float32`]
    #[display("single precision float")]
    Float32,
    /// [`Value::Float64`]
    #[display("double precision float")]
    Float64,
    /// [`Value::Bool`]
    #[display("boolean")]
    Bool,
    /// [`Value::Null`]
    #[display("null")]
    Null,
}

impl Value {
    /// Variant tag of this value
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Integer(_) => ValueKind::Integer,
            Self::Bytes(_) => ValueKind::ByteString,
            Self::Text(_) => ValueKind::TextString,
            Self::Array(_) => ValueKind::Array,
            Self::Map(_) => ValueKind::Map,
            Self::Float32(_) => ValueKind::Float32,
            Self::Float64(_) => ValueKind::Float64,
            Self::Bool(_) => ValueKind::Bool,
            Self::Null => ValueKind::Null,
        }
    }

    /// The integer, if this is one
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// The bytes, if this is a byte string
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// The text, if this is a text string
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// The elements, if this is an array
    pub fn as_array(&self) -> Option<&[Self]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// The entries, if this is a map
    pub const fn as_map(&self) -> Option<&BTreeMap<i64, Self>> {
        match self {
            Self::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// The float, if this is a single precision float
    pub const fn as_f32(&self) -> Option<f32> {
        match self {
            Self::Float32(f) => Some(*f),
            _ => None,
        }
    }

    /// The float, if this is a double precision float
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float64(f) => Some(*f),
            _ => None,
        }
    }

    /// The boolean, if this is one
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Whether this is null
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<&[u8]> for Value {
    fn from(bytes: &[u8]) -> Self {
        Self::Bytes(bytes.to_vec())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<Vec<Self>> for Value {
    fn from(items: Vec<Self>) -> Self {
        Self::Array(items)
    }
}

impl From<BTreeMap<i64, Self>> for Value {
    fn from(entries: BTreeMap<i64, Self>) -> Self {
        Self::Map(entries)
    }
}

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Self::Float32(f)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float64(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl FromIterator<(i64, Self)> for Value {
    fn from_iter<I: IntoIterator<Item = (i64, Self)>>(iter: I) -> Self {
        Self::Map(iter.into_iter().collect())
    }
}
