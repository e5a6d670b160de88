//! Typed access to integer-keyed CBOR maps
//!
//! CTAP2 responses are maps keyed by small integers. [`CborMap`] wraps one decoded
//! map and hands out each entry as the Rust type the caller expects, telling an
//! absent key ([`Error::KeyNotFound`]) apart from an entry of the wrong type
//! ([`Error::TypeMismatch`]).

use std::borrow::Cow;
use std::collections::BTreeMap;

use crate::config::DecoderConfig;
use crate::error::{Error, Result};
use crate::value::{Value, ValueKind};

/// A decoded map with typed accessors
///
/// Nested maps returned by [`CborMap::read_map`] borrow from their parent.
#[derive(Debug, Clone, PartialEq)]
pub struct CborMap<'a> {
    entries: Cow<'a, BTreeMap<i64, Value>>,
}

impl CborMap<'static> {
    /// Wrap an owned map
    pub const fn new(entries: BTreeMap<i64, Value>) -> Self {
        Self {
            entries: Cow::Owned(entries),
        }
    }

    /// Decode a buffer whose top-level value must be a map
    pub fn from_slice(input: &[u8]) -> Result<Self> {
        Self::from_slice_with(input, DecoderConfig::default())
    }

    /// Decode a buffer whose top-level value must be a map, with the given settings
    pub fn from_slice_with(input: &[u8], config: DecoderConfig) -> Result<Self> {
        crate::from_slice_with(input, config)?.try_into()
    }
}

impl<'a> CborMap<'a> {
    /// Wrap a borrowed map
    pub const fn borrowed(entries: &'a BTreeMap<i64, Value>) -> Self {
        Self {
            entries: Cow::Borrowed(entries),
        }
    }

    /// Whether the key is present
    pub fn contains(&self, key: i64) -> bool {
        self.entries.contains_key(&key)
    }

    /// Untyped lookup
    pub fn get(&self, key: i64) -> Option<&Value> {
        self.entries.get(&key)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in ascending order
    pub fn keys(&self) -> impl Iterator<Item = i64> + '_ {
        self.entries.keys().copied()
    }

    /// Entries in ascending key order
    pub fn iter(&self) -> impl Iterator<Item = (i64, &Value)> + '_ {
        self.entries.iter().map(|(key, value)| (*key, value))
    }

    /// Take the underlying map, cloning it if borrowed
    pub fn into_inner(self) -> BTreeMap<i64, Value> {
        self.entries.into_owned()
    }

    /// Read an integer entry
    pub fn read_int64(&self, key: i64) -> Result<i64> {
        match self.lookup(key)? {
            Value::Integer(n) => Ok(*n),
            other => Err(mismatch(key, ValueKind::Integer, other)),
        }
    }

    /// Read a byte string entry
    pub fn read_byte_string(&self, key: i64) -> Result<&[u8]> {
        match self.lookup(key)? {
            Value::Bytes(bytes) => Ok(bytes),
            other => Err(mismatch(key, ValueKind::ByteString, other)),
        }
    }

    /// Read a text string entry
    pub fn read_text_string(&self, key: i64) -> Result<&str> {
        match self.lookup(key)? {
            Value::Text(text) => Ok(text),
            other => Err(mismatch(key, ValueKind::TextString, other)),
        }
    }

    /// Read a nested map entry
    pub fn read_map(&self, key: i64) -> Result<CborMap<'_>> {
        match self.lookup(key)? {
            Value::Map(entries) => Ok(CborMap::borrowed(entries)),
            other => Err(mismatch(key, ValueKind::Map, other)),
        }
    }

    /// Read an array entry
    pub fn read_array(&self, key: i64) -> Result<&[Value]> {
        match self.lookup(key)? {
            Value::Array(items) => Ok(items),
            other => Err(mismatch(key, ValueKind::Array, other)),
        }
    }

    /// Read a single precision float entry
    pub fn read_float32(&self, key: i64) -> Result<f32> {
        match self.lookup(key)? {
            Value::Float32(f) => Ok(*f),
            other => Err(mismatch(key, ValueKind::Float32, other)),
        }
    }

    /// Read a double precision float entry
    ///
    /// Single precision entries are not widened.
    pub fn read_float64(&self, key: i64) -> Result<f64> {
        match self.lookup(key)? {
            Value::Float64(f) => Ok(*f),
            other => Err(mismatch(key, ValueKind::Float64, other)),
        }
    }

    /// Read a boolean entry
    pub fn read_bool(&self, key: i64) -> Result<bool> {
        match self.lookup(key)? {
            Value::Bool(b) => Ok(*b),
            other => Err(mismatch(key, ValueKind::Bool, other)),
        }
    }

    /// Check that an entry is null
    pub fn read_null(&self, key: i64) -> Result<()> {
        match self.lookup(key)? {
            Value::Null => Ok(()),
            other => Err(mismatch(key, ValueKind::Null, other)),
        }
    }

    fn lookup(&self, key: i64) -> Result<&Value> {
        self.entries.get(&key).ok_or(Error::KeyNotFound(key))
    }
}

const fn mismatch(key: i64, expected: ValueKind, found: &Value) -> Error {
    Error::TypeMismatch {
        key,
        expected,
        found: found.kind(),
    }
}

impl TryFrom<Value> for CborMap<'static> {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Map(entries) => Ok(Self::new(entries)),
            other => Err(Error::NotAMap(other.kind())),
        }
    }
}

impl From<CborMap<'_>> for Value {
    fn from(map: CborMap<'_>) -> Self {
        Self::Map(map.into_inner())
    }
}
