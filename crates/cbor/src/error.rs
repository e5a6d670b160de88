//! Error types for CBOR decoding and map access
//!
//! Decoding errors are local to one call: the input buffer is never modified and
//! no partially built value escapes.

use crate::decoder::Kind;
use crate::value::ValueKind;

/// Result alias used throughout this crate
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Encodings this decoder deliberately refuses
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Unsupported {
    /// Indefinite-length string, array or map
    #[error("indefinite-length {0}")]
    IndefiniteLength(Kind),

    /// Integer outside the signed 64-bit range
    #[error("integer outside the signed 64-bit range")]
    IntegerOutOfRange,

    /// Additional information that is reserved (28 to 30) or not valid for the major type
    #[error("reserved additional information {0}")]
    ReservedAdditionalInfo(u8),

    /// A data item kind the value model has no variant for
    #[error("{0} data item")]
    Kind(Kind),
}

/// Error type for decoding, encoding and typed map access
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Input uses an encoding outside the supported subset
    #[error("unsupported encoding: {0}")]
    UnsupportedEncoding(#[from] Unsupported),

    /// Input ended in the middle of a data item
    #[error("unexpected end of input at offset {0}")]
    UnexpectedEof(usize),

    /// A text string is not valid UTF-8
    #[error("invalid UTF-8 in text string: {0}")]
    InvalidUtf8(#[from] core::str::Utf8Error),

    /// A typed read found a different kind of data item
    #[error("expected {expected}, found {found}")]
    UnexpectedKind {
        /// Kind the caller asked for
        expected: Kind,
        /// Kind present in the input
        found: Kind,
    },

    /// Strict mode: an argument was not encoded in its shortest form
    #[error("non-canonical argument encoding at offset {0}")]
    NonCanonical(usize),

    /// Strict mode: a map repeats a key
    #[error("duplicate map key {0}")]
    DuplicateKey(i64),

    /// Strict mode: bytes remain after the top-level value
    #[error("{0} trailing bytes after value")]
    TrailingData(usize),

    /// Arrays and maps nest deeper than the configured limit
    #[error("nesting depth exceeds {0}")]
    DepthLimitExceeded(usize),

    /// The encoder's sink rejected a write
    #[error("encoding failed: {0}")]
    Encode(String),

    /// A map was required but the value is something else
    #[error("expected a map, found {0}")]
    NotAMap(ValueKind),

    /// Map lookup for a key that is not present
    #[error("key {0} not found")]
    KeyNotFound(i64),

    /// Map lookup found a value of a different type
    #[error("key {key}: expected {expected}, found {found}")]
    TypeMismatch {
        /// Key looked up
        key: i64,
        /// Variant the caller asked for
        expected: ValueKind,
        /// Variant stored under the key
        found: ValueKind,
    },
}

impl Error {
    /// Whether this error came from the map accessor rather than the decoder
    pub const fn is_access_error(&self) -> bool {
        matches!(self, Self::KeyNotFound(_) | Self::TypeMismatch { .. })
    }
}
