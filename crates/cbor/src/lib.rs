//! Definite-length CBOR for authenticator responses
//!
//! FIDO2 devices answer with CBOR maps keyed by small integers. This crate decodes
//! the subset of CBOR those responses use into a closed [`Value`] tree and exposes
//! integer-keyed maps through the typed [`CborMap`] accessor.
//!
//! ```
//! let map = keywire_cbor::CborMap::from_slice(&[0xa1, 0x01, 0x63, b'a', b'b', b'c'])?;
//! assert_eq!(map.read_text_string(1)?, "abc");
//! # Ok::<(), keywire_cbor::Error>(())
//! ```
//!
//! Indefinite-length items, half precision floats and simple values other than
//! `false`, `true` and `null` are rejected with
//! [`Error::UnsupportedEncoding`]. Tags are skipped.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![forbid(unsafe_code)]
#![warn(missing_docs, rustdoc::missing_crate_level_docs)]

use tracing::trace;

pub mod config;
pub mod decoder;
pub mod encoder;
pub mod map;
pub mod value;

mod error;
pub use error::{Error, Result, Unsupported};

pub use config::{Conformance, DecoderConfig};
pub use decoder::{Decoder, Kind};
pub use encoder::{encode_into, to_vec};
pub use map::CborMap;
pub use value::{Value, ValueKind};

/// Decode one top-level value with the default (lax) settings
///
/// Bytes after the value are ignored.
pub fn from_slice(input: &[u8]) -> Result<Value> {
    from_slice_with(input, DecoderConfig::default())
}

/// Decode one top-level value with the given settings
///
/// In strict mode any bytes after the value fail with [`Error::TrailingData`].
pub fn from_slice_with(input: &[u8], config: DecoderConfig) -> Result<Value> {
    trace!(input = %hex::encode(input), "Decoding CBOR");

    let mut decoder = Decoder::with_config(input, config);
    let value = decoder.decode_value()?;

    let trailing = decoder.remaining();
    if trailing > 0 {
        if config.is_strict() {
            return Err(Error::TrailingData(trailing));
        }
        trace!(trailing, "Ignoring bytes after top-level value");
    }
    Ok(value)
}
