//! Canonical CBOR encoder
//!
//! Output follows the CTAP2 canonical form: every argument uses its shortest
//! encoding, all lengths are definite and map entries are ordered by the encoded
//! bytes of their keys (shorter first, then bytewise). Floats are written at the
//! width they were given.

use ciborium_io::Write;
use ciborium_ll::{Encoder, Header, simple};

use crate::error::{Error, Result};
use crate::value::Value;

const FLOAT32: u8 = 0xfa;
const FLOAT64: u8 = 0xfb;

/// Encode a value into a new buffer
pub fn to_vec(value: &Value) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    encode_into(value, &mut out)?;
    Ok(out)
}

/// Append the encoding of a value to `out`
pub fn encode_into(value: &Value, out: &mut Vec<u8>) -> Result<()> {
    let mut encoder = Encoder::from(out);
    write_value(&mut encoder, value).map_err(|err| Error::Encode(err.to_string()))
}

fn write_value<W: Write>(encoder: &mut Encoder<W>, value: &Value) -> Result<(), W::Error> {
    match value {
        Value::Integer(n) => encoder.push(integer_header(*n)),
        Value::Bytes(bytes) => encoder.bytes(bytes, None),
        Value::Text(text) => encoder.text(text, None),
        Value::Array(items) => {
            encoder.push(Header::Array(Some(items.len())))?;
            items.iter().try_for_each(|item| write_value(encoder, item))
        }
        Value::Map(entries) => {
            let mut ordered: Vec<_> = entries.iter().collect();
            ordered.sort_by_key(|(key, _)| canonical_order(**key));

            encoder.push(Header::Map(Some(ordered.len())))?;
            for (key, value) in ordered {
                encoder.push(integer_header(*key))?;
                write_value(encoder, value)?;
            }
            Ok(())
        }
        // `Header::Float` picks the narrowest lossless width, so the bytes go out as given
        Value::Float32(f) => {
            encoder.write_all(&[FLOAT32])?;
            encoder.write_all(&f.to_be_bytes())
        }
        Value::Float64(f) => {
            encoder.write_all(&[FLOAT64])?;
            encoder.write_all(&f.to_be_bytes())
        }
        Value::Bool(true) => encoder.push(Header::Simple(simple::TRUE)),
        Value::Bool(false) => encoder.push(Header::Simple(simple::FALSE)),
        Value::Null => encoder.push(Header::Simple(simple::NULL)),
    }
}

const fn integer_header(n: i64) -> Header {
    if n < 0 {
        // -1 - n, never negative here
        Header::Negative(!n as u64)
    } else {
        Header::Positive(n as u64)
    }
}

/// Sort key matching the bytewise order of encoded integer keys
///
/// Heads of equal length differ first in the major type, then in the big-endian
/// argument.
const fn canonical_order(n: i64) -> (usize, bool, u64) {
    let (negative, argument) = if n < 0 { (true, !n as u64) } else { (false, n as u64) };
    let head_len = match argument {
        0..=23 => 1,
        24..=0xff => 2,
        0x100..=0xffff => 3,
        0x1_0000..=0xffff_ffff => 5,
        _ => 9,
    };
    (head_len, negative, argument)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DecoderConfig;
    use crate::decoder::Decoder;

    fn encode(value: impl Into<Value>) -> String {
        hex::encode(to_vec(&value.into()).unwrap())
    }

    #[test]
    fn test_integer_heads_are_shortest() {
        assert_eq!(encode(0_i64), "00");
        assert_eq!(encode(23_i64), "17");
        assert_eq!(encode(24_i64), "1818");
        assert_eq!(encode(255_i64), "18ff");
        assert_eq!(encode(256_i64), "190100");
        assert_eq!(encode(65536_i64), "1a00010000");
        assert_eq!(encode(4_294_967_296_i64), "1b0000000100000000");
        assert_eq!(encode(-1_i64), "20");
        assert_eq!(encode(-25_i64), "3818");
        assert_eq!(encode(i64::MIN), "3b7fffffffffffffff");
    }

    #[test]
    fn test_scalars() {
        assert_eq!(encode(100_000.0_f32), "fa47c35000");
        assert_eq!(encode(f32::INFINITY), "fa7f800000");
        assert_eq!(encode(1.1_f64), "fb3ff199999999999a");
        assert_eq!(encode(-4.1_f64), "fbc010666666666666");
        assert_eq!(encode(false), "f4");
        assert_eq!(encode(true), "f5");
        assert_eq!(encode(Value::Null), "f6");
        assert_eq!(encode("IETF"), "6449455446");
        assert_eq!(encode(vec![1u8, 2, 3, 4]), "4401020304");
        assert_eq!(encode(Vec::<u8>::new()), "40");
        assert_eq!(encode(""), "60");
        assert_eq!(encode(Vec::<Value>::new()), "80");
    }

    #[test]
    fn test_map_keys_in_canonical_order() {
        // Positive keys sort before negative ones of the same width, longer keys last
        let map: Value = [
            (-1, Value::Null),
            (256, Value::Null),
            (3, Value::Null),
            (1, Value::Null),
            (-24, Value::Null),
            (-25, Value::Null),
        ]
        .into_iter()
        .collect();

        assert_eq!(encode(map), "a601f603f620f637f63818f6190100f6");
    }

    #[test]
    fn test_canonical_order_matches_encoded_bytes() {
        let keys = [
            0_i64, 23, -1, -24, 24, 255, -25, -256, 256, 65_535, -257, 65_536, i64::MIN, i64::MAX,
        ];
        let mut by_bytes: Vec<(Vec<u8>, i64)> = keys
            .iter()
            .map(|key| (to_vec(&Value::Integer(*key)).unwrap(), *key))
            .collect();
        by_bytes.sort_by(|(a, _), (b, _)| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));

        let mut by_order = keys.to_vec();
        by_order.sort_by_key(|key| canonical_order(*key));

        assert_eq!(by_order, by_bytes.into_iter().map(|(_, key)| key).collect::<Vec<_>>());
    }

    #[test]
    fn test_appends_to_existing_buffer() {
        let mut out = vec![0x82];
        encode_into(&Value::Integer(1), &mut out).unwrap();
        encode_into(&Value::from("a"), &mut out).unwrap();
        assert_eq!(out, [0x82, 0x01, 0x61, b'a']);
    }

    #[test]
    fn test_output_passes_strict_decoding() {
        let value: Value = [
            (1, Value::from("packed")),
            (2, Value::from(vec![0xAAu8; 300])),
            (3, Value::from(vec![Value::from(-7_i64), Value::from(1_000_000_i64), Value::Null])),
            (4, [(1, Value::Bool(true))].into_iter().collect()),
        ]
        .into_iter()
        .collect();

        let bytes = to_vec(&value).unwrap();
        let mut decoder = Decoder::with_config(&bytes, DecoderConfig::strict());
        assert_eq!(decoder.decode_value().unwrap(), value);
        assert!(decoder.is_finished());
    }
}
