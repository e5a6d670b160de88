//! Pull decoder over a borrowed CBOR buffer
//!
//! [`Decoder`] is a cursor: [`Decoder::peek_kind`] reports what comes next without
//! consuming it and the `read_*` methods consume exactly one data item (or, for
//! arrays and maps, just the header). [`Decoder::decode_value`] drives the cursor to
//! build a whole [`Value`] tree.

use std::collections::BTreeMap;

use derive_more::Display;
use tracing::{debug, trace};

use crate::config::DecoderConfig;
use crate::error::{Error, Result, Unsupported};
use crate::value::Value;

const MAJOR_UNSIGNED: u8 = 0;
const MAJOR_NEGATIVE: u8 = 1;
const MAJOR_BYTES: u8 = 2;
const MAJOR_TEXT: u8 = 3;
const MAJOR_ARRAY: u8 = 4;
const MAJOR_MAP: u8 = 5;
const MAJOR_TAG: u8 = 6;

const INFO_INDEFINITE: u8 = 31;

/// Kind of the next data item in the input
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Major type 0
    #[display("unsigned integer")]
    UnsignedInteger,
    /// Major type 1
    #[display("negative integer")]
    NegativeInteger,
    /// Major type 2
    #[display("byte string")]
    ByteString,
    /// Major type 3
    #[display("text string")]
    TextString,
    /// Major type 4
    #[display("array")]
    StartArray,
    /// Major type 5
    #[display("map")]
    StartMap,
    /// Major type 6
    #[display("tag")]
    Tag,
    /// `f9`
    #[display("half precision float")]
    HalfFloat,
    /// `fa`
    #[display("single precision float")]
    SingleFloat,
    /// `fb`
    #[display("double precision float")]
    DoubleFloat,
    /// `f4` or `f5`
    #[display("boolean")]
    Boolean,
    /// `f6`
    #[display("null")]
    Null,
    /// `f7`
    #[display("undefined")]
    Undefined,
    /// Any other major type 7 item
    #[display("simple value")]
    SimpleValue,
    /// `ff`
    #[display("break")]
    Break,
}

/// Cursor over one CBOR buffer
#[derive(Debug, Clone)]
pub struct Decoder<'a> {
    input: &'a [u8],
    pos: usize,
    config: DecoderConfig,
}

impl<'a> Decoder<'a> {
    /// Create a decoder with the default configuration
    pub fn new(input: &'a [u8]) -> Self {
        Self::with_config(input, DecoderConfig::default())
    }

    /// Create a decoder with the given configuration
    pub const fn with_config(input: &'a [u8], config: DecoderConfig) -> Self {
        Self {
            input,
            pos: 0,
            config,
        }
    }

    /// Configuration in use
    pub const fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Offset of the next unread byte
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Number of unread bytes
    pub const fn remaining(&self) -> usize {
        self.input.len() - self.pos
    }

    /// Whether the whole input has been consumed
    pub const fn is_finished(&self) -> bool {
        self.remaining() == 0
    }

    /// Report the kind of the next data item without consuming it
    pub fn peek_kind(&self) -> Result<Kind> {
        let initial = self
            .input
            .get(self.pos)
            .copied()
            .ok_or(Error::UnexpectedEof(self.pos))?;

        let kind = match initial >> 5 {
            MAJOR_UNSIGNED => Kind::UnsignedInteger,
            MAJOR_NEGATIVE => Kind::NegativeInteger,
            MAJOR_BYTES => Kind::ByteString,
            MAJOR_TEXT => Kind::TextString,
            MAJOR_ARRAY => Kind::StartArray,
            MAJOR_MAP => Kind::StartMap,
            MAJOR_TAG => Kind::Tag,
            // Major type 7
            _ => match initial & 0x1f {
                20 | 21 => Kind::Boolean,
                22 => Kind::Null,
                23 => Kind::Undefined,
                25 => Kind::HalfFloat,
                26 => Kind::SingleFloat,
                27 => Kind::DoubleFloat,
                INFO_INDEFINITE => Kind::Break,
                _ => Kind::SimpleValue,
            },
        };
        Ok(kind)
    }

    /// Read an unsigned or negative integer
    pub fn read_int64(&mut self) -> Result<i64> {
        match self.peek_kind()? {
            Kind::UnsignedInteger => {
                let n = self.read_definite(Kind::UnsignedInteger)?;
                i64::try_from(n).map_err(|_| Unsupported::IntegerOutOfRange.into())
            }
            Kind::NegativeInteger => {
                // Encoded as -1 - n
                let n = self.read_definite(Kind::NegativeInteger)?;
                let n = i64::try_from(n).map_err(|_| Error::from(Unsupported::IntegerOutOfRange))?;
                Ok(-1 - n)
            }
            found => Err(Error::UnexpectedKind {
                expected: Kind::UnsignedInteger,
                found,
            }),
        }
    }

    /// Read a definite-length byte string, borrowing from the input
    pub fn read_byte_string(&mut self) -> Result<&'a [u8]> {
        let len = self.read_length(Kind::ByteString)?;
        self.take(len)
    }

    /// Read a definite-length text string, borrowing from the input
    pub fn read_text_string(&mut self) -> Result<&'a str> {
        let len = self.read_length(Kind::TextString)?;
        Ok(core::str::from_utf8(self.take(len)?)?)
    }

    /// Read an array header and return its element count
    pub fn read_start_array(&mut self) -> Result<usize> {
        let count = self.read_length(Kind::StartArray)?;
        // Every element needs at least one byte
        if count > self.remaining() {
            return Err(Error::UnexpectedEof(self.input.len()));
        }
        Ok(count)
    }

    /// Read a map header and return its entry count
    pub fn read_start_map(&mut self) -> Result<usize> {
        let count = self.read_length(Kind::StartMap)?;
        if count.saturating_mul(2) > self.remaining() {
            return Err(Error::UnexpectedEof(self.input.len()));
        }
        Ok(count)
    }

    /// Read a tag header and return the tag number; the tagged item follows
    pub fn read_tag(&mut self) -> Result<u64> {
        self.read_definite(Kind::Tag)
    }

    /// Read a single precision float
    pub fn read_float32(&mut self) -> Result<f32> {
        self.expect(Kind::SingleFloat)?;
        self.pos += 1;
        Ok(f32::from_be_bytes(self.take_array()?))
    }

    /// Read a double precision float
    pub fn read_float64(&mut self) -> Result<f64> {
        self.expect(Kind::DoubleFloat)?;
        self.pos += 1;
        Ok(f64::from_be_bytes(self.take_array()?))
    }

    /// Read `true` or `false`
    pub fn read_bool(&mut self) -> Result<bool> {
        self.expect(Kind::Boolean)?;
        let [initial] = self.take_array()?;
        Ok(initial & 0x1f == 21)
    }

    /// Read `null`
    pub fn read_null(&mut self) -> Result<()> {
        self.expect(Kind::Null)?;
        self.pos += 1;
        Ok(())
    }

    /// Decode the next data item, including everything nested in it
    ///
    /// Tags are skipped. On error the cursor position is unspecified.
    pub fn decode_value(&mut self) -> Result<Value> {
        self.decode_nested(0)
    }

    fn decode_nested(&mut self, depth: usize) -> Result<Value> {
        let kind = self.skip_tags()?;

        let value = match kind {
            Kind::UnsignedInteger | Kind::NegativeInteger => Value::Integer(self.read_int64()?),
            Kind::ByteString => Value::Bytes(self.read_byte_string()?.to_vec()),
            Kind::TextString => Value::Text(self.read_text_string()?.to_owned()),
            Kind::StartArray => self.decode_array(depth + 1)?,
            Kind::StartMap => self.decode_map(depth + 1)?,
            Kind::SingleFloat => Value::Float32(self.read_float32()?),
            Kind::DoubleFloat => Value::Float64(self.read_float64()?),
            Kind::Boolean => Value::Bool(self.read_bool()?),
            Kind::Null => {
                self.read_null()?;
                Value::Null
            }
            Kind::Tag | Kind::HalfFloat | Kind::Undefined | Kind::SimpleValue | Kind::Break => {
                return Err(Unsupported::Kind(kind).into());
            }
        };
        Ok(value)
    }

    fn decode_array(&mut self, depth: usize) -> Result<Value> {
        self.check_depth(depth)?;
        let count = self.read_start_array()?;

        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            items.push(self.decode_nested(depth)?);
        }
        Ok(Value::Array(items))
    }

    fn decode_map(&mut self, depth: usize) -> Result<Value> {
        self.check_depth(depth)?;
        let count = self.read_start_map()?;

        let mut entries = BTreeMap::new();
        for _ in 0..count {
            let key = match self.skip_tags()? {
                Kind::UnsignedInteger | Kind::NegativeInteger => self.read_int64()?,
                found => {
                    return Err(Error::UnexpectedKind {
                        expected: Kind::UnsignedInteger,
                        found,
                    });
                }
            };
            let value = self.decode_nested(depth)?;

            if entries.insert(key, value).is_some() {
                if self.config.is_strict() {
                    return Err(Error::DuplicateKey(key));
                }
                debug!(key, "Duplicate map key, keeping the last value");
            }
        }
        Ok(Value::Map(entries))
    }

    /// Consume any tags in front of the next item and report its kind
    fn skip_tags(&mut self) -> Result<Kind> {
        loop {
            match self.peek_kind()? {
                Kind::Tag => {
                    let tag = self.read_tag()?;
                    trace!(tag, offset = self.pos, "Skipping tag");
                }
                kind => return Ok(kind),
            }
        }
    }

    const fn check_depth(&self, depth: usize) -> Result<()> {
        if depth > self.config.max_depth {
            return Err(Error::DepthLimitExceeded(self.config.max_depth));
        }
        Ok(())
    }

    fn expect(&self, expected: Kind) -> Result<()> {
        let found = self.peek_kind()?;
        if found != expected {
            return Err(Error::UnexpectedKind { expected, found });
        }
        Ok(())
    }

    /// Read a header that must carry a definite argument
    fn read_definite(&mut self, kind: Kind) -> Result<u64> {
        self.expect(kind)?;
        self.read_argument()?
            .ok_or(Error::UnsupportedEncoding(Unsupported::ReservedAdditionalInfo(INFO_INDEFINITE)))
    }

    /// Read a string, array or map header and return its length
    fn read_length(&mut self, kind: Kind) -> Result<usize> {
        self.expect(kind)?;
        let len = self
            .read_argument()?
            .ok_or(Error::UnsupportedEncoding(Unsupported::IndefiniteLength(kind)))?;
        usize::try_from(len).map_err(|_| Error::UnexpectedEof(self.input.len()))
    }

    /// Consume an initial byte and its argument; `None` means indefinite length
    fn read_argument(&mut self) -> Result<Option<u64>> {
        let start = self.pos;
        let [initial] = self.take_array()?;
        let info = initial & 0x1f;

        let argument = match info {
            0..=23 => u64::from(info),
            24 => u64::from(u8::from_be_bytes(self.take_array()?)),
            25 => u64::from(u16::from_be_bytes(self.take_array()?)),
            26 => u64::from(u32::from_be_bytes(self.take_array()?)),
            27 => u64::from_be_bytes(self.take_array()?),
            INFO_INDEFINITE => return Ok(None),
            reserved => return Err(Unsupported::ReservedAdditionalInfo(reserved).into()),
        };

        if self.config.is_strict() && !is_shortest(info, argument) {
            return Err(Error::NonCanonical(start));
        }
        Ok(Some(argument))
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(Error::UnexpectedEof(self.input.len()));
        }
        let bytes = &self.input[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }
}

const fn is_shortest(info: u8, argument: u64) -> bool {
    match info {
        24 => argument >= 24,
        25 => argument > 0xff,
        26 => argument > 0xffff,
        27 => argument > 0xffff_ffff,
        _ => true,
    }
}
