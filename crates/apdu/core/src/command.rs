//! APDU command definitions and the command frame codec
//!
//! A logical command is encoded as one ISO/IEC 7816-4 frame, short form when
//! both the data and Le fit in one byte each and extended form otherwise.

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{Error, LengthField, Result};
use crate::response::Response;

/// Expected response length (Le) of a command
///
/// Ranges from 1 to 65536. Zero means no response data is expected and leaves
/// the Le field out of the encoded frame.
pub type ExpectedLength = u32;

/// Largest data field a short-form frame can carry
pub const MAX_SHORT_DATA: usize = 0xFF;

/// Largest Le a short-form frame can request (encoded as `00`)
pub const MAX_SHORT_LE: ExpectedLength = 0x100;

/// Largest data field an extended-form frame can carry
pub const MAX_EXTENDED_DATA: usize = 0xFFFF;

/// Largest Le an extended-form frame can request (encoded as `00 00`)
pub const MAX_EXTENDED_LE: ExpectedLength = 0x1_0000;

/// CLA bit marking "more command frames follow"
pub const CLA_CHAINING: u8 = 0x10;

/// GET RESPONSE instruction used to fetch pending response data
pub const INS_GET_RESPONSE: u8 = 0xC0;

/// Length encoding of a command frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthForm {
    /// One byte Lc and Le
    Short,
    /// Two byte Lc and Le behind a `00` marker
    Extended,
}

impl LengthForm {
    /// Pick the smallest form able to carry `data_len` bytes of data and the given Le
    ///
    /// Fails with [`Error::SizeLimitExceeded`] when neither form can.
    pub fn select(data_len: usize, le: Option<ExpectedLength>) -> Result<Self> {
        if data_len > MAX_EXTENDED_DATA {
            return Err(Error::SizeLimitExceeded {
                field: LengthField::Data,
                len: data_len,
                max: MAX_EXTENDED_DATA,
            });
        }

        let le = le.unwrap_or(0);
        if le > MAX_EXTENDED_LE {
            return Err(Error::SizeLimitExceeded {
                field: LengthField::ExpectedLength,
                len: le as usize,
                max: MAX_EXTENDED_LE as usize,
            });
        }

        if data_len <= MAX_SHORT_DATA && le <= MAX_SHORT_LE {
            Ok(Self::Short)
        } else {
            Ok(Self::Extended)
        }
    }
}

/// A typed command: header fields, optional data and Le, plus how to read its response
///
/// Application command sets implement this outside the crate and run it with
/// [`Executor::execute`](crate::Executor::execute).
pub trait ApduCommand {
    /// Value produced from a successful response
    type Success;

    /// Error produced from a failed exchange or an unwanted status word
    type Error: From<Error> + fmt::Debug;

    /// CLA
    fn class(&self) -> u8;

    /// INS
    fn instruction(&self) -> u8;

    /// P1
    fn p1(&self) -> u8;

    /// P2
    fn p2(&self) -> u8;

    /// Data field, if any
    fn data(&self) -> Option<&[u8]>;

    /// Le, if any
    fn expected_length(&self) -> Option<ExpectedLength>;

    /// Le that actually goes on the wire, with zero folded into "absent"
    fn wire_expected_length(&self) -> Option<ExpectedLength> {
        self.expected_length().filter(|&le| le != 0)
    }

    /// Length form this command encodes to
    fn length_form(&self) -> Result<LengthForm> {
        LengthForm::select(
            self.data().map_or(0, <[u8]>::len),
            self.wire_expected_length(),
        )
    }

    /// Encode as one frame, short form when possible
    ///
    /// Never truncates: data or Le beyond the extended limits fail with
    /// [`Error::SizeLimitExceeded`].
    fn to_bytes(&self) -> Result<Bytes> {
        let form = self.length_form()?;
        let data = self.data();
        let le = self.wire_expected_length();

        let mut buffer = BytesMut::with_capacity(command_length(form, data, le));

        buffer.put_slice(&[self.class(), self.instruction(), self.p1(), self.p2()]);

        match form {
            LengthForm::Short => {
                if let Some(data) = data {
                    buffer.put_u8(data.len() as u8);
                    buffer.put_slice(data);
                }
                if let Some(le) = le {
                    // 256 wraps to the reserved 00 byte
                    buffer.put_u8(le as u8);
                }
            }
            LengthForm::Extended => {
                // Extended Lc cannot be zero, so empty data is sent as absent
                if let Some(data) = data.filter(|d| !d.is_empty()) {
                    buffer.put_u8(0x00);
                    buffer.put_u16(data.len() as u16);
                    buffer.put_slice(data);
                } else if le.is_some() {
                    buffer.put_u8(0x00);
                }
                if let Some(le) = le {
                    // 65536 wraps to 00 00
                    buffer.put_u16(le as u16);
                }
            }
        }

        Ok(buffer.freeze())
    }

    /// Untyped copy of this command
    fn to_command(&self) -> Command {
        Command {
            cla: self.class(),
            ins: self.instruction(),
            p1: self.p1(),
            p2: self.p2(),
            data: self.data().map(Bytes::copy_from_slice),
            le: self.expected_length(),
        }
    }

    /// Parse an assembled response into the command's response type
    fn parse_response(response: Response) -> Result<Self::Success, Self::Error>;
}

/// Encoded size of a frame in the given form
fn command_length(form: LengthForm, data: Option<&[u8]>, le: Option<ExpectedLength>) -> usize {
    let mut length = 4;

    match form {
        LengthForm::Short => {
            if let Some(data) = data {
                length += 1 + data.len();
            }
            if le.is_some() {
                length += 1;
            }
        }
        LengthForm::Extended => {
            let data = data.filter(|d| !d.is_empty());
            if let Some(data) = data {
                length += 3 + data.len();
            }
            if le.is_some() {
                length += if data.is_some() { 2 } else { 3 };
            }
        }
    }

    length
}

/// Untyped command frame
///
/// `Some` empty data and `None` differ in short form (`Lc = 00` versus no Lc).
/// `le: Some(0)` is treated like `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// CLA
    pub cla: u8,
    /// INS
    pub ins: u8,
    /// P1
    pub p1: u8,
    /// P2
    pub p2: u8,
    /// Data field
    pub data: Option<Bytes>,
    /// Le, 1 to 65536
    pub le: Option<ExpectedLength>,
}

impl Command {
    /// Header-only command (case 1)
    pub const fn new(cla: u8, ins: u8, p1: u8, p2: u8) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data: None,
            le: None,
        }
    }

    /// Command expecting response data (case 2)
    pub const fn new_with_le(cla: u8, ins: u8, p1: u8, p2: u8, le: ExpectedLength) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data: None,
            le: Some(le),
        }
    }

    /// Command carrying data (case 3)
    pub fn new_with_data<T: Into<Bytes>>(cla: u8, ins: u8, p1: u8, p2: u8, data: T) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data: Some(data.into()),
            le: None,
        }
    }

    /// Command carrying data and expecting response data (case 4)
    pub fn new_with_data_and_le<T: Into<Bytes>>(
        cla: u8,
        ins: u8,
        p1: u8,
        p2: u8,
        data: T,
        le: ExpectedLength,
    ) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data: Some(data.into()),
            le: Some(le),
        }
    }

    /// GET RESPONSE requesting `le` bytes of pending response data
    pub const fn get_response(cla: u8, le: ExpectedLength) -> Self {
        Self::new_with_le(cla, INS_GET_RESPONSE, 0x00, 0x00, le)
    }

    /// Replace the data field
    pub fn with_data<T: Into<Bytes>>(mut self, data: T) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Replace Le
    pub const fn with_le(mut self, le: ExpectedLength) -> Self {
        self.le = Some(le);
        self
    }

    /// Parse a command from raw bytes
    ///
    /// Accepts every short and extended case of ISO 7816-4. A short frame whose
    /// only byte after the header is `00` is read as Le = 256, so an empty data
    /// field without Le does not survive the round trip as `Some(empty)`.
    pub fn from_bytes(raw: &[u8]) -> Result<Self> {
        let invalid = || Error::InvalidCommandLength(raw.len());
        let [cla, ins, p1, p2, body @ ..] = raw else {
            return Err(invalid());
        };
        let mut command = Self::new(*cla, *ins, *p1, *p2);

        match body.len() {
            // Case 1
            0 => {}
            // Case 2S
            1 => command.le = Some(short_le(body[0])),
            // Case 2E
            3 if body[0] == 0x00 => command.le = Some(extended_le(body[1], body[2])),
            n if body[0] == 0x00 && n >= 4 => {
                // Cases 3E / 4E
                let lc = u16::from_be_bytes([body[1], body[2]]) as usize;
                if lc == 0 {
                    return Err(invalid());
                }
                let rest = &body[3..];
                if rest.len() == lc {
                    command.data = Some(Bytes::copy_from_slice(rest));
                } else if rest.len() == lc + 2 {
                    command.data = Some(Bytes::copy_from_slice(&rest[..lc]));
                    command.le = Some(extended_le(rest[lc], rest[lc + 1]));
                } else {
                    return Err(invalid());
                }
            }
            _ => {
                // Cases 3S / 4S
                let lc = body[0] as usize;
                let rest = &body[1..];
                if rest.len() == lc {
                    command.data = Some(Bytes::copy_from_slice(rest));
                } else if rest.len() == lc + 1 {
                    command.data = Some(Bytes::copy_from_slice(&rest[..lc]));
                    command.le = Some(short_le(rest[lc]));
                } else {
                    return Err(invalid());
                }
            }
        }

        Ok(command)
    }
}

const fn short_le(byte: u8) -> ExpectedLength {
    if byte == 0 { MAX_SHORT_LE } else { byte as ExpectedLength }
}

const fn extended_le(hi: u8, lo: u8) -> ExpectedLength {
    match u16::from_be_bytes([hi, lo]) {
        0 => MAX_EXTENDED_LE,
        n => n as ExpectedLength,
    }
}

impl ApduCommand for Command {
    type Success = Response;
    type Error = Error;

    fn class(&self) -> u8 {
        self.cla
    }

    fn instruction(&self) -> u8 {
        self.ins
    }

    fn p1(&self) -> u8 {
        self.p1
    }

    fn p2(&self) -> u8 {
        self.p2
    }

    fn data(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }

    fn expected_length(&self) -> Option<ExpectedLength> {
        self.le
    }

    fn parse_response(response: Response) -> Result<Self::Success, Self::Error> {
        Ok(response)
    }
}
