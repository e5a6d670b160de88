//! Response frames
//!
//! A response frame is the payload followed by SW1 SW2. [`Response`] is used both
//! for single frames and for the payload reassembled from a `61 XX` chain.

pub mod status;

use bytes::{BufMut, Bytes, BytesMut};
use tracing::{debug, trace};

use crate::error::{Error, ProtocolViolation, Result};
use status::{Outcome, StatusWord};

/// Payload plus the status word that ended the exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    payload: Bytes,
    status: StatusWord,
}

/// Split a raw frame into payload and trailing status word
fn split_status(frame: &[u8]) -> Result<(&[u8], StatusWord)> {
    match frame {
        [payload @ .., sw1, sw2] => Ok((payload, StatusWord::new(*sw1, *sw2))),
        _ => {
            debug!(len = frame.len(), "Response frame without status word");
            Err(ProtocolViolation::ResponseTooShort(frame.len()).into())
        }
    }
}

impl Response {
    /// Response with the given payload and status word
    pub fn new(payload: impl Into<Bytes>, status: impl Into<StatusWord>) -> Self {
        Self {
            payload: payload.into(),
            status: status.into(),
        }
    }

    /// `90 00` response carrying `payload`
    pub fn success(payload: impl Into<Bytes>) -> Self {
        Self::new(payload, status::common::SUCCESS)
    }

    /// Status-only response
    pub fn error(status: impl Into<StatusWord>) -> Self {
        Self::new(Bytes::new(), status)
    }

    /// Decode a raw frame; fewer than two bytes is a protocol violation
    pub fn from_bytes(frame: &[u8]) -> Result<Self> {
        let (payload, status) = split_status(frame)?;
        trace!(%status, payload_len = payload.len(), "Decoded response frame");

        Ok(Self {
            payload: Bytes::copy_from_slice(payload),
            status,
        })
    }

    /// Response payload data, empty when the device returned only a status word
    pub const fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Status word
    pub const fn status(&self) -> StatusWord {
        self.status
    }

    /// Generic outcome of the status word
    pub const fn outcome(&self) -> Outcome {
        self.status.outcome()
    }

    /// Whether the status word is `90 00`
    pub const fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// `(SW1, SW2)`
    pub const fn status_tuple(&self) -> (u8, u8) {
        (self.status.sw1, self.status.sw2)
    }

    /// Length of the frame on the wire: payload plus the two status bytes
    pub fn wire_len(&self) -> usize {
        self.payload.len() + 2
    }

    /// Split into payload and status word
    pub fn into_parts(self) -> (Bytes, StatusWord) {
        (self.payload, self.status)
    }

    /// Return the payload on success, or the status word as an error
    pub fn into_result(self) -> Result<Bytes> {
        if self.is_success() {
            Ok(self.payload)
        } else {
            Err(Error::Status {
                status: self.status,
            })
        }
    }
}

impl TryFrom<&[u8]> for Response {
    type Error = Error;

    fn try_from(frame: &[u8]) -> Result<Self> {
        Self::from_bytes(frame)
    }
}

impl TryFrom<Bytes> for Response {
    type Error = Error;

    /// Shares the frame's buffer instead of copying the payload
    fn try_from(frame: Bytes) -> Result<Self> {
        let (payload, status) = split_status(&frame)?;
        let payload = frame.slice_ref(payload);
        Ok(Self { payload, status })
    }
}

impl From<Response> for Bytes {
    fn from(response: Response) -> Self {
        let mut buf = BytesMut::with_capacity(response.wire_len());
        buf.put_slice(&response.payload);
        buf.put_u8(response.status.sw1);
        buf.put_u8(response.status.sw2);
        buf.freeze()
    }
}
