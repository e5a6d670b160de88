//! Transport traits for APDU communication with devices
//!
//! Discovery and connection handling live outside this crate. The core only needs
//! a way to push one frame to the device and read one frame back.

pub mod error;

use std::fmt;

use bytes::Bytes;
pub use error::TransportError;
use tracing::{debug, trace};

/// One frame out, one frame back
///
/// Implementations only move bytes. They know nothing about command structure,
/// chaining or status words, and must not retry on their own.
pub trait CardTransport: fmt::Debug {
    /// Send one raw command frame and return the raw response frame
    /// (payload followed by the two status bytes)
    fn transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, TransportError> {
        trace!(command = %hex::encode(command), "Sending frame");
        let result = self.do_transmit_raw(command);
        match &result {
            Ok(response) => trace!(response = %hex::encode(response), "Received frame"),
            Err(error) => debug!(%error, "Frame round trip failed"),
        }
        result
    }

    /// Move one frame; called by [`CardTransport::transmit_raw`], which adds logging
    fn do_transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, TransportError>;
}

impl<T: CardTransport + ?Sized> CardTransport for &mut T {
    fn do_transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, TransportError> {
        (**self).do_transmit_raw(command)
    }
}

impl<T: CardTransport + ?Sized> CardTransport for Box<T> {
    fn do_transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, TransportError> {
        (**self).do_transmit_raw(command)
    }
}

/// Scripted transport for unit tests: replies are popped in order and every
/// command frame is recorded
#[cfg(test)]
#[derive(Debug, Clone, Default)]
#[allow(missing_docs, unreachable_pub)]
pub struct MockTransport {
    pub replies: std::collections::VecDeque<Bytes>,
    pub commands: Vec<Bytes>,
}

#[cfg(test)]
#[allow(missing_docs, unreachable_pub)]
impl MockTransport {
    pub fn from_hex(replies: &[&str]) -> Self {
        Self {
            replies: replies
                .iter()
                .map(|r| Bytes::from(hex::decode(r).unwrap()))
                .collect(),
            commands: Vec::new(),
        }
    }

    /// A single `90 00`
    pub fn with_success() -> Self {
        Self::from_hex(&["9000"])
    }
}

#[cfg(test)]
impl CardTransport for MockTransport {
    fn do_transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, TransportError> {
        self.commands.push(Bytes::copy_from_slice(command));
        self.replies.pop_front().ok_or(TransportError::Transmission)
    }
}
