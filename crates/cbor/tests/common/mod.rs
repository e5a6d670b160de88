//! Shared helpers for integration tests

#![allow(dead_code, unreachable_pub)]

use keywire_apdu_core::command::INS_GET_RESPONSE;
use keywire_apdu_core::{Bytes, CardTransport, Command, TransportError};

/// Install a test subscriber once; honours `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Simulated authenticator answering every command with the same CBOR body
///
/// The body is handed out `chunk` bytes at a time behind a status byte, the way
/// CTAP2-over-APDU devices answer, with `61 XX` announcing what is left.
#[derive(Debug)]
pub struct AuthenticatorTransport {
    body: Vec<u8>,
    pending: Vec<u8>,
    chunk: usize,
    /// Commands seen, GET RESPONSE included
    pub commands: Vec<Command>,
}

impl AuthenticatorTransport {
    pub fn new(status: u8, cbor: &[u8], chunk: usize) -> Self {
        let mut body = vec![status];
        body.extend_from_slice(cbor);
        Self {
            body,
            pending: Vec::new(),
            chunk,
            commands: Vec::new(),
        }
    }

    fn reply(&mut self) -> Bytes {
        let take = self.chunk.min(self.pending.len());
        let mut frame: Vec<u8> = self.pending.drain(..take).collect();
        match self.pending.len() {
            0 => frame.extend_from_slice(&[0x90, 0x00]),
            n => frame.extend_from_slice(&[0x61, n.min(self.chunk) as u8]),
        }
        Bytes::from(frame)
    }
}

impl CardTransport for AuthenticatorTransport {
    fn do_transmit_raw(&mut self, raw: &[u8]) -> Result<Bytes, TransportError> {
        let command = Command::from_bytes(raw).map_err(|e| TransportError::other(e.to_string()))?;
        if command.ins != INS_GET_RESPONSE {
            self.pending = self.body.clone();
        }
        self.commands.push(command);
        Ok(self.reply())
    }
}
