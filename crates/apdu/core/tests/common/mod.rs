//! Shared mock transports for integration tests

#![allow(dead_code, unreachable_pub)]

use keywire_apdu_core::command::{CLA_CHAINING, INS_GET_RESPONSE};
use keywire_apdu_core::{Bytes, CardTransport, Command, TransportError};

/// Install a test subscriber once; honours `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Transport replaying scripted response frames in order
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    responses: Vec<Bytes>,
    /// Raw command frames received, in order
    pub commands: Vec<Bytes>,
}

impl ScriptedTransport {
    pub fn new<I, B>(responses: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        Self {
            responses: responses.into_iter().map(Into::into).collect(),
            commands: Vec::new(),
        }
    }

    pub fn round_trips(&self) -> usize {
        self.commands.len()
    }
}

impl CardTransport for ScriptedTransport {
    fn do_transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, TransportError> {
        self.commands.push(Bytes::copy_from_slice(command));
        if self.responses.is_empty() {
            return Err(TransportError::other("script exhausted"));
        }
        Ok(self.responses.remove(0))
    }
}

/// Simulated device echoing the data of every logical command back
///
/// Chained command frames are collected until the last one arrives. Replies
/// longer than the Le of the request are handed out with `61 XX` and GET RESPONSE.
#[derive(Debug, Default)]
pub struct LoopbackTransport {
    incoming: Vec<u8>,
    pending: Vec<u8>,
    pub round_trips: usize,
}

impl LoopbackTransport {
    fn reply(&mut self, le: usize) -> Bytes {
        let take = le.min(self.pending.len());
        let mut frame: Vec<u8> = self.pending.drain(..take).collect();
        match self.pending.len() {
            0 => frame.extend_from_slice(&[0x90, 0x00]),
            n if n > 0xFF => frame.extend_from_slice(&[0x61, 0x00]),
            n => frame.extend_from_slice(&[0x61, n as u8]),
        }
        Bytes::from(frame)
    }
}

impl CardTransport for LoopbackTransport {
    fn do_transmit_raw(&mut self, raw: &[u8]) -> Result<Bytes, TransportError> {
        self.round_trips += 1;
        let command = Command::from_bytes(raw).map_err(|e| TransportError::other(e.to_string()))?;

        if command.ins == INS_GET_RESPONSE {
            let le = command.le.unwrap_or(256) as usize;
            return Ok(self.reply(le));
        }

        if let Some(data) = &command.data {
            self.incoming.extend_from_slice(data);
        }
        if command.cla & CLA_CHAINING != 0 {
            return Ok(Bytes::from_static(&[0x90, 0x00]));
        }

        self.pending = std::mem::take(&mut self.incoming);
        let le = match command.le {
            Some(le) => le as usize,
            // Without Le the device still answers within one short frame
            None => 256,
        };
        Ok(self.reply(le))
    }
}
