//! Command and response chaining
//!
//! Splits command data that does not fit one frame across several frames marked
//! with the chaining bit, then follows `61 XX` continuations with GET RESPONSE
//! until the device reports a terminal status word.

use bytes::{Bytes, BytesMut};
use tracing::{debug, trace};

use super::CommandProcessor;
use crate::command::{ApduCommand, CLA_CHAINING, Command, MAX_SHORT_LE};
use crate::config::ExchangeConfig;
use crate::error::{Error, ProtocolViolation, Result, ResultExt};
use crate::response::Response;
use crate::response::status::{Outcome, StatusWord};
use crate::transport::CardTransport;

/// Splits oversized commands into chained frames and follows `61 XX` continuations
#[derive(Debug, Clone, Copy, Default)]
pub struct ChainingProcessor {
    config: ExchangeConfig,
}

/// State of one logical exchange, dropped as soon as it ends or fails
#[derive(Debug)]
struct ExchangeState<'a> {
    /// Command data not yet sent
    remaining: &'a [u8],
    /// Response payload gathered so far
    received: BytesMut,
    /// Status word of the last frame received
    status: Option<StatusWord>,
    /// Command frames sent so far
    frames_sent: usize,
    /// GET RESPONSE rounds issued so far
    continuations: usize,
}

impl<'a> ExchangeState<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            remaining: data,
            received: BytesMut::new(),
            status: None,
            frames_sent: 0,
            continuations: 0,
        }
    }

    /// Take the next chunk of command data, at most `capacity` bytes
    fn next_chunk(&mut self, capacity: usize) -> &'a [u8] {
        let (chunk, rest) = self.remaining.split_at(capacity.min(self.remaining.len()));
        self.remaining = rest;
        chunk
    }

    const fn has_more_data(&self) -> bool {
        !self.remaining.is_empty()
    }

    fn record(&mut self, payload: &[u8], status: StatusWord) {
        self.received.extend_from_slice(payload);
        self.status = Some(status);
    }

    fn finish(self, status: StatusWord) -> Response {
        Response::new(self.received.freeze(), status)
    }
}

impl ChainingProcessor {
    /// Chaining processor using `config`
    pub const fn new(config: ExchangeConfig) -> Self {
        Self { config }
    }

    /// Configuration in use
    pub const fn config(&self) -> &ExchangeConfig {
        &self.config
    }

    /// Send one frame and split the reply into payload and status word
    fn exchange_frame(
        transport: &mut dyn CardTransport,
        frame: &Command,
    ) -> Result<Response> {
        let bytes = frame.to_bytes()?;
        let response_bytes = transport.transmit_raw(&bytes).map_err(Error::from)?;
        Response::try_from(response_bytes)
    }

    /// Le for the final command frame, limited to short form when the connection
    /// has no extended length support
    fn final_le(&self, command: &Command) -> Option<u32> {
        match command.wire_expected_length() {
            Some(le) if !self.config.extended_length && le > MAX_SHORT_LE => Some(MAX_SHORT_LE),
            le => le,
        }
    }

    /// Send the command frames, returning the reply to the last one
    fn send_command(
        &self,
        command: &Command,
        state: &mut ExchangeState<'_>,
        transport: &mut dyn CardTransport,
    ) -> Result<(Bytes, StatusWord)> {
        let capacity = self.config.max_command_data;

        if command.data.is_none() || !state.has_more_data() {
            // Nothing to split: one frame, data (possibly empty) passed through
            let frame = Command {
                le: self.final_le(command),
                ..command.clone()
            };
            return Ok(Self::exchange_frame(transport, &frame)?.into_parts());
        }

        loop {
            let chunk = state.next_chunk(capacity);
            let last = !state.has_more_data();
            let frame = Command {
                cla: if last { command.cla } else { command.cla | CLA_CHAINING },
                ins: command.ins,
                p1: command.p1,
                p2: command.p2,
                data: Some(Bytes::copy_from_slice(chunk)),
                le: if last { self.final_le(command) } else { None },
            };

            trace!(
                frame = state.frames_sent,
                len = chunk.len(),
                last,
                "Sending command frame"
            );

            let (payload, status) = Self::exchange_frame(transport, &frame)?.into_parts();
            state.frames_sent += 1;

            if last {
                return Ok((payload, status));
            }

            if !status.is_success() {
                debug!(
                    frame = state.frames_sent - 1,
                    %status,
                    "Device rejected intermediate command frame"
                );
                return Err(ProtocolViolation::ChainingAborted {
                    frame: state.frames_sent - 1,
                    status,
                }
                .into());
            }
        }
    }
}

impl CommandProcessor for ChainingProcessor {
    fn do_process_command(
        &mut self,
        command: &Command,
        transport: &mut dyn CardTransport,
    ) -> Result<Response> {
        // Reject oversized commands before any frame reaches the device
        command.length_form()?;

        let mut state = ExchangeState::new(command.data.as_deref().unwrap_or_default());
        if state.remaining.len() > self.config.max_command_data {
            debug!(
                len = state.remaining.len(),
                capacity = self.config.max_command_data,
                "Command data exceeds frame capacity, chaining"
            );
        }

        let (payload, mut status) = self
            .send_command(command, &mut state, transport)
            .context("sending command frame")?;
        state.record(&payload, status);

        while let Outcome::ContinuationAvailable(remaining) = status.outcome() {
            if state.continuations >= self.config.max_response_chains {
                return Err(Error::ChainLimitExceeded(self.config.max_response_chains));
            }

            let le = status.outcome().continuation_length().unwrap_or(MAX_SHORT_LE);
            trace!(
                remaining,
                chain_count = state.continuations + 1,
                "Sending GET RESPONSE command"
            );

            let get_response = Command::get_response(self.config.get_response_cla, le);
            let (payload, next) = Self::exchange_frame(transport, &get_response)
                .context("fetching continuation")?
                .into_parts();
            state.continuations += 1;

            if payload.is_empty() && next.is_more_data_available() {
                return Err(ProtocolViolation::EmptyContinuation(next).into());
            }

            // Partial payloads never reach the caller
            if next.outcome().is_terminal() && !next.is_success() {
                debug!(
                    round = state.continuations,
                    status = %next,
                    discarded = state.received.len() + payload.len(),
                    "Device failed GET RESPONSE mid-chain"
                );
                return Err(ProtocolViolation::ContinuationAborted {
                    round: state.continuations,
                    status: next,
                }
                .into());
            }

            state.record(&payload, next);
            status = next;
        }

        trace!(
            total_data_len = state.received.len(),
            frames = state.frames_sent,
            continuations = state.continuations,
            final_sw = ?state.status,
            "Completed exchange"
        );

        Ok(state.finish(status))
    }
}
