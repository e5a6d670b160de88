//! Entry point for running commands against a device
//!
//! [`CardExecutor`] owns a transport and a processor and runs one logical command
//! at a time through them.

use bytes::Bytes;
use core::fmt;
use tracing::{debug, instrument, trace};

use crate::command::{ApduCommand, Command};
use crate::config::ExchangeConfig;
use crate::error::{Error, Result};
use crate::processor::{ChainingProcessor, CommandProcessor};
use crate::response::Response;
use crate::transport::CardTransport;

/// Runs logical commands to completion
pub trait Executor: fmt::Debug {
    /// Run one logical command to completion
    ///
    /// Returns the assembled payload and final status word. On error nothing
    /// received so far is returned.
    #[instrument(level = "trace", skip(self), fields(executor = std::any::type_name::<Self>()))]
    fn transmit(&mut self, command: &Command) -> Result<Response> {
        let response = self.do_transmit(command);
        match &response {
            Ok(response) => {
                trace!(
                    status = %response.status(),
                    payload = %hex::encode(response.payload()),
                    "Command completed"
                );
            }
            Err(error) => {
                debug!(%error, "Command failed");
            }
        }
        response
    }

    /// Exchange logic; called by [`Executor::transmit`]
    fn do_transmit(&mut self, command: &Command) -> Result<Response>;

    /// Run a raw, already encoded command and return the raw assembled response
    fn transmit_raw(&mut self, command: &[u8]) -> Result<Bytes> {
        let command = Command::from_bytes(command)?;
        self.transmit(&command).map(Bytes::from)
    }

    /// Run a typed command and parse its response
    fn execute<C: ApduCommand>(&mut self, command: &C) -> core::result::Result<C::Success, C::Error> {
        let response = self.transmit(&command.to_command())?;
        C::parse_response(response)
    }
}

/// A transport paired with the processor that drives exchanges over it
///
/// Defaults to [`ChainingProcessor`], so oversized commands are chained and
/// `61 XX` continuations are followed.
#[derive(Debug)]
pub struct CardExecutor<T: CardTransport, P: CommandProcessor = ChainingProcessor> {
    transport: T,
    processor: P,
    last_response: Option<Response>,
}

impl<T: CardTransport> CardExecutor<T> {
    /// Chaining executor with default settings
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, ExchangeConfig::default())
    }

    /// Chaining executor with the given settings
    pub fn with_config(transport: T, config: ExchangeConfig) -> Self {
        Self::with_processor(transport, ChainingProcessor::new(config))
    }
}

impl<T: CardTransport, P: CommandProcessor> CardExecutor<T, P> {
    /// Executor with any processor
    pub const fn with_processor(transport: T, processor: P) -> Self {
        Self {
            transport,
            processor,
            last_response: None,
        }
    }

    /// Borrow the transport
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Borrow the transport mutably
    pub const fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Give the transport back
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Borrow the processor
    pub const fn processor(&self) -> &P {
        &self.processor
    }

    /// Get the last completed response, cleared when an exchange fails
    pub const fn last_response(&self) -> Option<&Response> {
        self.last_response.as_ref()
    }
}

impl<T: CardTransport, P: CommandProcessor> Executor for CardExecutor<T, P> {
    fn do_transmit(&mut self, command: &Command) -> Result<Response> {
        self.last_response = None;

        let response = self
            .processor
            .process_command(command, &mut self.transport)
            .map_err(|e: Error| {
                e.with_context(format!("command {:02X} {:02X}", command.cla, command.ins))
            })?;

        self.last_response = Some(response.clone());
        Ok(response)
    }
}
