//! Command processors for APDU exchanges
//!
//! A processor turns one logical [`Command`] into the frames actually sent over a
//! [`CardTransport`] and folds the replies back into one [`Response`].

pub mod chaining;

use core::fmt;

use tracing::{Level, debug, event, trace};

use crate::command::{ApduCommand, Command};
use crate::error::{Result, ResultExt};
use crate::response::Response;
use crate::response::status::StatusWord;
use crate::transport::CardTransport;

pub use chaining::ChainingProcessor;

/// Drives one logical exchange over a transport
pub trait CommandProcessor: fmt::Debug {
    /// Run `command` to completion and log how it ended
    ///
    /// The transport is borrowed for the whole exchange, so frames of two
    /// logical commands can never interleave.
    fn process_command(
        &mut self,
        command: &Command,
        transport: &mut dyn CardTransport,
    ) -> Result<Response> {
        trace!(?command, processor = std::any::type_name::<Self>(), "Starting exchange");

        let result = self.do_process_command(command, transport);
        match &result {
            Ok(response) => log_status(response.status(), response.payload().len()),
            Err(error) => debug!(%error, "Exchange failed"),
        }
        result
    }

    /// Exchange logic; called by [`CommandProcessor::process_command`]
    fn do_process_command(
        &mut self,
        command: &Command,
        transport: &mut dyn CardTransport,
    ) -> Result<Response>;
}

/// Sends the command as one frame and returns the first reply as is
///
/// No command chaining and no GET RESPONSE handling.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityProcessor;

impl CommandProcessor for IdentityProcessor {
    fn do_process_command(
        &mut self,
        command: &Command,
        transport: &mut dyn CardTransport,
    ) -> Result<Response> {
        let frame = command.to_bytes()?;
        let reply = transport
            .transmit_raw(&frame)
            .map_err(crate::Error::from)
            .context("sending single frame")?;
        Response::try_from(reply).context("decoding reply")
    }
}

/// Log a final status word at the level its severity calls for
fn log_status(status: StatusWord, payload_len: usize) {
    let description = status.description();
    let level = status.tracing_level();
    // `event!` needs the level as a constant
    if level == Level::DEBUG {
        event!(Level::DEBUG, %status, description, payload_len, "Exchange completed");
    } else if level == Level::INFO {
        event!(Level::INFO, %status, description, payload_len, "Exchange completed");
    } else {
        event!(Level::WARN, %status, description, payload_len, "Exchange completed");
    }
}
