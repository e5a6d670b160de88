//! APDU framing and chaining for hardware authenticators
//!
//! This crate provides the command/response layer used to talk to smart-card-class
//! security devices according to ISO/IEC 7816-4.
//!
//! ## Overview
//!
//! - [`Command`] encodes a logical command into a short-form or extended-form frame
//! - [`Response`] decodes a response frame into payload and [`StatusWord`]
//! - [`classify`] folds a status word into a generic [`Outcome`]
//! - [`ChainingProcessor`] splits oversized commands across chained frames and
//!   follows `61 XX` continuations with GET RESPONSE
//! - [`CardExecutor`] ties a [`CardTransport`] to a processor
//!
//! Transports, sessions and per-application command sets live outside this crate.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![forbid(unsafe_code)]
#![warn(missing_docs, rustdoc::missing_crate_level_docs)]

pub use bytes::{Bytes, BytesMut};

pub mod command;
pub mod config;
pub mod executor;
pub mod processor;
pub mod response;
pub mod transport;

mod error;
pub use error::{Error, LengthField, ProtocolViolation, Result, ResultExt};

pub use command::{ApduCommand, Command, ExpectedLength, LengthForm};
pub use config::ExchangeConfig;
pub use executor::{CardExecutor, Executor};
pub use processor::{ChainingProcessor, CommandProcessor, IdentityProcessor};
pub use response::Response;
pub use response::status::{Outcome, StatusWord, classify};
pub use transport::{CardTransport, TransportError};

/// Types and traits most callers need
pub mod prelude {
    pub use crate::{
        Bytes, BytesMut, Command, Error, ExchangeConfig, Outcome, Response, Result, ResultExt,
        command::ApduCommand,
        executor::{CardExecutor, Executor},
        processor::CommandProcessor,
        response::status::{StatusWord, common as status},
        transport::{CardTransport, TransportError},
    };
}
