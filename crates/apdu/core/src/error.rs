//! Errors raised while encoding, exchanging or decoding frames
//!
//! Every fallible operation in this crate returns [`Error`]. None of these errors
//! are retried internally; the session layer above decides whether to reset the
//! connection or give up.

use crate::response::status::StatusWord;
use crate::transport::TransportError;

/// Result alias used throughout this crate
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Field of a command frame that a size check applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthField {
    /// Command data (Lc)
    Data,
    /// Requested response length (Le)
    ExpectedLength,
}

/// The device broke the framing or chaining protocol
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolViolation {
    /// A response frame is shorter than its two byte status word
    #[error("response frame of {0} bytes has no status word")]
    ResponseTooShort(usize),

    /// An intermediate frame of a chained command was not acknowledged with 90 00
    #[error("command chaining aborted by device after frame {frame}: {status}")]
    ChainingAborted {
        /// Zero-based index of the rejected frame
        frame: usize,
        /// Status word returned for it
        status: StatusWord,
    },

    /// GET RESPONSE returned a continuation without any data
    #[error("continuation {0} returned no data")]
    EmptyContinuation(StatusWord),

    /// GET RESPONSE ended with an error status part way through a chained response
    #[error("response chaining aborted by device at round {round}: {status}")]
    ContinuationAborted {
        /// One-based GET RESPONSE round that failed
        round: usize,
        /// Status word returned for it
        status: StatusWord,
    },
}

/// Error type of every fallible operation in this crate
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The injected transport failed; the exchange is abandoned
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The device violated the framing or chaining protocol
    #[error("protocol violation: {0}")]
    ProtocolViolation(#[from] ProtocolViolation),

    /// A command field is too large for any APDU form
    #[error("{field:?} length {len} exceeds the maximum of {max}")]
    SizeLimitExceeded {
        /// Field that overflowed
        field: LengthField,
        /// Requested length
        len: usize,
        /// Largest encodable length
        max: usize,
    },

    /// The device kept announcing more data past the configured bound
    #[error("response chaining exceeded {0} GET RESPONSE rounds")]
    ChainLimitExceeded(usize),

    /// Raw command bytes do not form a valid APDU
    #[error("invalid command length: {0}")]
    InvalidCommandLength(usize),

    /// A completed exchange ended with a non-success status word
    #[error("status error {status}: {}", .status.description())]
    Status {
        /// Final status word of the exchange
        status: StatusWord,
    },

    /// Another error annotated with what was being done
    #[error("{context}: {source}")]
    Context {
        /// What was being done
        context: String,
        /// Underlying error
        source: Box<Self>,
    },
}

impl Error {
    /// Wrap this error with a note on what was being done
    pub fn with_context<S: Into<String>>(self, context: S) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Non-success status word error
    pub const fn status(sw1: u8, sw2: u8) -> Self {
        Self::Status {
            status: StatusWord::new(sw1, sw2),
        }
    }

    /// Strip any [`Error::Context`] layers and return the underlying error
    pub fn root(&self) -> &Self {
        match self {
            Self::Context { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether this error came from the transport rather than the protocol
    pub fn is_transport(&self) -> bool {
        matches!(self.root(), Self::Transport(_))
    }
}

/// Adds [`Error::with_context`] to results
pub trait ResultExt<T> {
    /// Annotate the error, if any
    fn context<S: Into<String>>(self, context: S) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context<S: Into<String>>(self, context: S) -> Self {
        self.map_err(|e| e.with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_root() {
        let err = Error::from(ProtocolViolation::ResponseTooShort(1))
            .with_context("parsing response")
            .with_context("executing command");

        assert!(matches!(
            err.root(),
            Error::ProtocolViolation(ProtocolViolation::ResponseTooShort(1))
        ));
        assert_eq!(
            err.to_string(),
            "executing command: parsing response: protocol violation: response frame of 1 bytes has no status word"
        );
        assert!(!err.is_transport());
    }

    #[test]
    fn test_status_error_display() {
        let err = Error::status(0x6A, 0x82);
        assert_eq!(err.to_string(), "status error 6A 82: File or application not found");
    }
}
