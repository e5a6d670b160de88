//! Failures reported by a card transport

/// Why a transport could not complete one frame round trip
///
/// The core never retries or inspects these beyond aborting the exchange in
/// progress; reconnecting is up to whoever owns the transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// No device is attached or the link to it was lost
    #[error("device disconnected")]
    Disconnected,

    /// The frame was not delivered or no reply frame came back
    #[error("frame transmission failed")]
    Transmission,

    /// The device did not answer in time
    #[error("device did not answer in time")]
    Timeout,

    /// The caller cancelled the exchange
    #[error("exchange cancelled")]
    Cancelled,

    /// Reader or driver specific error code
    #[error("driver error {0:#x}")]
    Driver(i32),

    /// I/O error from an underlying byte stream
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Anything else, described by the transport
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Free-form transport failure
    pub fn other<S: Into<String>>(message: S) -> Self {
        Self::Other(message.into())
    }
}
