//! Configuration options for APDU exchanges

use crate::command::{MAX_EXTENDED_DATA, MAX_SHORT_DATA};

/// Default bound on GET RESPONSE rounds for one logical command
pub const DEFAULT_MAX_RESPONSE_CHAINS: usize = 1024;

/// Configuration options for the chaining engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeConfig {
    /// Whether the connection accepts extended-length frames
    pub extended_length: bool,

    /// Largest data field sent in one frame before command chaining kicks in
    pub max_command_data: usize,

    /// Largest number of GET RESPONSE rounds before the exchange is abandoned
    pub max_response_chains: usize,

    /// Class byte used for GET RESPONSE
    pub get_response_cla: u8,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            extended_length: false,
            max_command_data: MAX_SHORT_DATA,
            max_response_chains: DEFAULT_MAX_RESPONSE_CHAINS,
            get_response_cla: 0x00,
        }
    }
}

impl ExchangeConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable extended-length frames
    ///
    /// Enabling widens the single-frame capacity to 65535 bytes so large
    /// commands are sent unchained.
    pub const fn with_extended_length(mut self, extended_length: bool) -> Self {
        self.extended_length = extended_length;
        self.max_command_data = if extended_length {
            MAX_EXTENDED_DATA
        } else {
            MAX_SHORT_DATA
        };
        self
    }

    /// Set the data capacity of a single command frame
    ///
    /// Values are clamped to what the current length form can encode; zero is
    /// raised to one so chaining always makes progress.
    pub const fn with_max_command_data(mut self, max: usize) -> Self {
        let limit = if self.extended_length {
            MAX_EXTENDED_DATA
        } else {
            MAX_SHORT_DATA
        };
        self.max_command_data = if max == 0 {
            1
        } else if max > limit {
            limit
        } else {
            max
        };
        self
    }

    /// Set the bound on GET RESPONSE rounds
    pub const fn with_max_response_chains(mut self, max: usize) -> Self {
        self.max_response_chains = max;
        self
    }

    /// Set the class byte used for GET RESPONSE
    pub const fn with_get_response_cla(mut self, cla: u8) -> Self {
        self.get_response_cla = cla;
        self
    }
}
