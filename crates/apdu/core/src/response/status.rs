//! Status word definitions and the generic outcome classifier
//!
//! Every response frame ends with a two byte status word. Higher protocol layers
//! branch on [`Outcome`], which folds the status words this device family uses
//! into a small, stable set of cases.

use std::fmt;

use tracing::Level;

/// SW1 value announcing that more response data is waiting (`61 XX`)
pub const SW1_MORE_DATA: u8 = 0x61;

/// Trailing `SW1 SW2` pair of a response frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusWord {
    /// SW1
    pub sw1: u8,
    /// SW2
    pub sw2: u8,
}

/// Generic outcome of a status word, independent of the application that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// `90 00`
    Success,
    /// `61 XX`: `XX` more bytes can be fetched with GET RESPONSE.
    ///
    /// A count of zero means the device did not say how many; callers should
    /// request everything (Le = 256).
    ContinuationAvailable(u8),
    /// `63 00` or `63 CX`: verification failed, the device wants (re)authentication
    AuthenticationRequired,
    /// `69 85`
    ConditionsNotSatisfied,
    /// `67 00`
    WrongLength,
    /// `6A 81` or `6D 00`
    FunctionNotSupported,
    /// `6A 82` or `6A 88`
    NoSuchObject,
    /// `69 82`
    SecurityStatusNotSatisfied,
    /// Any status word not covered above
    Unknown(u16),
}

impl Outcome {
    /// Whether this outcome ends an exchange (anything but a continuation)
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::ContinuationAvailable(_))
    }

    /// Le to request with GET RESPONSE for a continuation outcome
    ///
    /// A zero count maps to 256, which a short-form frame encodes as `00`.
    pub const fn continuation_length(&self) -> Option<u32> {
        match self {
            Self::ContinuationAvailable(0) => Some(256),
            Self::ContinuationAvailable(n) => Some(*n as u32),
            _ => None,
        }
    }
}

/// Classify a status word into its generic [`Outcome`]
pub const fn classify(status: StatusWord) -> Outcome {
    match (status.sw1, status.sw2) {
        (0x90, 0x00) => Outcome::Success,
        (SW1_MORE_DATA, n) => Outcome::ContinuationAvailable(n),
        (0x63, 0x00) => Outcome::AuthenticationRequired,
        (0x63, n) if (n & 0xF0) == 0xC0 => Outcome::AuthenticationRequired,
        (0x67, 0x00) => Outcome::WrongLength,
        (0x69, 0x82) => Outcome::SecurityStatusNotSatisfied,
        (0x69, 0x85) => Outcome::ConditionsNotSatisfied,
        (0x6A, 0x81) | (0x6D, 0x00) => Outcome::FunctionNotSupported,
        (0x6A, 0x82) | (0x6A, 0x88) => Outcome::NoSuchObject,
        _ => Outcome::Unknown(status.to_u16()),
    }
}

impl StatusWord {
    /// Build a status word from its two bytes
    pub const fn new(sw1: u8, sw2: u8) -> Self {
        Self { sw1, sw2 }
    }

    /// Split a big-endian `SW1SW2` value
    pub const fn from_u16(raw: u16) -> Self {
        let [sw1, sw2] = raw.to_be_bytes();
        Self { sw1, sw2 }
    }

    /// Big-endian `SW1SW2` value
    pub const fn to_u16(&self) -> u16 {
        u16::from_be_bytes([self.sw1, self.sw2])
    }

    /// Classify this status word, see [`classify`]
    pub const fn outcome(&self) -> Outcome {
        classify(*self)
    }

    /// `90 00`
    pub const fn is_success(&self) -> bool {
        matches!(self.outcome(), Outcome::Success)
    }

    /// `61 XX`
    pub const fn is_more_data_available(&self) -> bool {
        self.sw1 == SW1_MORE_DATA
    }

    /// The `XX` of a `61 XX` status word
    pub const fn remaining_bytes(&self) -> Option<u8> {
        match self.outcome() {
            Outcome::ContinuationAvailable(n) => Some(n),
            _ => None,
        }
    }

    /// Level at which exchanges ending with this status word are logged
    ///
    /// Success and continuations are routine, `62 XX`/`63 XX` are warnings from
    /// the device and everything else is an error.
    pub const fn tracing_level(&self) -> Level {
        match (self.sw1, self.sw2) {
            (0x90, 0x00) | (SW1_MORE_DATA, _) => Level::DEBUG,
            (0x62 | 0x63, _) => Level::INFO,
            _ => Level::WARN,
        }
    }

    /// Short human-readable meaning, for logs and error messages
    pub const fn description(&self) -> &'static str {
        match self.outcome() {
            Outcome::Success => "Success",
            Outcome::ContinuationAvailable(_) => "More data available",
            Outcome::AuthenticationRequired => "Verification failed",
            Outcome::WrongLength => "Wrong length",
            Outcome::SecurityStatusNotSatisfied => "Security status not satisfied",
            Outcome::ConditionsNotSatisfied => "Conditions of use not satisfied",
            Outcome::FunctionNotSupported if self.sw1 == 0x6D => "Instruction not supported",
            Outcome::FunctionNotSupported => "Function not supported",
            Outcome::NoSuchObject if self.sw2 == 0x82 => "File or application not found",
            Outcome::NoSuchObject => "Referenced data not found",
            Outcome::Unknown(_) => match (self.sw1, self.sw2) {
                (0x68, 0x84) => "Command chaining not supported",
                (0x69, 0x83) => "Authentication method blocked",
                (0x69, 0x86) => "Command not allowed",
                (0x6A, 0x80) => "Incorrect parameters in the data field",
                (0x6A, 0x86) | (0x6B, 0x00) => "Incorrect parameters P1-P2",
                (0x6C, _) => "Wrong Le field",
                (0x6E, 0x00) => "Class not supported",
                _ => "Unknown status word",
            },
        }
    }
}

impl From<(u8, u8)> for StatusWord {
    fn from((sw1, sw2): (u8, u8)) -> Self {
        Self::new(sw1, sw2)
    }
}

impl From<u16> for StatusWord {
    fn from(raw: u16) -> Self {
        Self::from_u16(raw)
    }
}

impl From<StatusWord> for u16 {
    fn from(status: StatusWord) -> Self {
        status.to_u16()
    }
}

impl From<StatusWord> for Outcome {
    fn from(status: StatusWord) -> Self {
        classify(status)
    }
}

impl fmt::Display for StatusWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X} {:02X}", self.sw1, self.sw2)
    }
}

/// Named status words, one per classifier row
pub mod common {
    use super::StatusWord;

    /// `90 00`
    pub const SUCCESS: StatusWord = StatusWord::new(0x90, 0x00);

    /// `61 00`, continuation of unknown size
    pub const MORE_DATA: StatusWord = StatusWord::new(0x61, 0x00);

    /// `63 00`
    pub const VERIFICATION_FAILED: StatusWord = StatusWord::new(0x63, 0x00);

    /// `67 00`
    pub const WRONG_LENGTH: StatusWord = StatusWord::new(0x67, 0x00);

    /// `68 84`, sent by devices that reject the chaining bit
    pub const CHAINING_NOT_SUPPORTED: StatusWord = StatusWord::new(0x68, 0x84);

    /// `69 82`
    pub const SECURITY_STATUS_NOT_SATISFIED: StatusWord = StatusWord::new(0x69, 0x82);

    /// `69 85`
    pub const CONDITIONS_NOT_SATISFIED: StatusWord = StatusWord::new(0x69, 0x85);

    /// `6A 81`
    pub const FUNCTION_NOT_SUPPORTED: StatusWord = StatusWord::new(0x6A, 0x81);

    /// `6A 82`
    pub const FILE_NOT_FOUND: StatusWord = StatusWord::new(0x6A, 0x82);

    /// `6A 88`
    pub const DATA_NOT_FOUND: StatusWord = StatusWord::new(0x6A, 0x88);

    /// `6D 00`
    pub const INS_NOT_SUPPORTED: StatusWord = StatusWord::new(0x6D, 0x00);
}
