//! Configuration options for the CBOR decoder

/// Default limit on array/map nesting
pub const DEFAULT_MAX_DEPTH: usize = 16;

/// How strictly the decoder checks well-formedness beyond what it needs to decode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Conformance {
    /// Accept non-minimal argument encodings, let duplicate map keys overwrite
    /// earlier ones and ignore bytes after the top-level value
    #[default]
    Lax,
    /// Reject non-minimal argument encodings, duplicate map keys and trailing bytes
    Strict,
}

/// Configuration options for [`Decoder`](crate::Decoder)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Conformance mode
    pub conformance: Conformance,

    /// Deepest array/map nesting accepted
    pub max_depth: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            conformance: Conformance::Lax,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl DecoderConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Default settings with strict conformance
    pub fn strict() -> Self {
        Self::default().with_conformance(Conformance::Strict)
    }

    /// Set the conformance mode
    pub const fn with_conformance(mut self, conformance: Conformance) -> Self {
        self.conformance = conformance;
        self
    }

    /// Set the nesting limit
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Whether strict conformance checks are enabled
    pub const fn is_strict(&self) -> bool {
        matches!(self.conformance, Conformance::Strict)
    }
}
