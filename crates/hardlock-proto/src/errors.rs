//! Error types for wire-format parsing and encoding.
//!
//! Every parser in this crate returns [`ProtocolError`] for malformed input.
//! None of these errors involve secret material: they describe structure
//! (lengths, tags, versions), never content.

use thiserror::Error;

/// Convenience alias for results in this crate.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Structural errors for Hardlock wire formats.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Input is shorter than the fixed-size portion of the format
    #[error("input too short: expected at least {expected} bytes, got {actual}")]
    TooShort {
        /// Minimum number of bytes required
        expected: usize,
        /// Number of bytes provided
        actual: usize,
    },

    /// A length-prefixed section claims more bytes than are present
    #[error("truncated {section}: need {expected} bytes, got {actual}")]
    Truncated {
        /// Which section of the format is truncated
        section: &'static str,
        /// Bytes the length prefix claims
        expected: usize,
        /// Bytes actually available
        actual: usize,
    },

    /// Input has an exact-size format but the wrong length
    #[error("invalid length for {what}: expected {expected} bytes, got {actual}")]
    InvalidLength {
        /// The structure being parsed
        what: &'static str,
        /// Required length
        expected: usize,
        /// Provided length
        actual: usize,
    },

    /// A value exceeds the maximum the format can carry
    #[error("{what} too large: {size} bytes exceeds maximum {max}")]
    TooLarge {
        /// The oversized item
        what: &'static str,
        /// Actual size
        size: usize,
        /// Allowed maximum
        max: usize,
    },

    /// Message frame version is not supported
    #[error("unsupported frame version: {0:#06x}")]
    UnsupportedVersion(u16),

    /// Encapsulation suite byte is not recognized
    #[error("unknown encapsulation suite: {0:#04x}")]
    UnknownSuite(u8),

    /// Handshake frame type byte is not recognized
    #[error("unknown handshake frame type: {0:#04x}")]
    UnknownFrameType(u8),

    /// Padding profile code is not recognized
    #[error("unknown padding profile: {0}")]
    UnknownPadProfile(u8),

    /// Output buffer cannot hold the encoded result; nothing was written
    #[error("buffer too small: need {required} bytes, have {available}")]
    BufferTooSmall {
        /// Bytes required
        required: usize,
        /// Capacity of the provided buffer
        available: usize,
    },
}
