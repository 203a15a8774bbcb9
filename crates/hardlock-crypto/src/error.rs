//! Error types and numeric status codes.
//!
//! Each layer has its own error enum. Failures that an attacker could use as
//! an oracle (tag mismatch, wrong counter, wrong sender, expired token,
//! binder mismatch) collapse into a single `Rejected` variant per layer; the
//! specific cause is only ever emitted as a `tracing` event.
//!
//! # Status codes
//!
//! Callers that need integer results (e.g. a C shim) use [`Status`]:
//!
//! | code | meaning |
//! |------|---------|
//! | `>= 0` | success, value is the number of bytes written |
//! | `-1` | invalid input: malformed blob/header/frame, bad length |
//! | `-2` | rejected: authentication, decapsulation, expiry or counter failure |
//! | `-3` | output buffer too small, nothing written |
//! | `-4` | entropy source failure |
//! | `-5` | ratchet chain exhausted, session must be discarded |

use hardlock_proto::{ProtocolError, Suite};
use thiserror::Error;

use crate::config::ConfigError;

/// Stable negative status codes for every failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Status {
    /// Malformed or out-of-range input
    InvalidInput = -1,
    /// Undifferentiated cryptographic rejection
    Rejected = -2,
    /// Output buffer cannot hold the result
    BufferTooSmall = -3,
    /// Entropy source failed
    EntropyFailure = -4,
    /// Ratchet chain reached its message limit
    ChainExhausted = -5,
}

impl Status {
    /// Integer form of this status.
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// Convert an operation result into the length-or-negative-status form.
///
/// Lengths that do not fit in `i32` are reported as
/// [`Status::BufferTooSmall`]: no caller can size a buffer that large
/// through an `i32` interface.
pub fn status_of<E>(result: &Result<usize, E>) -> i32
where
    for<'a> &'a E: Into<Status>,
{
    match result {
        Ok(len) => i32::try_from(*len).unwrap_or(Status::BufferTooSmall.code()),
        Err(err) => Into::<Status>::into(err).code(),
    }
}

/// Entropy source failure.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("entropy source failure (os error {code:?})")]
pub struct EntropyError {
    /// Raw OS error code, when the platform provides one
    pub code: Option<i32>,
}

/// Errors from key generation and key encapsulation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandshakeError {
    /// Encapsulation blob is structurally invalid
    #[error("malformed encapsulation: {0}")]
    Malformed(#[from] ProtocolError),

    /// Blob was produced under a different suite than the caller expects
    #[error("suite mismatch: expected {expected:?}, got {actual:?}")]
    SuiteMismatch {
        /// Suite the decapsulating call handles
        expected: Suite,
        /// Suite carried in the blob
        actual: Suite,
    },

    /// Recipient public key cannot be used for key agreement
    #[error("invalid recipient public key")]
    InvalidPublicKey,

    /// Handshake configuration is unusable
    #[error("invalid handshake config: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// Decapsulation failed. Deliberately carries no cause.
    #[error("decapsulation rejected")]
    Rejected,

    /// Output buffer too small; nothing written
    #[error("buffer too small: need {required} bytes, have {available}")]
    BufferTooSmall {
        /// Bytes required
        required: usize,
        /// Bytes available
        available: usize,
    },

    /// Entropy source failed
    #[error(transparent)]
    Entropy(#[from] EntropyError),
}

/// Errors from ratchet session operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Peer public key yields a non-contributory shared secret
    #[error("invalid peer public key")]
    InvalidPeerKey,

    /// Session configuration is unusable
    #[error("invalid session config: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// Message rejected. Covers tag mismatch, counter replay or gap, wrong
    /// sender and header/length inconsistencies. Deliberately carries no
    /// cause. The receive counter is not advanced.
    #[error("message rejected")]
    Rejected,

    /// Header bytes have the wrong length
    #[error("malformed header: {0}")]
    MalformedHeader(#[from] ProtocolError),

    /// Plaintext longer than the header's 32-bit length field
    #[error("plaintext too large: {len} bytes")]
    PlaintextTooLarge {
        /// Plaintext length
        len: usize,
    },

    /// Output buffer too small; session state unchanged
    #[error("buffer too small: need {required} bytes, have {available}")]
    BufferTooSmall {
        /// Bytes required
        required: usize,
        /// Bytes available
        available: usize,
    },

    /// Chain reached its configured message limit
    #[error("ratchet chain exhausted after {limit} messages")]
    ChainExhausted {
        /// Configured limit that was reached
        limit: u32,
    },
}

impl SessionError {
    /// Returns true if the session must be discarded and renegotiated.
    ///
    /// Rejected messages leave the session intact; the caller may keep
    /// using it. Exhaustion is permanent.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ChainExhausted { .. })
    }
}

/// Errors from the capability token service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Token failed verification. Covers bad tag, malformed payload and
    /// expiry. Deliberately carries no cause.
    #[error("token rejected")]
    Rejected,

    /// Scope does not fit the payload's 16-bit length field
    #[error("scope too long: {len} bytes exceeds {max}")]
    ScopeTooLong {
        /// Scope length
        len: usize,
        /// Maximum allowed
        max: usize,
    },

    /// Output buffer too small; nothing written
    #[error("buffer too small: need {required} bytes, have {available}")]
    BufferTooSmall {
        /// Bytes required
        required: usize,
        /// Bytes available
        available: usize,
    },

    /// Entropy source failed
    #[error(transparent)]
    Entropy(#[from] EntropyError),
}

/// Any error produced by this crate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Wire-format error
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    /// Handshake error
    #[error(transparent)]
    Handshake(#[from] HandshakeError),
    /// Session error
    #[error(transparent)]
    Session(#[from] SessionError),
    /// Token error
    #[error(transparent)]
    Token(#[from] TokenError),
    /// Entropy failure outside a handshake or token operation
    #[error(transparent)]
    Entropy(#[from] EntropyError),
}

impl Error {
    /// Status class of this error.
    pub fn status(&self) -> Status {
        match self {
            Self::Protocol(e) => e.into(),
            Self::Handshake(e) => e.into(),
            Self::Session(e) => e.into(),
            Self::Token(e) => e.into(),
            Self::Entropy(_) => Status::EntropyFailure,
        }
    }
}

impl From<&ProtocolError> for Status {
    fn from(err: &ProtocolError) -> Self {
        match err {
            ProtocolError::BufferTooSmall { .. } => Self::BufferTooSmall,
            _ => Self::InvalidInput,
        }
    }
}

impl From<&HandshakeError> for Status {
    fn from(err: &HandshakeError) -> Self {
        match err {
            HandshakeError::Malformed(_)
            | HandshakeError::SuiteMismatch { .. }
            | HandshakeError::InvalidPublicKey
            | HandshakeError::InvalidConfig(_) => Self::InvalidInput,
            HandshakeError::Rejected => Self::Rejected,
            HandshakeError::BufferTooSmall { .. } => Self::BufferTooSmall,
            HandshakeError::Entropy(_) => Self::EntropyFailure,
        }
    }
}

impl From<&SessionError> for Status {
    fn from(err: &SessionError) -> Self {
        match err {
            SessionError::InvalidPeerKey
            | SessionError::InvalidConfig(_)
            | SessionError::MalformedHeader(_)
            | SessionError::PlaintextTooLarge { .. } => Self::InvalidInput,
            SessionError::Rejected => Self::Rejected,
            SessionError::BufferTooSmall { .. } => Self::BufferTooSmall,
            SessionError::ChainExhausted { .. } => Self::ChainExhausted,
        }
    }
}

impl From<&TokenError> for Status {
    fn from(err: &TokenError) -> Self {
        match err {
            TokenError::Rejected => Self::Rejected,
            TokenError::ScopeTooLong { .. } => Self::InvalidInput,
            TokenError::BufferTooSmall { .. } => Self::BufferTooSmall,
            TokenError::Entropy(_) => Self::EntropyFailure,
        }
    }
}

impl From<&Error> for Status {
    fn from(err: &Error) -> Self {
        err.status()
    }
}
