//! Encapsulation blob layout and handshake init frames.
//!
//! The encapsulation blob is what an initiator sends to a recipient after
//! running the KEM. It is self-describing: the leading suite byte fixes the
//! layout, so the recipient needs nothing beyond the received byte count.

use bytes::BufMut;
use serde::{Deserialize, Serialize};

use crate::errors::{ProtocolError, Result};

/// Length of the KEM encapsulated key (X25519 ephemeral public key).
pub const ENC_LEN: usize = 32;

/// Length of the exported suite binder.
pub const BINDER_LEN: usize = 32;

/// Upper bound on any encapsulation blob this protocol produces or accepts.
pub const MAX_ENCAPSULATION_LEN: usize = 1024;

/// Key-encapsulation suite.
///
/// The suite byte is bound into the derived secrets via the binder, so a
/// blob cannot be replayed under a different suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Suite {
    /// HPKE base mode: anonymous initiator
    Base = 0x01,
    /// HPKE auth mode: initiator proves possession of a static key
    Auth = 0x02,
}

impl Suite {
    /// Wire byte for this suite.
    #[must_use]
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Parse a suite byte.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::UnknownSuite` for unassigned values
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            0x01 => Ok(Self::Base),
            0x02 => Ok(Self::Auth),
            other => Err(ProtocolError::UnknownSuite(other)),
        }
    }
}

/// Opaque-to-callers encapsulation blob.
///
/// Layout: `[suite: u8] [enc: 32] [binder: 32]` (65 bytes).
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct EncapsulatedSecret {
    suite: Suite,
    enc: [u8; ENC_LEN],
    binder: [u8; BINDER_LEN],
}

impl EncapsulatedSecret {
    /// Encoded size of every blob in the current format.
    pub const ENCODED_LEN: usize = 1 + ENC_LEN + BINDER_LEN;

    /// Assemble a blob from its parts.
    #[must_use]
    pub fn new(suite: Suite, enc: [u8; ENC_LEN], binder: [u8; BINDER_LEN]) -> Self {
        Self { suite, enc, binder }
    }

    /// Suite the blob was produced under.
    #[must_use]
    pub fn suite(&self) -> Suite {
        self.suite
    }

    /// KEM encapsulated key.
    #[must_use]
    pub fn enc(&self) -> &[u8; ENC_LEN] {
        &self.enc
    }

    /// Suite binder exported by the sender's HPKE context.
    #[must_use]
    pub fn binder(&self) -> &[u8; BINDER_LEN] {
        &self.binder
    }

    /// Serialize to the wire layout.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; Self::ENCODED_LEN] {
        let mut out = [0u8; Self::ENCODED_LEN];
        out[0] = self.suite.to_u8();
        out[1..1 + ENC_LEN].copy_from_slice(&self.enc);
        out[1 + ENC_LEN..].copy_from_slice(&self.binder);
        out
    }

    /// Parse a received blob.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::TooLarge` if the input exceeds
    ///   [`MAX_ENCAPSULATION_LEN`]
    /// - `ProtocolError::TooShort` for an empty input
    /// - `ProtocolError::UnknownSuite` for an unassigned suite byte
    /// - `ProtocolError::InvalidLength` if the length does not match the
    ///   suite's layout
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() > MAX_ENCAPSULATION_LEN {
            return Err(ProtocolError::TooLarge {
                what: "encapsulation blob",
                size: bytes.len(),
                max: MAX_ENCAPSULATION_LEN,
            });
        }
        let Some((&suite_byte, rest)) = bytes.split_first() else {
            return Err(ProtocolError::TooShort { expected: Self::ENCODED_LEN, actual: 0 });
        };
        let suite = Suite::from_u8(suite_byte)?;

        if bytes.len() != Self::ENCODED_LEN {
            return Err(ProtocolError::InvalidLength {
                what: "encapsulation blob",
                expected: Self::ENCODED_LEN,
                actual: bytes.len(),
            });
        }

        let mut enc = [0u8; ENC_LEN];
        let mut binder = [0u8; BINDER_LEN];
        enc.copy_from_slice(&rest[..ENC_LEN]);
        binder.copy_from_slice(&rest[ENC_LEN..]);

        Ok(Self { suite, enc, binder })
    }
}

/// Handshake frame type carried in [`HandshakeInit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FrameType {
    /// Anonymous initiation
    Init = 0x01,
    /// Sender-authenticated initiation
    InitAuth = 0x02,
}

impl FrameType {
    fn from_u8(value: u8) -> Result<Self> {
        match value {
            0x01 => Ok(Self::Init),
            0x02 => Ok(Self::InitAuth),
            other => Err(ProtocolError::UnknownFrameType(other)),
        }
    }
}

/// Length-prefixed handshake initiation message.
///
/// Layout: `[type: u8] [len: u32 BE] [blob: len]`. Lets a stream transport
/// delimit the blob without knowing its internal structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeInit {
    /// Initiation flavour
    pub frame_type: FrameType,
    /// Encoded [`EncapsulatedSecret`]
    pub blob: Vec<u8>,
}

impl HandshakeInit {
    const PREFIX_LEN: usize = 1 + 4;

    /// Wrap an encapsulation blob, choosing the frame type from its suite.
    #[must_use]
    pub fn from_secret(secret: &EncapsulatedSecret) -> Self {
        let frame_type = match secret.suite() {
            Suite::Base => FrameType::Init,
            Suite::Auth => FrameType::InitAuth,
        };
        Self { frame_type, blob: secret.to_bytes().to_vec() }
    }

    /// Encode into a buffer.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::TooLarge` if the blob exceeds
    ///   [`MAX_ENCAPSULATION_LEN`]
    pub fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        if self.blob.len() > MAX_ENCAPSULATION_LEN {
            return Err(ProtocolError::TooLarge {
                what: "encapsulation blob",
                size: self.blob.len(),
                max: MAX_ENCAPSULATION_LEN,
            });
        }
        dst.put_u8(self.frame_type as u8);
        dst.put_u32(self.blob.len() as u32);
        dst.put_slice(&self.blob);
        Ok(())
    }

    /// Decode from the front of `bytes`, returning the frame and bytes used.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::TooShort` if the prefix is incomplete
    /// - `ProtocolError::UnknownFrameType` for an unknown type byte
    /// - `ProtocolError::TooLarge` if the declared length exceeds the bound
    /// - `ProtocolError::Truncated` if the blob is incomplete
    pub fn decode(bytes: &[u8]) -> Result<(Self, usize)> {
        if bytes.len() < Self::PREFIX_LEN {
            return Err(ProtocolError::TooShort { expected: Self::PREFIX_LEN, actual: bytes.len() });
        }
        let frame_type = FrameType::from_u8(bytes[0])?;
        let len = u32::from_be_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]) as usize;
        if len > MAX_ENCAPSULATION_LEN {
            return Err(ProtocolError::TooLarge {
                what: "encapsulation blob",
                size: len,
                max: MAX_ENCAPSULATION_LEN,
            });
        }

        let body = &bytes[Self::PREFIX_LEN..];
        if body.len() < len {
            return Err(ProtocolError::Truncated {
                section: "handshake blob",
                expected: len,
                actual: body.len(),
            });
        }

        Ok((Self { frame_type, blob: body[..len].to_vec() }, Self::PREFIX_LEN + len))
    }
}
