//! Transport envelope header.
//!
//! Prefixes a padded message with the sender's capability token and the
//! padding profile in use, so a relay can check authorization without
//! touching the ratchet ciphertext.

use bytes::BufMut;

use crate::{
    errors::{ProtocolError, Result},
    padding::PadProfile,
};

/// Envelope prefix.
///
/// Layout (Big Endian): `[ts_unix_s: u64] [token_len: u32] [profile: u8]
/// [token: token_len]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeHeader {
    /// Sender wall-clock time, Unix seconds
    pub ts_unix_s: u64,
    /// Padding profile applied to the enclosed frame
    pub profile: PadProfile,
    /// Capability token wire bytes
    pub token: Vec<u8>,
}

impl EnvelopeHeader {
    const PREFIX_LEN: usize = 8 + 4 + 1;

    /// Largest token an envelope will carry.
    pub const MAX_TOKEN_LEN: usize = 64 * 1024;

    /// Encode into a buffer.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::TooLarge` if the token exceeds
    ///   [`Self::MAX_TOKEN_LEN`]
    pub fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        if self.token.len() > Self::MAX_TOKEN_LEN {
            return Err(ProtocolError::TooLarge {
                what: "envelope token",
                size: self.token.len(),
                max: Self::MAX_TOKEN_LEN,
            });
        }
        dst.put_u64(self.ts_unix_s);
        dst.put_u32(self.token.len() as u32);
        dst.put_u8(self.profile.to_u8());
        dst.put_slice(&self.token);
        Ok(())
    }

    /// Decode from the front of `bytes`, returning the header and the
    /// remaining bytes (the padded frame).
    ///
    /// # Errors
    ///
    /// - `ProtocolError::TooShort` if the prefix is incomplete
    /// - `ProtocolError::UnknownPadProfile` for an unknown profile code
    /// - `ProtocolError::TooLarge` / `ProtocolError::Truncated` for a bad
    ///   token length
    pub fn decode(bytes: &[u8]) -> Result<(Self, &[u8])> {
        if bytes.len() < Self::PREFIX_LEN {
            return Err(ProtocolError::TooShort { expected: Self::PREFIX_LEN, actual: bytes.len() });
        }

        let mut ts = [0u8; 8];
        ts.copy_from_slice(&bytes[0..8]);
        let token_len = u32::from_be_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize;
        let profile = PadProfile::from_u8(bytes[12])?;

        if token_len > Self::MAX_TOKEN_LEN {
            return Err(ProtocolError::TooLarge {
                what: "envelope token",
                size: token_len,
                max: Self::MAX_TOKEN_LEN,
            });
        }

        let rest = &bytes[Self::PREFIX_LEN..];
        if rest.len() < token_len {
            return Err(ProtocolError::Truncated {
                section: "envelope token",
                expected: token_len,
                actual: rest.len(),
            });
        }

        let header =
            Self { ts_unix_s: u64::from_be_bytes(ts), profile, token: rest[..token_len].to_vec() };
        Ok((header, &rest[token_len..]))
    }
}
