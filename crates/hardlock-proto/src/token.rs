//! Capability token payload layout and wire form.
//!
//! The payload is what gets sealed; the wire form is what gets transmitted.
//! Both are canonical: one logical token has exactly one encoding.

use crate::{
    errors::{ProtocolError, Result},
    frame::{NONCE_LEN, TAG_LEN},
};

/// Maximum scope length representable in the payload (`u16` length prefix).
pub const MAX_SCOPE_LEN: usize = u16::MAX as usize;

/// Cleartext contents of a capability token.
///
/// Layout (Big Endian): `[expiry: u64] [sender_pk: 32] [scope_len: u16]
/// [scope: scope_len]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPayload {
    /// Expiry, Unix seconds. The token is valid while `now <= expiry`.
    pub expiry_unix_s: u64,
    /// Public key of the party the capability was issued to
    pub sender_public_key: [u8; 32],
    /// Opaque scope the capability grants
    pub scope: Vec<u8>,
}

impl TokenPayload {
    const FIXED_LEN: usize = 8 + 32 + 2;

    /// Encoded size of a payload with `scope_len` scope bytes.
    #[must_use]
    pub fn encoded_len_for(scope_len: usize) -> usize {
        Self::FIXED_LEN + scope_len
    }

    /// Serialize into the canonical layout.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::TooLarge` if the scope exceeds [`MAX_SCOPE_LEN`]
    pub fn encode(&self) -> Result<Vec<u8>> {
        let scope_len = u16::try_from(self.scope.len()).map_err(|_| ProtocolError::TooLarge {
            what: "token scope",
            size: self.scope.len(),
            max: MAX_SCOPE_LEN,
        })?;

        let mut out = Vec::with_capacity(Self::encoded_len_for(self.scope.len()));
        out.extend_from_slice(&self.expiry_unix_s.to_be_bytes());
        out.extend_from_slice(&self.sender_public_key);
        out.extend_from_slice(&scope_len.to_be_bytes());
        out.extend_from_slice(&self.scope);
        Ok(out)
    }

    /// Parse the canonical layout. Trailing bytes are rejected.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::TooShort` if the fixed fields are incomplete
    /// - `ProtocolError::InvalidLength` if the scope length disagrees with
    ///   the remaining bytes
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::FIXED_LEN {
            return Err(ProtocolError::TooShort { expected: Self::FIXED_LEN, actual: bytes.len() });
        }

        let mut expiry = [0u8; 8];
        expiry.copy_from_slice(&bytes[0..8]);
        let mut sender_public_key = [0u8; 32];
        sender_public_key.copy_from_slice(&bytes[8..40]);
        let scope_len = u16::from_be_bytes([bytes[40], bytes[41]]) as usize;

        let scope = &bytes[Self::FIXED_LEN..];
        if scope.len() != scope_len {
            return Err(ProtocolError::InvalidLength {
                what: "token scope",
                expected: scope_len,
                actual: scope.len(),
            });
        }

        Ok(Self {
            expiry_unix_s: u64::from_be_bytes(expiry),
            sender_public_key,
            scope: scope.to_vec(),
        })
    }
}

/// Transmitted token: `[nonce: 24] [ciphertext: payload + 16-byte tag]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenWire {
    /// Random extended nonce
    pub nonce: [u8; NONCE_LEN],
    /// Sealed [`TokenPayload`]
    pub ciphertext: Vec<u8>,
}

impl TokenWire {
    /// Encoded size in bytes.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        NONCE_LEN + self.ciphertext.len()
    }

    /// Serialize `nonce || ciphertext`.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    /// Split a received token into nonce and ciphertext.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::TooShort` if the input cannot hold a nonce and tag
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let min = NONCE_LEN + TAG_LEN;
        if bytes.len() < min {
            return Err(ProtocolError::TooShort { expected: min, actual: bytes.len() });
        }
        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&bytes[..NONCE_LEN]);
        Ok(Self { nonce, ciphertext: bytes[NONCE_LEN..].to_vec() })
    }
}
