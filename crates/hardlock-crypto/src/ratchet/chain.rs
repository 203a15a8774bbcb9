//! Symmetric chain for forward-secure message key derivation
//!
//! # Security Properties
//!
//! - Forward Secrecy: the chain key is overwritten on every step
//! - Key Uniqueness: each counter value yields a distinct key and nonce
//! - Determinism: the same seed always produces the same sequence
//!
//! Derivations, all `HMAC-SHA256(chain_key, label)`:
//!
//! ```text
//! next chain key = HMAC(ck, "chain")
//! message key    = HMAC(ck, "message")
//! nonce          = HMAC(ck, "nonce")[..20] || counter (u32 BE)
//! ```

use hardlock_proto::NONCE_LEN;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::Zeroize;

use crate::error::SessionError;

type HmacSha256 = Hmac<Sha256>;

/// Label for deriving the next chain key
const CHAIN_LABEL: &[u8] = b"chain";

/// Label for deriving a message key
const MESSAGE_LABEL: &[u8] = b"message";

/// Label for deriving the nonce prefix
const NONCE_LABEL: &[u8] = b"nonce";

/// Bytes of the nonce taken from the HMAC output; the rest is the counter.
const NONCE_PREFIX_LEN: usize = NONCE_LEN - 4;

/// Key and nonce for exactly one message.
///
/// Zeroized on drop.
pub struct MessageKeys {
    key: [u8; 32],
    nonce: [u8; NONCE_LEN],
    counter: u32,
}

impl MessageKeys {
    /// 32-byte XChaCha20-Poly1305 key.
    pub fn key(&self) -> &[u8; 32] {
        &self.key
    }

    /// 24-byte nonce bound to this counter.
    pub fn nonce(&self) -> &[u8; NONCE_LEN] {
        &self.nonce
    }

    /// Chain position these keys belong to.
    pub fn counter(&self) -> u32 {
        self.counter
    }
}

impl Drop for MessageKeys {
    fn drop(&mut self) {
        self.key.zeroize();
        self.nonce.zeroize();
    }
}

/// One direction of a session.
///
/// [`peek()`](Self::peek) derives the keys for the current position without
/// moving; [`advance()`](Self::advance) steps the chain once the message has
/// been accepted. Splitting the two lets a receiver reject a message without
/// losing its place.
pub struct Chain {
    chain_key: [u8; 32],
    counter: u32,
    limit: u32,
}

impl Chain {
    /// Create a chain at counter 0 that carries at most `limit` messages.
    pub fn new(seed: &[u8; 32], limit: u32) -> Self {
        Self { chain_key: *seed, counter: 0, limit }
    }

    /// Position of the next message on this chain.
    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// Messages left before exhaustion.
    pub fn remaining(&self) -> u32 {
        self.limit.saturating_sub(self.counter)
    }

    /// Check that at least one more message fits on this chain.
    pub fn ensure_capacity(&self) -> Result<(), SessionError> {
        if self.counter >= self.limit {
            return Err(SessionError::ChainExhausted { limit: self.limit });
        }
        Ok(())
    }

    /// Derive the key and nonce for the current counter without advancing.
    pub fn peek(&self) -> Result<MessageKeys, SessionError> {
        self.ensure_capacity()?;

        let mut nonce = [0u8; NONCE_LEN];
        let mut prefix = self.mac(NONCE_LABEL);
        nonce[..NONCE_PREFIX_LEN].copy_from_slice(&prefix[..NONCE_PREFIX_LEN]);
        nonce[NONCE_PREFIX_LEN..].copy_from_slice(&self.counter.to_be_bytes());
        prefix.zeroize();

        Ok(MessageKeys { key: self.mac(MESSAGE_LABEL), nonce, counter: self.counter })
    }

    /// Step to the next chain key and counter.
    ///
    /// The old chain key is overwritten; keys for earlier counters can no
    /// longer be derived from this chain.
    pub fn advance(&mut self) -> Result<(), SessionError> {
        self.ensure_capacity()?;

        let next = self.mac(CHAIN_LABEL);
        self.chain_key.zeroize();
        self.chain_key = next;
        self.counter += 1;
        Ok(())
    }

    fn mac(&self, label: &[u8]) -> [u8; 32] {
        let Ok(mut mac) = HmacSha256::new_from_slice(&self.chain_key) else {
            unreachable!("HMAC-SHA256 accepts any key size");
        };
        mac.update(label);
        let result = mac.finalize().into_bytes();

        let mut out = [0u8; 32];
        out.copy_from_slice(&result);
        out
    }

    #[cfg(test)]
    pub(crate) fn chain_key(&self) -> &[u8; 32] {
        &self.chain_key
    }
}

impl Drop for Chain {
    fn drop(&mut self) {
        self.chain_key.zeroize();
        self.counter.zeroize();
        self.limit.zeroize();
    }
}
