//! Hardlock Cryptographic Protocol
//!
//! Key agreement, the message ratchet and capability tokens for Hardlock.
//! Wire layouts live in `hardlock-proto`; this crate supplies the secrets
//! that flow through them. Randomness and wall-clock time come from an
//! [`Environment`] so that every operation is reproducible under test.
//!
//! # Key Lifecycle
//!
//! ```text
//! X25519 static keys (A, B)
//!        │
//!        ▼
//! HPKE encapsulate / decapsulate → OKM (32 bytes, consumed once)
//!        │
//!        ▼
//! HKDF(salt = OKM, ikm = X25519(A, B)) → i2r / r2i chain seeds
//!        │
//!        ▼
//! HMAC chain step → per-message key + nonce
//!        │
//!        ▼
//! XChaCha20-Poly1305(header || associated data) → ciphertext
//! ```
//!
//! # Security
//!
//! Forward Secrecy:
//! - Chain keys are overwritten on every step; earlier message keys cannot
//!   be recomputed from later state
//! - OKM, chain keys and message keys are zeroized when dropped
//!
//! Nonce Uniqueness:
//! - Nonces are derived, never random: HMAC prefix plus the chain counter
//! - Initiator and responder send on different chains
//!
//! Oracle Resistance:
//! - Every authentication, counter, expiry or binder failure returns one
//!   `Rejected` variant per layer; the cause only reaches `tracing`
//!
//! # Status Codes
//!
//! [`Status`] maps every error to a stable negative integer for hosts that
//! need a length-or-error convention. See [`error`] for the table.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod env;
pub mod error;
pub mod handshake;
pub mod keys;
pub mod ratchet;
pub mod token;

pub use config::{ConfigError, HandshakeConfig, SessionConfig};
pub use env::{Environment, SystemEnv};
pub use error::{
    EntropyError, Error, HandshakeError, SessionError, Status, TokenError, status_of,
};
pub use handshake::{
    decapsulate, decapsulate_auth, decapsulate_auth_with_config, decapsulate_with_config,
    encapsulate, encapsulate_auth, encapsulate_auth_with_config, encapsulate_deterministic,
    encapsulate_into, encapsulate_into_with_config, encapsulate_with_config,
};
pub use hardlock_proto::{
    EncapsulatedSecret, HEADER_LEN, MAX_ENCAPSULATION_LEN, MessageFrame, MessageHeader, NONCE_LEN,
    PadProfile, TAG_LEN, apply_padding,
};
pub use keys::{KeyPair, Okm, keygen};
pub use ratchet::{Role, Session};

/// Encoded message header length, for sizing buffers.
pub const fn header_len() -> usize {
    HEADER_LEN
}

/// Message nonce length, for sizing buffers.
pub const fn nonce_len() -> usize {
    NONCE_LEN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_sizing_accessors() {
        assert_eq!(header_len(), 40);
        assert_eq!(nonce_len(), 24);
        assert_eq!(TAG_LEN, 16);
        assert_eq!(MAX_ENCAPSULATION_LEN, 1024);
    }
}
