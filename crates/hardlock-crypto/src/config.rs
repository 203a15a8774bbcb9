//! Runtime configuration for handshakes and sessions.
//!
//! Both types deserialize with serde so hosts can load them from whatever
//! format they already use. Free functions in this crate use
//! `Default::default()`; the `*_with_config` variants take explicit values.

use hardlock_proto::{EncapsulatedSecret, MAX_ENCAPSULATION_LEN};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default HPKE info string (domain-separation context).
pub const DEFAULT_INFO: &str = "hardlock/v1.1";

/// Invalid configuration value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// `max_messages_per_chain` is zero
    #[error("max_messages_per_chain must be at least 1")]
    ZeroChainLimit,

    /// Encapsulation bound cannot hold an encoded blob
    #[error("max_encapsulation_len {configured} is below the encoded blob size {required}")]
    EncapsulationBoundTooSmall {
        /// Configured bound
        configured: usize,
        /// Encoded blob size
        required: usize,
    },

    /// Encapsulation bound exceeds the protocol maximum
    #[error("max_encapsulation_len {configured} exceeds protocol maximum {max}")]
    EncapsulationBoundTooLarge {
        /// Configured bound
        configured: usize,
        /// Protocol maximum
        max: usize,
    },

    /// Empty HPKE info string
    #[error("handshake info must not be empty")]
    EmptyInfo,
}

/// Ratchet session limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Messages each chain may carry before the session is exhausted.
    pub max_messages_per_chain: u32,

    /// Emit a warning once this many messages or fewer remain on a chain.
    pub exhaustion_warning: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { max_messages_per_chain: u32::MAX, exhaustion_warning: 1024 }
    }
}

impl SessionConfig {
    /// Check that the limits are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_messages_per_chain == 0 {
            return Err(ConfigError::ZeroChainLimit);
        }
        Ok(())
    }
}

/// Key encapsulation parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandshakeConfig {
    /// Largest encapsulation blob accepted by decapsulation.
    pub max_encapsulation_len: usize,

    /// HPKE info string. Both parties must agree on it.
    pub info: String,
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self { max_encapsulation_len: MAX_ENCAPSULATION_LEN, info: DEFAULT_INFO.to_string() }
    }
}

impl HandshakeConfig {
    /// Check bounds and context.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_encapsulation_len < EncapsulatedSecret::ENCODED_LEN {
            return Err(ConfigError::EncapsulationBoundTooSmall {
                configured: self.max_encapsulation_len,
                required: EncapsulatedSecret::ENCODED_LEN,
            });
        }
        if self.max_encapsulation_len > MAX_ENCAPSULATION_LEN {
            return Err(ConfigError::EncapsulationBoundTooLarge {
                configured: self.max_encapsulation_len,
                max: MAX_ENCAPSULATION_LEN,
            });
        }
        if self.info.is_empty() {
            return Err(ConfigError::EmptyInfo);
        }
        Ok(())
    }
}
