//! X25519 key pairs and the handshake output secret.

use rand_chacha::ChaCha20Rng;
use rand_core::SeedableRng;
use subtle::ConstantTimeEq;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroize;

use crate::{env::Environment, error::EntropyError};

/// Length of X25519 private and public keys.
pub const KEY_LEN: usize = 32;

/// Length of the handshake output secret.
pub const OKM_LEN: usize = 32;

/// Static X25519 key pair.
///
/// The private scalar lives in a [`StaticSecret`], which is zeroized when
/// the pair is dropped. It is never serialized by this crate.
pub struct KeyPair {
    secret: StaticSecret,
    public: PublicKey,
}

impl KeyPair {
    /// Generate a key pair from the environment's entropy source.
    ///
    /// # Errors
    ///
    /// - `EntropyError` if the entropy source fails. No key is produced.
    pub fn generate(env: &impl Environment) -> Result<Self, EntropyError> {
        let mut seed = env.random_seed()?;
        let mut rng = ChaCha20Rng::from_seed(seed);
        seed.zeroize();

        let secret = StaticSecret::random_from_rng(&mut rng);
        let public = PublicKey::from(&secret);
        Ok(Self { secret, public })
    }

    /// Rebuild a key pair from raw private key bytes.
    ///
    /// The scalar is clamped per RFC 7748, so any 32 bytes are accepted.
    pub fn from_private_bytes(mut bytes: [u8; KEY_LEN]) -> Self {
        let secret = StaticSecret::from(bytes);
        bytes.zeroize();
        let public = PublicKey::from(&secret);
        Self { secret, public }
    }

    /// Public key bytes.
    pub fn public(&self) -> [u8; KEY_LEN] {
        self.public.to_bytes()
    }

    pub(crate) fn secret(&self) -> &StaticSecret {
        &self.secret
    }

    /// Private key bytes. Callers own zeroizing the returned copy.
    pub(crate) fn private_bytes(&self) -> [u8; KEY_LEN] {
        self.secret.to_bytes()
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair").field("public", &self.public.as_bytes()).finish_non_exhaustive()
    }
}

/// Generate an X25519 key pair. Fails only if entropy is unavailable.
pub fn keygen(env: &impl Environment) -> Result<KeyPair, EntropyError> {
    KeyPair::generate(env)
}

/// Output keying material shared by both parties after a handshake.
///
/// Consumed by value when a session is created and zeroized on drop.
/// Equality is constant time.
pub struct Okm([u8; OKM_LEN]);

impl Okm {
    /// Wrap raw secret bytes.
    pub fn from_bytes(bytes: [u8; OKM_LEN]) -> Self {
        Self(bytes)
    }

    /// Secret bytes.
    pub fn as_bytes(&self) -> &[u8; OKM_LEN] {
        &self.0
    }
}

impl PartialEq for Okm {
    fn eq(&self, other: &Self) -> bool {
        self.0[..].ct_eq(&other.0[..]).into()
    }
}

impl Eq for Okm {}

impl std::fmt::Debug for Okm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Okm(<redacted>)")
    }
}

impl Drop for Okm {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}
