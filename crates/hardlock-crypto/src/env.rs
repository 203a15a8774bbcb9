//! Environment abstraction for deterministic testing.
//!
//! Decouples protocol logic from system resources (entropy, wall-clock time).
//! Production code uses [`SystemEnv`]; tests substitute seeded
//! implementations so that key generation, encapsulation and token nonces
//! are reproducible.

use crate::error::EntropyError;

/// Source of randomness and wall-clock time.
///
/// # Safety
///
/// Implementations MUST guarantee:
///
/// - `random_bytes()` uses cryptographically secure entropy in production
/// - `random_bytes()` either fills the whole buffer or returns an error; it
///   never returns `Ok` with a partially filled buffer
pub trait Environment {
    /// Fills the provided buffer with random bytes.
    ///
    /// # Errors
    ///
    /// - `EntropyError` if the entropy source is unavailable. Callers treat
    ///   this as fatal for the current operation.
    fn random_bytes(&self, buffer: &mut [u8]) -> Result<(), EntropyError>;

    /// Current wall-clock time in Unix seconds.
    fn wall_clock_secs(&self) -> u64;

    /// Draw a 32-byte seed.
    fn random_seed(&self) -> Result<[u8; 32], EntropyError> {
        let mut seed = [0u8; 32];
        self.random_bytes(&mut seed)?;
        Ok(seed)
    }
}

/// Production environment using OS entropy and system time.
///
/// # Security
///
/// Entropy comes from getrandom (e.g. `getrandom(2)` on Linux,
/// `BCryptGenRandom` on Windows). Failure is surfaced as an error rather
/// than a panic; the protocol never continues with a partially random
/// buffer.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    fn random_bytes(&self, buffer: &mut [u8]) -> Result<(), EntropyError> {
        getrandom::fill(buffer).map_err(|e| EntropyError { code: e.raw_os_error() })
    }

    #[allow(clippy::disallowed_methods)]
    fn wall_clock_secs(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_secs())
    }
}

impl<E: Environment + ?Sized> Environment for &E {
    fn random_bytes(&self, buffer: &mut [u8]) -> Result<(), EntropyError> {
        (**self).random_bytes(buffer)
    }

    fn wall_clock_secs(&self) -> u64 {
        (**self).wall_clock_secs()
    }
}
