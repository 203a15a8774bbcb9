//! Fuzz target for capability token verification
//!
//! # Invariants
//!
//! - Verification never panics on arbitrary nonce, ciphertext or clock
//! - Every failure is the undifferentiated `Rejected`
//! - A mutated valid token is always rejected

#![no_main]

use arbitrary::Arbitrary;
use hardlock_crypto::{
    EntropyError, Environment, TokenError,
    token::{build, verify},
};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Clone, Arbitrary)]
struct Scenario {
    key: [u8; 32],
    nonce: [u8; 24],
    expiry: u64,
    now: u64,
    scope: Vec<u8>,
    flip: Option<(u16, u8)>,
}

struct FixedEnv([u8; 24]);

impl Environment for FixedEnv {
    fn random_bytes(&self, buffer: &mut [u8]) -> Result<(), EntropyError> {
        for (out, byte) in buffer.iter_mut().zip(self.0.iter().cycle()) {
            *out = *byte;
        }
        Ok(())
    }

    fn wall_clock_secs(&self) -> u64 {
        0
    }
}

fuzz_target!(|scenario: Scenario| {
    let Ok(token) =
        build(&FixedEnv(scenario.nonce), &scenario.key, scenario.expiry, &[7; 32], &scenario.scope)
    else {
        return;
    };

    let mut ciphertext = token.ciphertext.clone();
    let mutated = match scenario.flip {
        Some((position, mask)) if mask != 0 => {
            let index = position as usize % ciphertext.len();
            ciphertext[index] ^= mask;
            true
        },
        _ => false,
    };

    match verify(&scenario.key, &token.nonce, &ciphertext, scenario.now) {
        Ok(payload) => {
            assert!(!mutated, "mutated token must not verify");
            assert!(scenario.now <= scenario.expiry);
            assert_eq!(payload.scope, scenario.scope);
        },
        Err(err) => {
            assert_eq!(err, TokenError::Rejected);
            assert!(mutated || scenario.now > scenario.expiry);
        },
    }
});
