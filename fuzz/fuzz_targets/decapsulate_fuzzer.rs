//! Fuzz target for decapsulation
//!
//! # Strategy
//!
//! - Raw bytes: arbitrary blobs against a fixed recipient
//! - Mutations: a valid blob with one byte replaced
//!
//! # Invariants
//!
//! - Decapsulation never panics
//! - A mutated blob never yields the encapsulated OKM
//! - The untouched blob always yields the encapsulated OKM

#![no_main]

use arbitrary::Arbitrary;
use hardlock_crypto::{HandshakeError, KeyPair, decapsulate, encapsulate_deterministic};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Clone, Arbitrary)]
enum Input {
    Raw(Vec<u8>),
    Mutated { seed: [u8; 32], position: u8, value: u8 },
}

fuzz_target!(|input: Input| {
    let recipient = KeyPair::from_private_bytes([0x42; 32]);

    match input {
        Input::Raw(bytes) => {
            let _ = decapsulate(&recipient, &bytes);
        },
        Input::Mutated { seed, position, value } => {
            let Ok((secret, okm)) = encapsulate_deterministic(&recipient.public(), seed) else {
                return;
            };
            let mut blob = secret.to_bytes();
            assert_eq!(decapsulate(&recipient, &blob).unwrap(), okm);

            let index = position as usize % blob.len();
            if blob[index] == value {
                return;
            }
            blob[index] = value;

            match decapsulate(&recipient, &blob) {
                Ok(other) => assert_ne!(other, okm, "mutated blob must not reproduce the OKM"),
                Err(HandshakeError::Rejected | HandshakeError::Malformed(_)) => {},
                Err(HandshakeError::SuiteMismatch { .. }) => {},
                Err(other) => panic!("unexpected error: {other}"),
            }
        },
    }
});
