//! Property-based tests for the message ratchet
//!
//! These tests verify the fundamental invariants of a session:
//!
//! 1. **Round-trip**: the responder recovers every initiator message in order
//! 2. **Strict ordering**: replays and reordered messages are rejected and do
//!    not move the receive counter
//! 3. **Nonce uniqueness**: no two messages on a session share a nonce
//! 4. **Forward secrecy**: keys never repeat and later keys give no handle on
//!    earlier ones

use std::collections::HashSet;

use hardlock_crypto::{
    KeyPair, Okm, Role, Session, SessionConfig, SessionError,
    ratchet::Chain,
};
use proptest::prelude::*;

fn sessions(okm: [u8; 32], a: u8, b: u8) -> (Session, Session) {
    let alice = KeyPair::from_private_bytes([a; 32]);
    let bob = KeyPair::from_private_bytes([b; 32]);
    let initiator = Session::new_initiator(Okm::from_bytes(okm), &alice, &bob.public()).unwrap();
    let responder = Session::new_responder(Okm::from_bytes(okm), &bob, &alice.public()).unwrap();
    (initiator, responder)
}

fn messages() -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(prop::collection::vec(any::<u8>(), 0..256), 1..20)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_in_order_roundtrip(
        okm in any::<[u8; 32]>(),
        ad in prop::collection::vec(any::<u8>(), 0..64),
        plaintexts in messages(),
    ) {
        let (mut alice, mut bob) = sessions(okm, 1, 2);

        for (i, plaintext) in plaintexts.iter().enumerate() {
            let frame = alice.encrypt(&ad, plaintext).unwrap();
            prop_assert_eq!(frame.header.counter() as usize, i);
            prop_assert_eq!(&bob.decrypt_frame(&ad, &frame).unwrap(), plaintext);
        }

        prop_assert_eq!(alice.send_counter() as usize, plaintexts.len());
        prop_assert_eq!(bob.recv_counter() as usize, plaintexts.len());
    }

    #[test]
    fn prop_interleaved_directions_roundtrip(
        okm in any::<[u8; 32]>(),
        turns in prop::collection::vec((any::<bool>(), prop::collection::vec(any::<u8>(), 0..64)), 1..30),
    ) {
        let (mut alice, mut bob) = sessions(okm, 3, 4);

        for (from_alice, plaintext) in turns {
            let (sender, receiver) = if from_alice { (&mut alice, &mut bob) } else { (&mut bob, &mut alice) };
            let frame = sender.encrypt(b"turn", &plaintext).unwrap();
            prop_assert_eq!(receiver.decrypt_frame(b"turn", &frame).unwrap(), plaintext);
        }
    }

    #[test]
    fn prop_replay_always_rejected(
        okm in any::<[u8; 32]>(),
        plaintexts in messages(),
        pick in any::<prop::sample::Index>(),
    ) {
        let (mut alice, mut bob) = sessions(okm, 1, 2);

        let frames: Vec<_> = plaintexts.iter().map(|p| alice.encrypt(b"", p).unwrap()).collect();
        for frame in &frames {
            bob.decrypt_frame(b"", frame).unwrap();
        }

        let replayed = &frames[pick.index(frames.len())];
        let counter = bob.recv_counter();
        prop_assert_eq!(bob.decrypt_frame(b"", replayed), Err(SessionError::Rejected));
        prop_assert_eq!(bob.recv_counter(), counter);
    }

    #[test]
    fn prop_out_of_order_rejected(
        okm in any::<[u8; 32]>(),
        count in 2usize..16,
        skip_to in any::<prop::sample::Index>(),
    ) {
        let (mut alice, mut bob) = sessions(okm, 1, 2);

        let frames: Vec<_> = (0..count).map(|i| alice.encrypt(b"", &[i as u8]).unwrap()).collect();
        let ahead = 1 + skip_to.index(count - 1);

        prop_assert_eq!(bob.decrypt_frame(b"", &frames[ahead]), Err(SessionError::Rejected));
        prop_assert_eq!(bob.recv_counter(), 0);

        // The session is still usable from where it was
        for (i, frame) in frames.iter().enumerate() {
            prop_assert_eq!(bob.decrypt_frame(b"", frame).unwrap(), vec![i as u8]);
        }
    }

    #[test]
    fn prop_nonces_unique_across_session(
        okm in any::<[u8; 32]>(),
        count in 1usize..200,
    ) {
        let (mut alice, mut bob) = sessions(okm, 1, 2);
        let mut seen = HashSet::new();

        for _ in 0..count {
            prop_assert!(seen.insert(alice.encrypt(b"", b"m").unwrap().nonce));
            prop_assert!(seen.insert(bob.encrypt(b"", b"m").unwrap().nonce));
        }
    }

    #[test]
    fn prop_ciphertext_bitflip_rejected(
        okm in any::<[u8; 32]>(),
        plaintext in prop::collection::vec(any::<u8>(), 0..128),
        position in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let (mut alice, mut bob) = sessions(okm, 1, 2);
        let mut frame = alice.encrypt(b"", &plaintext).unwrap();

        let i = position.index(frame.ciphertext.len());
        frame.ciphertext[i] ^= 1 << bit;

        prop_assert_eq!(bob.decrypt_frame(b"", &frame), Err(SessionError::Rejected));
        prop_assert_eq!(bob.recv_counter(), 0);
    }

    #[test]
    fn prop_chain_keys_never_repeat(
        seed in any::<[u8; 32]>(),
        steps in 2u32..200,
    ) {
        let mut chain = Chain::new(&seed, u32::MAX);
        let mut keys = HashSet::new();

        for _ in 0..steps {
            let mk = chain.peek().unwrap();
            prop_assert!(keys.insert(*mk.key()));
            chain.advance().unwrap();
        }
    }

    #[test]
    fn prop_later_keys_do_not_regenerate_earlier_ones(
        seed in any::<[u8; 32]>(),
        steps in 1u32..50,
    ) {
        let mut chain = Chain::new(&seed, u32::MAX);
        let first = *chain.peek().unwrap().key();
        for _ in 0..steps {
            chain.advance().unwrap();
        }
        let later = *chain.peek().unwrap().key();

        // Treating a later message key as a chain seed walks a different
        // sequence; it never reaches back to the first key.
        let mut from_later = Chain::new(&later, u32::MAX);
        for _ in 0..=steps {
            prop_assert_ne!(*from_later.peek().unwrap().key(), first);
            from_later.advance().unwrap();
        }
    }

    #[test]
    fn prop_seed_bit_changes_every_key(
        seed in any::<[u8; 32]>(),
        byte in 0usize..32,
        bit in 0u8..8,
    ) {
        let mut flipped = seed;
        flipped[byte] ^= 1 << bit;

        let mut a = Chain::new(&seed, u32::MAX);
        let mut b = Chain::new(&flipped, u32::MAX);
        for _ in 0..8 {
            prop_assert_ne!(*a.peek().unwrap().key(), *b.peek().unwrap().key());
            a.advance().unwrap();
            b.advance().unwrap();
        }
    }
}

#[test]
fn exhaustion_is_reported_on_both_sides() {
    let alice = KeyPair::from_private_bytes([1; 32]);
    let bob = KeyPair::from_private_bytes([2; 32]);
    let config = SessionConfig { max_messages_per_chain: 3, exhaustion_warning: 1 };

    let mut initiator = Session::with_config(
        Role::Initiator,
        Okm::from_bytes([9; 32]),
        &alice,
        &bob.public(),
        config.clone(),
    )
    .unwrap();
    let mut responder =
        Session::with_config(Role::Responder, Okm::from_bytes([9; 32]), &bob, &alice.public(), config)
            .unwrap();

    for _ in 0..3 {
        let frame = initiator.encrypt(b"", b"x").unwrap();
        responder.decrypt_frame(b"", &frame).unwrap();
    }

    assert!(matches!(initiator.encrypt(b"", b"x"), Err(SessionError::ChainExhausted { limit: 3 })));

    // A forged fourth message hits the exhausted receive chain before any
    // authentication work is done.
    let header = hardlock_crypto::MessageHeader::new(alice.public(), 3, 1);
    assert!(matches!(
        responder.decrypt(b"", header.as_bytes(), &[0u8; 24], &[0u8; 17]),
        Err(SessionError::ChainExhausted { limit: 3 })
    ));
}
