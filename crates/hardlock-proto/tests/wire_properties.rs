//! Property-based tests for Hardlock wire formats
//!
//! Verifies that parsers agree with encoders for all inputs, that padding
//! always lands on the ladder, and that parsers never panic on garbage.

use hardlock_proto::{
    EncapsulatedSecret, MessageFrame, MessageHeader, NONCE_LEN, PadProfile, TokenPayload,
    TokenWire, apply_padding,
};
use proptest::prelude::*;

fn arbitrary_profile() -> impl Strategy<Value = PadProfile> {
    prop_oneof![Just(PadProfile::Stealth), Just(PadProfile::Balanced), Just(PadProfile::Throughput)]
}

fn arbitrary_frame() -> impl Strategy<Value = MessageFrame> {
    (
        any::<[u8; 32]>(),
        any::<u32>(),
        any::<u32>(),
        any::<[u8; NONCE_LEN]>(),
        prop::collection::vec(any::<u8>(), 16..512),
    )
        .prop_map(|(sender_id, counter, body_len, nonce, ciphertext)| {
            MessageFrame::new(MessageHeader::new(sender_id, counter, body_len), nonce, ciphertext)
        })
}

proptest! {
    #[test]
    fn prop_frame_roundtrip(frame in arbitrary_frame()) {
        let mut buf = Vec::new();
        frame.encode(&mut buf).unwrap();

        let decoded = MessageFrame::decode(&buf).unwrap();
        prop_assert_eq!(decoded, frame);
    }

    #[test]
    fn prop_padded_frame_still_decodes(frame in arbitrary_frame(), profile in arbitrary_profile()) {
        let mut encoded = Vec::new();
        frame.encode(&mut encoded).unwrap();

        let mut padded = vec![0u8; 64 * 1024];
        let written = apply_padding(&encoded, profile, &mut padded).unwrap();

        let decoded = MessageFrame::decode(&padded[..written]).unwrap();
        prop_assert_eq!(decoded, frame);
    }

    #[test]
    fn prop_padding_lands_on_ladder(len in 0usize..70_000, profile in arbitrary_profile()) {
        let frame = vec![0xA5u8; len];
        let target = profile.padded_len(len).unwrap();
        let mut out = vec![0u8; target];

        let written = apply_padding(&frame, profile, &mut out).unwrap();

        // PROPERTY: never shrinks, always a ladder value, deterministic
        prop_assert!(written >= len);
        prop_assert!(profile.is_ladder_size(written));
        prop_assert_eq!(written, profile.padded_len(len).unwrap());
    }

    #[test]
    fn prop_padding_picks_smallest_rung(len in 1usize..20_000, profile in arbitrary_profile()) {
        let target = profile.padded_len(len).unwrap();
        // No smaller ladder value can hold the frame
        for smaller in len..target {
            prop_assert!(!profile.is_ladder_size(smaller), "{} is a smaller rung", smaller);
        }
    }

    #[test]
    fn prop_token_payload_roundtrip(
        expiry in any::<u64>(),
        pk in any::<[u8; 32]>(),
        scope in prop::collection::vec(any::<u8>(), 0..300),
    ) {
        let payload = TokenPayload { expiry_unix_s: expiry, sender_public_key: pk, scope };
        let bytes = payload.encode().unwrap();
        prop_assert_eq!(TokenPayload::decode(&bytes).unwrap(), payload);
    }

    #[test]
    fn prop_parsers_never_panic(data in prop::collection::vec(any::<u8>(), 0..2048)) {
        let _ = MessageFrame::decode(&data);
        let _ = MessageHeader::from_bytes(&data);
        let _ = EncapsulatedSecret::from_bytes(&data);
        let _ = TokenPayload::decode(&data);
        let _ = TokenWire::from_bytes(&data);
        let _ = hardlock_proto::HandshakeInit::decode(&data);
        let _ = hardlock_proto::EnvelopeHeader::decode(&data);
    }
}
