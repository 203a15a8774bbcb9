//! Fuzz target for every wire parser
//!
//! Feeds the same arbitrary bytes to each decoder that sees attacker-
//! controlled input. The fuzzer should NEVER panic. All invalid inputs
//! should return an error, and anything that parses must re-encode to the
//! bytes it was parsed from.

#![no_main]

use hardlock_proto::{
    EncapsulatedSecret, EnvelopeHeader, HandshakeInit, MessageFrame, MessageHeader, PadProfile,
    TokenPayload, TokenWire, strip_padding,
};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(header) = MessageHeader::from_bytes(data) {
        assert_eq!(header.as_bytes(), data, "header must be a view of its input");
    }

    if let Ok(frame) = MessageFrame::decode(data) {
        let mut encoded = Vec::new();
        frame.encode(&mut encoded).unwrap();
        assert_eq!(&data[..encoded.len()], encoded.as_slice(), "frame prefix must re-encode");
        assert_eq!(strip_padding(data, frame.encoded_len()).unwrap(), encoded.as_slice());
    }

    if let Ok(secret) = EncapsulatedSecret::from_bytes(data) {
        assert_eq!(&secret.to_bytes()[..], data);
    }

    if let Ok((init, consumed)) = HandshakeInit::decode(data) {
        let mut encoded = Vec::new();
        init.encode(&mut encoded).unwrap();
        assert_eq!(&data[..consumed], encoded.as_slice());
    }

    if let Ok((envelope, _rest)) = EnvelopeHeader::decode(data) {
        let mut encoded = Vec::new();
        envelope.encode(&mut encoded).unwrap();
        assert_eq!(&data[..encoded.len()], encoded.as_slice());
    }

    if let Ok(payload) = TokenPayload::decode(data) {
        assert_eq!(payload.encode().unwrap(), data);
    }

    if let Ok(wire) = TokenWire::from_bytes(data) {
        assert_eq!(wire.to_bytes(), data);
    }

    if let Some(&code) = data.first() {
        if let Ok(profile) = PadProfile::from_u8(code) {
            let padded_len = profile.padded_len(data.len()).unwrap();
            assert!(padded_len >= data.len());
            assert!(profile.is_ladder_size(padded_len));
        }
    }
});
