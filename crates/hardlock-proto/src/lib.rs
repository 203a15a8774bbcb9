//! Wire formats for the Hardlock secure-session protocol.
//!
//! Everything a Hardlock peer puts on the wire is defined here, with no
//! cryptography: the 40-byte message header, the message frame that carries
//! a ratchet `(header, nonce, ciphertext)` triple, the encapsulation blob and
//! its handshake init frame, the capability-token payload and wire form, the
//! transport envelope header, and the traffic-padding transform.
//!
//! All multi-byte integers are Big Endian. Fixed-size structures are parsed
//! with `zerocopy`, variable-size ones with explicit length checks before any
//! slice access.
//!
//! # Security
//!
//! Parsers are the first thing attacker-controlled bytes reach. Every parser
//! returns [`ProtocolError`] on malformed input and never panics; all length
//! fields are bounded before allocation.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod envelope;
pub mod errors;
pub mod frame;
pub mod handshake;
pub mod header;
pub mod padding;
pub mod token;

pub use envelope::EnvelopeHeader;
pub use errors::{ProtocolError, Result};
pub use frame::{MessageFrame, NONCE_LEN, TAG_LEN};
pub use handshake::{
    BINDER_LEN, ENC_LEN, EncapsulatedSecret, FrameType, HandshakeInit, MAX_ENCAPSULATION_LEN,
    Suite,
};
pub use header::{HEADER_LEN, MessageHeader};
pub use padding::{PadProfile, apply_padding, pad_to_vec, strip_padding};
pub use token::{MAX_SCOPE_LEN, TokenPayload, TokenWire};
