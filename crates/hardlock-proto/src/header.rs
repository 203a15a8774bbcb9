//! Message header with zero-copy parsing.
//!
//! The `MessageHeader` is a fixed 40-byte structure serialized as raw binary
//! (Big Endian). It travels in the clear next to every ratchet ciphertext and
//! is authenticated as the prefix of the AEAD associated data, so it can be
//! inspected before decryption but never altered without detection.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::errors::{ProtocolError, Result};

/// Size of a serialized [`MessageHeader`].
pub const HEADER_LEN: usize = 32 + 4 + 4;

/// Fixed 40-byte message header (Big Endian network byte order)
///
/// ```text
/// 0               32          36          40
/// +---------------+-----------+-----------+
/// |   sender_id   |  counter  | body_len  |
/// +---------------+-----------+-----------+
/// ```
///
/// - `sender_id`: the sender's static X25519 public key. Binds the message to
///   one direction of one session.
/// - `counter`: position of the message in the sender's chain, starting at 0.
/// - `body_len`: plaintext length in bytes. The receiver checks it against
///   the ciphertext length before attempting decryption.
///
/// # Security
///
/// Every 40-byte pattern is a structurally valid header, so casting untrusted
/// bytes is always safe. Nothing here is authenticated on its own; the
/// ratchet session rejects the message if any field disagrees with its state
/// or if the AEAD tag over `header || associated_data` fails.
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq, Debug, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct MessageHeader {
    sender_id: [u8; 32],
    counter: [u8; 4],
    body_len: [u8; 4],
}

impl MessageHeader {
    /// Size of the serialized header (40 bytes)
    pub const SIZE: usize = HEADER_LEN;

    /// Build a header from its logical fields.
    #[must_use]
    pub fn new(sender_id: [u8; 32], counter: u32, body_len: u32) -> Self {
        Self { sender_id, counter: counter.to_be_bytes(), body_len: body_len.to_be_bytes() }
    }

    /// Parse a header from exactly [`HEADER_LEN`] bytes (zero-copy).
    ///
    /// # Errors
    ///
    /// - `ProtocolError::InvalidLength` if `bytes` is not exactly 40 bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<&Self> {
        Self::ref_from_bytes(bytes).map_err(|_| ProtocolError::InvalidLength {
            what: "message header",
            expected: Self::SIZE,
            actual: bytes.len(),
        })
    }

    /// Parse a header from the front of `bytes`, returning the remainder.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::TooShort` if fewer than 40 bytes are available
    pub fn from_prefix(bytes: &[u8]) -> Result<(&Self, &[u8])> {
        Self::ref_from_prefix(bytes)
            .map_err(|_| ProtocolError::TooShort { expected: Self::SIZE, actual: bytes.len() })
    }

    /// Serialize header to bytes (zero-copy)
    #[must_use]
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut arr = [0u8; Self::SIZE];
        arr.copy_from_slice(IntoBytes::as_bytes(self));
        arr
    }

    /// Borrow the serialized form without copying.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        IntoBytes::as_bytes(self)
    }

    /// Sender's static public key.
    #[must_use]
    pub fn sender_id(&self) -> &[u8; 32] {
        &self.sender_id
    }

    /// Chain position of this message.
    #[must_use]
    pub fn counter(&self) -> u32 {
        u32::from_be_bytes(self.counter)
    }

    /// Declared plaintext length.
    #[must_use]
    pub fn body_len(&self) -> u32 {
        u32::from_be_bytes(self.body_len)
    }
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;

    use super::*;

    #[test]
    fn header_is_40_bytes() {
        assert_eq!(std::mem::size_of::<MessageHeader>(), HEADER_LEN);
        assert_eq!(HEADER_LEN, 40);
    }

    #[test]
    fn fields_are_big_endian() {
        let header = MessageHeader::new([0xAA; 32], 0x0102_0304, 0x0A0B_0C0D);
        let bytes = header.to_bytes();

        assert_eq!(&bytes[0..32], &[0xAA; 32]);
        assert_eq!(&bytes[32..40], &hex!("01020304 0A0B0C0D"));
    }

    #[test]
    fn parse_roundtrip() {
        let header = MessageHeader::new([7; 32], 42, 9);
        let bytes = header.to_bytes();
        let parsed = MessageHeader::from_bytes(&bytes).unwrap();

        assert_eq!(*parsed, header);
        assert_eq!(parsed.sender_id(), &[7; 32]);
        assert_eq!(parsed.counter(), 42);
        assert_eq!(parsed.body_len(), 9);
    }

    #[test]
    fn rejects_wrong_length() {
        let result = MessageHeader::from_bytes(&[0u8; 39]);
        assert_eq!(
            result,
            Err(ProtocolError::InvalidLength { what: "message header", expected: 40, actual: 39 })
        );

        assert!(MessageHeader::from_bytes(&[0u8; 41]).is_err());
    }

    #[test]
    fn prefix_parse_returns_remainder() {
        let mut bytes = MessageHeader::new([1; 32], 3, 4).to_bytes().to_vec();
        bytes.extend_from_slice(b"rest");

        let (header, rest) = MessageHeader::from_prefix(&bytes).unwrap();
        assert_eq!(header.counter(), 3);
        assert_eq!(rest, b"rest");
    }
}
