//! Message frame combining header, nonce and ciphertext.
//!
//! The ratchet produces a `(header, nonce, ciphertext)` triple per message.
//! `MessageFrame` packs that triple into one self-delimiting byte string so a
//! transport can carry it (optionally padded) without any side channel for
//! lengths.

use bytes::BufMut;

use crate::{
    MessageHeader,
    errors::{ProtocolError, Result},
};

/// Length of the extended AEAD nonce carried in every frame.
pub const NONCE_LEN: usize = 24;

/// Poly1305 authentication tag length.
pub const TAG_LEN: usize = 16;

/// Complete ratchet message (transport layer)
///
/// Layout on the wire (Big Endian):
/// `[version: u16] [header: 40] [nonce: 24] [ct_len: u32] [ciphertext: ct_len]`
///
/// # Invariants
///
/// - `ciphertext.len()` fits in `u32` and is at least [`TAG_LEN`]. Enforced by
///   [`MessageFrame::encode`] and verified by [`MessageFrame::decode`].
///
/// Bytes after the ciphertext are ignored by [`MessageFrame::decode`]; this is
/// where traffic padding lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageFrame {
    /// Authenticated cleartext header
    pub header: MessageHeader,
    /// Extended nonce used for this message
    pub nonce: [u8; NONCE_LEN],
    /// Ciphertext including the 16-byte tag
    pub ciphertext: Vec<u8>,
}

impl MessageFrame {
    /// Current frame format version
    pub const VERSION: u16 = 0x0110;

    /// Bytes preceding the ciphertext
    pub const PREFIX_LEN: usize = 2 + MessageHeader::SIZE + NONCE_LEN + 4;

    /// Create a frame from a ratchet output triple.
    #[must_use]
    pub fn new(header: MessageHeader, nonce: [u8; NONCE_LEN], ciphertext: Vec<u8>) -> Self {
        Self { header, nonce, ciphertext }
    }

    /// Total encoded size in bytes.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        Self::PREFIX_LEN + self.ciphertext.len()
    }

    /// Encode frame into buffer.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::TooLarge` if the ciphertext length does not fit in
    ///   the 32-bit length field
    /// - `ProtocolError::TooShort` if the ciphertext cannot contain a tag
    pub fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        let ct_len = self.checked_ct_len()?;

        dst.put_u16(Self::VERSION);
        dst.put_slice(self.header.as_bytes());
        dst.put_slice(&self.nonce);
        dst.put_u32(ct_len);
        dst.put_slice(&self.ciphertext);

        Ok(())
    }

    /// Encode into a caller-provided buffer, returning bytes written.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::BufferTooSmall` if `out` cannot hold the frame.
    ///   Nothing is written in that case.
    pub fn encode_into(&self, out: &mut [u8]) -> Result<usize> {
        let required = self.encoded_len();
        if out.len() < required {
            return Err(ProtocolError::BufferTooSmall { required, available: out.len() });
        }

        let mut cursor = &mut out[..required];
        self.encode(&mut cursor)?;
        Ok(required)
    }

    /// Decode frame from wire format.
    ///
    /// Trailing bytes after the declared ciphertext are ignored.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::TooShort` if the fixed prefix is incomplete
    /// - `ProtocolError::UnsupportedVersion` for an unknown version
    /// - `ProtocolError::Truncated` if fewer ciphertext bytes are present than
    ///   declared
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::PREFIX_LEN {
            return Err(ProtocolError::TooShort { expected: Self::PREFIX_LEN, actual: bytes.len() });
        }

        let version = u16::from_be_bytes([bytes[0], bytes[1]]);
        if version != Self::VERSION {
            return Err(ProtocolError::UnsupportedVersion(version));
        }

        let (header, rest) = MessageHeader::from_prefix(&bytes[2..])?;

        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&rest[..NONCE_LEN]);

        let mut len_bytes = [0u8; 4];
        len_bytes.copy_from_slice(&rest[NONCE_LEN..NONCE_LEN + 4]);
        let ct_len = u32::from_be_bytes(len_bytes) as usize;

        let body = &rest[NONCE_LEN + 4..];
        if body.len() < ct_len {
            return Err(ProtocolError::Truncated {
                section: "ciphertext",
                expected: ct_len,
                actual: body.len(),
            });
        }
        if ct_len < TAG_LEN {
            return Err(ProtocolError::TooShort { expected: TAG_LEN, actual: ct_len });
        }

        Ok(Self { header: *header, nonce, ciphertext: body[..ct_len].to_vec() })
    }

    fn checked_ct_len(&self) -> Result<u32> {
        if self.ciphertext.len() < TAG_LEN {
            return Err(ProtocolError::TooShort { expected: TAG_LEN, actual: self.ciphertext.len() });
        }
        u32::try_from(self.ciphertext.len()).map_err(|_| ProtocolError::TooLarge {
            what: "ciphertext",
            size: self.ciphertext.len(),
            max: u32::MAX as usize,
        })
    }
}
