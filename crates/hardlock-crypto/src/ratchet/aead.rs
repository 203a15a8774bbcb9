//! Message sealing with `XChaCha20-Poly1305`
//!
//! Pure functions over caller-provided buffers. Keys and nonces come from
//! [`MessageKeys`]; nothing here draws randomness.

use chacha20poly1305::{
    Tag, XChaCha20Poly1305, XNonce,
    aead::{AeadInPlace, KeyInit},
};
use hardlock_proto::TAG_LEN;
use zeroize::Zeroize;

use super::chain::MessageKeys;
use crate::error::SessionError;

/// Encrypt `plaintext` into `out`, tag appended.
///
/// Returns the number of bytes written (`plaintext.len() + TAG_LEN`).
/// The caller has already checked that `out` is large enough.
pub fn seal_into(keys: &MessageKeys, aad: &[u8], plaintext: &[u8], out: &mut [u8]) -> usize {
    let body_len = plaintext.len();
    let (body, rest) = out.split_at_mut(body_len);
    body.copy_from_slice(plaintext);

    let cipher = XChaCha20Poly1305::new(keys.key().into());
    let Ok(tag) = cipher.encrypt_in_place_detached(XNonce::from_slice(keys.nonce()), aad, body)
    else {
        unreachable!("XChaCha20-Poly1305 encryption cannot fail with valid inputs");
    };

    rest[..TAG_LEN].copy_from_slice(&tag);
    body_len + TAG_LEN
}

/// Authenticate and decrypt `ciphertext` (body || tag) into `out`.
///
/// Returns the plaintext length. On failure `out` is zeroed over the range
/// that was used, so no unauthenticated plaintext is left behind.
///
/// # Errors
///
/// - `Rejected` if the ciphertext is shorter than a tag or the tag is wrong
pub fn open_into(
    keys: &MessageKeys,
    aad: &[u8],
    ciphertext: &[u8],
    out: &mut [u8],
) -> Result<usize, SessionError> {
    let Some(body_len) = ciphertext.len().checked_sub(TAG_LEN) else {
        return Err(SessionError::Rejected);
    };
    let (body_ct, tag) = ciphertext.split_at(body_len);

    let body = &mut out[..body_len];
    body.copy_from_slice(body_ct);

    let cipher = XChaCha20Poly1305::new(keys.key().into());
    match cipher.decrypt_in_place_detached(
        XNonce::from_slice(keys.nonce()),
        aad,
        body,
        Tag::from_slice(tag),
    ) {
        Ok(()) => Ok(body_len),
        Err(_) => {
            body.zeroize();
            Err(SessionError::Rejected)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::{super::chain::Chain, *};

    fn keys_at(counter: u32) -> MessageKeys {
        let mut chain = Chain::new(&[7u8; 32], u32::MAX);
        for _ in 0..counter {
            chain.advance().unwrap();
        }
        chain.peek().unwrap()
    }

    fn seal(keys: &MessageKeys, aad: &[u8], plaintext: &[u8]) -> Vec<u8> {
        let mut out = vec![0u8; plaintext.len() + TAG_LEN];
        let written = seal_into(keys, aad, plaintext, &mut out);
        assert_eq!(written, out.len());
        out
    }

    #[test]
    fn seal_open_roundtrip() {
        let keys = keys_at(0);
        let ct = seal(&keys, b"aad", b"Hello, World!");

        let mut out = [0u8; 64];
        let len = open_into(&keys, b"aad", &ct, &mut out).unwrap();
        assert_eq!(&out[..len], b"Hello, World!");
    }

    #[test]
    fn empty_plaintext() {
        let keys = keys_at(0);
        let ct = seal(&keys, b"", b"");
        assert_eq!(ct.len(), TAG_LEN);

        let mut out = [0u8; 0];
        assert_eq!(open_into(&keys, b"", &ct, &mut out).unwrap(), 0);
    }

    #[test]
    fn large_plaintext() {
        let keys = keys_at(3);
        let plaintext = vec![0x42u8; 64 * 1024];
        let ct = seal(&keys, b"", &plaintext);

        let mut out = vec![0u8; plaintext.len()];
        open_into(&keys, b"", &ct, &mut out).unwrap();
        assert_eq!(out, plaintext);
    }

    #[test]
    fn wrong_aad_fails_and_clears_output() {
        let keys = keys_at(0);
        let ct = seal(&keys, b"right", b"secret");

        let mut out = [0xFFu8; 6];
        assert_eq!(open_into(&keys, b"wrong", &ct, &mut out), Err(SessionError::Rejected));
        assert_eq!(out, [0u8; 6]);
    }

    #[test]
    fn wrong_key_fails() {
        let ct = seal(&keys_at(0), b"", b"secret");
        let mut out = [0u8; 6];
        assert_eq!(open_into(&keys_at(1), b"", &ct, &mut out), Err(SessionError::Rejected));
    }

    #[test]
    fn tampered_ciphertext_fails() {
        let keys = keys_at(0);
        let mut ct = seal(&keys, b"", b"secret");
        ct[0] ^= 0x01;

        let mut out = [0u8; 6];
        assert_eq!(open_into(&keys, b"", &ct, &mut out), Err(SessionError::Rejected));
    }

    #[test]
    fn short_ciphertext_fails() {
        let keys = keys_at(0);
        let mut out = [0u8; 16];
        assert_eq!(open_into(&keys, b"", &[0u8; 15], &mut out), Err(SessionError::Rejected));
    }
}
