//! Capability tokens.
//!
//! A token seals a [`TokenPayload`] (expiry, holder public key, scope) under
//! a service key with XChaCha20-Poly1305 and a random 24-byte nonce:
//!
//! ```text
//! wire = nonce (24) || Seal(key, nonce, aad = "hardlock/capability-token", payload)
//! ```
//!
//! Verification is a pure function of key, nonce, ciphertext and the
//! caller's notion of "now". A bad tag, a malformed payload and an expired
//! token all produce the same [`TokenError::Rejected`].

use chacha20poly1305::{
    XChaCha20Poly1305, XNonce,
    aead::{Aead, AeadInPlace, KeyInit, Payload},
};
use hardlock_proto::{MAX_SCOPE_LEN, NONCE_LEN, TAG_LEN, TokenPayload, TokenWire};
use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::{Zeroize, Zeroizing};

use crate::{env::Environment, error::TokenError, keys::KEY_LEN};

/// AEAD associated data for every token.
const TOKEN_AAD: &[u8] = b"hardlock/capability-token";

/// HKDF info for token service keys.
const TOKEN_KEY_LABEL: &[u8] = b"hardlock/token-key";

/// Derive a token service key from master key material.
pub fn derive_token_key(master: &[u8], salt: &[u8]) -> Zeroizing<[u8; 32]> {
    let hkdf = Hkdf::<Sha256>::new(Some(salt), master);
    let mut key = Zeroizing::new([0u8; 32]);
    let Ok(()) = hkdf.expand(TOKEN_KEY_LABEL, key.as_mut()) else {
        unreachable!("32 bytes is a valid HKDF-SHA256 output length");
    };
    key
}

/// Wire size of a token carrying `scope_len` scope bytes.
pub fn token_len(scope_len: usize) -> usize {
    NONCE_LEN + TokenPayload::encoded_len_for(scope_len) + TAG_LEN
}

/// Build a token.
///
/// # Errors
///
/// - `ScopeTooLong` if `scope` exceeds 65535 bytes
/// - `Entropy` if no nonce can be drawn
pub fn build(
    env: &impl Environment,
    key: &[u8; 32],
    expiry_unix_s: u64,
    sender_public_key: &[u8; KEY_LEN],
    scope: &[u8],
) -> Result<TokenWire, TokenError> {
    check_scope(scope)?;
    let mut payload =
        TokenPayload { expiry_unix_s, sender_public_key: *sender_public_key, scope: scope.to_vec() }
            .encode()
            .map_err(|_| scope_too_long(scope))?;

    let mut nonce = [0u8; NONCE_LEN];
    env.random_bytes(&mut nonce)?;

    let cipher = XChaCha20Poly1305::new(key.into());
    let Ok(ciphertext) =
        cipher.encrypt(XNonce::from_slice(&nonce), Payload { msg: &payload, aad: TOKEN_AAD })
    else {
        unreachable!("XChaCha20-Poly1305 encryption cannot fail with valid inputs");
    };
    payload.zeroize();

    Ok(TokenWire { nonce, ciphertext })
}

/// Build a token directly into `out` in wire form (`nonce || ciphertext`).
///
/// Returns the number of bytes written. Capacity is checked before the
/// nonce is drawn; on error nothing is written.
pub fn build_into(
    env: &impl Environment,
    key: &[u8; 32],
    expiry_unix_s: u64,
    sender_public_key: &[u8; KEY_LEN],
    scope: &[u8],
    out: &mut [u8],
) -> Result<usize, TokenError> {
    check_scope(scope)?;

    let required = token_len(scope.len());
    if out.len() < required {
        return Err(TokenError::BufferTooSmall { required, available: out.len() });
    }

    let mut nonce = [0u8; NONCE_LEN];
    env.random_bytes(&mut nonce)?;

    let (nonce_out, rest) = out.split_at_mut(NONCE_LEN);
    let payload_len = TokenPayload::encoded_len_for(scope.len());
    let (body, tag_out) = rest[..payload_len + TAG_LEN].split_at_mut(payload_len);

    body[0..8].copy_from_slice(&expiry_unix_s.to_be_bytes());
    body[8..40].copy_from_slice(sender_public_key);
    body[40..42].copy_from_slice(&(scope.len() as u16).to_be_bytes());
    body[42..].copy_from_slice(scope);

    let cipher = XChaCha20Poly1305::new(key.into());
    let Ok(tag) = cipher.encrypt_in_place_detached(XNonce::from_slice(&nonce), TOKEN_AAD, body)
    else {
        unreachable!("XChaCha20-Poly1305 encryption cannot fail with valid inputs");
    };

    nonce_out.copy_from_slice(&nonce);
    tag_out.copy_from_slice(&tag);
    Ok(required)
}

/// Verify a token and return its payload.
///
/// Succeeds only if the tag is valid, the payload parses and
/// `now_unix_s <= expiry`.
///
/// # Errors
///
/// - `Rejected` on any failure, without distinguishing the cause
pub fn verify(
    key: &[u8; 32],
    nonce: &[u8; NONCE_LEN],
    ciphertext: &[u8],
    now_unix_s: u64,
) -> Result<TokenPayload, TokenError> {
    let cipher = XChaCha20Poly1305::new(key.into());
    let plaintext = Zeroizing::new(
        cipher
            .decrypt(XNonce::from_slice(nonce), Payload { msg: ciphertext, aad: TOKEN_AAD })
            .map_err(|_| reject("authentication failed"))?,
    );

    let payload = TokenPayload::decode(&plaintext).map_err(|_| reject("malformed payload"))?;
    if now_unix_s > payload.expiry_unix_s {
        return Err(reject("expired"));
    }
    Ok(payload)
}

/// Verify a token in wire form against the environment's clock.
pub fn verify_wire(
    env: &impl Environment,
    key: &[u8; 32],
    wire: &[u8],
) -> Result<TokenPayload, TokenError> {
    let token = TokenWire::from_bytes(wire).map_err(|_| reject("truncated token"))?;
    verify(key, &token.nonce, &token.ciphertext, env.wall_clock_secs())
}

/// Verify a detached token, discarding the payload.
///
/// Same rules as [`verify`]; useful where only the yes/no answer matters.
pub fn is_valid(key: &[u8; 32], nonce: &[u8; NONCE_LEN], ciphertext: &[u8], now: u64) -> bool {
    verify(key, nonce, ciphertext, now).is_ok()
}

fn check_scope(scope: &[u8]) -> Result<(), TokenError> {
    if scope.len() > MAX_SCOPE_LEN {
        return Err(scope_too_long(scope));
    }
    Ok(())
}

fn scope_too_long(scope: &[u8]) -> TokenError {
    TokenError::ScopeTooLong { len: scope.len(), max: MAX_SCOPE_LEN }
}

fn reject(reason: &'static str) -> TokenError {
    tracing::debug!(reason, "token rejected");
    TokenError::Rejected
}
