//! One-shot key encapsulation over HPKE (RFC 9180).
//!
//! Suite: `DHKEM(X25519, HKDF-SHA256)`, `HKDF-SHA256`, `ChaCha20Poly1305`.
//! The AEAD is never used to seal anything; only the exporter is. Two
//! secrets are exported from the HPKE context:
//!
//! ```text
//! okm    = Export("hardlock/export", 32)
//! binder = Export("hardlock/suite-binder" || suite, 32)
//! ```
//!
//! The binder travels in the blob and is compared in constant time on
//! decapsulation. It turns a wrong recipient key, a tampered `enc`, a wrong
//! sender key (Auth suite) or a mismatched info string into a rejection
//! instead of a silently different OKM.
//!
//! # Blob
//!
//! ```text
//! suite (1) || enc (32) || binder (32)      = 65 bytes
//! ```

use hardlock_proto::{BINDER_LEN, ENC_LEN, EncapsulatedSecret, ProtocolError, Suite};
use hpke::{
    Deserializable, Kem as KemTrait, OpModeR, OpModeS, Serializable, aead::ChaCha20Poly1305,
    kdf::HkdfSha256, kem::X25519HkdfSha256,
};
use rand_chacha::ChaCha20Rng;
use rand_core::SeedableRng;
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::{
    config::HandshakeConfig,
    env::Environment,
    error::HandshakeError,
    keys::{KEY_LEN, KeyPair, OKM_LEN, Okm},
};

type Kem = X25519HkdfSha256;
type HpkeAead = ChaCha20Poly1305;
type Kdf = HkdfSha256;

type HpkePrivateKey = <Kem as KemTrait>::PrivateKey;
type HpkePublicKey = <Kem as KemTrait>::PublicKey;
type HpkeEncappedKey = <Kem as KemTrait>::EncappedKey;

/// Exporter context for the shared output keying material.
const EXPORT_LABEL: &[u8] = b"hardlock/export";

/// Exporter context prefix for the suite binder. The suite byte is appended.
const BINDER_LABEL: &[u8] = b"hardlock/suite-binder";

/// Encapsulate a fresh secret to `recipient_pk`.
///
/// Returns the blob to transmit and the OKM the recipient will recover.
///
/// # Errors
///
/// - `InvalidPublicKey` if `recipient_pk` is not a usable X25519 point
/// - `Entropy` if the environment cannot supply randomness
pub fn encapsulate(
    env: &impl Environment,
    recipient_pk: &[u8; KEY_LEN],
) -> Result<(EncapsulatedSecret, Okm), HandshakeError> {
    encapsulate_with_config(env, recipient_pk, &HandshakeConfig::default())
}

/// [`encapsulate`] with an explicit configuration.
pub fn encapsulate_with_config(
    env: &impl Environment,
    recipient_pk: &[u8; KEY_LEN],
    config: &HandshakeConfig,
) -> Result<(EncapsulatedSecret, Okm), HandshakeError> {
    config.validate()?;
    let seed = env.random_seed()?;
    seal(OpModeS::Base, Suite::Base, recipient_pk, config, seed)
}

/// Encapsulate into a caller-provided buffer.
///
/// Returns the number of blob bytes written and the OKM. Capacity is
/// checked before any entropy is drawn; on error nothing is written.
pub fn encapsulate_into(
    env: &impl Environment,
    recipient_pk: &[u8; KEY_LEN],
    out: &mut [u8],
) -> Result<(usize, Okm), HandshakeError> {
    encapsulate_into_with_config(env, recipient_pk, out, &HandshakeConfig::default())
}

/// [`encapsulate_into`] with an explicit configuration.
pub fn encapsulate_into_with_config(
    env: &impl Environment,
    recipient_pk: &[u8; KEY_LEN],
    out: &mut [u8],
    config: &HandshakeConfig,
) -> Result<(usize, Okm), HandshakeError> {
    let required = EncapsulatedSecret::ENCODED_LEN;
    if out.len() < required {
        return Err(HandshakeError::BufferTooSmall { required, available: out.len() });
    }

    let (secret, okm) = encapsulate_with_config(env, recipient_pk, config)?;
    out[..required].copy_from_slice(&secret.to_bytes());
    Ok((required, okm))
}

/// Encapsulate with an explicit 32-byte seed instead of an environment.
///
/// Identical inputs give identical blobs and OKM. Intended for known-answer
/// tests; a reused seed reuses the ephemeral key.
pub fn encapsulate_deterministic(
    recipient_pk: &[u8; KEY_LEN],
    seed: [u8; 32],
) -> Result<(EncapsulatedSecret, Okm), HandshakeError> {
    seal(OpModeS::Base, Suite::Base, recipient_pk, &HandshakeConfig::default(), seed)
}

/// Encapsulate in HPKE Auth mode, binding the sender's static key.
///
/// Only a recipient that supplies the same sender public key to
/// [`decapsulate_auth`] recovers the OKM.
pub fn encapsulate_auth(
    env: &impl Environment,
    sender: &KeyPair,
    recipient_pk: &[u8; KEY_LEN],
) -> Result<(EncapsulatedSecret, Okm), HandshakeError> {
    encapsulate_auth_with_config(env, sender, recipient_pk, &HandshakeConfig::default())
}

/// [`encapsulate_auth`] with an explicit configuration.
pub fn encapsulate_auth_with_config(
    env: &impl Environment,
    sender: &KeyPair,
    recipient_pk: &[u8; KEY_LEN],
    config: &HandshakeConfig,
) -> Result<(EncapsulatedSecret, Okm), HandshakeError> {
    config.validate()?;
    let sender_sk = hpke_private_key(sender)?;
    let sender_pk = <Kem as KemTrait>::sk_to_pk(&sender_sk);
    let seed = env.random_seed()?;
    seal(OpModeS::Auth((sender_sk, sender_pk)), Suite::Auth, recipient_pk, config, seed)
}

/// Recover the OKM from a base-suite blob.
///
/// # Errors
///
/// - `Malformed` if the blob is oversized, truncated or has an unknown suite
/// - `SuiteMismatch` if the blob is an Auth-suite blob
/// - `Rejected` for every cryptographic failure
pub fn decapsulate(recipient: &KeyPair, blob: &[u8]) -> Result<Okm, HandshakeError> {
    decapsulate_with_config(recipient, blob, &HandshakeConfig::default())
}

/// [`decapsulate`] with an explicit configuration.
pub fn decapsulate_with_config(
    recipient: &KeyPair,
    blob: &[u8],
    config: &HandshakeConfig,
) -> Result<Okm, HandshakeError> {
    config.validate()?;
    open(OpModeR::Base, Suite::Base, recipient, blob, config)
}

/// Recover the OKM from an Auth-suite blob sent by `sender_pk`.
///
/// A blob from any other sender is rejected.
pub fn decapsulate_auth(
    recipient: &KeyPair,
    sender_pk: &[u8; KEY_LEN],
    blob: &[u8],
) -> Result<Okm, HandshakeError> {
    decapsulate_auth_with_config(recipient, sender_pk, blob, &HandshakeConfig::default())
}

/// [`decapsulate_auth`] with an explicit configuration.
pub fn decapsulate_auth_with_config(
    recipient: &KeyPair,
    sender_pk: &[u8; KEY_LEN],
    blob: &[u8],
    config: &HandshakeConfig,
) -> Result<Okm, HandshakeError> {
    config.validate()?;
    let sender_pk = HpkePublicKey::from_bytes(sender_pk).map_err(|_| HandshakeError::Rejected)?;
    open(OpModeR::Auth(sender_pk), Suite::Auth, recipient, blob, config)
}

fn seal(
    mode: OpModeS<'_, Kem>,
    suite: Suite,
    recipient_pk: &[u8; KEY_LEN],
    config: &HandshakeConfig,
    mut seed: [u8; 32],
) -> Result<(EncapsulatedSecret, Okm), HandshakeError> {
    let recipient_pk =
        HpkePublicKey::from_bytes(recipient_pk).map_err(|_| HandshakeError::InvalidPublicKey)?;

    let mut rng = ChaCha20Rng::from_seed(seed);
    seed.zeroize();

    // Fails only when the DH output is all-zero, i.e. a low-order recipient key
    let (encapped, ctx) = hpke::setup_sender::<HpkeAead, Kdf, Kem, _>(
        &mode,
        &recipient_pk,
        config.info.as_bytes(),
        &mut rng,
    )
    .map_err(|_| HandshakeError::InvalidPublicKey)?;

    let mut okm = [0u8; OKM_LEN];
    let mut binder = [0u8; BINDER_LEN];
    let (Ok(()), Ok(())) =
        (ctx.export(EXPORT_LABEL, &mut okm), ctx.export(&binder_context(suite), &mut binder))
    else {
        unreachable!("32 bytes is a valid HKDF-SHA256 export length");
    };

    let mut enc = [0u8; ENC_LEN];
    enc.copy_from_slice(&encapped.to_bytes());

    tracing::debug!(?suite, "encapsulated handshake secret");

    let result = Okm::from_bytes(okm);
    okm.zeroize();
    Ok((EncapsulatedSecret::new(suite, enc, binder), result))
}

fn open(
    mode: OpModeR<'_, Kem>,
    suite: Suite,
    recipient: &KeyPair,
    blob: &[u8],
    config: &HandshakeConfig,
) -> Result<Okm, HandshakeError> {
    if blob.len() > config.max_encapsulation_len {
        return Err(ProtocolError::TooLarge {
            what: "encapsulation",
            size: blob.len(),
            max: config.max_encapsulation_len,
        }
        .into());
    }

    let secret = EncapsulatedSecret::from_bytes(blob)?;
    if secret.suite() != suite {
        return Err(HandshakeError::SuiteMismatch { expected: suite, actual: secret.suite() });
    }

    let encapped =
        HpkeEncappedKey::from_bytes(secret.enc()).map_err(|_| reject("unparseable enc"))?;
    let recipient_sk = hpke_private_key(recipient)?;

    let ctx = hpke::setup_receiver::<HpkeAead, Kdf, Kem>(
        &mode,
        &recipient_sk,
        &encapped,
        config.info.as_bytes(),
    )
    .map_err(|_| reject("key schedule failed"))?;

    let mut okm = [0u8; OKM_LEN];
    let mut binder = [0u8; BINDER_LEN];
    let (Ok(()), Ok(())) =
        (ctx.export(EXPORT_LABEL, &mut okm), ctx.export(&binder_context(suite), &mut binder))
    else {
        unreachable!("32 bytes is a valid HKDF-SHA256 export length");
    };

    let binder_ok: bool = binder[..].ct_eq(&secret.binder()[..]).into();
    if !binder_ok {
        okm.zeroize();
        return Err(reject("binder mismatch"));
    }

    tracing::debug!(?suite, "decapsulated handshake secret");

    let result = Okm::from_bytes(okm);
    okm.zeroize();
    Ok(result)
}

fn hpke_private_key(pair: &KeyPair) -> Result<HpkePrivateKey, HandshakeError> {
    let mut bytes = pair.private_bytes();
    let key = HpkePrivateKey::from_bytes(&bytes);
    bytes.zeroize();
    key.map_err(|_| HandshakeError::Rejected)
}

fn binder_context(suite: Suite) -> [u8; BINDER_LABEL.len() + 1] {
    let mut context = [0u8; BINDER_LABEL.len() + 1];
    context[..BINDER_LABEL.len()].copy_from_slice(BINDER_LABEL);
    context[BINDER_LABEL.len()] = suite.to_u8();
    context
}

fn reject(reason: &'static str) -> HandshakeError {
    tracing::debug!(reason, "decapsulation rejected");
    HandshakeError::Rejected
}
