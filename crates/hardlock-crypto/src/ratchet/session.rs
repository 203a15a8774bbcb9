//! Two-party ratchet session.
//!
//! A session owns one sending and one receiving [`Chain`]. Both are seeded
//! from the handshake OKM and a static-static X25519 exchange:
//!
//! ```text
//! dh    = X25519(own_sk, peer_pk)
//! seeds = HKDF(salt = okm, ikm = dh) -> { i2r, r2i }
//!
//! Initiator: send = i2r, recv = r2i
//! Responder: send = r2i, recv = i2r
//! ```
//!
//! Each message carries a 40-byte [`MessageHeader`] naming the sender's
//! static key, the chain counter and the plaintext length. The header and
//! the caller's associated data are authenticated together as AEAD AAD.
//!
//! Receiving is strictly in order. A message is accepted only if its
//! counter equals the next receive counter; anything else (replay, gap,
//! reordering) is rejected without advancing, so the caller decides how to
//! resynchronize.

use hardlock_proto::{HEADER_LEN, MessageFrame, MessageHeader, NONCE_LEN, TAG_LEN};
use subtle::ConstantTimeEq;
use x25519_dalek::PublicKey;

use super::{aead, chain::Chain, derivation::derive_chain_seeds};
use crate::{
    config::SessionConfig,
    error::SessionError,
    keys::{KEY_LEN, KeyPair, Okm},
};

/// Which side of the handshake this session belongs to. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Party that encapsulated
    Initiator,
    /// Party that decapsulated
    Responder,
}

/// Ratchet session state.
///
/// Single writer: every encrypt and decrypt mutates chain state, so
/// concurrent use must be serialized by the caller. Chain keys are zeroized
/// when the session is dropped or [closed](Self::close).
pub struct Session {
    role: Role,
    local_id: [u8; KEY_LEN],
    peer_id: [u8; KEY_LEN],
    send: Chain,
    recv: Chain,
    config: SessionConfig,
    send_warned: bool,
    recv_warned: bool,
}

impl Session {
    /// Create the initiator side with default configuration.
    ///
    /// # Errors
    ///
    /// - `InvalidPeerKey` if `peer_public_key` is a low-order point
    pub fn new_initiator(
        okm: Okm,
        own: &KeyPair,
        peer_public_key: &[u8; KEY_LEN],
    ) -> Result<Self, SessionError> {
        Self::with_config(Role::Initiator, okm, own, peer_public_key, SessionConfig::default())
    }

    /// Create the responder side with default configuration.
    pub fn new_responder(
        okm: Okm,
        own: &KeyPair,
        peer_public_key: &[u8; KEY_LEN],
    ) -> Result<Self, SessionError> {
        Self::with_config(Role::Responder, okm, own, peer_public_key, SessionConfig::default())
    }

    /// Create a session for `role` with explicit limits.
    ///
    /// The OKM is consumed and zeroized when this returns.
    pub fn with_config(
        role: Role,
        okm: Okm,
        own: &KeyPair,
        peer_public_key: &[u8; KEY_LEN],
        config: SessionConfig,
    ) -> Result<Self, SessionError> {
        config.validate()?;

        let shared = own.secret().diffie_hellman(&PublicKey::from(*peer_public_key));
        if !shared.was_contributory() {
            tracing::debug!(?role, "refusing session with low-order peer key");
            return Err(SessionError::InvalidPeerKey);
        }

        let seeds = derive_chain_seeds(okm.as_bytes(), shared.as_bytes());
        let limit = config.max_messages_per_chain;
        let (send, recv) = match role {
            Role::Initiator => (
                Chain::new(&seeds.initiator_to_responder, limit),
                Chain::new(&seeds.responder_to_initiator, limit),
            ),
            Role::Responder => (
                Chain::new(&seeds.responder_to_initiator, limit),
                Chain::new(&seeds.initiator_to_responder, limit),
            ),
        };

        tracing::debug!(?role, "session established");

        Ok(Self {
            role,
            local_id: own.public(),
            peer_id: *peer_public_key,
            send,
            recv,
            config,
            send_warned: false,
            recv_warned: false,
        })
    }

    /// Encrypt one message.
    ///
    /// Returns the frame to transmit: header, nonce and ciphertext with tag.
    ///
    /// # Errors
    ///
    /// - `ChainExhausted` if the send chain has reached its limit
    /// - `PlaintextTooLarge` if the length does not fit the header
    pub fn encrypt(
        &mut self,
        associated_data: &[u8],
        plaintext: &[u8],
    ) -> Result<MessageFrame, SessionError> {
        if u32::try_from(plaintext.len()).is_err() {
            return Err(SessionError::PlaintextTooLarge { len: plaintext.len() });
        }
        let mut ciphertext = vec![0u8; plaintext.len() + TAG_LEN];
        let (header, nonce, written) =
            self.encrypt_into(associated_data, plaintext, &mut ciphertext)?;
        ciphertext.truncate(written);
        Ok(MessageFrame::new(header, nonce, ciphertext))
    }

    /// Encrypt one message into `out`.
    ///
    /// Returns the header, the nonce and the number of ciphertext bytes
    /// written (`plaintext.len() + TAG_LEN`). All checks run before the
    /// send chain moves; on error the session is unchanged and nothing is
    /// written.
    pub fn encrypt_into(
        &mut self,
        associated_data: &[u8],
        plaintext: &[u8],
        out: &mut [u8],
    ) -> Result<(MessageHeader, [u8; NONCE_LEN], usize), SessionError> {
        let body_len = u32::try_from(plaintext.len())
            .map_err(|_| SessionError::PlaintextTooLarge { len: plaintext.len() })?;

        let required = plaintext.len() + TAG_LEN;
        if out.len() < required {
            return Err(SessionError::BufferTooSmall { required, available: out.len() });
        }

        let keys = self.send.peek()?;
        let header = MessageHeader::new(self.local_id, keys.counter(), body_len);
        let aad = authenticated_data(&header, associated_data);

        let written = aead::seal_into(&keys, &aad, plaintext, out);
        self.send.advance()?;
        let threshold = self.config.exhaustion_warning;
        note_remaining("send", self.send.remaining(), threshold, &mut self.send_warned);

        Ok((header, *keys.nonce(), written))
    }

    /// Authenticate and decrypt one message.
    ///
    /// `header` is the 40-byte encoded header as received.
    ///
    /// # Errors
    ///
    /// - `MalformedHeader` if `header` is not exactly 40 bytes
    /// - `Rejected` for a wrong sender, counter, length, nonce or tag
    /// - `ChainExhausted` if the receive chain has reached its limit
    pub fn decrypt(
        &mut self,
        associated_data: &[u8],
        header: &[u8],
        nonce: &[u8; NONCE_LEN],
        ciphertext: &[u8],
    ) -> Result<Vec<u8>, SessionError> {
        let mut plaintext = vec![0u8; ciphertext.len().saturating_sub(TAG_LEN)];
        let len = self.decrypt_into(associated_data, header, nonce, ciphertext, &mut plaintext)?;
        plaintext.truncate(len);
        Ok(plaintext)
    }

    /// Decrypt a decoded [`MessageFrame`].
    pub fn decrypt_frame(
        &mut self,
        associated_data: &[u8],
        frame: &MessageFrame,
    ) -> Result<Vec<u8>, SessionError> {
        self.decrypt(associated_data, frame.header.as_bytes(), &frame.nonce, &frame.ciphertext)
    }

    /// Authenticate and decrypt one message into `out`.
    ///
    /// Returns the plaintext length. The receive counter advances by exactly
    /// one on success and not at all on failure; a rejected message leaves
    /// no plaintext in `out`.
    pub fn decrypt_into(
        &mut self,
        associated_data: &[u8],
        header: &[u8],
        nonce: &[u8; NONCE_LEN],
        ciphertext: &[u8],
        out: &mut [u8],
    ) -> Result<usize, SessionError> {
        let header = MessageHeader::from_bytes(header)?;
        let Some(body_len) = ciphertext.len().checked_sub(TAG_LEN) else {
            return Err(reject("ciphertext shorter than tag"));
        };
        if out.len() < body_len {
            return Err(SessionError::BufferTooSmall { required: body_len, available: out.len() });
        }
        self.recv.ensure_capacity()?;

        if header.sender_id() != &self.peer_id {
            return Err(reject("unexpected sender"));
        }
        if header.counter() != self.recv.counter() {
            return Err(reject("counter mismatch"));
        }
        if header.body_len() as usize != body_len {
            return Err(reject("length mismatch"));
        }

        let keys = self.recv.peek()?;
        let nonce_ok: bool = nonce[..].ct_eq(&keys.nonce()[..]).into();
        if !nonce_ok {
            return Err(reject("nonce mismatch"));
        }

        let aad = authenticated_data(header, associated_data);
        let len = aead::open_into(&keys, &aad, ciphertext, out)
            .map_err(|_| reject("authentication failed"))?;

        self.recv.advance()?;
        let threshold = self.config.exhaustion_warning;
        note_remaining("recv", self.recv.remaining(), threshold, &mut self.recv_warned);

        Ok(len)
    }

    /// Release the session. Chain keys and counters are zeroized.
    pub fn close(self) {
        tracing::debug!(role = ?self.role, "session closed");
        drop(self);
    }

    /// Counter the next outgoing message will carry.
    pub fn send_counter(&self) -> u32 {
        self.send.counter()
    }

    /// Counter the next incoming message must carry.
    pub fn recv_counter(&self) -> u32 {
        self.recv.counter()
    }

    /// Role fixed at creation.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Own static public key, carried in outgoing headers.
    pub fn local_id(&self) -> &[u8; KEY_LEN] {
        &self.local_id
    }

    /// Peer static public key expected in incoming headers.
    pub fn peer_id(&self) -> &[u8; KEY_LEN] {
        &self.peer_id
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("role", &self.role)
            .field("send_counter", &self.send.counter())
            .field("recv_counter", &self.recv.counter())
            .finish_non_exhaustive()
    }
}

/// Warn when a chain runs out, and once when it first drops to `threshold`.
fn note_remaining(direction: &'static str, remaining: u32, threshold: u32, warned: &mut bool) {
    if remaining == 0 {
        tracing::warn!(direction, "ratchet chain exhausted, session must be renegotiated");
    } else if remaining <= threshold && !*warned {
        *warned = true;
        tracing::warn!(direction, remaining, "ratchet chain nearing exhaustion");
    }
}

fn authenticated_data(header: &MessageHeader, associated_data: &[u8]) -> Vec<u8> {
    let mut aad = Vec::with_capacity(HEADER_LEN + associated_data.len());
    aad.extend_from_slice(header.as_bytes());
    aad.extend_from_slice(associated_data);
    aad
}

fn reject(reason: &'static str) -> SessionError {
    tracing::debug!(reason, "message rejected");
    SessionError::Rejected
}

#[cfg(test)]
mod tests {
    use super::*;

    const OKM: [u8; 32] = [0x11; 32];

    fn pair(byte: u8) -> KeyPair {
        KeyPair::from_private_bytes([byte; 32])
    }

    fn session_pair_with(config: &SessionConfig) -> (Session, Session) {
        let alice = pair(1);
        let bob = pair(2);
        let initiator = Session::with_config(
            Role::Initiator,
            Okm::from_bytes(OKM),
            &alice,
            &bob.public(),
            config.clone(),
        )
        .unwrap();
        let responder = Session::with_config(
            Role::Responder,
            Okm::from_bytes(OKM),
            &bob,
            &alice.public(),
            config.clone(),
        )
        .unwrap();
        (initiator, responder)
    }

    fn session_pair() -> (Session, Session) {
        session_pair_with(&SessionConfig::default())
    }

    #[test]
    fn initiator_to_responder_roundtrip() {
        let (mut alice, mut bob) = session_pair();

        let frame = alice.encrypt(b"ad", b"hello").unwrap();
        assert_eq!(bob.decrypt_frame(b"ad", &frame).unwrap(), b"hello");

        assert_eq!(alice.send_counter(), 1);
        assert_eq!(bob.recv_counter(), 1);
    }

    #[test]
    fn responder_to_initiator_roundtrip() {
        let (mut alice, mut bob) = session_pair();

        let frame = bob.encrypt(b"", b"reply").unwrap();
        assert_eq!(alice.decrypt_frame(b"", &frame).unwrap(), b"reply");
    }

    #[test]
    fn directions_use_different_keys() {
        let (mut alice, mut bob) = session_pair();

        let from_alice = alice.encrypt(b"", b"same").unwrap();
        let from_bob = bob.encrypt(b"", b"same").unwrap();
        assert_ne!(from_alice.nonce, from_bob.nonce);
        assert_ne!(from_alice.ciphertext, from_bob.ciphertext);
    }

    #[test]
    fn header_carries_sender_counter_and_length() {
        let (mut alice, _) = session_pair();

        alice.encrypt(b"", b"first").unwrap();
        let frame = alice.encrypt(b"", b"second!").unwrap();

        assert_eq!(frame.header.sender_id(), alice.local_id());
        assert_eq!(frame.header.counter(), 1);
        assert_eq!(frame.header.body_len(), 7);
        assert_eq!(frame.ciphertext.len(), 7 + TAG_LEN);
    }

    #[test]
    fn own_message_is_rejected() {
        let (mut alice, _) = session_pair();

        let frame = alice.encrypt(b"", b"echo").unwrap();
        assert_eq!(alice.decrypt_frame(b"", &frame), Err(SessionError::Rejected));
        assert_eq!(alice.recv_counter(), 0);
    }

    #[test]
    fn replay_is_rejected() {
        let (mut alice, mut bob) = session_pair();

        let frame = alice.encrypt(b"", b"once").unwrap();
        bob.decrypt_frame(b"", &frame).unwrap();
        assert_eq!(bob.decrypt_frame(b"", &frame), Err(SessionError::Rejected));
        assert_eq!(bob.recv_counter(), 1);
    }

    #[test]
    fn gap_is_rejected_without_advancing() {
        let (mut alice, mut bob) = session_pair();

        let first = alice.encrypt(b"", b"one").unwrap();
        let second = alice.encrypt(b"", b"two").unwrap();

        assert_eq!(bob.decrypt_frame(b"", &second), Err(SessionError::Rejected));
        assert_eq!(bob.recv_counter(), 0);

        assert_eq!(bob.decrypt_frame(b"", &first).unwrap(), b"one");
        assert_eq!(bob.decrypt_frame(b"", &second).unwrap(), b"two");
    }

    #[test]
    fn wrong_associated_data_is_rejected() {
        let (mut alice, mut bob) = session_pair();

        let frame = alice.encrypt(b"right", b"data").unwrap();
        assert_eq!(bob.decrypt_frame(b"wrong", &frame), Err(SessionError::Rejected));
        assert_eq!(bob.decrypt_frame(b"right", &frame).unwrap(), b"data");
    }

    #[test]
    fn header_tampering_is_rejected() {
        let (mut alice, mut bob) = session_pair();
        let frame = alice.encrypt(b"", b"payload").unwrap();

        for byte in 0..HEADER_LEN {
            let mut header = frame.header.to_bytes();
            header[byte] ^= 0x80;
            assert_eq!(
                bob.decrypt(b"", &header, &frame.nonce, &frame.ciphertext),
                Err(SessionError::Rejected),
                "flipping header byte {byte} must be rejected"
            );
        }
        assert_eq!(bob.decrypt_frame(b"", &frame).unwrap(), b"payload");
    }

    #[test]
    fn nonce_tampering_is_rejected() {
        let (mut alice, mut bob) = session_pair();
        let frame = alice.encrypt(b"", b"payload").unwrap();

        let mut nonce = frame.nonce;
        nonce[0] ^= 0x01;
        assert_eq!(
            bob.decrypt(b"", frame.header.as_bytes(), &nonce, &frame.ciphertext),
            Err(SessionError::Rejected)
        );
    }

    #[test]
    fn malformed_header_is_an_input_error() {
        let (mut alice, mut bob) = session_pair();
        let frame = alice.encrypt(b"", b"x").unwrap();

        assert!(matches!(
            bob.decrypt(b"", &frame.header.as_bytes()[..39], &frame.nonce, &frame.ciphertext),
            Err(SessionError::MalformedHeader(_))
        ));
    }

    #[test]
    fn encrypt_into_checks_capacity_before_advancing() {
        let (mut alice, mut bob) = session_pair();

        let mut small = [0xAAu8; 20];
        let err = alice.encrypt_into(b"", b"hello world", &mut small).unwrap_err();
        assert_eq!(err, SessionError::BufferTooSmall { required: 27, available: 20 });
        assert_eq!(alice.send_counter(), 0);
        assert!(small.iter().all(|&b| b == 0xAA));

        let mut out = [0u8; 64];
        let (header, nonce, written) = alice.encrypt_into(b"", b"hello world", &mut out).unwrap();
        assert_eq!(written, 27);

        let mut plain = [0u8; 11];
        let len =
            bob.decrypt_into(b"", header.as_bytes(), &nonce, &out[..written], &mut plain).unwrap();
        assert_eq!(&plain[..len], b"hello world");
    }

    #[test]
    fn decrypt_into_checks_capacity_before_advancing() {
        let (mut alice, mut bob) = session_pair();
        let frame = alice.encrypt(b"", b"hello").unwrap();

        let mut small = [0u8; 4];
        let err = bob
            .decrypt_into(b"", frame.header.as_bytes(), &frame.nonce, &frame.ciphertext, &mut small)
            .unwrap_err();
        assert_eq!(err, SessionError::BufferTooSmall { required: 5, available: 4 });
        assert_eq!(bob.recv_counter(), 0);
    }

    #[test]
    fn chain_limit_exhausts_session() {
        let config = SessionConfig { max_messages_per_chain: 2, exhaustion_warning: 1 };
        let (mut alice, mut bob) = session_pair_with(&config);

        for _ in 0..2 {
            let frame = alice.encrypt(b"", b"m").unwrap();
            bob.decrypt_frame(b"", &frame).unwrap();
        }

        let err = alice.encrypt(b"", b"m").unwrap_err();
        assert_eq!(err, SessionError::ChainExhausted { limit: 2 });
        assert!(err.is_fatal());
        assert_eq!(alice.send_counter(), 2);
    }

    #[test]
    fn warning_threshold_above_limit_still_fires_once() {
        let config = SessionConfig { max_messages_per_chain: 10, exhaustion_warning: 50 };
        let (mut alice, mut bob) = session_pair_with(&config);
        assert!(!alice.send_warned);

        let frame = alice.encrypt(b"", b"first").unwrap();
        assert!(alice.send_warned);
        bob.decrypt_frame(b"", &frame).unwrap();
        assert!(bob.recv_warned);

        let frame = alice.encrypt(b"", b"second").unwrap();
        assert!(alice.send_warned);
        assert_eq!(bob.decrypt_frame(b"", &frame).unwrap(), b"second");
    }

    #[test]
    fn warning_waits_for_threshold() {
        let config = SessionConfig { max_messages_per_chain: 5, exhaustion_warning: 2 };
        let (mut alice, _bob) = session_pair_with(&config);

        for _ in 0..2 {
            alice.encrypt(b"", b"m").unwrap();
            assert!(!alice.send_warned);
        }
        alice.encrypt(b"", b"m").unwrap();
        assert!(alice.send_warned);
    }

    #[test]
    fn low_order_peer_key_is_refused() {
        let alice = pair(1);
        let err = Session::new_initiator(Okm::from_bytes(OKM), &alice, &[0u8; 32]).unwrap_err();
        assert_eq!(err, SessionError::InvalidPeerKey);
    }

    #[test]
    fn mismatched_okm_never_decrypts() {
        let alice = pair(1);
        let bob = pair(2);
        let mut initiator =
            Session::new_initiator(Okm::from_bytes([1; 32]), &alice, &bob.public()).unwrap();
        let mut responder =
            Session::new_responder(Okm::from_bytes([2; 32]), &bob, &alice.public()).unwrap();

        let frame = initiator.encrypt(b"", b"secret").unwrap();
        assert_eq!(responder.decrypt_frame(b"", &frame), Err(SessionError::Rejected));
    }

    #[test]
    fn accessors_report_construction_inputs() {
        let (alice, bob) = session_pair();
        assert_eq!(alice.role(), Role::Initiator);
        assert_eq!(bob.role(), Role::Responder);
        assert_eq!(alice.local_id(), bob.peer_id());
        assert_eq!(alice.peer_id(), bob.local_id());

        let rendered = format!("{alice:?}");
        assert!(rendered.contains("Initiator"));
        alice.close();
    }
}
