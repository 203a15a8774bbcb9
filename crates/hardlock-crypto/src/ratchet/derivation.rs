//! Chain seed derivation from the handshake secret.

use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroize;

/// Label for the initiator-to-responder chain seed
const I2R_LABEL: &[u8] = b"hardlock/ratchet/i2r";

/// Label for the responder-to-initiator chain seed
const R2I_LABEL: &[u8] = b"hardlock/ratchet/r2i";

/// One chain seed per direction.
pub struct ChainSeeds {
    /// Seeds the chain the initiator sends on
    pub initiator_to_responder: [u8; 32],
    /// Seeds the chain the responder sends on
    pub responder_to_initiator: [u8; 32],
}

impl Drop for ChainSeeds {
    fn drop(&mut self) {
        self.initiator_to_responder.zeroize();
        self.responder_to_initiator.zeroize();
    }
}

/// Derive both chain seeds.
///
/// `HKDF-SHA256(salt = okm, ikm = shared_dh)`, expanded once per direction.
/// Both parties compute the same shared DH value, so both derive the same
/// pair of seeds; the role decides which one is used for sending.
pub fn derive_chain_seeds(okm: &[u8; 32], shared_dh: &[u8; 32]) -> ChainSeeds {
    let hkdf = Hkdf::<Sha256>::new(Some(okm), shared_dh);

    let mut seeds =
        ChainSeeds { initiator_to_responder: [0u8; 32], responder_to_initiator: [0u8; 32] };
    let (Ok(()), Ok(())) = (
        hkdf.expand(I2R_LABEL, &mut seeds.initiator_to_responder),
        hkdf.expand(R2I_LABEL, &mut seeds.responder_to_initiator),
    ) else {
        unreachable!("32 bytes is a valid HKDF-SHA256 output length");
    };

    seeds
}
