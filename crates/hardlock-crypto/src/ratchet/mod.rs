//! Message ratchet: chain derivation, per-message keys and the session
//! state machine.

mod aead;
pub mod chain;
mod derivation;
pub mod session;

pub use chain::{Chain, MessageKeys};
pub use session::{Role, Session};
