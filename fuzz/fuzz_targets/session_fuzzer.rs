//! Fuzz target for the ratchet session
//!
//! # Strategy
//!
//! - Random interleaving of sends in both directions
//! - Deliveries that replay, skip, tamper or deliver in order
//!
//! # Invariants
//!
//! - In-order untampered delivery always succeeds with the sent plaintext
//! - Replay, skip and tamper are always rejected
//! - A rejection never moves the receive counter

#![no_main]

use std::collections::VecDeque;

use arbitrary::Arbitrary;
use hardlock_crypto::{KeyPair, MessageFrame, Okm, Session, SessionError};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Clone, Arbitrary)]
struct Scenario {
    okm: [u8; 32],
    ops: Vec<Op>,
}

#[derive(Debug, Clone, Arbitrary)]
enum Op {
    Send { from_initiator: bool, plaintext: Vec<u8>, ad: Vec<u8> },
    Deliver { to_responder: bool },
    Replay { to_responder: bool },
    Skip { to_responder: bool },
    Tamper { to_responder: bool, position: u16, mask: u8 },
}

struct Direction {
    in_flight: VecDeque<(MessageFrame, Vec<u8>, Vec<u8>)>,
    delivered: Option<(MessageFrame, Vec<u8>)>,
}

impl Direction {
    fn new() -> Self {
        Self { in_flight: VecDeque::new(), delivered: None }
    }
}

fn expect_rejected(receiver: &mut Session, ad: &[u8], frame: &MessageFrame) {
    let before = receiver.recv_counter();
    assert_eq!(receiver.decrypt_frame(ad, frame), Err(SessionError::Rejected));
    assert_eq!(receiver.recv_counter(), before);
}

fuzz_target!(|scenario: Scenario| {
    let alice = KeyPair::from_private_bytes([1; 32]);
    let bob = KeyPair::from_private_bytes([2; 32]);
    let mut initiator =
        Session::new_initiator(Okm::from_bytes(scenario.okm), &alice, &bob.public()).unwrap();
    let mut responder =
        Session::new_responder(Okm::from_bytes(scenario.okm), &bob, &alice.public()).unwrap();

    let mut to_responder = Direction::new();
    let mut to_initiator = Direction::new();

    for op in scenario.ops {
        match op {
            Op::Send { from_initiator, plaintext, ad } => {
                let (sender, direction) = if from_initiator {
                    (&mut initiator, &mut to_responder)
                } else {
                    (&mut responder, &mut to_initiator)
                };
                let frame = sender.encrypt(&ad, &plaintext).unwrap();
                direction.in_flight.push_back((frame, ad, plaintext));
            },
            Op::Deliver { to_responder: forward } => {
                let (receiver, direction) = if forward {
                    (&mut responder, &mut to_responder)
                } else {
                    (&mut initiator, &mut to_initiator)
                };
                if let Some((frame, ad, plaintext)) = direction.in_flight.pop_front() {
                    assert_eq!(receiver.decrypt_frame(&ad, &frame).unwrap(), plaintext);
                    direction.delivered = Some((frame, ad));
                }
            },
            Op::Replay { to_responder: forward } => {
                let (receiver, direction) = if forward {
                    (&mut responder, &mut to_responder)
                } else {
                    (&mut initiator, &mut to_initiator)
                };
                if let Some((frame, ad)) = &direction.delivered {
                    expect_rejected(receiver, ad, frame);
                }
            },
            Op::Skip { to_responder: forward } => {
                let (receiver, direction) = if forward {
                    (&mut responder, &mut to_responder)
                } else {
                    (&mut initiator, &mut to_initiator)
                };
                if let Some((frame, ad, _)) = direction.in_flight.get(1) {
                    expect_rejected(receiver, ad, frame);
                }
            },
            Op::Tamper { to_responder: forward, position, mask } => {
                let (receiver, direction) = if forward {
                    (&mut responder, &mut to_responder)
                } else {
                    (&mut initiator, &mut to_initiator)
                };
                if mask == 0 {
                    continue;
                }
                if let Some((frame, ad, _)) = direction.in_flight.front() {
                    let mut tampered = frame.clone();
                    let index = position as usize % tampered.ciphertext.len();
                    tampered.ciphertext[index] ^= mask;
                    expect_rejected(receiver, ad, &tampered);
                }
            },
        }
    }
});
