//! Traffic-shaping padding.
//!
//! Pads an encoded frame up to a size drawn from a fixed ladder so that an
//! observer learns only which rung a message landed on. Padding is a pure
//! transport wrapper outside the authenticated region: the true length is
//! recovered from the frame's own length field, so pad bytes carry no
//! meaning and are always zero.

use serde::{Deserialize, Serialize};

use crate::errors::{ProtocolError, Result};

const STEALTH_RUNGS: &[usize] = &[1024, 4096, 16 * 1024];
const BALANCED_RUNGS: &[usize] = &[256, 512, 1024, 2048, 4096];
const THROUGHPUT_ALIGN: usize = 64;

/// Padding profile: trades bandwidth for size uniformity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PadProfile {
    /// Few, coarse rungs. Most messages look identical on the wire.
    Stealth,
    /// Power-of-two rungs from 256 B to 4 KiB.
    #[default]
    Balanced,
    /// Alignment to 64 bytes only.
    Throughput,
}

impl PadProfile {
    /// Wire code (0 = Stealth, 1 = Balanced, 2 = Throughput).
    #[must_use]
    pub fn to_u8(self) -> u8 {
        match self {
            Self::Stealth => 0,
            Self::Balanced => 1,
            Self::Throughput => 2,
        }
    }

    /// Parse a wire code.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::UnknownPadProfile` for codes other than 0, 1, 2
    pub fn from_u8(code: u8) -> Result<Self> {
        match code {
            0 => Ok(Self::Stealth),
            1 => Ok(Self::Balanced),
            2 => Ok(Self::Throughput),
            other => Err(ProtocolError::UnknownPadProfile(other)),
        }
    }

    fn rungs(self) -> &'static [usize] {
        match self {
            Self::Stealth => STEALTH_RUNGS,
            Self::Balanced => BALANCED_RUNGS,
            Self::Throughput => &[THROUGHPUT_ALIGN],
        }
    }

    /// Smallest ladder size that can hold `len` bytes.
    ///
    /// The ladder is the profile's listed rungs followed by every whole
    /// multiple of the top rung. Returns `None` only if the result would
    /// overflow `usize`.
    #[must_use]
    pub fn padded_len(self, len: usize) -> Option<usize> {
        let rungs = self.rungs();
        if let Some(&rung) = rungs.iter().find(|&&rung| len <= rung) {
            return Some(rung);
        }
        let top = *rungs.last()?;
        len.div_ceil(top).checked_mul(top)
    }

    /// Whether `size` is a value on this profile's ladder.
    #[must_use]
    pub fn is_ladder_size(self, size: usize) -> bool {
        let rungs = self.rungs();
        match rungs.last() {
            Some(&top) if size > top => size % top == 0,
            _ => rungs.contains(&size),
        }
    }
}

/// Copy `frame` into `out` and zero-fill up to the profile's ladder size.
///
/// Returns the number of bytes written, which is always a ladder value for
/// `profile` and never smaller than `frame.len()`.
///
/// # Errors
///
/// - `ProtocolError::BufferTooSmall` if `out` cannot hold the padded size.
///   Nothing is written in that case.
pub fn apply_padding(frame: &[u8], profile: PadProfile, out: &mut [u8]) -> Result<usize> {
    let target = profile.padded_len(frame.len()).ok_or(ProtocolError::TooLarge {
        what: "frame",
        size: frame.len(),
        max: usize::MAX,
    })?;

    if out.len() < target {
        return Err(ProtocolError::BufferTooSmall { required: target, available: out.len() });
    }

    out[..frame.len()].copy_from_slice(frame);
    out[frame.len()..target].fill(0);
    Ok(target)
}

/// Allocating variant of [`apply_padding`].
pub fn pad_to_vec(frame: &[u8], profile: PadProfile) -> Result<Vec<u8>> {
    let target = profile.padded_len(frame.len()).ok_or(ProtocolError::TooLarge {
        what: "frame",
        size: frame.len(),
        max: usize::MAX,
    })?;
    let mut out = vec![0u8; target];
    out[..frame.len()].copy_from_slice(frame);
    Ok(out)
}

/// Strip padding given the frame length declared inside the frame.
///
/// # Errors
///
/// - `ProtocolError::Truncated` if `padded` is shorter than `frame_len`
pub fn strip_padding(padded: &[u8], frame_len: usize) -> Result<&[u8]> {
    padded.get(..frame_len).ok_or(ProtocolError::Truncated {
        section: "padded frame",
        expected: frame_len,
        actual: padded.len(),
    })
}
