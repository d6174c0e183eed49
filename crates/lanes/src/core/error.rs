//! Error types for lane construction, deinterleaving and dispatch.
//!
//! Out-of-range indices are never an error: they wrap modulo the lane count.
//! Errors here are about shapes (lengths, channel counts, widths) and about
//! asking for a backend the CPU cannot run.

use std::fmt;

use thiserror::Error;

use crate::arch::Backend;

/// The length constraint a buffer failed to meet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LengthRule {
    /// Length must equal this value.
    Exactly(usize),
    /// Length must be a whole multiple of this value.
    MultipleOf(usize),
    /// Length must be non-zero.
    NonEmpty,
}

impl fmt::Display for LengthRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exactly(n) => write!(f, "expected exactly {n}"),
            Self::MultipleOf(n) => write!(f, "expected a multiple of {n}"),
            Self::NonEmpty => f.write_str("expected a non-empty buffer"),
        }
    }
}

/// Errors reported by the lanes crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LaneError {
    /// A buffer length does not satisfy the operation's length rule.
    #[error("invalid length {actual}: {rule}")]
    InvalidLength {
        /// Length that was supplied.
        actual: usize,
        /// Rule it violated.
        rule: LengthRule,
    },

    /// Deinterleaving into zero channels, or into so many that one block
    /// overflows the `u32` index space.
    #[error("channel count must be at least 1 and at most 2^32 / 16")]
    InvalidChannelCount,

    /// Two entries of a scatter pattern write the same output position.
    #[error("scatter entry {position} writes already-written position {target}")]
    DuplicateTarget {
        /// Index of the offending entry.
        position: usize,
        /// Wrapped output position it writes.
        target: usize,
    },

    /// A planner window width of zero.
    #[error("block width must be at least 1")]
    InvalidWidth,

    /// A backend was requested explicitly but the CPU lacks its features.
    #[error("backend `{0}` is not supported on this CPU")]
    UnsupportedBackend(Backend),

    /// A backend name in configuration did not match any backend.
    #[error("unknown backend `{0}` (expected auto, scalar, ssse3, avx2, avx512 or neon)")]
    ParseBackend(String),
}

impl LaneError {
    /// Shorthand for an [`LaneError::InvalidLength`] with an exact rule.
    #[must_use]
    pub const fn length_mismatch(expected: usize, actual: usize) -> Self {
        Self::InvalidLength {
            actual,
            rule: LengthRule::Exactly(expected),
        }
    }
}
