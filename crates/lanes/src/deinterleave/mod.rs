//! Strided deinterleave built on the lane permute.
//!
//! An interleaved buffer of `C` channels stores pixel `i`, channel `c` at
//! position `i * C + c`. Deinterleaving is the strided permutation that
//! groups each channel into its own plane:
//!
//! ```text
//! [r0 g0 b0 r1 g1 b1 ...]  --planar indices-->  [r0 r1 ... | g0 g1 ... | b0 b1 ...]
//! idx[c * P + i] = i * C + c
//! ```
//!
//! Input is processed in blocks of [`BLOCK_PIXELS`] pixels. On NEON, byte
//! buffers of 2 to 4 channels use `ld2`/`ld3`/`ld4` structure loads per
//! block; everything else permutes each block by the planar index vector.
//!
//! # Trailing elements
//!
//! A buffer whose length is not a multiple of the channel count is always
//! rejected. What happens to a trailing partial block is set by
//! [`TailPolicy`]:
//!
//! | Policy | Trailing partial block |
//! |--------|------------------------|
//! | `Process` (default) | deinterleaved with a shorter planar index vector |
//! | `Skip` | left out; its length is reported by [`Deinterleaved::unprocessed`] |
//! | `Reject` | [`LaneError::InvalidLength`] |

use std::fmt;
use std::str::FromStr;

use crate::arch::Dispatcher;
use crate::core::error::{LaneError, LengthRule};
use crate::core::lane::Lane;

#[cfg(test)]
mod tests;

/// Pixels per block; the width of one NEON structure load.
pub const BLOCK_PIXELS: usize = 16;

/// What to do with pixels that do not fill a whole block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum TailPolicy {
    /// Deinterleave every pixel.
    #[default]
    Process,
    /// Deinterleave whole blocks only and report the remainder.
    Skip,
    /// Fail unless the buffer is a whole number of blocks.
    Reject,
}

impl TailPolicy {
    /// Every policy.
    pub const ALL: [TailPolicy; 3] = [TailPolicy::Process, TailPolicy::Skip, TailPolicy::Reject];

    /// Lower-case name used in configuration and reports.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            TailPolicy::Process => "process",
            TailPolicy::Skip => "skip",
            TailPolicy::Reject => "reject",
        }
    }
}

impl fmt::Display for TailPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TailPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown tail policy `{s}` (expected process, skip or reject)"))
    }
}

/// Channel planes produced by a deinterleave.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Deinterleaved<T> {
    planes: Vec<Vec<T>>,
    unprocessed: usize,
}

impl<T: Lane> Deinterleaved<T> {
    /// Plane `c`, or `None` if `c` is not a channel.
    #[must_use]
    pub fn channel(&self, c: usize) -> Option<&[T]> {
        self.planes.get(c).map(Vec::as_slice)
    }

    /// All planes, in channel order.
    #[must_use]
    pub fn planes(&self) -> &[Vec<T>] {
        &self.planes
    }

    /// Number of channels.
    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.planes.len()
    }

    /// Pixels per plane.
    #[must_use]
    pub fn pixels(&self) -> usize {
        self.planes.first().map_or(0, Vec::len)
    }

    /// Trailing input elements that were not deinterleaved
    /// (non-zero only under [`TailPolicy::Skip`]).
    #[must_use]
    pub fn unprocessed(&self) -> usize {
        self.unprocessed
    }

    /// Consumes the result, returning the planes.
    #[must_use]
    pub fn into_planes(self) -> Vec<Vec<T>> {
        self.planes
    }

    /// Re-interleaves the planes (the unprocessed tail is not included).
    #[must_use]
    pub fn interleave(&self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.pixels() * self.channel_count());
        for i in 0..self.pixels() {
            out.extend(self.planes.iter().map(|plane| plane[i]));
        }
        out
    }
}

/// Deinterleaver configured with a channel count, tail policy and backend.
///
/// # Example
///
/// ```
/// use lanes::{Deinterleaver, TailPolicy};
///
/// let rgb: Vec<u8> = (0..60).collect(); // 20 pixels: one block and 4 left over
/// let planes = Deinterleaver::new(3)
///     .unwrap()
///     .with_tail(TailPolicy::Skip)
///     .run(&rgb)
///     .unwrap();
/// assert_eq!(planes.pixels(), 16);
/// assert_eq!(planes.unprocessed(), 12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deinterleaver {
    channels: usize,
    block_len: usize,
    tail: TailPolicy,
    dispatcher: Dispatcher,
}

impl Deinterleaver {
    /// Deinterleaver for `channels` channels on the process-wide backend.
    ///
    /// # Errors
    ///
    /// Returns [`LaneError::InvalidChannelCount`] if `channels == 0` or if
    /// one block of `channels` channels cannot be addressed by `u32` indices.
    pub fn new(channels: usize) -> Result<Self, LaneError> {
        let block_len = BLOCK_PIXELS
            .checked_mul(channels)
            .filter(|&n| n != 0 && u32::try_from(n - 1).is_ok())
            .ok_or(LaneError::InvalidChannelCount)?;
        Ok(Self {
            channels,
            block_len,
            tail: TailPolicy::default(),
            dispatcher: *Dispatcher::global(),
        })
    }

    /// Sets the tail policy.
    #[must_use]
    pub fn with_tail(mut self, tail: TailPolicy) -> Self {
        self.tail = tail;
        self
    }

    /// Runs on `dispatcher` instead of the process-wide one.
    #[must_use]
    pub fn with_dispatcher(mut self, dispatcher: Dispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    /// Channel count.
    #[must_use]
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Tail policy.
    #[must_use]
    pub fn tail(&self) -> TailPolicy {
        self.tail
    }

    /// Elements per whole block.
    #[must_use]
    pub fn block_len(&self) -> usize {
        self.block_len
    }

    /// Splits `interleaved` into channel planes.
    ///
    /// # Errors
    ///
    /// - [`LaneError::InvalidLength`] if the length is not a multiple of
    ///   the channel count
    /// - [`LaneError::InvalidLength`] under [`TailPolicy::Reject`] if the
    ///   length is not a multiple of [`Deinterleaver::block_len`]
    pub fn run<T: Lane>(&self, interleaved: &[T]) -> Result<Deinterleaved<T>, LaneError> {
        let channels = self.channels;
        let len = interleaved.len();
        if len % channels != 0 {
            return Err(LaneError::InvalidLength {
                actual: len,
                rule: LengthRule::MultipleOf(channels),
            });
        }

        let block_len = self.block_len;
        let tail_len = len % block_len;
        if tail_len != 0 && self.tail == TailPolicy::Reject {
            return Err(LaneError::InvalidLength {
                actual: len,
                rule: LengthRule::MultipleOf(block_len),
            });
        }

        let pixels = match self.tail {
            TailPolicy::Skip => (len - tail_len) / channels,
            TailPolicy::Process | TailPolicy::Reject => len / channels,
        };
        let mut planes: Vec<Vec<T>> = (0..channels).map(|_| Vec::with_capacity(pixels)).collect();

        let mut block_indices = None;
        let mut blocks = interleaved.chunks_exact(block_len);
        for block in &mut blocks {
            let backend = self.dispatcher.backend();
            if !T::deinterleave_accelerated(backend, block, channels, &mut planes) {
                let indices =
                    block_indices.get_or_insert_with(|| planar_indices(BLOCK_PIXELS, channels));
                let planar = self.dispatcher.permute_slice(block, indices)?;
                split_planar(&planar, &mut planes);
            }
        }

        let tail = blocks.remainder();
        let unprocessed = match self.tail {
            TailPolicy::Skip => tail.len(),
            TailPolicy::Process | TailPolicy::Reject => {
                if !tail.is_empty() {
                    let indices = planar_indices(tail.len() / channels, channels);
                    let planar = self.dispatcher.permute_slice(tail, &indices)?;
                    split_planar(&planar, &mut planes);
                }
                0
            }
        };

        if unprocessed != 0 {
            log::debug!("deinterleave skipped {unprocessed} trailing elements of {len}");
        }

        Ok(Deinterleaved {
            planes,
            unprocessed,
        })
    }
}

/// Splits `interleaved` into `channels` planes, processing every pixel.
///
/// # Errors
///
/// - [`LaneError::InvalidChannelCount`] if `channels` is zero or too large
///   for one block to be indexed (see [`Deinterleaver::new`])
/// - [`LaneError::InvalidLength`] if the length is not a multiple of `channels`
pub fn deinterleave<T: Lane>(
    interleaved: &[T],
    channels: usize,
) -> Result<Deinterleaved<T>, LaneError> {
    Deinterleaver::new(channels)?.run(interleaved)
}

/// Interleaves equal-length planes: `out[i * C + c] = planes[c][i]`.
///
/// # Errors
///
/// - [`LaneError::InvalidChannelCount`] if `planes` is empty
/// - [`LaneError::InvalidLength`] if the planes differ in length
///
/// # Example
///
/// ```
/// use lanes::interleave;
///
/// let rgb = interleave(&[&[1u8, 2][..], &[3, 4], &[5, 6]]).unwrap();
/// assert_eq!(rgb, vec![1, 3, 5, 2, 4, 6]);
/// ```
pub fn interleave<T: Lane>(planes: &[&[T]]) -> Result<Vec<T>, LaneError> {
    let first = planes.first().ok_or(LaneError::InvalidChannelCount)?;
    let pixels = first.len();
    if let Some(bad) = planes.iter().find(|p| p.len() != pixels) {
        return Err(LaneError::length_mismatch(pixels, bad.len()));
    }
    let mut out = Vec::with_capacity(pixels * planes.len());
    for i in 0..pixels {
        out.extend(planes.iter().map(|plane| plane[i]));
    }
    Ok(out)
}

/// Planar index vector for `pixels` pixels of `channels` channels:
/// `idx[c * pixels + i] = i * channels + c`.
#[must_use]
pub fn planar_indices(pixels: usize, channels: usize) -> Vec<u32> {
    (0..channels)
        .flat_map(|c| (0..pixels).map(move |i| (i * channels + c) as u32))
        .collect()
}

/// Appends consecutive equal runs of `planar` to each plane.
fn split_planar<T: Lane>(planar: &[T], planes: &mut [Vec<T>]) {
    let run = planar.len() / planes.len();
    for (plane, chunk) in planes.iter_mut().zip(planar.chunks_exact(run.max(1))) {
        plane.extend_from_slice(chunk);
    }
}
