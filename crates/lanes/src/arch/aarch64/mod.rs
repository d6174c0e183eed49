//! ARM aarch64 kernels with NEON SIMD support.
//!
//! NEON is mandatory on ARMv8-A, so detection is a formality on every
//! aarch64 target Rust supports; it is still checked so the dispatcher treats
//! all architectures alike.
//!
//! # Instructions
//!
//! ```text
//! tbl  v.16b            16 x 8-bit table lookup, index >= 16 yields 0
//! ld2/ld3/ld4 v.16b     structure loads that split 2/3/4 interleaved channels
//! ```
//!
//! `tbl` zeroes out-of-range lanes instead of wrapping, so the lookup masks
//! the indices to their low nibble first.

use std::arch::aarch64::*;
use std::sync::OnceLock;

static DETECTED: OnceLock<CpuFeatures> = OnceLock::new();

/// CPU feature detection for aarch64.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CpuFeatures {
    /// Advanced SIMD (NEON).
    pub neon: bool,
}

impl CpuFeatures {
    /// Detect CPU features at runtime.
    #[must_use]
    pub fn detect() -> Self {
        Self {
            neon: std::arch::is_aarch64_feature_detected!("neon"),
        }
    }

    /// Cached result of [`CpuFeatures::detect`].
    #[must_use]
    pub fn get() -> Self {
        *DETECTED.get_or_init(Self::detect)
    }
}

impl Default for CpuFeatures {
    fn default() -> Self {
        Self::get()
    }
}

/// Pixels per structure load.
const BLOCK_PIXELS: usize = 16;

/// `out[i] = input[indices[i] & 0x0F]` via `tbl`.
///
/// # Safety
///
/// The CPU must support NEON.
#[inline]
#[target_feature(enable = "neon")]
pub unsafe fn lookup_u8x16(input: &[u8; 16], indices: &[u32; 16]) -> [u8; 16] {
    let index_bytes = indices.map(|i| i as u8);
    let table = vld1q_u8(input.as_ptr());
    let control = vandq_u8(vld1q_u8(index_bytes.as_ptr()), vdupq_n_u8(0x0F));
    let mut out = [0u8; 16];
    vst1q_u8(out.as_mut_ptr(), vqtbl1q_u8(table, control));
    out
}

/// Splits 16 pixels of 2 interleaved channels.
///
/// # Safety
///
/// The CPU must support NEON.
#[inline]
#[target_feature(enable = "neon")]
pub unsafe fn deinterleave2_u8x16(block: &[u8; 32]) -> [[u8; 16]; 2] {
    let v = vld2q_u8(block.as_ptr());
    let mut out = [[0u8; 16]; 2];
    vst1q_u8(out[0].as_mut_ptr(), v.0);
    vst1q_u8(out[1].as_mut_ptr(), v.1);
    out
}

/// Splits 16 pixels of 3 interleaved channels (RGB).
///
/// # Safety
///
/// The CPU must support NEON.
#[inline]
#[target_feature(enable = "neon")]
pub unsafe fn deinterleave3_u8x16(block: &[u8; 48]) -> [[u8; 16]; 3] {
    let v = vld3q_u8(block.as_ptr());
    let mut out = [[0u8; 16]; 3];
    vst1q_u8(out[0].as_mut_ptr(), v.0);
    vst1q_u8(out[1].as_mut_ptr(), v.1);
    vst1q_u8(out[2].as_mut_ptr(), v.2);
    out
}

/// Splits 16 pixels of 4 interleaved channels (RGBA).
///
/// # Safety
///
/// The CPU must support NEON.
#[inline]
#[target_feature(enable = "neon")]
pub unsafe fn deinterleave4_u8x16(block: &[u8; 64]) -> [[u8; 16]; 4] {
    let v = vld4q_u8(block.as_ptr());
    let mut out = [[0u8; 16]; 4];
    vst1q_u8(out[0].as_mut_ptr(), v.0);
    vst1q_u8(out[1].as_mut_ptr(), v.1);
    vst1q_u8(out[2].as_mut_ptr(), v.2);
    vst1q_u8(out[3].as_mut_ptr(), v.3);
    out
}

/// Deinterleaves one block of `16 * channels` bytes, appending each channel
/// to `out`. Returns `false` for channel counts without a structure load.
///
/// Only called with the Neon backend, which implies NEON was detected.
pub(crate) fn deinterleave_block(block: &[u8], channels: usize, out: &mut [Vec<u8>]) -> bool {
    fn append<const C: usize>(planes: [[u8; BLOCK_PIXELS]; C], out: &mut [Vec<u8>]) {
        for (dst, plane) in out.iter_mut().zip(planes.iter()) {
            dst.extend_from_slice(plane);
        }
    }

    if out.len() != channels {
        return false;
    }
    // SAFETY: see above; each arm checks the block length via try_into.
    unsafe {
        match channels {
            2 => match block.try_into() {
                Ok(block) => append(deinterleave2_u8x16(block), out),
                Err(_) => return false,
            },
            3 => match block.try_into() {
                Ok(block) => append(deinterleave3_u8x16(block), out),
                Err(_) => return false,
            },
            4 => match block.try_into() {
                Ok(block) => append(deinterleave4_u8x16(block), out),
                Err(_) => return false,
            },
            _ => return false,
        }
    }
    true
}
