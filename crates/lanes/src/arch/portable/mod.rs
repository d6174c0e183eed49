//! Portable scalar permute kernels.
//!
//! These kernels work on any architecture without requiring SIMD support.
//! They are the reference implementation of the permute contract:
//!
//! ```text
//! result[i] = input[indices[i] mod N]
//! ```
//!
//! Every hardware kernel is cross-checked against them, and the dispatcher
//! falls back to them whenever no hardware kernel covers a lane type and
//! width.

/// Reduces `index` into `[0, len)`.
///
/// Power-of-two widths mask the low bits, which is what the hardware
/// permutes do; other widths use the remainder. `len` must be non-zero.
#[inline(always)]
pub fn wrap(index: u32, len: usize) -> usize {
    debug_assert!(len > 0);
    let index = index as usize;
    if len.is_power_of_two() {
        index & (len - 1)
    } else {
        index % len
    }
}

/// Fixed-width scalar permute.
#[inline]
#[must_use]
pub fn permute<T: Copy, const N: usize>(input: &[T; N], indices: &[u32; N]) -> [T; N] {
    std::array::from_fn(|i| input[wrap(indices[i], N)])
}

/// Runtime-width scalar gather: `out[i] = input[indices[i] mod input.len()]`.
///
/// The caller checks `input.len() == indices.len()`; an empty input yields
/// an empty output.
#[must_use]
pub fn gather<T: Copy>(input: &[T], indices: &[u32]) -> Vec<T> {
    if input.is_empty() {
        return Vec::new();
    }
    indices.iter().map(|&i| input[wrap(i, input.len())]).collect()
}

/// Scalar deinterleave of `block` into `out.len()` channels, appending.
///
/// `block.len()` must be a multiple of `out.len()`.
pub fn deinterleave_into<T: Copy>(block: &[T], out: &mut [Vec<T>]) {
    let channels = out.len();
    for pixel in block.chunks_exact(channels) {
        for (plane, &value) in out.iter_mut().zip(pixel) {
            plane.push(value);
        }
    }
}
