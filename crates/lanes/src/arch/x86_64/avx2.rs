//! 8 x 32-bit cross-lane permutes via `vpermd` / `vpermps`.
//!
//! Both instructions read only the low three bits of each index, so the
//! wrap to `[0, 8)` is done by the hardware.

use std::arch::x86_64::*;

/// `out[i] = input[indices[i] & 0x7]` on 32-bit integers.
///
/// # Safety
///
/// The CPU must support AVX2.
#[inline]
#[target_feature(enable = "avx2")]
pub unsafe fn permute_u32x8(input: &[u32; 8], indices: &[u32; 8]) -> [u32; 8] {
    let values = _mm256_loadu_si256(input.as_ptr().cast());
    let control = _mm256_loadu_si256(indices.as_ptr().cast());
    let mut out = [0u32; 8];
    _mm256_storeu_si256(
        out.as_mut_ptr().cast(),
        _mm256_permutevar8x32_epi32(values, control),
    );
    out
}

/// `out[i] = input[indices[i] & 0x7]` on single-precision floats.
///
/// # Safety
///
/// The CPU must support AVX2.
#[inline]
#[target_feature(enable = "avx2")]
pub unsafe fn permute_f32x8(input: &[f32; 8], indices: &[u32; 8]) -> [f32; 8] {
    let values = _mm256_loadu_ps(input.as_ptr());
    let control = _mm256_loadu_si256(indices.as_ptr().cast());
    let mut out = [0.0f32; 8];
    _mm256_storeu_ps(out.as_mut_ptr(), _mm256_permutevar8x32_ps(values, control));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::portable;

    #[test]
    fn test_permute_u32x8_matches_portable() {
        if !is_x86_feature_detected!("avx2") {
            return;
        }
        let input = [0xefff_0001u32, 2, 3, 4, 5, 6, 7, 0xefff_0008];
        for indices in [
            [7u32, 6, 5, 4, 3, 2, 1, 0],
            [0; 8],
            [8, 9, 10, 11, u32::MAX, 13, 14, 15],
        ] {
            let fast = unsafe { permute_u32x8(&input, &indices) };
            assert_eq!(fast, portable::permute(&input, &indices));
        }
    }

    #[test]
    fn test_permute_f32x8_reverses() {
        if !is_x86_feature_detected!("avx2") {
            return;
        }
        let src = [1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let mask = [7u32, 6, 5, 4, 3, 2, 1, 0];
        let dst = unsafe { permute_f32x8(&src, &mask) };
        assert_eq!(dst, [8.0, 7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0]);
    }
}
