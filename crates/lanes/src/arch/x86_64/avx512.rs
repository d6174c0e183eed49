//! 16 x 32-bit cross-lane permutes via 512-bit `vpermd` / `vpermps`.

use std::arch::x86_64::*;

/// `out[i] = input[indices[i] & 0xF]` on 32-bit integers.
///
/// # Safety
///
/// The CPU must support AVX-512F.
#[inline]
#[target_feature(enable = "avx512f")]
pub unsafe fn permute_u32x16(input: &[u32; 16], indices: &[u32; 16]) -> [u32; 16] {
    let values = _mm512_loadu_si512(input.as_ptr().cast());
    let control = _mm512_loadu_si512(indices.as_ptr().cast());
    let mut out = [0u32; 16];
    _mm512_storeu_si512(
        out.as_mut_ptr().cast(),
        _mm512_permutexvar_epi32(control, values),
    );
    out
}

/// `out[i] = input[indices[i] & 0xF]` on single-precision floats.
///
/// # Safety
///
/// The CPU must support AVX-512F.
#[inline]
#[target_feature(enable = "avx512f")]
pub unsafe fn permute_f32x16(input: &[f32; 16], indices: &[u32; 16]) -> [f32; 16] {
    let values = _mm512_loadu_ps(input.as_ptr());
    let control = _mm512_loadu_si512(indices.as_ptr().cast());
    let mut out = [0.0f32; 16];
    _mm512_storeu_ps(out.as_mut_ptr(), _mm512_permutexvar_ps(control, values));
    out
}
