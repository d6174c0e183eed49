//! 16 x 8-bit table lookup via `pshufb`.

use std::arch::x86_64::*;

/// `out[i] = input[indices[i] & 0x0F]`.
///
/// The index bytes are masked to their low nibble first: `pshufb` would
/// otherwise zero every lane whose index has bit 7 set.
///
/// # Safety
///
/// The CPU must support SSSE3.
#[inline]
#[target_feature(enable = "ssse3")]
pub unsafe fn shuffle_u8x16(input: &[u8; 16], indices: &[u32; 16]) -> [u8; 16] {
    let index_bytes = indices.map(|i| i as u8);
    let table = _mm_loadu_si128(input.as_ptr().cast());
    let control = _mm_and_si128(
        _mm_loadu_si128(index_bytes.as_ptr().cast()),
        _mm_set1_epi8(0x0F),
    );
    let mut out = [0u8; 16];
    _mm_storeu_si128(out.as_mut_ptr().cast(), _mm_shuffle_epi8(table, control));
    out
}
