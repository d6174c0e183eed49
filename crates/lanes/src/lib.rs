//! Lanes - portable lane permutes with hardware fast paths
//!
//! A lane permute reorders the elements of a fixed-width vector according to
//! an index vector of the same width:
//!
//! ```text
//! result[i] = input[indices[i] mod N]
//! ```
//!
//! The wrap-around is the defined contract. It reproduces what `vpermd`
//! does with the low index bits and what `tbl` / `pshufb` do once their
//! index bytes have been masked, so every backend agrees on every input.
//!
//! # Backends
//!
//! | Backend | Vectors | Instruction |
//! |---------|---------|-------------|
//! | `Scalar` | any `N` | portable gather (reference) |
//! | `Ssse3` | 16 x 8-bit | `pshufb` |
//! | `Avx2` | 8 x 32-bit, 16 x 8-bit | `vpermd` / `vpermps` |
//! | `Avx512` | 16 x 32-bit (feature `avx512`) | `vpermd` / `vpermps` (zmm) |
//! | `Neon` | 16 x 8-bit, deinterleave 2..=4 | `tbl`, `ld2`/`ld3`/`ld4` |
//!
//! The backend is chosen once per process by [`Dispatcher::global`] and can
//! be pinned with the `LANES_BACKEND` environment variable.
//!
//! # Example: Reversal
//!
//! ```
//! use lanes::{permute, permute_scalar, Indices, Vector};
//!
//! let input = Vector::new([0u8, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15]);
//! let reversed = permute(&input, &Indices::reversed());
//! assert_eq!(reversed.as_array(), &[15, 14, 13, 12, 11, 10, 9, 8, 7, 6, 5, 4, 3, 2, 1, 0]);
//! assert_eq!(reversed, permute_scalar(&input, &Indices::reversed()));
//! ```
//!
//! # Example: RGB Deinterleave
//!
//! ```
//! use lanes::deinterleave;
//!
//! let rgb = [255u8, 0, 0, 0, 255, 0, 0, 0, 255, 128, 128, 128];
//! let planes = deinterleave(&rgb, 3).unwrap();
//! assert_eq!(planes.channel(0), Some(&[255, 0, 0, 128][..]));
//! assert_eq!(planes.channel(1), Some(&[0, 255, 0, 128][..]));
//! assert_eq!(planes.channel(2), Some(&[0, 0, 255, 128][..]));
//! ```

// Core data types (lane, vector, indices, error)
mod core;

// Architecture-specific kernels and backend dispatch
pub mod arch;

// Permute entry points
mod permute;

// Strided deinterleave built on permute
pub mod deinterleave;

// Block planning and C emission for long permutation patterns
pub mod plan;

pub use crate::core::error::{LaneError, LengthRule};
pub use crate::core::indices::Indices;
pub use crate::core::lane::Lane;
pub use crate::core::vector::Vector;

pub use arch::{Backend, BackendPreference, Dispatcher, BACKEND_ENV};
pub use deinterleave::{
    deinterleave, interleave, Deinterleaved, Deinterleaver, TailPolicy, BLOCK_PIXELS,
};
pub use permute::{permute, permute_scalar, permute_slice};
pub use plan::{emit_c, random_pattern, scatter_to_gather, Block, CTarget, Plan};

/// Prelude module for convenient imports.
///
/// ```
/// use lanes::prelude::*;
/// ```
pub mod prelude {
    pub use crate::arch::{Backend, Dispatcher};
    pub use crate::core::error::LaneError;
    pub use crate::core::indices::Indices;
    pub use crate::core::lane::Lane;
    pub use crate::core::vector::Vector;
    pub use crate::deinterleave::{deinterleave, interleave, TailPolicy};
    pub use crate::permute::{permute, permute_scalar, permute_slice};
    pub use crate::plan::{CTarget, Plan};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prelude_exports() {
        use crate::prelude::*;

        let v = Vector::new([1u32, 2, 3, 4, 5, 6, 7, 8]);
        let out = permute(&v, &Indices::identity());
        assert_eq!(out, v);
        assert!(Dispatcher::global().backend().is_available());
    }

    #[test]
    fn test_neon_example_reversal() {
        let input = Vector::new(std::array::from_fn::<u8, 16, _>(|i| i as u8));
        let out = permute(&input, &Indices::reversed());
        let expected: [u8; 16] = std::array::from_fn(|i| 15 - i as u8);
        assert_eq!(out.into_array(), expected);
    }

    #[test]
    fn test_avx2_example_float_reversal() {
        let src = Vector::new([1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
        let mask = Indices::new([7, 6, 5, 4, 3, 2, 1, 0]);
        let dst = permute(&src, &mask);
        assert_eq!(dst.as_array(), &[8.0, 7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0]);
    }
}
