//! x86_64 permute kernels.
//!
//! # Instructions
//!
//! ```text
//! pshufb  xmm   16 x 8-bit   within one 128-bit lane, index & 0x0F after masking
//! vpermd  ymm    8 x 32-bit  full 256-bit register, index & 0x7
//! vpermps ymm    8 x f32     full 256-bit register, index & 0x7
//! vpermd  zmm   16 x 32-bit  full 512-bit register, index & 0xF (feature `avx512`)
//! ```
//!
//! `pshufb` zeroes a lane when bit 7 of its index byte is set, so the byte
//! kernel masks the indices to their low nibble before shuffling.
//!
//! # CPU Feature Requirements
//!
//! Every kernel is an `unsafe fn` compiled with `#[target_feature]`. They are
//! only reached through a [`Dispatcher`](crate::Dispatcher), which refuses
//! backends whose features [`CpuFeatures`] did not detect.

pub mod avx2;
#[cfg(feature = "avx512")]
pub mod avx512;
mod features;
pub mod ssse3;

pub use features::CpuFeatures;
