//! Lane element types.
//!
//! A [`Lane`] is one fixed-width value inside a vector. The trait is sealed:
//! each implementation routes to the hardware kernels that exist for its
//! width, and the kernels are only reachable through a [`Dispatcher`] whose
//! backend has been checked against the running CPU.
//!
//! [`Dispatcher`]: crate::arch::Dispatcher

use std::fmt::Debug;

use crate::arch::{self, Backend};

/// Element type that can occupy a vector lane.
///
/// Implemented for `u8`, `i8`, `u16`, `u32`, `i32` and `f32`.
pub trait Lane: Copy + Default + PartialEq + Debug + Send + Sync + 'static + sealed::Sealed {
    /// Width of one lane in bits.
    const BITS: u32;

    /// Short type name, as used on the command line (`"u8"`, `"f32"`, ...).
    const NAME: &'static str;
}

pub(crate) mod sealed {
    use crate::arch::Backend;

    /// Hardware hooks. Private so that callers cannot pass an unchecked
    /// backend into a `target_feature` kernel.
    pub trait Sealed: Sized {
        /// Permute on `backend` if it has a kernel for `(Self, N)`.
        #[inline]
        fn permute_accelerated<const N: usize>(
            backend: Backend,
            input: &[Self; N],
            indices: &[u32; N],
        ) -> Option<[Self; N]> {
            let _ = (backend, input, indices);
            None
        }

        /// Deinterleave one block of `16 * channels` elements on `backend`,
        /// appending to `out`. Returns `false` when no kernel applies.
        #[inline]
        fn deinterleave_accelerated(
            backend: Backend,
            block: &[Self],
            channels: usize,
            out: &mut [Vec<Self>],
        ) -> bool {
            let _ = (backend, block, channels, out);
            false
        }
    }
}

// =============================================================================
// Byte lanes
// =============================================================================

impl Lane for u8 {
    const BITS: u32 = 8;
    const NAME: &'static str = "u8";
}

impl sealed::Sealed for u8 {
    #[inline]
    fn permute_accelerated<const N: usize>(
        backend: Backend,
        input: &[Self; N],
        indices: &[u32; N],
    ) -> Option<[Self; N]> {
        arch::permute_bytes(backend, input, indices)
    }

    #[inline]
    fn deinterleave_accelerated(
        backend: Backend,
        block: &[Self],
        channels: usize,
        out: &mut [Vec<Self>],
    ) -> bool {
        arch::deinterleave_bytes(backend, block, channels, out)
    }
}

impl Lane for i8 {
    const BITS: u32 = 8;
    const NAME: &'static str = "i8";
}

impl sealed::Sealed for i8 {
    #[inline]
    fn permute_accelerated<const N: usize>(
        backend: Backend,
        input: &[Self; N],
        indices: &[u32; N],
    ) -> Option<[Self; N]> {
        let bytes = input.map(|x| x as u8);
        arch::permute_bytes(backend, &bytes, indices).map(|out| out.map(|x| x as i8))
    }
}

// =============================================================================
// Half-word lanes (portable only)
// =============================================================================

impl Lane for u16 {
    const BITS: u32 = 16;
    const NAME: &'static str = "u16";
}

impl sealed::Sealed for u16 {}

// =============================================================================
// Double-word lanes
// =============================================================================

impl Lane for u32 {
    const BITS: u32 = 32;
    const NAME: &'static str = "u32";
}

impl sealed::Sealed for u32 {
    #[inline]
    fn permute_accelerated<const N: usize>(
        backend: Backend,
        input: &[Self; N],
        indices: &[u32; N],
    ) -> Option<[Self; N]> {
        arch::permute_dwords(backend, input, indices)
    }
}

impl Lane for i32 {
    const BITS: u32 = 32;
    const NAME: &'static str = "i32";
}

impl sealed::Sealed for i32 {
    #[inline]
    fn permute_accelerated<const N: usize>(
        backend: Backend,
        input: &[Self; N],
        indices: &[u32; N],
    ) -> Option<[Self; N]> {
        let dwords = input.map(|x| x as u32);
        arch::permute_dwords(backend, &dwords, indices).map(|out| out.map(|x| x as i32))
    }
}

impl Lane for f32 {
    const BITS: u32 = 32;
    const NAME: &'static str = "f32";
}

impl sealed::Sealed for f32 {
    #[inline]
    fn permute_accelerated<const N: usize>(
        backend: Backend,
        input: &[Self; N],
        indices: &[u32; N],
    ) -> Option<[Self; N]> {
        arch::permute_floats(backend, input, indices)
    }
}
