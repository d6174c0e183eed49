//! Architecture-specific permute kernels and backend dispatch.
//!
//! This module binds the lane permute contract to the instruction sets that
//! implement it natively. Every kernel computes exactly what the portable
//! kernel computes; the portable kernel is both the fallback and the oracle.
//!
//! # Supported Architectures
//!
//! - `portable`: Pure Rust scalar implementation (all architectures)
//! - `x86_64`: SSSE3 `pshufb`, AVX2 `vpermd`/`vpermps`, AVX-512 (feature `avx512`)
//! - `aarch64`: NEON `tbl` and `ld2`/`ld3`/`ld4` structure loads
//!
//! # Dispatch
//!
//! A [`Dispatcher`] carries one [`Backend`] that is known to run on this
//! CPU. [`Dispatcher::global`] resolves it once per process; after that each
//! permute costs a single `match` on the backend.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::core::error::LaneError;
use crate::core::indices::Indices;
use crate::core::lane::Lane;
use crate::core::vector::Vector;

// Portable scalar kernels (available on all architectures)
pub mod portable;

// x86_64-specific kernels
#[cfg(target_arch = "x86_64")]
pub mod x86_64;

// aarch64-specific kernels
#[cfg(target_arch = "aarch64")]
pub mod aarch64;

// Re-export CPU feature detection
#[cfg(target_arch = "x86_64")]
pub use x86_64::CpuFeatures;

#[cfg(target_arch = "aarch64")]
pub use aarch64::CpuFeatures;

/// Environment variable that pins the process-wide backend.
pub const BACKEND_ENV: &str = "LANES_BACKEND";

// =============================================================================
// Backend
// =============================================================================

/// A permute implementation strategy.
///
/// Variants exist on every target so configuration parses everywhere;
/// [`Backend::is_available`] says whether the running CPU can use one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Backend {
    /// Portable scalar gather.
    Scalar,
    /// x86 SSSE3 (`pshufb`, 16 x 8-bit).
    Ssse3,
    /// x86 AVX2 (`vpermd`/`vpermps`, 8 x 32-bit; `pshufb` for bytes).
    Avx2,
    /// x86 AVX-512F (`vpermd`/`vpermps` on zmm, 16 x 32-bit).
    Avx512,
    /// ARM NEON (`tbl`, 16 x 8-bit; `ld2`/`ld3`/`ld4` deinterleave).
    Neon,
}

impl Backend {
    /// Every backend, in preference order from least to most capable.
    pub const ALL: [Backend; 5] = [
        Backend::Scalar,
        Backend::Ssse3,
        Backend::Avx2,
        Backend::Avx512,
        Backend::Neon,
    ];

    /// Lower-case name used in configuration and reports.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Backend::Scalar => "scalar",
            Backend::Ssse3 => "ssse3",
            Backend::Avx2 => "avx2",
            Backend::Avx512 => "avx512",
            Backend::Neon => "neon",
        }
    }

    /// Whether the running CPU supports this backend.
    #[must_use]
    pub fn is_available(self) -> bool {
        match self {
            Backend::Scalar => true,
            #[cfg(target_arch = "x86_64")]
            Backend::Ssse3 => CpuFeatures::get().ssse3,
            #[cfg(target_arch = "x86_64")]
            Backend::Avx2 => CpuFeatures::get().avx2,
            #[cfg(all(target_arch = "x86_64", feature = "avx512"))]
            Backend::Avx512 => CpuFeatures::get().avx512f,
            #[cfg(target_arch = "aarch64")]
            Backend::Neon => CpuFeatures::get().neon,
            #[allow(unreachable_patterns)]
            _ => false,
        }
    }

    /// The most capable backend available on this CPU.
    #[must_use]
    pub fn detect() -> Self {
        Self::ALL
            .into_iter()
            .rev()
            .find(|b| b.is_available())
            .unwrap_or(Backend::Scalar)
    }

    /// All backends available on this CPU, scalar first.
    #[must_use]
    pub fn available() -> Vec<Backend> {
        Self::ALL.into_iter().filter(|b| b.is_available()).collect()
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Backend {
    type Err = LaneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|b| b.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| LaneError::ParseBackend(s.to_string()))
    }
}

/// Requested backend: detect the best one, or pin a specific one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BackendPreference {
    /// Use [`Backend::detect`].
    #[default]
    Auto,
    /// Use this backend if available.
    Fixed(Backend),
}

impl BackendPreference {
    /// Reads [`BACKEND_ENV`]. Unset means `Auto`; an unparsable value is
    /// logged and treated as `Auto`.
    #[must_use]
    pub fn from_env() -> Self {
        match std::env::var(BACKEND_ENV) {
            Ok(value) => value.parse().unwrap_or_else(|err| {
                log::warn!("ignoring {BACKEND_ENV}: {err}");
                BackendPreference::Auto
            }),
            Err(_) => BackendPreference::Auto,
        }
    }
}

impl FromStr for BackendPreference {
    type Err = LaneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("auto") {
            Ok(BackendPreference::Auto)
        } else {
            s.parse().map(BackendPreference::Fixed)
        }
    }
}

impl fmt::Display for BackendPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendPreference::Auto => f.write_str("auto"),
            BackendPreference::Fixed(b) => b.fmt(f),
        }
    }
}

// =============================================================================
// Dispatcher
// =============================================================================

static GLOBAL: OnceLock<Dispatcher> = OnceLock::new();

/// Runs permutes on one backend that is known to work on this CPU.
///
/// # Example
///
/// ```
/// use lanes::{Backend, Dispatcher, Indices, Vector};
///
/// let scalar = Dispatcher::scalar();
/// let best = Dispatcher::detect();
///
/// let v = Vector::new([10u32, 11, 12, 13, 14, 15, 16, 17]);
/// let idx = Indices::new([1, 0, 3, 2, 5, 4, 7, 6]);
/// assert_eq!(scalar.permute(&v, &idx), best.permute(&v, &idx));
/// assert_eq!(scalar.backend(), Backend::Scalar);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dispatcher {
    backend: Backend,
}

impl Dispatcher {
    /// Dispatcher using the portable kernels only.
    #[inline]
    #[must_use]
    pub const fn scalar() -> Self {
        Self {
            backend: Backend::Scalar,
        }
    }

    /// Dispatcher using the most capable backend on this CPU.
    #[must_use]
    pub fn detect() -> Self {
        Self {
            backend: Backend::detect(),
        }
    }

    /// Dispatcher pinned to `backend`.
    ///
    /// # Errors
    ///
    /// Returns [`LaneError::UnsupportedBackend`] if the CPU lacks the
    /// backend's features.
    pub fn with_backend(backend: Backend) -> Result<Self, LaneError> {
        if backend.is_available() {
            Ok(Self { backend })
        } else {
            Err(LaneError::UnsupportedBackend(backend))
        }
    }

    /// Dispatcher for a preference. A pinned backend the CPU cannot run is
    /// logged and replaced by the detected one.
    #[must_use]
    pub fn from_preference(preference: BackendPreference) -> Self {
        match preference {
            BackendPreference::Auto => Self::detect(),
            BackendPreference::Fixed(backend) => Self::with_backend(backend).unwrap_or_else(|err| {
                let fallback = Self::detect();
                log::warn!("{err}; falling back to {}", fallback.backend);
                fallback
            }),
        }
    }

    /// The process-wide dispatcher.
    ///
    /// Resolved on first use from [`BACKEND_ENV`] and never changed
    /// afterwards.
    pub fn global() -> &'static Dispatcher {
        GLOBAL.get_or_init(|| {
            let preference = BackendPreference::from_env();
            let dispatcher = Self::from_preference(preference);
            log::debug!(
                "lane permute backend: {} (requested {preference})",
                dispatcher.backend
            );
            dispatcher
        })
    }

    /// The backend this dispatcher runs on.
    #[inline]
    #[must_use]
    pub const fn backend(&self) -> Backend {
        self.backend
    }

    /// `result[i] = input[indices[i] mod N]`, on this dispatcher's backend.
    #[inline]
    #[must_use]
    pub fn permute<T: Lane, const N: usize>(
        &self,
        input: &Vector<T, N>,
        indices: &Indices<N>,
    ) -> Vector<T, N> {
        match T::permute_accelerated(self.backend, input.as_array(), indices.as_array()) {
            Some(lanes) => Vector::new(lanes),
            None => Vector::new(portable::permute(input.as_array(), indices.as_array())),
        }
    }

    /// Slice form of [`Dispatcher::permute`]: `result[i] = input[indices[i] mod len]`.
    ///
    /// Slices of 4, 8, 16 or 32 elements go through the fixed-width path
    /// and may hit a hardware kernel; other lengths use the portable gather.
    ///
    /// # Errors
    ///
    /// Returns [`LaneError::InvalidLength`] if the lengths differ.
    pub fn permute_slice<T: Lane>(
        &self,
        input: &[T],
        indices: &[u32],
    ) -> Result<Vec<T>, LaneError> {
        if input.len() != indices.len() {
            return Err(LaneError::length_mismatch(input.len(), indices.len()));
        }
        let fixed = match input.len() {
            4 => self.permute_fixed::<T, 4>(input, indices),
            8 => self.permute_fixed::<T, 8>(input, indices),
            16 => self.permute_fixed::<T, 16>(input, indices),
            32 => self.permute_fixed::<T, 32>(input, indices),
            _ => None,
        };
        Ok(fixed.unwrap_or_else(|| portable::gather(input, indices)))
    }

    fn permute_fixed<T: Lane, const N: usize>(
        &self,
        input: &[T],
        indices: &[u32],
    ) -> Option<Vec<T>> {
        let input = Vector::<T, N>::try_from_slice(input).ok()?;
        let indices = Indices::<N>::try_from_slice(indices).ok()?;
        Some(self.permute(&input, &indices).as_slice().to_vec())
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        *Self::global()
    }
}

// =============================================================================
// Kernel routing (called from the sealed Lane hooks)
// =============================================================================

/// Reinterprets `&[T; N]` as `&[T; M]` when `N == M`.
#[inline(always)]
fn exact<T, const N: usize, const M: usize>(a: &[T; N]) -> Option<&[T; M]> {
    a.as_slice().try_into().ok()
}

/// Converts `[T; M]` back to `[T; N]` when `N == M`.
#[inline(always)]
fn widen<T: Copy, const M: usize, const N: usize>(a: [T; M]) -> Option<[T; N]> {
    a.as_slice().try_into().ok()
}

/// 8-bit lanes. Only 16-lane vectors have a kernel.
#[allow(unused_variables)]
pub(crate) fn permute_bytes<const N: usize>(
    backend: Backend,
    input: &[u8; N],
    indices: &[u32; N],
) -> Option<[u8; N]> {
    if N != 16 {
        return None;
    }
    match backend {
        #[cfg(target_arch = "x86_64")]
        Backend::Ssse3 | Backend::Avx2 | Backend::Avx512 => {
            let (input, indices) = (exact::<_, N, 16>(input)?, exact::<_, N, 16>(indices)?);
            // SAFETY: the dispatcher only carries backends whose features were
            // detected, and every one of these implies SSSE3.
            widen(unsafe { x86_64::ssse3::shuffle_u8x16(input, indices) })
        }
        #[cfg(target_arch = "aarch64")]
        Backend::Neon => {
            let (input, indices) = (exact::<_, N, 16>(input)?, exact::<_, N, 16>(indices)?);
            // SAFETY: Neon is only selected when NEON was detected.
            widen(unsafe { aarch64::lookup_u8x16(input, indices) })
        }
        _ => None,
    }
}

/// 32-bit integer lanes.
#[allow(unused_variables)]
pub(crate) fn permute_dwords<const N: usize>(
    backend: Backend,
    input: &[u32; N],
    indices: &[u32; N],
) -> Option<[u32; N]> {
    match backend {
        #[cfg(target_arch = "x86_64")]
        Backend::Avx2 | Backend::Avx512 if N == 8 => {
            let (input, indices) = (exact::<_, N, 8>(input)?, exact::<_, N, 8>(indices)?);
            // SAFETY: AVX-512F implies AVX2; both were detected before selection.
            widen(unsafe { x86_64::avx2::permute_u32x8(input, indices) })
        }
        #[cfg(all(target_arch = "x86_64", feature = "avx512"))]
        Backend::Avx512 if N == 16 => {
            let (input, indices) = (exact::<_, N, 16>(input)?, exact::<_, N, 16>(indices)?);
            // SAFETY: Avx512 is only selected when avx512f was detected.
            widen(unsafe { x86_64::avx512::permute_u32x16(input, indices) })
        }
        _ => None,
    }
}

/// 32-bit float lanes.
#[allow(unused_variables)]
pub(crate) fn permute_floats<const N: usize>(
    backend: Backend,
    input: &[f32; N],
    indices: &[u32; N],
) -> Option<[f32; N]> {
    match backend {
        #[cfg(target_arch = "x86_64")]
        Backend::Avx2 | Backend::Avx512 if N == 8 => {
            let (input, indices) = (exact::<_, N, 8>(input)?, exact::<_, N, 8>(indices)?);
            // SAFETY: AVX-512F implies AVX2; both were detected before selection.
            widen(unsafe { x86_64::avx2::permute_f32x8(input, indices) })
        }
        #[cfg(all(target_arch = "x86_64", feature = "avx512"))]
        Backend::Avx512 if N == 16 => {
            let (input, indices) = (exact::<_, N, 16>(input)?, exact::<_, N, 16>(indices)?);
            // SAFETY: Avx512 is only selected when avx512f was detected.
            widen(unsafe { x86_64::avx512::permute_f32x16(input, indices) })
        }
        _ => None,
    }
}

/// Byte deinterleave of one `16 * channels` block. NEON only, 2 to 4 channels.
#[allow(unused_variables)]
pub(crate) fn deinterleave_bytes(
    backend: Backend,
    block: &[u8],
    channels: usize,
    out: &mut [Vec<u8>],
) -> bool {
    match backend {
        #[cfg(target_arch = "aarch64")]
        Backend::Neon => aarch64::deinterleave_block(block, channels, out),
        _ => false,
    }
}
