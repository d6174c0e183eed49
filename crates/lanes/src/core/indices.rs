//! Index vectors.
//!
//! An [`Indices<N>`] names, for each output lane, the input lane to read.
//! Entries are stored as given; wrap-around to `[0, N)` happens when the
//! permute runs, exactly as `vpermd` ignores the high index bits.

use std::ops::Index;

use super::error::{LaneError, LengthRule};

/// An index vector of `N` source positions.
///
/// # Example
///
/// ```
/// use lanes::Indices;
///
/// assert_eq!(Indices::<4>::identity().as_array(), &[0, 1, 2, 3]);
/// assert_eq!(Indices::<4>::reversed().as_array(), &[3, 2, 1, 0]);
/// assert_eq!(Indices::<4>::new([5, 6, 7, 8]).wrapped().as_array(), &[1, 2, 3, 0]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Indices<const N: usize> {
    lanes: [u32; N],
}

impl<const N: usize> Indices<N> {
    /// Wraps an array of source positions.
    #[inline]
    #[must_use]
    pub const fn new(lanes: [u32; N]) -> Self {
        Self { lanes }
    }

    /// Builds an index vector from a slice of exactly `N` entries.
    ///
    /// # Errors
    ///
    /// Returns [`LaneError::InvalidLength`] if `slice.len() != N`.
    pub fn try_from_slice(slice: &[u32]) -> Result<Self, LaneError> {
        let lanes: [u32; N] = slice
            .try_into()
            .map_err(|_| LaneError::length_mismatch(N, slice.len()))?;
        Ok(Self { lanes })
    }

    /// `[0, 1, ..., N-1]`.
    #[must_use]
    pub fn identity() -> Self {
        Self {
            lanes: std::array::from_fn(|i| i as u32),
        }
    }

    /// `[N-1, ..., 1, 0]`.
    #[must_use]
    pub fn reversed() -> Self {
        Self {
            lanes: std::array::from_fn(|i| (N - 1 - i) as u32),
        }
    }

    /// Rotation to the left by `k`: lane `i` reads `(i + k) mod N`.
    #[must_use]
    pub fn rotated(k: usize) -> Self {
        Self {
            lanes: std::array::from_fn(|i| ((i + k) % N) as u32),
        }
    }

    /// The planar (channel-major) order of an interleaved vector.
    ///
    /// Lane `c * (N / channels) + i` reads `i * channels + c`, so permuting
    /// an interleaved `[r0 g0 b0 r1 g1 b1 ...]` vector groups each channel
    /// into a contiguous run.
    ///
    /// # Errors
    ///
    /// - [`LaneError::InvalidChannelCount`] if `channels == 0`
    /// - [`LaneError::InvalidLength`] if `N` is not a multiple of `channels`
    pub fn planar(channels: usize) -> Result<Self, LaneError> {
        if channels == 0 {
            return Err(LaneError::InvalidChannelCount);
        }
        if N % channels != 0 {
            return Err(LaneError::InvalidLength {
                actual: N,
                rule: LengthRule::MultipleOf(channels),
            });
        }
        let per_channel = N / channels;
        Ok(Self {
            lanes: std::array::from_fn(|j| {
                let (c, i) = (j / per_channel, j % per_channel);
                (i * channels + c) as u32
            }),
        })
    }

    /// Returns a copy with every entry reduced into `[0, N)`.
    #[must_use]
    pub fn wrapped(&self) -> Self {
        if N == 0 {
            return *self;
        }
        Self {
            lanes: self.lanes.map(|i| (i as usize % N) as u32),
        }
    }

    /// Entry `i`, or `None` if `i >= N`.
    #[inline]
    #[must_use]
    pub fn get(&self, i: usize) -> Option<u32> {
        self.lanes.get(i).copied()
    }

    /// Borrows the entries as an array.
    #[inline]
    #[must_use]
    pub const fn as_array(&self) -> &[u32; N] {
        &self.lanes
    }

    /// Consumes the index vector, returning its entries.
    #[inline]
    #[must_use]
    pub const fn into_array(self) -> [u32; N] {
        self.lanes
    }

    /// Number of entries (always `N`).
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        N
    }

    /// True for the zero-width index vector.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        N == 0
    }
}

impl<const N: usize> From<[u32; N]> for Indices<N> {
    #[inline]
    fn from(lanes: [u32; N]) -> Self {
        Self::new(lanes)
    }
}

impl<const N: usize> TryFrom<&[u32]> for Indices<N> {
    type Error = LaneError;

    fn try_from(slice: &[u32]) -> Result<Self, Self::Error> {
        Self::try_from_slice(slice)
    }
}

impl<const N: usize> Index<usize> for Indices<N> {
    type Output = u32;

    #[inline]
    fn index(&self, i: usize) -> &u32 {
        &self.lanes[i]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_and_reversed() {
        assert_eq!(Indices::<8>::identity().into_array(), [0, 1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(Indices::<8>::reversed().into_array(), [7, 6, 5, 4, 3, 2, 1, 0]);
        assert!(Indices::<0>::identity().is_empty());
    }

    #[test]
    fn test_rotated() {
        assert_eq!(Indices::<4>::rotated(1).into_array(), [1, 2, 3, 0]);
        assert_eq!(Indices::<4>::rotated(6).into_array(), [2, 3, 0, 1]);
    }

    #[test]
    fn test_planar() {
        // rgb rgb rgb rgb -> rrrr gggg bbbb
        let p = Indices::<12>::planar(3).unwrap();
        assert_eq!(p.into_array(), [0, 3, 6, 9, 1, 4, 7, 10, 2, 5, 8, 11]);

        assert_eq!(Indices::<8>::planar(1).unwrap(), Indices::<8>::identity());
        assert_eq!(Indices::<8>::planar(0), Err(LaneError::InvalidChannelCount));
        assert!(matches!(
            Indices::<8>::planar(3),
            Err(LaneError::InvalidLength { actual: 8, .. })
        ));
    }

    #[test]
    fn test_wrapped() {
        let idx = Indices::new([8u32, 9, 15, 16, u32::MAX, 0, 1, 2]);
        assert_eq!(idx.wrapped().into_array(), [0, 1, 7, 0, 7, 0, 1, 2]);
        assert_eq!(Indices::<8>::reversed().wrapped(), Indices::reversed());
    }

    #[test]
    fn test_try_from_slice() {
        let idx = Indices::<3>::try_from_slice(&[2, 1, 0]).unwrap();
        assert_eq!(idx[0], 2);
        assert_eq!(idx.get(3), None);
        assert!(Indices::<3>::try_from_slice(&[0, 1]).is_err());
    }
}
