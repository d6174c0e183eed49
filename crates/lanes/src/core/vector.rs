//! Fixed-width lane vectors.

use std::ops::Index;

use super::error::LaneError;
use super::lane::Lane;

/// An immutable vector of `N` lanes of type `T`.
///
/// The width is part of the type, so a permute between a `Vector<T, N>` and
/// an [`Indices<N>`](crate::Indices) can never disagree on length. Building a
/// vector from a runtime slice checks the length once, up front.
///
/// # Example
///
/// ```
/// use lanes::Vector;
///
/// let v = Vector::new([1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
/// assert_eq!(v.len(), 8);
/// assert_eq!(v[3], 4.0);
///
/// let err = Vector::<f32, 8>::try_from_slice(&[1.0, 2.0]).unwrap_err();
/// assert!(matches!(err, lanes::LaneError::InvalidLength { actual: 2, .. }));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vector<T: Lane, const N: usize> {
    lanes: [T; N],
}

impl<T: Lane, const N: usize> Vector<T, N> {
    /// Number of lanes.
    pub const LANES: usize = N;

    /// Wraps an array of lanes.
    #[inline]
    #[must_use]
    pub const fn new(lanes: [T; N]) -> Self {
        Self { lanes }
    }

    /// Builds a vector with every lane set to `value`.
    #[inline]
    #[must_use]
    pub fn splat(value: T) -> Self {
        Self { lanes: [value; N] }
    }

    /// Builds a vector from a slice of exactly `N` elements.
    ///
    /// # Errors
    ///
    /// Returns [`LaneError::InvalidLength`] if `slice.len() != N`.
    pub fn try_from_slice(slice: &[T]) -> Result<Self, LaneError> {
        let lanes: [T; N] = slice
            .try_into()
            .map_err(|_| LaneError::length_mismatch(N, slice.len()))?;
        Ok(Self { lanes })
    }

    /// Number of lanes (always `N`).
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        N
    }

    /// True for the zero-width vector.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    /// Returns lane `i`, or `None` if `i >= N`.
    #[inline]
    #[must_use]
    pub fn get(&self, i: usize) -> Option<T> {
        self.lanes.get(i).copied()
    }

    /// Borrows the lanes as an array.
    #[inline]
    #[must_use]
    pub const fn as_array(&self) -> &[T; N] {
        &self.lanes
    }

    /// Borrows the lanes as a slice.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.lanes
    }

    /// Consumes the vector, returning its lanes.
    #[inline]
    #[must_use]
    pub const fn into_array(self) -> [T; N] {
        self.lanes
    }

    /// Iterates over the lanes in order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.lanes.iter().copied()
    }

    /// Returns a vector with the lanes in reverse order.
    #[must_use]
    pub fn reverse(&self) -> Self {
        let mut lanes = self.lanes;
        lanes.reverse();
        Self { lanes }
    }
}

impl<T: Lane, const N: usize> From<[T; N]> for Vector<T, N> {
    #[inline]
    fn from(lanes: [T; N]) -> Self {
        Self::new(lanes)
    }
}

impl<T: Lane, const N: usize> From<Vector<T, N>> for [T; N] {
    #[inline]
    fn from(v: Vector<T, N>) -> Self {
        v.lanes
    }
}

impl<T: Lane, const N: usize> TryFrom<&[T]> for Vector<T, N> {
    type Error = LaneError;

    fn try_from(slice: &[T]) -> Result<Self, Self::Error> {
        Self::try_from_slice(slice)
    }
}

impl<T: Lane, const N: usize> AsRef<[T]> for Vector<T, N> {
    #[inline]
    fn as_ref(&self) -> &[T] {
        &self.lanes
    }
}

impl<T: Lane, const N: usize> Index<usize> for Vector<T, N> {
    type Output = T;

    #[inline]
    fn index(&self, i: usize) -> &T {
        &self.lanes[i]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::LengthRule;

    #[test]
    fn test_try_from_slice() {
        let v = Vector::<u8, 4>::try_from_slice(&[1, 2, 3, 4]).unwrap();
        assert_eq!(v.as_array(), &[1, 2, 3, 4]);

        let err = Vector::<u8, 4>::try_from_slice(&[1, 2, 3]).unwrap_err();
        assert_eq!(
            err,
            LaneError::InvalidLength {
                actual: 3,
                rule: LengthRule::Exactly(4)
            }
        );

        let err = Vector::<u8, 4>::try_from_slice(&[0; 5]).unwrap_err();
        assert!(matches!(err, LaneError::InvalidLength { actual: 5, .. }));
    }

    #[test]
    fn test_accessors() {
        let v = Vector::new([10u32, 20, 30]);
        assert_eq!(v.len(), 3);
        assert!(!v.is_empty());
        assert_eq!(v.get(1), Some(20));
        assert_eq!(v.get(3), None);
        assert_eq!(v[2], 30);
        assert_eq!(v.iter().sum::<u32>(), 60);
        assert_eq!(v.reverse().into_array(), [30, 20, 10]);
        assert_eq!(Vector::<u32, 3>::LANES, 3);
    }

    #[test]
    fn test_splat_and_conversions() {
        let v = Vector::<i32, 8>::splat(-1);
        assert!(v.iter().all(|x| x == -1));

        let arr: [i32; 8] = v.into();
        assert_eq!(arr, [-1; 8]);

        let w: Vector<i32, 8> = arr.into();
        assert_eq!(w, v);
    }

    #[test]
    fn test_zero_width() {
        let v = Vector::<f32, 0>::new([]);
        assert!(v.is_empty());
        assert_eq!(v.iter().count(), 0);
    }
}
