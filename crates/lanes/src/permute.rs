//! Permute entry points.
//!
//! [`permute`] runs on the process-wide [`Dispatcher`]; [`permute_scalar`]
//! always runs the portable kernel. Both compute
//! `result[i] = input[indices[i] mod N]` and never fail: an index outside
//! `[0, N)` wraps, it does not trap.

use crate::arch::{portable, Dispatcher};
use crate::core::error::LaneError;
use crate::core::indices::Indices;
use crate::core::lane::Lane;
use crate::core::vector::Vector;

/// Permutes `input` by `indices` on the process-wide backend.
///
/// # Example
///
/// ```
/// use lanes::{permute, Indices, Vector};
///
/// let v = Vector::new([1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
/// let out = permute(&v, &Indices::new([7, 6, 5, 4, 3, 2, 1, 0]));
/// assert_eq!(out.as_array(), &[8.0, 7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0]);
///
/// // Index 9 wraps to lane 1.
/// let out = permute(&v, &Indices::new([9, 9, 9, 9, 9, 9, 9, 9]));
/// assert!(out.iter().all(|x| x == 2.0));
/// ```
#[inline]
#[must_use]
pub fn permute<T: Lane, const N: usize>(
    input: &Vector<T, N>,
    indices: &Indices<N>,
) -> Vector<T, N> {
    Dispatcher::global().permute(input, indices)
}

/// Permutes `input` by `indices` with the portable kernel.
///
/// This is the reference every hardware kernel is tested against.
#[inline]
#[must_use]
pub fn permute_scalar<T: Lane, const N: usize>(
    input: &Vector<T, N>,
    indices: &Indices<N>,
) -> Vector<T, N> {
    Vector::new(portable::permute(input.as_array(), indices.as_array()))
}

/// Permutes a runtime-length slice: `result[i] = input[indices[i] mod len]`.
///
/// # Errors
///
/// Returns [`LaneError::InvalidLength`] if `input` and `indices` differ in
/// length.
///
/// # Example
///
/// ```
/// use lanes::permute_slice;
///
/// assert_eq!(permute_slice(&[1u16, 2, 3], &[2, 0, 1]).unwrap(), vec![3, 1, 2]);
/// assert!(permute_slice(&[1u16, 2, 3], &[0, 1]).is_err());
/// ```
pub fn permute_slice<T: Lane>(input: &[T], indices: &[u32]) -> Result<Vec<T>, LaneError> {
    Dispatcher::global().permute_slice(input, indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        let v = Vector::new([5u16, 6, 7, 8, 9]);
        assert_eq!(permute(&v, &Indices::identity()), v);
        assert_eq!(permute_scalar(&v, &Indices::identity()), v);
    }

    #[test]
    fn test_reversal_matches_reverse() {
        let v = Vector::new([1i32, -2, 3, -4, 5, -6, 7, -8]);
        assert_eq!(permute(&v, &Indices::reversed()), v.reverse());
    }

    #[test]
    fn test_out_of_range_wraps() {
        let v = Vector::new(std::array::from_fn::<u8, 16, _>(|i| i as u8 * 2));
        let idx = Indices::new(std::array::from_fn(|i| 16 * 7 + i as u32));
        assert_eq!(permute(&v, &idx), v);

        let idx = Indices::new([0x80u32; 16]);
        assert_eq!(permute(&v, &idx), Vector::splat(0));
    }

    #[test]
    fn test_duplicates_allowed() {
        let v = Vector::new([1.5f32, 2.5, 3.5, 4.5]);
        let out = permute(&v, &Indices::new([3, 3, 0, 0]));
        assert_eq!(out.into_array(), [4.5, 4.5, 1.5, 1.5]);
    }

    #[test]
    fn test_global_matches_scalar_i8() {
        let v = Vector::new(std::array::from_fn::<i8, 16, _>(|i| i as i8 - 8));
        let idx = Indices::new(std::array::from_fn(|i| (i as u32 * 11) ^ 0xF0));
        assert_eq!(permute(&v, &idx), permute_scalar(&v, &idx));
    }
}
