//! Block planning for long permutation patterns.
//!
//! A pattern of arbitrary length (`out[i] = in[pattern[i] mod len]`) rarely
//! maps onto one vector permute. The planner scans it left to right and
//! carves out aligned windows whose sources all lie inside the window
//! (*self-permuting* windows); each becomes one [`Block::Lanes`], runnable
//! as a single `Vector<T, W>` permute. Positions not covered by any window
//! become single-element [`Block::Move`]s.
//!
//! ```text
//! pattern  [3 2 1 0 | 4 9 6 7 ...]
//!           ^^^^^^^   one 4-lane block (indices 3 2 1 0)
//!                     4 -> Move, 9 -> Move, ...
//! ```
//!
//! Patterns written the other way round, as scatters
//! (`out[pattern[i]] = in[i]`), are inverted first by [`Plan::from_scatter`].
//!
//! Plans can be executed ([`Plan::apply`]) or rendered as C
//! ([`emit_c`]).

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::arch::{portable, Dispatcher};
use crate::core::error::{LaneError, LengthRule};
use crate::core::lane::Lane;

mod emit;

pub use emit::{emit_c, CTarget};

/// Window widths tried by [`Plan::build`], widest first.
pub const DEFAULT_WIDTHS: [usize; 3] = [16, 8, 4];

/// One step of a plan.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "lowercase"))]
pub enum Block {
    /// `out[offset + i] = in[offset + indices[i]]` for `i < width`.
    Lanes {
        /// First position of the window.
        offset: usize,
        /// Window width.
        width: usize,
        /// Window-relative source indices, each `< width`.
        indices: Vec<u32>,
    },
    /// `out[dst] = in[src]`.
    Move {
        /// Destination position.
        dst: usize,
        /// Source position.
        src: usize,
    },
}

impl Block {
    /// Number of output positions this block writes.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Block::Lanes { width, .. } => *width,
            Block::Move { .. } => 1,
        }
    }

    /// Always `false`; a block writes at least one position.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// A pattern decomposed into lane blocks and moves, in output order.
///
/// # Example
///
/// ```
/// use lanes::{Block, Plan};
///
/// let reversed: Vec<u32> = (0..16).rev().collect();
/// let plan = Plan::build(&reversed).unwrap();
/// assert_eq!(plan.blocks().len(), 1);
/// assert!(matches!(plan.blocks()[0], Block::Lanes { offset: 0, width: 16, .. }));
///
/// let input: Vec<u8> = (0..16).collect();
/// assert_eq!(plan.apply(&input).unwrap(), (0..16).rev().collect::<Vec<u8>>());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Plan {
    len: usize,
    blocks: Vec<Block>,
}

impl Plan {
    /// Plans `pattern` with [`DEFAULT_WIDTHS`].
    ///
    /// # Errors
    ///
    /// Returns [`LaneError::InvalidLength`] if `pattern` is empty.
    pub fn build(pattern: &[u32]) -> Result<Self, LaneError> {
        Self::with_widths(pattern, &DEFAULT_WIDTHS)
    }

    /// Plans `pattern`, trying windows of the given widths (widest first at
    /// each position). An empty `widths` plans every position as a move.
    ///
    /// # Errors
    ///
    /// - [`LaneError::InvalidLength`] if `pattern` is empty
    /// - [`LaneError::InvalidWidth`] if any width is zero
    pub fn with_widths(pattern: &[u32], widths: &[usize]) -> Result<Self, LaneError> {
        let len = pattern.len();
        if len == 0 {
            return Err(LaneError::InvalidLength {
                actual: 0,
                rule: LengthRule::NonEmpty,
            });
        }
        if widths.contains(&0) {
            return Err(LaneError::InvalidWidth);
        }

        let mut widths = widths.to_vec();
        widths.sort_unstable_by(|a, b| b.cmp(a));
        widths.dedup();

        let sources: Vec<usize> = pattern.iter().map(|&s| portable::wrap(s, len)).collect();
        let mut blocks = Vec::new();
        let mut p = 0;
        while p < len {
            let window = widths
                .iter()
                .copied()
                .find(|&w| p % w == 0 && p + w <= len && self_permutes(&sources[p..p + w], p));
            match window {
                Some(width) => {
                    let indices = sources[p..p + width].iter().map(|&s| (s - p) as u32).collect();
                    blocks.push(Block::Lanes {
                        offset: p,
                        width,
                        indices,
                    });
                    p += width;
                }
                None => {
                    blocks.push(Block::Move {
                        dst: p,
                        src: sources[p],
                    });
                    p += 1;
                }
            }
        }

        let plan = Self { len, blocks };
        log::trace!(
            "planned {len} positions into {} lane blocks and {} moves",
            plan.lane_blocks(),
            plan.move_count()
        );
        Ok(plan)
    }

    /// Plans a scatter-form `pattern` (`out[pattern[i] mod len] = in[i]`)
    /// by inverting it with [`scatter_to_gather`].
    ///
    /// # Example
    ///
    /// ```
    /// use lanes::Plan;
    ///
    /// let plan = Plan::from_scatter(&[2, 0, 1], &[]).unwrap();
    /// assert_eq!(plan.apply(&[10u8, 20, 30]).unwrap(), vec![20, 30, 10]);
    /// ```
    ///
    /// # Errors
    ///
    /// - [`LaneError::DuplicateTarget`] if two entries write the same position
    /// - otherwise as [`Plan::with_widths`]
    pub fn from_scatter(pattern: &[u32], widths: &[usize]) -> Result<Self, LaneError> {
        Self::with_widths(&scatter_to_gather(pattern)?, widths)
    }

    /// Plans `pattern` using only the vector width of `target`.
    ///
    /// # Errors
    ///
    /// Returns [`LaneError::InvalidLength`] if `pattern` is empty.
    pub fn for_target(pattern: &[u32], target: CTarget) -> Result<Self, LaneError> {
        Self::with_widths(pattern, target.widths())
    }

    /// Pattern length.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the plan covers no positions (never true for a built plan).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Blocks in output order.
    #[must_use]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Number of [`Block::Lanes`].
    #[must_use]
    pub fn lane_blocks(&self) -> usize {
        self.blocks
            .iter()
            .filter(|b| matches!(b, Block::Lanes { .. }))
            .count()
    }

    /// Number of [`Block::Move`]s.
    #[must_use]
    pub fn move_count(&self) -> usize {
        self.blocks.len() - self.lane_blocks()
    }

    /// Runs the plan on the process-wide backend.
    ///
    /// Equal to `permute_slice(input, pattern)` for the planned pattern.
    ///
    /// # Errors
    ///
    /// Returns [`LaneError::InvalidLength`] if `input.len()` differs from
    /// the pattern length.
    pub fn apply<T: Lane>(&self, input: &[T]) -> Result<Vec<T>, LaneError> {
        self.apply_with(Dispatcher::global(), input)
    }

    /// Runs the plan on `dispatcher`.
    ///
    /// # Errors
    ///
    /// Returns [`LaneError::InvalidLength`] if `input.len()` differs from
    /// the pattern length.
    pub fn apply_with<T: Lane>(
        &self,
        dispatcher: &Dispatcher,
        input: &[T],
    ) -> Result<Vec<T>, LaneError> {
        if input.len() != self.len {
            return Err(LaneError::length_mismatch(self.len, input.len()));
        }
        let mut out = vec![T::default(); self.len];
        for block in &self.blocks {
            match block {
                Block::Lanes {
                    offset,
                    width,
                    indices,
                } => {
                    let window = &input[*offset..offset + width];
                    let permuted = dispatcher.permute_slice(window, indices)?;
                    out[*offset..offset + width].copy_from_slice(&permuted);
                }
                Block::Move { dst, src } => out[*dst] = input[*src],
            }
        }
        Ok(out)
    }
}

/// Inverts a scatter-form pattern into the gather form the planner takes.
///
/// Entry `i` of a scatter writes `in[i]` to `out[pattern[i] mod len]`, so
/// the gather reads `out[j] = in[i]` for the `i` that writes `j`. The
/// wrapped entries must form a permutation of `0..len`.
///
/// # Errors
///
/// Returns [`LaneError::DuplicateTarget`] at the first entry that writes a
/// position already written.
pub fn scatter_to_gather(pattern: &[u32]) -> Result<Vec<u32>, LaneError> {
    let len = pattern.len();
    let mut gather: Vec<Option<u32>> = vec![None; len];
    for (i, &dst) in pattern.iter().enumerate() {
        let target = portable::wrap(dst, len);
        if gather[target].replace(i as u32).is_some() {
            return Err(LaneError::DuplicateTarget { position: i, target });
        }
    }
    // len entries into len distinct slots: every slot is filled.
    Ok(gather.into_iter().flatten().collect())
}

/// A uniformly shuffled permutation of `0..len`, reproducible from `seed`.
///
/// # Example
///
/// ```
/// use lanes::plan::random_pattern;
///
/// let mut pattern = random_pattern(64, 7);
/// assert_eq!(pattern, random_pattern(64, 7));
/// pattern.sort_unstable();
/// assert_eq!(pattern, (0..64).collect::<Vec<u32>>());
/// ```
#[must_use]
pub fn random_pattern(len: u32, seed: u64) -> Vec<u32> {
    let mut pattern: Vec<u32> = (0..len).collect();
    pattern.shuffle(&mut StdRng::seed_from_u64(seed));
    pattern
}

/// Whether every source in `window` (absolute positions) lies in
/// `[offset, offset + window.len())`.
fn self_permutes(window: &[usize], offset: usize) -> bool {
    let end = offset + window.len();
    window.iter().all(|&s| (offset..end).contains(&s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::Backend;

    #[test]
    fn test_reversed_16_is_one_block() {
        let pattern: Vec<u32> = (0..16).rev().collect();
        let plan = Plan::build(&pattern).unwrap();
        assert_eq!(
            plan.blocks(),
            &[Block::Lanes {
                offset: 0,
                width: 16,
                indices: pattern.clone(),
            }]
        );
        assert_eq!(plan.lane_blocks(), 1);
        assert_eq!(plan.move_count(), 0);
    }

    #[test]
    fn test_crossing_pattern_is_moves() {
        // Both halves read from each other: only the full 8-window closes,
        // and with 4-lane windows alone every position is a move.
        let pattern = [4u32, 5, 6, 7, 0, 1, 2, 3];
        let plan = Plan::build(&pattern).unwrap();
        assert_eq!(plan.lane_blocks(), 1);
        assert!(matches!(plan.blocks()[0], Block::Lanes { width: 8, .. }));

        let plan = Plan::with_widths(&pattern, &[4]).unwrap();
        assert_eq!(plan.lane_blocks(), 0);
        assert_eq!(plan.move_count(), 8);
        assert_eq!(plan.blocks()[0], Block::Move { dst: 0, src: 4 });
    }

    #[test]
    fn test_mixed_widths() {
        let pattern = [1u32, 0, 3, 2, 7, 6, 5, 4, 0, 9, 10, 11, 15, 14, 13, 12];
        // Every source lies in [0, 16), so the default widths take one block.
        let plan = Plan::build(&pattern).unwrap();
        assert_eq!(plan.lane_blocks(), 1);

        // Without 16: [0, 8) closes at width 8; position 8 reads from the
        // first half, so [8, 12) falls back to moves and [12, 16) closes at 4.
        let plan = Plan::with_widths(&pattern, &[8, 4]).unwrap();
        assert_eq!(plan.blocks()[0].len(), 8);
        assert_eq!(plan.lane_blocks(), 2);
        assert_eq!(plan.move_count(), 4);
        assert!(matches!(
            plan.blocks().last(),
            Some(Block::Lanes { offset: 12, width: 4, .. })
        ));
    }

    #[test]
    fn test_unaligned_tail_and_wrap() {
        // Length 6: one 4-window, then two moves; 7 wraps to 1.
        let pattern = [3u32, 2, 1, 0, 7, 4];
        let plan = Plan::build(&pattern).unwrap();
        assert_eq!(plan.lane_blocks(), 1);
        assert_eq!(
            &plan.blocks()[1..],
            &[Block::Move { dst: 4, src: 1 }, Block::Move { dst: 5, src: 4 }]
        );
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            Plan::build(&[]),
            Err(LaneError::InvalidLength {
                actual: 0,
                rule: LengthRule::NonEmpty,
            })
        );
        assert_eq!(Plan::with_widths(&[0, 1], &[4, 0]), Err(LaneError::InvalidWidth));

        let plan = Plan::build(&[0, 1, 2]).unwrap();
        assert_eq!(plan.apply(&[1u8, 2]), Err(LaneError::length_mismatch(3, 2)));
    }

    #[test]
    fn test_no_widths_is_all_moves() {
        let plan = Plan::with_widths(&[0, 1, 2, 3], &[]).unwrap();
        assert_eq!(plan.move_count(), 4);
        assert_eq!(plan.len(), 4);
        assert!(!plan.is_empty());
    }

    #[test]
    fn test_apply_matches_permute_slice_on_every_backend() {
        let pattern: Vec<u32> = (0..40u32)
            .map(|i| if i < 16 { 15 - i } else if i < 24 { 16 + (i + 3) % 8 } else { i * 7 })
            .collect();
        let input: Vec<f32> = (0..40).map(|i| i as f32 - 0.25).collect();
        let expected = Dispatcher::scalar().permute_slice(&input, &pattern).unwrap();
        let plan = Plan::build(&pattern).unwrap();
        assert_eq!(plan.lane_blocks(), 2);

        for backend in Backend::available() {
            let d = Dispatcher::with_backend(backend).unwrap();
            assert_eq!(plan.apply_with(&d, &input).unwrap(), expected, "{backend}");
        }
    }

    #[test]
    fn test_scatter_to_gather() {
        assert_eq!(scatter_to_gather(&[2, 0, 1]), Ok(vec![1, 2, 0]));
        assert_eq!(scatter_to_gather(&[5, 3, 4]), Ok(vec![1, 2, 0]));
        assert_eq!(scatter_to_gather(&[]), Ok(vec![]));
        assert_eq!(
            scatter_to_gather(&[1, 0, 4]),
            Err(LaneError::DuplicateTarget {
                position: 2,
                target: 1,
            })
        );
    }

    #[test]
    fn test_from_scatter_writes_each_input_to_its_target() {
        let scatter = random_pattern(40, 3);
        let input: Vec<u16> = (100..140).collect();
        let out = Plan::from_scatter(&scatter, &DEFAULT_WIDTHS)
            .unwrap()
            .apply(&input)
            .unwrap();
        for (i, &dst) in scatter.iter().enumerate() {
            assert_eq!(out[dst as usize], input[i]);
        }

        let reversed: Vec<u32> = (0..16).rev().collect();
        let plan = Plan::from_scatter(&reversed, &DEFAULT_WIDTHS).unwrap();
        assert_eq!(plan, Plan::build(&reversed).unwrap());
        assert!(Plan::from_scatter(&[0, 0], &[]).is_err());
    }

    #[test]
    fn test_random_pattern_is_permutation() {
        for len in [0u32, 1, 7, 16, 1000] {
            let pattern = random_pattern(len, u64::from(len));
            let mut sorted = pattern.clone();
            sorted.sort_unstable();
            assert_eq!(sorted, (0..len).collect::<Vec<_>>(), "len={len}");
            assert_eq!(scatter_to_gather(&pattern).map(|g| g.len()), Ok(len as usize));
        }
        assert_eq!(random_pattern(256, 1), random_pattern(256, 1));
        assert_ne!(random_pattern(256, 1), random_pattern(256, 2));
    }

    #[test]
    fn test_for_target_widths() {
        let pattern: Vec<u32> = (0..16).rev().collect();
        assert_eq!(Plan::for_target(&pattern, CTarget::Neon).unwrap().lane_blocks(), 1);
        assert_eq!(Plan::for_target(&pattern, CTarget::Avx2).unwrap().lane_blocks(), 0);
        assert_eq!(Plan::for_target(&pattern, CTarget::Scalar).unwrap().move_count(), 16);

        let pairs: Vec<u32> = (0..16).map(|i| i ^ 1).collect();
        assert_eq!(Plan::for_target(&pairs, CTarget::Avx2).unwrap().lane_blocks(), 2);
    }
}
