//! C rendering of a [`Plan`].
//!
//! The output is one self-contained C function
//!
//! ```c
//! void lanes_permute(const T *in, T *out);
//! ```
//!
//! where each lane block matching the target's vector width becomes one
//! load / permute / store, and everything else becomes scalar copies.
//!
//! | Target | Element | Vector permute |
//! |--------|---------|----------------|
//! | `scalar` | `float` | none |
//! | `avx2` | `float` | `_mm256_permutevar8x32_ps` |
//! | `avx512` | `float` | `_mm512_permutexvar_ps` |
//! | `neon` | `uint8_t` | `vqtbl1q_u8` |

use std::fmt::{self, Write};
use std::str::FromStr;

use super::{Block, Plan};

/// Name of the emitted C function.
pub const FUNCTION_NAME: &str = "lanes_permute";

/// Instruction set a plan is rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum CTarget {
    /// Plain C copies.
    Scalar,
    /// 8 x `float` via `vpermps`.
    Avx2,
    /// 16 x `float` via `vpermps` on zmm.
    Avx512,
    /// 16 x `uint8_t` via `tbl`.
    Neon,
}

impl CTarget {
    /// Every target.
    pub const ALL: [CTarget; 4] = [CTarget::Scalar, CTarget::Avx2, CTarget::Avx512, CTarget::Neon];

    /// Lower-case name used on the command line.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            CTarget::Scalar => "scalar",
            CTarget::Avx2 => "avx2",
            CTarget::Avx512 => "avx512",
            CTarget::Neon => "neon",
        }
    }

    /// Elements per vector register; `1` for scalar.
    #[must_use]
    pub const fn lanes(self) -> usize {
        match self {
            CTarget::Scalar => 1,
            CTarget::Avx2 => 8,
            CTarget::Avx512 | CTarget::Neon => 16,
        }
    }

    /// Planner widths for this target.
    #[must_use]
    pub const fn widths(self) -> &'static [usize] {
        match self {
            CTarget::Scalar => &[],
            CTarget::Avx2 => &[8],
            CTarget::Avx512 | CTarget::Neon => &[16],
        }
    }

    /// C element type.
    #[must_use]
    pub const fn element(self) -> &'static str {
        match self {
            CTarget::Scalar | CTarget::Avx2 | CTarget::Avx512 => "float",
            CTarget::Neon => "uint8_t",
        }
    }

    fn header(self) -> Option<&'static str> {
        match self {
            CTarget::Scalar => None,
            CTarget::Avx2 | CTarget::Avx512 => Some("immintrin.h"),
            CTarget::Neon => Some("arm_neon.h"),
        }
    }
}

impl fmt::Display for CTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!("unknown C target `{s}` (expected scalar, avx2, avx512 or neon)")
            })
    }
}

// =============================================================================
// Emitter
// =============================================================================

/// Line-oriented C source buffer.
struct CFile {
    buf: String,
}

impl CFile {
    fn new(summary: &str) -> Self {
        let mut f = Self { buf: String::new() };
        let _ = writeln!(f.buf, "/* {summary} */");
        f.line("/* Generated by lanes. Do not edit. */");
        f.blank();
        f
    }

    fn line(&mut self, s: &str) {
        self.buf.push_str(s);
        self.buf.push('\n');
    }

    fn blank(&mut self) {
        self.buf.push('\n');
    }

    fn include(&mut self, header: &str) {
        let _ = writeln!(self.buf, "#include <{header}>");
    }

    fn finish(self) -> String {
        self.buf
    }
}

fn join(indices: &[u32]) -> String {
    indices.iter().map(u32::to_string).collect::<Vec<_>>().join(", ")
}

/// Renders `plan` as a C function for `target`.
///
/// # Example
///
/// ```
/// use lanes::{emit_c, CTarget, Plan};
///
/// let pattern: Vec<u32> = (0..8).rev().collect();
/// let plan = Plan::for_target(&pattern, CTarget::Avx2).unwrap();
/// let c = emit_c(&plan, CTarget::Avx2);
/// assert!(c.contains("_mm256_permutevar8x32_ps"));
/// assert!(c.contains("7, 6, 5, 4, 3, 2, 1, 0"));
/// ```
#[must_use]
pub fn emit_c(plan: &Plan, target: CTarget) -> String {
    let mut f = CFile::new(&format!(
        "{} positions, {} lane blocks, {} moves, target {target}",
        plan.len(),
        plan.lane_blocks(),
        plan.move_count()
    ));

    f.include("stdint.h");
    if let Some(header) = target.header() {
        f.include(header);
    }
    f.blank();

    let ty = target.element();
    let _ = writeln!(
        f.buf,
        "void {FUNCTION_NAME}(const {ty} *restrict in, {ty} *restrict out) {{"
    );

    for (n, block) in plan.blocks().iter().enumerate() {
        match block {
            Block::Lanes {
                offset,
                width,
                indices,
            } if *width == target.lanes() && target != CTarget::Scalar => {
                emit_vector(&mut f, target, n, *offset, indices);
            }
            Block::Lanes {
                offset, indices, ..
            } => {
                for (i, &src) in indices.iter().enumerate() {
                    let (dst, src) = (offset + i, *offset + src as usize);
                    let _ = writeln!(f.buf, "    out[{dst}] = in[{src}];");
                }
            }
            Block::Move { dst, src } => {
                let _ = writeln!(f.buf, "    out[{dst}] = in[{src}];");
            }
        }
    }

    f.line("}");
    f.finish()
}

fn emit_vector(f: &mut CFile, target: CTarget, n: usize, offset: usize, indices: &[u32]) {
    let idx = join(indices);
    match target {
        CTarget::Avx2 => {
            let _ = writeln!(f.buf, "    {{");
            let _ = writeln!(f.buf, "        const __m256i idx = _mm256_setr_epi32({idx});");
            let _ = writeln!(
                f.buf,
                "        _mm256_storeu_ps(out + {offset}, _mm256_permutevar8x32_ps(_mm256_loadu_ps(in + {offset}), idx));"
            );
            let _ = writeln!(f.buf, "    }}");
        }
        CTarget::Avx512 => {
            let _ = writeln!(f.buf, "    {{");
            let _ = writeln!(f.buf, "        const __m512i idx = _mm512_setr_epi32({idx});");
            let _ = writeln!(
                f.buf,
                "        _mm512_storeu_ps(out + {offset}, _mm512_permutexvar_ps(idx, _mm512_loadu_ps(in + {offset})));"
            );
            let _ = writeln!(f.buf, "    }}");
        }
        CTarget::Neon => {
            let _ = writeln!(f.buf, "    {{");
            let _ = writeln!(f.buf, "        static const uint8_t idx_{n}[16] = {{{idx}}};");
            let _ = writeln!(
                f.buf,
                "        vst1q_u8(out + {offset}, vqtbl1q_u8(vld1q_u8(in + {offset}), vld1q_u8(idx_{n})));"
            );
            let _ = writeln!(f.buf, "    }}");
        }
        CTarget::Scalar => {}
    }
}
