//! CPU feature detection for the x86_64 kernels.
//!
//! Detection runs once; [`CpuFeatures::get`] returns the cached result.

use std::fmt;
use std::sync::OnceLock;

static DETECTED: OnceLock<CpuFeatures> = OnceLock::new();

/// Detected CPU features relevant to lane permutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CpuFeatures {
    /// SSSE3 support (`pshufb`).
    pub ssse3: bool,
    /// AVX2 support (`vpermd`, `vpermps`).
    pub avx2: bool,
    /// AVX-512 Foundation support (512-bit `vpermd`, `vpermps`).
    pub avx512f: bool,
}

impl CpuFeatures {
    /// Detect CPU features at runtime using CPUID.
    ///
    /// # Example
    ///
    /// ```
    /// use lanes::arch::x86_64::CpuFeatures;
    ///
    /// let features = CpuFeatures::detect();
    /// println!("SSSE3: {}", features.ssse3);
    /// println!("AVX2: {}", features.avx2);
    /// ```
    #[must_use]
    pub fn detect() -> Self {
        Self {
            ssse3: std::is_x86_feature_detected!("ssse3"),
            avx2: std::is_x86_feature_detected!("avx2"),
            avx512f: std::is_x86_feature_detected!("avx512f"),
        }
    }

    /// Cached result of [`CpuFeatures::detect`].
    #[must_use]
    pub fn get() -> Self {
        *DETECTED.get_or_init(Self::detect)
    }

    /// Names of the features that are absent, or `None` when all are present.
    #[must_use]
    pub fn missing_features(&self) -> Option<String> {
        let mut missing = Vec::new();
        if !self.ssse3 {
            missing.push("SSSE3");
        }
        if !self.avx2 {
            missing.push("AVX2");
        }
        if !self.avx512f {
            missing.push("AVX-512F");
        }
        if missing.is_empty() {
            None
        } else {
            Some(missing.join(", "))
        }
    }
}

impl Default for CpuFeatures {
    fn default() -> Self {
        Self::get()
    }
}

impl fmt::Display for CpuFeatures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CpuFeatures {{ ssse3: {}, avx2: {}, avx512f: {} }}",
            self.ssse3, self.avx2, self.avx512f
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_features() {
        let features = CpuFeatures::detect();
        assert_eq!(features, CpuFeatures::get());
        // Every AVX2 part also has SSSE3.
        if features.avx2 {
            assert!(features.ssse3);
        }
    }

    #[test]
    fn test_missing_features() {
        let all = CpuFeatures {
            ssse3: true,
            avx2: true,
            avx512f: true,
        };
        assert!(all.missing_features().is_none());

        let some = CpuFeatures {
            ssse3: true,
            avx2: false,
            avx512f: false,
        };
        let missing = some.missing_features().unwrap();
        assert!(missing.contains("AVX2"));
        assert!(missing.contains("AVX-512F"));
        assert!(!missing.contains("SSSE3"));
    }

    #[test]
    fn test_display() {
        let features = CpuFeatures {
            ssse3: true,
            avx2: true,
            avx512f: false,
        };
        let s = features.to_string();
        assert!(s.contains("avx2: true"));
        assert!(s.contains("avx512f: false"));
    }
}
