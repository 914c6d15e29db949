// reko: k-mer spectrum and overlap consensus error correction for sequencing reads
//
// Copyrights in this project are retained by contributors. No copyright assignment
// is required to contribute to this project.
//
// Except as otherwise noted (below and/or in individual files), this
// project is licensed under the Apache License, Version 2.0
// <LICENSE-APACHE> or <http://www.apache.org/licenses/LICENSE-2.0> or
// the MIT license, <LICENSE-MIT> or <http://opensource.org/licenses/MIT>,
// at your option.
//
//! Quality-driven minimum support thresholds for k-mer solidity.

/// Maps per-base quality to the minimum number of index occurrences a k-mer
/// needs to count as solid. Low-quality bases demand more support than
/// high-quality ones.
///
/// For a whole k-mer the minimum phred value across its span is used, so the
/// most pessimistic base decides the threshold.
///
/// # Examples
/// ```rust
/// use reko::threshold::CorrectionThresholds;
///
/// let thresholds = CorrectionThresholds::default();
/// assert_eq!(thresholds.min_support(40), 2);
/// assert_eq!(thresholds.min_support(2), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrectionThresholds {
    pub min_support_low_quality: u64,
    pub min_support_high_quality: u64,
    pub high_quality_cutoff: u8,
}

impl Default for CorrectionThresholds {
    fn default() -> CorrectionThresholds {
        CorrectionThresholds {
            min_support_low_quality: 3,
            min_support_high_quality: 2,
            high_quality_cutoff: 20,
        }
    }
}

impl CorrectionThresholds {
    /// Derives both support levels from a single baseline: the low-quality
    /// support is the baseline, the high-quality support one less (floored
    /// at one).
    pub fn with_base_support(base: u64) -> CorrectionThresholds {
        CorrectionThresholds {
            min_support_low_quality: base,
            min_support_high_quality: base.saturating_sub(1).max(1),
            ..Default::default()
        }
    }

    /// Minimum occurrence count required at the given phred value.
    pub fn min_support(&self, phred: u8) -> u64 {
        if phred >= self.high_quality_cutoff {
            self.min_support_high_quality
        } else {
            self.min_support_low_quality
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
//
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cutoff_boundary_is_inclusive() {
        let thresholds = CorrectionThresholds::default();
        assert_eq!(thresholds.min_support(19), 3);
        assert_eq!(thresholds.min_support(20), 2);
    }

    #[test]
    fn base_support_derives_both_levels() {
        let thresholds = CorrectionThresholds::with_base_support(5);
        assert_eq!(thresholds.min_support_low_quality, 5);
        assert_eq!(thresholds.min_support_high_quality, 4);
        assert_eq!(thresholds.high_quality_cutoff, 20);
    }

    #[test]
    fn base_support_never_drops_below_one() {
        let thresholds = CorrectionThresholds::with_base_support(1);
        assert_eq!(thresholds.min_support_high_quality, 1);
    }
}
