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
//! Error correction for short DNA sequencing reads.
//!
//! Reads are corrected against an indexed reference read set, queried
//! through the [ReadIndex](index::ReadIndex) trait. Two strategies are
//! available: [k-mer spectrum correction](kmer_correction), which drives the
//! read towards full coverage by well-supported k-mers, and
//! [overlap consensus correction](overlap_correction), which aligns
//! overlapping reads into a pile-up and calls a conflict-aware consensus.
//! The hybrid strategy tries the k-mer corrector first and falls back to the
//! overlap corrector when the read does not become solid.
//!
//! Correction of one read is a pure function of the read, the index, and
//! the options; per-read state is discarded when the read completes. The
//! [post-processor](postprocess) routes results to the output sinks and
//! aggregates correction metrics.

pub mod error;
pub mod graph;
pub mod index;
pub mod kmer_correction;
pub mod overlap_correction;
pub mod pileup;
pub mod postprocess;
pub mod read;
pub mod threshold;

pub use error::{CorrectError, Result};

use index::ReadIndex;
use read::WorkItem;
use threshold::CorrectionThresholds;

/// Correction strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Kmer,
    Overlap,
    Hybrid,
}

/// Options for a correction process.
#[derive(Debug, Clone)]
pub struct CorrectOpts {
    pub algorithm: Algorithm,
    /// k-mer length for spectrum correction.
    pub kmer_length: usize,
    /// Round cap for the k-mer corrector.
    pub num_kmer_rounds: usize,
    /// Minimum overlap length for block enumeration.
    pub min_overlap: usize,
    /// Round cap for the overlap corrector.
    pub num_overlap_rounds: usize,
    /// Second-allele count threshold of the conflict test.
    pub conflict_cutoff: usize,
    /// Overlap depth above which a read is returned unchanged; 0 disables.
    pub depth_filter: usize,
    pub thresholds: CorrectionThresholds,
    /// Debug-trace pile-ups and diffs to stdout.
    pub print_overlaps: bool,
}

impl Default for CorrectOpts {
    fn default() -> CorrectOpts {
        CorrectOpts {
            algorithm: Algorithm::Hybrid,
            kmer_length: 31,
            num_kmer_rounds: 10,
            min_overlap: 45,
            num_overlap_rounds: 1,
            conflict_cutoff: 5,
            depth_filter: 10000,
            thresholds: CorrectionThresholds::default(),
            print_overlaps: false,
        }
    }
}

/// Outcome of correcting one read.
///
/// The corrected sequence always has the same length as the input sequence;
/// positions that could not be corrected keep their input base. The QC flags
/// report only the strategies that actually ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrectionResult {
    pub seq: Vec<u8>,
    pub kmer_qc: bool,
    pub overlap_qc: bool,
    pub num_prefix_overlaps: usize,
    pub num_suffix_overlaps: usize,
}

impl CorrectionResult {
    /// A result reproducing the input sequence with all checks failed.
    pub fn unchanged(seq: &[u8]) -> CorrectionResult {
        CorrectionResult {
            seq: seq.to_vec(),
            kmer_qc: false,
            overlap_qc: false,
            num_prefix_overlaps: 0,
            num_suffix_overlaps: 0,
        }
    }
}

/// Corrects one work item with the configured strategy.
///
/// The read is validated first; malformed records abort with an error and
/// should be routed to the discard sink. The hybrid strategy returns the
/// k-mer result when it passes QC and the overlap result otherwise.
///
/// # Examples
/// ```rust
/// use reko::{correct, Algorithm, CorrectOpts};
/// use reko::index::SpectrumIndex;
/// use reko::read::{ReadRecord, WorkItem};
///
/// let reference: Vec<Vec<u8>> = vec![b"ACGTACGTACGT".to_vec(); 3];
/// let index = SpectrumIndex::from_reads(reference, 5, 5);
///
/// let read = ReadRecord::new("read1", b"ACGTACGTACGT".to_vec(), vec![]);
/// let item = WorkItem { read, ordinal: 0 };
///
/// let opts = CorrectOpts {
///     algorithm: Algorithm::Kmer,
///     kmer_length: 5,
///     ..CorrectOpts::default()
/// };
///
/// let result = correct(&item, &index, &opts).unwrap();
/// assert!(result.kmer_qc);
/// assert_eq!(result.seq, b"ACGTACGTACGT".to_vec());
/// ```
pub fn correct<I: ReadIndex>(
    item: &WorkItem,
    index: &I,
    opts: &CorrectOpts,
) -> Result<CorrectionResult> {
    item.read.validate()?;

    let result = match opts.algorithm {
        Algorithm::Kmer => kmer_correction::correct(&item.read, index, opts)?,
        Algorithm::Overlap => overlap_correction::correct(&item.read, index, opts)?,
        Algorithm::Hybrid => {
            let kmer_result = kmer_correction::correct(&item.read, index, opts)?;
            if kmer_result.kmer_qc {
                kmer_result
            } else {
                overlap_correction::correct(&item.read, index, opts)?
            }
        }
    };

    if opts.print_overlaps && !result.kmer_qc && !result.overlap_qc {
        println!("{} failed error correction QC", item.read.id);
    }

    Ok(result)
}
