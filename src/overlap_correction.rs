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
//! Overlap-consensus error correction.
//!
//! Each round enumerates the overlap blocks of the current working
//! sequence, builds the pile-up, and replaces the working sequence with the
//! conflict-aware consensus. The loop stops at a fixed point or at the
//! round cap. Reads whose overlap depth exceeds the depth filter come from
//! repetitive regions where the consensus is unreliable and expensive; they
//! are returned unchanged.

use crate::error::Result;
use crate::index::ReadIndex;
use crate::pileup::Pileup;
use crate::read::{diff_string, ReadRecord};
use crate::{CorrectOpts, CorrectionResult};

/// Assumed per-base sequencing error rate in the conflict test.
const P_ERROR: f64 = 0.01;

/// Corrects `read` by iterated overlap consensus.
///
/// `overlap_qc` passes when the final pile-up contains overlaps on both the
/// prefix and the suffix side of the read; a read supported from one side
/// only is likely to stem from a sequence boundary or a chimera.
pub fn correct<I: ReadIndex>(
    read: &ReadRecord,
    index: &I,
    opts: &CorrectOpts,
) -> Result<CorrectionResult> {
    let mut result = CorrectionResult::unchanged(&read.seq);
    let mut curr = read.seq.clone();
    let mut rounds = 0;

    loop {
        let blocks = index.overlap_blocks(&curr, opts.min_overlap)?;
        let depth = blocks.total_depth();

        if opts.depth_filter > 0 && depth > opts.depth_filter {
            result.num_prefix_overlaps = depth;
            result.num_suffix_overlaps = depth;
            result.seq = curr;
            result.overlap_qc = false;
            return Ok(result);
        }

        let pileup = Pileup::from_blocks(&curr, &blocks);
        if opts.print_overlaps {
            pileup.print_masked();
        }

        let (num_prefix, num_suffix) = pileup.count_overlaps();
        result.num_prefix_overlaps = num_prefix;
        result.num_suffix_overlaps = num_suffix;

        let consensus = pileup.consensus(P_ERROR, opts.conflict_cutoff);
        rounds += 1;

        let fixed_point = consensus == curr;
        result.seq = consensus.clone();
        if rounds == opts.num_overlap_rounds || fixed_point {
            break;
        }
        curr = consensus;
    }

    result.overlap_qc = result.num_prefix_overlaps > 0 && result.num_suffix_overlaps > 0;

    if opts.print_overlaps {
        println!("OS:     {}", String::from_utf8_lossy(&read.seq));
        println!("CS:     {}", String::from_utf8_lossy(&result.seq));
        println!("DS:     {}", diff_string(&read.seq, &result.seq));
        println!("QS:     {}", String::from_utf8_lossy(&read.qual));
        println!();
    }

    Ok(result)
}
