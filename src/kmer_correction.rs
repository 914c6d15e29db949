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
//! K-mer spectrum error correction.
//!
//! A read is solid when every position is covered by at least one k-mer
//! whose occurrence count in the reference set meets the quality-determined
//! support threshold. The corrector repeatedly repairs the leftmost
//! correctable weak position, one base per round, re-evaluating the whole
//! spectrum after each edit so later rounds see the effect of earlier
//! repairs. Edits are only honoured if the read ends fully solid; otherwise
//! the original sequence is returned untouched.

use ahash::AHashMap;

use crate::error::Result;
use crate::index::ReadIndex;
use crate::read::{ReadRecord, DNA_BASES};
use crate::{CorrectOpts, CorrectionResult};

/// Corrects `read` against the k-mer spectrum of the reference set.
///
/// Returns a [CorrectionResult] whose `kmer_qc` flag reports whether the
/// read became fully solid. The corrected sequence equals the input sequence
/// whenever `kmer_qc` is false, even if interim rounds made edits. Reads
/// shorter than the k-mer length cannot be evaluated and fail the check.
pub fn correct<I: ReadIndex>(
    read: &ReadRecord,
    index: &I,
    opts: &CorrectOpts,
) -> Result<CorrectionResult> {
    let mut result = CorrectionResult::unchanged(&read.seq);

    let n = read.seq.len();
    let k = opts.kmer_length;
    if n < k {
        return Ok(result);
    }
    let nk = n - k + 1;

    // Counts are memoised per read; edits change at most one base per round
    // so most spectrum queries repeat across rounds.
    let mut cache: AHashMap<Vec<u8>, u64> = AHashMap::new();
    let mut seq = read.seq.clone();

    // Minimum phred value over each k-mer window; the most pessimistic base
    // decides the support threshold for the whole window.
    let min_phred: Vec<u8> = (0..nk)
        .map(|i| (i..i + k).map(|j| read.phred(j)).min().unwrap())
        .collect();

    let mut all_solid = false;
    let mut rounds = 0;
    loop {
        let mut counts = vec![0u64; nk];
        let mut solid = vec![false; n];
        for i in 0..nk {
            let kmer = &seq[i..i + k];
            let count = match cache.get(kmer) {
                Some(count) => *count,
                None => {
                    let count = index.count(kmer)?;
                    cache.insert(kmer.to_vec(), count);
                    count
                }
            };
            counts[i] = count;
            if count >= opts.thresholds.min_support(min_phred[i]) {
                for covered in solid[i..i + k].iter_mut() {
                    *covered = true;
                }
            }
        }

        all_solid = solid.iter().all(|s| *s);
        if all_solid || rounds > opts.num_kmer_rounds {
            break;
        }
        rounds += 1;

        // Repair the leftmost weak position that accepts a correction, first
        // through its leftmost covering window, then its rightmost.
        let mut corrected = false;
        for p in 0..n {
            if solid[p] {
                continue;
            }
            let threshold = opts.thresholds.min_support(read.phred(p));

            let left_window = if p + 1 >= k { p + 1 - k } else { 0 };
            corrected =
                attempt_correction(index, &mut seq, p, left_window, counts[left_window].max(threshold), k)?;
            if corrected {
                break;
            }

            let right_window = p.min(n - k);
            corrected = attempt_correction(
                index,
                &mut seq,
                p,
                right_window,
                counts[right_window].max(threshold),
                k,
            )?;
            if corrected {
                break;
            }
        }

        if !corrected {
            break;
        }
    }

    if all_solid {
        result.seq = seq;
        result.kmer_qc = true;
    }
    Ok(result)
}

/// Tries a one-base substitution at position `p` using the k-mer window
/// starting at `window`. A substitution is accepted only if exactly one
/// candidate base reaches `min_count`; two or more supported candidates are
/// ambiguous and suppress the edit.
fn attempt_correction<I: ReadIndex>(
    index: &I,
    seq: &mut [u8],
    p: usize,
    window: usize,
    min_count: u64,
    k: usize,
) -> Result<bool> {
    debug_assert!(window <= p && p < window + k);

    let offset = p - window;
    let original = seq[p];
    let mut kmer = seq[window..window + k].to_vec();

    let mut best: Option<(u8, u64)> = None;
    let mut supported = 0;
    for &base in DNA_BASES.iter() {
        if base == original {
            continue;
        }
        kmer[offset] = base;
        let count = index.count(&kmer)?;
        if count >= min_count {
            supported += 1;
            match best {
                Some((_, best_count)) if count <= best_count => {}
                _ => best = Some((base, count)),
            }
        }
    }

    if supported >= 2 {
        return Ok(false);
    }
    if let Some((base, _)) = best {
        seq[p] = base;
        return Ok(true);
    }
    Ok(false)
}
