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
//! The index contract consumed by the correctors, and a bundled in-memory
//! implementation.
//!
//! The correctors only need two queries against the reference read set:
//! occurrence counts for k-mers and enumeration of suffix/prefix overlaps.
//! Both are exposed through the [ReadIndex] trait so that a memory-mapped or
//! compressed index can be substituted for the bundled [SpectrumIndex]
//! without touching the correction code. Index implementations hold no
//! per-read state and must be safe for concurrent read-only access.

use ahash::AHashMap;

use crate::error::{CorrectError, Result};
use crate::read::reverse_complement;

/// A group of reference reads sharing one overlap geometry with the query:
/// the same overlap length, side, and strand.
///
/// `reads` holds the reference sequences in their stored (forward)
/// orientation; `is_rc` marks blocks whose reads align to the query through
/// their reverse complement. For suffix blocks the aligned read prefix
/// matches the last `overlap_len` query bases, for prefix blocks the aligned
/// read suffix matches the first `overlap_len` query bases.
#[derive(Debug, Clone)]
pub struct OverlapBlock<'a> {
    pub reads: Vec<&'a [u8]>,
    pub overlap_len: usize,
    pub is_prefix: bool,
    pub is_rc: bool,
}

impl OverlapBlock<'_> {
    /// Number of reads in the block.
    pub fn count(&self) -> usize {
        self.reads.len()
    }
}

/// All overlap blocks enumerated for one query read. The referenced
/// sequences live in the index that produced the list.
#[derive(Debug, Clone, Default)]
pub struct BlockList<'a> {
    pub blocks: Vec<OverlapBlock<'a>>,
}

impl BlockList<'_> {
    /// Total number of overlapping reads across all blocks.
    pub fn total_depth(&self) -> usize {
        self.blocks.iter().map(|b| b.count()).sum()
    }
}

/// Queries against an indexed reference read set.
pub trait ReadIndex {
    /// Number of occurrences of `kmer` and its reverse complement
    /// collectively in the reference set.
    fn count(&self, kmer: &[u8]) -> Result<u64>;

    /// All blocks of reference reads overlapping `seq` by at least
    /// `min_overlap` bases.
    fn overlap_blocks(&self, seq: &[u8], min_overlap: usize) -> Result<BlockList<'_>>;
}

/// Canonical form of a k-mer: the lexicographically smaller of the k-mer and
/// its reverse complement.
pub fn canonical_kmer(kmer: &[u8]) -> Vec<u8> {
    let rc = reverse_complement(kmer);
    if rc.as_slice() < kmer {
        rc
    } else {
        kmer.to_vec()
    }
}

/// In-memory reference index: canonical k-mer occurrence counts plus seeded
/// suffix/prefix overlap enumeration.
///
/// Overlap candidates are located through exact seed matches of length
/// `seed_len` at the overlap junction and verified over the full overlap
/// region, tolerating up to `overlap_mismatches` differences. Dovetail
/// overlaps and query-spanning containments are enumerated on both strands;
/// overlaps whose junction seed itself contains an error, and containments
/// of the query inside longer reference reads, are not found. Reference
/// sets of uniform-length short reads are unaffected by the latter.
///
/// # Examples
/// ```rust
/// use reko::index::{ReadIndex, SpectrumIndex};
///
/// let index = SpectrumIndex::from_reads(vec![b"ACGTACGTACGT".to_vec()], 5, 5);
///
/// // "ACGTA" occurs twice, and so does its reverse complement "TACGT".
/// assert_eq!(index.count(b"ACGTA").unwrap(), 4);
/// assert_eq!(index.count(b"AAAAA").unwrap(), 0);
/// ```
pub struct SpectrumIndex {
    k: usize,
    seed_len: usize,
    /// Mismatches tolerated in a verified overlap region.
    pub overlap_mismatches: usize,
    counts: AHashMap<Vec<u8>, u64>,
    reads: Vec<Vec<u8>>,
    prefix_seeds: AHashMap<Vec<u8>, Vec<(u32, bool)>>,
    suffix_seeds: AHashMap<Vec<u8>, Vec<(u32, bool)>>,
}

impl SpectrumIndex {
    /// Indexes `reads` for k-mer counting at length `k` and overlap
    /// enumeration with junction seeds of length `seed_len`. Overlap queries
    /// must use a minimum overlap of at least `seed_len`.
    pub fn from_reads(reads: Vec<Vec<u8>>, k: usize, seed_len: usize) -> SpectrumIndex {
        assert!(k > 0);
        assert!(seed_len > 0);

        let mut counts: AHashMap<Vec<u8>, u64> = AHashMap::new();
        let mut prefix_seeds: AHashMap<Vec<u8>, Vec<(u32, bool)>> = AHashMap::new();
        let mut suffix_seeds: AHashMap<Vec<u8>, Vec<(u32, bool)>> = AHashMap::new();

        for (id, seq) in reads.iter().enumerate() {
            for window in seq.windows(k) {
                // k-mers touching an ambiguous base are not counted
                if window
                    .iter()
                    .all(|b| matches!(b, b'A' | b'C' | b'G' | b'T'))
                {
                    *counts.entry(canonical_kmer(window)).or_insert(0) += 1;
                }
            }
            if seq.len() >= seed_len {
                let rc = reverse_complement(seq);
                prefix_seeds
                    .entry(seq[..seed_len].to_vec())
                    .or_default()
                    .push((id as u32, false));
                prefix_seeds
                    .entry(rc[..seed_len].to_vec())
                    .or_default()
                    .push((id as u32, true));
                suffix_seeds
                    .entry(seq[seq.len() - seed_len..].to_vec())
                    .or_default()
                    .push((id as u32, false));
                suffix_seeds
                    .entry(rc[rc.len() - seed_len..].to_vec())
                    .or_default()
                    .push((id as u32, true));
            }
        }

        SpectrumIndex {
            k,
            seed_len,
            overlap_mismatches: 2,
            counts,
            reads,
            prefix_seeds,
            suffix_seeds,
        }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn num_reads(&self) -> usize {
        self.reads.len()
    }
}

fn count_mismatches(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b.iter()).filter(|(x, y)| x != y).count()
}

impl ReadIndex for SpectrumIndex {
    fn count(&self, kmer: &[u8]) -> Result<u64> {
        if kmer.len() != self.k {
            return Err(CorrectError::IndexQuery(format!(
                "query length {} does not match indexed k-mer length {}",
                kmer.len(),
                self.k
            )));
        }
        Ok(self
            .counts
            .get(canonical_kmer(kmer).as_slice())
            .copied()
            .unwrap_or(0))
    }

    fn overlap_blocks(&self, seq: &[u8], min_overlap: usize) -> Result<BlockList<'_>> {
        assert!(
            min_overlap >= self.seed_len,
            "minimum overlap below the indexed seed length"
        );

        let n = seq.len();
        let mut blocks: Vec<OverlapBlock<'_>> = Vec::new();
        if n < min_overlap {
            return Ok(BlockList { blocks });
        }

        // The query is usually a member of the indexed set; skip exactly one
        // identical full-length forward match so it does not vote for itself.
        let mut self_skipped = false;

        // Suffix overlaps: reference reads whose prefix aligns to the query
        // suffix starting at position p.
        for p in 0..=(n - min_overlap) {
            let overlap_len = n - p;
            let Some(cands) = self.prefix_seeds.get(&seq[p..p + self.seed_len]) else {
                continue;
            };
            let mut fwd_hits: Vec<&[u8]> = Vec::new();
            let mut rc_hits: Vec<&[u8]> = Vec::new();
            for &(id, is_rc) in cands {
                let cand = self.reads[id as usize].as_slice();
                if cand.len() < overlap_len {
                    continue;
                }
                if is_rc {
                    let oriented = reverse_complement(cand);
                    if count_mismatches(&oriented[..overlap_len], &seq[p..])
                        <= self.overlap_mismatches
                    {
                        rc_hits.push(cand);
                    }
                } else {
                    if !self_skipped && p == 0 && cand == seq {
                        self_skipped = true;
                        continue;
                    }
                    if count_mismatches(&cand[..overlap_len], &seq[p..]) <= self.overlap_mismatches
                    {
                        fwd_hits.push(cand);
                    }
                }
            }
            if !fwd_hits.is_empty() {
                blocks.push(OverlapBlock {
                    reads: fwd_hits,
                    overlap_len,
                    is_prefix: false,
                    is_rc: false,
                });
            }
            if !rc_hits.is_empty() {
                blocks.push(OverlapBlock {
                    reads: rc_hits,
                    overlap_len,
                    is_prefix: false,
                    is_rc: true,
                });
            }
        }

        // Prefix overlaps: reference reads whose suffix aligns to the first
        // l query bases. Full-length matches were already enumerated above.
        for l in min_overlap..n {
            let Some(cands) = self.suffix_seeds.get(&seq[l - self.seed_len..l]) else {
                continue;
            };
            let mut fwd_hits: Vec<&[u8]> = Vec::new();
            let mut rc_hits: Vec<&[u8]> = Vec::new();
            for &(id, is_rc) in cands {
                let cand = self.reads[id as usize].as_slice();
                if cand.len() < l {
                    continue;
                }
                if is_rc {
                    let oriented = reverse_complement(cand);
                    if count_mismatches(&oriented[oriented.len() - l..], &seq[..l])
                        <= self.overlap_mismatches
                    {
                        rc_hits.push(cand);
                    }
                } else if count_mismatches(&cand[cand.len() - l..], &seq[..l])
                    <= self.overlap_mismatches
                {
                    fwd_hits.push(cand);
                }
            }
            if !fwd_hits.is_empty() {
                blocks.push(OverlapBlock {
                    reads: fwd_hits,
                    overlap_len: l,
                    is_prefix: true,
                    is_rc: false,
                });
            }
            if !rc_hits.is_empty() {
                blocks.push(OverlapBlock {
                    reads: rc_hits,
                    overlap_len: l,
                    is_prefix: true,
                    is_rc: true,
                });
            }
        }

        Ok(BlockList { blocks })
    }
}
