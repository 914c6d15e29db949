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
//! Column-aligned pile-ups of overlapping reads and conflict-aware
//! consensus.
//!
//! A pile-up aligns every overlapping read against a root read at a fixed
//! offset. Columns are root coordinates; bases an overlap contributes
//! outside the root are ignored. The consensus caller refuses to change
//! columns where the base calls look like two real alleles rather than one
//! allele plus sequencing errors, so reads from near-identical repeats are
//! not homogenised into one of the copies.

use std::borrow::Cow;

use crate::index::BlockList;
use crate::read::reverse_complement;

/// One aligned sequence in a pile-up. `offset` is the root coordinate of
/// the row's first base and may be negative for rows that begin before the
/// root.
#[derive(Debug)]
pub struct PileupRow<'a> {
    pub seq: Cow<'a, [u8]>,
    pub offset: isize,
}

/// A root read and the overlapping reads aligned against it. The root is
/// always row zero at offset zero.
#[derive(Debug)]
pub struct Pileup<'a> {
    rows: Vec<PileupRow<'a>>,
}

impl<'a> Pileup<'a> {
    /// Builds the pile-up for `root` from an overlap block list.
    /// Reverse-complement blocks contribute the reverse complement of their
    /// reads; forward rows borrow the block data directly.
    pub fn from_blocks(root: &'a [u8], blocks: &BlockList<'a>) -> Pileup<'a> {
        let mut rows = vec![PileupRow {
            seq: Cow::Borrowed(root),
            offset: 0,
        }];
        for block in blocks.blocks.iter() {
            for &read in block.reads.iter() {
                let oriented: Cow<'a, [u8]> = if block.is_rc {
                    Cow::Owned(reverse_complement(read))
                } else {
                    Cow::Borrowed(read)
                };
                let offset = if block.is_prefix {
                    -((oriented.len() - block.overlap_len) as isize)
                } else {
                    (root.len() - block.overlap_len) as isize
                };
                rows.push(PileupRow {
                    seq: oriented,
                    offset,
                });
            }
        }
        Pileup { rows }
    }

    pub fn root(&self) -> &[u8] {
        &self.rows[0].seq
    }

    /// Number of rows including the root.
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Counts the non-root rows covering the first root column (prefix
    /// overlaps) and the last root column (suffix overlaps). Containments
    /// cover both ends and count on both sides.
    pub fn count_overlaps(&self) -> (usize, usize) {
        let n = self.rows[0].seq.len() as isize;
        let mut num_prefix = 0;
        let mut num_suffix = 0;
        for row in self.rows[1..].iter() {
            let start = row.offset;
            let end = row.offset + row.seq.len() as isize;
            if start <= 0 && end > 0 {
                num_prefix += 1;
            }
            if start < n && end >= n {
                num_suffix += 1;
            }
        }
        (num_prefix, num_suffix)
    }

    /// Conflict-aware consensus over the root columns.
    ///
    /// Per column, the calls of all covering rows (root included, `N`
    /// excluded) are tallied. The most frequent base is emitted unless the
    /// second most frequent base reaches `conflict_cutoff` calls and an
    /// equal mixture of the two bases is more likely than sequencing errors
    /// at rate `p_error`, in which case the column is conflicted and the
    /// root base is kept. Uncovered columns also keep the root base. The
    /// output has the same length as the root.
    pub fn consensus(&self, p_error: f64, conflict_cutoff: usize) -> Vec<u8> {
        let root = &self.rows[0].seq;
        (0..root.len())
            .map(|col| {
                let mut tallies = [0usize; 4];
                for row in self.rows.iter() {
                    let idx = col as isize - row.offset;
                    if idx < 0 || idx as usize >= row.seq.len() {
                        continue;
                    }
                    if let Some(base) = base_index(row.seq[idx as usize]) {
                        tallies[base] += 1;
                    }
                }

                let mut primary = 0;
                for base in 1..4 {
                    if tallies[base] > tallies[primary] {
                        primary = base;
                    }
                }
                if tallies[primary] == 0 {
                    return root[col];
                }

                let mut alt_count = 0;
                for (base, &tally) in tallies.iter().enumerate() {
                    if base != primary && tally > alt_count {
                        alt_count = tally;
                    }
                }

                if alt_count >= conflict_cutoff && conflicted(tallies[primary], alt_count, p_error)
                {
                    root[col]
                } else {
                    BASES[primary]
                }
            })
            .collect()
    }

    /// Prints the pile-up over the root window with bases matching the root
    /// masked as '.', one row per line with its offset.
    pub fn print_masked(&self) {
        let n = self.rows[0].seq.len();
        for (r, row) in self.rows.iter().enumerate() {
            let line: String = (0..n)
                .map(|col| {
                    let idx = col as isize - row.offset;
                    if idx < 0 || idx as usize >= row.seq.len() {
                        return ' ';
                    }
                    let base = row.seq[idx as usize];
                    if r > 0 && base == self.rows[0].seq[col] {
                        '.'
                    } else {
                        base as char
                    }
                })
                .collect();
            println!("{}\t{}", line, row.offset);
        }
    }
}

const BASES: [u8; 4] = [b'A', b'C', b'G', b'T'];

fn base_index(base: u8) -> Option<usize> {
    match base {
        b'A' => Some(0),
        b'C' => Some(1),
        b'G' => Some(2),
        b'T' => Some(3),
        _ => None,
    }
}

/// Likelihood-ratio test for two real alleles against one allele plus
/// sequencing errors at rate `p_error`. The shared binomial coefficient
/// cancels, leaving a log-space comparison of the per-base terms.
fn conflicted(primary: usize, alt: usize, p_error: f64) -> bool {
    let mixture = ((primary + alt) as f64) * 0.5_f64.ln();
    let errors = (alt as f64) * p_error.ln() + (primary as f64) * (1.0 - p_error).ln();
    mixture > errors
}
