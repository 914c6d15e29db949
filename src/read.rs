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
//! Sequencing read records and per-base quality access.

use std::io::Write;

use crate::error::{CorrectError, Result};

/// The four unambiguous nucleotides, in the order candidate substitutions
/// are attempted.
pub const DNA_BASES: [u8; 4] = [b'A', b'C', b'G', b'T'];

/// ASCII offset of phred+33 encoded quality values.
pub const PHRED_OFFSET: u8 = 33;

/// Phred value assumed for records without a quality string. Reads from
/// fasta input are corrected under the high-quality support threshold.
pub const UNKNOWN_QUALITY: u8 = 40;

/// A single sequencing read with optional per-base quality.
///
/// The sequence is over `{A,C,G,T,N}` and the quality string, when present,
/// is phred+33 encoded and has the same length as the sequence. Other phred
/// encodings must be normalised by the caller before correction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadRecord {
    pub id: String,
    pub seq: Vec<u8>,
    pub qual: Vec<u8>,
}

impl ReadRecord {
    pub fn new(id: impl Into<String>, seq: Vec<u8>, qual: Vec<u8>) -> ReadRecord {
        ReadRecord {
            id: id.into(),
            seq,
            qual,
        }
    }

    /// Phred score of the base at `pos`, or [UNKNOWN_QUALITY] when the
    /// record carries no quality string.
    pub fn phred(&self, pos: usize) -> u8 {
        if self.qual.is_empty() {
            UNKNOWN_QUALITY
        } else {
            self.qual[pos].saturating_sub(PHRED_OFFSET)
        }
    }

    /// Checks the record against the input contract: non-empty sequence over
    /// `{A,C,G,T,N}` and a quality string that is either empty or as long as
    /// the sequence.
    pub fn validate(&self) -> Result<()> {
        if self.seq.is_empty() {
            return Err(CorrectError::EmptySequence {
                id: self.id.clone(),
            });
        }
        if !self.qual.is_empty() && self.qual.len() != self.seq.len() {
            return Err(CorrectError::QualityLengthMismatch {
                id: self.id.clone(),
                seq_len: self.seq.len(),
                qual_len: self.qual.len(),
            });
        }
        if let Some(&base) = self
            .seq
            .iter()
            .find(|b| !matches!(**b, b'A' | b'C' | b'G' | b'T' | b'N'))
        {
            return Err(CorrectError::InvalidBase {
                id: self.id.clone(),
                base: base as char,
            });
        }
        Ok(())
    }

    /// Writes the record as fastq when a quality string is present, fasta
    /// otherwise. The quality encoding is passed through unchanged.
    pub fn write<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        if self.qual.is_empty() {
            writeln!(out, ">{}", self.id)?;
            out.write_all(&self.seq)?;
            out.write_all(b"\n")
        } else {
            writeln!(out, "@{}", self.id)?;
            out.write_all(&self.seq)?;
            out.write_all(b"\n+\n")?;
            out.write_all(&self.qual)?;
            out.write_all(b"\n")
        }
    }
}

/// A read paired with its ordinal in the input stream.
#[derive(Debug, Clone)]
pub struct WorkItem {
    pub read: ReadRecord,
    pub ordinal: usize,
}

fn complement(base: u8) -> u8 {
    match base {
        b'A' => b'T',
        b'C' => b'G',
        b'G' => b'C',
        b'T' => b'A',
        _ => b'N',
    }
}

/// Reverse complement of a nucleotide sequence. Ambiguous bases map to `N`.
pub fn reverse_complement(seq: &[u8]) -> Vec<u8> {
    seq.iter().rev().map(|b| complement(*b)).collect()
}

/// Marks positions where two equal-length sequences differ: ' ' for a match,
/// 'x' for a difference.
pub fn diff_string(a: &[u8], b: &[u8]) -> String {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| if x == y { ' ' } else { 'x' })
        .collect()
}
