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
//! End-to-end correction through the public API.

use random::Source;

use reko::index::{BlockList, OverlapBlock, ReadIndex, SpectrumIndex};
use reko::read::{ReadRecord, WorkItem};
use reko::{correct, Algorithm, CorrectOpts};

fn work_item(seq: Vec<u8>, qual: Vec<u8>) -> WorkItem {
    WorkItem {
        read: ReadRecord::new("read", seq, qual),
        ordinal: 0,
    }
}

fn random_nucleotide(rng: &mut random::Default) -> u8 {
    match rng.read_u64() % 4 {
        0 => b'A',
        1 => b'C',
        2 => b'G',
        3 => b'T',
        _ => panic!("Impossible math"),
    }
}

fn flip(base: u8) -> u8 {
    match base {
        b'A' => b'C',
        b'C' => b'G',
        b'G' => b'T',
        _ => b'A',
    }
}

/// A canned index: no k-mer support, one full-length containment block per
/// query.
struct MockIndex {
    reads: Vec<Vec<u8>>,
}

impl ReadIndex for MockIndex {
    fn count(&self, _kmer: &[u8]) -> reko::Result<u64> {
        Ok(0)
    }

    fn overlap_blocks(&self, seq: &[u8], _min_overlap: usize) -> reko::Result<BlockList<'_>> {
        if self.reads.is_empty() {
            return Ok(BlockList::default());
        }
        Ok(BlockList {
            blocks: vec![OverlapBlock {
                reads: self.reads.iter().map(|r| r.as_slice()).collect(),
                overlap_len: seq.len(),
                is_prefix: false,
                is_rc: false,
            }],
        })
    }
}

#[test]
fn solid_read_passes_unchanged() {
    let index = SpectrumIndex::from_reads(vec![b"ACGTACGTACGT".to_vec(); 3], 5, 5);
    let item = work_item(b"ACGTACGTACGT".to_vec(), vec![]);

    let opts = CorrectOpts {
        algorithm: Algorithm::Kmer,
        kmer_length: 5,
        ..CorrectOpts::default()
    };
    let result = correct(&item, &index, &opts).unwrap();

    assert!(result.kmer_qc);
    assert_eq!(result.seq, b"ACGTACGTACGT".to_vec());
}

#[test]
fn kmer_corrector_repairs_a_single_error() {
    let mut rng = random::Default::new([2024, 7]);
    let truth: Vec<u8> = (0..60).map(|_| random_nucleotide(&mut rng)).collect();
    let mut query = truth.clone();
    query[30] = flip(query[30]);

    let index = SpectrumIndex::from_reads(vec![truth.clone(); 4], 15, 15);
    let item = work_item(query, vec![b'I'; 60]);

    let opts = CorrectOpts {
        algorithm: Algorithm::Kmer,
        kmer_length: 15,
        ..CorrectOpts::default()
    };
    let result = correct(&item, &index, &opts).unwrap();

    assert!(result.kmer_qc);
    assert_eq!(result.seq, truth);
}

#[test]
fn kmer_correction_is_idempotent_once_solid() {
    let mut rng = random::Default::new([11, 13]);
    let truth: Vec<u8> = (0..60).map(|_| random_nucleotide(&mut rng)).collect();
    let mut query = truth.clone();
    query[20] = flip(query[20]);

    let index = SpectrumIndex::from_reads(vec![truth.clone(); 4], 15, 15);
    let opts = CorrectOpts {
        algorithm: Algorithm::Kmer,
        kmer_length: 15,
        ..CorrectOpts::default()
    };

    let first = correct(&work_item(query, vec![b'I'; 60]), &index, &opts).unwrap();
    assert!(first.kmer_qc);

    let second = correct(&work_item(first.seq.clone(), vec![b'I'; 60]), &index, &opts).unwrap();
    assert!(second.kmer_qc);
    assert_eq!(second.seq, first.seq);
}

#[test]
fn overlap_corrector_repairs_with_the_bundled_index() {
    let truth = b"ACGGTCATTGCAAGCTTACGGACCTGTTAG".to_vec();
    let mut query = truth.clone();
    query[25] = b'A';

    let index = SpectrumIndex::from_reads(vec![truth.clone(); 20], 15, 20);
    let item = work_item(query, vec![b'I'; 30]);

    let opts = CorrectOpts {
        algorithm: Algorithm::Overlap,
        min_overlap: 20,
        ..CorrectOpts::default()
    };
    let result = correct(&item, &index, &opts).unwrap();

    assert!(result.overlap_qc);
    assert_eq!(result.seq, truth);
    assert_eq!(result.num_prefix_overlaps, 20);
    assert_eq!(result.num_suffix_overlaps, 20);
}

#[test]
fn hybrid_falls_back_to_overlap_consensus() {
    let truth = b"ACGTACGTACGTACGT".to_vec();
    let mut query = truth.clone();
    query[5] = b'G';

    // no k-mer has support, so the spectrum pass cannot succeed
    let index = MockIndex {
        reads: vec![truth.clone(); 50],
    };
    let item = work_item(query, vec![b'#'; 16]);

    let opts = CorrectOpts {
        algorithm: Algorithm::Hybrid,
        kmer_length: 5,
        ..CorrectOpts::default()
    };
    let result = correct(&item, &index, &opts).unwrap();

    assert!(!result.kmer_qc);
    assert!(result.overlap_qc);
    assert_eq!(result.seq, truth);
}

#[test]
fn malformed_reads_are_rejected_without_edits() {
    let index = MockIndex { reads: vec![] };
    let opts = CorrectOpts::default();

    let invalid = work_item(b"ACXT".to_vec(), vec![]);
    assert!(correct(&invalid, &index, &opts)
        .unwrap_err()
        .is_malformed_input());

    let mismatched = work_item(b"ACGT".to_vec(), b"II".to_vec());
    assert!(correct(&mismatched, &index, &opts)
        .unwrap_err()
        .is_malformed_input());
}

#[test]
fn output_length_and_alphabet_are_preserved() {
    let mut rng = random::Default::new([5, 23]);
    let reference: Vec<Vec<u8>> = (0..10)
        .map(|_| (0..40).map(|_| random_nucleotide(&mut rng)).collect())
        .collect();
    let index = SpectrumIndex::from_reads(reference.clone(), 15, 20);

    for algorithm in [Algorithm::Kmer, Algorithm::Overlap, Algorithm::Hybrid] {
        let opts = CorrectOpts {
            algorithm,
            kmer_length: 15,
            min_overlap: 20,
            ..CorrectOpts::default()
        };
        for seq in reference.iter().chain([b"ACGTNACGTNACGTNACGTN".to_vec()].iter()) {
            let item = work_item(seq.clone(), vec![]);
            let result = correct(&item, &index, &opts).unwrap();
            assert_eq!(result.seq.len(), seq.len());
            assert!(result
                .seq
                .iter()
                .all(|b| matches!(b, b'A' | b'C' | b'G' | b'T' | b'N')));
        }
    }
}
