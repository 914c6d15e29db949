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
//! Serial post-processing of correction results: QC routing to the kept and
//! discard sinks, and correction metrics.
//!
//! The post-processor is a serial sink; a multi-lane dispatcher must feed it
//! results in input order. The output streams stay owned by the caller and
//! are never closed here.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::io::Write;

use log::info;

use crate::error::Result;
use crate::read::WorkItem;
use crate::CorrectionResult;

/// Sample and error tallies for one histogram key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricCounts {
    pub samples: u64,
    pub errors: u64,
}

/// A sample/error histogram over an ordered key, emitted as a tab-separated
/// table in key order.
#[derive(Debug, Default)]
pub struct MetricTable<K: Ord + Display> {
    counts: BTreeMap<K, MetricCounts>,
}

impl<K: Ord + Display> MetricTable<K> {
    pub fn new() -> MetricTable<K> {
        MetricTable {
            counts: BTreeMap::new(),
        }
    }

    pub fn increment_sample(&mut self, key: K) {
        self.counts.entry(key).or_default().samples += 1;
    }

    pub fn increment_error(&mut self, key: K) {
        self.counts.entry(key).or_default().errors += 1;
    }

    pub fn get(&self, key: &K) -> MetricCounts {
        self.counts.get(key).copied().unwrap_or_default()
    }

    pub fn write<W: Write>(&self, out: &mut W, header: &str, label: &str) -> std::io::Result<()> {
        writeln!(out, "{}", header)?;
        writeln!(out, "{}\tsamples\terrors", label)?;
        for (key, counts) in self.counts.iter() {
            writeln!(out, "{}\t{}\t{}", key, counts.samples, counts.errors)?;
        }
        Ok(())
    }
}

/// Running totals reported at the end of a correction run.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostProcessStats {
    pub total_bases: u64,
    pub total_errors: u64,
    pub reads_kept: u64,
    pub reads_discarded: u64,
    pub kmer_qc_passed: u64,
    pub overlap_qc_passed: u64,
    pub qc_failed: u64,
}

const PRECEDING_LEN: usize = 2;

/// Routes corrected records to the kept or discard sink and aggregates
/// correction metrics for passing reads.
pub struct ErrorCorrectPostProcess<'a> {
    kept_out: &'a mut dyn Write,
    discard_out: Option<&'a mut dyn Write>,
    collect_metrics: bool,
    stats: PostProcessStats,
    position_metrics: MetricTable<usize>,
    base_metrics: MetricTable<char>,
    quality_metrics: MetricTable<char>,
    preceding_metrics: MetricTable<String>,
}

impl<'a> ErrorCorrectPostProcess<'a> {
    pub fn new(
        kept_out: &'a mut dyn Write,
        discard_out: Option<&'a mut dyn Write>,
        collect_metrics: bool,
    ) -> ErrorCorrectPostProcess<'a> {
        ErrorCorrectPostProcess {
            kept_out,
            discard_out,
            collect_metrics,
            stats: PostProcessStats::default(),
            position_metrics: MetricTable::new(),
            base_metrics: MetricTable::new(),
            quality_metrics: MetricTable::new(),
            preceding_metrics: MetricTable::new(),
        }
    }

    /// Routes one correction result. A read passes when either quality
    /// check succeeded; failing reads go uncorrected to the discard sink,
    /// or to the kept sink when no discard sink is configured.
    pub fn process(&mut self, item: &WorkItem, result: &CorrectionResult) -> Result<()> {
        let qc_pass = if result.kmer_qc {
            self.stats.kmer_qc_passed += 1;
            true
        } else if result.overlap_qc {
            self.stats.overlap_qc_passed += 1;
            true
        } else {
            self.stats.qc_failed += 1;
            false
        };

        if self.collect_metrics && qc_pass {
            self.collect(&item.read.seq, &result.seq, &item.read.qual);
        }

        match (&mut self.discard_out, qc_pass) {
            (Some(out), false) => {
                item.read.write(out)?;
                self.stats.reads_discarded += 1;
            }
            _ => {
                let mut record = item.read.clone();
                record.seq = result.seq.clone();
                record.write(&mut self.kept_out)?;
                self.stats.reads_kept += 1;
            }
        }
        Ok(())
    }

    /// Routes a read that could not be corrected at all (malformed record or
    /// index failure) without edits.
    pub fn discard(&mut self, item: &WorkItem) -> Result<()> {
        self.stats.qc_failed += 1;
        match &mut self.discard_out {
            Some(out) => {
                item.read.write(out)?;
                self.stats.reads_discarded += 1;
            }
            None => {
                item.read.write(&mut self.kept_out)?;
                self.stats.reads_kept += 1;
            }
        }
        Ok(())
    }

    fn collect(&mut self, original: &[u8], corrected: &[u8], qual: &[u8]) {
        for i in 0..original.len() {
            self.stats.total_bases += 1;

            self.position_metrics.increment_sample(i);
            self.base_metrics.increment_sample(original[i] as char);
            if !qual.is_empty() {
                self.quality_metrics.increment_sample(qual[i] as char);
            }
            let preceding = if i > PRECEDING_LEN {
                Some(String::from_utf8_lossy(&original[i - PRECEDING_LEN..i]).into_owned())
            } else {
                None
            };
            if let Some(mer) = preceding.as_ref() {
                self.preceding_metrics.increment_sample(mer.clone());
            }

            if original[i] != corrected[i] {
                self.stats.total_errors += 1;
                self.position_metrics.increment_error(i);
                self.base_metrics.increment_error(original[i] as char);
                if !qual.is_empty() {
                    self.quality_metrics.increment_error(qual[i] as char);
                }
                if let Some(mer) = preceding {
                    self.preceding_metrics.increment_error(mer);
                }
            }
        }
    }

    pub fn stats(&self) -> PostProcessStats {
        self.stats
    }

    pub fn position_metrics(&self) -> &MetricTable<usize> {
        &self.position_metrics
    }

    /// Emits the four metric tables.
    pub fn write_metrics<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        self.position_metrics
            .write(out, "Bases corrected by position", "pos")?;
        self.base_metrics
            .write(out, "\nOriginal base that was corrected", "base")?;
        self.preceding_metrics
            .write(out, "\n2-mer preceding the corrected base", "mer")?;
        self.quality_metrics
            .write(out, "\nBases corrected by quality value", "quality")?;
        Ok(())
    }

    /// Logs the final tallies.
    pub fn log_summary(&self) {
        let stats = &self.stats;
        info!("Reads passed k-mer QC check: {}", stats.kmer_qc_passed);
        info!("Reads passed overlap QC check: {}", stats.overlap_qc_passed);
        info!("Reads failed QC: {}", stats.qc_failed);
        info!(
            "Kept {} reads, discarded {} reads",
            stats.reads_kept, stats.reads_discarded
        );
        if stats.total_bases > 0 {
            info!(
                "Corrected {} out of {} bases ({:.6})",
                stats.total_errors,
                stats.total_bases,
                stats.total_errors as f64 / stats.total_bases as f64
            );
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
//
#[cfg(test)]
mod tests {
    use super::*;
    use crate::read::{ReadRecord, WorkItem};

    fn item(seq: &[u8], qual: &[u8]) -> WorkItem {
        WorkItem {
            read: ReadRecord::new("r", seq.to_vec(), qual.to_vec()),
            ordinal: 0,
        }
    }

    fn passing_result(seq: &[u8]) -> CorrectionResult {
        CorrectionResult {
            seq: seq.to_vec(),
            kmer_qc: true,
            overlap_qc: false,
            num_prefix_overlaps: 0,
            num_suffix_overlaps: 0,
        }
    }

    #[test]
    fn passing_read_is_written_corrected() {
        let mut kept: Vec<u8> = Vec::new();
        let mut pp = ErrorCorrectPostProcess::new(&mut kept, None, false);

        let item = item(b"ACGT", b"IIII");
        pp.process(&item, &passing_result(b"AGGT")).unwrap();

        let stats = pp.stats();
        assert_eq!(stats.reads_kept, 1);
        assert_eq!(stats.kmer_qc_passed, 1);
        drop(pp);
        assert_eq!(kept, b"@r\nAGGT\n+\nIIII\n");
    }

    #[test]
    fn failing_read_goes_uncorrected_to_discard() {
        let mut kept: Vec<u8> = Vec::new();
        let mut discard: Vec<u8> = Vec::new();
        let mut pp = ErrorCorrectPostProcess::new(&mut kept, Some(&mut discard), false);

        let item = item(b"ACGT", b"IIII");
        let result = CorrectionResult {
            seq: b"AGGT".to_vec(),
            kmer_qc: false,
            overlap_qc: false,
            num_prefix_overlaps: 0,
            num_suffix_overlaps: 0,
        };
        pp.process(&item, &result).unwrap();

        let stats = pp.stats();
        assert_eq!(stats.reads_discarded, 1);
        assert_eq!(stats.qc_failed, 1);
        drop(pp);
        assert!(kept.is_empty());
        assert_eq!(discard, b"@r\nACGT\n+\nIIII\n");
    }

    #[test]
    fn failing_read_without_discard_sink_is_kept() {
        let mut kept: Vec<u8> = Vec::new();
        let mut pp = ErrorCorrectPostProcess::new(&mut kept, None, false);

        let item = item(b"ACGT", b"IIII");
        let result = CorrectionResult {
            seq: b"ACGT".to_vec(),
            kmer_qc: false,
            overlap_qc: false,
            num_prefix_overlaps: 0,
            num_suffix_overlaps: 0,
        };
        pp.process(&item, &result).unwrap();

        let stats = pp.stats();
        assert_eq!(stats.reads_kept, 1);
        assert_eq!(stats.qc_failed, 1);
    }

    #[test]
    fn malformed_read_routes_to_discard() {
        let mut kept: Vec<u8> = Vec::new();
        let mut discard: Vec<u8> = Vec::new();
        let mut pp = ErrorCorrectPostProcess::new(&mut kept, Some(&mut discard), false);

        let item = item(b"ACXT", b"IIII");
        pp.discard(&item).unwrap();

        let stats = pp.stats();
        assert_eq!(stats.reads_discarded, 1);
        drop(pp);
        assert_eq!(discard, b"@r\nACXT\n+\nIIII\n");
    }

    #[test]
    fn metrics_track_samples_and_errors() {
        let mut kept: Vec<u8> = Vec::new();
        let mut pp = ErrorCorrectPostProcess::new(&mut kept, None, true);

        let item = item(b"AATA", b"II#I");
        pp.process(&item, &passing_result(b"AACA")).unwrap();

        let stats = pp.stats();
        assert_eq!(stats.total_bases, 4);
        assert_eq!(stats.total_errors, 1);
        assert_eq!(
            pp.position_metrics().get(&2),
            MetricCounts {
                samples: 1,
                errors: 1
            }
        );
        assert_eq!(pp.position_metrics().get(&0).errors, 0);
    }

    #[test]
    fn metrics_are_skipped_for_failing_reads() {
        let mut kept: Vec<u8> = Vec::new();
        let mut pp = ErrorCorrectPostProcess::new(&mut kept, None, true);

        let item = item(b"ACGT", b"IIII");
        let result = CorrectionResult {
            seq: b"ACGT".to_vec(),
            kmer_qc: false,
            overlap_qc: false,
            num_prefix_overlaps: 0,
            num_suffix_overlaps: 0,
        };
        pp.process(&item, &result).unwrap();
        assert_eq!(pp.stats().total_bases, 0);
    }

    #[test]
    fn preceding_mer_needs_three_leading_bases() {
        let mut kept: Vec<u8> = Vec::new();
        let mut pp = ErrorCorrectPostProcess::new(&mut kept, None, true);

        // errors at positions 2 and 3: only position 3 has a preceding 2-mer
        let item = item(b"ACGTA", b"IIIII");
        pp.process(&item, &passing_result(b"ACTAA")).unwrap();

        let mut out: Vec<u8> = Vec::new();
        pp.write_metrics(&mut out).unwrap();
        let table = String::from_utf8(out).unwrap();
        // preceding 2-mer of position 3 in the original read
        assert!(table.contains("CG\t1\t1"));
    }
}
