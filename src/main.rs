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
use std::fs::File;
use std::io::{BufWriter, Write};

use clap::Parser;
use log::info;
use needletail::Sequence;
use rayon::iter::IntoParallelRefIterator;
use rayon::iter::ParallelIterator;

use reko::index::SpectrumIndex;
use reko::postprocess::ErrorCorrectPostProcess;
use reko::read::{ReadRecord, WorkItem};
use reko::threshold::CorrectionThresholds;
use reko::{Algorithm, CorrectOpts, CorrectionResult};

// Command-line interface
mod cli;

// Reads all records from a fastX file, keeping ids and qualities
fn read_fastx_records(file: &str) -> Vec<ReadRecord> {
    let mut records: Vec<ReadRecord> = Vec::new();
    let mut reader = needletail::parse_fastx_file(file)
        .unwrap_or_else(|_| panic!("Expected valid fastX file at {}", file));
    while let Some(rec) = reader.next() {
        let seqrec = rec.expect("Valid fastX record");
        let id = String::from_utf8_lossy(seqrec.id()).into_owned();
        let seq = seqrec.normalize(true).into_owned();
        let qual = seqrec.qual().map(|q| q.to_vec()).unwrap_or_default();
        records.push(ReadRecord::new(id, seq, qual));
    }
    records
}

/// Initializes the logger with verbosity given in `log_max_level`.
fn init_log(log_max_level: usize) {
    stderrlog::new()
        .module(module_path!())
        .quiet(false)
        .verbosity(log_max_level)
        .timestamp(stderrlog::Timestamp::Off)
        .init()
        .unwrap();
}

fn open_writer(path: &str) -> BufWriter<File> {
    BufWriter::new(
        File::create(path).unwrap_or_else(|_| panic!("Expected write access to {}", path)),
    )
}

/// Use `reko` to list the available commands or `reko <command>` to run.
///
/// # Input format detection
/// The sequence data is read using
/// [needletail::parser::parse_fastx_file](https://docs.rs/needletail/latest/needletail/parser/fn.parse_fastx_file.html).
///
/// Input file format (fasta or fastq) is detected automatically and the
/// files may be compressed in a
/// [DEFLATE-based](https://en.wikipedia.org/wiki/Deflate) format (.gz
/// files). Quality strings are expected in phred+33 encoding.
///
fn main() {
    let cli = cli::Cli::parse();

    // Subcommands:
    match &cli.command {
        Some(cli::Commands::Correct {
            seq_files,
            output,
            discard_file,
            metrics_file,
            algorithm,
            kmer_length,
            kmer_threshold,
            num_kmer_rounds,
            min_overlap,
            num_overlap_rounds,
            conflict_cutoff,
            depth_filter,
            print_overlaps,
            num_threads,
            verbose,
        }) => {
            init_log(if *verbose { 2 } else { 1 });

            let opts = CorrectOpts {
                algorithm: match algorithm.as_str() {
                    "kmer" => Algorithm::Kmer,
                    "overlap" => Algorithm::Overlap,
                    _ => Algorithm::Hybrid,
                },
                kmer_length: *kmer_length,
                num_kmer_rounds: *num_kmer_rounds,
                min_overlap: *min_overlap,
                num_overlap_rounds: *num_overlap_rounds,
                conflict_cutoff: *conflict_cutoff,
                depth_filter: *depth_filter,
                thresholds: CorrectionThresholds::with_base_support(*kmer_threshold),
                print_overlaps: *print_overlaps,
            };

            info!("Reading sequence data from {} files...", seq_files.len());
            let mut records: Vec<ReadRecord> = Vec::new();
            seq_files.iter().for_each(|file| {
                records.append(&mut read_fastx_records(file));
            });

            info!("Indexing {} reads...", records.len());
            let seqs: Vec<Vec<u8>> = records.iter().map(|r| r.seq.clone()).collect();
            let index = SpectrumIndex::from_reads(seqs, opts.kmer_length, opts.min_overlap);

            rayon::ThreadPoolBuilder::new()
                .num_threads(*num_threads)
                .thread_name(|i| format!("rayon-thread-{}", i))
                .build_global()
                .unwrap();

            info!("Correcting reads...");
            let items: Vec<WorkItem> = records
                .into_iter()
                .enumerate()
                .map(|(ordinal, read)| WorkItem { read, ordinal })
                .collect();
            let results: Vec<reko::Result<CorrectionResult>> = items
                .par_iter()
                .map(|item| reko::correct(item, &index, &opts))
                .collect();

            // The post-processor is a serial sink; results are consumed in
            // input order.
            let stdout = std::io::stdout();
            let mut kept_out: Box<dyn Write> = match output {
                Some(path) => Box::new(open_writer(path)),
                None => Box::new(BufWriter::new(stdout.lock())),
            };
            let mut discard_out: Option<Box<dyn Write>> = discard_file
                .as_ref()
                .map(|path| Box::new(open_writer(path)) as Box<dyn Write>);

            let mut postprocess = ErrorCorrectPostProcess::new(
                &mut *kept_out,
                discard_out.as_mut().map(|w| &mut **w as &mut dyn Write),
                metrics_file.is_some(),
            );
            for (item, result) in items.iter().zip(results.iter()) {
                let routed = match result {
                    Ok(result) => postprocess.process(item, result),
                    Err(_) => postprocess.discard(item),
                };
                routed.unwrap_or_else(|e| panic!("Failed to write output record: {}", e));
            }

            if let Some(path) = metrics_file {
                let mut metrics_out = open_writer(path);
                postprocess
                    .write_metrics(&mut metrics_out)
                    .unwrap_or_else(|_| panic!("Expected write access to {}", path));
            }
            postprocess.log_summary();
            drop(postprocess);

            kept_out.flush().expect("Flushed output stream");
            if let Some(mut out) = discard_out {
                out.flush().expect("Flushed discard stream");
            }
        }
        None => {}
    }
}
