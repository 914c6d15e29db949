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
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    // Correct sequencing errors in a read set
    Correct {
        // Input fasta or fastq read file(s); the reads also form the reference set
        #[arg(group = "input", required = true)]
        seq_files: Vec<String>,

        // Outputs
        #[arg(short = 'o', long = "output", required = false, help_heading = "Output")]
        output: Option<String>,
        #[arg(long = "discard-file", required = false, help_heading = "Output")]
        discard_file: Option<String>,
        #[arg(long = "metrics-file", required = false, help_heading = "Output")]
        metrics_file: Option<String>,

        // Correction parameters
        #[arg(short = 'a', long = "algorithm", default_value = "hybrid", value_parser = ["kmer", "overlap", "hybrid"], help_heading = "Correction")]
        algorithm: String,
        #[arg(short = 'k', long = "kmer-length", default_value_t = 31, help_heading = "Correction")]
        kmer_length: usize,
        #[arg(short = 'x', long = "kmer-threshold", default_value_t = 3, help_heading = "Correction")]
        kmer_threshold: u64,
        #[arg(long = "kmer-rounds", default_value_t = 10, help_heading = "Correction")]
        num_kmer_rounds: usize,
        #[arg(short = 'm', long = "min-overlap", default_value_t = 45, help_heading = "Correction")]
        min_overlap: usize,
        #[arg(long = "overlap-rounds", default_value_t = 1, help_heading = "Correction")]
        num_overlap_rounds: usize,
        #[arg(short = 'c', long = "conflict-cutoff", default_value_t = 5, help_heading = "Correction")]
        conflict_cutoff: usize,
        #[arg(short = 'd', long = "depth-filter", default_value_t = 10000, help_heading = "Correction")]
        depth_filter: usize,
        #[arg(long = "print-overlaps", default_value_t = false, help_heading = "Correction")]
        print_overlaps: bool,

        // Resources
        // // Threads
        #[arg(short = 't', long = "threads", default_value_t = 1)]
        num_threads: usize,

        // Verbosity
        #[arg(long = "verbose", default_value_t = false)]
        verbose: bool,
    },
}
