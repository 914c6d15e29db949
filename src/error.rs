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
//! Error kinds reported by the correction core.
//!
//! Malformed records and index query failures abort correction of the
//! affected read; the caller routes the record to the discard sink. A failed
//! quality check is a normal outcome reported in
//! [CorrectionResult](crate::CorrectionResult), not an error.

/// Result type for correction operations, wrapping [CorrectError].
pub type Result<T> = std::result::Result<T, CorrectError>;

/// All error cases the correction core can report for a single work item.
#[derive(thiserror::Error, Debug)]
pub enum CorrectError {
    /// The sequence contains a character outside `{A,C,G,T,N}`.
    #[error("read {id}: sequence contains invalid character '{base}'")]
    InvalidBase { id: String, base: char },

    /// The sequence is empty.
    #[error("read {id}: sequence is empty")]
    EmptySequence { id: String },

    /// A quality string is present but its length differs from the sequence.
    #[error("read {id}: sequence length {seq_len} does not match quality length {qual_len}")]
    QualityLengthMismatch {
        id: String,
        seq_len: usize,
        qual_len: usize,
    },

    /// The index service failed to answer a query.
    #[error("index query failed: {0}")]
    IndexQuery(String),

    /// An output sink failed during post-processing.
    #[error("error writing record: {0}")]
    Io(#[from] std::io::Error),
}

impl CorrectError {
    /// True for errors caused by the input record itself rather than the
    /// index or the output sinks.
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            CorrectError::InvalidBase { .. }
                | CorrectError::EmptySequence { .. }
                | CorrectError::QualityLengthMismatch { .. }
        )
    }
}
