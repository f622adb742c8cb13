use thiserror::Error;

/// Error type for allele translation.
///
/// The store is in memory, so every variant describes a problem with the
/// allele or the store itself and will fail again on retry.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TranslateError {
    #[error("Sequence {0} is not in the reference store")]
    UnknownSequence(String),

    #[error("Invalid coordinates {chrom}:{pos}: {message}")]
    InvalidCoordinates {
        chrom: String,
        pos: u64,
        message: String,
    },

    #[error("Reference mismatch at {chrom}:{pos}: VCF REF is {expected}, reference sequence has {found}")]
    ReferenceMismatch {
        chrom: String,
        pos: u64,
        expected: String,
        found: String,
    },

    #[error("Unsupported allele {allele} at {chrom}:{pos}: {reason}")]
    Unsupported {
        chrom: String,
        pos: u64,
        allele: String,
        reason: &'static str,
    },

    #[error("Reference store contains no sequences")]
    EmptyStore,
}
