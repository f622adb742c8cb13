use std::fmt::Display;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;

/// Why a VCF data line could not be read as a variant record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedRecordError {
    #[error("expected at least 8 tab-separated columns, found {0}")]
    TooFewColumns(usize),

    #[error("CHROM is empty")]
    EmptyChrom,

    #[error("POS must be a positive integer, found {0:?}")]
    InvalidPosition(String),

    #[error("REF must be a non-empty sequence, found {0:?}")]
    InvalidReference(String),

    #[error("ALT lists no alternate alleles")]
    NoAlternates,

    #[error("ALT contains an empty allele: {0:?}")]
    EmptyAlternate(String),

    #[error("line is not valid UTF-8 (first bad byte at offset {0})")]
    InvalidUtf8(usize),
}

/// Whether a resolution failure is worth retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The allele itself cannot be resolved.
    Permanent,
    /// The resolver could not be consulted; the same call may succeed later.
    Transient,
}

/// A failed allele resolution.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind:?} resolution failure: {reason}")]
pub struct ResolutionFailure {
    pub kind: FailureKind,
    pub reason: String,
}

impl ResolutionFailure {
    pub fn permanent(reason: impl Display) -> Self {
        Self {
            kind: FailureKind::Permanent,
            reason: reason.to_string(),
        }
    }

    pub fn transient(reason: impl Display) -> Self {
        Self {
            kind: FailureKind::Transient,
            reason: reason.to_string(),
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind == FailureKind::Transient
    }
}

/// Error type for an annotation run.
#[derive(Error, Debug)]
pub enum AnnotateError {
    /// A data line could not be parsed and the run is configured to abort.
    #[error("Malformed record at line {line}: {source}")]
    MalformedRecord {
        line: u64,
        #[source]
        source: MalformedRecordError,
    },

    /// The allele collection could not be written.
    #[error("Failed to write allele collection to {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The resolver cannot work at all; detected before any record is read.
    #[error("Resolver is not usable: {0}")]
    Configuration(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Run cancelled after {records} records; no output was written")]
    Cancelled { records: u64 },

    /// A pipeline thread died.
    #[error("Pipeline failure: {0}")]
    Pipeline(String),
}

pub type Result<T> = std::result::Result<T, AnnotateError>;
