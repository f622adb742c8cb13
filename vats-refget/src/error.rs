use std::path::PathBuf;

use thiserror::Error;

/// Error type for reference sequence operations.
#[derive(Error, Debug)]
pub enum RefgetError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A FASTA file could not be parsed.
    #[error("Invalid FASTA at line {line}: {message}")]
    InvalidFasta { line: usize, message: String },

    /// Two sequences in the store share a name.
    #[error("Duplicate sequence name in store: {0}")]
    DuplicateName(String),

    /// No sequence matches the requested name, alias or digest.
    #[error("Sequence not found: {0}")]
    SequenceNotFound(String),

    /// The requested interval does not lie within the sequence.
    #[error("Region {start}-{end} is out of bounds for {name} (length {length})")]
    OutOfBounds {
        name: String,
        start: usize,
        end: usize,
        length: usize,
    },

    /// An alias file line is not `alias<TAB>target`.
    #[error("Invalid alias entry at {}:{line}: {content}", path.display())]
    InvalidAlias {
        path: PathBuf,
        line: usize,
        content: String,
    },
}

pub type Result<T> = std::result::Result<T, RefgetError>;
