//! # Reference sequences for VRS translation
//!
//! This crate provides the reference-sequence source that VRS translation
//! resolves alleles against.
//!
//! # Module Structure
//!
//! - `digest` - GA4GH hash functions (sha512t24u, canonicalize_json)
//! - `fasta` - FASTA parsing from any `BufRead`, with gzip auto-detection for files
//! - `store` - `SequenceStore`, an in-memory store addressable by name, alias or refget digest
//! - `error` - Error type shared by the modules above

pub mod digest;
pub mod error;
pub mod fasta;
pub mod store;

pub use digest::{canonicalize_json, sha512t24u};
pub use error::{RefgetError, Result};
pub use fasta::{FastaRecord, load_fasta, parse_fasta_header, read_fasta};
pub use store::{SequenceMetadata, SequenceRecord, SequenceStore};
