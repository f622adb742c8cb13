//! # GA4GH VRS Allele translation
//!
//! This crate turns VCF-style allele descriptions into GA4GH VRS Alleles with
//! computed identifiers. It provides:
//!
//! - VRS data models (Allele, SequenceLocation, etc.), serializable as VRS 2.0 JSON
//! - VRS digest computation (canonical JSON serialization + SHA-512/24u)
//! - Allele normalization (fully-justified trimming and rolling)
//! - `Translator`: resolves (chrom, pos, ref, alt) against a `SequenceStore`

pub mod digest;
pub mod error;
pub mod models;
pub mod normalize;
pub mod translator;

pub use digest::{DigestWriter, allele_digest, allele_identifier, sequence_location_digest};
pub use error::TranslateError;
pub use models::{Allele, AlleleState, SequenceLocation, SequenceReference};
pub use normalize::{NormalizeError, NormalizedAllele, normalize};
pub use translator::{Translator, TranslatorOptions};
