//! # VRS annotation of VCF files
//!
//! Streams a VCF file, resolves every ALT allele to a GA4GH VRS Allele through
//! an [`AlleleResolver`], writes the identifiers back into the INFO column and
//! persists the distinct resolved Alleles as a JSON collection.
//!
//! ```no_run
//! use std::path::Path;
//! use vats_annotate::{AnnotatorConfig, Pipeline};
//! use vats_vrs::Translator;
//!
//! let translator = Translator::from_fasta("GRCh38.fa.gz").unwrap();
//! let mut pipeline = Pipeline::new(translator, AnnotatorConfig::default());
//! let summary = pipeline
//!     .run(
//!         Path::new("input.vcf.gz"),
//!         Path::new("output.vcf.gz"),
//!         Some(Path::new("alleles.json")),
//!     )
//!     .unwrap();
//! println!("{}", summary);
//! ```

pub mod annotator;
pub mod collection;
pub mod config;
pub mod error;
pub mod header;
pub mod output;
pub mod pipeline;
pub mod reader;
pub mod record;
pub mod resolver;
pub mod summary;
pub mod writer;

pub use annotator::{AnnotatedRecord, AnnotationOutcome, Annotator};
pub use collection::AlleleCollection;
pub use config::{AnnotatorConfig, ConfigError, MalformedPolicy};
pub use error::{AnnotateError, FailureKind, MalformedRecordError, ResolutionFailure, Result};
pub use pipeline::{CancellationToken, Pipeline, PipelineState};
pub use reader::{VcfLine, VcfReader};
pub use record::{AlleleDescription, VariantRecord};
pub use resolver::{AlleleResolver, TimeoutResolver};
pub use summary::RunSummary;
pub use writer::VcfWriter;
