//! Per-record annotation.

use std::sync::Arc;

use vats_vrs::Allele;

use crate::config::AnnotatorConfig;
use crate::error::{FailureKind, ResolutionFailure};
use crate::header::{ENDS_FIELD, STARTS_FIELD, STATES_FIELD};
use crate::record::{AlleleDescription, VariantRecord};
use crate::resolver::AlleleResolver;

/// The result for one ALT allele.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationOutcome {
    Resolved(String),
    Failed(ResolutionFailure),
}

/// A record with its INFO column rewritten.
#[derive(Debug, Clone)]
pub struct AnnotatedRecord {
    pub record: VariantRecord,
    /// One entry per ALT, in ALT order.
    pub outcomes: Vec<AnnotationOutcome>,
    /// The Alleles behind the `Resolved` outcomes.
    pub alleles: Vec<Allele>,
    /// Resolver calls beyond the first, over all alleles.
    pub retries: u64,
}

impl AnnotatedRecord {
    pub fn resolved(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, AnnotationOutcome::Resolved(_)))
            .count()
    }

    pub fn unresolved(&self) -> usize {
        self.outcomes.len() - self.resolved()
    }
}

/// Resolves the alleles of a record and writes the results into its INFO column.
pub struct Annotator {
    resolver: Arc<dyn AlleleResolver>,
    info_field: String,
    unresolved_marker: String,
    transient_retries: u32,
    vrs_attributes: bool,
}

impl Annotator {
    pub fn new(resolver: Arc<dyn AlleleResolver>, config: &AnnotatorConfig) -> Self {
        Self {
            resolver,
            info_field: config.info_field.clone(),
            unresolved_marker: config.unresolved_marker.clone(),
            transient_retries: config.transient_retries,
            vrs_attributes: config.vrs_attributes,
        }
    }

    pub fn resolver(&self) -> &dyn AlleleResolver {
        self.resolver.as_ref()
    }

    /// Resolve one allele, retrying transient failures.
    ///
    /// Returns the result and the number of retries used. A transient failure
    /// that outlives its retries is reported as permanent.
    pub fn resolve(&self, allele: &AlleleDescription) -> (Result<Allele, ResolutionFailure>, u32) {
        let mut retries = 0;
        loop {
            match self.resolver.resolve(allele) {
                Err(failure) if failure.is_transient() => {
                    if retries < self.transient_retries {
                        retries += 1;
                        log::debug!(
                            "Retrying {}:{} {}>{} ({}/{}): {}",
                            allele.chrom,
                            allele.pos,
                            allele.reference,
                            allele.alternate,
                            retries,
                            self.transient_retries,
                            failure.reason
                        );
                        continue;
                    }
                    let failure = ResolutionFailure {
                        kind: FailureKind::Permanent,
                        reason: format!("{} (gave up after {} attempts)", failure.reason, retries + 1),
                    };
                    return (Err(failure), retries);
                }
                result => return (result, retries),
            }
        }
    }

    /// Resolve every ALT of `record` and rewrite its INFO column.
    pub fn annotate(&self, mut record: VariantRecord) -> AnnotatedRecord {
        let mut outcomes = Vec::with_capacity(record.alternates().len());
        let mut alleles = Vec::new();
        let mut starts = Vec::with_capacity(record.alternates().len());
        let mut ends = Vec::with_capacity(record.alternates().len());
        let mut states = Vec::with_capacity(record.alternates().len());
        let mut total_retries = 0u64;

        for description in record.allele_descriptions() {
            let (result, retries) = self.resolve(&description);
            total_retries += u64::from(retries);
            match result {
                Ok(allele) => {
                    let id = allele.identifier();
                    starts.push(allele.location.start.to_string());
                    ends.push(allele.location.end.to_string());
                    states.push(allele.state.sequence().unwrap_or_default().to_string());
                    outcomes.push(AnnotationOutcome::Resolved(id));
                    alleles.push(allele);
                }
                Err(failure) => {
                    log::debug!(
                        "Could not resolve {}:{} {}>{}: {}",
                        description.chrom,
                        description.pos,
                        description.reference,
                        description.alternate,
                        failure.reason
                    );
                    starts.push(self.unresolved_marker.clone());
                    ends.push(self.unresolved_marker.clone());
                    states.push(self.unresolved_marker.clone());
                    outcomes.push(AnnotationOutcome::Failed(failure));
                }
            }
        }

        let ids: Vec<&str> = outcomes
            .iter()
            .map(|outcome| match outcome {
                AnnotationOutcome::Resolved(id) => id.as_str(),
                AnnotationOutcome::Failed(_) => self.unresolved_marker.as_str(),
            })
            .collect();
        record.set_info(&self.info_field, &ids.join(","));
        if self.vrs_attributes {
            record.set_info(STARTS_FIELD, &starts.join(","));
            record.set_info(ENDS_FIELD, &ends.join(","));
            record.set_info(STATES_FIELD, &states.join(","));
        }

        AnnotatedRecord {
            record,
            outcomes,
            alleles,
            retries: total_retries,
        }
    }
}
