//! VRS data models.
//!
//! Structs representing GA4GH VRS 2.0 objects. They serialize to the VRS JSON
//! shape (camelCase keys, a `type` discriminator on every object), which is
//! also the format of the persisted allele collection. The optional `id` and
//! `digest` fields are filled in by [`Allele::identify`]; digest computation
//! itself never reads them.

use serde::{Deserialize, Serialize};

use crate::digest::{allele_digest, sequence_location_digest};

/// A reference to a specific sequence identified by its refget accession.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub struct SequenceReference {
    /// GA4GH refget accession, e.g. "SQ.F-LrL..."
    pub refget_accession: String,
}

/// A location on a sequence defined by start/end coordinates (interbase, 0-based).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub struct SequenceLocation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    pub sequence_reference: SequenceReference,
    pub start: u64,
    pub end: u64,
}

/// The state (alternate allele) of a VRS Allele.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AlleleState {
    /// A literal sequence expression (SNV, indel, MNV).
    LiteralSequenceExpression { sequence: String },
    /// A reference-length expression (for CNVs/repeats).
    #[serde(rename_all = "camelCase")]
    ReferenceLengthExpression {
        length: u64,
        repeat_subunit_length: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sequence: Option<String>,
    },
}

impl AlleleState {
    /// The literal sequence of the state, if it carries one.
    pub fn sequence(&self) -> Option<&str> {
        match self {
            AlleleState::LiteralSequenceExpression { sequence } => Some(sequence.as_str()),
            AlleleState::ReferenceLengthExpression { sequence, .. } => sequence.as_deref(),
        }
    }
}

/// A VRS Allele: a specific sequence state at a specific genomic location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub struct Allele {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    pub location: SequenceLocation,
    pub state: AlleleState,
}

impl Allele {
    /// Build an unidentified Allele with a literal sequence state.
    pub fn literal(refget_accession: &str, start: u64, end: u64, sequence: &str) -> Self {
        Allele {
            id: None,
            digest: None,
            location: SequenceLocation {
                id: None,
                digest: None,
                sequence_reference: SequenceReference {
                    refget_accession: refget_accession.to_string(),
                },
                start,
                end,
            },
            state: AlleleState::LiteralSequenceExpression {
                sequence: sequence.to_string(),
            },
        }
    }

    /// Compute and attach the identifiers and digests of the Allele and its location.
    pub fn identify(mut self) -> Self {
        let sl_digest = sequence_location_digest(&self.location);
        self.location.id = Some(format!("ga4gh:SL.{}", sl_digest));
        self.location.digest = Some(sl_digest);
        let va_digest = allele_digest(&self);
        self.id = Some(format!("ga4gh:VA.{}", va_digest));
        self.digest = Some(va_digest);
        self
    }

    /// The `ga4gh:VA.` identifier, computing it when the Allele was not identified.
    pub fn identifier(&self) -> String {
        match &self.id {
            Some(id) => id.clone(),
            None => format!("ga4gh:VA.{}", allele_digest(self)),
        }
    }
}
