//! VRS digest computation.
//!
//! Computes GA4GH VRS digests by canonical JSON serialization + SHA-512/24u.
//!
//! The "fast" path (`DigestWriter`) writes canonical JSON directly into a
//! reusable buffer without serde_json::Value allocation. The translator uses
//! it once per alternate allele.
//!
//! The generic path (`allele_identifier`) goes through serde_json and covers
//! every state type. It is the correctness reference for the fast path.

use serde_json::json;
use sha2::{Digest, Sha512};
use vats_refget::{canonicalize_json, sha512t24u};

use crate::models::{Allele, AlleleState, SequenceLocation};

/// Digests of a literal-state Allele and of its SequenceLocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralDigests {
    pub location: String,
    pub allele: String,
}

/// Reusable digest writer that avoids per-call allocations.
///
/// Holds a scratch buffer for canonical JSON bytes and computes SHA-512/24u
/// digests with a stack-allocated hasher.
pub struct DigestWriter {
    buf: Vec<u8>,
}

impl Default for DigestWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl DigestWriter {
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(512),
        }
    }

    /// Compute the SequenceLocation and Allele digests for a LiteralSequenceExpression state.
    ///
    /// # JSON escaping
    ///
    /// `refget_accession` and `sequence` are written as raw bytes without
    /// JSON escaping. The accession is `SQ.` + base64url characters and the
    /// translator only emits upper-case nucleotide sequences, so neither
    /// contains JSON-special characters. `test_fast_path_matches_generic`
    /// checks equivalence with the serde_json path.
    pub fn literal_digests(
        &mut self,
        refget_accession: &str,
        start: u64,
        end: u64,
        sequence: &str,
    ) -> LiteralDigests {
        // {"end":N,"sequenceReference":{"refgetAccession":"...","type":"SequenceReference"},"start":N,"type":"SequenceLocation"}
        self.buf.clear();
        self.buf.extend_from_slice(b"{\"end\":");
        self.buf
            .extend_from_slice(itoa::Buffer::new().format(end).as_bytes());
        self.buf
            .extend_from_slice(b",\"sequenceReference\":{\"refgetAccession\":\"");
        self.buf.extend_from_slice(refget_accession.as_bytes());
        self.buf
            .extend_from_slice(b"\",\"type\":\"SequenceReference\"},\"start\":");
        self.buf
            .extend_from_slice(itoa::Buffer::new().format(start).as_bytes());
        self.buf.extend_from_slice(b",\"type\":\"SequenceLocation\"}");

        let location = sha512t24u_inline(&self.buf);

        // {"location":"<sl_digest>","state":{"sequence":"...","type":"LiteralSequenceExpression"},"type":"Allele"}
        self.buf.clear();
        self.buf.extend_from_slice(b"{\"location\":\"");
        self.buf.extend_from_slice(location.as_bytes());
        self.buf.extend_from_slice(b"\",\"state\":{\"sequence\":\"");
        self.buf.extend_from_slice(sequence.as_bytes());
        self.buf
            .extend_from_slice(b"\",\"type\":\"LiteralSequenceExpression\"},\"type\":\"Allele\"}");

        let allele = sha512t24u_inline(&self.buf);

        LiteralDigests { location, allele }
    }

    /// Compute `ga4gh:VA.<digest>` for a VRS Allele with a LiteralSequenceExpression state.
    pub fn allele_identifier_literal(
        &mut self,
        refget_accession: &str,
        start: u64,
        end: u64,
        sequence: &str,
    ) -> String {
        let digests = self.literal_digests(refget_accession, start, end, sequence);
        format!("ga4gh:VA.{}", digests.allele)
    }
}

/// SHA-512 truncated to 24 bytes, base64url-encoded. Stack-allocated hasher.
#[inline]
fn sha512t24u_inline(data: &[u8]) -> String {
    let mut hasher = Sha512::new();
    hasher.update(data);
    let hash = hasher.finalize();
    base64_url::encode(&hash[..24])
}

// === Generic path ===

/// Compute the GA4GH digest for a SequenceLocation.
pub fn sequence_location_digest(loc: &SequenceLocation) -> String {
    let json_val = json!({
        "end": loc.end,
        "sequenceReference": {
            "refgetAccession": loc.sequence_reference.refget_accession,
            "type": "SequenceReference"
        },
        "start": loc.start,
        "type": "SequenceLocation"
    });
    sha512t24u(canonicalize_json(&json_val))
}

/// Compute the GA4GH digest for an Allele.
pub fn allele_digest(allele: &Allele) -> String {
    let sl_digest = sequence_location_digest(&allele.location);
    let state_json = match &allele.state {
        AlleleState::LiteralSequenceExpression { sequence } => json!({
            "sequence": sequence,
            "type": "LiteralSequenceExpression"
        }),
        AlleleState::ReferenceLengthExpression {
            length,
            repeat_subunit_length,
            sequence,
        } => {
            let mut obj = json!({
                "length": length,
                "repeatSubunitLength": repeat_subunit_length,
                "type": "ReferenceLengthExpression"
            });
            if let Some(seq) = sequence {
                obj["sequence"] = serde_json::Value::String(seq.clone());
            }
            obj
        }
    };
    let json_val = json!({
        "location": sl_digest,
        "state": state_json,
        "type": "Allele"
    });
    sha512t24u(canonicalize_json(&json_val))
}

/// Compute the full GA4GH VRS identifier for an Allele.
pub fn allele_identifier(allele: &Allele) -> String {
    format!("ga4gh:VA.{}", allele_digest(allele))
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    const EGFR_ACCESSION: &str = "SQ.F-LrLMe1SRpfUZHkQmvkVKFEGaoDeHul";

    #[rstest]
    fn test_sequence_location_digest_deterministic() {
        let allele = Allele::literal(EGFR_ACCESSION, 55181319, 55181320, "T");
        let d1 = sequence_location_digest(&allele.location);
        let d2 = sequence_location_digest(&allele.location);
        assert_eq!(d1, d2);
        assert_eq!(d1.len(), 32);
    }

    #[rstest]
    fn test_allele_identifier_format() {
        let allele = Allele::literal(EGFR_ACCESSION, 55181319, 55181320, "T");
        let id = allele_identifier(&allele);
        assert!(id.starts_with("ga4gh:VA."));
        assert_eq!(id.len(), 9 + 32);
    }

    #[rstest]
    fn test_identity_fields_do_not_change_digest() {
        let bare = Allele::literal(EGFR_ACCESSION, 55181319, 55181320, "T");
        let identified = bare.clone().identify();
        assert_eq!(allele_digest(&bare), allele_digest(&identified));
    }

    /// Verify the fast path produces identical results to the generic path.
    #[rstest]
    #[case(55181319, 55181320, "T")]
    #[case(100, 100, "")]
    #[case(0, 12, "ACGTACGTACGTA")]
    fn test_fast_path_matches_generic(#[case] start: u64, #[case] end: u64, #[case] sequence: &str) {
        let allele = Allele::literal(EGFR_ACCESSION, start, end, sequence);

        let mut writer = DigestWriter::new();
        let digests = writer.literal_digests(EGFR_ACCESSION, start, end, sequence);

        assert_eq!(digests.location, sequence_location_digest(&allele.location));
        assert_eq!(digests.allele, allele_digest(&allele));
        assert_eq!(
            writer.allele_identifier_literal(EGFR_ACCESSION, start, end, sequence),
            allele_identifier(&allele)
        );
    }
}
