//! VCF allele to VRS Allele translation.
//!
//! `Translator` resolves a VCF-style description (chromosome, 1-based
//! position, REF, one ALT) against a `SequenceStore`, normalizes it and
//! returns an identified VRS Allele.

use std::path::Path;
use std::sync::Arc;

use vats_refget::SequenceStore;

use crate::digest::DigestWriter;
use crate::error::TranslateError;
use crate::models::Allele;
use crate::normalize::normalize;

/// Options controlling translation.
#[derive(Debug, Clone)]
pub struct TranslatorOptions {
    /// Reject alleles whose REF does not match the reference sequence.
    pub validate_reference: bool,
}

impl Default for TranslatorOptions {
    fn default() -> Self {
        Self {
            validate_reference: true,
        }
    }
}

/// Translates VCF alleles into identified VRS Alleles.
///
/// The store is shared read-only, so a `Translator` can be used from several
/// threads at once.
#[derive(Debug, Clone)]
pub struct Translator {
    store: Arc<SequenceStore>,
    options: TranslatorOptions,
}

impl Translator {
    pub fn new(store: Arc<SequenceStore>) -> Self {
        Self::with_options(store, TranslatorOptions::default())
    }

    pub fn with_options(store: Arc<SequenceStore>, options: TranslatorOptions) -> Self {
        Self { store, options }
    }

    /// Build a translator over every sequence of a FASTA file.
    pub fn from_fasta<P: AsRef<Path>>(path: P) -> vats_refget::Result<Self> {
        let store = SequenceStore::from_fasta(path)?;
        Ok(Self::new(Arc::new(store)))
    }

    pub fn store(&self) -> &SequenceStore {
        &self.store
    }

    pub fn options(&self) -> &TranslatorOptions {
        &self.options
    }

    /// Verify the translator can resolve anything at all.
    pub fn check_ready(&self) -> Result<(), TranslateError> {
        if self.store.is_empty() {
            return Err(TranslateError::EmptyStore);
        }
        Ok(())
    }

    /// Translate one VCF allele into an identified VRS Allele.
    ///
    /// # Arguments
    /// * `chrom` - Chromosome name, alias or refget accession
    /// * `pos` - 1-based VCF position
    /// * `ref_allele` - VCF REF
    /// * `alt_allele` - a single VCF ALT
    pub fn translate_vcf(
        &self,
        chrom: &str,
        pos: u64,
        ref_allele: &str,
        alt_allele: &str,
    ) -> Result<Allele, TranslateError> {
        let unsupported = |allele: &str, reason: &'static str| TranslateError::Unsupported {
            chrom: chrom.to_string(),
            pos,
            allele: allele.to_string(),
            reason,
        };

        if alt_allele.starts_with('<') {
            return Err(unsupported(alt_allele, "symbolic alleles cannot be translated"));
        }
        if alt_allele.contains(['[', ']']) {
            return Err(unsupported(alt_allele, "breakend alleles cannot be translated"));
        }
        match alt_allele {
            "*" => return Err(unsupported(alt_allele, "spanning deletion")),
            "." | "" => return Err(unsupported(alt_allele, "missing allele")),
            _ => {}
        }
        if !alt_allele.bytes().all(|b| b.is_ascii_alphabetic()) {
            return Err(unsupported(alt_allele, "non-nucleotide characters"));
        }
        if ref_allele.is_empty() || !ref_allele.bytes().all(|b| b.is_ascii_alphabetic()) {
            return Err(unsupported(ref_allele, "invalid reference allele"));
        }
        if pos == 0 {
            return Err(TranslateError::InvalidCoordinates {
                chrom: chrom.to_string(),
                pos,
                message: "VCF positions are 1-based".to_string(),
            });
        }

        let record = self
            .store
            .get(chrom)
            .ok_or_else(|| TranslateError::UnknownSequence(chrom.to_string()))?;
        let sequence = record.sequence();

        let ref_upper = ref_allele.to_ascii_uppercase();
        let alt_upper = alt_allele.to_ascii_uppercase();
        let start = pos - 1; // VCF is 1-based → 0-based

        if self.options.validate_reference {
            let found = usize::try_from(start)
                .ok()
                .and_then(|s| record.get_substring(s, s + ref_upper.len()).ok())
                .ok_or_else(|| TranslateError::InvalidCoordinates {
                    chrom: chrom.to_string(),
                    pos,
                    message: format!(
                        "REF of length {} runs past the end of {} (length {})",
                        ref_upper.len(),
                        record.metadata().name,
                        sequence.len()
                    ),
                })?;
            if found != ref_upper.as_bytes() {
                return Err(TranslateError::ReferenceMismatch {
                    chrom: chrom.to_string(),
                    pos,
                    expected: ref_upper,
                    found: String::from_utf8_lossy(found).into_owned(),
                });
            }
        }

        let norm = normalize(sequence, start, ref_upper.as_bytes(), alt_upper.as_bytes()).map_err(
            |e| TranslateError::InvalidCoordinates {
                chrom: chrom.to_string(),
                pos,
                message: e.to_string(),
            },
        )?;
        let norm_seq = String::from_utf8_lossy(&norm.allele).into_owned();

        let accession = record.metadata().refget_accession();
        let digests =
            DigestWriter::new().literal_digests(&accession, norm.start, norm.end, &norm_seq);

        let mut allele = Allele::literal(&accession, norm.start, norm.end, &norm_seq);
        allele.location.id = Some(format!("ga4gh:SL.{}", digests.location));
        allele.location.digest = Some(digests.location);
        allele.id = Some(format!("ga4gh:VA.{}", digests.allele));
        allele.digest = Some(digests.allele);

        log::trace!(
            "Translated {}:{} {}>{} to {}",
            chrom,
            pos,
            ref_allele,
            alt_allele,
            allele.identifier()
        );
        Ok(allele)
    }
}
