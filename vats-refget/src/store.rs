//! In-memory reference sequence store.
//!
//! `SequenceStore` holds decoded reference sequences and resolves a query
//! string to one of them. Queries may be:
//!
//! - the sequence name from the FASTA header (`chr1`)
//! - a refget accession, bare or namespaced (`SQ.<digest>`, `ga4gh:SQ.<digest>`)
//! - a registered alias (see [`SequenceStore::add_alias`] and [`SequenceStore::load_aliases`])
//! - the name with its `chr` prefix added or removed, when chr aliasing is enabled
//!
//! The store is read-only once built and can be shared across threads.

use std::collections::HashMap;
use std::fmt::Display;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::digest::sha512t24u;
use crate::error::{RefgetError, Result};
use crate::fasta::load_fasta;

/// Metadata for a single sequence.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SequenceMetadata {
    pub name: String,
    /// Description from FASTA header (text after first whitespace).
    #[serde(default)]
    pub description: Option<String>,
    pub length: usize,
    pub sha512t24u: String,
}

impl SequenceMetadata {
    /// Refget accession for this sequence, e.g. `SQ.F-LrLMe1SRpfUZHkQmvkVKFEGaoDeHul`.
    pub fn refget_accession(&self) -> String {
        format!("SQ.{}", self.sha512t24u)
    }
}

/// A sequence with its metadata. Residues are stored upper-cased.
#[derive(Clone, Debug)]
pub struct SequenceRecord {
    metadata: SequenceMetadata,
    sequence: Vec<u8>,
}

impl SequenceRecord {
    /// Build a record, upper-casing the residues and computing the refget digest.
    pub fn new(name: impl Into<String>, description: Option<String>, mut sequence: Vec<u8>) -> Self {
        sequence.make_ascii_uppercase();
        let metadata = SequenceMetadata {
            name: name.into(),
            description,
            length: sequence.len(),
            sha512t24u: sha512t24u(&sequence),
        };
        Self { metadata, sequence }
    }

    pub fn metadata(&self) -> &SequenceMetadata {
        &self.metadata
    }

    pub fn sequence(&self) -> &[u8] {
        &self.sequence
    }

    /// Get the residues in the 0-based, half-open interval `[start, end)`.
    pub fn get_substring(&self, start: usize, end: usize) -> Result<&[u8]> {
        if start > end || end > self.sequence.len() {
            return Err(RefgetError::OutOfBounds {
                name: self.metadata.name.clone(),
                start,
                end,
                length: self.sequence.len(),
            });
        }
        Ok(&self.sequence[start..end])
    }
}

impl Display for SequenceRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SequenceRecord: {} (length: {}, ga4gh: SQ.{})",
            self.metadata.name, self.metadata.length, self.metadata.sha512t24u
        )
    }
}

/// Reference sequences addressable by name, alias or refget digest.
#[derive(Debug, Default)]
pub struct SequenceStore {
    records: Vec<SequenceRecord>,
    // name or alias -> index into records
    names: HashMap<String, usize>,
    // sha512t24u digest (without "SQ.") -> index into records
    digests: HashMap<String, usize>,
    chr_aliases: bool,
}

impl SequenceStore {
    /// Create an empty store with chr aliasing enabled.
    pub fn in_memory() -> Self {
        Self {
            chr_aliases: true,
            ..Default::default()
        }
    }

    /// Create a store holding every sequence of a FASTA file.
    pub fn from_fasta<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut store = Self::in_memory();
        store.add_sequences_from_fasta(path)?;
        Ok(store)
    }

    /// Toggle resolution of `chr1` to `1` and vice versa.
    pub fn set_chr_aliases(&mut self, enabled: bool) {
        self.chr_aliases = enabled;
    }

    /// Add a sequence. Returns its metadata.
    pub fn add_sequence(
        &mut self,
        name: &str,
        description: Option<String>,
        sequence: Vec<u8>,
    ) -> Result<&SequenceMetadata> {
        if self.names.contains_key(name) {
            return Err(RefgetError::DuplicateName(name.to_string()));
        }
        let record = SequenceRecord::new(name, description, sequence);
        let idx = self.records.len();
        self.names.insert(name.to_string(), idx);
        self.digests
            .entry(record.metadata.sha512t24u.clone())
            .or_insert(idx);
        self.records.push(record);
        Ok(&self.records[idx].metadata)
    }

    /// Add every sequence of a FASTA file. Returns the number of sequences added.
    pub fn add_sequences_from_fasta<P: AsRef<Path>>(&mut self, path: P) -> Result<usize> {
        let path = path.as_ref();
        let records = load_fasta(path)?;
        let count = records.len();
        for record in records {
            self.add_sequence(&record.name, record.description, record.sequence)?;
        }
        log::info!("Loaded {} sequences from {}", count, path.display());
        Ok(count)
    }

    /// Register `alias` for the sequence that `target` (a name or digest) resolves to.
    pub fn add_alias(&mut self, alias: &str, target: &str) -> Result<()> {
        let idx = self
            .resolve_index(target)
            .ok_or_else(|| RefgetError::SequenceNotFound(target.to_string()))?;
        self.names.insert(alias.to_string(), idx);
        Ok(())
    }

    /// Load aliases from a TSV file.
    /// Format: alias\ttarget per line. Lines starting with '#' are comments.
    pub fn load_aliases<P: AsRef<Path>>(&mut self, path: P) -> Result<usize> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let mut count = 0;
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            if line.starts_with('#') || line.trim().is_empty() {
                continue;
            }
            match line.split_once('\t') {
                Some((alias, target)) => {
                    self.add_alias(alias.trim(), target.trim())?;
                    count += 1;
                }
                None => {
                    return Err(RefgetError::InvalidAlias {
                        path: path.to_path_buf(),
                        line: i + 1,
                        content: line,
                    });
                }
            }
        }
        log::debug!("Loaded {} aliases from {}", count, path.display());
        Ok(count)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over the metadata of every sequence, in insertion order.
    pub fn sequence_metadata(&self) -> impl Iterator<Item = &SequenceMetadata> + '_ {
        self.records.iter().map(|r| &r.metadata)
    }

    /// Look up a sequence by name, alias or digest.
    pub fn get(&self, query: &str) -> Option<&SequenceRecord> {
        self.resolve_index(query).map(|idx| &self.records[idx])
    }

    /// Look up a sequence, failing with `SequenceNotFound`.
    pub fn get_sequence(&self, query: &str) -> Result<&SequenceRecord> {
        self.get(query)
            .ok_or_else(|| RefgetError::SequenceNotFound(query.to_string()))
    }

    /// Get the residues of `query` in the 0-based, half-open interval `[start, end)`.
    pub fn get_substring(&self, query: &str, start: usize, end: usize) -> Result<&[u8]> {
        self.get_sequence(query)?.get_substring(start, end)
    }

    fn resolve_index(&self, query: &str) -> Option<usize> {
        if let Some(idx) = self.names.get(query) {
            return Some(*idx);
        }
        let digest = query
            .strip_prefix("ga4gh:SQ.")
            .or_else(|| query.strip_prefix("SQ."));
        if let Some(idx) = digest.and_then(|d| self.digests.get(d)) {
            return Some(*idx);
        }
        self.resolve_name(query)
    }

    fn resolve_name(&self, name: &str) -> Option<usize> {
        if let Some(idx) = self.names.get(name) {
            return Some(*idx);
        }
        if !self.chr_aliases {
            return None;
        }
        match name.strip_prefix("chr") {
            Some(bare) => self.names.get(bare).copied(),
            None => self.names.get(&format!("chr{}", name)).copied(),
        }
    }
}

impl Display for SequenceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SequenceStore: {} sequences", self.records.len())
    }
}
