//! The distinct Alleles resolved during a run.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;
use vats_vrs::Allele;

use crate::error::{AnnotateError, Result};
use crate::output::{OutputFile, is_gzip_path};

/// Resolved Alleles keyed by identifier.
///
/// Adding an identifier that is already present keeps the first Allele.
/// Iteration and the persisted file are ordered by identifier, so the
/// artifact does not depend on input order or thread scheduling.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct AlleleCollection {
    alleles: BTreeMap<String, Allele>,
}

impl AlleleCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an Allele; returns `false` when its identifier was already present.
    pub fn add(&mut self, allele: Allele) -> bool {
        let id = allele.identifier();
        if self.alleles.contains_key(&id) {
            return false;
        }
        self.alleles.insert(id, allele);
        true
    }

    pub fn len(&self) -> usize {
        self.alleles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alleles.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.alleles.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Allele> {
        self.alleles.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.alleles.keys().map(String::as_str)
    }

    /// Write the collection as a JSON object of identifier to Allele.
    ///
    /// Consumes the collection, so a run writes it at most once. A path
    /// ending in `.gz` is gzip compressed.
    pub fn flush(self, path: &Path) -> Result<usize> {
        let count = self.alleles.len();
        let persisted = write_json(&self.alleles, path).map_err(|source| AnnotateError::Persistence {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Wrote {} distinct alleles to {}", count, persisted.display());
        Ok(count)
    }

    /// Read a collection written by [`AlleleCollection::flush`].
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let reader: Box<dyn Read> = if is_gzip_path(path) {
            Box::new(MultiGzDecoder::new(file))
        } else {
            Box::new(file)
        };
        let alleles: BTreeMap<String, Allele> =
            serde_json::from_reader(BufReader::new(reader)).map_err(io::Error::other)?;
        Ok(Self { alleles })
    }
}

fn write_json(alleles: &BTreeMap<String, Allele>, path: &Path) -> io::Result<PathBuf> {
    let mut output = BufWriter::new(OutputFile::create(path)?);
    serde_json::to_writer_pretty(&mut output, alleles).map_err(io::Error::other)?;
    output.write_all(b"\n")?;
    let output = output.into_inner().map_err(|e| e.into_error())?;
    output.commit()
}
