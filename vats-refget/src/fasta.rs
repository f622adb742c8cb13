//! FASTA parsing.
//!
//! `read_fasta` works with any `BufRead` implementation; `load_fasta` opens a
//! file and transparently decompresses gzip/BGZF input, detected by its magic
//! bytes rather than by file extension.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::MultiGzDecoder;

use crate::error::{RefgetError, Result};

/// A single sequence read from a FASTA file. Residues are upper-cased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastaRecord {
    pub name: String,
    pub description: Option<String>,
    pub sequence: Vec<u8>,
}

/// Parse a FASTA header line (without the leading '>') into name and description.
///
/// Following FASTA standard: the sequence ID is the first word (up to first whitespace),
/// and everything after is the description.
///
/// # Examples
/// ```
/// use vats_refget::parse_fasta_header;
///
/// let (name, desc) = parse_fasta_header("chr1 some description here");
/// assert_eq!(name, "chr1");
/// assert_eq!(desc, Some("some description here".to_string()));
///
/// let (name, desc) = parse_fasta_header("chr1");
/// assert_eq!(name, "chr1");
/// assert_eq!(desc, None);
/// ```
pub fn parse_fasta_header(header: &str) -> (String, Option<String>) {
    let header = header.trim();
    match header.split_once(char::is_whitespace) {
        Some((id, desc)) => (id.to_string(), Some(desc.trim().to_string())),
        None => (header.to_string(), None),
    }
}

/// Read every record from a FASTA stream.
///
/// Blank lines are ignored. Sequence data before the first header is an error.
pub fn read_fasta<R: BufRead>(mut reader: R) -> Result<Vec<FastaRecord>> {
    let mut records = Vec::new();
    let mut current: Option<FastaRecord> = None;
    let mut line = String::new();
    let mut line_no = 0;

    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        line_no += 1;

        if let Some(header) = line.strip_prefix('>') {
            if let Some(done) = current.take() {
                records.push(done);
            }
            let (name, description) = parse_fasta_header(header);
            if name.is_empty() {
                return Err(RefgetError::InvalidFasta {
                    line: line_no,
                    message: "empty sequence name".to_string(),
                });
            }
            current = Some(FastaRecord {
                name,
                description,
                sequence: Vec::new(),
            });
            continue;
        }

        let trimmed = line.trim_end();
        if trimmed.is_empty() {
            continue;
        }
        match current.as_mut() {
            Some(record) => record
                .sequence
                .extend(trimmed.bytes().map(|b| b.to_ascii_uppercase())),
            None => {
                return Err(RefgetError::InvalidFasta {
                    line: line_no,
                    message: "sequence data before the first header".to_string(),
                });
            }
        }
    }

    if let Some(done) = current.take() {
        records.push(done);
    }
    Ok(records)
}

/// Open a FASTA file, auto-detecting gzip/bgzf compression from the magic bytes.
fn open_fasta(path: &Path) -> Result<Box<dyn BufRead>> {
    let file = File::open(path)?;
    let mut reader = BufReader::with_capacity(256 * 1024, file);
    let is_gzipped = {
        let head = reader.fill_buf()?;
        head.len() >= 2 && head[0] == 0x1f && head[1] == 0x8b
    };
    if is_gzipped {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(reader))))
    } else {
        Ok(Box::new(reader))
    }
}

/// Load all sequences of a (possibly compressed) FASTA file into memory.
pub fn load_fasta<P: AsRef<Path>>(path: P) -> Result<Vec<FastaRecord>> {
    let path = path.as_ref();
    log::debug!("Reading FASTA from {}", path.display());
    read_fasta(open_fasta(path)?)
}
