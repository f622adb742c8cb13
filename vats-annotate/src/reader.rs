//! Line-oriented VCF reading.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use flate2::read::MultiGzDecoder;

use crate::error::MalformedRecordError;
use crate::record::VariantRecord;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const READ_BUFFER: usize = 256 * 1024;

/// One line of a VCF file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VcfLine {
    /// Header, comment or blank line, terminator included.
    Header(String),
    Record(VariantRecord),
    /// A line that could not be parsed, kept as the exact bytes read.
    Malformed {
        raw: Vec<u8>,
        error: MalformedRecordError,
    },
}

impl VcfLine {
    pub fn parse(raw: String) -> VcfLine {
        if raw.starts_with('#') || raw.trim().is_empty() {
            return VcfLine::Header(raw);
        }
        match VariantRecord::parse(&raw) {
            Ok(record) => VcfLine::Record(record),
            Err(error) => VcfLine::Malformed {
                raw: raw.into_bytes(),
                error,
            },
        }
    }

    /// Like [`VcfLine::parse`], but a line that is not UTF-8 becomes
    /// [`VcfLine::Malformed`] instead of an error.
    pub fn from_bytes(raw: Vec<u8>) -> VcfLine {
        match String::from_utf8(raw) {
            Ok(raw) => VcfLine::parse(raw),
            Err(e) => {
                let offset = e.utf8_error().valid_up_to();
                VcfLine::Malformed {
                    raw: e.into_bytes(),
                    error: MalformedRecordError::InvalidUtf8(offset),
                }
            }
        }
    }
}

/// Iterates the lines of a plain or gzip/BGZF compressed VCF file.
///
/// Yields `(line_number, line)` with 1-based line numbers.
pub struct VcfReader {
    inner: Box<dyn BufRead + Send>,
    line_number: u64,
}

impl VcfReader {
    pub fn new<R: BufRead + Send + 'static>(reader: R) -> Self {
        Self {
            inner: Box::new(reader),
            line_number: 0,
        }
    }

    /// Open a VCF file, detecting compression from the gzip magic bytes.
    pub fn from_path<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::open(path.as_ref())?;
        let mut buffered = BufReader::with_capacity(READ_BUFFER, file);
        let is_gzipped = buffered.fill_buf()?.starts_with(&GZIP_MAGIC);
        if is_gzipped {
            Ok(Self::new(BufReader::with_capacity(
                READ_BUFFER,
                MultiGzDecoder::new(buffered),
            )))
        } else {
            Ok(Self::new(buffered))
        }
    }

    /// Number of lines read so far.
    pub fn line_number(&self) -> u64 {
        self.line_number
    }
}

impl Iterator for VcfReader {
    type Item = io::Result<(u64, VcfLine)>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut raw = Vec::new();
        match self.inner.read_until(b'\n', &mut raw) {
            Ok(0) => None,
            Ok(_) => {
                self.line_number += 1;
                Some(Ok((self.line_number, VcfLine::from_bytes(raw))))
            }
            Err(e) => Some(Err(e)),
        }
    }
}
