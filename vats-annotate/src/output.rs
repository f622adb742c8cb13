//! Output files that only appear at their destination once complete.
//!
//! Content goes to a temporary file next to the destination and is renamed
//! into place by [`OutputFile::commit`]. Dropping an uncommitted `OutputFile`
//! deletes the temporary file.

use std::ffi::OsStr;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use flate2::{Compression, GzBuilder, write::GzEncoder};
use tempfile::NamedTempFile;

enum Sink {
    Plain(BufWriter<NamedTempFile>),
    Gzip(GzEncoder<BufWriter<NamedTempFile>>),
}

pub struct OutputFile {
    sink: Sink,
    path: PathBuf,
}

/// Whether a path names gzip output.
pub fn is_gzip_path(path: &Path) -> bool {
    matches!(
        path.extension().and_then(OsStr::to_str),
        Some("gz") | Some("bgz")
    )
}

impl OutputFile {
    /// Start writing to `path`, gzip compressed when it ends in `.gz`.
    pub fn create(path: &Path) -> io::Result<Self> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let temp = BufWriter::new(NamedTempFile::new_in(dir)?);

        // no file name and a zero mtime, so identical content compresses identically
        let sink = if is_gzip_path(path) {
            Sink::Gzip(
                GzBuilder::new()
                    .mtime(0)
                    .write(temp, Compression::default()),
            )
        } else {
            Sink::Plain(temp)
        };

        Ok(Self {
            sink,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Finish the stream and move the file to its destination.
    pub fn commit(self) -> io::Result<PathBuf> {
        let buffered = match self.sink {
            Sink::Plain(writer) => writer,
            Sink::Gzip(encoder) => encoder.finish()?,
        };
        let temp = buffered.into_inner().map_err(|e| e.into_error())?;
        temp.as_file().sync_all()?;
        temp.persist(&self.path)?;
        Ok(self.path)
    }
}

impl Write for OutputFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.sink {
            Sink::Plain(writer) => writer.write(buf),
            Sink::Gzip(encoder) => encoder.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.sink {
            Sink::Plain(writer) => writer.flush(),
            Sink::Gzip(encoder) => encoder.flush(),
        }
    }
}
