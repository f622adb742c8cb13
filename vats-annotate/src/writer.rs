use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::config::AnnotatorConfig;
use crate::header::HeaderEditor;
use crate::output::OutputFile;

/// Writes the annotated VCF.
///
/// Header lines pass through a [`HeaderEditor`] so the annotation fields are
/// declared. Nothing appears at the destination before [`VcfWriter::finish`].
pub struct VcfWriter {
    output: OutputFile,
    header: HeaderEditor,
    lines: u64,
}

impl VcfWriter {
    pub fn create(path: &Path, config: &AnnotatorConfig) -> io::Result<Self> {
        Ok(Self {
            output: OutputFile::create(path)?,
            header: HeaderEditor::new(config),
            lines: 0,
        })
    }

    /// Write a header, comment or blank line.
    pub fn write_header(&mut self, line: &str) -> io::Result<()> {
        for definition in self.header.lines_before(line) {
            self.write_line(&definition)?;
        }
        self.write_line(line)
    }

    /// Write a line exactly as given; it carries its own terminator.
    pub fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.write_raw(line.as_bytes())
    }

    /// Write a line that may not be UTF-8, byte for byte.
    pub fn write_raw(&mut self, line: &[u8]) -> io::Result<()> {
        self.output.write_all(line)?;
        self.lines += 1;
        Ok(())
    }

    /// Lines written so far, inserted header lines included.
    pub fn lines_written(&self) -> u64 {
        self.lines
    }

    /// Whether the INFO definitions made it into the header.
    pub fn header_complete(&self) -> bool {
        self.header.inserted()
    }

    pub fn finish(self) -> io::Result<PathBuf> {
        if !self.header_complete() {
            log::warn!("No #CHROM line was written; the annotation INFO fields are not declared in the header");
        }
        let path = self.output.commit()?;
        log::debug!("Wrote {} lines to {}", self.lines, path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use tempfile::tempdir;

    #[rstest]
    #[case(&["##fileformat=VCFv4.2\n", "#CHROM\tPOS\n"], true, 3)]
    #[case(&["##fileformat=VCFv4.2\n"], false, 1)]
    #[case(&[], false, 0)]
    fn test_header_completion(#[case] header: &[&str], #[case] complete: bool, #[case] lines: u64) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.vcf");
        let mut writer = VcfWriter::create(&path, &AnnotatorConfig::default()).unwrap();
        for line in header {
            writer.write_header(line).unwrap();
        }

        assert_eq!(writer.header_complete(), complete);
        assert_eq!(writer.lines_written(), lines);
        assert_eq!(writer.finish().unwrap(), path);
        assert!(path.exists());
    }

    #[rstest]
    fn test_raw_bytes_written_unchanged() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.vcf");
        let mut writer = VcfWriter::create(&path, &AnnotatorConfig::default()).unwrap();
        writer.write_raw(b"1\t2\t.\tA\tG\t.\t.\tNOTE=caf\xe9\n").unwrap();
        writer.finish().unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"1\t2\t.\tA\tG\t.\t.\tNOTE=caf\xe9\n");
    }
}
