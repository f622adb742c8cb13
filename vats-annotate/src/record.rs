//! VCF data lines.
//!
//! A [`VariantRecord`] keeps every column of the line as read, so writing it
//! back reproduces the input byte for byte except for the INFO column.

use crate::error::MalformedRecordError;

const CHROM: usize = 0;
const POS: usize = 1;
const REF: usize = 3;
const ALT: usize = 4;
const INFO: usize = 7;
const REQUIRED_COLUMNS: usize = 8;

/// Line terminator of a record, written back unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    Lf,
    CrLf,
    /// Last line of a file without a trailing newline.
    None,
}

impl LineEnding {
    /// Split a raw line into its content and terminator.
    pub fn split(line: &str) -> (&str, LineEnding) {
        if let Some(content) = line.strip_suffix("\r\n") {
            (content, LineEnding::CrLf)
        } else if let Some(content) = line.strip_suffix('\n') {
            (content, LineEnding::Lf)
        } else {
            (line, LineEnding::None)
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
            LineEnding::None => "",
        }
    }
}

/// One allele of a record, as handed to a resolver.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AlleleDescription {
    pub chrom: String,
    /// 1-based VCF position.
    pub pos: u64,
    pub reference: String,
    pub alternate: String,
}

/// A parsed VCF data line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantRecord {
    fields: Vec<String>,
    pos: u64,
    alternates: Vec<String>,
    ending: LineEnding,
}

impl VariantRecord {
    /// Parse a data line, with or without its terminator.
    pub fn parse(line: &str) -> Result<Self, MalformedRecordError> {
        let (content, ending) = LineEnding::split(line);
        let fields: Vec<String> = content.split('\t').map(str::to_string).collect();
        if fields.len() < REQUIRED_COLUMNS {
            return Err(MalformedRecordError::TooFewColumns(fields.len()));
        }

        if fields[CHROM].is_empty() {
            return Err(MalformedRecordError::EmptyChrom);
        }

        let pos = match fields[POS].parse::<u64>() {
            Ok(pos) if pos > 0 => pos,
            _ => return Err(MalformedRecordError::InvalidPosition(fields[POS].clone())),
        };

        let reference = &fields[REF];
        if reference.is_empty() || reference == "." {
            return Err(MalformedRecordError::InvalidReference(reference.clone()));
        }

        let alt = &fields[ALT];
        if alt.is_empty() || alt == "." {
            return Err(MalformedRecordError::NoAlternates);
        }
        let alternates: Vec<String> = alt.split(',').map(str::to_string).collect();
        if alternates.iter().any(String::is_empty) {
            return Err(MalformedRecordError::EmptyAlternate(alt.clone()));
        }

        Ok(Self {
            fields,
            pos,
            alternates,
            ending,
        })
    }

    pub fn chrom(&self) -> &str {
        &self.fields[CHROM]
    }

    pub fn pos(&self) -> u64 {
        self.pos
    }

    pub fn reference(&self) -> &str {
        &self.fields[REF]
    }

    pub fn alternates(&self) -> &[String] {
        &self.alternates
    }

    pub fn info(&self) -> &str {
        &self.fields[INFO]
    }

    pub fn line_ending(&self) -> LineEnding {
        self.ending
    }

    /// One description per ALT, in ALT order.
    pub fn allele_descriptions(&self) -> impl Iterator<Item = AlleleDescription> + '_ {
        self.alternates.iter().map(move |alt| AlleleDescription {
            chrom: self.chrom().to_string(),
            pos: self.pos,
            reference: self.reference().to_string(),
            alternate: alt.clone(),
        })
    }

    /// Set `key=value` in INFO, replacing an existing entry for `key`.
    pub fn set_info(&mut self, key: &str, value: &str) {
        self.fields[INFO] = upsert_info(&self.fields[INFO], key, value);
    }

    /// The record as a line, terminator included.
    pub fn to_line(&self) -> String {
        let mut line = self.fields.join("\t");
        line.push_str(self.ending.as_str());
        line
    }
}

/// Insert or replace one INFO entry, keeping every other entry in place.
pub fn upsert_info(info: &str, key: &str, value: &str) -> String {
    let entry = format!("{}={}", key, value);
    if info.is_empty() || info == "." {
        return entry;
    }

    let mut replaced = false;
    let mut entries: Vec<&str> = Vec::new();
    for existing in info.split(';') {
        let existing_key = existing.split_once('=').map_or(existing, |(k, _)| k);
        if existing_key == key {
            if !replaced {
                entries.push(&entry);
                replaced = true;
            }
        } else {
            entries.push(existing);
        }
    }
    if !replaced {
        entries.push(&entry);
    }
    entries.join(";")
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    fn test_parse_record() {
        let line = "1\t100\trs1\tA\tG,T\t50\tPASS\tDP=10\tGT\t0/1\n";
        let record = VariantRecord::parse(line).unwrap();

        assert_eq!(record.chrom(), "1");
        assert_eq!(record.pos(), 100);
        assert_eq!(record.reference(), "A");
        assert_eq!(record.alternates(), &["G".to_string(), "T".to_string()]);
        assert_eq!(record.info(), "DP=10");
        assert_eq!(record.line_ending(), LineEnding::Lf);
        assert_eq!(record.to_line(), line);
    }

    #[rstest]
    fn test_allele_descriptions_follow_alt_order() {
        let record = VariantRecord::parse("2\t7\t.\tAC\tA,ACC,<DEL>\t.\t.\t.").unwrap();
        let alts: Vec<String> = record
            .allele_descriptions()
            .map(|d| {
                assert_eq!(d.chrom, "2");
                assert_eq!(d.pos, 7);
                assert_eq!(d.reference, "AC");
                d.alternate
            })
            .collect();
        assert_eq!(alts, vec!["A", "ACC", "<DEL>"]);
    }

    #[rstest]
    #[case("1\t100\t.\tA\tG\t.\t.", MalformedRecordError::TooFewColumns(7))]
    #[case("\t100\t.\tA\tG\t.\t.\t.", MalformedRecordError::EmptyChrom)]
    #[case("1\tabc\t.\tA\tG\t.\t.\t.", MalformedRecordError::InvalidPosition("abc".to_string()))]
    #[case("1\t0\t.\tA\tG\t.\t.\t.", MalformedRecordError::InvalidPosition("0".to_string()))]
    #[case("1\t-5\t.\tA\tG\t.\t.\t.", MalformedRecordError::InvalidPosition("-5".to_string()))]
    #[case("1\t100\t.\t\tG\t.\t.\t.", MalformedRecordError::InvalidReference("".to_string()))]
    #[case("1\t100\t.\t.\tG\t.\t.\t.", MalformedRecordError::InvalidReference(".".to_string()))]
    #[case("1\t100\t.\tA\t.\t.\t.\t.", MalformedRecordError::NoAlternates)]
    #[case("1\t100\t.\tA\t\t.\t.\t.", MalformedRecordError::NoAlternates)]
    #[case("1\t100\t.\tA\tG,,T\t.\t.\t.", MalformedRecordError::EmptyAlternate("G,,T".to_string()))]
    fn test_malformed(#[case] line: &str, #[case] expected: MalformedRecordError) {
        assert_eq!(VariantRecord::parse(line), Err(expected));
    }

    #[rstest]
    #[case(".", "VRS_Allele_IDs=ga4gh:VA.x")]
    #[case("", "VRS_Allele_IDs=ga4gh:VA.x")]
    #[case("DP=10;DB", "DP=10;DB;VRS_Allele_IDs=ga4gh:VA.x")]
    #[case("DP=10;VRS_Allele_IDs=old;AF=0.5", "DP=10;VRS_Allele_IDs=ga4gh:VA.x;AF=0.5")]
    #[case("VRS_Allele_IDs=a;VRS_Allele_IDs=b", "VRS_Allele_IDs=ga4gh:VA.x")]
    #[case("VRS_Allele_IDs", "VRS_Allele_IDs=ga4gh:VA.x")]
    #[case("VRS_Allele_IDs_X=1", "VRS_Allele_IDs_X=1;VRS_Allele_IDs=ga4gh:VA.x")]
    fn test_upsert_info(#[case] info: &str, #[case] expected: &str) {
        assert_eq!(upsert_info(info, "VRS_Allele_IDs", "ga4gh:VA.x"), expected);
    }

    #[rstest]
    fn test_set_info_preserves_other_columns() {
        let line = "chr1\t5\t.\tA\tT\t.\tPASS\tDP=3\tGT:AD\t0/1:1,2\r\n";
        let mut record = VariantRecord::parse(line).unwrap();
        record.set_info("VRS_Allele_IDs", "ga4gh:VA.abc");

        assert_eq!(
            record.to_line(),
            "chr1\t5\t.\tA\tT\t.\tPASS\tDP=3;VRS_Allele_IDs=ga4gh:VA.abc\tGT:AD\t0/1:1,2\r\n"
        );
    }

    #[rstest]
    fn test_last_line_without_newline() {
        let record = VariantRecord::parse("1\t1\t.\tA\tC\t.\t.\t.").unwrap();
        assert_eq!(record.line_ending(), LineEnding::None);
        assert_eq!(record.to_line(), "1\t1\t.\tA\tC\t.\t.\t.");
    }
}
