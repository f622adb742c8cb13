use std::fmt;
use std::time::Duration;

/// Counters for a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub header_lines: u64,
    pub records: u64,
    /// Records with at least one allele written as the unresolved marker.
    pub records_with_unresolved: u64,
    /// Malformed data lines copied through untouched.
    pub skipped: u64,
    pub alleles_resolved: u64,
    pub alleles_unresolved: u64,
    pub retries: u64,
    pub distinct_alleles: u64,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn alleles(&self) -> u64 {
        self.alleles_resolved + self.alleles_unresolved
    }

    pub fn records_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.records as f64 / secs
        } else {
            0.0
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Records:            {} ({} with unresolved alleles)",
            self.records, self.records_with_unresolved
        )?;
        writeln!(f, "Skipped:            {}", self.skipped)?;
        writeln!(
            f,
            "Alleles:            {} ({} resolved, {} unresolved)",
            self.alleles(),
            self.alleles_resolved,
            self.alleles_unresolved
        )?;
        writeln!(f, "Distinct alleles:   {}", self.distinct_alleles)?;
        writeln!(f, "Retries:            {}", self.retries)?;
        write!(
            f,
            "Elapsed:            {:.2}s ({:.0} records/s)",
            self.elapsed.as_secs_f64(),
            self.records_per_second()
        )
    }
}
