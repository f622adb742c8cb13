//! VRS allele normalization.
//!
//! Fully-justified normalization as used by VRS: trim the bases shared by the
//! reference and alternate alleles, then expand an insertion or deletion over
//! the whole repeat region it could have been placed in. Operates on `&[u8]`
//! slices of the reference sequence.

use thiserror::Error;

/// Result of normalizing an allele against a reference sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedAllele {
    /// 0-based interbase start.
    pub start: u64,
    /// 0-based interbase end.
    pub end: u64,
    /// Alternate sequence spanning `start..end` after expansion.
    pub allele: Vec<u8>,
}

/// Errors that can occur during allele normalization.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NormalizeError {
    /// Start position exceeds sequence length or overflows usize.
    #[error("start position {start} exceeds sequence length {seq_len}")]
    StartOutOfBounds { start: u64, seq_len: usize },

    /// Reference allele extends past the end of the sequence.
    #[error("ref allele (start={start}, len={ref_len}) extends past sequence length {seq_len}")]
    RefAllelePastEnd {
        start: usize,
        ref_len: usize,
        seq_len: usize,
    },
}

/// Length of the common prefix of two alleles.
fn common_prefix(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

/// Length of the common suffix of two alleles.
fn common_suffix(a: &[u8], b: &[u8]) -> usize {
    a.iter()
        .rev()
        .zip(b.iter().rev())
        .take_while(|(x, y)| x == y)
        .count()
}

/// How far the non-empty alleles can be circularly shifted left from `pos`.
///
/// Each step compares the reference base just left of the current window with
/// the base that would rotate in from the end of every non-empty allele.
fn roll_left(sequence: &[u8], alleles: [&[u8]; 2], pos: usize) -> usize {
    let non_empty: Vec<&[u8]> = alleles.into_iter().filter(|a| !a.is_empty()).collect();
    if non_empty.is_empty() {
        return 0;
    }

    let mut d = 0;
    while d < pos {
        let base = sequence[pos - 1 - d];
        let matches = non_empty.iter().all(|allele| {
            let len = allele.len();
            allele[(len - 1) - (d % len)] == base
        });
        if !matches {
            break;
        }
        d += 1;
    }
    d
}

/// How far the non-empty alleles can be circularly shifted right from `pos`.
fn roll_right(sequence: &[u8], alleles: [&[u8]; 2], pos: usize) -> usize {
    let non_empty: Vec<&[u8]> = alleles.into_iter().filter(|a| !a.is_empty()).collect();
    if non_empty.is_empty() {
        return 0;
    }

    let mut d = 0;
    while pos + d < sequence.len() {
        let base = sequence[pos + d];
        if !non_empty.iter().all(|allele| allele[d % allele.len()] == base) {
            break;
        }
        d += 1;
    }
    d
}

/// Normalize an allele against a reference sequence using fully-justified (EXPAND) mode.
///
/// 1. Trim common prefix/suffix between ref and alt alleles
/// 2. Expand by rolling left and right through repeat regions
///
/// Substitutions (both trimmed alleles non-empty) are not rolled because a
/// mismatching base always stops the roll immediately.
///
/// # Arguments
/// * `sequence` - Full reference chromosome sequence as bytes
/// * `start` - 0-based interbase start position of the variant
/// * `ref_allele` - Reference allele bytes
/// * `alt_allele` - Alternate allele bytes
pub fn normalize(
    sequence: &[u8],
    start: u64,
    ref_allele: &[u8],
    alt_allele: &[u8],
) -> Result<NormalizedAllele, NormalizeError> {
    let out_of_bounds = || NormalizeError::StartOutOfBounds {
        start,
        seq_len: sequence.len(),
    };
    let s = usize::try_from(start).map_err(|_| out_of_bounds())?;
    if s > sequence.len() {
        return Err(out_of_bounds());
    }
    let e = s.checked_add(ref_allele.len()).ok_or_else(out_of_bounds)?;
    if e > sequence.len() {
        return Err(NormalizeError::RefAllelePastEnd {
            start: s,
            ref_len: ref_allele.len(),
            seq_len: sequence.len(),
        });
    }

    // Trim common prefix, then common suffix of what is left
    let prefix = common_prefix(ref_allele, alt_allele);
    let (ref_rest, alt_rest) = (&ref_allele[prefix..], &alt_allele[prefix..]);
    let suffix = common_suffix(ref_rest, alt_rest);
    let ref_trimmed = &ref_rest[..ref_rest.len() - suffix];
    let alt_trimmed = &alt_rest[..alt_rest.len() - suffix];
    let s = s + prefix;
    let e = e - suffix;

    let alleles = [ref_trimmed, alt_trimmed];
    let left = if ref_trimmed.is_empty() || alt_trimmed.is_empty() {
        roll_left(sequence, alleles, s)
    } else {
        0
    };
    let right = if ref_trimmed.is_empty() || alt_trimmed.is_empty() {
        roll_right(sequence, alleles, e)
    } else {
        0
    };

    let new_start = s - left;
    let new_end = e + right;

    // Left context + trimmed alt + right context
    let mut allele = Vec::with_capacity(left + alt_trimmed.len() + right);
    allele.extend_from_slice(&sequence[new_start..s]);
    allele.extend_from_slice(alt_trimmed);
    allele.extend_from_slice(&sequence[e..new_end]);

    Ok(NormalizedAllele {
        start: new_start as u64,
        end: new_end as u64,
        allele,
    })
}
