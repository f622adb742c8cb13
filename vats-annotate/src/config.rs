use std::fs::read_to_string;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use vats_refget::SequenceStore;
use vats_vrs::{Translator, TranslatorOptions};

pub const DEFAULT_INFO_FIELD: &str = "VRS_Allele_IDs";
pub const DEFAULT_UNRESOLVED_MARKER: &str = ".";
pub const DEFAULT_REORDER_WINDOW: usize = 1024;

/// What to do with a data line that cannot be parsed.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MalformedPolicy {
    /// Copy the line through untouched and count it as skipped.
    #[default]
    Skip,
    /// Stop the run with a `MalformedRecord` error.
    Abort,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid INFO field name {0:?}: must match [A-Za-z_][0-9A-Za-z_.]*")]
    InvalidInfoField(String),
    #[error("Invalid unresolved marker {0:?}: must be non-empty and free of ',', ';', '=' and whitespace")]
    InvalidMarker(String),
    #[error("`{0}` must be at least 1")]
    ZeroValue(&'static str),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Settings for an annotation run.
///
/// Every field has a default, so a TOML file only needs the keys it changes.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AnnotatorConfig {
    /// INFO key that receives the allele identifiers.
    pub info_field: String,
    /// Written in place of an identifier when an allele could not be resolved.
    pub unresolved_marker: String,
    pub malformed_policy: MalformedPolicy,
    /// Extra attempts for a transiently failing resolution.
    pub transient_retries: u32,
    /// Per-call resolver time limit; an expired call is a transient failure.
    pub resolver_timeout_ms: Option<u64>,
    /// Worker threads; 1 runs the whole pipeline on the calling thread.
    pub threads: usize,
    /// Maximum number of lines in flight between the reader and the writer.
    pub reorder_window: usize,
    /// Also write `VRS_Starts`, `VRS_Ends` and `VRS_States`.
    pub vrs_attributes: bool,
    /// Reject alleles whose REF disagrees with the reference sequence.
    ///
    /// Applied when the translator is built, see [`AnnotatorConfig::translator`].
    pub validate_reference: bool,
    /// Treat `chr1` and `1` as the same sequence.
    ///
    /// Applied to the sequence store by [`AnnotatorConfig::translator`].
    pub chr_aliases: bool,
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            info_field: DEFAULT_INFO_FIELD.to_string(),
            unresolved_marker: DEFAULT_UNRESOLVED_MARKER.to_string(),
            malformed_policy: MalformedPolicy::default(),
            transient_retries: 0,
            resolver_timeout_ms: None,
            threads: 1,
            reorder_window: DEFAULT_REORDER_WINDOW,
            vrs_attributes: false,
            validate_reference: true,
            chr_aliases: true,
        }
    }
}

impl AnnotatorConfig {
    pub fn resolver_timeout(&self) -> Option<Duration> {
        self.resolver_timeout_ms.map(Duration::from_millis)
    }

    pub fn translator_options(&self) -> TranslatorOptions {
        TranslatorOptions {
            validate_reference: self.validate_reference,
        }
    }

    /// A translator over `store` honouring `chr_aliases` and
    /// `validate_reference`.
    pub fn translator(&self, mut store: SequenceStore) -> Translator {
        store.set_chr_aliases(self.chr_aliases);
        Translator::with_options(Arc::new(store), self.translator_options())
    }

    /// Check the values a run cannot work with.
    pub fn validate(&self) -> ConfigResult<()> {
        if !is_valid_info_key(&self.info_field) {
            return Err(ConfigError::InvalidInfoField(self.info_field.clone()));
        }
        let marker_ok = !self.unresolved_marker.is_empty()
            && !self
                .unresolved_marker
                .chars()
                .any(|c| matches!(c, ',' | ';' | '=') || c.is_whitespace());
        if !marker_ok {
            return Err(ConfigError::InvalidMarker(self.unresolved_marker.clone()));
        }
        if self.threads == 0 {
            return Err(ConfigError::ZeroValue("threads"));
        }
        if self.reorder_window == 0 {
            return Err(ConfigError::ZeroValue("reorder_window"));
        }
        Ok(())
    }
}

fn is_valid_info_key(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

impl TryFrom<&Path> for AnnotatorConfig {
    type Error = ConfigError;

    fn try_from(path: &Path) -> Result<Self, Self::Error> {
        let toml_str = read_to_string(path)?;
        let config: AnnotatorConfig = toml::from_str(&toml_str)?;
        config.validate()?;
        Ok(config)
    }
}
