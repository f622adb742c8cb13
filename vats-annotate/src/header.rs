//! INFO header definitions for the annotation fields.

use std::collections::HashSet;
use std::fmt;

use crate::config::AnnotatorConfig;
use crate::record::LineEnding;

pub const STARTS_FIELD: &str = "VRS_Starts";
pub const ENDS_FIELD: &str = "VRS_Ends";
pub const STATES_FIELD: &str = "VRS_States";

/// A `##INFO=<...>` meta-information line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoDefinition {
    pub id: String,
    pub number: &'static str,
    pub kind: &'static str,
    pub description: &'static str,
}

impl fmt::Display for InfoDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "##INFO=<ID={},Number={},Type={},Description=\"{}\">",
            self.id, self.number, self.kind, self.description
        )
    }
}

/// Definitions for every INFO key a run writes.
pub fn info_definitions(config: &AnnotatorConfig) -> Vec<InfoDefinition> {
    let string_per_alt = |id: &str, description: &'static str| InfoDefinition {
        id: id.to_string(),
        number: "A",
        kind: "String",
        description,
    };

    let mut definitions = vec![string_per_alt(
        &config.info_field,
        "The computed identifiers for the GA4GH VRS Alleles corresponding to the values in the ALT column",
    )];
    if config.vrs_attributes {
        definitions.push(string_per_alt(
            STARTS_FIELD,
            "Interresidue coordinates used as the location starts for the GA4GH VRS Alleles corresponding to the values in the ALT column",
        ));
        definitions.push(string_per_alt(
            ENDS_FIELD,
            "Interresidue coordinates used as the location ends for the GA4GH VRS Alleles corresponding to the values in the ALT column",
        ));
        definitions.push(string_per_alt(
            STATES_FIELD,
            "The literal sequence states used for the GA4GH VRS Alleles corresponding to the values in the ALT column",
        ));
    }
    definitions
}

/// Adds missing INFO definitions just before the `#CHROM` line.
#[derive(Debug)]
pub struct HeaderEditor {
    definitions: Vec<InfoDefinition>,
    present: HashSet<String>,
    inserted: bool,
}

impl HeaderEditor {
    pub fn new(config: &AnnotatorConfig) -> Self {
        Self {
            definitions: info_definitions(config),
            present: HashSet::new(),
            inserted: false,
        }
    }

    /// Whether a `#CHROM` line has been seen and the definitions placed.
    pub fn inserted(&self) -> bool {
        self.inserted
    }

    /// Lines to write before `line`. Only the `#CHROM` line gets any, once.
    pub fn lines_before(&mut self, line: &str) -> Vec<String> {
        if let Some(rest) = line.strip_prefix("##INFO=<ID=") {
            let id = rest.split([',', '>']).next().unwrap_or_default();
            self.present.insert(id.to_string());
            return Vec::new();
        }
        if self.inserted || !line.starts_with("#CHROM") {
            return Vec::new();
        }
        self.inserted = true;

        let (_, ending) = LineEnding::split(line);
        let ending = match ending {
            LineEnding::None => LineEnding::Lf,
            other => other,
        };
        self.definitions
            .iter()
            .filter(|definition| !self.present.contains(&definition.id))
            .map(|definition| format!("{}{}", definition, ending.as_str()))
            .collect()
    }
}
