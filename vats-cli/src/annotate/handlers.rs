use std::io::IsTerminal;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::ArgMatches;
use indicatif::{ProgressBar, ProgressStyle};

use vats_annotate::{AnnotatorConfig, MalformedPolicy, Pipeline};
use vats_refget::SequenceStore;
use vats_vrs::Translator;

pub fn run_annotate(matches: &ArgMatches) -> Result<()> {
    let input = matches
        .get_one::<String>("input")
        .expect("A path to an input VCF is required.");

    let output = matches
        .get_one::<String>("output")
        .expect("A path for the annotated VCF is required.");

    let fasta = matches
        .get_one::<String>("fasta")
        .expect("A path to a reference FASTA is required.");

    let aliases = matches.get_one::<String>("aliases").map(Path::new);
    let collection = matches.get_one::<String>("collection").map(Path::new);

    let config = build_config(matches)?;
    let translator = build_translator(Path::new(fasta), aliases, &config)?;

    let progress = records_spinner()?;
    let mut pipeline = Pipeline::new(translator, config).with_progress(progress.clone());
    let result = pipeline.run(Path::new(input), Path::new(output), collection);
    progress.finish_and_clear();

    let summary = result.with_context(|| format!("Failed to annotate {}", input))?;
    for line in summary.to_string().lines() {
        log::info!("{}", line);
    }

    Ok(())
}

/// Settings from `--config` (or the defaults), overridden by explicit flags.
pub fn build_config(matches: &ArgMatches) -> Result<AnnotatorConfig> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => AnnotatorConfig::try_from(Path::new(path))
            .with_context(|| format!("Failed to load config {}", path))?,
        None => AnnotatorConfig::default(),
    };

    if let Some(threads) = matches.get_one::<usize>("threads") {
        config.threads = *threads;
    }
    if let Some(retries) = matches.get_one::<u32>("retries") {
        config.transient_retries = *retries;
    }
    if let Some(timeout) = matches.get_one::<u64>("timeout") {
        config.resolver_timeout_ms = Some(*timeout);
    }
    if let Some(field) = matches.get_one::<String>("info-field") {
        config.info_field = field.clone();
    }
    if let Some(marker) = matches.get_one::<String>("marker") {
        config.unresolved_marker = marker.clone();
    }
    if matches.get_flag("attributes") {
        config.vrs_attributes = true;
    }
    if matches.get_flag("fail-fast") {
        config.malformed_policy = MalformedPolicy::Abort;
    }
    if matches.get_flag("no-validate-ref") {
        config.validate_reference = false;
    }
    if matches.get_flag("no-chr-aliases") {
        config.chr_aliases = false;
    }

    config.validate()?;
    Ok(config)
}

fn build_translator(fasta: &Path, aliases: Option<&Path>, config: &AnnotatorConfig) -> Result<Translator> {
    let mut store = SequenceStore::from_fasta(fasta)
        .with_context(|| format!("Failed to load reference {}", fasta.display()))?;
    if let Some(aliases) = aliases {
        let added = store
            .load_aliases(aliases)
            .with_context(|| format!("Failed to load aliases {}", aliases.display()))?;
        log::debug!("Loaded {} sequence aliases", added);
    }
    log::info!("Loaded {} reference sequences from {}", store.len(), fasta.display());

    Ok(config.translator(store))
}

fn records_spinner() -> Result<ProgressBar> {
    if !std::io::stderr().is_terminal() {
        return Ok(ProgressBar::hidden());
    }
    let progress = ProgressBar::new_spinner();
    progress.set_style(ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] {pos} records ({per_sec})",
    )?);
    progress.enable_steady_tick(Duration::from_millis(100));
    Ok(progress)
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use tempfile::tempdir;

    use crate::annotate::cli::create_annotate_cli;

    fn matches(args: &[&str]) -> ArgMatches {
        let mut argv = vec!["annotate", "in.vcf", "-o", "out.vcf", "-r", "ref.fa"];
        argv.extend_from_slice(args);
        create_annotate_cli().try_get_matches_from(argv).unwrap()
    }

    #[rstest]
    fn test_defaults_without_flags() {
        assert_eq!(build_config(&matches(&[])).unwrap(), AnnotatorConfig::default());
    }

    #[rstest]
    fn test_flags_override() {
        let config = build_config(&matches(&[
            "-t",
            "4",
            "--retries",
            "3",
            "--timeout",
            "250",
            "--info-field",
            "IDS",
            "--attributes",
            "--fail-fast",
            "--no-validate-ref",
        ]))
        .unwrap();

        assert_eq!(config.threads, 4);
        assert_eq!(config.transient_retries, 3);
        assert_eq!(config.resolver_timeout_ms, Some(250));
        assert_eq!(config.info_field, "IDS");
        assert!(config.vrs_attributes);
        assert_eq!(config.malformed_policy, MalformedPolicy::Abort);
        assert!(!config.validate_reference);
        assert!(config.chr_aliases);
    }

    #[rstest]
    fn test_flags_override_config_file() {
        let config = build_config(&matches(&[
            "--config",
            "../tests/data/config/annotator.toml",
            "-t",
            "2",
        ]))
        .unwrap();

        assert_eq!(config.threads, 2);
        // from the file
        assert_eq!(config.transient_retries, 2);
    }

    #[rstest]
    fn test_invalid_override_rejected() {
        assert!(build_config(&matches(&["-t", "0"])).is_err());
        assert!(build_config(&matches(&["--marker", "a,b"])).is_err());
    }

    #[rstest]
    fn test_run_annotate_end_to_end() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("out.vcf.gz");
        let collection = dir.path().join("alleles.json");
        let argv = [
            "annotate",
            "../tests/data/vcf/input.vcf",
            "-o",
            output.to_str().unwrap(),
            "-r",
            "../tests/data/fasta/ref.fa",
            "-a",
            "../tests/data/fasta/ref.aliases.tsv",
            "-c",
            collection.to_str().unwrap(),
            "-t",
            "3",
        ];
        let matches = create_annotate_cli().try_get_matches_from(argv).unwrap();

        run_annotate(&matches).unwrap();

        assert!(output.exists());
        assert!(collection.exists());
    }

    #[rstest]
    fn test_missing_reference_fails() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("out.vcf");
        let argv = [
            "annotate",
            "../tests/data/vcf/input.vcf",
            "-o",
            output.to_str().unwrap(),
            "-r",
            "does/not/exist.fa",
        ];
        let matches = create_annotate_cli().try_get_matches_from(argv).unwrap();

        assert!(run_annotate(&matches).is_err());
        assert!(!output.exists());
    }
}
