//! End-to-end annotation: FASTA + VCF → annotated VCF + allele collection

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;
use pretty_assertions::assert_eq;
use rstest::*;
use tempfile::{TempDir, tempdir};

use vats_annotate::{
    AlleleCollection, AlleleDescription, AlleleResolver, AnnotateError, AnnotatorConfig,
    MalformedPolicy, Pipeline, PipelineState, ResolutionFailure,
};
use vats_vrs::{Allele, Translator};

const FASTA: &str = "../tests/data/fasta/ref.fa";
const INPUT: &str = "../tests/data/vcf/input.vcf";
const EXPECTED: &str = "../tests/data/vcf/expected.vcf";

const RS1_G: &str = "ga4gh:VA.6Vifsi1MMIwdz_SsmWtxQ8iTUh0s8tPK";
const RS1_T: &str = "ga4gh:VA.Jr3C184CpJnEOodwR9SS-aOuQMBD7W-i";
const CA_INSERTION: &str = "ga4gh:VA.uZNxU5tuNlk5nE2uB6J3ecfXAvWCtFjR";

#[fixture]
fn translator() -> Translator {
    Translator::from_fasta(FASTA).unwrap()
}

#[fixture]
fn scratch() -> TempDir {
    tempdir().unwrap()
}

fn read_text(path: &Path) -> String {
    let mut text = String::new();
    let mut file = File::open(path).unwrap();
    if path.extension().is_some_and(|ext| ext == "gz") {
        MultiGzDecoder::new(file).read_to_string(&mut text).unwrap();
    } else {
        file.read_to_string(&mut text).unwrap();
    }
    text
}

fn annotate(translator: Translator, config: AnnotatorConfig, output: &Path, collection: Option<&Path>) {
    let mut pipeline = Pipeline::new(translator, config);
    pipeline.run(Path::new(INPUT), output, collection).unwrap();
    assert_eq!(pipeline.state(), PipelineState::Done);
}

#[rstest]
fn test_matches_golden_file(translator: Translator, scratch: TempDir) {
    let output = scratch.path().join("out.vcf");
    let mut pipeline = Pipeline::new(translator, AnnotatorConfig::default());

    let summary = pipeline.run(Path::new(INPUT), &output, None).unwrap();

    assert_eq!(read_text(&output), read_text(Path::new(EXPECTED)));
    assert_eq!(summary.header_lines, 5);
    assert_eq!(summary.records, 10);
    assert_eq!(summary.records_with_unresolved, 4);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.alleles_resolved, 8);
    assert_eq!(summary.alleles_unresolved, 4);
    assert_eq!(summary.distinct_alleles, 7);
}

#[rstest]
#[case(2, 1)]
#[case(4, 3)]
#[case(8, 1024)]
fn test_parallel_matches_sequential(
    translator: Translator,
    scratch: TempDir,
    #[case] threads: usize,
    #[case] window: usize,
) {
    let sequential_out = scratch.path().join("seq.vcf");
    let sequential_alleles = scratch.path().join("seq.json");
    annotate(
        translator.clone(),
        AnnotatorConfig::default(),
        &sequential_out,
        Some(&sequential_alleles),
    );

    let parallel_out = scratch.path().join("par.vcf");
    let parallel_alleles = scratch.path().join("par.json");
    let config = AnnotatorConfig {
        threads,
        reorder_window: window,
        ..Default::default()
    };
    annotate(translator, config, &parallel_out, Some(&parallel_alleles));

    assert_eq!(read_text(&parallel_out), read_text(&sequential_out));
    assert_eq!(
        std::fs::read(&parallel_alleles).unwrap(),
        std::fs::read(&sequential_alleles).unwrap()
    );
}

#[rstest]
fn test_collection_holds_distinct_alleles(translator: Translator, scratch: TempDir) {
    let output = scratch.path().join("out.vcf");
    let alleles_path = scratch.path().join("alleles.json");
    annotate(translator, AnnotatorConfig::default(), &output, Some(&alleles_path));

    let collection = AlleleCollection::load(&alleles_path).unwrap();
    assert_eq!(collection.len(), 7);
    for id in [RS1_G, RS1_T, CA_INSERTION] {
        assert!(collection.contains(id), "missing {}", id);
    }

    // the CA insertion covers the whole repeat
    let insertion = collection.get(CA_INSERTION).unwrap();
    assert_eq!(insertion.location.start, 11);
    assert_eq!(insertion.location.end, 22);
    assert_eq!(insertion.state.sequence(), Some("ACACACACACACA"));
    assert_eq!(insertion.location.id.as_deref().map(|id| id.starts_with("ga4gh:SL.")), Some(true));
}

#[rstest]
fn test_gzip_output_is_deterministic(translator: Translator, scratch: TempDir) {
    let first = scratch.path().join("first.vcf.gz");
    let second = scratch.path().join("second.vcf.gz");
    annotate(translator.clone(), AnnotatorConfig::default(), &first, None);
    annotate(translator, AnnotatorConfig::default(), &second, None);

    assert_eq!(std::fs::read(&first).unwrap(), std::fs::read(&second).unwrap());
    assert_eq!(read_text(&first), read_text(Path::new(EXPECTED)));
}

#[rstest]
fn test_gzip_input(translator: Translator, scratch: TempDir) {
    // annotate once into .gz, then use that as input
    let compressed = scratch.path().join("in.vcf.gz");
    annotate(translator.clone(), AnnotatorConfig::default(), &compressed, None);

    let output = scratch.path().join("again.vcf");
    Pipeline::new(translator, AnnotatorConfig::default())
        .run(&compressed, &output, None)
        .unwrap();
    assert_eq!(read_text(&output), read_text(Path::new(EXPECTED)));
}

#[rstest]
fn test_reannotation_is_stable(translator: Translator, scratch: TempDir) {
    let output = scratch.path().join("again.vcf");
    Pipeline::new(translator, AnnotatorConfig::default())
        .run(Path::new(EXPECTED), &output, None)
        .unwrap();

    // existing header definition and INFO entries are replaced, not duplicated
    assert_eq!(read_text(&output), read_text(Path::new(EXPECTED)));
}

#[rstest]
fn test_unwritable_collection_keeps_output(translator: Translator, scratch: TempDir) {
    let output = scratch.path().join("out.vcf");
    let collection = scratch.path().join("missing").join("alleles.json");
    let mut pipeline = Pipeline::new(translator, AnnotatorConfig::default());

    let result = pipeline.run(Path::new(INPUT), &output, Some(&collection));

    match result {
        Err(AnnotateError::Persistence { path, .. }) => assert_eq!(path, collection),
        other => panic!("expected a persistence error, got {:?}", other),
    }
    assert_eq!(pipeline.state(), PipelineState::Aborted);
    assert!(!collection.exists());
    assert_eq!(read_text(&output), read_text(Path::new(EXPECTED)));
}

#[rstest]
fn test_abort_on_malformed(translator: Translator, scratch: TempDir) {
    let output = scratch.path().join("out.vcf");
    let alleles_path = scratch.path().join("alleles.json");
    let config = AnnotatorConfig {
        malformed_policy: MalformedPolicy::Abort,
        ..Default::default()
    };
    let mut pipeline = Pipeline::new(translator, config);

    let result = pipeline.run(Path::new(INPUT), &output, Some(&alleles_path));
    match result {
        Err(AnnotateError::MalformedRecord { line, .. }) => assert_eq!(line, 13),
        other => panic!("expected a malformed record error, got {:?}", other),
    }
    assert_eq!(pipeline.state(), PipelineState::Aborted);
    assert!(!output.exists());
    assert!(!alleles_path.exists());
}

#[rstest]
fn test_vrs_attributes(translator: Translator, scratch: TempDir) {
    let output = scratch.path().join("out.vcf");
    let config = AnnotatorConfig {
        vrs_attributes: true,
        ..Default::default()
    };
    annotate(translator, config, &output, None);

    let text = read_text(&output);
    assert!(text.contains("##INFO=<ID=VRS_States,Number=A,Type=String,"));
    let insertion = text
        .lines()
        .find(|line| line.starts_with("2\t22\t"))
        .unwrap();
    assert!(insertion.contains(&format!(
        "VRS_Allele_IDs={};VRS_Starts=11;VRS_Ends=22;VRS_States=ACACACACACACA",
        CA_INSERTION
    )));
}

/// A resolver whose backing service never answers.
struct Unavailable;

impl AlleleResolver for Unavailable {
    fn resolve(&self, _: &AlleleDescription) -> Result<Allele, ResolutionFailure> {
        Err(ResolutionFailure::transient("service unavailable"))
    }
}

#[rstest]
fn test_transient_failures_exhaust_retries(scratch: TempDir) {
    let output = scratch.path().join("out.vcf");
    let alleles_path: PathBuf = scratch.path().join("alleles.json");
    let config = AnnotatorConfig {
        transient_retries: 2,
        unresolved_marker: "NA".to_string(),
        ..Default::default()
    };

    let summary = Pipeline::new(Unavailable, config)
        .run(Path::new(INPUT), &output, Some(&alleles_path))
        .unwrap();

    assert_eq!(summary.alleles_resolved, 0);
    assert_eq!(summary.alleles_unresolved, 12);
    assert_eq!(summary.retries, 24);
    assert!(read_text(&output).contains("DP=10;VRS_Allele_IDs=NA,NA\t"));
    // an empty collection is still written
    assert!(AlleleCollection::load(&alleles_path).unwrap().is_empty());
}
