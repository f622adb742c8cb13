use clap::{Arg, Command, arg, value_parser};

pub const ANNOTATE_CMD: &str = "annotate";

pub fn create_annotate_cli() -> Command {
    Command::new(ANNOTATE_CMD)
        .author("Databio")
        .about("Compute VRS Allele identifiers for every ALT allele of a VCF and write them to INFO.")
        .arg_required_else_help(true)
        .arg(Arg::new("input").required(true).help("VCF to annotate (plain or gzip)"))
        .arg(arg!(-o --output <output> "Annotated VCF to write; a .gz name is gzip compressed").required(true))
        .arg(arg!(-r --fasta <fasta> "Reference FASTA the VCF was called against").required(true))
        .arg(arg!(-a --aliases <aliases> "Two-column TSV of extra sequence names (alias, name)"))
        .arg(arg!(-c --collection <collection> "Write the distinct VRS Alleles to this JSON file"))
        .arg(arg!(--config <config> "TOML file with annotation settings"))
        .arg(arg!(-t --threads <threads> "Worker threads").value_parser(value_parser!(usize)))
        .arg(arg!(--retries <retries> "Extra attempts for transient resolution failures").value_parser(value_parser!(u32)))
        .arg(arg!(--timeout <ms> "Per-allele resolution time limit in milliseconds").value_parser(value_parser!(u64)))
        .arg(arg!(--"info-field" <field> "INFO key for the identifiers"))
        .arg(arg!(--marker <marker> "Placeholder for alleles that could not be resolved"))
        .arg(arg!(--attributes "Also write VRS_Starts, VRS_Ends and VRS_States"))
        .arg(arg!(--"fail-fast" "Stop at the first malformed record instead of skipping it"))
        .arg(arg!(--"no-validate-ref" "Do not check REF against the reference sequence"))
        .arg(arg!(--"no-chr-aliases" "Do not treat chr1 and 1 as the same sequence"))
}
