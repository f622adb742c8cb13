mod annotate;
mod logging;

use anyhow::Result;
use clap::{Command, arg};

pub mod consts {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
    pub const BIN_NAME: &str = "vats";
}

fn build_parser() -> Command {
    Command::new(consts::BIN_NAME)
        .bin_name(consts::BIN_NAME)
        .version(consts::VERSION)
        .author("Databio")
        .about("Annotate variant call files with GA4GH VRS Allele identifiers.")
        .subcommand_required(true)
        .arg(arg!(-v --verbose ... "Increase logging verbosity (-v debug, -vv trace)").global(true))
        .subcommand(annotate::cli::create_annotate_cli())
}

fn main() -> Result<()> {
    let app = build_parser();
    let matches = app.get_matches();

    logging::init_verbose(matches.get_count("verbose"));

    match matches.subcommand() {
        //
        // ANNOTATE
        //
        Some((annotate::cli::ANNOTATE_CMD, matches)) => {
            annotate::handlers::run_annotate(matches)?;
        }

        _ => unreachable!("Subcommand not found"),
    };

    Ok(())
}
