//! Compute derived diagnostics for every tracer file of a NEMO-BAMHBI output directory.
//!
//! # Usage
//!
//! ```bash
//! # List the available diagnostics
//! ocdiag --printlist
//!
//! # Compute two diagnostics for the 2010 files of a run
//! ocdiag --dir output/ --key 2010 --diaglist ZooResp DOC
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use ocdiag::config::DiagConfig;
use ocdiag::discovery::find_tracer_files;
use ocdiag::process_file;
use ocdiag_core::{lister, Catalogue};
use std::path::PathBuf;

/// Derived diagnostics for NEMO-BAMHBI output
#[derive(Parser, Debug)]
#[command(name = "ocdiag")]
#[command(
    about = "Compute derived diagnostics for each *ptrc_T* file and write them to matching *diag_T* files"
)]
struct Args {
    /// Print the available diagnostics and their requirements, then exit
    #[arg(short, long)]
    printlist: bool,

    /// Report every resolution step
    #[arg(short, long)]
    verbose: bool,

    /// Directory containing the model output
    #[arg(short, long, default_value = "./")]
    dir: PathBuf,

    /// Only process files whose name contains this key, after or before the tracer tag
    #[arg(short, long, default_value = "")]
    key: String,

    /// Diagnostics to compute (e.g. "-l ZooResp DOC")
    #[arg(short = 'l', long, num_args = 1..)]
    diaglist: Option<Vec<String>>,

    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let catalogue = Catalogue::global();
    catalogue.validate()?;

    if args.printlist {
        print!("{}", lister::list_all(catalogue));
        return Ok(());
    }

    let mut config = match &args.config {
        Some(path) => DiagConfig::load(path)?,
        None => DiagConfig::default(),
    };
    if let Some(diaglist) = args.diaglist {
        config.diagnostics = diaglist;
    }

    let names = config.diagnostic_names();
    println!("Selected diagnostics:");
    print!("{}", lister::list(catalogue, &names)?);

    let tracers = find_tracer_files(&args.dir, &config.files, &args.key);
    if tracers.is_empty() {
        warn!("Nothing to do in {}", args.dir.display());
        return Ok(());
    }
    if args.verbose {
        info!("Will process {} files: {:?}", tracers.len(), tracers);
    }

    for tracer in &tracers {
        process_file(tracer, &config, args.verbose)
            .with_context(|| format!("Failed to process {}", tracer.display()))?;
    }
    Ok(())
}
