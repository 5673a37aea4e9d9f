//! Derived diagnostics for NEMO-BAMHBI ocean-model output.
//!
//! The computation lives in [`ocdiag_core`], re-exported here. This crate
//! adds what is needed to run it over a directory of model output: configuration,
//! file discovery and dataset storage.

pub mod config;
pub mod discovery;
pub mod storage;

pub use ocdiag_core;

use crate::config::DiagConfig;
use crate::discovery::companion;
use anyhow::{Context, Result};
use log::{debug, info};
use std::path::{Path, PathBuf};

/// Extra field copied to the output when the tracer file has it
const TIME_CENTERED: &str = "time_centered";

/// Compute the configured diagnostics for a single tracer file.
///
/// The physics companion file is merged into the tracer dataset when it exists. Only
/// the diagnostics and the coordinates they use are written, to the output companion
/// file, whose path is returned.
pub fn process_file(tracer: &Path, config: &DiagConfig, verbose: bool) -> Result<PathBuf> {
    let files = &config.files;
    let mut dataset = storage::load(tracer)?;

    let physics = companion(tracer, &files.tracer_tag, &files.physics_tag);
    if physics != tracer && physics.is_file() {
        debug!("Merging {}", physics.display());
        let other = storage::load(&physics)?;
        dataset
            .merge(other)
            .with_context(|| format!("Failed to merge {}", physics.display()))?;
    }
    dataset.set_vertical_axis(config.vertical.coordinate.as_str());

    let names = config.diagnostic_names();
    ocdiag_core::add(&mut dataset, &names, verbose)
        .with_context(|| format!("Failed to compute diagnostics for {}", tracer.display()))?;

    let mut selected = names.clone();
    if dataset.contains(TIME_CENTERED) && !selected.contains(&TIME_CENTERED) {
        selected.push(TIME_CENTERED);
    }
    let output = companion(tracer, &files.tracer_tag, &files.output_tag);
    storage::save(&dataset.subset(&selected)?, &output)?;
    info!("{} completed", output.display());
    Ok(output)
}
