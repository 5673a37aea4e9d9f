//! Reading and writing datasets as JSON.

use anyhow::{Context, Result};
use ocdiag_core::Dataset;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Read a dataset, checking that every field is consistent with its dimensions.
pub fn load(path: &Path) -> Result<Dataset> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let dataset: Dataset = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse dataset {}", path.display()))?;
    dataset
        .validate()
        .with_context(|| format!("Invalid dataset {}", path.display()))?;
    Ok(dataset)
}

/// Write a dataset, replacing any existing file.
pub fn save(dataset: &Dataset, path: &Path) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, dataset)
        .with_context(|| format!("Failed to write dataset {}", path.display()))?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}
