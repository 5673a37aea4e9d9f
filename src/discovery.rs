//! Location of model output files and their companions.
//!
//! Model runs write one file per output stream, sharing a common file name in which
//! only a tag differs (e.g. `run_1d_ptrc_T_2010.json` and `run_1d_grid_T_2010.json`).
//! Tracer files are found by their tag, and the name of every companion file is
//! derived from the tracer file name.

use crate::config::FileConfig;
use log::warn;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Check that `parts` occur in `name`, in order and without overlapping.
fn contains_in_order(name: &str, parts: &[&str]) -> bool {
    let mut rest = name;
    for part in parts {
        match rest.find(part) {
            Some(i) => rest = &rest[i + part.len()..],
            None => return false,
        }
    }
    true
}

fn files_matching(dir: &Path, extension: &str, parts: &[&str]) -> Vec<PathBuf> {
    let suffix = format!(".{}", extension);
    let mut found: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.file_name().to_str().is_some_and(|name| {
                name.strip_suffix(&suffix)
                    .is_some_and(|stem| contains_in_order(stem, parts))
            })
        })
        .map(|e| e.into_path())
        .collect();
    found.sort();
    found
}

/// Find the tracer files of `dir` whose name contains `key`.
///
/// Files with the key after the tracer tag are preferred. Only when there are none are
/// files with the key before the tag considered. The result is sorted.
pub fn find_tracer_files(dir: &Path, files: &FileConfig, key: &str) -> Vec<PathBuf> {
    let tag = files.tracer_tag.as_str();
    let found = files_matching(dir, &files.extension, &[tag, key]);
    if !found.is_empty() {
        return found;
    }
    warn!(
        "No files of the form {}",
        dir.join(format!("*{}*{}*.{}", tag, key, files.extension)).display()
    );

    let found = files_matching(dir, &files.extension, &[key, tag]);
    if found.is_empty() {
        warn!(
            "No files of the form {}",
            dir.join(format!("*{}*{}*.{}", key, tag, files.extension)).display()
        );
    }
    found
}

/// Name of the file of another output stream, replacing `tracer_tag` by `tag`.
///
/// Every occurrence of the tracer tag in the file name is replaced. The directory is
/// kept unchanged.
pub fn companion(path: &Path, tracer_tag: &str, tag: &str) -> PathBuf {
    match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => path.with_file_name(name.replace(tracer_tag, tag)),
        None => path.to_path_buf(),
    }
}
