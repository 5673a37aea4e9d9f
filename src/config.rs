//! Driver configuration.
//!
//! Configuration is read from a TOML file. Every key is optional and falls back to the
//! conventions of NEMO-BAMHBI output:
//!
//! ```toml
//! diagnostics = ["NPPO", "NPPOI"]
//!
//! [vertical]
//! coordinate = "deptht"
//!
//! [files]
//! tracer_tag = "ptrc_T"
//! physics_tag = "grid_T"
//! output_tag = "diag_T"
//! extension = "json"
//! ```

use anyhow::{Context, Result};
use ocdiag_core::dataset::DEFAULT_VERTICAL_AXIS;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Diagnostics computed when none are requested explicitly
pub const DEFAULT_DIAGNOSTICS: [&str; 7] = [
    "NPPO",
    "ZooResp",
    "DOC",
    "ZooRespI",
    "NPPOI",
    "OXIDATIONBYDOXI",
    "bac_oxygenconsumptionI",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VerticalConfig {
    /// Name of the depth coordinate of tracer fields
    pub coordinate: String,
}

impl Default for VerticalConfig {
    fn default() -> Self {
        Self {
            coordinate: DEFAULT_VERTICAL_AXIS.to_string(),
        }
    }
}

/// Naming of the files making up one model output.
///
/// Companion files share the name of the tracer file, with the tracer tag replaced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Tag identifying pelagic tracer files
    pub tracer_tag: String,
    /// Tag of the physics file merged into each tracer file
    pub physics_tag: String,
    /// Tag of the files holding the computed diagnostics
    pub output_tag: String,
    pub extension: String,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            tracer_tag: "ptrc_T".to_string(),
            physics_tag: "grid_T".to_string(),
            output_tag: "diag_T".to_string(),
            extension: "json".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiagConfig {
    pub diagnostics: Vec<String>,
    pub vertical: VerticalConfig,
    pub files: FileConfig,
}

impl Default for DiagConfig {
    fn default() -> Self {
        Self {
            diagnostics: DEFAULT_DIAGNOSTICS.iter().map(|s| s.to_string()).collect(),
            vertical: VerticalConfig::default(),
            files: FileConfig::default(),
        }
    }
}

impl DiagConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Invalid configuration")
    }

    /// Read the configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration {}", path.display()))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse configuration {}", path.display()))
    }

    pub fn diagnostic_names(&self) -> Vec<&str> {
        self.diagnostics.iter().map(String::as_str).collect()
    }
}
