//! Verifier configuration
//!
//! Loaded from a TOML file; every option has a default so a partial file
//! (or none at all) is valid.
//!
//! # Example qmverify.toml
//!
//! ```toml
//! multi_project = false
//! max_files_per_project = 3
//! max_types_per_file = 2
//! max_methods_per_type = 4
//! max_fields_per_type = 3
//! file_extension = "x"
//! quality_aspects = ["Reliability"]
//! num_executions = 50
//! findings_to_verify = ["ANY"]
//! finding_probability = 0.0
//! ```

use crate::error::VerifierError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Marker in `findings_to_verify` selecting a random subset of rules
pub const ANY: &str = "ANY";
/// Marker in `findings_to_verify` selecting every rule
pub const ALL: &str = "ALL";

/// Which finding rules receive findings in a trial
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FindingSelection {
    /// Up to `max_findings_activated_for_any` randomly chosen rules
    Any(usize),
    /// Every rule in the graph
    All,
    /// Only the named rules
    Rules(Vec<String>),
}

/// Options controlling generation, injection and the trial loop
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VerifierConfig {
    /// Generate a root project owning several sub-projects
    pub multi_project: bool,

    /// Maximum number of sub-projects in multi-project mode
    pub max_sub_project_depth: u32,

    /// Maximum number of packages per project
    pub max_namespaces: u32,

    /// Maximum number of files per package
    pub max_files_per_project: u32,

    pub max_types_per_file: u32,

    pub max_fields_per_type: u32,

    pub max_methods_per_type: u32,

    /// Extension appended to generated file names (without the dot)
    pub file_extension: String,

    /// Factor names to evaluate, in report order
    pub quality_aspects: Vec<String>,

    /// Number of repeated trials
    pub num_executions: usize,

    /// `["ANY"]`, `["ALL"]`, or explicit rule names
    pub findings_to_verify: Vec<String>,

    /// Rule cap when `findings_to_verify` is `ANY`
    pub max_findings_activated_for_any: usize,

    /// Upper bound on candidate findings drawn per rule
    pub max_findings_per_item: u32,

    /// Probability that a candidate finding is attached
    pub finding_probability: f64,

    /// Quality model TOML; the embedded default model when absent
    pub quality_model: Option<PathBuf>,

    /// Seed for reproducible runs; OS entropy when absent
    pub seed: Option<u64>,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            multi_project: false,
            max_sub_project_depth: 3,
            max_namespaces: 3,
            max_files_per_project: 10,
            max_types_per_file: 3,
            max_fields_per_type: 5,
            max_methods_per_type: 10,
            file_extension: "java".to_string(),
            quality_aspects: vec![
                "Maintainability".to_string(),
                "Reliability".to_string(),
                "Security".to_string(),
            ],
            num_executions: 100,
            findings_to_verify: vec![ANY.to_string()],
            max_findings_activated_for_any: 5,
            max_findings_per_item: 5,
            finding_probability: 0.5,
            quality_model: None,
            seed: None,
        }
    }
}

impl VerifierConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid configuration in {}", path.display()))
    }

    /// Load configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: VerifierConfig = toml::from_str(content).context("Failed to parse TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Interpret `findings_to_verify`
    ///
    /// `ANY` wins over `ALL` when both appear, matching the order the
    /// markers are checked in.
    pub fn finding_selection(&self) -> FindingSelection {
        let has = |marker: &str| {
            self.findings_to_verify
                .iter()
                .any(|name| name.eq_ignore_ascii_case(marker))
        };

        if has(ANY) {
            FindingSelection::Any(self.max_findings_activated_for_any)
        } else if has(ALL) {
            FindingSelection::All
        } else {
            FindingSelection::Rules(self.findings_to_verify.clone())
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> std::result::Result<(), VerifierError> {
        let counts = [
            ("max_namespaces", self.max_namespaces),
            ("max_files_per_project", self.max_files_per_project),
            ("max_types_per_file", self.max_types_per_file),
            ("max_fields_per_type", self.max_fields_per_type),
            ("max_methods_per_type", self.max_methods_per_type),
            ("max_findings_per_item", self.max_findings_per_item),
        ];
        for (name, value) in counts {
            if value < 1 {
                return Err(VerifierError::InvalidConfig(format!(
                    "{} must be >= 1, got {}",
                    name, value
                )));
            }
        }

        if self.multi_project && self.max_sub_project_depth < 1 {
            return Err(VerifierError::InvalidConfig(format!(
                "max_sub_project_depth must be >= 1 in multi-project mode, got {}",
                self.max_sub_project_depth
            )));
        }

        if self.num_executions < 2 {
            return Err(VerifierError::InvalidConfig(format!(
                "num_executions must be >= 2 for t-test, got {}",
                self.num_executions
            )));
        }

        if !(0.0..=1.0).contains(&self.finding_probability) {
            return Err(VerifierError::InvalidConfig(format!(
                "finding_probability must be in [0, 1], got {}",
                self.finding_probability
            )));
        }

        if self.quality_aspects.is_empty() {
            return Err(VerifierError::InvalidConfig(
                "quality_aspects must name at least one aspect".to_string(),
            ));
        }

        if self.file_extension.trim().is_empty() {
            return Err(VerifierError::InvalidConfig(
                "file_extension must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}
