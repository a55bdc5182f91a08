//! CLI argument parsing for qmverify

use crate::config::VerifierConfig;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for the result tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Fixed-width text tables (default)
    Text,
    /// JSON format for machine parsing
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "qmverify")]
#[command(version)]
#[command(
    about = "Statistical verification of quality models against synthetic code trees",
    long_about = None
)]
pub struct Cli {
    /// Configuration file (TOML); built-in defaults when omitted
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Quality model file (TOML); overrides `quality_model` in the config
    #[arg(short, long, value_name = "FILE")]
    pub model: Option<PathBuf>,

    /// Also write the result tables to this file
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Number of trials per run (at least 2)
    #[arg(short = 'n', long, value_name = "N")]
    pub executions: Option<usize>,

    /// Seed for a reproducible run
    #[arg(short, long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Generate a root project with sub-projects
    #[arg(long = "multi-project")]
    pub multi_project: bool,

    /// Output format (text or json)
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Enable debug tracing output to stderr
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Apply command-line overrides on top of a loaded configuration
    pub fn apply_overrides(&self, config: &mut VerifierConfig) {
        if let Some(model) = &self.model {
            config.quality_model = Some(model.clone());
        }
        if let Some(executions) = self.executions {
            config.num_executions = executions;
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if self.multi_project {
            config.multi_project = true;
        }
    }
}
