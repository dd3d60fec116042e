//! Configuration settings for the timetable solver

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::csp::SearchLimits;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub solver: SolverConfig,
    pub builder: BuilderConfig,
    pub input: InputConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Abort after this many search nodes; unset means unlimited
    pub max_steps: Option<u64>,
    /// Abort after this many seconds; unset means unlimited
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuilderConfig {
    pub neighbor_strategy: NeighborStrategy,
    /// Reject snapshots with empty domains before searching
    pub strict_domains: bool,
}

/// How the neighbor relation between sessions is materialized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeighborStrategy {
    /// Every session is a neighbor of every other session
    Complete,
    /// Sessions are neighbors only when their domains share a timeslot
    SharedTimeslot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    pub snapshot_file: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub output_directory: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Text,
    Json,
    Grid,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            solver: SolverConfig {
                max_steps: None,
                timeout_seconds: Some(300),
            },
            builder: BuilderConfig {
                neighbor_strategy: NeighborStrategy::Complete,
                strict_domains: true,
            },
            input: InputConfig {
                snapshot_file: PathBuf::from("input/snapshot.json"),
            },
            output: OutputConfig {
                format: OutputFormat::Text,
                output_directory: PathBuf::from("output/timetables"),
            },
        }
    }
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let settings: Settings = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(settings)
    }

    /// Save settings to a YAML file
    pub fn to_file(&self, path: &PathBuf) -> Result<()> {
        let content = serde_yaml::to_string(self).context("Failed to serialize settings")?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<()> {
        if self.solver.max_steps == Some(0) {
            anyhow::bail!("Maximum steps must be positive when set");
        }

        if self.solver.timeout_seconds == Some(0) {
            anyhow::bail!("Timeout must be positive when set");
        }

        if !self.input.snapshot_file.exists() {
            anyhow::bail!("Snapshot file does not exist: {}", self.input.snapshot_file.display());
        }

        Ok(())
    }

    /// Search budgets derived from the solver section
    pub fn search_limits(&self) -> SearchLimits {
        SearchLimits {
            max_steps: self.solver.max_steps,
            timeout: self.solver.timeout_seconds.map(Duration::from_secs),
        }
    }

    /// Merge settings with command line overrides
    pub fn merge_with_cli(&mut self, cli_overrides: &CliOverrides) {
        if let Some(ref snapshot_file) = cli_overrides.snapshot_file {
            self.input.snapshot_file = snapshot_file.clone();
        }
        if let Some(ref output_dir) = cli_overrides.output_dir {
            self.output.output_directory = output_dir.clone();
        }
        if let Some(format) = cli_overrides.format {
            self.output.format = format;
        }
        if let Some(max_steps) = cli_overrides.max_steps {
            self.solver.max_steps = Some(max_steps);
        }
        if let Some(timeout) = cli_overrides.timeout_seconds {
            self.solver.timeout_seconds = Some(timeout);
        }
        if let Some(strategy) = cli_overrides.neighbor_strategy {
            self.builder.neighbor_strategy = strategy;
        }
    }
}

/// Command line overrides for settings
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub snapshot_file: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub format: Option<OutputFormat>,
    pub max_steps: Option<u64>,
    pub timeout_seconds: Option<u64>,
    pub neighbor_strategy: Option<NeighborStrategy>,
}
