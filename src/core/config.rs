//! Run configuration.
//!
//! A run can be described by a TOML file, by command-line flags, or both;
//! flags win. Every field is optional until [`RunConfig::resolve`] checks
//! that an input and a filter were given and fills in defaults.
//!
//! ```toml
//! input = "photo.png"
//! filter = "gaussianblur"
//! args = ["3", "1.5"]
//! iterations = 2
//! bands = 16
//! threads = 4
//! ```

use crate::core::error::ConfigError;
use crate::execution::engine::EngineOptions;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default number of iterations.
pub const DEFAULT_ITERATIONS: usize = 1;

/// Partially specified run, as read from a file or the command line.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Input image.
    pub input: Option<PathBuf>,
    /// Output image; defaults to `<stem>_<filter>.png` next to the input.
    pub output: Option<PathBuf>,
    /// Filter name.
    pub filter: Option<String>,
    /// Positional filter arguments.
    pub args: Vec<String>,
    /// Number of iterations.
    pub iterations: Option<usize>,
    /// Row bands per iteration.
    pub bands: Option<usize>,
    /// Worker threads.
    pub threads: Option<usize>,
}

impl RunConfig {
    /// Load a configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::ConfigFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_toml(&text).map_err(|e| match e {
            ConfigError::ConfigFile { reason, .. } => ConfigError::ConfigFile {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })
    }

    /// Parse configuration text.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::ConfigFile {
            path: PathBuf::new(),
            reason: e.message().to_string(),
        })
    }

    /// Overlay `overrides` on top of `self`. Set fields of `overrides` win;
    /// its filter arguments replace these when non-empty.
    pub fn merge(self, overrides: RunConfig) -> RunConfig {
        RunConfig {
            input: overrides.input.or(self.input),
            output: overrides.output.or(self.output),
            filter: overrides.filter.or(self.filter),
            args: if overrides.args.is_empty() {
                self.args
            } else {
                overrides.args
            },
            iterations: overrides.iterations.or(self.iterations),
            bands: overrides.bands.or(self.bands),
            threads: overrides.threads.or(self.threads),
        }
    }

    /// Check required fields and apply defaults.
    pub fn resolve(self) -> Result<RunPlan, ConfigError> {
        let input = self.input.ok_or_else(|| ConfigError::InvalidOption {
            option: "input".to_string(),
            reason: "an input image is required".to_string(),
        })?;
        let filter = self
            .filter
            .filter(|f| !f.trim().is_empty())
            .ok_or(ConfigError::FilterNotSet)?;
        let output = self
            .output
            .unwrap_or_else(|| crate::io::default_output_path(&input, &filter.to_ascii_lowercase()));

        Ok(RunPlan {
            input,
            output,
            filter,
            args: self.args,
            iterations: self.iterations.unwrap_or(DEFAULT_ITERATIONS),
            bands: self.bands.unwrap_or(0),
            threads: self.threads.unwrap_or(0),
        })
    }
}

/// A fully specified run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunPlan {
    /// Input image.
    pub input: PathBuf,
    /// Output PNG.
    pub output: PathBuf,
    /// Filter name as given.
    pub filter: String,
    /// Positional filter arguments.
    pub args: Vec<String>,
    /// Number of iterations.
    pub iterations: usize,
    /// Row bands per iteration (0 = automatic).
    pub bands: usize,
    /// Worker threads (0 = automatic).
    pub threads: usize,
}

impl RunPlan {
    /// Engine options for this run.
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions::new()
            .with_band_count(self.bands)
            .with_max_threads(self.threads)
    }
}
