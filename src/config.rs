//! Configuration file support for hebrew-columns
//!
//! Supports TOML configuration files with the following search order:
//! 1. `--config <path>` - explicitly specified path
//! 2. `./hebrew-columns.toml` - current directory
//! 3. `~/.config/hebrew-columns/config.toml` - user config
//! 4. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [general]
//! threads = 4
//!
//! [batch]
//! manuscript = "john1"
//! skip_existing = true
//!
//! [extraction]
//! valid_width_range = [600, 1400]
//! min_final_width = 700
//! title_scan_height = 400
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::extractor::HebrewTextExtractor;
use crate::options::ExtractionOptions;
use crate::rules::Parity;

/// Default file name looked up in the current directory
pub const CONFIG_FILE_NAME: &str = "hebrew-columns.toml";

/// Configuration file errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading config file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// File not found
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
}

/// General configuration options
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GeneralConfig {
    /// Worker threads (1 = sequential, 0 = one per CPU)
    #[serde(default)]
    pub threads: Option<usize>,

    /// Verbosity level (0-2)
    #[serde(default)]
    pub verbose: Option<u8>,
}

/// Batch selection options
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BatchConfig {
    /// Manuscript id for page-selection rules
    #[serde(default)]
    pub manuscript: Option<String>,

    /// Page index parity processed by the default rule
    #[serde(default)]
    pub keep_parity: Option<Parity>,

    /// Skip images whose crop already exists
    #[serde(default)]
    pub skip_existing: Option<bool>,
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// General settings
    #[serde(default)]
    pub general: GeneralConfig,

    /// Batch settings
    #[serde(default)]
    pub batch: BatchConfig,

    /// Detection thresholds; missing keys keep their defaults
    #[serde(default)]
    pub extraction: ExtractionOptions,
}

/// Effective settings after merging file and CLI values
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub options: ExtractionOptions,
    pub threads: usize,
    pub manuscript: Option<String>,
    pub keep_parity: Parity,
    pub skip_existing: bool,
    /// Log verbosity (0 = warnings, 1 = info, 2+ = debug)
    pub verbose: u8,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            options: ExtractionOptions::default(),
            threads: 1,
            manuscript: None,
            keep_parity: Parity::Even,
            skip_existing: false,
            verbose: 0,
        }
    }
}

impl RunSettings {
    /// Configure an extractor for `input_dir` -> `output_dir`
    pub fn extractor(
        &self,
        input_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> HebrewTextExtractor {
        let extractor = HebrewTextExtractor::with_options(input_dir, output_dir, self.options.clone())
            .threads(self.threads)
            .keep_parity(self.keep_parity)
            .skip_existing(self.skip_existing);
        match &self.manuscript {
            Some(id) => extractor.manuscript(id.clone()),
            None => extractor,
        }
    }
}

impl Config {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from the default search path
    ///
    /// Search order:
    /// 1. `./hebrew-columns.toml`
    /// 2. `~/.config/hebrew-columns/config.toml`
    /// 3. Default values (if no file found)
    pub fn load() -> Result<Self, ConfigError> {
        for path in Self::search_paths() {
            if path.exists() {
                return Self::load_from_path(&path);
            }
        }
        Ok(Self::default())
    }

    /// Load configuration from a specific file path
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Settings described by the file alone
    pub fn to_run_settings(&self) -> RunSettings {
        let defaults = RunSettings::default();
        RunSettings {
            options: self.extraction.clone(),
            threads: self.general.threads.unwrap_or(defaults.threads),
            manuscript: self.batch.manuscript.clone(),
            keep_parity: self.batch.keep_parity.unwrap_or(defaults.keep_parity),
            skip_existing: self.batch.skip_existing.unwrap_or(defaults.skip_existing),
            verbose: self.general.verbose.unwrap_or(defaults.verbose),
        }
    }

    /// Merge with CLI arguments (CLI takes precedence)
    pub fn merge_with_cli(&self, cli: &CliOverrides) -> RunSettings {
        let mut settings = self.to_run_settings();

        if let Some(threads) = cli.threads {
            settings.threads = threads;
        }
        if let Some(manuscript) = &cli.manuscript {
            settings.manuscript = Some(manuscript.clone());
        }
        if let Some(parity) = cli.keep_parity {
            settings.keep_parity = parity;
        }
        if let Some(skip) = cli.skip_existing {
            settings.skip_existing = skip;
        }
        if let Some(verbose) = cli.verbose {
            settings.verbose = verbose;
        }

        settings
    }

    /// Get config file search paths
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(CONFIG_FILE_NAME)];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("hebrew-columns").join("config.toml"));
        }

        paths
    }
}

/// CLI override values for merging with config file
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub threads: Option<usize>,
    pub manuscript: Option<String>,
    pub keep_parity: Option<Parity>,
    pub skip_existing: Option<bool>,
    pub verbose: Option<u8>,
}

impl CliOverrides {
    /// Create new empty overrides
    pub fn new() -> Self {
        Self::default()
    }

    /// Set thread count override
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Set manuscript id override
    pub fn with_manuscript(mut self, manuscript: impl Into<String>) -> Self {
        self.manuscript = Some(manuscript.into());
        self
    }

    /// Set kept parity override
    pub fn with_keep_parity(mut self, parity: Parity) -> Self {
        self.keep_parity = Some(parity);
        self
    }

    /// Set skip-existing override
    pub fn with_skip_existing(mut self, skip: bool) -> Self {
        self.skip_existing = Some(skip);
        self
    }

    /// Set verbosity override
    pub fn with_verbose(mut self, verbose: u8) -> Self {
        self.verbose = Some(verbose);
        self
    }
}
