//! CLI interface module
//!
//! Provides command-line interface using clap derive macros.

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

use crate::extractor::{ImageOutcome, ProcessingSummary, ProgressCallback};
use crate::rules::Parity;

/// Exit codes for the CLI
///
/// These codes follow standard Unix conventions and provide
/// specific error categories for scripting and automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Normal termination
    Success = 0,
    /// Unclassified failure
    GeneralError = 1,
    /// Bad arguments or configuration
    InvalidArgs = 2,
    /// Input directory missing
    InputNotFound = 3,
    /// Output directory or report not writable
    OutputError = 4,
    /// At least one image failed
    ProcessingError = 5,
}

impl ExitCode {
    /// Convert to process exit code
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Get human-readable description
    pub fn description(self) -> &'static str {
        match self {
            ExitCode::Success => "Success",
            ExitCode::GeneralError => "General error",
            ExitCode::InvalidArgs => "Invalid arguments or configuration",
            ExitCode::InputNotFound => "Input directory not found",
            ExitCode::OutputError => "Output error (permission denied, disk full, etc.)",
            ExitCode::ProcessingError => "One or more images failed",
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.code()
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code.code() as u8)
    }
}

/// Second-column extractor for scanned Hebrew manuscript pages
#[derive(Parser, Debug)]
#[command(name = "hebrew-columns")]
#[command(version)]
#[command(about = "Crop the Hebrew text column from scanned manuscript pages", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crop the second column of every selected page in a directory
    Extract(ExtractArgs),
    /// Show version and effective configuration
    Info(InfoArgs),
}

/// Arguments for the extract command
#[derive(clap::Args, Debug)]
pub struct ExtractArgs {
    /// Directory of page scans
    #[arg(long)]
    pub input_dir: PathBuf,

    /// Directory for the cropped columns
    #[arg(long)]
    pub output_dir: PathBuf,

    /// Configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Manuscript id for page-selection rules (default: input directory name)
    #[arg(short, long)]
    pub manuscript: Option<String>,

    /// Page index parity to process (even or odd)
    #[arg(long, value_parser = parse_parity)]
    pub keep: Option<Parity>,

    /// Number of parallel threads (0 = one per CPU)
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Leave existing output files untouched
    #[arg(long)]
    pub skip_existing: bool,

    /// Write a JSON report of every image outcome
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Show execution plan without processing
    #[arg(long)]
    pub dry_run: bool,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,
}

/// Arguments for the info command
#[derive(clap::Args, Debug)]
pub struct InfoArgs {
    /// Configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

fn parse_parity(value: &str) -> Result<Parity, String> {
    match value.to_ascii_lowercase().as_str() {
        "even" => Ok(Parity::Even),
        "odd" => Ok(Parity::Odd),
        other => Err(format!("expected `even` or `odd`, got `{other}`")),
    }
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
        .map(|style| style.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}

/// Create a styled progress bar for file processing
pub fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(bar_style());
    pb
}

/// Progress bar driven by extractor callbacks
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    pub fn new() -> Self {
        Self {
            bar: create_progress_bar(0),
        }
    }

    /// Hidden bar for `--quiet`
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }
}

impl Default for BarProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressCallback for BarProgress {
    fn on_batch_start(&self, total: usize) {
        self.bar.set_length(total as u64);
    }

    fn on_image_complete(&self, file_name: &str, _outcome: &ImageOutcome) {
        self.bar.set_message(file_name.to_string());
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, summary: &ProcessingSummary) {
        self.bar.finish_with_message(format!(
            "{} cropped, {} blank, {} skipped, {} failed",
            summary.processed, summary.skipped_blank, summary.skipped_rule, summary.failed
        ));
    }
}
