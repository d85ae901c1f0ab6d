//! Batch extraction module
//!
//! [`HebrewTextExtractor`] walks a directory of page scans, applies the
//! manuscript's page-selection rule, runs the detection pipeline on each
//! selected page and writes the cropped second column under the same file
//! name.
//!
//! # Example
//!
//! ```rust,no_run
//! use hebrew_columns::HebrewTextExtractor;
//!
//! let extractor = HebrewTextExtractor::new("scans/john1", "crops/john1").threads(4);
//! let (successful, total) = extractor.process_all_images().unwrap();
//! println!("{successful}/{total} pages cropped");
//! ```

use rayon::prelude::*;
use serde::Serialize;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, info_span, warn};

use crate::detect::DetectorChain;
use crate::expand::expand;
use crate::geometry::{ColumnBox, DetectionMethod, TitleRegion};
use crate::options::ExtractionOptions;
use crate::preprocess::preprocess_gray;
use crate::refine::{refine, RefineWarning};
use crate::rules::{page_index, selector_for, Parity, Selection, SkipReason};
use crate::title::TitleDetector;
use crate::util::{ensure_dir_writable, intensity_std_dev, is_image_file, load_image};

/// Extraction error types
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Input directory not found: {0}")]
    InputNotFound(PathBuf),

    #[error("Invalid image {path}: {reason}")]
    InvalidImage { path: PathBuf, reason: String },

    #[error("No detection method produced a valid column for {0}")]
    DetectionExhausted(PathBuf),

    #[error("Output error at {path}: {reason}")]
    OutputError { path: PathBuf, reason: String },

    #[error("Thread pool error: {0}")]
    ThreadPool(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Report serialization error: {0}")]
    Report(#[from] serde_json::Error),
}

impl ExtractError {
    /// Pipeline stage a per-image error belongs to
    pub fn stage(&self) -> Stage {
        match self {
            ExtractError::InvalidImage { .. } => Stage::Load,
            ExtractError::DetectionExhausted(_) => Stage::Detect,
            ExtractError::OutputError { .. } => Stage::Write,
            _ => Stage::Internal,
        }
    }
}

pub type Result<T> = std::result::Result<T, ExtractError>;

/// Per-image pipeline stage, reported with failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Load,
    Detect,
    Write,
    Internal,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Load => "load",
            Stage::Detect => "detect",
            Stage::Write => "write",
            Stage::Internal => "internal",
        };
        f.write_str(name)
    }
}

/// One input file and its selection verdict
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageTask {
    pub path: PathBuf,
    pub file_name: String,
    /// Numeric file stem, or the position in the sorted listing
    pub index: u64,
    pub is_odd: bool,
    pub is_skipped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<SkipReason>,
}

/// What happened to one image
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ImageOutcome {
    Cropped {
        method: DetectionMethod,
        bounds: ColumnBox,
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<TitleRegion>,
        #[serde(skip_serializing_if = "Option::is_none")]
        split_at: Option<u32>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        warnings: Vec<RefineWarning>,
    },
    SkippedBlank {
        std_dev: f64,
    },
    SkippedRule {
        reason: SkipReason,
    },
    Failed {
        stage: Stage,
        reason: String,
    },
    /// Output already existed and `skip_existing` was set
    AlreadyPresent,
}

/// Aggregate counters for a batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProcessingSummary {
    /// Crops written (or already present)
    pub processed: usize,
    pub skipped_blank: usize,
    pub skipped_rule: usize,
    pub failed: usize,
}

impl ProcessingSummary {
    pub fn record(&mut self, outcome: &ImageOutcome) {
        match outcome {
            ImageOutcome::Cropped { .. } | ImageOutcome::AlreadyPresent => self.processed += 1,
            ImageOutcome::SkippedBlank { .. } => self.skipped_blank += 1,
            ImageOutcome::SkippedRule { .. } => self.skipped_rule += 1,
            ImageOutcome::Failed { .. } => self.failed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.processed + self.skipped_blank + self.skipped_rule + self.failed
    }
}

/// Outcome of one file, as written to the JSON report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageReport {
    pub file_name: String,
    #[serde(flatten)]
    pub outcome: ImageOutcome,
}

/// Result of a batch run, ordered by file name
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub manuscript: String,
    pub summary: ProcessingSummary,
    pub images: Vec<ImageReport>,
}

impl BatchReport {
    /// Write the report as pretty-printed JSON
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Progress callback for batch runs
pub trait ProgressCallback: Send + Sync {
    /// Called once with the number of files found
    fn on_batch_start(&self, total: usize);
    /// Called after each image; may run on worker threads
    fn on_image_complete(&self, file_name: &str, outcome: &ImageOutcome);
    /// Called once after every image is done
    fn on_batch_complete(&self, summary: &ProcessingSummary);
}

/// No-op progress callback (silent mode)
pub struct SilentProgress;

impl ProgressCallback for SilentProgress {
    fn on_batch_start(&self, _total: usize) {}
    fn on_image_complete(&self, _file_name: &str, _outcome: &ImageOutcome) {}
    fn on_batch_complete(&self, _summary: &ProcessingSummary) {}
}

/// Second-column extractor for a directory of page scans
pub struct HebrewTextExtractor {
    input_dir: PathBuf,
    output_dir: PathBuf,
    options: ExtractionOptions,
    manuscript: Option<String>,
    keep_parity: Parity,
    threads: usize,
    skip_existing: bool,
    chain: DetectorChain,
}

impl HebrewTextExtractor {
    /// Extractor with default options
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self::with_options(input_dir, output_dir, ExtractionOptions::default())
    }

    /// Extractor with explicit options
    pub fn with_options(
        input_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        options: ExtractionOptions,
    ) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            options,
            manuscript: None,
            keep_parity: Parity::Even,
            threads: 1,
            skip_existing: false,
            chain: DetectorChain::standard(),
        }
    }

    /// Override the manuscript id (defaults to the input directory name)
    #[must_use]
    pub fn manuscript(mut self, id: impl Into<String>) -> Self {
        self.manuscript = Some(id.into());
        self
    }

    #[must_use]
    pub fn options(mut self, options: ExtractionOptions) -> Self {
        self.options = options;
        self
    }

    /// Parity of page indices processed by the default rule
    #[must_use]
    pub fn keep_parity(mut self, parity: Parity) -> Self {
        self.keep_parity = parity;
        self
    }

    /// Worker threads (1 = sequential, 0 = one per CPU)
    #[must_use]
    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Leave existing output files untouched
    #[must_use]
    pub fn skip_existing(mut self, skip: bool) -> Self {
        self.skip_existing = skip;
        self
    }

    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn extraction_options(&self) -> &ExtractionOptions {
        &self.options
    }

    /// Detector chain tried on every page
    pub fn detector_chain(&self) -> &DetectorChain {
        &self.chain
    }

    /// Manuscript id used for page-selection rules
    pub fn manuscript_id(&self) -> String {
        self.manuscript.clone().unwrap_or_else(|| {
            self.input_dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        })
    }

    /// Image files of the input directory, sorted by name, with their rule verdicts
    pub fn collect_tasks(&self) -> Result<Vec<ImageTask>> {
        if !self.input_dir.is_dir() {
            return Err(ExtractError::InputNotFound(self.input_dir.clone()));
        }

        let mut paths: Vec<PathBuf> = std::fs::read_dir(&self.input_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && is_image_file(p))
            .collect();
        paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        let selector = selector_for(&self.manuscript_id(), self.keep_parity);
        debug!(rule = selector.name(), files = paths.len(), "collected tasks");

        Ok(paths
            .into_iter()
            .enumerate()
            .map(|(position, path)| {
                let file_name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let index = page_index(&file_name).unwrap_or(position as u64);
                let skip_reason = match selector.select(&file_name, index) {
                    Selection::Process => None,
                    Selection::Skip(reason) => Some(reason),
                };
                ImageTask {
                    path,
                    file_name,
                    index,
                    is_odd: index % 2 == 1,
                    is_skipped: skip_reason.is_some(),
                    skip_reason,
                }
            })
            .collect())
    }

    /// Tasks a run would actually process (dry run)
    pub fn plan(&self) -> Result<Vec<ImageTask>> {
        Ok(self
            .collect_tasks()?
            .into_iter()
            .filter(|t| !t.is_skipped)
            .filter(|t| !(self.skip_existing && self.output_path(t).exists()))
            .collect())
    }

    /// Process every image and return `(successful, total)`
    pub fn process_all_images(&self) -> Result<(usize, usize)> {
        let report = self.run(&SilentProgress)?;
        Ok((report.summary.processed, report.images.len()))
    }

    /// Process every image, reporting progress
    pub fn run(&self, progress: &dyn ProgressCallback) -> Result<BatchReport> {
        let tasks = self.collect_tasks()?;
        ensure_dir_writable(&self.output_dir).map_err(|reason| ExtractError::OutputError {
            path: self.output_dir.clone(),
            reason,
        })?;

        let manuscript = self.manuscript_id();
        progress.on_batch_start(tasks.len());

        let process = |task: &ImageTask| {
            let outcome = self.process_image(task);
            progress.on_image_complete(&task.file_name, &outcome);
            outcome
        };

        let workers = self.worker_count();
        let outcomes: Vec<ImageOutcome> = if workers > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(workers)
                .build()
                .map_err(|e| ExtractError::ThreadPool(e.to_string()))?;
            pool.install(|| tasks.par_iter().map(process).collect())
        } else {
            tasks.iter().map(process).collect()
        };

        let mut summary = ProcessingSummary::default();
        let mut images = Vec::with_capacity(tasks.len());
        for (task, outcome) in tasks.into_iter().zip(outcomes) {
            log_outcome(&task.file_name, &outcome);
            summary.record(&outcome);
            images.push(ImageReport {
                file_name: task.file_name,
                outcome,
            });
        }

        info!(
            manuscript = %manuscript,
            processed = summary.processed,
            skipped_blank = summary.skipped_blank,
            skipped_rule = summary.skipped_rule,
            failed = summary.failed,
            total = summary.total(),
            "batch complete"
        );
        progress.on_batch_complete(&summary);

        Ok(BatchReport {
            manuscript,
            summary,
            images,
        })
    }

    /// Run the full pipeline on one image
    ///
    /// Never panics outward: errors and panics become `Failed` outcomes.
    pub fn process_image(&self, task: &ImageTask) -> ImageOutcome {
        let _span = info_span!("image", file = %task.file_name).entered();

        if let Some(reason) = &task.skip_reason {
            return ImageOutcome::SkippedRule {
                reason: reason.clone(),
            };
        }

        match catch_unwind(AssertUnwindSafe(|| self.try_process(task))) {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => ImageOutcome::Failed {
                stage: e.stage(),
                reason: e.to_string(),
            },
            Err(payload) => ImageOutcome::Failed {
                stage: Stage::Internal,
                reason: panic_message(payload.as_ref()),
            },
        }
    }

    fn try_process(&self, task: &ImageTask) -> Result<ImageOutcome> {
        let output_path = self.output_path(task);
        if self.skip_existing && output_path.exists() {
            return Ok(ImageOutcome::AlreadyPresent);
        }

        let image = load_image(&task.path).map_err(|reason| ExtractError::InvalidImage {
            path: task.path.clone(),
            reason,
        })?;
        let gray = image.to_luma8();

        let std_dev = intensity_std_dev(&gray);
        if std_dev < self.options.blank_std_dev_threshold {
            return Ok(ImageOutcome::SkippedBlank { std_dev });
        }

        let page = preprocess_gray(&gray, &self.options).map_err(|e| ExtractError::InvalidImage {
            path: task.path.clone(),
            reason: e.to_string(),
        })?;
        drop(gray);

        let detection = self
            .chain
            .run(&page, &self.options)
            .result
            .ok_or_else(|| ExtractError::DetectionExhausted(task.path.clone()))?;

        let title = TitleDetector::detect(page.binary(), &detection.bounds, &self.options);
        let expanded = expand(&detection.bounds, page.profile(), &self.options);
        let refined = refine(&expanded.bounds, &page, &self.options);

        let bounds = refined
            .bounds
            .clamped_to(image.width(), image.height())
            .ok_or_else(|| ExtractError::DetectionExhausted(task.path.clone()))?;
        let crop = image.crop_imm(bounds.x, bounds.y, bounds.width, bounds.height);
        crop.save(&output_path)
            .map_err(|e| ExtractError::OutputError {
                path: output_path.clone(),
                reason: e.to_string(),
            })?;

        Ok(ImageOutcome::Cropped {
            method: detection.method,
            bounds,
            title,
            split_at: expanded.split_at,
            warnings: refined.warnings,
        })
    }

    fn output_path(&self, task: &ImageTask) -> PathBuf {
        self.output_dir.join(&task.file_name)
    }

    fn worker_count(&self) -> usize {
        match self.threads {
            0 => num_cpus::get(),
            n => n,
        }
    }
}

/// Process a directory with default options; returns `(successful, total)`
pub fn process_all_images(
    input_dir: impl Into<PathBuf>,
    output_dir: impl Into<PathBuf>,
) -> Result<(usize, usize)> {
    HebrewTextExtractor::new(input_dir, output_dir).process_all_images()
}

fn log_outcome(file: &str, outcome: &ImageOutcome) {
    match outcome {
        ImageOutcome::Cropped {
            method,
            bounds,
            warnings,
            ..
        } => {
            info!(
                file,
                %method,
                x = bounds.x,
                y = bounds.y,
                width = bounds.width,
                height = bounds.height,
                warnings = warnings.len(),
                "cropped"
            );
        }
        ImageOutcome::SkippedBlank { std_dev } => {
            info!(file, std_dev, reason = "blank", "skipped");
        }
        ImageOutcome::SkippedRule { reason } => {
            debug!(file, %reason, "skipped by rule");
        }
        ImageOutcome::Failed { stage, reason } => {
            warn!(file, %stage, %reason, "failed");
        }
        ImageOutcome::AlreadyPresent => {
            debug!(file, "output exists");
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panic: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panic: {s}")
    } else {
        "panic".to_string()
    }
}
