//! hebrew-columns - second-column extractor for scanned Hebrew manuscripts
//!
//! Manuscript scans lay text out in columns; the Hebrew text sits in the
//! second column from the left. This crate locates that column on each page
//! image and writes a crop of it, one output file per input page.
//!
//! # Features
//!
//! - **Preprocessing** ([`preprocess`]) - Grayscale, blur and adaptive threshold
//! - **Detection** ([`detect`]) - Contour, Hough-line and projection detectors with a static fallback
//! - **Validation** ([`validate`]) - Geometric plausibility checks on candidate boxes
//! - **Title detection** ([`title`]) - Dense header band above the column
//! - **Expansion and refinement** ([`expand`], [`refine`]) - Full-height crop, split of merged regions, edge repair
//! - **Page rules** ([`rules`]) - Parity and per-manuscript page selection
//! - **Batch processing** ([`extractor`]) - Directory walk, parallel workers, JSON report
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use hebrew_columns::HebrewTextExtractor;
//!
//! let (successful, total) = HebrewTextExtractor::new("scans/john1", "crops/john1")
//!     .threads(0)
//!     .process_all_images()
//!     .unwrap();
//! println!("{successful}/{total}");
//! ```
//!
//! ## Tuning thresholds
//!
//! ```rust
//! use hebrew_columns::ExtractionOptions;
//!
//! let options = ExtractionOptions::builder()
//!     .valid_width_range((500, 1300))
//!     .min_final_width(650)
//!     .build();
//! assert_eq!(options.min_final_width, 650);
//! ```
//!
//! # Architecture
//!
//! ```text
//! Image -> Blank check -> Preprocess -> Detector chain (validate each)
//!                                          |
//!                                Title -> Expand/Split -> Refine -> Crop
//! ```

pub mod cli;
pub mod config;
pub mod detect;
pub mod expand;
pub mod extractor;
pub mod geometry;
pub mod morphology;
pub mod options;
pub mod preprocess;
pub mod refine;
pub mod rules;
pub mod title;
pub mod util;
pub mod validate;

#[cfg(test)]
mod test_utils;

// Re-exports for convenience
pub use cli::{create_progress_bar, BarProgress, Cli, Commands, ExitCode, ExtractArgs, InfoArgs};
pub use config::{CliOverrides, Config, ConfigError, RunSettings};
pub use detect::{
    ChainOutcome, ColumnDetector, ContourDetector, DetectorChain, FallbackDetector, HoughDetector,
    ProjectionDetector,
};
pub use expand::{expand, ExpandedBox};
pub use extractor::{
    process_all_images, BatchReport, ExtractError, HebrewTextExtractor, ImageOutcome, ImageTask,
    ProcessingSummary, ProgressCallback, SilentProgress, Stage,
};
pub use geometry::{ColumnBox, DetectionMethod, DetectionResult, TitleRegion};
pub use options::{ExtractionOptions, ExtractionOptionsBuilder};
pub use preprocess::{preprocess, preprocess_gray, PreparedPage, PreprocessError};
pub use refine::{refine, RefineWarning, Refined};
pub use rules::{selector_for, PageSelector, Parity, Selection, SkipReason};
pub use title::TitleDetector;
pub use validate::{BoxValidator, Rejection};
