//! Column detection module
//!
//! Locates the second text column from the left on a binarized page.
//!
//! # Features
//!
//! - Three independent detectors (contours, Hough lines, projection density)
//! - Static fallback coordinates that always produce a box
//! - An ordered chain that validates each candidate and advances on rejection
//!
//! # Example
//!
//! ```rust,no_run
//! use hebrew_columns::{preprocess, DetectorChain, ExtractionOptions};
//!
//! let options = ExtractionOptions::default();
//! let image = image::open("page.png").unwrap();
//! let page = preprocess(&image, &options).unwrap();
//!
//! let outcome = DetectorChain::standard().run(&page, &options);
//! if let Some(result) = outcome.result {
//!     println!("{} found {}", result.method, result.bounds);
//! }
//! ```

pub mod contour;
pub mod fallback;
pub mod hough;
pub mod projection;

pub use contour::ContourDetector;
pub use fallback::FallbackDetector;
pub use hough::HoughDetector;
pub use projection::ProjectionDetector;

use serde::Serialize;
use tracing::debug;

use crate::geometry::{ColumnBox, DetectionMethod, DetectionResult};
use crate::options::ExtractionOptions;
use crate::preprocess::PreparedPage;
use crate::validate::{BoxValidator, Rejection};

/// A strategy proposing the second column of a page
pub trait ColumnDetector: Send + Sync {
    /// Tag reported for boxes produced by this detector
    fn method(&self) -> DetectionMethod;

    /// Propose a column box, `None` when the strategy finds nothing
    fn detect(&self, page: &PreparedPage, options: &ExtractionOptions) -> Option<ColumnBox>;
}

/// What happened when one detector of the chain was tried
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AttemptOutcome {
    NoCandidate,
    Rejected {
        bounds: ColumnBox,
        reason: Rejection,
    },
    Accepted {
        bounds: ColumnBox,
    },
}

/// One step of a chain run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attempt {
    pub method: DetectionMethod,
    #[serde(flatten)]
    pub outcome: AttemptOutcome,
}

/// Result of running the chain on one page
#[derive(Debug, Clone, PartialEq)]
pub struct ChainOutcome {
    /// First validated box, `None` when every detector failed
    pub result: Option<DetectionResult>,
    /// Every detector tried, in order
    pub attempts: Vec<Attempt>,
}

/// Ordered detectors tried until one produces a validated box
pub struct DetectorChain {
    detectors: Vec<Box<dyn ColumnDetector>>,
}

impl Default for DetectorChain {
    fn default() -> Self {
        Self::standard()
    }
}

impl DetectorChain {
    /// Contour, then Hough, then projection, then fallback coordinates
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(ContourDetector),
            Box::new(HoughDetector),
            Box::new(ProjectionDetector),
            Box::new(FallbackDetector),
        ])
    }

    /// Chain with a custom detector order
    pub fn new(detectors: Vec<Box<dyn ColumnDetector>>) -> Self {
        Self { detectors }
    }

    /// Methods in the order they are tried
    pub fn methods(&self) -> Vec<DetectionMethod> {
        self.detectors.iter().map(|d| d.method()).collect()
    }

    /// Try each detector in order; the first box the validator accepts wins
    pub fn run(&self, page: &PreparedPage, options: &ExtractionOptions) -> ChainOutcome {
        let (width, height) = (page.width(), page.height());
        let mut attempts = Vec::with_capacity(self.detectors.len());

        for detector in &self.detectors {
            let method = detector.method();
            let Some(bounds) = detector.detect(page, options) else {
                debug!(%method, "no candidate");
                attempts.push(Attempt {
                    method,
                    outcome: AttemptOutcome::NoCandidate,
                });
                continue;
            };

            match BoxValidator::check(&bounds, width, height, options) {
                Ok(()) => {
                    debug!(%method, %bounds, "candidate accepted");
                    attempts.push(Attempt {
                        method,
                        outcome: AttemptOutcome::Accepted { bounds },
                    });
                    return ChainOutcome {
                        result: Some(DetectionResult::new(bounds, method)),
                        attempts,
                    };
                }
                Err(reason) => {
                    debug!(%method, %bounds, %reason, "candidate rejected");
                    attempts.push(Attempt {
                        method,
                        outcome: AttemptOutcome::Rejected { bounds, reason },
                    });
                }
            }
        }

        ChainOutcome {
            result: None,
            attempts,
        }
    }
}

/// Sort candidates left to right (ties broken top to bottom)
pub(crate) fn sort_left_to_right(candidates: &mut [ColumnBox]) {
    candidates.sort_by_key(|b| (b.x, b.y));
}
