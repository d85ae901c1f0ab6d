//! Extraction options module
//!
//! Every tunable threshold of the pipeline lives in [`ExtractionOptions`].
//! The struct is built once (defaults, builder, TOML file, CLI overrides) and
//! passed by reference into each stage.

use serde::{Deserialize, Serialize};

// ============================================================
// Constants
// ============================================================

/// Column widths accepted by the validator (pixels)
pub const DEFAULT_VALID_WIDTH_RANGE: (u32, u32) = (600, 1400);

/// Typical width of the second column (pixels)
pub const DEFAULT_TYPICAL_WIDTH_RANGE: (u32, u32) = (800, 1200);

/// Fraction of the page height a cropped column must cover
pub const DEFAULT_MIN_HEIGHT_RATIO: f32 = 0.85;

/// Fraction of the page height a detected column must cover
pub const DEFAULT_VALIDATION_HEIGHT_RATIO: f32 = 0.40;

/// Absolute minimum height of a detected column (pixels)
pub const DEFAULT_VALIDATION_MIN_HEIGHT: u32 = 1500;

/// Height of the band scanned for a title above the column (pixels)
pub const DEFAULT_TITLE_SCAN_HEIGHT: u32 = 400;

/// Grayscale standard deviation below which a page is considered blank
pub const DEFAULT_BLANK_STD_DEV: f64 = 15.0;

/// Width floor enforced by the refiner (pixels)
pub const DEFAULT_MIN_FINAL_WIDTH: u32 = 700;

/// Width floor after splitting a merged region (pixels)
pub const DEFAULT_SPLIT_MIN_WIDTH: u32 = 800;

/// Maximum growth of the right edge when text is cut off (pixels)
pub const DEFAULT_MAX_RIGHT_EXPANSION: u32 = 300;

/// Regions wider than this are treated as two merged columns (pixels)
pub const DEFAULT_SPLIT_WIDTH_THRESHOLD: u32 = 900;

/// Regions starting left of this are treated as two merged columns (pixels)
pub const DEFAULT_SPLIT_LEFT_THRESHOLD: u32 = 150;

/// Columns starting left of this belong to the first column (pixels)
pub const DEFAULT_LEFT_EDGE_MARGIN: u32 = 50;

/// Gap from the expected second column that signals a third-column pick
pub const DEFAULT_WRONG_COLUMN_GAP: u32 = 150;

// ============================================================
// Options
// ============================================================

/// Tunable parameters for every pipeline stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionOptions {
    // --- Preprocessing ---
    /// Smoothing blur kernel size (odd)
    pub blur_kernel: u32,
    /// Adaptive threshold neighborhood (odd)
    pub adaptive_block_size: u32,
    /// Constant subtracted from the local weighted mean
    pub adaptive_offset: f32,

    // --- Contour detector ---
    /// Horizontal dilation length joining characters into lines
    pub contour_horizontal_kernel: u32,
    /// Vertical dilation length joining lines into a column
    pub contour_vertical_kernel: u32,
    /// Square closing kernel filling gaps inside a column blob
    pub contour_close_kernel: u32,
    /// Candidates narrower than this are not columns
    pub min_candidate_width: u32,
    /// Candidates shorter than this fraction of the page are not columns
    pub min_candidate_height_ratio: f32,
    /// Relative left-edge threshold used together with `left_edge_margin`
    pub left_edge_ratio: f32,

    // --- Hough detector ---
    /// Vertical opening length isolating ruled lines
    pub hough_vertical_kernel: u32,
    /// Minimum line length as a fraction of page height
    pub hough_min_line_ratio: f32,
    /// Maximum deviation from vertical (degrees)
    pub hough_max_tilt_degrees: u32,
    /// Largest gap bridged inside one line segment
    pub hough_max_line_gap: u32,
    /// Segments closer than this share one boundary
    pub hough_cluster_distance: u32,

    // --- Projection detector ---
    /// Window widths tried by the projection detector
    pub typical_width_range: (u32, u32),
    pub projection_width_step: u32,
    pub projection_x_step: u32,
    /// Windows may not start left of this
    pub projection_left_exclusion: u32,
    /// Minimum mean foreground fraction inside the window
    pub projection_min_density: f32,
    /// Width of the valley required left of the window
    pub projection_valley_width: u32,
    /// Valley density relative to the window density
    pub projection_valley_ratio: f32,

    // --- Fallback coordinates ---
    pub fallback_x_ratio: f32,
    pub fallback_width_ratio: f32,
    pub fallback_width_range: (u32, u32),

    // --- Validation ---
    pub valid_width_range: (u32, u32),
    pub validation_height_ratio: f32,
    pub validation_min_height: u32,
    /// Column center must lie left of this fraction of the page width
    pub max_center_ratio: f32,
    pub left_edge_margin: u32,

    // --- Title ---
    pub title_scan_height: u32,
    pub title_height_range: (u32, u32),
    /// Row foreground fraction marking title text
    pub title_density: f32,

    // --- Expansion ---
    pub min_height_ratio: f32,
    pub split_width_threshold: u32,
    pub split_left_threshold: u32,
    /// Split point search window, measured from the region's left edge
    pub split_offset_range: (u32, u32),
    pub split_min_width: u32,

    // --- Refinement ---
    pub edge_strip_width: u32,
    pub edge_density_threshold: f32,
    pub continuation_density: f32,
    pub edge_scan_step: u32,
    pub max_right_expansion: u32,
    pub wrong_column_gap: u32,
    pub min_final_width: u32,

    // --- Batch ---
    pub blank_std_dev_threshold: f64,
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            blur_kernel: 5,
            adaptive_block_size: 31,
            adaptive_offset: 12.0,

            contour_horizontal_kernel: 25,
            contour_vertical_kernel: 45,
            contour_close_kernel: 15,
            min_candidate_width: 300,
            min_candidate_height_ratio: 0.30,
            left_edge_ratio: 0.05,

            hough_vertical_kernel: 80,
            hough_min_line_ratio: 0.30,
            hough_max_tilt_degrees: 3,
            hough_max_line_gap: 25,
            hough_cluster_distance: 40,

            typical_width_range: DEFAULT_TYPICAL_WIDTH_RANGE,
            projection_width_step: 50,
            projection_x_step: 10,
            projection_left_exclusion: DEFAULT_SPLIT_LEFT_THRESHOLD,
            projection_min_density: 0.05,
            projection_valley_width: 40,
            projection_valley_ratio: 0.5,

            fallback_x_ratio: 0.28,
            fallback_width_ratio: 0.40,
            fallback_width_range: (700, 1100),

            valid_width_range: DEFAULT_VALID_WIDTH_RANGE,
            validation_height_ratio: DEFAULT_VALIDATION_HEIGHT_RATIO,
            validation_min_height: DEFAULT_VALIDATION_MIN_HEIGHT,
            max_center_ratio: 0.5,
            left_edge_margin: DEFAULT_LEFT_EDGE_MARGIN,

            title_scan_height: DEFAULT_TITLE_SCAN_HEIGHT,
            title_height_range: (25, 220),
            title_density: 0.05,

            min_height_ratio: DEFAULT_MIN_HEIGHT_RATIO,
            split_width_threshold: DEFAULT_SPLIT_WIDTH_THRESHOLD,
            split_left_threshold: DEFAULT_SPLIT_LEFT_THRESHOLD,
            split_offset_range: (400, 500),
            split_min_width: DEFAULT_SPLIT_MIN_WIDTH,

            edge_strip_width: 50,
            edge_density_threshold: 0.18,
            continuation_density: 0.08,
            edge_scan_step: 20,
            max_right_expansion: DEFAULT_MAX_RIGHT_EXPANSION,
            wrong_column_gap: DEFAULT_WRONG_COLUMN_GAP,
            min_final_width: DEFAULT_MIN_FINAL_WIDTH,

            blank_std_dev_threshold: DEFAULT_BLANK_STD_DEV,
        }
    }
}

impl ExtractionOptions {
    /// Create a new options builder
    pub fn builder() -> ExtractionOptionsBuilder {
        ExtractionOptionsBuilder::default()
    }

    /// Left-edge threshold used by the column detectors
    pub fn first_column_threshold(&self, image_width: u32) -> u32 {
        let relative = (image_width as f32 * self.left_edge_ratio) as u32;
        self.left_edge_margin.max(relative)
    }

    /// Height a detected column must reach on a page of `image_height`
    ///
    /// Capped at the page height so a full-height box on a short scan passes.
    pub fn required_column_height(&self, image_height: u32) -> u32 {
        scaled_ceil(image_height, self.validation_height_ratio)
            .max(self.validation_min_height)
            .min(image_height)
    }

    /// Minimum crop height on a page of `image_height`
    pub fn min_crop_height(&self, image_height: u32) -> u32 {
        scaled_ceil(image_height, self.min_height_ratio).min(image_height)
    }
}

/// `ceil(value * ratio)`, tolerant of the f32 representation error in `ratio`
fn scaled_ceil(value: u32, ratio: f32) -> u32 {
    (value as f64 * ratio as f64 - 1e-3).ceil().max(0.0) as u32
}

/// Builder for ExtractionOptions
#[derive(Debug, Default)]
pub struct ExtractionOptionsBuilder {
    options: ExtractionOptions,
}

fn odd(value: u32) -> u32 {
    if value % 2 == 0 {
        value + 1
    } else {
        value
    }
}

fn ordered(range: (u32, u32)) -> (u32, u32) {
    (range.0.min(range.1), range.0.max(range.1))
}

impl ExtractionOptionsBuilder {
    /// Set the smoothing blur kernel (forced odd)
    #[must_use]
    pub fn blur_kernel(mut self, size: u32) -> Self {
        self.options.blur_kernel = odd(size.max(1));
        self
    }

    /// Set the adaptive threshold neighborhood (forced odd, at least 3)
    #[must_use]
    pub fn adaptive_block_size(mut self, size: u32) -> Self {
        self.options.adaptive_block_size = odd(size.max(3));
        self
    }

    /// Set the adaptive threshold offset
    #[must_use]
    pub fn adaptive_offset(mut self, offset: f32) -> Self {
        self.options.adaptive_offset = offset;
        self
    }

    /// Set the width range accepted by the validator
    #[must_use]
    pub fn valid_width_range(mut self, range: (u32, u32)) -> Self {
        self.options.valid_width_range = ordered(range);
        self
    }

    /// Set the typical column width range used by the projection detector
    #[must_use]
    pub fn typical_width_range(mut self, range: (u32, u32)) -> Self {
        self.options.typical_width_range = ordered(range);
        self
    }

    /// Set the minimum crop height ratio (0.0-1.0)
    #[must_use]
    pub fn min_height_ratio(mut self, ratio: f32) -> Self {
        self.options.min_height_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    /// Set the validation height ratio (0.0-1.0)
    #[must_use]
    pub fn validation_height_ratio(mut self, ratio: f32) -> Self {
        self.options.validation_height_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    /// Set the absolute validation minimum height
    #[must_use]
    pub fn validation_min_height(mut self, height: u32) -> Self {
        self.options.validation_min_height = height;
        self
    }

    /// Set the title scan band height
    #[must_use]
    pub fn title_scan_height(mut self, height: u32) -> Self {
        self.options.title_scan_height = height;
        self
    }

    /// Set the blank-page standard deviation threshold
    #[must_use]
    pub fn blank_std_dev_threshold(mut self, threshold: f64) -> Self {
        self.options.blank_std_dev_threshold = threshold.max(0.0);
        self
    }

    /// Set the refiner's width floor
    #[must_use]
    pub fn min_final_width(mut self, width: u32) -> Self {
        self.options.min_final_width = width;
        self
    }

    /// Set the width floor after a wide-region split
    #[must_use]
    pub fn split_min_width(mut self, width: u32) -> Self {
        self.options.split_min_width = width;
        self
    }

    /// Set the maximum right-edge expansion
    #[must_use]
    pub fn max_right_expansion(mut self, pixels: u32) -> Self {
        self.options.max_right_expansion = pixels;
        self
    }

    /// Set the wide-region split thresholds (width, left edge)
    #[must_use]
    pub fn split_thresholds(mut self, width: u32, left: u32) -> Self {
        self.options.split_width_threshold = width;
        self.options.split_left_threshold = left;
        self
    }

    /// Set the split point search window relative to the region's left edge
    #[must_use]
    pub fn split_offset_range(mut self, range: (u32, u32)) -> Self {
        self.options.split_offset_range = ordered(range);
        self
    }

    /// Set the left-edge margin
    #[must_use]
    pub fn left_edge_margin(mut self, pixels: u32) -> Self {
        self.options.left_edge_margin = pixels;
        self
    }

    /// Set the wrong-column gap threshold
    #[must_use]
    pub fn wrong_column_gap(mut self, pixels: u32) -> Self {
        self.options.wrong_column_gap = pixels;
        self
    }

    /// Build the options
    #[must_use]
    pub fn build(self) -> ExtractionOptions {
        self.options
    }
}
