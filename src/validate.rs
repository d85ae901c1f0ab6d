//! Column box validation
//!
//! Every detector's proposal passes through [`BoxValidator::check`] before it
//! is accepted. Checks run in a fixed order and the first failure is reported.

use serde::Serialize;
use thiserror::Error;

use crate::geometry::ColumnBox;
use crate::options::ExtractionOptions;

/// Why a proposed box was not accepted
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Rejection {
    #[error("box exceeds the {image_width}x{image_height} image")]
    OutOfBounds { image_width: u32, image_height: u32 },

    #[error("width {width} outside {min}..={max}")]
    WidthOutOfRange { width: u32, min: u32, max: u32 },

    #[error("height {height} below required {required}")]
    TooShort { height: u32, required: u32 },

    #[error("left edge {x} closer than {margin}px to the page edge")]
    TooCloseToLeft { x: u32, margin: u32 },

    #[error("center {center:.1} not left of {limit:.1}")]
    RightOfCenter { center: f64, limit: f64 },
}

/// Geometric sanity checks for a second-column box
pub struct BoxValidator;

impl BoxValidator {
    /// Accept or reject `bounds` on a `width` x `height` page
    pub fn check(
        bounds: &ColumnBox,
        width: u32,
        height: u32,
        options: &ExtractionOptions,
    ) -> Result<(), Rejection> {
        if !bounds.fits_within(width, height) {
            return Err(Rejection::OutOfBounds {
                image_width: width,
                image_height: height,
            });
        }

        let (min, max) = options.valid_width_range;
        if bounds.width < min || bounds.width > max {
            return Err(Rejection::WidthOutOfRange {
                width: bounds.width,
                min,
                max,
            });
        }

        let required = options.required_column_height(height);
        if bounds.height < required {
            return Err(Rejection::TooShort {
                height: bounds.height,
                required,
            });
        }

        if bounds.x < options.left_edge_margin {
            return Err(Rejection::TooCloseToLeft {
                x: bounds.x,
                margin: options.left_edge_margin,
            });
        }

        let limit = width as f64 * options.max_center_ratio as f64;
        if bounds.center_x() >= limit {
            return Err(Rejection::RightOfCenter {
                center: bounds.center_x(),
                limit,
            });
        }

        Ok(())
    }

    /// Convenience wrapper returning a plain verdict
    pub fn is_valid(bounds: &ColumnBox, width: u32, height: u32, options: &ExtractionOptions) -> bool {
        Self::check(bounds, width, height, options).is_ok()
    }
}
