//! Post-detection refinement
//!
//! Final corrections applied to an expanded box: repair a right edge that
//! cuts through text, swap a third-column pick for the second column, and
//! enforce the minimum crop width.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::detect::contour::select_second_column;
use crate::geometry::ColumnBox;
use crate::morphology::ColumnProfile;
use crate::options::ExtractionOptions;
use crate::preprocess::PreparedPage;
use crate::validate::BoxValidator;

/// Non-fatal refinement problems, reported with the crop
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RefineWarning {
    #[error("right edge stopped at the {limit}px expansion cap while text continues")]
    ExpansionLimitReached { right: u32, limit: u32 },

    #[error("width {width} below the {required}px minimum (image too narrow)")]
    MinimumWidthUnmet { width: u32, required: u32 },
}

/// Refined box with any warnings raised on the way
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Refined {
    pub bounds: ColumnBox,
    pub warnings: Vec<RefineWarning>,
}

/// Run every refinement pass in order
pub fn refine(bounds: &ColumnBox, page: &PreparedPage, options: &ExtractionOptions) -> Refined {
    let mut warnings = Vec::new();

    let (repaired, warning) = repair_right_edge(bounds, page.profile(), options);
    warnings.extend(warning);

    let corrected = correct_wrong_column(
        &repaired,
        page.column_candidates(options),
        (page.width(), page.height()),
        options,
    );

    let (widened, warning) = enforce_min_width(&corrected, page.width(), options);
    warnings.extend(warning);

    for w in &warnings {
        warn!(warning = %w, "refinement");
    }
    Refined {
        bounds: widened,
        warnings,
    }
}

/// Push the right edge past text it cuts through
///
/// Triggered when the rightmost `edge_strip_width` strip is denser than
/// `edge_density_threshold`. The edge then advances in `edge_scan_step`
/// strips while they stay denser than `continuation_density`, at most
/// `max_right_expansion` pixels and never past the page.
pub fn repair_right_edge(
    bounds: &ColumnBox,
    profile: &ColumnProfile,
    options: &ExtractionOptions,
) -> (ColumnBox, Option<RefineWarning>) {
    let page_width = profile.width();
    let right = bounds.right().min(page_width);
    let strip_start = right.saturating_sub(options.edge_strip_width).max(bounds.x);
    if profile.strip_density(strip_start, right) <= options.edge_density_threshold {
        return (*bounds, None);
    }

    let step = options.edge_scan_step.max(1);
    let cap = (bounds.right() + options.max_right_expansion).min(page_width);
    let mut new_right = right;
    let mut warning = None;

    loop {
        if new_right >= cap {
            let still_dense = new_right < page_width
                && profile.strip_density(new_right, new_right + step) > options.continuation_density;
            if still_dense {
                warning = Some(RefineWarning::ExpansionLimitReached {
                    right: new_right,
                    limit: options.max_right_expansion,
                });
            }
            break;
        }
        let next = (new_right + step).min(cap);
        if profile.strip_density(new_right, next) <= options.continuation_density {
            break;
        }
        new_right = next;
    }

    if new_right != right {
        debug!(from = right, to = new_right, "right edge repaired");
    }
    (bounds.with_x_range(bounds.x, new_right), warning)
}

/// Replace a third-column pick with the second contour candidate
///
/// The expected column goes through the same left-edge rule as the contour
/// detector, and the replacement must itself pass validation. Otherwise the
/// box is kept.
pub fn correct_wrong_column(
    bounds: &ColumnBox,
    candidates: &[ColumnBox],
    (page_width, page_height): (u32, u32),
    options: &ExtractionOptions,
) -> ColumnBox {
    let Some(expected) = select_second_column(candidates, page_width, options) else {
        return *bounds;
    };
    if bounds.x <= expected.x + options.wrong_column_gap {
        return *bounds;
    }

    let replacement = bounds.with_x_range(expected.x, expected.right());
    if !BoxValidator::is_valid(&replacement, page_width, page_height, options) {
        debug!(to = %replacement, "wrong column kept, replacement invalid");
        return *bounds;
    }
    debug!(from = bounds.x, to = expected.x, "wrong column corrected");
    replacement
}

/// Widen to `min_final_width`, right first, then left
pub fn enforce_min_width(
    bounds: &ColumnBox,
    page_width: u32,
    options: &ExtractionOptions,
) -> (ColumnBox, Option<RefineWarning>) {
    let required = options.min_final_width;
    if bounds.width >= required {
        return (*bounds, None);
    }

    let right = (bounds.x + required).min(page_width).max(bounds.right());
    let missing = required.saturating_sub(right - bounds.x);
    let left = bounds.x.saturating_sub(missing);
    let widened = bounds.with_x_range(left, right);

    let warning = (widened.width < required).then_some(RefineWarning::MinimumWidthUnmet {
        width: widened.width,
        required,
    });
    (widened, warning)
}
