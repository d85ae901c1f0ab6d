//! Contour-based column detector
//!
//! Smears characters into lines and lines into column blobs, then takes the
//! bounding boxes of the blobs' outer contours.

use image::GrayImage;
use imageproc::contours::{find_contours, BorderType, Contour};
use tracing::debug;

use super::{sort_left_to_right, ColumnDetector};
use crate::geometry::{ColumnBox, DetectionMethod};
use crate::morphology::{close_square, dilate_horizontal, dilate_vertical};
use crate::options::ExtractionOptions;
use crate::preprocess::PreparedPage;

/// Primary detector: morphological blobs + external contours
#[derive(Debug, Clone, Copy, Default)]
pub struct ContourDetector;

impl ColumnDetector for ContourDetector {
    fn method(&self) -> DetectionMethod {
        DetectionMethod::Contour
    }

    fn detect(&self, page: &PreparedPage, options: &ExtractionOptions) -> Option<ColumnBox> {
        let candidates = page.column_candidates(options);
        select_second_column(candidates, page.width(), options)
    }
}

/// Column-sized blobs of a binary page, sorted by left edge
pub fn find_column_candidates(binary: &GrayImage, options: &ExtractionOptions) -> Vec<ColumnBox> {
    let (width, height) = binary.dimensions();
    if width == 0 || height == 0 {
        return Vec::new();
    }

    let lines = dilate_horizontal(binary, options.contour_horizontal_kernel);
    let blobs = dilate_vertical(&lines, options.contour_vertical_kernel);
    let closed = close_square(&blobs, options.contour_close_kernel);

    let min_height = (height as f32 * options.min_candidate_height_ratio) as u32;
    let mut candidates: Vec<ColumnBox> = find_contours::<u32>(&closed)
        .iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .filter_map(bounding_box)
        .filter(|b| b.width >= options.min_candidate_width && b.height >= min_height)
        .collect();

    sort_left_to_right(&mut candidates);
    debug!(count = candidates.len(), "column candidates");
    candidates
}

/// Pick the second candidate from the left
///
/// Returns `None` when fewer than two candidates exist or when the second one
/// starts so close to the left edge that it is really a split first column.
pub fn select_second_column(
    candidates: &[ColumnBox],
    image_width: u32,
    options: &ExtractionOptions,
) -> Option<ColumnBox> {
    let second = *candidates.get(1)?;
    let threshold = options.first_column_threshold(image_width);
    if second.x < threshold {
        debug!(x = second.x, threshold, "second candidate hugs the left edge");
        return None;
    }
    Some(second)
}

fn bounding_box(contour: &Contour<u32>) -> Option<ColumnBox> {
    let first = contour.points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in &contour.points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    ColumnBox::from_edges(min_x, min_y, max_x + 1, max_y + 1)
}
