//! Projection-density column detector
//!
//! Slides windows of typical column width over the vertical projection and
//! looks for the rising edge of a text column: an empty valley on the left,
//! dense text just inside the window and a first column further left.

use tracing::debug;

use super::ColumnDetector;
use crate::geometry::{ColumnBox, DetectionMethod};
use crate::morphology::ColumnProfile;
use crate::options::ExtractionOptions;
use crate::preprocess::PreparedPage;

/// Tertiary detector: vertical projection density
#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectionDetector;

impl ColumnDetector for ProjectionDetector {
    fn method(&self) -> DetectionMethod {
        DetectionMethod::Projection
    }

    fn detect(&self, page: &PreparedPage, options: &ExtractionOptions) -> Option<ColumnBox> {
        let (left, right) = find_density_window(page.profile(), options)?;
        ColumnBox::from_edges(left, 0, right, page.height())
    }
}

/// A window start where a column begins
#[derive(Debug, Clone, Copy)]
struct RisingEdge {
    x: u32,
    contrast: f32,
}

/// Horizontal range `[left, right)` of the second column, if one stands out
pub fn find_density_window(
    profile: &ColumnProfile,
    options: &ExtractionOptions,
) -> Option<(u32, u32)> {
    let width = profile.width();
    let valley = options.projection_valley_width.max(1);
    let step = options.projection_x_step.max(1);
    let (min_w, max_w) = options.typical_width_range;
    if width < min_w || profile.height() == 0 {
        return None;
    }

    // Foreground a first column must contribute left of the valley
    let support = options.min_candidate_width as f64
        * options.projection_min_density as f64
        * profile.height() as f64;

    let start = options.projection_left_exclusion.max(valley);
    let mut edges: Vec<RisingEdge> = Vec::new();
    let mut x = start;
    while x + min_w <= width {
        let valley_density = profile.strip_density(x - valley, x);
        let entry_density = profile.strip_density(x, x + valley);
        let has_support = profile.sum(0, x - valley) as f64 >= support;

        if has_support
            && entry_density >= options.projection_min_density
            && valley_density <= entry_density * options.projection_valley_ratio
        {
            edges.push(RisingEdge {
                x,
                contrast: entry_density - valley_density,
            });
        }
        x += step;
    }

    // Leftmost group of adjacent rising edges; its sharpest edge is the start
    let first = edges.first()?;
    let group_end = edges
        .windows(2)
        .position(|pair| pair[1].x - pair[0].x > valley)
        .map_or(edges.len(), |i| i + 1);
    let best = edges[..group_end]
        .iter()
        .fold(*first, |best, e| if e.contrast > best.contrast { *e } else { best });

    let left = best.x;
    let mut chosen: Option<(u32, f32)> = None;
    let width_step = options.projection_width_step.max(1);
    let mut w = min_w;
    while w <= max_w && left + w <= width {
        let density = profile.strip_density(left, left + w);
        if density >= options.projection_min_density
            && chosen.map_or(true, |(_, d)| density >= d)
        {
            chosen = Some((w, density));
        }
        w += width_step;
    }

    let (w, density) = chosen?;
    debug!(left, width = w, density, "projection window");
    Some((left, left + w))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{binary_page, fill_rect, text_block};

    fn detect(binary: image::GrayImage) -> Option<ColumnBox> {
        let page = PreparedPage::from_binary(binary);
        ProjectionDetector.detect(&page, &ExtractionOptions::default())
    }

    #[test]
    fn test_finds_second_text_column() {
        let mut page = binary_page(2400, 2000);
        text_block(&mut page, 100, 150, 420, 1700);
        text_block(&mut page, 700, 150, 800, 1700);
        text_block(&mut page, 1700, 150, 550, 1700);

        let found = detect(page).unwrap();
        assert_eq!(found.x, 700);
        assert_eq!(found.width, 800);
        assert_eq!((found.y, found.height), (0, 2000));
    }

    #[test]
    fn test_first_column_alone_is_not_second() {
        let mut page = binary_page(2400, 2000);
        text_block(&mut page, 300, 150, 900, 1700);
        assert!(detect(page).is_none());
    }

    #[test]
    fn test_blank_page() {
        assert!(detect(binary_page(2400, 2000)).is_none());
    }

    #[test]
    fn test_narrow_page() {
        let mut page = binary_page(600, 2000);
        fill_rect(&mut page, 0, 0, 200, 2000);
        assert!(detect(page).is_none());
    }

    #[test]
    fn test_solid_columns_pick_widest_dense_window() {
        let mut page = binary_page(2400, 2000);
        fill_rect(&mut page, 150, 100, 900, 1800);
        fill_rect(&mut page, 1250, 100, 900, 1800);

        let found = detect(page).unwrap();
        assert_eq!(found.x, 1250);
        assert_eq!(found.width, 900);
    }
}
