//! Title region detection
//!
//! Headers above the main column (chapter titles, running heads) are kept in
//! the crop. Only the band above the detected column is scanned, restricted
//! to the column's horizontal range.

use image::GrayImage;
use tracing::debug;

use crate::geometry::{ColumnBox, TitleRegion};
use crate::morphology::row_density;
use crate::options::ExtractionOptions;

/// Finds a header band above the main column
pub struct TitleDetector;

impl TitleDetector {
    /// First band of dense rows above `main` whose height is title-like
    pub fn detect(
        binary: &GrayImage,
        main: &ColumnBox,
        options: &ExtractionOptions,
    ) -> Option<TitleRegion> {
        let scan_end = options.title_scan_height.min(main.y).min(binary.height());
        let (min_h, max_h) = options.title_height_range;

        let title = dense_row_runs(binary, main, scan_end, options.title_density)
            .into_iter()
            .find(|&(_, len)| (min_h..=max_h).contains(&len))
            .map(|(start, len)| ColumnBox::new(main.x, start, main.width, len));

        if let Some(t) = &title {
            debug!(y = t.y, height = t.height, "title region");
        }
        title
    }
}

/// `(start, length)` runs of rows in `[0, scan_end)` denser than `threshold`
fn dense_row_runs(
    binary: &GrayImage,
    main: &ColumnBox,
    scan_end: u32,
    threshold: f32,
) -> Vec<(u32, u32)> {
    let mut runs = Vec::new();
    let mut start: Option<u32> = None;

    for y in 0..scan_end {
        let dense = row_density(binary, y, main.x, main.right()) > threshold;
        match (dense, start) {
            (true, None) => start = Some(y),
            (false, Some(s)) => {
                runs.push((s, y - s));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        runs.push((s, scan_end - s));
    }
    runs
}
