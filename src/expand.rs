//! Vertical and width expansion
//!
//! Stretches an accepted column box to the top of the page and to a minimum
//! height, and splits regions that are really two merged columns.

use tracing::debug;

use crate::geometry::ColumnBox;
use crate::morphology::ColumnProfile;
use crate::options::ExtractionOptions;

/// Expanded box plus the split point used, if any
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpandedBox {
    pub bounds: ColumnBox,
    pub split_at: Option<u32>,
}

/// Expand `bounds` on a page described by `profile`
///
/// The result always starts at `y = 0` and covers at least
/// `min_height_ratio` of the page (clipped to the page). A title region only
/// exists above the column, so starting at the page top already includes it.
pub fn expand(
    bounds: &ColumnBox,
    profile: &ColumnProfile,
    options: &ExtractionOptions,
) -> ExpandedBox {
    let (width, height) = (profile.width(), profile.height());

    let (horizontal, split_at) = if needs_split(bounds, options) {
        split_wide_region(bounds, profile, options)
    } else {
        (*bounds, None)
    };

    let bottom = bounds
        .bottom()
        .max(options.min_crop_height(height))
        .min(height);

    let mut expanded = horizontal.with_y_range(0, bottom);
    if let Some(clipped) = expanded.clamped_to(width, height) {
        expanded = clipped;
    }

    debug!(%expanded, ?split_at, "expanded");
    ExpandedBox {
        bounds: expanded,
        split_at,
    }
}

fn needs_split(bounds: &ColumnBox, options: &ExtractionOptions) -> bool {
    bounds.width > options.split_width_threshold || bounds.x < options.split_left_threshold
}

/// Keep the right part of a region spanning two columns
///
/// The split point is the sparsest profile column in the search window
/// `split_offset_range` measured from `x`, or the window middle when
/// the profile is flat there. A right part narrower than `split_min_width`
/// grows to the right, never to the left.
pub fn split_wide_region(
    bounds: &ColumnBox,
    profile: &ColumnProfile,
    options: &ExtractionOptions,
) -> (ColumnBox, Option<u32>) {
    let (off_min, off_max) = options.split_offset_range;
    let lo = bounds.x + off_min;
    let hi = (bounds.x + off_max).min(bounds.right().saturating_sub(1));
    if lo > hi || bounds.right() <= lo {
        return (*bounds, None);
    }

    let split = valley_in(profile, lo, hi);
    let right = if bounds.right() - split < options.split_min_width {
        (split + options.split_min_width).min(profile.width().max(bounds.right()))
    } else {
        bounds.right()
    };

    debug!(from = %bounds, split, right, "split wide region");
    (bounds.with_x_range(split, right), Some(split))
}

/// Lowest-count column in `[lo, hi]`, the middle when the range is flat
fn valley_in(profile: &ColumnProfile, lo: u32, hi: u32) -> u32 {
    let counts = (lo..=hi).map(|x| (x, profile.count(x)));
    let (min_x, min_count) = counts
        .clone()
        .min_by_key(|&(_, c)| c)
        .unwrap_or((lo, 0));
    let max_count = counts.map(|(_, c)| c).max().unwrap_or(0);

    if min_count == max_count {
        lo + (hi - lo) / 2
    } else {
        min_x
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{binary_page, fill_rect};
    use crate::title::TitleDetector;

    fn profile_of(width: u32, height: u32, rects: &[(u32, u32, u32, u32)]) -> ColumnProfile {
        let mut page = binary_page(width, height);
        for &(x, y, w, h) in rects {
            fill_rect(&mut page, x, y, w, h);
        }
        ColumnProfile::from_binary(&page)
    }

    #[test]
    fn test_vertical_expansion() {
        let profile = profile_of(2400, 2000, &[]);
        let opts = ExtractionOptions::default();

        let short = expand(&ColumnBox::new(650, 200, 900, 1000), &profile, &opts);
        assert_eq!(short.bounds, ColumnBox::new(650, 0, 900, 1700));
        assert_eq!(short.split_at, None);

        let tall = expand(&ColumnBox::new(650, 100, 900, 1800), &profile, &opts);
        assert_eq!(tall.bounds, ColumnBox::new(650, 0, 900, 1900));
    }

    #[test]
    fn test_crop_contains_title_above_column() {
        let mut page = binary_page(2400, 2000);
        fill_rect(&mut page, 800, 100, 500, 48);
        fill_rect(&mut page, 700, 300, 800, 1600);
        let opts = ExtractionOptions::default();
        let main = ColumnBox::new(650, 300, 900, 1600);

        let title = TitleDetector::detect(&page, &main, &opts).unwrap();
        let out = expand(&main, &ColumnProfile::from_binary(&page), &opts);
        assert_eq!(out.bounds.y, 0);
        assert!(out.bounds.y <= title.y && title.bottom() <= out.bounds.bottom());
        assert_eq!(out.bounds.bottom(), 1900);
    }

    #[test]
    fn test_never_exceeds_page() {
        let profile = profile_of(2400, 1000, &[]);
        let out = expand(
            &ColumnBox::new(650, 0, 900, 1000),
            &profile,
            &ExtractionOptions::default(),
        );
        assert_eq!(out.bounds.height, 1000);
    }

    #[test]
    fn test_wide_blob_is_split_and_regrown() {
        let profile = profile_of(2400, 2000, &[(100, 0, 1000, 2000)]);
        let blob = ColumnBox::new(100, 0, 1000, 2000);

        let out = expand(&blob, &profile, &ExtractionOptions::default());
        // Flat profile: split in the middle of [500, 600]
        assert_eq!(out.split_at, Some(550));
        assert!(out.bounds.x > 100);
        assert!(out.bounds.width >= 800);
        assert_eq!(out.bounds, ColumnBox::new(550, 0, 800, 2000));
    }

    #[test]
    fn test_split_at_gutter() {
        // Two merged columns with a gutter at 560..580
        let profile = profile_of(2400, 2000, &[(100, 0, 460, 2000), (580, 0, 900, 2000)]);
        let merged = ColumnBox::new(100, 0, 1380, 2000);

        let (split, at) = split_wide_region(&merged, &profile, &ExtractionOptions::default());
        assert_eq!(at, Some(560));
        assert_eq!(split, ColumnBox::new(560, 0, 920, 2000));
    }

    #[test]
    fn test_split_growth_clipped_to_page() {
        let profile = profile_of(1200, 2000, &[]);
        let b = ColumnBox::new(100, 0, 1000, 2000);

        let (split, _) = split_wide_region(&b, &profile, &ExtractionOptions::default());
        assert_eq!(split.x, 550);
        assert_eq!(split.right(), 1200);
    }

    #[test]
    fn test_narrow_region_near_left_edge_without_window() {
        let profile = profile_of(2400, 2000, &[]);
        let b = ColumnBox::new(120, 0, 350, 2000);

        let (out, at) = split_wide_region(&b, &profile, &ExtractionOptions::default());
        assert_eq!(at, None);
        assert_eq!(out, b);
    }
}
