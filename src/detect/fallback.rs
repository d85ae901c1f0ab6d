//! Static fallback coordinates
//!
//! When no detector produces a usable box, the second column is assumed to
//! start at 28% of the page width and to span 40% of it (700-1100 px).

use super::ColumnDetector;
use crate::geometry::{ColumnBox, DetectionMethod};
use crate::options::ExtractionOptions;
use crate::preprocess::PreparedPage;

/// Last-resort detector that always proposes a box on non-empty pages
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackDetector;

impl ColumnDetector for FallbackDetector {
    fn method(&self) -> DetectionMethod {
        DetectionMethod::Fallback
    }

    fn detect(&self, page: &PreparedPage, options: &ExtractionOptions) -> Option<ColumnBox> {
        fallback_box(page.width(), page.height(), options)
    }
}

/// Fixed page-geometry estimate, clipped to the image
pub fn fallback_box(width: u32, height: u32, options: &ExtractionOptions) -> Option<ColumnBox> {
    let x = (width as f32 * options.fallback_x_ratio) as u32;
    let (min_w, max_w) = options.fallback_width_range;
    let w = ((width as f32 * options.fallback_width_ratio) as u32).clamp(min_w, max_w);

    ColumnBox::new(x, 0, w, height).clamped_to(width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typical_page() {
        let b = fallback_box(2400, 2000, &ExtractionOptions::default()).unwrap();
        assert_eq!(b, ColumnBox::new(672, 0, 960, 2000));
        assert!(b.center_x() < 1200.0);
    }

    #[test]
    fn test_width_clamped() {
        let opts = ExtractionOptions::default();
        assert_eq!(fallback_box(1500, 2000, &opts).unwrap().width, 700);
        assert_eq!(fallback_box(3000, 2000, &opts).unwrap().width, 1100);
    }

    #[test]
    fn test_clipped_on_narrow_page() {
        let b = fallback_box(1000, 800, &ExtractionOptions::default()).unwrap();
        assert_eq!(b.x, 280);
        assert_eq!(b.right(), 1000);
        assert_eq!(b.height, 800);
    }

    #[test]
    fn test_empty_page() {
        assert!(fallback_box(0, 0, &ExtractionOptions::default()).is_none());
    }
}
