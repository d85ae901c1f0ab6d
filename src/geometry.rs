//! Column geometry module
//!
//! Value types shared by every stage of the extraction pipeline: the column
//! rectangle, the detection method tag and the detection result.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Axis-aligned column rectangle in pixel coordinates (origin top-left)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Optional header region sitting above the main column
pub type TitleRegion = ColumnBox;

impl ColumnBox {
    /// Create a new box
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build a box from inclusive-exclusive edges, `None` when empty
    pub fn from_edges(left: u32, top: u32, right: u32, bottom: u32) -> Option<Self> {
        if right <= left || bottom <= top {
            return None;
        }
        Some(Self::new(left, top, right - left, bottom - top))
    }

    /// Exclusive right edge
    #[inline]
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge
    #[inline]
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    /// Horizontal center
    #[inline]
    pub fn center_x(&self) -> f64 {
        self.x as f64 + self.width as f64 / 2.0
    }

    /// Whether the box is non-empty and lies inside a `width` x `height` image
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.width > 0 && self.height > 0 && self.right() <= width && self.bottom() <= height
    }

    /// Clip the box to the image, `None` when nothing is left
    pub fn clamped_to(&self, width: u32, height: u32) -> Option<Self> {
        let right = self.right().min(width);
        let bottom = self.bottom().min(height);
        Self::from_edges(self.x.min(width), self.y.min(height), right, bottom)
    }

    /// Same vertical extent, new horizontal range `[left, right)`
    pub fn with_x_range(&self, left: u32, right: u32) -> Self {
        Self::new(left, self.y, right.saturating_sub(left), self.height)
    }

    /// Same horizontal extent, new vertical range `[top, bottom)`
    pub fn with_y_range(&self, top: u32, bottom: u32) -> Self {
        Self::new(self.x, top, self.width, bottom.saturating_sub(top))
    }
}

impl fmt::Display for ColumnBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "x={} y={} w={} h={}",
            self.x, self.y, self.width, self.height
        )
    }
}

/// Strategy that produced a column box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionMethod {
    /// Morphological blobs + external contours
    Contour,
    /// Near-vertical ruled lines
    Hough,
    /// Vertical projection density window
    Projection,
    /// Static page-geometry estimate
    Fallback,
}

impl DetectionMethod {
    /// Stable lowercase name
    pub fn as_str(self) -> &'static str {
        match self {
            DetectionMethod::Contour => "contour",
            DetectionMethod::Hough => "hough",
            DetectionMethod::Projection => "projection",
            DetectionMethod::Fallback => "fallback",
        }
    }
}

impl fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A box accepted by the validator together with the method that found it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub bounds: ColumnBox,
    pub method: DetectionMethod,
}

impl DetectionResult {
    pub fn new(bounds: ColumnBox, method: DetectionMethod) -> Self {
        Self { bounds, method }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edges() {
        let b = ColumnBox::new(100, 20, 900, 1500);
        assert_eq!(b.right(), 1000);
        assert_eq!(b.bottom(), 1520);
        assert_eq!(b.center_x(), 550.0);
    }

    #[test]
    fn test_from_edges_rejects_empty() {
        assert!(ColumnBox::from_edges(10, 0, 10, 5).is_none());
        assert!(ColumnBox::from_edges(10, 5, 20, 5).is_none());
        assert_eq!(
            ColumnBox::from_edges(10, 0, 30, 5),
            Some(ColumnBox::new(10, 0, 20, 5))
        );
    }

    #[test]
    fn test_fits_within() {
        let b = ColumnBox::new(100, 0, 900, 2000);
        assert!(b.fits_within(1000, 2000));
        assert!(!b.fits_within(999, 2000));
        assert!(!b.fits_within(1000, 1999));
        assert!(!ColumnBox::new(0, 0, 0, 10).fits_within(100, 100));
    }

    #[test]
    fn test_clamped_to() {
        let b = ColumnBox::new(900, 0, 400, 3000);
        assert_eq!(b.clamped_to(1200, 2000), Some(ColumnBox::new(900, 0, 300, 2000)));
        assert_eq!(ColumnBox::new(1300, 0, 100, 10).clamped_to(1200, 2000), None);
    }

    #[test]
    fn test_with_ranges() {
        let b = ColumnBox::new(100, 50, 900, 1500);
        assert_eq!(b.with_x_range(300, 1100), ColumnBox::new(300, 50, 800, 1500));
        assert_eq!(b.with_y_range(0, 1800), ColumnBox::new(100, 0, 900, 1800));
    }

    #[test]
    fn test_method_names() {
        assert_eq!(DetectionMethod::Contour.to_string(), "contour");
        assert_eq!(DetectionMethod::Fallback.as_str(), "fallback");
        let json = serde_json::to_string(&DetectionMethod::Projection).unwrap();
        assert_eq!(json, "\"projection\"");
    }
}
