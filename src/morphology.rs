//! Binary morphology and density helpers
//!
//! Line-shaped structuring elements go through imageproc's mask-based
//! grayscale operators, which on a 0/255 map act as binary dilation and
//! erosion. Binary images use 255 for foreground (text) and 0 for background.

use image::{GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::morphology::{close, grayscale_dilate, grayscale_open, Mask};

/// Foreground pixel value
pub const FOREGROUND: u8 = 255;

/// Background pixel value
pub const BACKGROUND: u8 = 0;

/// Longest mask side imageproc accepts
const MAX_MASK_LENGTH: u32 = 511;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Horizontal,
    Vertical,
}

/// Straight line mask of `length` pixels along `axis`
///
/// The window for position `i` covers `[i - (k-1)/2, i + k/2]`. Pixels
/// outside the image never take part, so erosion does not eat into the border.
fn line_mask(length: u32, axis: Axis) -> Mask {
    let length = length.clamp(1, MAX_MASK_LENGTH);
    let center = ((length - 1) / 2) as u8;
    let (shape, cx, cy) = match axis {
        Axis::Horizontal => (GrayImage::from_pixel(length, 1, Luma([FOREGROUND])), center, 0),
        Axis::Vertical => (GrayImage::from_pixel(1, length, Luma([FOREGROUND])), 0, center),
    };
    Mask::from_image(&shape, cx, cy)
}

/// Dilate with a `length` x 1 horizontal kernel
pub fn dilate_horizontal(binary: &GrayImage, length: u32) -> GrayImage {
    if length <= 1 {
        return binary.clone();
    }
    grayscale_dilate(binary, &line_mask(length, Axis::Horizontal))
}

/// Dilate with a 1 x `length` vertical kernel
pub fn dilate_vertical(binary: &GrayImage, length: u32) -> GrayImage {
    if length <= 1 {
        return binary.clone();
    }
    grayscale_dilate(binary, &line_mask(length, Axis::Vertical))
}

/// Morphological closing with a `size` x `size` square
///
/// Fills gaps smaller than the kernel while preserving blob outlines. Even
/// sizes round down to the next odd square.
pub fn close_square(binary: &GrayImage, size: u32) -> GrayImage {
    let radius = (size / 2).min(u8::MAX as u32) as u8;
    if radius == 0 {
        return binary.clone();
    }
    close(binary, Norm::LInf, radius)
}

/// Morphological opening with a vertical kernel
///
/// Keeps only vertical runs at least `length` pixels long.
pub fn open_vertical(binary: &GrayImage, length: u32) -> GrayImage {
    if length <= 1 {
        return binary.clone();
    }
    grayscale_open(binary, &line_mask(length, Axis::Vertical))
}

/// Per-column foreground counts with prefix sums for O(1) strip queries
#[derive(Debug, Clone)]
pub struct ColumnProfile {
    counts: Vec<u32>,
    prefix: Vec<u64>,
    height: u32,
}

impl ColumnProfile {
    /// Vertical projection of a binary image
    pub fn from_binary(binary: &GrayImage) -> Self {
        let (width, height) = binary.dimensions();
        let mut counts = vec![0u32; width as usize];
        for row in binary.as_raw().chunks_exact(width.max(1) as usize) {
            for (count, &px) in counts.iter_mut().zip(row) {
                if px > 0 {
                    *count += 1;
                }
            }
        }

        let mut prefix = Vec::with_capacity(counts.len() + 1);
        prefix.push(0u64);
        let mut acc = 0u64;
        for &c in &counts {
            acc += c as u64;
            prefix.push(acc);
        }

        Self {
            counts,
            prefix,
            height,
        }
    }

    /// Number of columns
    pub fn width(&self) -> u32 {
        self.counts.len() as u32
    }

    /// Height of the projected image
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Foreground count of a single column
    pub fn count(&self, x: u32) -> u32 {
        self.counts.get(x as usize).copied().unwrap_or(0)
    }

    /// Total foreground pixels in columns `[x0, x1)`
    pub fn sum(&self, x0: u32, x1: u32) -> u64 {
        let x1 = (x1 as usize).min(self.counts.len());
        let x0 = (x0 as usize).min(x1);
        self.prefix[x1] - self.prefix[x0]
    }

    /// Foreground fraction of the full-height strip `[x0, x1)`
    pub fn strip_density(&self, x0: u32, x1: u32) -> f32 {
        let x1 = x1.min(self.width());
        if x1 <= x0 || self.height == 0 {
            return 0.0;
        }
        let area = (x1 - x0) as u64 * self.height as u64;
        self.sum(x0, x1) as f32 / area as f32
    }
}

/// Foreground fraction of row `y` restricted to `[x0, x1)`
pub fn row_density(binary: &GrayImage, y: u32, x0: u32, x1: u32) -> f32 {
    let (width, height) = binary.dimensions();
    let x1 = x1.min(width);
    if y >= height || x1 <= x0 {
        return 0.0;
    }
    let start = (y * width + x0) as usize;
    let end = (y * width + x1) as usize;
    let fg = binary.as_raw()[start..end].iter().filter(|&&p| p > 0).count();
    fg as f32 / (x1 - x0) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn image_with(width: u32, height: u32, on: &[(u32, u32)]) -> GrayImage {
        let mut img = GrayImage::new(width, height);
        for &(x, y) in on {
            img.put_pixel(x, y, Luma([FOREGROUND]));
        }
        img
    }

    #[test]
    fn test_horizontal_dilation_connects_nearby_pixels() {
        let img = image_with(100, 1, &[(40, 0), (48, 0)]);
        let out = dilate_horizontal(&img, 9);

        // 9-wide window reaches 4 pixels on each side
        for x in 36..=52 {
            assert_eq!(out.get_pixel(x, 0).0[0], FOREGROUND, "pixel {x}");
        }
        assert_eq!(out.get_pixel(35, 0).0[0], BACKGROUND);
        assert_eq!(out.get_pixel(53, 0).0[0], BACKGROUND);
    }

    #[test]
    fn test_vertical_dilation_small_kernel() {
        let img = image_with(5, 5, &[(2, 2)]);
        let out = dilate_vertical(&img, 3);

        assert_eq!(out.get_pixel(2, 1).0[0], FOREGROUND);
        assert_eq!(out.get_pixel(2, 3).0[0], FOREGROUND);
        assert_eq!(out.get_pixel(2, 0).0[0], BACKGROUND);
        assert_eq!(out.get_pixel(1, 2).0[0], BACKGROUND);
    }

    #[test]
    fn test_opening_keeps_runs_touching_border() {
        let mut img = GrayImage::new(20, 100);
        for y in 0..40 {
            img.put_pixel(3, y, Luma([FOREGROUND]));
        }
        for y in 50..70 {
            img.put_pixel(12, y, Luma([FOREGROUND]));
        }
        let out = open_vertical(&img, 31);

        // Rows above the image never erode the run
        assert!((0..40).all(|y| out.get_pixel(3, y).0[0] == FOREGROUND));
        assert_eq!(out.get_pixel(3, 40).0[0], BACKGROUND);
        assert!((50..70).all(|y| out.get_pixel(12, y).0[0] == BACKGROUND));
    }

    #[test]
    fn test_oversized_kernel_is_capped() {
        let img = image_with(1200, 1, &[(600, 0)]);
        let out = dilate_horizontal(&img, 2000);

        assert_eq!(out.get_pixel(600 - 255, 0).0[0], FOREGROUND);
        assert_eq!(out.get_pixel(600 + 255, 0).0[0], FOREGROUND);
        assert_eq!(out.get_pixel(600 - 256, 0).0[0], BACKGROUND);
        assert_eq!(out.get_pixel(600 + 256, 0).0[0], BACKGROUND);
    }

    #[test]
    fn test_closing_fills_small_gap() {
        let mut img = GrayImage::new(30, 5);
        for x in (5..12).chain(15..25) {
            for y in 0..5 {
                img.put_pixel(x, y, Luma([FOREGROUND]));
            }
        }
        let out = close_square(&img, 5);
        for x in 12..15 {
            assert_eq!(out.get_pixel(x, 2).0[0], FOREGROUND, "gap pixel {x}");
        }
        assert_eq!(out.get_pixel(0, 2).0[0], BACKGROUND);
        assert_eq!(out.get_pixel(27, 2).0[0], BACKGROUND);
    }

    #[test]
    fn test_vertical_opening_removes_short_strokes() {
        let mut img = GrayImage::new(20, 100);
        for y in 0..100 {
            img.put_pixel(5, y, Luma([FOREGROUND]));
        }
        for y in 10..20 {
            img.put_pixel(12, y, Luma([FOREGROUND]));
        }
        let out = open_vertical(&img, 30);

        assert!((0..100).all(|y| out.get_pixel(5, y).0[0] == FOREGROUND));
        assert!((0..100).all(|y| out.get_pixel(12, y).0[0] == BACKGROUND));
    }

    #[test]
    fn test_column_profile() {
        let mut img = GrayImage::new(10, 4);
        for y in 0..4 {
            img.put_pixel(3, y, Luma([FOREGROUND]));
        }
        img.put_pixel(4, 0, Luma([FOREGROUND]));

        let profile = ColumnProfile::from_binary(&img);
        assert_eq!(profile.width(), 10);
        assert_eq!(profile.count(3), 4);
        assert_eq!(profile.sum(0, 10), 5);
        assert_eq!(profile.sum(4, 10), 1);
        assert!((profile.strip_density(3, 5) - 5.0 / 8.0).abs() < 1e-6);
        assert_eq!(profile.strip_density(8, 8), 0.0);
        assert_eq!(profile.strip_density(8, 50), 0.0);
    }

    #[test]
    fn test_row_density() {
        let img = image_with(10, 2, &[(1, 1), (2, 1)]);
        assert_eq!(row_density(&img, 1, 0, 10), 0.2);
        assert_eq!(row_density(&img, 1, 1, 3), 1.0);
        assert_eq!(row_density(&img, 0, 0, 10), 0.0);
        assert_eq!(row_density(&img, 5, 0, 10), 0.0);
    }
}
