//! Page preprocessing module
//!
//! Converts a scanned page into the binary text map shared by every detector:
//! luma conversion, a small binomial smoothing blur and a Gaussian-weighted
//! adaptive threshold (text becomes 255, paper 0).

use image::{DynamicImage, GrayImage};
use imageproc::filter::{gaussian_blur_f32, separable_filter_equal};
use std::cell::OnceCell;
use thiserror::Error;

use crate::detect::contour;
use crate::geometry::ColumnBox;
use crate::morphology::{ColumnProfile, BACKGROUND, FOREGROUND};
use crate::options::ExtractionOptions;

/// Preprocessing error types
#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("Invalid image: {0}")]
    InvalidImage(String),
}

pub type Result<T> = std::result::Result<T, PreprocessError>;

/// Binary page plus lazily computed analyses shared between stages
#[derive(Debug)]
pub struct PreparedPage {
    binary: GrayImage,
    profile: OnceCell<ColumnProfile>,
    candidates: OnceCell<Vec<ColumnBox>>,
}

impl PreparedPage {
    /// Wrap an already binarized page (foreground > 0)
    pub fn from_binary(binary: GrayImage) -> Self {
        Self {
            binary,
            profile: OnceCell::new(),
            candidates: OnceCell::new(),
        }
    }

    /// Binary text map
    pub fn binary(&self) -> &GrayImage {
        &self.binary
    }

    pub fn width(&self) -> u32 {
        self.binary.width()
    }

    pub fn height(&self) -> u32 {
        self.binary.height()
    }

    /// Vertical projection of the binary map
    pub fn profile(&self) -> &ColumnProfile {
        self.profile
            .get_or_init(|| ColumnProfile::from_binary(&self.binary))
    }

    /// Column blobs sorted left to right
    ///
    /// Computed once and reused by the contour detector and the refiner.
    pub fn column_candidates(&self, options: &ExtractionOptions) -> &[ColumnBox] {
        self.candidates
            .get_or_init(|| contour::find_column_candidates(&self.binary, options))
    }
}

/// Preprocess a decoded page image
pub fn preprocess(image: &DynamicImage, options: &ExtractionOptions) -> Result<PreparedPage> {
    preprocess_gray(&image.to_luma8(), options)
}

/// Preprocess an already grayscale page
pub fn preprocess_gray(gray: &GrayImage, options: &ExtractionOptions) -> Result<PreparedPage> {
    if gray.width() == 0 || gray.height() == 0 {
        return Err(PreprocessError::InvalidImage(format!(
            "empty raster ({}x{})",
            gray.width(),
            gray.height()
        )));
    }

    let smoothed = binomial_blur(gray, options.blur_kernel);
    let binary = adaptive_threshold_gaussian(
        &smoothed,
        options.adaptive_block_size,
        options.adaptive_offset,
    );

    Ok(PreparedPage::from_binary(binary))
}

/// Binomial row `size - 1` normalized to sum to one (a discrete Gaussian)
///
/// The weights are dyadic fractions, so a flat region stays exactly flat.
fn binomial_kernel(size: u32) -> Vec<f32> {
    let mut row = vec![1u32];
    for _ in 1..size.max(1) {
        let mut next = vec![1u32; row.len() + 1];
        for i in 1..row.len() {
            next[i] = row[i - 1] + row[i];
        }
        row = next;
    }
    let total: u32 = row.iter().sum();
    row.into_iter().map(|c| c as f32 / total as f32).collect()
}

/// Separable binomial blur with replicated borders
///
/// A 5-tap kernel (1 4 6 4 1) approximates a Gaussian with sigma ~1.1.
pub fn binomial_blur(gray: &GrayImage, size: u32) -> GrayImage {
    if size <= 1 || gray.width() == 0 || gray.height() == 0 {
        return gray.clone();
    }
    separable_filter_equal(gray, &binomial_kernel(size))
}

/// Gaussian sigma matching a kernel of `block_size` taps
pub fn gaussian_sigma_for_block(block_size: u32) -> f32 {
    0.3 * ((block_size.max(3) as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Gaussian-weighted adaptive threshold, inverted
///
/// A pixel is foreground when it is at least `offset` darker than the
/// Gaussian-weighted mean of its `block_size` neighborhood.
pub fn adaptive_threshold_gaussian(gray: &GrayImage, block_size: u32, offset: f32) -> GrayImage {
    let (width, height) = gray.dimensions();
    let local_mean = gaussian_blur_f32(gray, gaussian_sigma_for_block(block_size));

    let mut binary = GrayImage::new(width, height);
    for ((out, src), mean) in binary
        .pixels_mut()
        .zip(gray.pixels())
        .zip(local_mean.pixels())
    {
        let threshold = mean.0[0] as f32 - offset;
        out.0[0] = if (src.0[0] as f32) <= threshold {
            FOREGROUND
        } else {
            BACKGROUND
        };
    }
    binary
}
