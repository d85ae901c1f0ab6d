//! Hough-line column detector
//!
//! Ruled column borders (or the straight edges of dense text columns) survive
//! a long vertical opening. Their left and right edge pixels vote in a Hough
//! accumulator restricted to near-vertical angles; strong lines are clustered
//! into boundaries and consecutive boundaries bound a column.

use image::GrayImage;
use tracing::debug;

use super::contour::select_second_column;
use super::ColumnDetector;
use crate::geometry::{ColumnBox, DetectionMethod};
use crate::morphology::{open_vertical, BACKGROUND, FOREGROUND};
use crate::options::ExtractionOptions;
use crate::preprocess::PreparedPage;

/// Accumulator angle step (degrees)
const ANGLE_RESOLUTION: f64 = 0.5;

/// Lines closer than this in rho are treated as one peak
const SUPPRESSION_RADIUS: f64 = 8.0;

/// Secondary detector: near-vertical line segments
#[derive(Debug, Clone, Copy, Default)]
pub struct HoughDetector;

impl ColumnDetector for HoughDetector {
    fn method(&self) -> DetectionMethod {
        DetectionMethod::Hough
    }

    fn detect(&self, page: &PreparedPage, options: &ExtractionOptions) -> Option<ColumnBox> {
        let segments = detect_vertical_segments(page.binary(), options);
        let boundaries = cluster_boundaries(&segments, options.hough_cluster_distance);
        let intervals = column_intervals(&boundaries, options);
        debug!(
            segments = segments.len(),
            boundaries = boundaries.len(),
            intervals = intervals.len(),
            "hough boundaries"
        );
        select_second_column(&intervals, page.width(), options)
    }
}

/// A near-vertical line segment found on the page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VerticalSegment {
    /// Mean x position along the segment
    pub x: f64,
    pub top: u32,
    /// Exclusive
    pub bottom: u32,
}

impl VerticalSegment {
    pub fn length(&self) -> u32 {
        self.bottom - self.top
    }
}

/// Near-vertical segments at least `hough_min_line_ratio` of the page tall
pub fn detect_vertical_segments(
    binary: &GrayImage,
    options: &ExtractionOptions,
) -> Vec<VerticalSegment> {
    let (width, height) = binary.dimensions();
    if width == 0 || height == 0 {
        return Vec::new();
    }

    let vertical = open_vertical(binary, options.hough_vertical_kernel);
    let edges = vertical_edges(&vertical);
    let min_length = ((height as f32 * options.hough_min_line_ratio) as u32).max(1);

    let mut segments = Vec::new();
    for (theta, rho) in hough_peaks(&edges, options.hough_max_tilt_degrees as f64, min_length) {
        if let Some(segment) = trace_segment(&edges, theta, rho, options.hough_max_line_gap) {
            if segment.length() >= min_length {
                segments.push(segment);
            }
        }
    }
    segments
}

/// Left and right boundary pixels of vertical runs
///
/// A foreground pixel is an edge when its left or right neighbor is
/// background (or outside the image).
fn vertical_edges(vertical: &GrayImage) -> GrayImage {
    let (width, height) = vertical.dimensions();
    let mut edges = GrayImage::new(width, height);
    let src = vertical.as_raw();
    let w = width as usize;

    for y in 0..height as usize {
        let row = &src[y * w..(y + 1) * w];
        for x in 0..w {
            if row[x] == BACKGROUND {
                continue;
            }
            let left_open = x == 0 || row[x - 1] == BACKGROUND;
            let right_open = x + 1 == w || row[x + 1] == BACKGROUND;
            if left_open || right_open {
                edges.put_pixel(x as u32, y as u32, image::Luma([FOREGROUND]));
            }
        }
    }
    edges
}

/// Accumulator peaks `(theta_degrees, rho)` with at least `min_votes`
///
/// `theta` is the deviation from vertical; a line is the set of points with
/// `x * cos(theta) + y * sin(theta) = rho`.
fn hough_peaks(edges: &GrayImage, max_tilt: f64, min_votes: u32) -> Vec<(f64, f64)> {
    let (width, height) = edges.dimensions();
    let diagonal = ((width as f64).powi(2) + (height as f64).powi(2)).sqrt();
    let rho_max = diagonal.ceil() as i64;
    let rho_steps = (2 * rho_max + 1) as usize;

    let angle_steps = (2.0 * max_tilt / ANGLE_RESOLUTION).round() as usize + 1;
    let thetas: Vec<f64> = (0..angle_steps)
        .map(|i| -max_tilt + i as f64 * ANGLE_RESOLUTION)
        .collect();
    let trig: Vec<(f64, f64)> = thetas
        .iter()
        .map(|t| (t.to_radians().cos(), t.to_radians().sin()))
        .collect();

    let mut accumulator = vec![0u32; angle_steps * rho_steps];
    for (x, y, px) in edges.enumerate_pixels() {
        if px.0[0] == BACKGROUND {
            continue;
        }
        for (t, &(cos_t, sin_t)) in trig.iter().enumerate() {
            let rho = (x as f64 * cos_t + y as f64 * sin_t).round() as i64;
            let idx = (rho + rho_max) as usize;
            if idx < rho_steps {
                accumulator[t * rho_steps + idx] += 1;
            }
        }
    }

    let mut peaks: Vec<(u32, f64, f64)> = accumulator
        .iter()
        .enumerate()
        .filter(|&(_, &votes)| votes >= min_votes)
        .map(|(i, &votes)| {
            let theta = thetas[i / rho_steps];
            let rho = (i % rho_steps) as f64 - rho_max as f64;
            (votes, theta, rho)
        })
        .collect();
    peaks.sort_by(|a, b| b.0.cmp(&a.0));

    // Keep the strongest line in each rho neighborhood
    let mut kept: Vec<(f64, f64)> = Vec::new();
    for (_, theta, rho) in peaks {
        if kept
            .iter()
            .all(|&(_, r)| (r - rho).abs() > SUPPRESSION_RADIUS)
        {
            kept.push((theta, rho));
        }
    }
    kept
}

/// Longest run of edge pixels along a line, bridging gaps up to `max_gap`
fn trace_segment(edges: &GrayImage, theta: f64, rho: f64, max_gap: u32) -> Option<VerticalSegment> {
    let (width, height) = edges.dimensions();
    let (sin_t, cos_t) = theta.to_radians().sin_cos();

    let hit = |y: u32| -> Option<u32> {
        let x = ((rho - y as f64 * sin_t) / cos_t).round();
        if x < 0.0 || x >= width as f64 {
            return None;
        }
        let x = x as u32;
        let lo = x.saturating_sub(1);
        let hi = (x + 1).min(width - 1);
        (lo..=hi).find(|&xx| edges.get_pixel(xx, y).0[0] != BACKGROUND)
    };

    // Runs are (top, last, x_sum, hits)
    let mut best: Option<(u32, u32, f64)> = None;
    let mut current: Option<(u32, u32, f64, u32)> = None;

    for y in 0..height {
        match (hit(y), current) {
            (Some(x), Some((top, last, x_sum, hits))) if y - last <= max_gap + 1 => {
                current = Some((top, y, x_sum + x as f64, hits + 1));
            }
            (Some(x), run) => {
                best = longer_run(best, run);
                current = Some((y, y, x as f64, 1));
            }
            (None, _) => {}
        }
    }
    best = longer_run(best, current);

    best.map(|(top, last, x)| VerticalSegment {
        x,
        top,
        bottom: last + 1,
    })
}

fn longer_run(
    best: Option<(u32, u32, f64)>,
    run: Option<(u32, u32, f64, u32)>,
) -> Option<(u32, u32, f64)> {
    let Some((top, last, x_sum, hits)) = run else {
        return best;
    };
    match best {
        Some((t, l, _)) if l - t >= last - top => best,
        _ => Some((top, last, x_sum / hits as f64)),
    }
}

/// Segments clustered by x; each cluster is one column boundary
pub fn cluster_boundaries(segments: &[VerticalSegment], distance: u32) -> Vec<VerticalSegment> {
    let mut sorted = segments.to_vec();
    sorted.sort_by(|a, b| a.x.total_cmp(&b.x));

    let mut clusters: Vec<(Vec<f64>, u32, u32)> = Vec::new();
    for s in sorted {
        let joins = clusters.last().is_some_and(|(xs, _, _)| {
            xs.last()
                .is_some_and(|&last| s.x - last <= distance as f64)
        });
        match clusters.last_mut() {
            Some((xs, top, bottom)) if joins => {
                xs.push(s.x);
                *top = (*top).min(s.top);
                *bottom = (*bottom).max(s.bottom);
            }
            _ => clusters.push((vec![s.x], s.top, s.bottom)),
        }
    }

    clusters
        .into_iter()
        .map(|(xs, top, bottom)| VerticalSegment {
            x: xs.iter().sum::<f64>() / xs.len() as f64,
            top,
            bottom,
        })
        .collect()
}

/// Boxes between consecutive boundaries at least `min_candidate_width` wide
pub fn column_intervals(boundaries: &[VerticalSegment], options: &ExtractionOptions) -> Vec<ColumnBox> {
    boundaries
        .windows(2)
        .filter_map(|pair| {
            let left = pair[0].x.round() as u32;
            let right = pair[1].x.round() as u32;
            let top = pair[0].top.min(pair[1].top);
            let bottom = pair[0].bottom.max(pair[1].bottom);
            ColumnBox::from_edges(left, top, right, bottom)
        })
        .filter(|b| b.width >= options.min_candidate_width)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{binary_page, fill_rect, text_block, vertical_line};

    fn ruled_page() -> GrayImage {
        let mut page = binary_page(2400, 2000);
        for x in [100, 700, 1500, 2200] {
            vertical_line(&mut page, x, 100, 1900, 3);
        }
        page
    }

    #[test]
    fn test_vertical_edges_mark_run_borders() {
        let mut img = binary_page(10, 3);
        fill_rect(&mut img, 3, 0, 4, 3);
        let edges = vertical_edges(&img);

        assert_eq!(edges.get_pixel(3, 1).0[0], FOREGROUND);
        assert_eq!(edges.get_pixel(6, 1).0[0], FOREGROUND);
        assert_eq!(edges.get_pixel(4, 1).0[0], BACKGROUND);
        assert_eq!(edges.get_pixel(1, 1).0[0], BACKGROUND);
    }

    #[test]
    fn test_detects_ruled_lines() {
        let segments = detect_vertical_segments(&ruled_page(), &ExtractionOptions::default());
        let boundaries = cluster_boundaries(&segments, 40);

        assert_eq!(boundaries.len(), 4);
        for (b, expected) in boundaries.iter().zip([100.0, 700.0, 1500.0, 2200.0]) {
            assert!((b.x - expected).abs() <= 3.0, "boundary at {}", b.x);
            assert!(b.length() >= 1790);
        }
    }

    #[test]
    fn test_detector_picks_second_interval() {
        let page = PreparedPage::from_binary(ruled_page());
        let found = HoughDetector
            .detect(&page, &ExtractionOptions::default())
            .unwrap();

        assert!((698..=704).contains(&found.x), "x = {}", found.x);
        assert!((1498..=1504).contains(&found.right()), "right = {}", found.right());
        assert!(found.height >= 1790);
    }

    #[test]
    fn test_short_lines_ignored() {
        let mut page = binary_page(2400, 2000);
        for x in [100, 700, 1500] {
            vertical_line(&mut page, x, 100, 400, 3);
        }
        let segments = detect_vertical_segments(&page, &ExtractionOptions::default());
        assert!(segments.is_empty());
    }

    #[test]
    fn test_gap_is_bridged() {
        let mut page = binary_page(400, 2000);
        vertical_line(&mut page, 200, 100, 1000, 2);
        vertical_line(&mut page, 200, 1015, 1900, 2);
        let segments = detect_vertical_segments(&page, &ExtractionOptions::default());

        let longest = segments.iter().map(|s| s.length()).max().unwrap();
        assert!(longest >= 1790);
    }

    #[test]
    fn test_text_lines_are_not_vertical_lines() {
        let mut page = binary_page(1200, 2000);
        text_block(&mut page, 100, 100, 900, 1800);
        assert!(detect_vertical_segments(&page, &ExtractionOptions::default()).is_empty());
    }

    #[test]
    fn test_cluster_merges_close_segments() {
        let seg = |x: f64, top: u32, bottom: u32| VerticalSegment { x, top, bottom };
        let clusters = cluster_boundaries(
            &[seg(500.0, 0, 900), seg(100.0, 10, 1000), seg(520.0, 50, 1200)],
            40,
        );

        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].x, 100.0);
        assert_eq!(clusters[1].x, 510.0);
        assert_eq!((clusters[1].top, clusters[1].bottom), (0, 1200));
    }

    #[test]
    fn test_narrow_intervals_dropped() {
        let seg = |x: f64| VerticalSegment {
            x,
            top: 0,
            bottom: 1800,
        };
        let intervals = column_intervals(
            &[seg(150.0), seg(1049.0), seg(1250.0), seg(2149.0)],
            &ExtractionOptions::default(),
        );

        assert_eq!(intervals.len(), 2);
        assert_eq!(intervals[0].x, 150);
        assert_eq!(intervals[1].x, 1250);
    }
}
