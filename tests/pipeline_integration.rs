//! End-to-end pipeline tests on synthetic manuscript pages

use hebrew_columns::{
    process_all_images, DetectionMethod, ExtractionOptions, HebrewTextExtractor, ImageOutcome,
    SilentProgress,
};
use image::{GrayImage, Luma};
use std::path::Path;
use tempfile::tempdir;

const PAPER: u8 = 230;
const INK: u8 = 30;

/// Paint text-like glyph rows into `[x, x + w) x [y, y + h)`
fn text_block(img: &mut GrayImage, x: u32, y: u32, w: u32, h: u32) {
    let mut line_y = y;
    while line_y < y + h {
        let mut glyph_x = x;
        while glyph_x < x + w {
            for yy in line_y..(line_y + 18).min(y + h) {
                for xx in glyph_x..(glyph_x + 14).min(x + w) {
                    img.put_pixel(xx, yy, Luma([INK]));
                }
            }
            glyph_x += 20;
        }
        line_y += 30;
    }
}

/// 2400x2000 scan with three text columns; the second spans x 700..1500
fn manuscript_page() -> GrayImage {
    let mut page = GrayImage::from_pixel(2400, 2000, Luma([PAPER]));
    text_block(&mut page, 100, 150, 420, 1700);
    text_block(&mut page, 700, 150, 800, 1700);
    text_block(&mut page, 1700, 150, 550, 1700);
    page
}

fn blank_page() -> GrayImage {
    GrayImage::from_pixel(600, 800, Luma([PAPER]))
}

fn write_page(dir: &Path, name: &str, page: &GrayImage) {
    page.save(dir.join(name)).unwrap();
}

#[test]
fn test_crop_covers_second_column() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    write_page(input.path(), "000002.png", &manuscript_page());

    let report = HebrewTextExtractor::new(input.path(), output.path())
        .run(&SilentProgress)
        .unwrap();

    assert_eq!(report.summary.processed, 1);
    let ImageOutcome::Cropped { bounds, .. } = &report.images[0].outcome else {
        panic!("expected a crop, got {:?}", report.images[0].outcome);
    };
    assert_eq!(bounds.y, 0);
    assert!(bounds.height >= 1700);
    assert!((600..=720).contains(&bounds.x), "x = {}", bounds.x);
    assert!(bounds.right() >= 1480, "right = {}", bounds.right());
    assert!(bounds.right() < 1700, "right = {}", bounds.right());

    let crop = image::open(output.path().join("000002.png")).unwrap();
    assert_eq!((crop.width(), crop.height()), (bounds.width, bounds.height));
    assert!(crop.width() >= ExtractionOptions::default().min_final_width);
}

#[test]
fn test_repeated_runs_are_identical() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    write_page(input.path(), "000002.png", &manuscript_page());
    let crop = output.path().join("000002.png");

    let first = HebrewTextExtractor::new(input.path(), output.path())
        .run(&SilentProgress)
        .unwrap();
    let before = std::fs::read(&crop).unwrap();

    let second = HebrewTextExtractor::new(input.path(), output.path())
        .run(&SilentProgress)
        .unwrap();
    let after = std::fs::read(&crop).unwrap();

    assert!(matches!(second.images[0].outcome, ImageOutcome::Cropped { .. }));
    assert_eq!(first.images, second.images);
    assert_eq!(before, after);
}

#[test]
fn test_split_first_column_keeps_second_column() {
    // First column interrupted by a gap, so its halves are two separate blobs
    let mut page = GrayImage::from_pixel(2400, 2000, Luma([PAPER]));
    text_block(&mut page, 100, 150, 400, 800);
    text_block(&mut page, 100, 1050, 400, 800);
    text_block(&mut page, 700, 150, 800, 1700);
    text_block(&mut page, 1700, 150, 550, 1700);

    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    write_page(input.path(), "000002.png", &page);

    let report = HebrewTextExtractor::new(input.path(), output.path())
        .run(&SilentProgress)
        .unwrap();

    let ImageOutcome::Cropped { method, bounds, .. } = &report.images[0].outcome else {
        panic!("expected a crop, got {:?}", report.images[0].outcome);
    };
    assert_ne!(*method, DetectionMethod::Contour);
    assert!((600..=720).contains(&bounds.x), "x = {}", bounds.x);
    assert!(bounds.right() < 1700, "right = {}", bounds.right());
    assert_eq!(bounds.y, 0);
}

#[test]
fn test_parallel_run_matches_sequential() {
    let input = tempdir().unwrap();
    let seq_out = tempdir().unwrap();
    let par_out = tempdir().unwrap();
    write_page(input.path(), "000002.png", &manuscript_page());
    write_page(input.path(), "000003.png", &manuscript_page());
    write_page(input.path(), "000004.png", &blank_page());

    let sequential = HebrewTextExtractor::new(input.path(), seq_out.path())
        .run(&SilentProgress)
        .unwrap();
    let parallel = HebrewTextExtractor::new(input.path(), par_out.path())
        .threads(3)
        .run(&SilentProgress)
        .unwrap();

    assert_eq!(sequential.summary, parallel.summary);
    assert_eq!(sequential.images, parallel.images);
}

#[test]
fn test_blank_and_odd_pages_skipped() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    write_page(input.path(), "000001.png", &manuscript_page());
    write_page(input.path(), "000002.png", &blank_page());

    let (successful, total) = process_all_images(input.path(), output.path()).unwrap();

    assert_eq!((successful, total), (0, 2));
    assert!(!output.path().join("000001.png").exists());
    assert!(!output.path().join("000002.png").exists());
}

#[test]
fn test_john1_page_rules() {
    let root = tempdir().unwrap();
    let input = root.path().join("john1");
    let output = root.path().join("out");
    std::fs::create_dir(&input).unwrap();
    for index in 4..=11 {
        write_page(&input, &format!("{index:06}.png"), &blank_page());
    }

    let report = HebrewTextExtractor::new(&input, &output)
        .run(&SilentProgress)
        .unwrap();
    assert_eq!(report.manuscript, "john1");

    // Pages that pass the rule reach the blank check
    let reached: Vec<&str> = report
        .images
        .iter()
        .filter(|r| matches!(r.outcome, ImageOutcome::SkippedBlank { .. }))
        .map(|r| r.file_name.as_str())
        .collect();
    assert_eq!(reached, ["000004.png", "000009.png", "000011.png"]);
    assert_eq!(report.summary.skipped_rule, 5);
}

#[test]
fn test_skip_existing_leaves_output_untouched() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    write_page(input.path(), "000002.png", &manuscript_page());
    std::fs::write(output.path().join("000002.png"), b"previous").unwrap();

    let extractor = HebrewTextExtractor::new(input.path(), output.path()).skip_existing(true);
    assert!(extractor.plan().unwrap().is_empty());

    let report = extractor.run(&SilentProgress).unwrap();
    assert_eq!(report.images[0].outcome, ImageOutcome::AlreadyPresent);
    assert_eq!(report.summary.processed, 1);
    assert_eq!(
        std::fs::read(output.path().join("000002.png")).unwrap(),
        b"previous"
    );
}

#[test]
fn test_report_written_as_json() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    write_page(input.path(), "000002.png", &manuscript_page());
    write_page(input.path(), "000003.png", &blank_page());

    let report = HebrewTextExtractor::new(input.path(), output.path())
        .run(&SilentProgress)
        .unwrap();
    let path = output.path().join("report.json");
    report.write_json(&path).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["summary"]["processed"], 1);
    assert_eq!(json["summary"]["skipped_rule"], 1);
    assert_eq!(json["images"][0]["file_name"], "000002.png");
    assert_eq!(json["images"][0]["status"], "cropped");
    assert_eq!(json["images"][1]["status"], "skipped_rule");
}
