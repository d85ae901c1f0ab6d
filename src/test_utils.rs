//! Shared test utilities for image-based unit tests.

use image::{GrayImage, Luma};

use crate::morphology::FOREGROUND;

/// Empty binary page (all background)
pub(crate) fn binary_page(width: u32, height: u32) -> GrayImage {
    GrayImage::new(width, height)
}

/// Paint a solid foreground rectangle, clipped to the image
pub(crate) fn fill_rect(img: &mut GrayImage, x: u32, y: u32, w: u32, h: u32) {
    let x1 = (x + w).min(img.width());
    let y1 = (y + h).min(img.height());
    for yy in y..y1 {
        for xx in x..x1 {
            img.put_pixel(xx, yy, Luma([FOREGROUND]));
        }
    }
}

/// Paint a block of text-like strokes: 18px lines every 30px, 14px glyphs every 20px
pub(crate) fn text_block(img: &mut GrayImage, x: u32, y: u32, w: u32, h: u32) {
    let right = x + w;
    let bottom = y + h;
    let mut line_y = y;
    while line_y < bottom {
        let line_h = 18.min(bottom - line_y);
        let mut glyph_x = x;
        while glyph_x < right {
            let glyph_w = 14.min(right - glyph_x);
            fill_rect(img, glyph_x, line_y, glyph_w, line_h);
            glyph_x += 20;
        }
        line_y += 30;
    }
}

/// Paint a vertical line `thickness` pixels wide spanning `[y0, y1)`
pub(crate) fn vertical_line(img: &mut GrayImage, x: u32, y0: u32, y1: u32, thickness: u32) {
    fill_rect(img, x, y0, thickness, y1.saturating_sub(y0));
}
