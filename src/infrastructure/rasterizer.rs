//! Bitmap rasterizer for preview surfaces.
//!
//! Paints a [`PreviewSurface`] into an RGB image with a built-in 5×7 dot
//! font. Lowercase text is drawn with the uppercase glyphs.

use async_trait::async_trait;
use image::{Rgb as Pixel, RgbImage};

use crate::application::exporter::{Bitmap, CaptureOptions, Rasterizer};
use crate::application::preview::{text_width, Align, Element, PreviewSurface, Rgb};
use crate::domain::{ExportError, ExportResult};

/// Largest bitmap edge accepted, in device pixels.
const MAX_EDGE: u32 = 8192;
/// Glyph cell: 5 columns plus 1 spacing, 7 rows.
const GLYPH_COLUMNS: u32 = 5;
const GLYPH_ADVANCE: f32 = 6.0;
const GLYPH_ROWS: usize = 7;
/// Font size that maps to a dot size of one CSS pixel.
const DOTS_PER_EM: f32 = 9.0;
const BADGE_TEXT_SIZE: u32 = 14;

/// Rasterizer that draws on a background thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct BitmapRasterizer;

#[async_trait]
impl Rasterizer for BitmapRasterizer {
    async fn capture(
        &self,
        surface: &PreviewSurface,
        options: CaptureOptions,
    ) -> ExportResult<Bitmap> {
        let surface = surface.clone();
        tokio::task::spawn_blocking(move || rasterize(&surface, options))
            .await
            .map_err(|e| ExportError::Capture {
                message: format!("Rasterizer task failed: {e}"),
            })?
    }
}

/// Paint the surface at the requested scale.
///
/// # Errors
/// Returns error if the scale is zero or the bitmap would be too large.
pub fn rasterize(surface: &PreviewSurface, options: CaptureOptions) -> ExportResult<Bitmap> {
    let scale = options.scale;
    let width = surface.width.checked_mul(scale).unwrap_or(u32::MAX);
    let height = surface.height.checked_mul(scale).unwrap_or(u32::MAX);
    if width == 0 || height == 0 || width > MAX_EDGE || height > MAX_EDGE {
        return Err(ExportError::Capture {
            message: format!("Unsupported bitmap size {width}x{height}"),
        });
    }

    #[allow(clippy::cast_precision_loss)]
    let scale = scale as f32;
    let mut canvas = Canvas {
        image: RgbImage::from_pixel(width, height, pixel(options.background)),
        scale,
    };

    for element in &surface.elements {
        match element {
            Element::Text {
                x,
                y,
                size,
                align,
                color,
                text,
            } => canvas.text(*x, *y, *size, *align, *color, text),
            Element::Rule { x, y, width, color } => {
                canvas.rect_css(*x, *y, *width, 1, *color);
            }
            Element::Badge {
                x,
                y,
                width,
                height,
                fill,
                color,
                text,
            } => {
                canvas.rect_css(*x, *y, *width, *height, *fill);
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let half_text = (text_width(text, BADGE_TEXT_SIZE) / 2.0) as u32;
                let tx = (x + width / 2).saturating_sub(half_text);
                let ty = (y + height / 2).saturating_sub(BADGE_TEXT_SIZE / 2);
                canvas.text(tx, ty, BADGE_TEXT_SIZE, Align::Left, *color, text);
            }
        }
    }

    tracing::debug!(width, height, elements = surface.elements.len(), "Surface rasterized");
    Ok(canvas.image)
}

const fn pixel(c: Rgb) -> Pixel<u8> {
    Pixel([c.0, c.1, c.2])
}

struct Canvas {
    image: RgbImage,
    scale: f32,
}

impl Canvas {
    /// Fill a rectangle given in device pixels, clipped to the image.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn fill(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgb) {
        let (iw, ih) = self.image.dimensions();
        let x0 = x.round().max(0.0) as u32;
        let y0 = y.round().max(0.0) as u32;
        let x1 = ((x + w).round().max(0.0) as u32).min(iw);
        let y1 = ((y + h).round().max(0.0) as u32).min(ih);
        for py in y0..y1 {
            for px in x0..x1 {
                self.image.put_pixel(px, py, pixel(color));
            }
        }
    }

    /// Fill a rectangle given in CSS pixels; at least one device pixel tall.
    #[allow(clippy::cast_precision_loss)]
    fn rect_css(&mut self, x: u32, y: u32, w: u32, h: u32, color: Rgb) {
        let s = self.scale;
        self.fill(x as f32 * s, y as f32 * s, w as f32 * s, (h as f32 * s).max(1.0), color);
    }

    #[allow(clippy::cast_precision_loss)]
    fn text(&mut self, x: u32, y: u32, size: u32, align: Align, color: Rgb, text: &str) {
        let s = self.scale;
        let dot = size as f32 / DOTS_PER_EM * s;
        let width = text_width(text, size) * s;
        let left = match align {
            Align::Left => x as f32 * s,
            Align::Right => x as f32 * s - width,
        };
        let top = y as f32 * s + dot;

        for (i, c) in text.chars().enumerate() {
            let origin = left + i as f32 * GLYPH_ADVANCE * dot;
            for (row, bits) in glyph(c).iter().enumerate() {
                for col in 0..GLYPH_COLUMNS {
                    if bits & (1 << (GLYPH_COLUMNS - 1 - col)) != 0 {
                        self.fill(
                            origin + col as f32 * dot,
                            top + row as f32 * dot,
                            dot,
                            dot,
                            color,
                        );
                    }
                }
            }
        }
    }
}

/// Rows of a 5×7 glyph, most significant of the low five bits on the left.
const fn glyph(c: char) -> [u8; GLYPH_ROWS] {
    match c.to_ascii_uppercase() {
        ' ' => [0, 0, 0, 0, 0, 0, 0],
        'A' => [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
        'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
        'D' => [0x1E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1E],
        'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
        'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
        'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F],
        'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        'J' => [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C],
        'K' => [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
        'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
        'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
        'N' => [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11],
        'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
        'Q' => [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D],
        'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
        'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
        'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
        'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A],
        'X' => [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11],
        'Y' => [0x11, 0x11, 0x11, 0x0A, 0x04, 0x04, 0x04],
        'Z' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F],
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        '.' => [0, 0, 0, 0, 0, 0x0C, 0x0C],
        ',' => [0, 0, 0, 0, 0x0C, 0x04, 0x08],
        '-' => [0, 0, 0, 0x1F, 0, 0, 0],
        '/' => [0, 0x01, 0x02, 0x04, 0x08, 0x10, 0],
        ':' => [0, 0x0C, 0x0C, 0, 0x0C, 0x0C, 0],
        '\'' => [0x0C, 0x04, 0x08, 0, 0, 0, 0],
        '(' => [0x02, 0x04, 0x08, 0x08, 0x08, 0x04, 0x02],
        ')' => [0x08, 0x04, 0x02, 0x02, 0x02, 0x04, 0x08],
        '&' => [0x0C, 0x12, 0x14, 0x08, 0x15, 0x12, 0x0D],
        '#' => [0x0A, 0x0A, 0x1F, 0x0A, 0x1F, 0x0A, 0x0A],
        _ => [0x0E, 0x11, 0x01, 0x02, 0x04, 0, 0x04],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::preview::WHITE;

    fn surface(elements: Vec<Element>) -> PreviewSurface {
        PreviewSurface {
            width: 100,
            height: 50,
            elements,
        }
    }

    fn options(scale: u32) -> CaptureOptions {
        CaptureOptions {
            scale,
            background: WHITE,
        }
    }

    fn ink_pixels(image: &RgbImage) -> usize {
        image.pixels().filter(|p| p.0 != [255, 255, 255]).count()
    }

    #[test]
    fn test_bitmap_is_scaled() {
        let bitmap = rasterize(&surface(vec![]), options(3)).unwrap();
        assert_eq!(bitmap.dimensions(), (300, 150));
        assert_eq!(ink_pixels(&bitmap), 0);
    }

    #[test]
    fn test_zero_scale_is_capture_error() {
        let err = rasterize(&surface(vec![]), options(0)).unwrap_err();
        assert!(matches!(err, ExportError::Capture { .. }));
    }

    #[test]
    fn test_oversized_bitmap_is_rejected() {
        assert!(rasterize(&surface(vec![]), options(1000)).is_err());
    }

    #[test]
    fn test_text_and_rule_draw_ink() {
        let elements = vec![
            Element::Text {
                x: 4,
                y: 4,
                size: 18,
                align: Align::Left,
                color: Rgb(0, 0, 0),
                text: "Rs. 2,500".into(),
            },
            Element::Rule {
                x: 0,
                y: 40,
                width: 100,
                color: Rgb(0, 0, 0),
            },
        ];
        let bitmap = rasterize(&surface(elements), options(2)).unwrap();
        assert!(ink_pixels(&bitmap) > 200);
        assert_eq!(bitmap.get_pixel(10, 80).0, [0, 0, 0]);
    }

    #[test]
    fn test_right_aligned_text_ends_at_anchor() {
        let elements = vec![Element::Text {
            x: 100,
            y: 0,
            size: 9,
            align: Align::Right,
            color: Rgb(0, 0, 0),
            text: "I".into(),
        }];
        let bitmap = rasterize(&surface(elements), options(1)).unwrap();
        let leftmost_ink = bitmap
            .enumerate_pixels()
            .filter(|(_, _, p)| p.0 != [255, 255, 255])
            .map(|(x, _, _)| x)
            .min()
            .unwrap();
        assert!(leftmost_ink >= 94);
    }

    #[test]
    fn test_lowercase_uses_uppercase_glyph() {
        assert_eq!(glyph('a'), glyph('A'));
        assert_eq!(glyph('~'), glyph('?'));
    }

    #[tokio::test]
    async fn test_capture_runs_off_thread() {
        let bitmap = BitmapRasterizer
            .capture(&surface(vec![]), options(2))
            .await
            .unwrap();
        assert_eq!(bitmap.width(), 200);
    }
}
