//! Footer annotation: a bordered band under the capture naming where it came from.

mod glyphs;

use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

use glyphs::{glyph, GLYPH_HEIGHT, GLYPH_WIDTH};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnnotateError {
    #[error("decode capture: {0}")]
    Decode(String),
    #[error("encode annotated capture: {0}")]
    Encode(String),
}

/// Draws `label` onto an encoded image and returns the new encoding.
pub trait Annotator: Send + Sync {
    fn annotate(&self, image: &[u8], label: &str) -> Result<Vec<u8>, AnnotateError>;
}

const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Appends a black rule and a white band with the label centred in it.
#[derive(Debug, Clone, Copy)]
pub struct FooterAnnotator {
    /// Space above and below the text; the band is twice this tall.
    pub padding: u32,
    pub border: u32,
    /// Pixel size of one font dot.
    pub scale: u32,
}

impl Default for FooterAnnotator {
    fn default() -> Self {
        Self {
            padding: 20,
            border: 1,
            scale: 2,
        }
    }
}

impl FooterAnnotator {
    fn advance(&self) -> u32 {
        (GLYPH_WIDTH + 1) * self.scale
    }

    fn draw_text(&self, canvas: &mut RgbaImage, text: &str, band_top: u32) {
        // Zero-sized dots: nothing to draw.
        if self.scale == 0 {
            return;
        }
        let width = canvas.width();
        let fit = (width / self.advance()) as usize;
        let chars: Vec<char> = text.chars().take(fit).collect();
        let text_width = (chars.len() as u32 * self.advance()).saturating_sub(self.scale);

        let x0 = width.saturating_sub(text_width) / 2;
        let y0 = (band_top + self.padding).saturating_sub(GLYPH_HEIGHT * self.scale / 2);

        for (i, c) in chars.iter().enumerate() {
            let gx = x0 + i as u32 * self.advance();
            for (row, bits) in glyph(*c).iter().enumerate() {
                for col in 0..GLYPH_WIDTH {
                    if bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                        continue;
                    }
                    self.fill(canvas, gx + col * self.scale, y0 + row as u32 * self.scale);
                }
            }
        }
    }

    fn fill(&self, canvas: &mut RgbaImage, x: u32, y: u32) {
        for dy in 0..self.scale {
            for dx in 0..self.scale {
                if x + dx < canvas.width() && y + dy < canvas.height() {
                    canvas.put_pixel(x + dx, y + dy, BLACK);
                }
            }
        }
    }
}

impl Annotator for FooterAnnotator {
    fn annotate(&self, image: &[u8], label: &str) -> Result<Vec<u8>, AnnotateError> {
        let source = image::load_from_memory(image)
            .map_err(|e| AnnotateError::Decode(e.to_string()))?
            .to_rgba8();
        let (w, h) = source.dimensions();
        let band_top = h + self.border;
        let mut canvas = RgbaImage::from_pixel(w, band_top + self.padding * 2, WHITE);
        image::imageops::replace(&mut canvas, &source, 0, 0);
        for y in h..band_top {
            for x in 0..w {
                canvas.put_pixel(x, y, BLACK);
            }
        }
        self.draw_text(&mut canvas, label, band_top);

        let mut out = Cursor::new(Vec::new());
        canvas
            .write_to(&mut out, ImageFormat::Png)
            .map_err(|e| AnnotateError::Encode(e.to_string()))?;
        Ok(out.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::from_pixel(width, height, Rgb([10u8, 120, 200]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn footer_adds_band_and_rule() {
        let a = FooterAnnotator::default();
        let out = a.annotate(&png(200, 100), "https://example.com").unwrap();
        let decoded = image::load_from_memory(&out).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (200, 100 + 1 + 40));
        assert_eq!(*decoded.get_pixel(0, 0), Rgba([10, 120, 200, 255]));
        assert_eq!(*decoded.get_pixel(0, 100), BLACK);
        assert_eq!(*decoded.get_pixel(0, 140), WHITE);
        let inked = (101..141)
            .flat_map(|y| (0..200).map(move |x| (x, y)))
            .filter(|(x, y)| *decoded.get_pixel(*x, *y) == BLACK)
            .count();
        assert!(inked > 0);
    }

    #[test]
    fn long_labels_are_clipped_to_width() {
        let a = FooterAnnotator::default();
        let label = "x".repeat(500);
        let out = a.annotate(&png(30, 10), &label).unwrap();
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!(decoded.width(), 30);
    }

    #[test]
    fn zero_scale_draws_an_empty_band() {
        let a = FooterAnnotator {
            scale: 0,
            ..FooterAnnotator::default()
        };
        let out = a.annotate(&png(50, 20), "https://example.com").unwrap();
        let decoded = image::load_from_memory(&out).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (50, 20 + 1 + 40));
        assert!((21..61).all(|y| (0..50).all(|x| *decoded.get_pixel(x, y) == WHITE)));
    }

    #[test]
    fn undecodable_input_is_an_error() {
        let err = FooterAnnotator::default().annotate(b"nope", "x").unwrap_err();
        assert!(matches!(err, AnnotateError::Decode(_)));
    }
}
