use std::convert::Infallible;

use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::mono_font::iso_8859_1::FONT_5X7;
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};
use image::RgbImage;
use thiserror::Error;

/// Pixel rows between the top of a 5x7 glyph and its baseline.
pub const FONT_BASELINE: i32 = 6;

#[derive(Debug, Error)]
#[error("canvas size {width}x{height} is out of range")]
pub struct CanvasSizeError {
    pub width: u32,
    pub height: u32,
}

/// An off-screen RGB framebuffer sized to the panel.
///
/// Pixels outside the canvas are silently dropped, matching how LED matrix
/// drivers clip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<Rgb888>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Result<Self, CanvasSizeError> {
        let len = width
            .checked_mul(height)
            .and_then(|n| usize::try_from(n).ok())
            .ok_or(CanvasSizeError { width, height })?;
        Ok(Self {
            width,
            height,
            pixels: vec![Rgb888::BLACK; len],
        })
    }

    /// A black canvas with the same dimensions.
    pub fn blank(&self) -> Self {
        Self {
            width: self.width,
            height: self.height,
            pixels: vec![Rgb888::BLACK; self.pixels.len()],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn clear(&mut self) {
        self.pixels.fill(Rgb888::BLACK);
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<Rgb888> {
        self.index(x, y).map(|idx| self.pixels[idx])
    }

    pub fn set_pixel(&mut self, x: i32, y: i32, colour: Rgb888) {
        if let Some(idx) = self.index(x, y) {
            self.pixels[idx] = colour;
        }
    }

    /// Draw `text` in the 5x7 font with its baseline at `y`.
    pub fn draw_text(&mut self, x: i32, y: i32, colour: Rgb888, text: &str) {
        let style = MonoTextStyle::new(&FONT_5X7, colour);
        // Infallible target, nothing to report.
        let _ = Text::with_baseline(text, Point::new(x, y), style, Baseline::Alphabetic).draw(self);
    }

    /// Copy `image` so that its pixel (0, 0) lands at (`x`, `y`).
    pub fn blit(&mut self, image: &RgbImage, x: i32, y: i32) {
        for (ix, iy, px) in image.enumerate_pixels() {
            let [r, g, b] = px.0;
            self.set_pixel(ix as i32 + x, iy as i32 + y, Rgb888::new(r, g, b));
        }
    }

    /// Number of pixels that are not black.
    pub fn lit_pixels(&self) -> usize {
        self.pixels.iter().filter(|px| **px != Rgb888::BLACK).count()
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        Some((y as u32 * self.width + x as u32) as usize)
    }
}

impl OriginDimensions for Canvas {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for Canvas {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, colour) in pixels {
            self.set_pixel(point.x, point.y, colour);
        }
        Ok(())
    }
}
