use image::RgbImage;

use super::{Panel, PanelError, check_canvas};
use crate::model::canvas::Canvas;

/// In-memory panel for running without a terminal; frames are only logged.
#[derive(Debug)]
pub struct HeadlessPanel {
    front: Canvas,
    frames: u64,
}

impl HeadlessPanel {
    pub fn new(width: u32, height: u32) -> Result<Self, PanelError> {
        Ok(Self {
            front: Canvas::new(width, height)?,
            frames: 0,
        })
    }

    #[cfg(test)]
    pub fn frame(&self) -> &Canvas {
        &self.front
    }

    fn presented(&mut self) {
        self.frames += 1;
        tracing::debug!(
            frame = self.frames,
            lit = self.front.lit_pixels(),
            "headless frame"
        );
    }
}

impl Panel for HeadlessPanel {
    fn size(&self) -> (u32, u32) {
        (self.front.width(), self.front.height())
    }

    fn clear(&mut self) -> Result<(), PanelError> {
        self.front.clear();
        self.presented();
        Ok(())
    }

    fn set_image(&mut self, image: &RgbImage, x: i32, y: i32) -> Result<(), PanelError> {
        self.front.blit(image, x, y);
        self.presented();
        Ok(())
    }

    fn create_canvas(&mut self) -> Canvas {
        self.front.blank()
    }

    fn swap(&mut self, canvas: Canvas) -> Result<Canvas, PanelError> {
        check_canvas(self.size(), &canvas)?;
        let previous = std::mem::replace(&mut self.front, canvas);
        self.presented();
        Ok(previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::pixelcolor::{Rgb888, RgbColor};

    #[test]
    fn swap_returns_previous_front() {
        let mut panel = HeadlessPanel::new(4, 4).unwrap();
        let mut canvas = panel.create_canvas();
        canvas.set_pixel(1, 1, Rgb888::GREEN);

        let back = panel.swap(canvas).unwrap();
        assert_eq!(back.lit_pixels(), 0);
        assert_eq!(panel.frame().pixel(1, 1), Some(Rgb888::GREEN));
    }

    #[test]
    fn mismatched_canvas_is_rejected() {
        let mut panel = HeadlessPanel::new(4, 4).unwrap();
        let err = panel.swap(Canvas::new(8, 4).unwrap()).unwrap_err();
        assert!(matches!(err, PanelError::CanvasSize { got_w: 8, .. }));
    }

    #[test]
    fn clear_blanks_the_frame() {
        let mut panel = HeadlessPanel::new(4, 4).unwrap();
        let image = RgbImage::from_pixel(4, 4, image::Rgb([255, 0, 0]));
        panel.set_image(&image, 0, 0).unwrap();
        assert_eq!(panel.frame().lit_pixels(), 16);
        panel.clear().unwrap();
        assert_eq!(panel.frame().lit_pixels(), 0);
    }

    #[test]
    fn oversized_panel_is_rejected() {
        let err = HeadlessPanel::new(u32::MAX, 2).unwrap_err();
        assert!(matches!(err, PanelError::Size(_)));
    }
}
