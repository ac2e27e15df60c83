//! Display surfaces a foregrounded mode draws on.

pub mod headless;
pub mod terminal;

use image::RgbImage;
use thiserror::Error;

use crate::model::canvas::{Canvas, CanvasSizeError};

pub use headless::HeadlessPanel;
pub use terminal::TerminalPanel;

#[derive(Debug, Error)]
pub enum PanelError {
    #[error("terminal i/o: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Size(#[from] CanvasSizeError),
    #[error("canvas is {got_w}x{got_h}, panel is {want_w}x{want_h}")]
    CanvasSize {
        got_w: u32,
        got_h: u32,
        want_w: u32,
        want_h: u32,
    },
}

/// The physical (or simulated) LED matrix.
///
/// The dispatcher owns the panel and lends `&mut dyn Panel` to the active
/// mode for the duration of each hook call; modes never store it.
pub trait Panel {
    /// Panel dimensions in pixels.
    fn size(&self) -> (u32, u32);

    /// Blank the visible frame.
    fn clear(&mut self) -> Result<(), PanelError>;

    /// Show `image` on the visible frame with its pixel (0, 0) at (`x`, `y`).
    fn set_image(&mut self, image: &RgbImage, x: i32, y: i32) -> Result<(), PanelError>;

    /// A blank off-screen buffer matching the panel.
    fn create_canvas(&mut self) -> Canvas;

    /// Present `canvas` on the next vsync and hand back the previously
    /// visible buffer for reuse.
    fn swap(&mut self, canvas: Canvas) -> Result<Canvas, PanelError>;
}

pub(crate) fn check_canvas(panel: (u32, u32), canvas: &Canvas) -> Result<(), PanelError> {
    if (canvas.width(), canvas.height()) != panel {
        return Err(PanelError::CanvasSize {
            got_w: canvas.width(),
            got_h: canvas.height(),
            want_w: panel.0,
            want_h: panel.1,
        });
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    /// Everything a mode asked the panel to do, in order.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum PanelCall {
        Clear,
        SetImage { x: i32, y: i32, width: u32 },
        Swap,
    }

    /// Panel fake that records calls and keeps the last presented frame.
    #[derive(Debug)]
    pub struct RecordingPanel {
        pub width: u32,
        pub height: u32,
        pub calls: Vec<PanelCall>,
        pub front: Canvas,
    }

    impl RecordingPanel {
        pub fn new(width: u32, height: u32) -> Self {
            Self {
                width,
                height,
                calls: Vec::new(),
                front: Canvas::new(width, height).unwrap(),
            }
        }

        pub fn swaps(&self) -> usize {
            self.calls.iter().filter(|c| **c == PanelCall::Swap).count()
        }

        pub fn clears(&self) -> usize {
            self.calls.iter().filter(|c| **c == PanelCall::Clear).count()
        }

        pub fn images(&self) -> Vec<(i32, i32, u32)> {
            self.calls
                .iter()
                .filter_map(|c| match c {
                    PanelCall::SetImage { x, y, width } => Some((*x, *y, *width)),
                    _ => None,
                })
                .collect()
        }
    }

    impl Panel for RecordingPanel {
        fn size(&self) -> (u32, u32) {
            (self.width, self.height)
        }

        fn clear(&mut self) -> Result<(), PanelError> {
            self.calls.push(PanelCall::Clear);
            self.front.clear();
            Ok(())
        }

        fn set_image(&mut self, image: &RgbImage, x: i32, y: i32) -> Result<(), PanelError> {
            self.calls.push(PanelCall::SetImage {
                x,
                y,
                width: image.width(),
            });
            self.front.blit(image, x, y);
            Ok(())
        }

        fn create_canvas(&mut self) -> Canvas {
            self.front.blank()
        }

        fn swap(&mut self, canvas: Canvas) -> Result<Canvas, PanelError> {
            check_canvas(self.size(), &canvas)?;
            self.calls.push(PanelCall::Swap);
            Ok(std::mem::replace(&mut self.front, canvas))
        }
    }

    /// A [`RecordingPanel`] that stays inspectable after being boxed into
    /// an `App`.
    #[derive(Debug, Clone)]
    pub struct SharedPanel(pub Rc<RefCell<RecordingPanel>>);

    impl SharedPanel {
        pub fn new(width: u32, height: u32) -> Self {
            Self(Rc::new(RefCell::new(RecordingPanel::new(width, height))))
        }
    }

    impl Panel for SharedPanel {
        fn size(&self) -> (u32, u32) {
            self.0.borrow().size()
        }

        fn clear(&mut self) -> Result<(), PanelError> {
            self.0.borrow_mut().clear()
        }

        fn set_image(&mut self, image: &RgbImage, x: i32, y: i32) -> Result<(), PanelError> {
            self.0.borrow_mut().set_image(image, x, y)
        }

        fn create_canvas(&mut self) -> Canvas {
            self.0.borrow_mut().create_canvas()
        }

        fn swap(&mut self, canvas: Canvas) -> Result<Canvas, PanelError> {
            self.0.borrow_mut().swap(canvas)
        }
    }
}
