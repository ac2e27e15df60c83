use std::io::{self, Stdout};

use crossterm::cursor::{Hide, Show};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use image::RgbImage;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::style::Color;

use super::{Panel, PanelError, check_canvas};
use crate::model::canvas::Canvas;

/// Upper half block: foreground paints the top LED row, background the bottom.
const HALF_BLOCK: char = '\u{2580}';

/// Simulated LED matrix drawn in the terminal, two LED rows per text row.
pub struct TerminalPanel {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    front: Canvas,
}

impl TerminalPanel {
    pub fn new(width: u32, height: u32) -> Result<Self, PanelError> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, Hide)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        let mut panel = Self {
            terminal,
            front: Canvas::new(width, height)?,
        };
        panel.render()?;
        Ok(panel)
    }

    fn render(&mut self) -> Result<(), PanelError> {
        let front = &self.front;
        self.terminal.draw(|frame| {
            let area = frame.area();
            let buf = frame.buffer_mut();
            let rows = front.height().div_ceil(2);

            for row in 0..rows.min(u32::from(area.height)) {
                for x in 0..front.width().min(u32::from(area.width)) {
                    let top = front.pixel(x as i32, (row * 2) as i32);
                    let bottom = front.pixel(x as i32, (row * 2 + 1) as i32);
                    if let Some(cell) = buf.cell_mut((area.x + x as u16, area.y + row as u16)) {
                        cell.set_char(HALF_BLOCK)
                            .set_fg(led_colour(top))
                            .set_bg(led_colour(bottom));
                    }
                }
            }
        })?;
        Ok(())
    }
}

fn led_colour(pixel: Option<Rgb888>) -> Color {
    let px = pixel.unwrap_or(Rgb888::BLACK);
    Color::Rgb(px.r(), px.g(), px.b())
}

/// `q`, `Esc` or Ctrl-C stop the service while the terminal panel is up.
pub fn is_quit_key(key: &KeyEvent) -> bool {
    if key.kind != KeyEventKind::Press {
        return false;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

impl Panel for TerminalPanel {
    fn size(&self) -> (u32, u32) {
        (self.front.width(), self.front.height())
    }

    fn clear(&mut self) -> Result<(), PanelError> {
        self.front.clear();
        self.render()
    }

    fn set_image(&mut self, image: &RgbImage, x: i32, y: i32) -> Result<(), PanelError> {
        self.front.blit(image, x, y);
        self.render()
    }

    fn create_canvas(&mut self) -> Canvas {
        self.front.blank()
    }

    fn swap(&mut self, canvas: Canvas) -> Result<Canvas, PanelError> {
        check_canvas(self.size(), &canvas)?;
        let previous = std::mem::replace(&mut self.front, canvas);
        self.render()?;
        Ok(previous)
    }
}

impl Drop for TerminalPanel {
    fn drop(&mut self) {
        if let Err(err) = disable_raw_mode() {
            tracing::warn!("failed to leave raw mode: {err}");
        }
        if let Err(err) = execute!(self.terminal.backend_mut(), Show, LeaveAlternateScreen) {
            tracing::warn!("failed to restore terminal: {err}");
        }
    }
}
