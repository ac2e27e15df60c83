use chrono::{DateTime, Local, TimeDelta};
use embedded_graphics::pixelcolor::Rgb888;

use crate::model::canvas::Canvas;
use crate::model::mode::Mode;
use crate::panel::Panel;

pub const NAME: &str = "draw";

const BLINK_ON: TimeDelta = TimeDelta::seconds(1);
const BLINK_OFF: TimeDelta = TimeDelta::milliseconds(500);

/// A single blinking cursor pixel.
pub struct DrawMode {
    canvas: Option<Canvas>,
    pos: (i32, i32),
    colour: Rgb888,
    cursor_on: bool,
    next_blink: Option<DateTime<Local>>,
}

impl Default for DrawMode {
    fn default() -> Self {
        Self {
            canvas: None,
            pos: (0, 0),
            colour: Rgb888::new(127, 0, 0),
            cursor_on: false,
            next_blink: None,
        }
    }
}

impl DrawMode {
    #[cfg(test)]
    pub fn cursor(&self) -> ((i32, i32), Rgb888, bool) {
        (self.pos, self.colour, self.cursor_on)
    }

    fn blink(&mut self, panel: &mut dyn Panel) {
        let Some(mut canvas) = self.canvas.take() else {
            return;
        };

        // The cursor is the whole frame, so either buffer can be redrawn.
        canvas.clear();
        if self.cursor_on {
            canvas.set_pixel(self.pos.0, self.pos.1, self.colour);
        }

        self.canvas = Some(match panel.swap(canvas) {
            Ok(back) => back,
            Err(err) => {
                tracing::warn!("draw: swap failed: {err}");
                panel.create_canvas()
            }
        });
    }
}

impl Mode for DrawMode {
    fn name(&self) -> &'static str {
        NAME
    }

    fn activate(&mut self, panel: &mut dyn Panel, now: DateTime<Local>) {
        self.canvas = Some(panel.create_canvas());
        self.cursor_on = false;
        self.next_blink = Some(now);
    }

    fn deactivate(&mut self) {
        self.canvas = None;
        self.next_blink = None;
    }

    fn handle_command(&mut self, _panel: &mut dyn Panel, args: &[String]) -> bool {
        let Some(verb) = args.first() else {
            self.cursor_on = false;
            return true;
        };

        match verb.as_str() {
            "at" => {
                self.pos = (coerce(args.get(1)), coerce(args.get(2)));
                true
            }
            "colour" | "color" => {
                let channel = |i| coerce(args.get(i)).clamp(0, 255) as u8;
                self.colour = Rgb888::new(channel(1), channel(2), channel(3));
                true
            }
            _ => true,
        }
    }

    fn iterate(&mut self, panel: &mut dyn Panel, now: DateTime<Local>) {
        let Some(next) = self.next_blink else {
            return;
        };
        if now <= next {
            return;
        }

        self.cursor_on = !self.cursor_on;
        self.blink(panel);
        self.next_blink = Some(now + if self.cursor_on { BLINK_ON } else { BLINK_OFF });
    }
}

fn coerce(arg: Option<&String>) -> i32 {
    arg.and_then(|s| s.parse().ok()).unwrap_or(0)
}
