use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, TimeDelta};
use embedded_graphics::pixelcolor::Rgb888;

use crate::model::canvas::{Canvas, FONT_BASELINE};
use crate::model::config::ClockConfig;
use crate::model::mode::Mode;
use crate::panel::Panel;
use crate::weather::{Conditions, WeatherError, WeatherSource};

pub const NAME: &str = "time";

const TEMPERATURE_AT: (i32, i32) = (44, 28);
const ICON_AT: (i32, i32) = (32, 20);

/// Sub-views of the clock, cycled with `next`/`prev`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Current,
}

const SCREENS: &[Screen] = &[Screen::Current];

/// A weather icon: `(x, y, r, g, b)` per lit pixel.
type Sprite = Vec<(i32, i32, u8, u8, u8)>;

/// Time, date and current weather, redrawn once per second.
///
/// The redraw deadline advances by exactly one second per frame instead of
/// snapping to the wall clock, so a late tick produces catch-up frames
/// rather than a skipped second.
pub struct ClockMode<W> {
    weather: W,
    conditions: Option<Conditions>,
    poll_interval: TimeDelta,
    refresh_interval: TimeDelta,
    icon_dir: PathBuf,
    colour: Rgb888,
    canvas: Option<Canvas>,
    next_due: Option<DateTime<Local>>,
    next_weather: Option<DateTime<Local>>,
    screen: usize,
    sprites: HashMap<String, Sprite>,
}

impl<W: WeatherSource> ClockMode<W> {
    pub fn new(weather: W, config: &ClockConfig, icon_dir: PathBuf) -> Self {
        let [r, g, b] = config.text_colour;
        Self {
            weather,
            conditions: None,
            poll_interval: seconds(config.poll_secs),
            refresh_interval: seconds(config.weather_refresh_secs),
            icon_dir,
            colour: Rgb888::new(r, g, b),
            canvas: None,
            next_due: None,
            next_weather: None,
            screen: 0,
            sprites: HashMap::new(),
        }
    }

    pub fn screen(&self) -> Screen {
        SCREENS[self.screen]
    }

    #[cfg(test)]
    pub fn next_due(&self) -> Option<DateTime<Local>> {
        self.next_due
    }

    #[cfg(test)]
    pub fn conditions(&self) -> Option<&Conditions> {
        self.conditions.as_ref()
    }

    fn prepare(&mut self) {
        let (Some(mut canvas), Some(due)) = (self.canvas.take(), self.next_due) else {
            return;
        };

        canvas.clear();
        match self.screen() {
            Screen::Current => self.draw_current(&mut canvas, due),
        }
        self.canvas = Some(canvas);
    }

    fn draw_current(&mut self, canvas: &mut Canvas, due: DateTime<Local>) {
        canvas.draw_text(0, FONT_BASELINE + 3, self.colour, &time_label(due));
        canvas.draw_text(0, FONT_BASELINE * 2 + 6, self.colour, &date_label(due));

        let Some(conditions) = self.conditions.clone() else {
            return;
        };

        if let Some(temperature) = conditions.temperature {
            let (x, y) = TEMPERATURE_AT;
            canvas.draw_text(x, y, self.colour, &format!("{temperature}\u{b0}"));
        }

        let sprite = match conditions.icon.as_deref() {
            Some(icon) => self.sprite(icon),
            None => None,
        };
        if let Some(sprite) = sprite {
            let (ox, oy) = ICON_AT;
            for &(x, y, r, g, b) in sprite {
                canvas.set_pixel(x + ox, y + oy, Rgb888::new(r, g, b));
            }
        }
    }

    /// Icons are cached once loaded; a missing file is looked for again on
    /// the next redraw.
    fn sprite(&mut self, icon: &str) -> Option<&Sprite> {
        if !self.sprites.contains_key(icon) {
            let sprite = load_sprite(&self.icon_dir.join(format!("{icon}.json")))?;
            self.sprites.insert(icon.to_string(), sprite);
        }
        self.sprites.get(icon)
    }
}

fn load_sprite(path: &Path) -> Option<Sprite> {
    let raw = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&raw) {
        Ok(sprite) => Some(sprite),
        Err(err) => {
            tracing::debug!("bad weather icon {}: {err}", path.display());
            None
        }
    }
}

impl<W: WeatherSource> Mode for ClockMode<W> {
    fn name(&self) -> &'static str {
        NAME
    }

    fn poll_interval(&self) -> Option<TimeDelta> {
        Some(self.poll_interval)
    }

    fn activate(&mut self, panel: &mut dyn Panel, now: DateTime<Local>) {
        self.canvas = Some(panel.create_canvas());
        self.next_due = Some(now);
        self.prepare();
    }

    fn deactivate(&mut self) {
        self.canvas = None;
        self.next_due = None;
    }

    fn handle_command(&mut self, _panel: &mut dyn Panel, args: &[String]) -> bool {
        let Some(verb) = args.first() else {
            return true;
        };

        let step = match verb.as_str() {
            "next" => 1,
            "prev" => -1,
            _ => 0,
        };
        self.screen = (self.screen as isize + step).rem_euclid(SCREENS.len() as isize) as usize;
        self.prepare();
        true
    }

    fn iterate(&mut self, panel: &mut dyn Panel, now: DateTime<Local>) {
        let Some(due) = self.next_due else {
            return;
        };
        if now < due {
            return;
        }
        let Some(canvas) = self.canvas.take() else {
            return;
        };

        let back = match panel.swap(canvas) {
            Ok(back) => back,
            Err(err) => {
                tracing::warn!("clock: swap failed: {err}");
                panel.create_canvas()
            }
        };
        self.canvas = Some(back);
        self.next_due = Some(due + TimeDelta::seconds(1));
        self.prepare();
    }

    fn background_job(&mut self, now: DateTime<Local>) {
        if self.next_weather.is_some_and(|next| now < next) {
            return;
        }
        let base = self.next_weather.unwrap_or(now);
        self.next_weather = Some(base.checked_add_signed(self.refresh_interval).unwrap_or(base));

        match self.weather.fetch() {
            Ok(conditions) => self.conditions = Some(conditions),
            Err(WeatherError::NotConfigured) => tracing::info!("weather API not configured"),
            // The previous conditions stay on screen.
            Err(err) => tracing::warn!("weather refresh failed: {err}"),
        }
    }
}

/// Saturates at the largest representable interval.
fn seconds(secs: u64) -> TimeDelta {
    i64::try_from(secs)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .unwrap_or(TimeDelta::MAX)
}

/// 12-hour time with the leading zero of the hour replaced by a space.
pub fn time_label(at: DateTime<Local>) -> String {
    let label = at.format("%I:%M %p").to_string();
    match label.strip_prefix('0') {
        Some(rest) => format!(" {rest}"),
        None => label,
    }
}

pub fn date_label(at: DateTime<Local>) -> String {
    at.format("%a %e %b").to_string()
}
