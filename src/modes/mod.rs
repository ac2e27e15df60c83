//! Concrete display modes and the factory that builds the registry.

pub mod clock;
pub mod display;
pub mod draw;

use crate::model::config::AppConfig;
use crate::model::images::DirImageStore;
use crate::model::mode::Mode;
use crate::model::registry::ModeRegistry;
use crate::weather::WeatherSource;

pub use clock::ClockMode;
pub use display::DisplayMode;
pub use draw::DrawMode;

/// Build the registry in `service.modes` order, skipping unknown names.
pub fn build_registry(config: &AppConfig, weather: Box<dyn WeatherSource>) -> ModeRegistry {
    let mut weather = Some(weather);
    let mut modes: Vec<Box<dyn Mode>> = Vec::new();

    for name in &config.service.modes {
        match name.as_str() {
            display::NAME => modes.push(Box::new(DisplayMode::new(DirImageStore::new(
                config.images_dir(),
            )))),
            clock::NAME => match weather.take() {
                Some(weather) => modes.push(Box::new(ClockMode::new(
                    weather,
                    &config.clock,
                    config.icon_dir(),
                ))),
                None => tracing::warn!(mode = %name, "duplicate mode name, keeping the first"),
            },
            draw::NAME => modes.push(Box::new(DrawMode::default())),
            other => tracing::warn!(mode = other, "unknown mode in config, skipping"),
        }
    }

    ModeRegistry::new(modes)
}
