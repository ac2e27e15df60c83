use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Longest accepted poll or refresh interval: one year.
pub const MAX_INTERVAL_SECS: u64 = 366 * 24 * 60 * 60;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub service: ServiceConfig,
    pub panel: PanelConfig,
    pub display: DisplayConfig,
    pub clock: ClockConfig,
    pub weather: WeatherConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub queue_dir: String,
    pub tick_ms: u64,
    pub retry_cooldown_secs: u64,
    /// Registry order; also the `next_mode` cycling order.
    pub modes: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelBackend {
    Terminal,
    Headless,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PanelConfig {
    pub backend: PanelBackend,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    pub images_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClockConfig {
    pub poll_secs: u64,
    pub weather_refresh_secs: u64,
    pub icon_dir: String,
    pub text_colour: [u8; 3],
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeatherConfig {
    pub api_key: String,
    pub city_id: String,
    pub timeout_secs: u64,
}

impl AppConfig {
    /// Load configuration with layering: defaults → user config.
    ///
    /// An explicit path must exist; the platform config file is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let defaults = include_str!("../../config/default.toml");
        let mut config: AppConfig = toml::from_str(defaults)?;

        let user_path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => directories::ProjectDirs::from("", "", "ledservice")
                .map(|dirs| dirs.config_dir().join("config.toml"))
                .filter(|path| path.exists()),
        };

        if let Some(path) = user_path {
            let user_str = fs::read_to_string(&path)
                .with_context(|| format!("reading config {}", path.display()))?;
            config = toml::from_str(&user_str)
                .with_context(|| format!("parsing config {}", path.display()))?;
        }

        config.validate().context("invalid configuration")?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let intervals = [
            ("clock.poll_secs", self.clock.poll_secs),
            ("clock.weather_refresh_secs", self.clock.weather_refresh_secs),
        ];
        for (key, secs) in intervals {
            if secs > MAX_INTERVAL_SECS {
                bail!("{key} = {secs} exceeds the {MAX_INTERVAL_SECS}s maximum");
            }
        }

        let (width, height) = (self.panel.width, self.panel.height);
        if width == 0 || height == 0 || width.checked_mul(height).is_none() {
            bail!("panel size {width}x{height} is out of range");
        }
        Ok(())
    }

    pub fn queue_dir(&self) -> PathBuf {
        expand_tilde(&self.service.queue_dir)
    }

    pub fn images_dir(&self) -> PathBuf {
        expand_tilde(&self.display.images_dir)
    }

    pub fn icon_dir(&self) -> PathBuf {
        expand_tilde(&self.clock.icon_dir)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.service.tick_ms)
    }

    pub fn retry_cooldown(&self) -> Duration {
        Duration::from_secs(self.service.retry_cooldown_secs)
    }
}

fn expand_tilde(path: &str) -> PathBuf {
    if !path.starts_with('~') {
        return PathBuf::from(path);
    }

    match directories::BaseDirs::new() {
        Some(base_dirs) => {
            let home = base_dirs.home_dir().to_string_lossy();
            PathBuf::from(path.replacen('~', &home, 1))
        }
        None => PathBuf::from(path),
    }
}
