mod app;
mod model;
mod modes;
mod msg;
mod panel;
mod queue;
mod weather;

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use anyhow::Result;
use clap::{Parser, Subcommand};
use crossterm::event::{self, Event};

use app::{App, LoopSettings};
use model::clock::SystemClock;
use model::config::{AppConfig, PanelBackend};
use panel::{HeadlessPanel, Panel, TerminalPanel};
use queue::SpoolQueue;
use weather::WeatherSource;

#[derive(Parser, Debug)]
#[command(name = "ledservice", version, about = "Mode-driven LED matrix service")]
struct Cli {
    /// Config file replacing the built-in defaults
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    action: Option<Action>,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// Drive the panel from the command queue (the default)
    Run,
    /// Queue one command for the running service
    Send {
        #[arg(trailing_var_arg = true, required = true)]
        words: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;

    match cli.action.unwrap_or(Action::Run) {
        Action::Send { words } => {
            let path = SpoolQueue::enqueue(&config.queue_dir(), &words.join(" "))?;
            println!("queued {}", path.display());
            Ok(())
        }
        Action::Run => run(config),
    }
}

fn run(config: AppConfig) -> Result<()> {
    // Initialize logging to file (never stdout, the panel may own it)
    let log_dir = directories::ProjectDirs::from("", "", "ledservice")
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("/tmp"));
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "ledservice.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("ledservice=info"));
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(filter)
        .init();

    tracing::info!("ledservice starting");

    let queue = SpoolQueue::open(config.queue_dir());
    tracing::info!("consuming commands from {}", queue.dir().display());

    let registry = modes::build_registry(&config, weather_source(&config));

    let stop = Arc::new(AtomicBool::new(false));
    let (width, height) = (config.panel.width, config.panel.height);
    let panel: Box<dyn Panel> = match config.panel.backend {
        PanelBackend::Terminal => {
            let panel = TerminalPanel::new(width, height)?;
            spawn_key_listener(stop.clone());
            Box::new(panel)
        }
        PanelBackend::Headless => Box::new(HeadlessPanel::new(width, height)?),
    };

    let settings = LoopSettings {
        tick_interval: config.tick_interval(),
        retry_cooldown: config.retry_cooldown(),
    };
    let mut app = App::new(registry, panel, queue, Box::new(SystemClock), settings);
    app.run(&stop);

    Ok(())
}

/// Raw mode swallows Ctrl-C, so quit keys are read on their own thread.
fn spawn_key_listener(stop: Arc<AtomicBool>) {
    thread::spawn(move || {
        while !stop.load(Ordering::Relaxed) {
            match event::read() {
                Ok(Event::Key(key)) if panel::terminal::is_quit_key(&key) => {
                    tracing::info!("quit requested from the terminal");
                    stop.store(true, Ordering::Relaxed);
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!("terminal input failed: {err}");
                    return;
                }
            }
        }
    });
}

fn weather_source(config: &AppConfig) -> Box<dyn WeatherSource> {
    if config.weather.api_key.is_empty() || config.weather.city_id.is_empty() {
        tracing::info!("weather API not configured");
        return Box::new(weather::NoWeather);
    }

    #[cfg(feature = "weather")]
    return Box::new(weather::OpenWeather::new(&config.weather));

    #[cfg(not(feature = "weather"))]
    {
        tracing::warn!("built without the weather feature, ignoring [weather]");
        Box::new(weather::NoWeather)
    }
}
