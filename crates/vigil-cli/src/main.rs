//! `vigil` — terminal client for a room utility telemetry service.
//!
//! # Usage
//!
//! ```
//! vigil --url http://localhost:8000 --room "Demo Room A"
//! vigil --config ~/.config/vigil/config.toml --log-file /tmp/vigil.log
//! ```

mod app;
mod notify;
mod ui;

use std::{
  fs::File,
  io,
  sync::{Arc, Mutex},
  time::Duration,
};

use anyhow::{Context, Result, ensure};
use app::App;
use clap::Parser;
use crossterm::{
  event::{self, Event},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use vigil_client::{api::ApiClient, poller::Poller};
use vigil_core::{
  notify::NotificationSink,
  store::{AlertStore, DeviceStateStore},
};

const DEFAULT_URL: &str = "http://localhost:8000";
const DEFAULT_ROOM: &str = "Demo Room A";
const DEFAULT_USER: &str = "Resident";
const DEFAULT_INTERVAL_MS: u64 = 3000;
const DEFAULT_MAX_ALERTS: usize = 500;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
  name = "vigil",
  about = "Terminal client for a room utility telemetry service"
)]
struct Args {
  /// Path to a TOML config file (url, room, user, interval_ms, max_alerts).
  #[arg(short, long, value_name = "FILE")]
  config: Option<std::path::PathBuf>,

  /// Base URL of the telemetry service (default: http://localhost:8000).
  #[arg(long, env = "VIGIL_URL")]
  url: Option<String>,

  /// Room whose alerts and devices this client watches.
  #[arg(long, env = "VIGIL_ROOM")]
  room: Option<String>,

  /// Actor label stamped into override commands.
  #[arg(long, env = "VIGIL_USER")]
  user: Option<String>,

  /// Poll period in milliseconds.
  #[arg(long, env = "VIGIL_INTERVAL_MS")]
  interval_ms: Option<u64>,

  /// Cap on the visible alert feed; 0 keeps everything.
  #[arg(long, env = "VIGIL_MAX_ALERTS")]
  max_alerts: Option<usize>,

  /// Disable desktop notifications.
  #[arg(long)]
  no_notify: bool,

  /// Append logs to this file (stdout belongs to the UI).
  #[arg(long, value_name = "FILE")]
  log_file: Option<std::path::PathBuf>,
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  url:         Option<String>,
  room:        Option<String>,
  user:        Option<String>,
  interval_ms: Option<u64>,
  max_alerts:  Option<usize>,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  // Logging goes to a file or nowhere; the terminal belongs to the UI.
  if let Some(path) = &args.log_file {
    let file = open_log_file(path)?;
    tracing_subscriber::fmt()
      .with_env_filter(
        EnvFilter::builder()
          .with_default_directive(LevelFilter::INFO.into())
          .from_env_lossy(),
      )
      .with_writer(Mutex::new(file))
      .with_ansi(false)
      .init();
  }

  // Load config file if provided.
  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  let url = args
    .url
    .or(file_cfg.url)
    .unwrap_or_else(|| DEFAULT_URL.to_string());
  let room = args
    .room
    .or(file_cfg.room)
    .unwrap_or_else(|| DEFAULT_ROOM.to_string());
  let user = args
    .user
    .or(file_cfg.user)
    .unwrap_or_else(|| DEFAULT_USER.to_string());
  let interval_ms = args
    .interval_ms
    .or(file_cfg.interval_ms)
    .unwrap_or(DEFAULT_INTERVAL_MS);
  ensure!(interval_ms > 0, "poll interval must be at least 1 ms");
  let max_alerts = args
    .max_alerts
    .or(file_cfg.max_alerts)
    .unwrap_or(DEFAULT_MAX_ALERTS);

  let client = ApiClient::new(url).context("building API client")?;

  let alerts = Arc::new(if max_alerts == 0 {
    AlertStore::new()
  } else {
    AlertStore::with_cap(max_alerts)
  });
  let devices = Arc::new(DeviceStateStore::new());

  let notifier: Option<Arc<dyn NotificationSink>> = if args.no_notify {
    None
  } else {
    Some(Arc::new(notify::DesktopNotifier))
  };

  let mut app = App::new(
    client.clone(),
    room.clone(),
    user,
    Arc::clone(&alerts),
    Arc::clone(&devices),
  );

  let poller = Poller::new(
    client,
    room,
    Duration::from_millis(interval_ms),
    alerts,
    devices,
    notifier,
  )
  .spawn();

  // Set up the terminal.
  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
  let backend = CrosstermBackend::new(stdout);
  let mut terminal = Terminal::new(backend).context("creating terminal")?;

  let run_result = run_event_loop(&mut terminal, &mut app).await;

  // Restore terminal regardless of result.
  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
  terminal.show_cursor().ok();

  app.unsubscribe();
  poller.shutdown();

  run_result
}

// ─── Event loop ───────────────────────────────────────────────────────────────

async fn run_event_loop(
  terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
  app: &mut App,
) -> Result<()> {
  loop {
    app.drain_events();
    terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;

    // Poll for an event, yielding control to tokio while waiting.
    let maybe_event = tokio::task::block_in_place(|| {
      if event::poll(Duration::from_millis(50))? {
        Ok::<_, io::Error>(Some(event::read()?))
      } else {
        Ok(None)
      }
    })?;

    if let Some(evt) = maybe_event {
      match evt {
        Event::Key(key) => {
          if !app.handle_key(key).await {
            break;
          }
        }
        Event::Resize(_, _) => {
          // Terminal will redraw on next iteration.
        }
        _ => {}
      }
    }
  }

  Ok(())
}

// ─── Logging ──────────────────────────────────────────────────────────────────

/// Opens the log file for appending, creating it when missing.
fn open_log_file(path: &std::path::Path) -> Result<File> {
  File::options()
    .append(true)
    .create(true)
    .open(path)
    .with_context(|| format!("opening log file {}", path.display()))
}
