//! `quorum` — replay and analyse recorded deliberation sessions.
//!
//! # Usage
//!
//! ```
//! quorum analyze session.json --format json
//! quorum tracks session.jsonl --compare d1 d2
//! quorum replay session.json --speed 2x
//! ```

mod app;
mod frame;
mod load;
mod report;
mod settings;
mod ui;

use std::{
  io,
  path::{Path, PathBuf},
  sync::Arc,
  time::{Duration, Instant},
};

use anyhow::{Context, Result, anyhow};
use app::App;
use clap::{Parser, Subcommand};
use crossterm::{
  event::{self, Event, KeyEventKind},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use frame::Ticker;
use quorum_core::{
  analysis::{analyze, analyze_decision},
  playback::PlaybackSpeed,
  track::DecisionTracks,
};
use ratatui::{Terminal, backend::CrosstermBackend};
use report::Format;
use settings::Settings;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
  name = "quorum",
  version,
  about = "Replay and analyse recorded deliberation sessions"
)]
struct Args {
  /// Path to a TOML config file; missing files are ignored.
  #[arg(short, long, value_name = "FILE", default_value = "quorum.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Print ranked insights for a session.
  Analyze {
    file: PathBuf,

    /// Only report insights tied to this decision.
    #[arg(long, value_name = "ID")]
    decision: Option<String>,

    #[arg(long, value_enum, default_value_t)]
    format: Format,
  },

  /// Print the decision tracks of a session, or compare two of them.
  Tracks {
    file: PathBuf,

    #[arg(long, num_args = 2, value_names = ["LEFT", "RIGHT"])]
    compare: Option<Vec<String>>,

    #[arg(long, value_enum, default_value_t)]
    format: Format,
  },

  /// Step through a session interactively.
  Replay {
    file: PathBuf,

    /// Initial playback speed (0.25x, 0.5x, 1x, 2x, 4x).
    #[arg(long, value_parser = PlaybackSpeed::from_label)]
    speed: Option<PlaybackSpeed>,
  },
}

// ─── Entry point ──────────────────────────────────────────────────────────────

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();
  let settings = Settings::load(&args.config)?;

  match args.command {
    Command::Analyze {
      file,
      decision,
      format,
    } => {
      let timeline = load::load_timeline(&file)?;
      let tracks = DecisionTracks::build(&timeline);
      let insights = match decision {
        Some(id) => {
          if tracks.get(&id).is_none() {
            tracing::warn!(decision = %id, "no events reference this decision");
          }
          analyze_decision(&timeline, &tracks, &settings.analysis, &id)
        }
        None => analyze(&timeline, &tracks, &settings.analysis),
      };
      report::write_insights(&mut io::stdout().lock(), &insights, format)
    }

    Command::Tracks {
      file,
      compare,
      format,
    } => {
      let timeline = load::load_timeline(&file)?;
      let tracks = DecisionTracks::build(&timeline);
      let mut out = io::stdout().lock();
      match compare.as_deref() {
        Some([left, right]) => {
          let comparison = tracks.compare(left, right).ok_or_else(|| {
            anyhow!("cannot compare {left} and {right}: unknown decision")
          })?;
          report::write_comparison(&mut out, &comparison, format)
        }
        _ => report::write_tracks(&mut out, &tracks, format),
      }
    }

    Command::Replay { file, speed } => {
      let mut replay = settings.replay;
      if let Some(speed) = speed {
        replay.speed = speed;
      }
      let timeline = load::load_timeline(&file)?;
      let mut app = App::new(
        session_name(&file),
        Arc::new(timeline),
        &settings.analysis,
        &replay,
      );
      let interval = Duration::from_millis(replay.frame_interval_ms);
      let result = run_terminal(&mut app, interval);
      app.close();
      result
    }
  }
}

fn session_name(path: &Path) -> String {
  path
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .unwrap_or_else(|| path.display().to_string())
}

// ─── Terminal ─────────────────────────────────────────────────────────────────

fn run_terminal(app: &mut App, interval: Duration) -> Result<()> {
  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
  let backend = CrosstermBackend::new(stdout);
  let mut terminal = Terminal::new(backend).context("creating terminal")?;

  let run_result = run_event_loop(&mut terminal, app, interval);

  // Restore terminal regardless of result.
  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
  terminal.show_cursor().ok();

  run_result
}

// ─── Event loop ───────────────────────────────────────────────────────────────

fn run_event_loop(
  terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
  app: &mut App,
  interval: Duration,
) -> Result<()> {
  let mut ticker = Ticker::new(interval, Instant::now());

  loop {
    terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;

    if event::poll(ticker.timeout(Instant::now())).context("polling input")? {
      match event::read().context("reading input")? {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
          if !app.handle_key(key) {
            break;
          }
        }
        // Redrawn on the next iteration.
        Event::Resize(_, _) => {}
        _ => {}
      }
    }

    if ticker.due(Instant::now()) {
      app.on_tick();
    }
  }

  Ok(())
}
