//! TUI rendering — orchestrates all panes.

pub mod events;
pub mod insights;

use quorum_core::{playback::PlaybackSpeed, visual::AccentColor};
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Gauge, Paragraph},
};

use crate::{app::App, report::format_ms};

/// Terminal colour for a renderer-neutral accent.
pub fn accent_color(accent: AccentColor) -> Color {
  accent.hex().parse().unwrap_or(Color::Gray)
}

// ─── Root draw ────────────────────────────────────────────────────────────────

/// Main draw function called each frame.
pub fn draw(f: &mut Frame, app: &App) {
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // header
      Constraint::Length(1), // progress
      Constraint::Min(0),    // body
      Constraint::Length(1), // status bar
    ])
    .split(f.area());

  draw_header(f, rows[0], app);
  draw_progress(f, rows[1], app);
  draw_body(f, rows[2], app);
  draw_status(f, rows[3], app);
}

// ─── Header ───────────────────────────────────────────────────────────────────

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
  let left = Span::styled(
    format!(" quorum  {}", app.session_name),
    Style::default()
      .fg(Color::White)
      .add_modifier(Modifier::BOLD),
  );
  let right = Span::styled(
    format!(
      "{} events  {} decisions  {} insights ",
      app.controller.timeline().len(),
      app.tracks.len(),
      app.insights.len()
    ),
    Style::default().fg(Color::Gray),
  );

  let pad = area
    .width
    .saturating_sub(left.width() as u16)
    .saturating_sub(right.width() as u16);
  let line = Line::from(vec![
    left,
    Span::raw(" ".repeat(pad as usize)),
    right,
  ]);

  let block = Block::default().style(Style::default().bg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);
  f.render_widget(Paragraph::new(line), inner);
}

fn draw_progress(f: &mut Frame, area: Rect, app: &App) {
  let state = app.state();
  let label = format!(
    "{} / {}",
    format_ms(state.current_time_ms as u64),
    format_ms(state.total_duration_ms)
  );
  f.render_widget(
    Gauge::default()
      .gauge_style(Style::default().fg(Color::Cyan).bg(Color::Black))
      .ratio(state.progress().clamp(0.0, 1.0))
      .label(label),
    area,
  );
}

// ─── Body ─────────────────────────────────────────────────────────────────────

fn draw_body(f: &mut Frame, area: Rect, app: &App) {
  let cols = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
    .split(area);
  events::draw(f, cols[0], app);

  let right = Layout::default()
    .direction(Direction::Vertical)
    .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
    .split(cols[1]);
  insights::draw_tracks(f, right[0], app);
  insights::draw_insights(f, right[1], app);
}

// ─── Status bar ───────────────────────────────────────────────────────────────

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
  let state = app.state();
  let (mode, mode_bg) = if state.is_playing {
    (format!(" PLAY {} ", state.speed), Color::Green)
  } else {
    let resume = app.controller.preferred_speed();
    let label = if resume == PlaybackSpeed::Paused {
      " PAUSED ".to_string()
    } else {
      format!(" PAUSED ({resume}) ")
    };
    (label, Color::Cyan)
  };

  let status = if app.status_msg.is_empty() {
    "space play/pause  ←→ event  [ ] skip  +/- speed  r reset  q quit"
      .to_string()
  } else {
    app.status_msg.clone()
  };

  let line = Line::from(vec![
    Span::styled(
      mode,
      Style::default()
        .fg(Color::Black)
        .bg(mode_bg)
        .add_modifier(Modifier::BOLD),
    ),
    Span::styled(format!("  {status}"), Style::default().fg(Color::Gray)),
  ]);
  f.render_widget(
    Paragraph::new(line).style(Style::default().bg(Color::Black)),
    area,
  );
}
