//! Interactive replay state and key dispatcher.

use std::{cell::Cell, rc::Rc, sync::Arc};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use quorum_core::{
  analysis::{InsightAnalysisConfig, analyze},
  insight::{Insight, Insights},
  playback::{FrameQueue, PlaybackController, PlaybackState},
  timeline::EventTimeline,
  track::{DecisionTrack, DecisionTracks},
};

use crate::settings::ReplaySettings;

/// Top-level replay state.
pub struct App {
  /// Display name for the header (usually the file name).
  pub session_name: String,

  pub controller: PlaybackController<FrameQueue>,

  /// Built once at load; never recomputed per frame.
  pub tracks: DecisionTracks,

  pub insights: Insights,

  /// Step for `[` and `]`.
  pub skip_ms: u64,

  /// One-line status message shown in the status bar.
  pub status_msg: String,

  /// Set by the playback subscriber when the play-head stops at the end.
  reached_end: Rc<Cell<bool>>,
}

impl App {
  pub fn new(
    session_name: String,
    timeline: Arc<EventTimeline>,
    analysis: &InsightAnalysisConfig,
    replay: &ReplaySettings,
  ) -> Self {
    let tracks = DecisionTracks::build(&timeline);
    let insights = analyze(&timeline, &tracks, analysis);

    let mut controller = PlaybackController::new(timeline, FrameQueue::new());
    controller.set_speed(replay.speed);

    let reached_end = Rc::new(Cell::new(false));
    let flag = reached_end.clone();
    controller.subscribe(move |state: PlaybackState| {
      if state.is_at_end && !state.is_playing {
        flag.set(true);
      }
    });

    Self {
      session_name,
      controller,
      tracks,
      insights,
      skip_ms: replay.skip_ms,
      status_msg: String::new(),
      reached_end,
    }
  }

  pub fn state(&self) -> PlaybackState { self.controller.state() }

  /// Play-head position truncated to whole milliseconds.
  pub fn now_ms(&self) -> u64 { self.state().current_time_ms as u64 }

  /// Insights the play-head has already passed.
  pub fn visible_insights(&self) -> Vec<&Insight> {
    self.insights.until(self.now_ms())
  }

  pub fn active_tracks(&self) -> Vec<&DecisionTrack> {
    self.tracks.active_at(self.now_ms())
  }

  // ── Frame loop ────────────────────────────────────────────────────────────

  /// Fire the controller's pending frame, if it requested one.
  pub fn on_tick(&mut self) {
    if self.controller.scheduler_mut().take_due().is_some() {
      self.controller.on_frame();
    }
    if self.reached_end.replace(false) {
      self.status_msg = "End of session".into();
    }
  }

  /// Stop playback and release the frame loop.
  pub fn close(&mut self) { self.controller.destroy(); }

  // ── Key handling ──────────────────────────────────────────────────────────

  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub fn handle_key(&mut self, key: KeyEvent) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL)
      && key.code == KeyCode::Char('c')
    {
      return false;
    }

    self.status_msg.clear();
    match key.code {
      KeyCode::Char('q') | KeyCode::Esc => return false,

      KeyCode::Char(' ') => self.controller.toggle(),

      KeyCode::Right | KeyCode::Char('l') => {
        self.controller.next_event();
      }
      KeyCode::Left | KeyCode::Char('h') => {
        self.controller.previous_event();
      }
      KeyCode::Char(']') => {
        self.controller.skip_forward(self.skip_ms);
      }
      KeyCode::Char('[') => {
        self.controller.skip_backward(self.skip_ms);
      }
      KeyCode::Home => {
        self.controller.seek(0.0);
      }
      KeyCode::End => {
        let end = self.state().total_duration_ms as f64;
        self.controller.seek(end);
      }

      KeyCode::Char('+') | KeyCode::Char('=') => {
        let speed = self.controller.preferred_speed().faster();
        self.controller.set_speed(speed);
        self.status_msg = format!("Speed {speed}");
      }
      KeyCode::Char('-') => {
        let speed = self.controller.preferred_speed().slower();
        self.controller.set_speed(speed);
        self.status_msg = format!("Speed {speed}");
      }

      KeyCode::Char('r') => {
        self.controller.reset();
      }

      _ => {}
    }
    if self.reached_end.replace(false) && self.status_msg.is_empty() {
      self.status_msg = "End of session".into();
    }
    true
  }
}

#[cfg(test)]
mod tests {
  use crossterm::event::KeyEventState;
  use quorum_core::{
    event::{Author, EventKind, TimelineEvent},
    playback::PlaybackSpeed,
  };

  use super::*;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent {
      code,
      modifiers: KeyModifiers::NONE,
      kind: crossterm::event::KeyEventKind::Press,
      state: KeyEventState::NONE,
    }
  }

  fn app() -> App {
    let timeline = EventTimeline::new(vec![
      TimelineEvent::new("a", 0, EventKind::SessionStart, Author::System),
      TimelineEvent::new("p", 1000, EventKind::DecisionProposed, Author::Coordinator)
        .with_decision("d1"),
      TimelineEvent::new("v", 1400, EventKind::DecisionValidated, Author::Coordinator)
        .with_decision("d1"),
      TimelineEvent::new("z", 9000, EventKind::SessionEnd, Author::System),
    ])
    .unwrap();
    App::new(
      "test".into(),
      Arc::new(timeline),
      &InsightAnalysisConfig::default(),
      &ReplaySettings::default(),
    )
  }

  #[test]
  fn space_toggles_playback() {
    let mut app = app();
    assert!(app.handle_key(key(KeyCode::Char(' '))));
    assert!(app.state().is_playing);
    assert_eq!(app.state().speed, PlaybackSpeed::Normal);
    app.handle_key(key(KeyCode::Char(' ')));
    assert!(!app.state().is_playing);
  }

  #[test]
  fn arrows_step_between_events() {
    let mut app = app();
    // The event at t=0 is already current.
    assert_eq!(app.state().current_event_index, Some(0));
    app.handle_key(key(KeyCode::Right));
    assert_eq!(app.now_ms(), 1000);
    assert_eq!(app.active_tracks().len(), 1);
    app.handle_key(key(KeyCode::Right));
    assert_eq!(app.now_ms(), 1400);
    app.handle_key(key(KeyCode::Left));
    assert_eq!(app.now_ms(), 1000);
    app.handle_key(key(KeyCode::Left));
    assert_eq!(app.now_ms(), 0);
  }

  #[test]
  fn insights_appear_as_play_head_passes() {
    let mut app = app();
    assert!(app.visible_insights().is_empty());
    app.handle_key(key(KeyCode::Char(']')));
    assert_eq!(app.visible_insights().len(), 1);
  }

  #[test]
  fn speed_keys_saturate() {
    let mut app = app();
    for _ in 0..5 {
      app.handle_key(key(KeyCode::Char('+')));
    }
    assert_eq!(app.controller.preferred_speed(), PlaybackSpeed::Quadruple);
    assert_eq!(app.status_msg, "Speed 4x");
  }

  #[test]
  fn end_key_reports_end() {
    let mut app = app();
    app.handle_key(key(KeyCode::End));
    assert!(app.state().is_at_end);
    assert_eq!(app.status_msg, "End of session");
  }

  #[test]
  fn quit_keys() {
    let mut app = app();
    assert!(!app.handle_key(key(KeyCode::Char('q'))));
    let ctrl_c = KeyEvent {
      modifiers: KeyModifiers::CONTROL,
      ..key(KeyCode::Char('c'))
    };
    assert!(!app.handle_key(ctrl_c));
  }
}
