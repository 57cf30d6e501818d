//! Playback controller — a virtual play-head driven over an [`EventTimeline`].
//!
//! The controller is a two-state machine (stopped / running) layered on a
//! continuous time cursor. While running it owns at most one pending frame
//! request; the host fires that frame by calling
//! [`PlaybackController::on_frame`]. Every state change is pushed to
//! subscribers as a [`PlaybackState`] snapshot.

use std::{sync::Arc, time::Instant};

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{Error, Result, event::TimelineEvent, timeline::EventTimeline};

// ─── Speed ───────────────────────────────────────────────────────────────────

/// The fixed set of playback multipliers.
///
/// Serde and strum accept the same labels; the `x`-prefixed forms are
/// aliases and never produced.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
pub enum PlaybackSpeed {
  #[default]
  #[serde(rename = "paused")]
  #[strum(serialize = "paused")]
  Paused,
  #[serde(rename = "0.25x", alias = "x0.25")]
  #[strum(to_string = "0.25x", serialize = "x0.25")]
  Quarter,
  #[serde(rename = "0.5x", alias = "x0.5")]
  #[strum(to_string = "0.5x", serialize = "x0.5")]
  Half,
  #[serde(rename = "1x", alias = "x1")]
  #[strum(to_string = "1x", serialize = "x1")]
  Normal,
  #[serde(rename = "2x", alias = "x2")]
  #[strum(to_string = "2x", serialize = "x2")]
  Double,
  #[serde(rename = "4x", alias = "x4")]
  #[strum(to_string = "4x", serialize = "x4")]
  Quadruple,
}

impl PlaybackSpeed {
  /// Every running speed, slowest first.
  pub const RUNNING: [Self; 5] = [
    Self::Quarter,
    Self::Half,
    Self::Normal,
    Self::Double,
    Self::Quadruple,
  ];

  /// Parse a speed label, reporting unknown labels as
  /// [`Error::UnknownSpeed`].
  pub fn from_label(label: &str) -> Result<Self> {
    label
      .parse()
      .map_err(|_| Error::UnknownSpeed(label.to_string()))
  }

  /// Multiplier applied to wall-clock time.
  pub fn factor(self) -> f64 {
    match self {
      Self::Paused => 0.0,
      Self::Quarter => 0.25,
      Self::Half => 0.5,
      Self::Normal => 1.0,
      Self::Double => 2.0,
      Self::Quadruple => 4.0,
    }
  }

  /// The next faster running speed, saturating at 4x.
  pub fn faster(self) -> Self {
    match self {
      Self::Paused => Self::Normal,
      Self::Quarter => Self::Half,
      Self::Half => Self::Normal,
      Self::Normal => Self::Double,
      Self::Double | Self::Quadruple => Self::Quadruple,
    }
  }

  /// The next slower running speed, saturating at 0.25x.
  pub fn slower(self) -> Self {
    match self {
      Self::Paused => Self::Normal,
      Self::Quarter | Self::Half => Self::Quarter,
      Self::Normal => Self::Half,
      Self::Double => Self::Normal,
      Self::Quadruple => Self::Double,
    }
  }
}

// ─── Host seams ──────────────────────────────────────────────────────────────

/// Source of wall-clock time.
pub trait Clock {
  fn now(&self) -> Instant;
}

/// [`Clock`] backed by [`Instant::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> Instant { Instant::now() }
}

/// Opaque token for a requested frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

/// Something that can call [`PlaybackController::on_frame`] "soon".
pub trait FrameScheduler {
  fn request_frame(&mut self) -> FrameHandle;
  fn cancel_frame(&mut self, handle: FrameHandle);
}

/// A single-slot [`FrameScheduler`] that the host polls.
///
/// The host checks [`FrameQueue::take_due`] once per tick and, if it yields a
/// handle, fires [`PlaybackController::on_frame`].
#[derive(Debug, Default)]
pub struct FrameQueue {
  next_handle: u64,
  pending:     Option<FrameHandle>,
  requested:   u64,
  cancelled:   u64,
}

impl FrameQueue {
  pub fn new() -> Self { Self::default() }

  pub fn is_pending(&self) -> bool { self.pending.is_some() }

  /// Consume the pending frame, if any.
  pub fn take_due(&mut self) -> Option<FrameHandle> { self.pending.take() }

  /// Total frames ever requested.
  pub fn requested(&self) -> u64 { self.requested }

  /// Total frames cancelled before firing.
  pub fn cancelled(&self) -> u64 { self.cancelled }
}

impl FrameScheduler for FrameQueue {
  fn request_frame(&mut self) -> FrameHandle {
    self.next_handle += 1;
    self.requested += 1;
    let handle = FrameHandle(self.next_handle);
    self.pending = Some(handle);
    handle
  }

  fn cancel_frame(&mut self, handle: FrameHandle) {
    if self.pending == Some(handle) {
      self.pending = None;
      self.cancelled += 1;
    }
  }
}

// ─── State ───────────────────────────────────────────────────────────────────

/// A snapshot of the play-head. Always a copy, never a live view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaybackState {
  pub current_time_ms:     f64,
  pub total_duration_ms:   u64,
  pub is_playing:          bool,
  pub speed:               PlaybackSpeed,
  /// Last event with `timestamp <= current_time_ms`.
  pub current_event_index: Option<usize>,
  pub is_at_start:         bool,
  pub is_at_end:           bool,
}

impl PlaybackState {
  /// The stopped state at `time_ms` over `timeline`.
  pub fn at(timeline: &EventTimeline, time_ms: f64) -> Self {
    let total = timeline.total_duration_ms();
    let current = clamp_time(time_ms, total);
    let mut state = Self {
      current_time_ms:     current,
      total_duration_ms:   total,
      is_playing:          false,
      speed:               PlaybackSpeed::Paused,
      current_event_index: scan_forward(timeline.events(), None, current),
      is_at_start:         false,
      is_at_end:           false,
    };
    state.refresh_flags();
    state
  }

  /// Fraction of the timeline played, in `[0, 1]`.
  pub fn progress(&self) -> f64 {
    if self.total_duration_ms == 0 {
      1.0
    } else {
      self.current_time_ms / self.total_duration_ms as f64
    }
  }

  fn refresh_flags(&mut self) {
    self.is_at_start = self.current_time_ms <= 0.0;
    self.is_at_end = self.current_time_ms >= self.total_duration_ms as f64;
  }
}

fn clamp_time(time_ms: f64, total_ms: u64) -> f64 {
  if time_ms.is_nan() {
    return 0.0;
  }
  time_ms.clamp(0.0, total_ms as f64)
}

/// Walk forward from `from` to the last event at or before `time_ms`.
fn scan_forward(
  events: &[TimelineEvent],
  from: Option<usize>,
  time_ms: f64,
) -> Option<usize> {
  let mut index = from;
  let mut next = from.map_or(0, |i| i + 1);
  while next < events.len() && events[next].timestamp as f64 <= time_ms {
    index = Some(next);
    next += 1;
  }
  index
}

// ─── Controller ──────────────────────────────────────────────────────────────

/// Handle returned by [`PlaybackController::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(PlaybackState)>;

/// Drives a play-head over a shared, read-only timeline.
pub struct PlaybackController<S: FrameScheduler, C: Clock = SystemClock> {
  timeline:      Arc<EventTimeline>,
  state:         PlaybackState,
  /// Speed restored by [`toggle`](Self::toggle).
  last_speed:    PlaybackSpeed,
  last_frame_at: Option<Instant>,
  pending_frame: Option<FrameHandle>,
  scheduler:     S,
  clock:         C,
  listeners:     Vec<(SubscriptionId, Listener)>,
  next_listener: u64,
}

impl<S: FrameScheduler> PlaybackController<S, SystemClock> {
  pub fn new(timeline: Arc<EventTimeline>, scheduler: S) -> Self {
    Self::with_clock(timeline, scheduler, SystemClock)
  }
}

impl<S: FrameScheduler, C: Clock> PlaybackController<S, C> {
  pub fn with_clock(
    timeline: Arc<EventTimeline>,
    scheduler: S,
    clock: C,
  ) -> Self {
    let state = PlaybackState::at(&timeline, 0.0);
    Self {
      timeline,
      state,
      last_speed: PlaybackSpeed::Normal,
      last_frame_at: None,
      pending_frame: None,
      scheduler,
      clock,
      listeners: Vec::new(),
      next_listener: 0,
    }
  }

  // ── Accessors ─────────────────────────────────────────────────────────

  pub fn state(&self) -> PlaybackState { self.state }

  pub fn timeline(&self) -> &Arc<EventTimeline> { &self.timeline }

  pub fn scheduler(&self) -> &S { &self.scheduler }

  pub fn scheduler_mut(&mut self) -> &mut S { &mut self.scheduler }

  /// The speed [`toggle`](Self::toggle) will resume at.
  pub fn preferred_speed(&self) -> PlaybackSpeed { self.last_speed }

  /// The event under the play-head, if any has happened yet.
  pub fn current_event(&self) -> Option<&TimelineEvent> {
    self
      .state
      .current_event_index
      .and_then(|i| self.timeline.get(i))
  }

  /// Every event with `timestamp <= current_time_ms`.
  pub fn active_events(&self) -> &[TimelineEvent] {
    match self.state.current_event_index {
      Some(i) => &self.timeline.events()[..=i],
      None => &[],
    }
  }

  // ── Subscribers ───────────────────────────────────────────────────────

  /// Register `listener`; it is called synchronously on every state change.
  pub fn subscribe(
    &mut self,
    listener: impl FnMut(PlaybackState) + 'static,
  ) -> SubscriptionId {
    self.next_listener += 1;
    let id = SubscriptionId(self.next_listener);
    self.listeners.push((id, Box::new(listener)));
    id
  }

  /// Returns `false` if `id` was not subscribed.
  pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
    let before = self.listeners.len();
    self.listeners.retain(|(lid, _)| *lid != id);
    self.listeners.len() != before
  }

  fn notify(&mut self) {
    let snapshot = self.state;
    for (_, listener) in &mut self.listeners {
      listener(snapshot);
    }
  }

  // ── Transport ─────────────────────────────────────────────────────────

  /// Start (or re-speed) playback. `Paused` is equivalent to [`pause`].
  ///
  /// [`pause`]: Self::pause
  pub fn play(&mut self, speed: PlaybackSpeed) {
    if speed == PlaybackSpeed::Paused {
      self.pause();
      return;
    }
    if self.timeline.is_empty() {
      tracing::debug!("play on empty timeline ignored");
      return;
    }
    if self.state.is_playing {
      self.set_speed(speed);
      return;
    }

    if self.state.is_at_end {
      self.move_to(0.0);
    }
    self.last_speed = speed;
    self.state.speed = speed;
    self.state.is_playing = true;
    self.last_frame_at = Some(self.clock.now());
    self.ensure_frame();
    tracing::debug!(%speed, at = self.state.current_time_ms, "playback started");
    self.notify();
  }

  /// Stop playback and cancel any pending frame.
  pub fn pause(&mut self) {
    self.cancel_frame();
    self.last_frame_at = None;
    if !self.state.is_playing && self.state.speed == PlaybackSpeed::Paused {
      return;
    }
    self.state.is_playing = false;
    self.state.speed = PlaybackSpeed::Paused;
    tracing::debug!(at = self.state.current_time_ms, "playback paused");
    self.notify();
  }

  /// Pause if running, otherwise resume at the last running speed.
  pub fn toggle(&mut self) {
    if self.state.is_playing {
      self.pause();
    } else {
      self.play(self.last_speed);
    }
  }

  /// Change speed. While stopped this only updates the resume speed.
  pub fn set_speed(&mut self, speed: PlaybackSpeed) {
    if speed == PlaybackSpeed::Paused {
      self.pause();
      return;
    }
    self.last_speed = speed;
    if self.state.is_playing && self.state.speed != speed {
      self.state.speed = speed;
      self.notify();
    }
  }

  /// Move the play-head to `time_ms`, clamped to the timeline bounds.
  pub fn seek(&mut self, time_ms: f64) -> PlaybackState {
    self.move_to(time_ms);
    self.notify();
    self.state
  }

  /// Seek to the timestamp of the event at `index`; out of range is a no-op.
  pub fn seek_to_event(&mut self, index: usize) -> PlaybackState {
    match self.timeline.get(index) {
      Some(event) => {
        let target = event.timestamp as f64;
        self.seek(target)
      }
      None => self.state,
    }
  }

  /// Seek to the first event after the current one.
  pub fn next_event(&mut self) -> PlaybackState {
    let next = self.state.current_event_index.map_or(0, |i| i + 1);
    self.seek_to_event(next)
  }

  /// Seek to the last event strictly earlier than the current one, or to the
  /// start of the session.
  pub fn previous_event(&mut self) -> PlaybackState {
    let Some(current) = self.state.current_event_index else {
      return self.seek(0.0);
    };
    let events = self.timeline.events();
    let current_ts = events[current].timestamp;
    match events[..current]
      .iter()
      .rposition(|e| e.timestamp < current_ts)
    {
      Some(index) => self.seek_to_event(index),
      None => self.seek(0.0),
    }
  }

  pub fn skip_forward(&mut self, ms: u64) -> PlaybackState {
    self.seek(self.state.current_time_ms + ms as f64)
  }

  pub fn skip_backward(&mut self, ms: u64) -> PlaybackState {
    self.seek(self.state.current_time_ms - ms as f64)
  }

  /// Pause and return to the start of the session.
  pub fn reset(&mut self) -> PlaybackState {
    self.pause();
    self.seek(0.0)
  }

  /// Cancel any pending frame and drop every subscriber.
  pub fn destroy(&mut self) {
    self.cancel_frame();
    self.state.is_playing = false;
    self.state.speed = PlaybackSpeed::Paused;
    self.last_frame_at = None;
    self.listeners.clear();
  }

  // ── Frame loop ────────────────────────────────────────────────────────

  /// Advance the play-head by the wall-clock time since the previous frame.
  /// A no-op while stopped.
  pub fn on_frame(&mut self) {
    self.pending_frame = None;
    if !self.state.is_playing {
      return;
    }

    let now = self.clock.now();
    let elapsed = self
      .last_frame_at
      .map(|then| now.saturating_duration_since(then))
      .unwrap_or_default();
    self.last_frame_at = Some(now);

    let advance = elapsed.as_secs_f64() * 1000.0 * self.state.speed.factor();
    let target = self.state.current_time_ms + advance;
    let end = self.state.total_duration_ms as f64;

    if target >= end {
      self.state.current_time_ms = end;
      self.state.current_event_index = scan_forward(
        self.timeline.events(),
        self.state.current_event_index,
        end,
      );
      self.state.refresh_flags();
      self.state.is_playing = false;
      self.state.speed = PlaybackSpeed::Paused;
      self.last_frame_at = None;
      tracing::debug!("playback reached end");
    } else {
      self.state.current_time_ms = target;
      self.state.current_event_index = scan_forward(
        self.timeline.events(),
        self.state.current_event_index,
        target,
      );
      self.state.refresh_flags();
      self.ensure_frame();
    }
    self.notify();
  }

  fn ensure_frame(&mut self) {
    if self.pending_frame.is_none() {
      self.pending_frame = Some(self.scheduler.request_frame());
    }
  }

  fn cancel_frame(&mut self) {
    if let Some(handle) = self.pending_frame.take() {
      self.scheduler.cancel_frame(handle);
    }
  }

  /// Update time and derived fields without notifying.
  fn move_to(&mut self, time_ms: f64) {
    let target = clamp_time(time_ms, self.state.total_duration_ms);
    // Forward moves continue the scan; backward moves rescan from the start.
    let from = if target >= self.state.current_time_ms {
      self.state.current_event_index
    } else {
      None
    };
    self.state.current_time_ms = target;
    self.state.current_event_index =
      scan_forward(self.timeline.events(), from, target);
    self.state.refresh_flags();
  }
}

impl<S: FrameScheduler, C: Clock> Drop for PlaybackController<S, C> {
  fn drop(&mut self) { self.cancel_frame(); }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
