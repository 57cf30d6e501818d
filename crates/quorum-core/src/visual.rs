//! Renderer-agnostic presentation hints for events and insights.
//!
//! Both mappings are exhaustive matches over closed enums, so a new event or
//! insight kind fails to compile until it is given a hint here.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

use crate::{
  event::{Author, EventKind, TimelineEvent},
  insight::{Insight, InsightKind, Severity},
};

// ─── Hint vocabulary ─────────────────────────────────────────────────────────

/// What the renderer should draw attention to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "target", content = "author", rename_all = "snake_case")]
pub enum HighlightTarget {
  /// Whoever produced the event.
  Author(Author),
  Decision,
  Guard,
  Timeline,
  Participants,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AnimationStyle {
  None,
  Pulse,
  Glow,
  Flash,
  Shake,
  Fade,
  Sweep,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AccentColor {
  Neutral,
  Blue,
  Teal,
  Green,
  Amber,
  Orange,
  Red,
  Violet,
}

impl AccentColor {
  /// sRGB hex code, `#rrggbb`.
  pub fn hex(self) -> &'static str {
    match self {
      Self::Neutral => "#8b8d98",
      Self::Blue => "#0090ff",
      Self::Teal => "#12a594",
      Self::Green => "#30a46c",
      Self::Amber => "#ffc53d",
      Self::Orange => "#f76b15",
      Self::Red => "#e5484d",
      Self::Violet => "#6e56cf",
    }
  }

  fn for_severity(severity: Severity) -> Self {
    match severity {
      Severity::Info => Self::Blue,
      Severity::Low => Self::Teal,
      Severity::Medium => Self::Amber,
      Severity::High => Self::Orange,
      Severity::Critical => Self::Red,
    }
  }
}

/// How one event or insight should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualHint {
  pub highlight:           HighlightTarget,
  pub dim_others:          bool,
  pub animation:           AnimationStyle,
  pub accent:              AccentColor,
  pub show_guard:          bool,
  pub show_decision:       bool,
  pub show_violation:      bool,
  pub show_comparison:     bool,
  pub show_timeline_write: bool,
}

impl VisualHint {
  fn new(
    highlight: HighlightTarget,
    animation: AnimationStyle,
    accent: AccentColor,
  ) -> Self {
    Self {
      highlight,
      dim_others: false,
      animation,
      accent,
      show_guard: false,
      show_decision: false,
      show_violation: false,
      show_comparison: false,
      show_timeline_write: false,
    }
  }

  fn dim(mut self) -> Self {
    self.dim_others = true;
    self
  }

  fn guard(mut self) -> Self {
    self.show_guard = true;
    self
  }

  fn decision(mut self) -> Self {
    self.show_decision = true;
    self
  }

  fn violation(mut self) -> Self {
    self.show_violation = true;
    self
  }

  fn comparison(mut self) -> Self {
    self.show_comparison = true;
    self
  }

  fn timeline_write(mut self) -> Self {
    self.show_timeline_write = true;
    self
  }
}

// ─── Mappings ────────────────────────────────────────────────────────────────

/// Presentation for `event` as the play-head reaches it.
pub fn event_to_visual_hint(event: &TimelineEvent) -> VisualHint {
  use AccentColor as C;
  use AnimationStyle as A;
  use HighlightTarget as H;

  let speaker = H::Author(event.author);
  match event.kind {
    EventKind::SessionStart => VisualHint::new(H::Timeline, A::Sweep, C::Neutral),
    EventKind::SessionEnd => VisualHint::new(H::Timeline, A::Fade, C::Neutral),
    EventKind::StageChange => {
      VisualHint::new(H::Timeline, A::Sweep, C::Violet).timeline_write()
    }
    EventKind::Statement => VisualHint::new(speaker, A::Pulse, C::Blue),
    EventKind::Analysis => VisualHint::new(speaker, A::Glow, C::Teal),
    EventKind::HumanInput => VisualHint::new(speaker, A::Pulse, C::Amber).dim(),
    EventKind::HumanQuestion => VisualHint::new(speaker, A::Pulse, C::Amber),
    EventKind::GuardTriggered => {
      VisualHint::new(H::Guard, A::Flash, C::Orange).guard()
    }
    EventKind::GuardViolation => VisualHint::new(H::Guard, A::Shake, C::Red)
      .guard()
      .violation()
      .dim(),
    EventKind::DecisionProposed => {
      VisualHint::new(H::Decision, A::Glow, C::Blue).decision()
    }
    EventKind::DecisionValidated => {
      VisualHint::new(H::Decision, A::Flash, C::Green)
        .decision()
        .timeline_write()
    }
    EventKind::DecisionRejected => {
      VisualHint::new(H::Decision, A::Fade, C::Red).decision()
    }
    EventKind::DecisionBlocked => {
      VisualHint::new(H::Decision, A::Shake, C::Orange)
        .decision()
        .guard()
    }
    EventKind::Rollback => VisualHint::new(H::Timeline, A::Sweep, C::Amber)
      .timeline_write()
      .dim(),
  }
}

/// Presentation for `insight` when analysis results are shown.
pub fn insight_to_visual_hint(insight: &Insight) -> VisualHint {
  use AnimationStyle as A;
  use HighlightTarget as H;

  let accent = AccentColor::for_severity(insight.severity);
  let hint = match insight.kind {
    InsightKind::Delay => VisualHint::new(H::Decision, A::Pulse, accent).decision(),
    InsightKind::Conflict => VisualHint::new(H::Decision, A::Shake, accent)
      .decision()
      .comparison(),
    InsightKind::GuardDensity => {
      VisualHint::new(H::Guard, A::Flash, accent).guard()
    }
    InsightKind::HumanOverride => {
      VisualHint::new(H::Author(Author::Human), A::Glow, accent).decision()
    }
    InsightKind::RapidSequence => VisualHint::new(H::Timeline, A::Pulse, accent),
    InsightKind::ParticipantDominance => {
      VisualHint::new(H::Participants, A::Glow, accent).comparison()
    }
    InsightKind::BlockedStreak => VisualHint::new(H::Decision, A::Shake, accent)
      .decision()
      .guard()
      .violation(),
    InsightKind::ValidationSpeed => {
      VisualHint::new(H::Decision, A::Flash, accent).decision()
    }
  };
  if insight.severity >= Severity::High {
    hint.dim()
  } else {
    hint
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
