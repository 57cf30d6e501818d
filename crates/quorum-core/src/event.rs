//! Timeline events — the atomic records of a recorded session.
//!
//! An event is an immutable statement that something happened at a given
//! offset from the start of the session. Events are supplied by the recording
//! subsystem and are never altered once loaded.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

// ─── Kind ────────────────────────────────────────────────────────────────────

/// The closed set of things that can happen during a session.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
  EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EventKind {
  // ── Session framing ─────────────────────────────────────────────────────
  SessionStart,
  SessionEnd,
  StageChange,

  // ── Discussion ──────────────────────────────────────────────────────────
  Statement,
  Analysis,
  HumanInput,
  HumanQuestion,

  // ── Guards ──────────────────────────────────────────────────────────────
  GuardTriggered,
  GuardViolation,

  // ── Decision lifecycle ──────────────────────────────────────────────────
  DecisionProposed,
  DecisionValidated,
  DecisionRejected,
  DecisionBlocked,
  Rollback,
}

impl EventKind {
  /// Whether this kind closes a decision track.
  pub fn is_terminal(self) -> bool {
    matches!(
      self,
      Self::DecisionValidated | Self::DecisionRejected | Self::DecisionBlocked
    )
  }

  pub fn is_decision(self) -> bool {
    matches!(
      self,
      Self::DecisionProposed
        | Self::DecisionValidated
        | Self::DecisionRejected
        | Self::DecisionBlocked
    )
  }

  pub fn is_guard(self) -> bool {
    matches!(self, Self::GuardTriggered | Self::GuardViolation)
  }
}

// ─── Author ──────────────────────────────────────────────────────────────────

/// Who produced an event.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Author {
  Human,
  /// An automated participant; `participant_id` identifies which one.
  Participant,
  System,
  Coordinator,
}

// ─── Event ───────────────────────────────────────────────────────────────────

/// A single recorded occurrence.
///
/// Timestamps are milliseconds since session start. Events without a
/// `duration_ms` are instantaneous.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEvent {
  pub id:                String,
  pub timestamp:         u64,
  pub kind:              EventKind,
  pub author:            Author,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub participant_id:    Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub participant_label: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub decision_id:       Option<String>,
  #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
  pub payload:           serde_json::Map<String, serde_json::Value>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub duration_ms:       Option<u64>,
}

impl TimelineEvent {
  /// Convenience constructor with all optional fields empty.
  pub fn new(
    id: impl Into<String>,
    timestamp: u64,
    kind: EventKind,
    author: Author,
  ) -> Self {
    Self {
      id: id.into(),
      timestamp,
      kind,
      author,
      participant_id: None,
      participant_label: None,
      decision_id: None,
      payload: serde_json::Map::new(),
      duration_ms: None,
    }
  }

  pub fn with_decision(mut self, decision_id: impl Into<String>) -> Self {
    self.decision_id = Some(decision_id.into());
    self
  }

  /// Attribute the event to an automated participant.
  pub fn with_participant(
    mut self,
    participant_id: impl Into<String>,
    label: Option<String>,
  ) -> Self {
    self.author = Author::Participant;
    self.participant_id = Some(participant_id.into());
    self.participant_label = label;
    self
  }

  pub fn with_duration(mut self, duration_ms: u64) -> Self {
    self.duration_ms = Some(duration_ms);
    self
  }

  pub fn with_payload(
    mut self,
    key: impl Into<String>,
    value: serde_json::Value,
  ) -> Self {
    self.payload.insert(key.into(), value);
    self
  }

  /// The moment this event stops being in progress, or `None` on overflow.
  pub fn end_ms(&self) -> Option<u64> {
    self.timestamp.checked_add(self.duration_ms.unwrap_or(0))
  }

  /// The participant this event is attributable to, if its author is an
  /// automated participant.
  pub fn participant(&self) -> Option<&str> {
    match self.author {
      Author::Participant => self.participant_id.as_deref(),
      _ => None,
    }
  }

  /// Short human-readable label for the author.
  pub fn author_label(&self) -> &str {
    match &self.author {
      Author::Participant => self
        .participant_label
        .as_deref()
        .or(self.participant_id.as_deref())
        .unwrap_or("participant"),
      other => other.as_ref(),
    }
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use std::str::FromStr;

  use super::*;

  #[test]
  fn kind_labels_match_serde() {
    let json = serde_json::to_value(EventKind::DecisionProposed).unwrap();
    assert_eq!(json, serde_json::json!("decision_proposed"));
    assert_eq!(EventKind::DecisionProposed.to_string(), "decision_proposed");
    assert_eq!(
      EventKind::from_str("guard_triggered").unwrap(),
      EventKind::GuardTriggered
    );
  }

  #[test]
  fn deserializes_camel_case_record() {
    let raw = serde_json::json!({
      "id": "e1",
      "timestamp": 1200,
      "kind": "statement",
      "author": "participant",
      "participantId": "analyst",
      "participantLabel": "Analyst",
      "decisionId": "d1",
      "payload": { "text": "hello" },
    });
    let event: TimelineEvent = serde_json::from_value(raw).unwrap();
    assert_eq!(event.kind, EventKind::Statement);
    assert_eq!(event.participant(), Some("analyst"));
    assert_eq!(event.decision_id.as_deref(), Some("d1"));
    assert_eq!(event.duration_ms, None);
    assert_eq!(event.author_label(), "Analyst");
  }

  #[test]
  fn participant_requires_participant_author() {
    let mut event = TimelineEvent::new("e1", 0, EventKind::Statement, Author::Human);
    event.participant_id = Some("ghost".into());
    assert_eq!(event.participant(), None);
    assert_eq!(event.author_label(), "human");
  }

  #[test]
  fn author_label_falls_back_to_author_kind() {
    let event = TimelineEvent::new("e1", 0, EventKind::Rollback, Author::Coordinator);
    assert_eq!(event.author_label(), "coordinator");
    let anonymous = TimelineEvent::new("e2", 0, EventKind::Statement, Author::System)
      .with_participant("critic", None);
    assert_eq!(anonymous.author_label(), "critic");
  }

  #[test]
  fn payload_serializes_under_payload_key() {
    let event = TimelineEvent::new("e1", 0, EventKind::GuardTriggered, Author::System)
      .with_payload("rule", serde_json::json!("no-pii"));
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["payload"]["rule"], "no-pii");
    assert_eq!(json["author"], "system");
  }

  #[test]
  fn end_ms_detects_overflow() {
    let event = TimelineEvent::new("e1", u64::MAX, EventKind::Analysis, Author::System)
      .with_duration(1);
    assert_eq!(event.end_ms(), None);
  }

  #[test]
  fn terminal_kinds() {
    assert!(EventKind::DecisionBlocked.is_terminal());
    assert!(!EventKind::DecisionProposed.is_terminal());
    assert!(!EventKind::Rollback.is_terminal());
  }
}
