//! Decision tracks — the propose → resolve lifecycle of each decision.
//!
//! Tracks are derived once per timeline by grouping events on their
//! `decision_id`. They are never stored and never updated incrementally.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter};

use crate::{
  event::{EventKind, TimelineEvent},
  timeline::EventTimeline,
};

// ─── Outcome ─────────────────────────────────────────────────────────────────

/// How a decision ended, if it has.
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
  AsRefStr,
  EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Outcome {
  Validated,
  Blocked,
  Rejected,
  Pending,
}

impl Outcome {
  fn from_terminal(kind: EventKind) -> Option<Self> {
    match kind {
      EventKind::DecisionValidated => Some(Self::Validated),
      EventKind::DecisionBlocked => Some(Self::Blocked),
      EventKind::DecisionRejected => Some(Self::Rejected),
      _ => None,
    }
  }
}

// ─── Track ───────────────────────────────────────────────────────────────────

/// All events sharing one decision id, with the lifecycle computed from them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTrack {
  pub decision_id:         String,
  /// The subsequence of the timeline carrying this id, in timeline order.
  pub events:              Vec<TimelineEvent>,
  /// Timestamp of the first `decision_proposed` event, or 0 when there is
  /// none. A missing proposal therefore inflates `duration_ms`.
  pub proposed_at_ms:      u64,
  pub resolved_at_ms:      Option<u64>,
  pub outcome:             Outcome,
  /// `resolved_at_ms - proposed_at_ms`, or 0 while pending.
  pub duration_ms:         u64,
  /// Distinct participants seen on this track, in order of appearance.
  pub participants:        Vec<String>,
  pub proposal_event_id:   Option<String>,
  pub resolution_event_id: Option<String>,
}

impl DecisionTrack {
  fn from_events(decision_id: String, events: Vec<TimelineEvent>) -> Self {
    let proposal = events
      .iter()
      .find(|e| e.kind == EventKind::DecisionProposed);
    let resolution = events.iter().find(|e| e.kind.is_terminal());

    let proposed_at_ms = proposal.map_or(0, |e| e.timestamp);
    let resolved_at_ms = resolution.map(|e| e.timestamp);
    let outcome = resolution
      .and_then(|e| Outcome::from_terminal(e.kind))
      .unwrap_or(Outcome::Pending);
    // A proposal recorded after its own resolution would go negative.
    let duration_ms =
      resolved_at_ms.map_or(0, |at| at.saturating_sub(proposed_at_ms));

    let mut participants: Vec<String> = Vec::new();
    for id in events.iter().filter_map(TimelineEvent::participant) {
      if !participants.iter().any(|p| p == id) {
        participants.push(id.to_string());
      }
    }

    let proposal_event_id = proposal.map(|e| e.id.clone());
    let resolution_event_id = resolution.map(|e| e.id.clone());

    Self {
      decision_id,
      events,
      proposed_at_ms,
      resolved_at_ms,
      outcome,
      duration_ms,
      participants,
      proposal_event_id,
      resolution_event_id,
    }
  }

  pub fn is_resolved(&self) -> bool { self.resolved_at_ms.is_some() }

  /// Proposed at or before `time_ms` and not yet resolved before it.
  pub fn is_active_at(&self, time_ms: u64) -> bool {
    self.proposed_at_ms <= time_ms
      && self.resolved_at_ms.is_none_or(|at| at >= time_ms)
  }
}

// ─── Comparison / statistics ─────────────────────────────────────────────────

/// Side-by-side view of two competing decision threads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackComparison {
  pub left:                String,
  pub right:               String,
  /// Participants present on both tracks, in the left track's order.
  pub shared_participants: Vec<String>,
  pub duration_delta_ms:   u64,
  pub same_outcome:        bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackStats {
  pub total:            usize,
  pub validated:        usize,
  pub blocked:          usize,
  pub rejected:         usize,
  pub pending:          usize,
  /// Mean over resolved tracks only; `None` if nothing has resolved.
  pub mean_duration_ms: Option<f64>,
}

// ─── Builder ─────────────────────────────────────────────────────────────────

/// Every decision track of a timeline, sorted by proposal time.
#[derive(Debug, Clone, Default)]
pub struct DecisionTracks {
  tracks: Vec<DecisionTrack>,
  by_id:  HashMap<String, usize>,
}

impl DecisionTracks {
  /// Group `timeline` events by decision id.
  pub fn build(timeline: &EventTimeline) -> Self {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<TimelineEvent>> = HashMap::new();
    for event in timeline.events() {
      let Some(decision_id) = &event.decision_id else {
        continue;
      };
      groups
        .entry(decision_id.clone())
        .or_insert_with(|| {
          order.push(decision_id.clone());
          Vec::new()
        })
        .push(event.clone());
    }

    let mut tracks: Vec<DecisionTrack> = order
      .into_iter()
      .filter_map(|id| {
        let events = groups.remove(&id)?;
        Some(DecisionTrack::from_events(id, events))
      })
      .collect();
    // Stable: ties keep first-appearance order.
    tracks.sort_by_key(|t| t.proposed_at_ms);

    let by_id = tracks
      .iter()
      .enumerate()
      .map(|(i, t)| (t.decision_id.clone(), i))
      .collect();

    tracing::debug!(tracks = tracks.len(), "decision tracks built");
    Self { tracks, by_id }
  }

  pub fn all(&self) -> &[DecisionTrack] { &self.tracks }

  pub fn len(&self) -> usize { self.tracks.len() }

  pub fn is_empty(&self) -> bool { self.tracks.is_empty() }

  pub fn get(&self, decision_id: &str) -> Option<&DecisionTrack> {
    self.by_id.get(decision_id).map(|&i| &self.tracks[i])
  }

  /// Tracks in flight at `time_ms`.
  pub fn active_at(&self, time_ms: u64) -> Vec<&DecisionTrack> {
    self
      .tracks
      .iter()
      .filter(|t| t.is_active_at(time_ms))
      .collect()
  }

  /// Compare two tracks by id. `None` if either id is unknown.
  pub fn compare(&self, left: &str, right: &str) -> Option<TrackComparison> {
    let a = self.get(left)?;
    let b = self.get(right)?;
    let shared_participants = a
      .participants
      .iter()
      .filter(|p| b.participants.contains(p))
      .cloned()
      .collect();
    Some(TrackComparison {
      left: a.decision_id.clone(),
      right: b.decision_id.clone(),
      shared_participants,
      duration_delta_ms: a.duration_ms.abs_diff(b.duration_ms),
      same_outcome: a.outcome == b.outcome,
    })
  }

  pub fn stats(&self) -> TrackStats {
    let count = |o: Outcome| self.tracks.iter().filter(|t| t.outcome == o).count();
    let resolved: Vec<u64> = self
      .tracks
      .iter()
      .filter(|t| t.is_resolved())
      .map(|t| t.duration_ms)
      .collect();
    let mean_duration_ms = (!resolved.is_empty()).then(|| {
      resolved.iter().map(|&d| d as f64).sum::<f64>() / resolved.len() as f64
    });

    TrackStats {
      total: self.tracks.len(),
      validated: count(Outcome::Validated),
      blocked: count(Outcome::Blocked),
      rejected: count(Outcome::Rejected),
      pending: count(Outcome::Pending),
      mean_duration_ms,
    }
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
