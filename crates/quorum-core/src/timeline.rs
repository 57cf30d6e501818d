//! The event timeline — an immutable, time-sorted view of a recording.
//!
//! Constructed once from an unordered list of events. There are no mutation
//! methods; share it behind an `Arc` between any number of readers.

use std::collections::HashMap;

use crate::{
  Error, Result,
  event::{Author, TimelineEvent},
};

/// A validated, stably sorted sequence of [`TimelineEvent`]s.
#[derive(Debug, Clone, Default)]
pub struct EventTimeline {
  events:            Vec<TimelineEvent>,
  by_id:             HashMap<String, usize>,
  total_duration_ms: u64,
}

impl EventTimeline {
  /// Validate and sort `events` by timestamp. Ties keep their input order.
  ///
  /// Fails on an empty or duplicate event id, or on an event whose end time
  /// does not fit in a `u64`.
  pub fn new(mut events: Vec<TimelineEvent>) -> Result<Self> {
    let mut total_duration_ms = 0;
    for event in &events {
      if event.id.is_empty() {
        return Err(Error::EmptyEventId);
      }
      let end = event.end_ms().ok_or_else(|| Error::TimestampOverflow {
        id: event.id.clone(),
      })?;
      total_duration_ms = total_duration_ms.max(end);
      if event.author != Author::Participant
        && event.participant_id.is_some()
      {
        tracing::warn!(
          event = %event.id,
          "participant id on a non-participant event is ignored"
        );
      }
    }

    // `sort_by_key` is stable.
    events.sort_by_key(|e| e.timestamp);

    let mut by_id = HashMap::with_capacity(events.len());
    for (index, event) in events.iter().enumerate() {
      if by_id.insert(event.id.clone(), index).is_some() {
        return Err(Error::DuplicateEventId(event.id.clone()));
      }
    }

    tracing::debug!(
      events = events.len(),
      total_duration_ms,
      "timeline loaded"
    );

    Ok(Self {
      events,
      by_id,
      total_duration_ms,
    })
  }

  /// Build from a borrowed list, leaving the caller's copy untouched.
  pub fn from_slice(events: &[TimelineEvent]) -> Result<Self> {
    Self::new(events.to_vec())
  }

  /// All events in timeline order.
  pub fn events(&self) -> &[TimelineEvent] { &self.events }

  pub fn len(&self) -> usize { self.events.len() }

  pub fn is_empty(&self) -> bool { self.events.is_empty() }

  pub fn get(&self, index: usize) -> Option<&TimelineEvent> {
    self.events.get(index)
  }

  /// Index of the event with the given id.
  pub fn find(&self, id: &str) -> Option<usize> {
    self.by_id.get(id).copied()
  }

  /// `max(timestamp + duration)` over all events; 0 when empty.
  pub fn total_duration_ms(&self) -> u64 { self.total_duration_ms }

  /// Events with `start_ms <= timestamp <= end_ms`.
  pub fn range(&self, start_ms: u64, end_ms: u64) -> &[TimelineEvent] {
    if start_ms > end_ms {
      return &[];
    }
    let lo = self.events.partition_point(|e| e.timestamp < start_ms);
    let hi = self.events.partition_point(|e| e.timestamp <= end_ms);
    &self.events[lo..hi]
  }

  /// Every event that has happened as of `time_ms`.
  pub fn active_at(&self, time_ms: u64) -> &[TimelineEvent] {
    let hi = self.events.partition_point(|e| e.timestamp <= time_ms);
    &self.events[..hi]
  }

  /// Index of the last event with `timestamp <= time_ms`.
  pub fn index_at(&self, time_ms: u64) -> Option<usize> {
    self
      .events
      .partition_point(|e| e.timestamp <= time_ms)
      .checked_sub(1)
  }

  /// Distinct automated participants, in order of first appearance.
  pub fn participants(&self) -> Vec<&str> {
    let mut seen: Vec<&str> = Vec::new();
    for id in self.events.iter().filter_map(TimelineEvent::participant) {
      if !seen.contains(&id) {
        seen.push(id);
      }
    }
    seen
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
