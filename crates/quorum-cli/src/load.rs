//! Decoding recorded sessions from disk.
//!
//! Accepts either a JSON array of events or JSON Lines (one event per line).

use std::path::Path;

use anyhow::{Context, Result};
use quorum_core::{event::TimelineEvent, timeline::EventTimeline};

/// Read, decode and validate the session at `path`.
pub fn load_timeline(path: &Path) -> Result<EventTimeline> {
  let raw = std::fs::read_to_string(path)
    .with_context(|| format!("reading session file {}", path.display()))?;
  let events = decode_events(&raw)
    .with_context(|| format!("decoding session file {}", path.display()))?;
  let timeline = EventTimeline::new(events)
    .with_context(|| format!("validating session file {}", path.display()))?;
  tracing::info!(
    path = %path.display(),
    events = timeline.len(),
    duration_ms = timeline.total_duration_ms(),
    "session loaded"
  );
  Ok(timeline)
}

/// Decode events from a JSON array or JSON Lines document.
pub fn decode_events(raw: &str) -> Result<Vec<TimelineEvent>> {
  let trimmed = raw.trim_start();
  if trimmed.is_empty() {
    return Ok(Vec::new());
  }
  if trimmed.starts_with('[') {
    return serde_json::from_str(trimmed).context("parsing JSON event array");
  }

  raw
    .lines()
    .enumerate()
    .filter(|(_, line)| !line.trim().is_empty())
    .map(|(n, line)| {
      serde_json::from_str(line)
        .with_context(|| format!("parsing event on line {}", n + 1))
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use quorum_core::event::EventKind;

  use super::*;

  #[test]
  fn decodes_array() {
    let raw = r#"[
      {"id": "a", "timestamp": 10, "kind": "statement", "author": "human"},
      {"id": "b", "timestamp": 0, "kind": "session_start", "author": "system"}
    ]"#;
    let events = decode_events(raw).unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[1].kind, EventKind::SessionStart);
  }

  #[test]
  fn decodes_json_lines_skipping_blanks() {
    let raw = concat!(
      "{\"id\":\"a\",\"timestamp\":0,\"kind\":\"decision_proposed\",",
      "\"author\":\"coordinator\",\"decisionId\":\"d1\"}\n",
      "\n",
      "{\"id\":\"b\",\"timestamp\":400,\"kind\":\"decision_validated\",",
      "\"author\":\"coordinator\",\"decisionId\":\"d1\"}\n",
    );
    let events = decode_events(raw).unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].decision_id.as_deref(), Some("d1"));
  }

  #[test]
  fn reports_bad_line_number() {
    let raw = "{\"id\":\"a\",\"timestamp\":0,\"kind\":\"statement\",\"author\":\"human\"}\n\
               {\"id\":\"b\",\"timestamp\":-5,\"kind\":\"statement\",\"author\":\"human\"}\n";
    let err = decode_events(raw).unwrap_err();
    assert!(format!("{err:#}").contains("line 2"), "{err:#}");
  }

  #[test]
  fn empty_input_is_empty_session() {
    assert!(decode_events("  \n").unwrap().is_empty());
  }
}
