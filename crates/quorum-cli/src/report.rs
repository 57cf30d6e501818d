//! Plain-text and JSON reports for the `analyze` and `tracks` subcommands.

use std::io::Write;

use anyhow::Result;
use quorum_core::{
  insight::{Insight, Insights},
  track::{DecisionTrack, DecisionTracks, TrackComparison},
  visual::{VisualHint, insight_to_visual_hint},
};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
  #[default]
  Text,
  Json,
}

// ─── Insights ────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct HintedInsight<'a> {
  #[serde(flatten)]
  insight: &'a Insight,
  hint:    VisualHint,
}

pub fn write_insights(
  out: &mut impl Write,
  insights: &Insights,
  format: Format,
) -> Result<()> {
  match format {
    Format::Json => {
      let hinted: Vec<HintedInsight> = insights
        .iter()
        .map(|insight| HintedInsight {
          insight,
          hint: insight_to_visual_hint(insight),
        })
        .collect();
      serde_json::to_writer_pretty(&mut *out, &hinted)?;
      writeln!(out)?;
    }
    Format::Text => {
      if insights.is_empty() {
        writeln!(out, "no insights")?;
        return Ok(());
      }
      for insight in insights {
        writeln!(
          out,
          "#{:<3} {:<8} {:>9}  {:<21} {}",
          insight.id,
          insight.severity,
          format_ms(insight.timestamp_ms),
          insight.kind,
          insight.description
        )?;
        writeln!(out, "      events: {}", insight.related_event_ids.join(", "))?;
      }
      writeln!(
        out,
        "{} insight(s), {} critical, {} high",
        insights.len(),
        insights.critical_count(),
        insights.high_count()
      )?;
    }
  }
  Ok(())
}

// ─── Tracks ──────────────────────────────────────────────────────────────────

fn track_line(track: &DecisionTrack) -> String {
  let resolved = track
    .resolved_at_ms
    .map(format_ms)
    .unwrap_or_else(|| "—".to_string());
  format!(
    "{:<16} {:<9} proposed {:>9}  resolved {:>9}  took {:>9}  {} event(s)",
    track.decision_id,
    track.outcome,
    format_ms(track.proposed_at_ms),
    resolved,
    format_ms(track.duration_ms),
    track.events.len()
  )
}

pub fn write_tracks(
  out: &mut impl Write,
  tracks: &DecisionTracks,
  format: Format,
) -> Result<()> {
  let stats = tracks.stats();
  match format {
    Format::Json => {
      let body = serde_json::json!({
        "tracks": tracks.all(),
        "stats": stats,
      });
      serde_json::to_writer_pretty(&mut *out, &body)?;
      writeln!(out)?;
    }
    Format::Text => {
      for track in tracks.all() {
        writeln!(out, "{}", track_line(track))?;
      }
      let mean = stats
        .mean_duration_ms
        .map(|m| format_ms(m.round() as u64))
        .unwrap_or_else(|| "—".to_string());
      writeln!(
        out,
        "{} track(s): {} validated, {} blocked, {} rejected, {} pending; mean {}",
        stats.total,
        stats.validated,
        stats.blocked,
        stats.rejected,
        stats.pending,
        mean
      )?;
    }
  }
  Ok(())
}

pub fn write_comparison(
  out: &mut impl Write,
  comparison: &TrackComparison,
  format: Format,
) -> Result<()> {
  match format {
    Format::Json => {
      serde_json::to_writer_pretty(&mut *out, comparison)?;
      writeln!(out)?;
    }
    Format::Text => {
      writeln!(out, "{} vs {}", comparison.left, comparison.right)?;
      let shared = if comparison.shared_participants.is_empty() {
        "none".to_string()
      } else {
        comparison.shared_participants.join(", ")
      };
      writeln!(out, "  shared participants: {shared}")?;
      writeln!(
        out,
        "  duration difference: {}",
        format_ms(comparison.duration_delta_ms)
      )?;
      writeln!(
        out,
        "  outcomes {}",
        if comparison.same_outcome { "match" } else { "differ" }
      )?;
    }
  }
  Ok(())
}

/// `83_450` → `1:23.450`.
pub fn format_ms(ms: u64) -> String {
  let minutes = ms / 60_000;
  let seconds = (ms % 60_000) / 1000;
  let millis = ms % 1000;
  format!("{minutes}:{seconds:02}.{millis:03}")
}

#[cfg(test)]
mod tests {
  use quorum_core::{
    analysis::{InsightAnalysisConfig, analyze},
    event::{Author, EventKind, TimelineEvent},
    timeline::EventTimeline,
  };

  use super::*;

  fn fixture() -> (DecisionTracks, Insights) {
    let timeline = EventTimeline::new(vec![
      TimelineEvent::new("p", 0, EventKind::DecisionProposed, Author::Coordinator)
        .with_decision("d1"),
      TimelineEvent::new("v", 500, EventKind::DecisionValidated, Author::Coordinator)
        .with_decision("d1"),
    ])
    .unwrap();
    let tracks = DecisionTracks::build(&timeline);
    let insights =
      analyze(&timeline, &tracks, &InsightAnalysisConfig::default());
    (tracks, insights)
  }

  #[test]
  fn formats_milliseconds() {
    assert_eq!(format_ms(0), "0:00.000");
    assert_eq!(format_ms(83_450), "1:23.450");
  }

  #[test]
  fn text_insight_report() {
    let (_, insights) = fixture();
    let mut out = Vec::new();
    write_insights(&mut out, &insights, Format::Text).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("validation_speed"), "{text}");
    assert!(text.contains("1 insight(s), 0 critical, 0 high"), "{text}");
  }

  #[test]
  fn json_insight_report_carries_hints() {
    let (_, insights) = fixture();
    let mut out = Vec::new();
    write_insights(&mut out, &insights, Format::Json).unwrap();
    let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(json[0]["kind"], "validation_speed");
    assert_eq!(json[0]["hint"]["accent"], "blue");
  }

  #[test]
  fn text_track_report() {
    let (tracks, _) = fixture();
    let mut out = Vec::new();
    write_tracks(&mut out, &tracks, Format::Text).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("d1"));
    assert!(text.contains("1 track(s): 1 validated"), "{text}");
    assert!(text.contains("mean 0:00.500"), "{text}");
  }
}
