//! Heuristic insight analysis.
//!
//! Each detector is an independent pass over the timeline (and, for some, the
//! decision tracks). Passes never read each other's output; [`analyze`]
//! concatenates them and ranks the result. Analysis is pure and may be re-run
//! at any time against the same inputs.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
  event::{EventKind, TimelineEvent},
  insight::{Insight, InsightKind, Insights, Severity},
  timeline::EventTimeline,
  track::DecisionTracks,
};

// ─── Config ──────────────────────────────────────────────────────────────────

/// Detector thresholds. Any subset may be supplied; the rest default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightAnalysisConfig {
  /// Guard triggers above this count are reported.
  pub guard_density_threshold:  usize,
  /// Above this count the guard density insight is high severity.
  pub guard_density_high:       usize,
  /// Resolved decisions slower than this are reported.
  pub delay_threshold_ms:       u64,
  /// Above this the delay insight is high severity.
  pub delay_high_ms:            u64,
  /// Adjacent statements closer than this are a rapid sequence.
  pub rapid_sequence_window_ms: u64,
  /// Share of participant statements above which one participant dominates.
  pub dominance_share:          f64,
  /// Shortest blocked streak worth reporting.
  pub blocked_streak_min:       usize,
  /// Streaks at least this long are high severity.
  pub blocked_streak_high:      usize,
  /// Max gap between human input and the decision it overrode.
  pub human_override_window_ms: u64,
  /// Max proposal → validation gap counted as suspiciously fast.
  pub fast_validation_ms:       u64,
}

impl Default for InsightAnalysisConfig {
  fn default() -> Self {
    Self {
      guard_density_threshold:  3,
      guard_density_high:       5,
      delay_threshold_ms:       5000,
      delay_high_ms:            10_000,
      rapid_sequence_window_ms: 1000,
      dominance_share:          0.5,
      blocked_streak_min:       2,
      blocked_streak_high:      3,
      human_override_window_ms: 2000,
      fast_validation_ms:       1000,
    }
  }
}

// ─── Entry points ────────────────────────────────────────────────────────────

/// Signature shared by every detector pass.
pub type Detector =
  fn(&EventTimeline, &DecisionTracks, &InsightAnalysisConfig) -> Vec<Insight>;

/// Every detector, in the order their output is concatenated.
pub const DETECTORS: [(&str, Detector); 7] = [
  ("guard_density", guard_density),
  ("decision_delay", decision_delay),
  ("rapid_sequence", rapid_sequence),
  ("participant_dominance", participant_dominance),
  ("blocked_streak", blocked_streak),
  ("human_override", human_override),
  ("fast_validation", fast_validation),
];

/// Run every detector and rank the combined output.
pub fn analyze(
  timeline: &EventTimeline,
  tracks: &DecisionTracks,
  config: &InsightAnalysisConfig,
) -> Insights {
  let mut all = Vec::new();
  for (name, detector) in DETECTORS {
    let found = detector(timeline, tracks, config);
    tracing::trace!(detector = name, found = found.len(), "detector pass");
    all.extend(found);
  }
  let insights = Insights::ranked(all);
  tracing::debug!(
    insights = insights.len(),
    high = insights.high_count(),
    "analysis complete"
  );
  insights
}

/// [`analyze`], keeping only insights tied to `decision_id`.
pub fn analyze_decision(
  timeline: &EventTimeline,
  tracks: &DecisionTracks,
  config: &InsightAnalysisConfig,
  decision_id: &str,
) -> Insights {
  let scoped = analyze(timeline, tracks, config)
    .into_vec()
    .into_iter()
    .filter(|i| i.decision_id.as_deref() == Some(decision_id))
    .collect();
  Insights::ranked(scoped)
}

fn ids<'a>(events: impl IntoIterator<Item = &'a TimelineEvent>) -> Vec<String> {
  events.into_iter().map(|e| e.id.clone()).collect()
}

// ─── Detectors ───────────────────────────────────────────────────────────────

/// One insight when guard triggers exceed the density threshold.
pub fn guard_density(
  timeline: &EventTimeline,
  _tracks: &DecisionTracks,
  config: &InsightAnalysisConfig,
) -> Vec<Insight> {
  let guards: Vec<&TimelineEvent> = timeline
    .events()
    .iter()
    .filter(|e| e.kind == EventKind::GuardTriggered)
    .collect();
  if guards.len() <= config.guard_density_threshold {
    return vec![];
  }

  let severity = if guards.len() > config.guard_density_high {
    Severity::High
  } else {
    Severity::Medium
  };
  let insight = Insight::new(
    InsightKind::GuardDensity,
    severity,
    guards[0].timestamp,
    format!("{} guard triggers during the session", guards.len()),
    ids(guards.iter().copied()),
  )
  .with_meta("count", guards.len());
  vec![insight]
}

/// One insight per resolved decision slower than the delay threshold.
pub fn decision_delay(
  _timeline: &EventTimeline,
  tracks: &DecisionTracks,
  config: &InsightAnalysisConfig,
) -> Vec<Insight> {
  tracks
    .all()
    .iter()
    .filter(|t| t.is_resolved() && t.duration_ms > config.delay_threshold_ms)
    .map(|t| {
      let related: Vec<String> = t
        .proposal_event_id
        .iter()
        .chain(t.resolution_event_id.iter())
        .cloned()
        .collect();
      let severity = if t.duration_ms > config.delay_high_ms {
        Severity::High
      } else {
        Severity::Medium
      };
      Insight::new(
        InsightKind::Delay,
        severity,
        t.proposed_at_ms,
        format!(
          "decision {} took {}ms to resolve ({})",
          t.decision_id, t.duration_ms, t.outcome
        ),
        related,
      )
      .with_decision(Some(t.decision_id.clone()))
      .with_meta("duration_ms", t.duration_ms)
    })
    .collect()
}

/// One insight per adjacent pair of statements closer than the window.
/// Overlapping pairs are each reported.
pub fn rapid_sequence(
  timeline: &EventTimeline,
  _tracks: &DecisionTracks,
  config: &InsightAnalysisConfig,
) -> Vec<Insight> {
  timeline
    .events()
    .windows(2)
    .filter_map(|pair| {
      let [a, b] = pair else { return None };
      if a.kind != EventKind::Statement || b.kind != EventKind::Statement {
        return None;
      }
      let gap = b.timestamp - a.timestamp;
      if gap >= config.rapid_sequence_window_ms {
        return None;
      }
      let insight = Insight::new(
        InsightKind::RapidSequence,
        Severity::Low,
        a.timestamp,
        format!(
          "{} and {} spoke {gap}ms apart",
          a.author_label(),
          b.author_label()
        ),
        ids([a, b]),
      )
      .with_meta("gap_ms", gap);
      Some(insight)
    })
    .collect()
}

/// One insight per participant holding more than the dominance share of all
/// participant statements.
pub fn participant_dominance(
  timeline: &EventTimeline,
  _tracks: &DecisionTracks,
  config: &InsightAnalysisConfig,
) -> Vec<Insight> {
  let mut order: Vec<&str> = Vec::new();
  let mut by_participant: HashMap<&str, Vec<&TimelineEvent>> = HashMap::new();
  for event in timeline.events() {
    if event.kind != EventKind::Statement {
      continue;
    }
    let Some(participant) = event.participant() else {
      continue;
    };
    by_participant
      .entry(participant)
      .or_insert_with(|| {
        order.push(participant);
        Vec::new()
      })
      .push(event);
  }

  let total: usize = by_participant.values().map(Vec::len).sum();
  if total == 0 {
    return vec![];
  }

  order
    .into_iter()
    .filter_map(|participant| {
      let statements = by_participant.get(participant)?;
      let share = statements.len() as f64 / total as f64;
      if share <= config.dominance_share {
        return None;
      }
      let label = statements[0].author_label();
      let insight = Insight::new(
        InsightKind::ParticipantDominance,
        Severity::Info,
        statements[0].timestamp,
        format!(
          "{label} made {:.0}% of participant statements ({} of {total})",
          share * 100.0,
          statements.len()
        ),
        ids(statements.iter().copied()),
      )
      .with_meta("participant_id", participant)
      .with_meta("share", share)
      .with_meta("count", statements.len());
      Some(insight)
    })
    .collect()
}

/// Consecutive blocked decisions that end with a validation.
///
/// A streak still open when the timeline ends is not reported.
pub fn blocked_streak(
  timeline: &EventTimeline,
  _tracks: &DecisionTracks,
  config: &InsightAnalysisConfig,
) -> Vec<Insight> {
  let mut insights = Vec::new();
  let mut streak: Vec<&TimelineEvent> = Vec::new();

  for event in timeline.events() {
    match event.kind {
      EventKind::DecisionBlocked => streak.push(event),
      EventKind::DecisionValidated => {
        if !streak.is_empty() && streak.len() >= config.blocked_streak_min {
          let severity = if streak.len() >= config.blocked_streak_high {
            Severity::High
          } else {
            Severity::Medium
          };
          insights.push(
            Insight::new(
              InsightKind::BlockedStreak,
              severity,
              streak[0].timestamp,
              format!(
                "{} decisions blocked in a row before {} was validated",
                streak.len(),
                event.decision_id.as_deref().unwrap_or("a decision")
              ),
              ids(streak.iter().copied()),
            )
            .with_meta("length", streak.len()),
          );
        }
        streak.clear();
      }
      _ => {}
    }
  }

  if !streak.is_empty() {
    tracing::trace!(open = streak.len(), "blocked streak left open at end");
  }
  insights
}

/// Human input immediately followed by a decision being validated or rejected.
pub fn human_override(
  timeline: &EventTimeline,
  _tracks: &DecisionTracks,
  config: &InsightAnalysisConfig,
) -> Vec<Insight> {
  timeline
    .events()
    .windows(2)
    .filter_map(|pair| {
      let [input, decision] = pair else { return None };
      if input.kind != EventKind::HumanInput
        || !matches!(
          decision.kind,
          EventKind::DecisionValidated | EventKind::DecisionRejected
        )
      {
        return None;
      }
      let gap = decision.timestamp - input.timestamp;
      if gap > config.human_override_window_ms {
        return None;
      }
      let verb = match decision.kind {
        EventKind::DecisionValidated => "validated",
        _ => "rejected",
      };
      let insight = Insight::new(
        InsightKind::HumanOverride,
        Severity::Info,
        input.timestamp,
        format!("decision {verb} {gap}ms after human input"),
        ids([input, decision]),
      )
      .with_decision(decision.decision_id.clone())
      .with_meta("gap_ms", gap);
      Some(insight)
    })
    .collect()
}

/// A single insight listing every proposal validated within the fast window.
pub fn fast_validation(
  _timeline: &EventTimeline,
  tracks: &DecisionTracks,
  config: &InsightAnalysisConfig,
) -> Vec<Insight> {
  let mut fast: Vec<&TimelineEvent> = Vec::new();
  for track in tracks.all() {
    for proposal in track
      .events
      .iter()
      .filter(|e| e.kind == EventKind::DecisionProposed)
    {
      let validated = track.events.iter().find(|e| {
        e.kind == EventKind::DecisionValidated
          && e.timestamp >= proposal.timestamp
      });
      if let Some(validated) = validated
        && validated.timestamp - proposal.timestamp <= config.fast_validation_ms
      {
        fast.push(proposal);
      }
    }
  }

  let Some(first) = fast.iter().min_by_key(|e| e.timestamp) else {
    return vec![];
  };
  let insight = Insight::new(
    InsightKind::ValidationSpeed,
    Severity::Info,
    first.timestamp,
    format!(
      "{} decision(s) validated within {}ms of being proposed",
      fast.len(),
      config.fast_validation_ms
    ),
    ids(fast.iter().copied()),
  )
  .with_meta("count", fast.len());
  vec![insight]
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;
  use crate::event::Author;

  fn ev(id: &str, ts: u64, kind: EventKind) -> TimelineEvent {
    TimelineEvent::new(id, ts, kind, Author::System)
  }

  fn run(events: Vec<TimelineEvent>) -> Insights {
    run_with(events, &InsightAnalysisConfig::default())
  }

  fn run_with(
    events: Vec<TimelineEvent>,
    config: &InsightAnalysisConfig,
  ) -> Insights {
    let timeline = EventTimeline::new(events).unwrap();
    let tracks = DecisionTracks::build(&timeline);
    analyze(&timeline, &tracks, config)
  }

  fn kinds(insights: &Insights) -> Vec<InsightKind> {
    insights.iter().map(|i| i.kind).collect()
  }

  #[test]
  fn empty_timeline_has_no_insights() {
    assert!(run(vec![]).is_empty());
  }

  #[test]
  fn single_fast_validation() {
    let insights = run(vec![
      ev("p", 0, EventKind::DecisionProposed).with_decision("d1"),
      ev("v", 500, EventKind::DecisionValidated).with_decision("d1"),
    ]);
    assert_eq!(kinds(&insights), [InsightKind::ValidationSpeed]);
    let only = &insights.as_slice()[0];
    assert_eq!(only.severity, Severity::Info);
    assert_eq!(only.related_event_ids, ["p"]);
  }

  #[test]
  fn blocked_streak_of_three_is_high() {
    let insights = run(vec![
      ev("b1", 0, EventKind::DecisionBlocked).with_decision("d1"),
      ev("b2", 100, EventKind::DecisionBlocked).with_decision("d2"),
      ev("b3", 200, EventKind::DecisionBlocked).with_decision("d3"),
      ev("v", 300, EventKind::DecisionValidated).with_decision("d4"),
    ]);
    let streaks = insights.by_kind(InsightKind::BlockedStreak);
    assert_eq!(streaks.len(), 1);
    assert_eq!(streaks[0].severity, Severity::High);
    assert_eq!(streaks[0].related_event_ids, ["b1", "b2", "b3"]);
  }

  #[test]
  fn blocked_streak_of_two_is_medium() {
    let insights = run(vec![
      ev("b1", 0, EventKind::DecisionBlocked),
      ev("s", 50, EventKind::Statement),
      ev("b2", 100, EventKind::DecisionBlocked),
      ev("v", 300, EventKind::DecisionValidated),
    ]);
    let streaks = insights.by_kind(InsightKind::BlockedStreak);
    assert_eq!(streaks.len(), 1);
    assert_eq!(streaks[0].severity, Severity::Medium);
  }

  #[test]
  fn open_or_short_streaks_are_silent() {
    let open = run(vec![
      ev("b1", 0, EventKind::DecisionBlocked),
      ev("b2", 100, EventKind::DecisionBlocked),
      ev("b3", 200, EventKind::DecisionBlocked),
    ]);
    assert!(open.by_kind(InsightKind::BlockedStreak).is_empty());

    let short = run(vec![
      ev("b1", 0, EventKind::DecisionBlocked),
      ev("v", 100, EventKind::DecisionValidated),
    ]);
    assert!(short.by_kind(InsightKind::BlockedStreak).is_empty());
  }

  #[test]
  fn guard_density_medium_at_four() {
    let events = (0..4)
      .map(|i| ev(&format!("g{i}"), i * 1000, EventKind::GuardTriggered))
      .collect();
    let insights = run(events);
    let guards = insights.by_kind(InsightKind::GuardDensity);
    assert_eq!(guards.len(), 1);
    assert_eq!(guards[0].severity, Severity::Medium);
    assert_eq!(guards[0].related_event_ids.len(), 4);
  }

  #[test]
  fn guard_density_thresholds() {
    let guards = |n: u64| -> Vec<TimelineEvent> {
      (0..n)
        .map(|i| ev(&format!("g{i}"), i * 10, EventKind::GuardTriggered))
        .collect()
    };
    assert!(run(guards(3)).is_empty());
    let six = run(guards(6));
    assert_eq!(six.by_kind(InsightKind::GuardDensity)[0].severity, Severity::High);
  }

  #[test]
  fn decision_delay_severity() {
    let insights = run(vec![
      ev("p1", 0, EventKind::DecisionProposed).with_decision("slow"),
      ev("v1", 6000, EventKind::DecisionValidated).with_decision("slow"),
      ev("p2", 100, EventKind::DecisionProposed).with_decision("slower"),
      ev("r2", 20_100, EventKind::DecisionRejected).with_decision("slower"),
    ]);
    let delays = insights.by_kind(InsightKind::Delay);
    assert_eq!(delays.len(), 2);
    // High sorts first.
    assert_eq!(delays[0].decision_id.as_deref(), Some("slower"));
    assert_eq!(delays[0].severity, Severity::High);
    assert_eq!(delays[1].severity, Severity::Medium);
    assert_eq!(delays[1].related_event_ids, ["p1", "v1"]);
  }

  #[test]
  fn rapid_sequence_fires_per_pair() {
    let insights = run(vec![
      ev("s1", 0, EventKind::Statement),
      ev("s2", 400, EventKind::Statement),
      ev("s3", 800, EventKind::Statement),
      ev("s4", 5000, EventKind::Statement),
    ]);
    let rapid = insights.by_kind(InsightKind::RapidSequence);
    assert_eq!(rapid.len(), 2);
    assert!(rapid.iter().all(|i| i.severity == Severity::Low));
  }

  #[test]
  fn rapid_sequence_window_is_exclusive() {
    let at_window = run(vec![
      ev("s1", 0, EventKind::Statement),
      ev("s2", 1000, EventKind::Statement),
    ]);
    assert!(at_window.by_kind(InsightKind::RapidSequence).is_empty());

    let inside = run(vec![
      ev("s1", 0, EventKind::Statement),
      ev("s2", 999, EventKind::Statement),
    ]);
    assert_eq!(inside.by_kind(InsightKind::RapidSequence).len(), 1);
  }

  #[test]
  fn rapid_sequence_needs_adjacent_statements() {
    let insights = run(vec![
      ev("s1", 0, EventKind::Statement),
      ev("a", 100, EventKind::Analysis),
      ev("s2", 200, EventKind::Statement),
    ]);
    assert!(insights.by_kind(InsightKind::RapidSequence).is_empty());
  }

  #[test]
  fn participant_dominance_over_half() {
    let say = |id: &str, ts: u64, who: &str| {
      ev(id, ts, EventKind::Statement).with_participant(who, None)
    };
    let insights = run(vec![
      say("1", 0, "alpha"),
      say("2", 2000, "alpha"),
      say("3", 4000, "beta"),
      say("4", 6000, "gamma"),
      say("5", 8000, "alpha"),
    ]);
    let dominant = insights.by_kind(InsightKind::ParticipantDominance);
    assert_eq!(dominant.len(), 1);
    assert_eq!(
      dominant[0].metadata.get("participant_id"),
      Some(&serde_json::json!("alpha"))
    );

    // Exactly half is not dominance.
    let even = run(vec![say("1", 0, "alpha"), say("2", 2000, "beta")]);
    assert!(even.by_kind(InsightKind::ParticipantDominance).is_empty());
  }

  #[test]
  fn human_override_within_window() {
    let insights = run(vec![
      ev("h1", 0, EventKind::HumanInput),
      ev("v1", 1500, EventKind::DecisionValidated).with_decision("d1"),
      ev("h2", 10_000, EventKind::HumanInput),
      ev("r2", 13_000, EventKind::DecisionRejected).with_decision("d2"),
    ]);
    let overrides = insights.by_kind(InsightKind::HumanOverride);
    assert_eq!(overrides.len(), 1);
    assert_eq!(overrides[0].related_event_ids, ["h1", "v1"]);
    assert_eq!(overrides[0].decision_id.as_deref(), Some("d1"));
  }

  #[test]
  fn human_override_window_is_inclusive() {
    let at_window = run(vec![
      ev("h", 0, EventKind::HumanInput),
      ev("v", 2000, EventKind::DecisionValidated).with_decision("d1"),
    ]);
    assert_eq!(at_window.by_kind(InsightKind::HumanOverride).len(), 1);

    let outside = run(vec![
      ev("h", 0, EventKind::HumanInput),
      ev("v", 2001, EventKind::DecisionValidated).with_decision("d1"),
    ]);
    assert!(outside.by_kind(InsightKind::HumanOverride).is_empty());
  }

  #[test]
  fn fast_validation_window_is_inclusive() {
    let at_window = run(vec![
      ev("p", 0, EventKind::DecisionProposed).with_decision("d1"),
      ev("v", 1000, EventKind::DecisionValidated).with_decision("d1"),
    ]);
    assert_eq!(kinds(&at_window), [InsightKind::ValidationSpeed]);

    let outside = run(vec![
      ev("p", 0, EventKind::DecisionProposed).with_decision("d1"),
      ev("v", 1001, EventKind::DecisionValidated).with_decision("d1"),
    ]);
    assert!(outside.is_empty());
  }

  #[test]
  fn guard_density_silent_at_threshold() {
    let insights = run(vec![
      ev("s", 0, EventKind::SessionStart),
      ev("g1", 100, EventKind::GuardTriggered),
      ev("a", 200, EventKind::Analysis),
      ev("g2", 300, EventKind::GuardTriggered),
      ev("x", 400, EventKind::GuardViolation),
      ev("g3", 500, EventKind::GuardTriggered),
      ev("e", 600, EventKind::SessionEnd),
    ]);
    assert!(insights.by_kind(InsightKind::GuardDensity).is_empty());
  }

  #[test]
  fn decision_delay_threshold_is_exclusive() {
    let at_threshold = run(vec![
      ev("p", 0, EventKind::DecisionProposed).with_decision("d1"),
      ev("v", 5000, EventKind::DecisionValidated).with_decision("d1"),
    ]);
    assert!(at_threshold.by_kind(InsightKind::Delay).is_empty());

    let over = run(vec![
      ev("p", 0, EventKind::DecisionProposed).with_decision("d1"),
      ev("v", 5001, EventKind::DecisionValidated).with_decision("d1"),
    ]);
    let delays = over.by_kind(InsightKind::Delay);
    assert_eq!(delays.len(), 1);
    assert_eq!(delays[0].severity, Severity::Medium);
  }

  #[test]
  fn config_overrides_apply() {
    let config = InsightAnalysisConfig {
      guard_density_threshold: 0,
      ..Default::default()
    };
    let insights = run_with(vec![ev("g", 0, EventKind::GuardTriggered)], &config);
    assert_eq!(insights.len(), 1);

    let partial: InsightAnalysisConfig =
      serde_json::from_value(serde_json::json!({ "delay_threshold_ms": 10 }))
        .unwrap();
    assert_eq!(partial.delay_threshold_ms, 10);
    assert_eq!(partial.fast_validation_ms, 1000);
  }

  #[test]
  fn analysis_is_idempotent() {
    let events = vec![
      ev("g1", 0, EventKind::GuardTriggered),
      ev("g2", 10, EventKind::GuardTriggered),
      ev("g3", 20, EventKind::GuardTriggered),
      ev("g4", 30, EventKind::GuardTriggered),
      ev("s1", 40, EventKind::Statement),
      ev("s2", 50, EventKind::Statement),
      ev("p", 60, EventKind::DecisionProposed).with_decision("d"),
      ev("v", 9000, EventKind::DecisionValidated).with_decision("d"),
    ];
    let timeline = EventTimeline::new(events).unwrap();
    let tracks = DecisionTracks::build(&timeline);
    let config = InsightAnalysisConfig::default();
    let first = analyze(&timeline, &tracks, &config);
    let second = analyze(&timeline, &tracks, &config);
    assert_eq!(first, second);
    assert_eq!(kinds(&first), [
      InsightKind::GuardDensity,
      InsightKind::Delay,
      InsightKind::RapidSequence,
    ]);
  }

  #[test]
  fn scoped_analysis() {
    let events = vec![
      ev("p", 0, EventKind::DecisionProposed).with_decision("d1"),
      ev("v", 6000, EventKind::DecisionValidated).with_decision("d1"),
    ];
    let timeline = EventTimeline::new(events).unwrap();
    let tracks = DecisionTracks::build(&timeline);
    let config = InsightAnalysisConfig::default();
    let scoped = analyze_decision(&timeline, &tracks, &config, "d1");
    assert_eq!(kinds(&scoped), [InsightKind::Delay]);
    assert!(analyze_decision(&timeline, &tracks, &config, "zz").is_empty());
  }
}
