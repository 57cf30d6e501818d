//! Insight records and queries over an analysis result.

use std::cmp::Reverse;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

// ─── Kind / severity ─────────────────────────────────────────────────────────

/// Which heuristic produced an insight.
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
pub enum InsightKind {
  Delay,
  Conflict,
  GuardDensity,
  HumanOverride,
  RapidSequence,
  ParticipantDominance,
  BlockedStreak,
  ValidationSpeed,
}

/// Ordered least to most severe, so `Ord` ranks `Critical` highest.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
  EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
  Info,
  Low,
  Medium,
  High,
  Critical,
}

// ─── Insight ─────────────────────────────────────────────────────────────────

/// An anomaly found by one heuristic pass, pointing back at the events that
/// triggered it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
  /// Sequential within one analysis run; 0 until numbered.
  pub id:                u32,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub decision_id:       Option<String>,
  pub kind:              InsightKind,
  pub severity:          Severity,
  pub description:       String,
  pub timestamp_ms:      u64,
  /// Never empty.
  pub related_event_ids: Vec<String>,
  #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
  pub metadata:          serde_json::Map<String, serde_json::Value>,
}

impl Insight {
  pub(crate) fn new(
    kind: InsightKind,
    severity: Severity,
    timestamp_ms: u64,
    description: String,
    related_event_ids: Vec<String>,
  ) -> Self {
    debug_assert!(!related_event_ids.is_empty());
    Self {
      id: 0,
      decision_id: None,
      kind,
      severity,
      description,
      timestamp_ms,
      related_event_ids,
      metadata: serde_json::Map::new(),
    }
  }

  pub(crate) fn with_decision(mut self, decision_id: Option<String>) -> Self {
    self.decision_id = decision_id;
    self
  }

  pub(crate) fn with_meta(
    mut self,
    key: &str,
    value: impl Into<serde_json::Value>,
  ) -> Self {
    self.metadata.insert(key.to_string(), value.into());
    self
  }
}

// ─── Result set ──────────────────────────────────────────────────────────────

/// The ranked output of one analysis run: most severe first, then earliest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Insights(Vec<Insight>);

impl Insights {
  /// Rank `insights` and number them from 1.
  pub fn ranked(mut insights: Vec<Insight>) -> Self {
    insights.sort_by_key(|i| (Reverse(i.severity), i.timestamp_ms));
    for (n, insight) in insights.iter_mut().enumerate() {
      insight.id = n as u32 + 1;
    }
    Self(insights)
  }

  pub fn as_slice(&self) -> &[Insight] { &self.0 }

  pub fn into_vec(self) -> Vec<Insight> { self.0 }

  pub fn iter(&self) -> std::slice::Iter<'_, Insight> { self.0.iter() }

  pub fn len(&self) -> usize { self.0.len() }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn by_kind(&self, kind: InsightKind) -> Vec<&Insight> {
    self.0.iter().filter(|i| i.kind == kind).collect()
  }

  pub fn by_severity(&self, severity: Severity) -> Vec<&Insight> {
    self.0.iter().filter(|i| i.severity == severity).collect()
  }

  /// Insights scoped to `decision_id`; empty for an unknown id.
  pub fn for_decision(&self, decision_id: &str) -> Vec<&Insight> {
    self
      .0
      .iter()
      .filter(|i| i.decision_id.as_deref() == Some(decision_id))
      .collect()
  }

  /// Insights the play-head has reached at `time_ms`.
  pub fn until(&self, time_ms: u64) -> Vec<&Insight> {
    self
      .0
      .iter()
      .filter(|i| i.timestamp_ms <= time_ms)
      .collect()
  }

  pub fn critical_count(&self) -> usize {
    self.by_severity(Severity::Critical).len()
  }

  pub fn high_count(&self) -> usize { self.by_severity(Severity::High).len() }
}

impl<'a> IntoIterator for &'a Insights {
  type Item = &'a Insight;
  type IntoIter = std::slice::Iter<'a, Insight>;

  fn into_iter(self) -> Self::IntoIter { self.0.iter() }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  fn insight(severity: Severity, ts: u64) -> Insight {
    Insight::new(
      InsightKind::Delay,
      severity,
      ts,
      String::from("x"),
      vec![format!("e{ts}")],
    )
  }

  #[test]
  fn ranked_by_severity_then_time() {
    let set = Insights::ranked(vec![
      insight(Severity::Info, 1),
      insight(Severity::High, 50),
      insight(Severity::Critical, 99),
      insight(Severity::High, 10),
      insight(Severity::Low, 0),
    ]);
    let order: Vec<_> =
      set.iter().map(|i| (i.severity, i.timestamp_ms)).collect();
    assert_eq!(order, [
      (Severity::Critical, 99),
      (Severity::High, 10),
      (Severity::High, 50),
      (Severity::Low, 0),
      (Severity::Info, 1),
    ]);
    let ids: Vec<_> = set.iter().map(|i| i.id).collect();
    assert_eq!(ids, [1, 2, 3, 4, 5]);
    assert_eq!(set.critical_count(), 1);
    assert_eq!(set.high_count(), 2);
  }

  #[test]
  fn decision_scope_and_until() {
    let set = Insights::ranked(vec![
      insight(Severity::Medium, 100).with_decision(Some("d1".into())),
      insight(Severity::Medium, 200),
    ]);
    assert_eq!(set.for_decision("d1").len(), 1);
    assert!(set.for_decision("unknown").is_empty());
    assert_eq!(set.until(150).len(), 1);
    assert_eq!(set.until(200).len(), 2);
  }

  #[test]
  fn severity_labels() {
    assert_eq!(Severity::Critical.to_string(), "critical");
    assert_eq!(InsightKind::BlockedStreak.to_string(), "blocked_streak");
    assert_eq!(
      serde_json::to_value(InsightKind::GuardDensity).unwrap(),
      serde_json::json!("guard_density")
    );
  }
}
