//! Layered CLI configuration: optional TOML file, then `QUORUM_*` env vars.

use std::path::Path;

use anyhow::Context as _;
use quorum_core::{analysis::InsightAnalysisConfig, playback::PlaybackSpeed};
use serde::Deserialize;

/// Shape of `quorum.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
  pub analysis: InsightAnalysisConfig,
  pub replay:   ReplaySettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReplaySettings {
  /// Speed used when playback first starts.
  pub speed:             PlaybackSpeed,
  pub frame_interval_ms: u64,
  /// Step for `[` and `]`.
  pub skip_ms:           u64,
}

impl Default for ReplaySettings {
  fn default() -> Self {
    Self {
      speed:             PlaybackSpeed::Normal,
      frame_interval_ms: 16,
      skip_ms:           5000,
    }
  }
}

impl Settings {
  /// Read `path` if it exists, then overlay the environment.
  ///
  /// `QUORUM_ANALYSIS__DELAY_THRESHOLD_MS=8000` overrides
  /// `analysis.delay_threshold_ms`.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("QUORUM")
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true),
      )
      .build()
      .context("failed to read config")?;

    settings
      .try_deserialize()
      .context("failed to deserialise Settings")
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn missing_file_yields_defaults() {
    let settings =
      Settings::load(Path::new("/nonexistent/quorum-test.toml")).unwrap();
    assert_eq!(settings.analysis, InsightAnalysisConfig::default());
    assert_eq!(settings.replay.speed, PlaybackSpeed::Normal);
    assert_eq!(settings.replay.skip_ms, 5000);
  }
}
