//! Run configuration (`SessionConfig.json`).
//!
//! ```json
//! {
//!   "macros": ["macro_A", "macro_B"],
//!   "ci": { "minimum_score": 0.8 },
//!   "loop_guard": { "N": 3, "epsilon": 0.02 },
//!   "retry": { "max_attempts": 3, "circuit_threshold": 5 }
//! }
//! ```
//!
//! Every section is optional and falls back to the defaults shown above.
//! Unknown keys are ignored so older session files keep loading.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Quality gate settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
  #[serde(default = "ScoringConfig::default_minimum_score")]
  pub minimum_score: f64,
}

impl ScoringConfig {
  fn default_minimum_score() -> f64 {
    0.8
  }
}

impl Default for ScoringConfig {
  fn default() -> Self {
    Self {
      minimum_score: Self::default_minimum_score(),
    }
  }
}

/// Loop detection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopGuardConfig {
  /// Number of consecutive builds with the same macro that count as a loop.
  #[serde(rename = "N", default = "LoopGuardConfig::default_window_size")]
  pub window_size: usize,
  /// Minimum score improvement between builds that counts as progress.
  #[serde(default = "LoopGuardConfig::default_epsilon")]
  pub epsilon: f64,
}

impl LoopGuardConfig {
  fn default_window_size() -> usize {
    3
  }

  fn default_epsilon() -> f64 {
    0.02
  }
}

impl Default for LoopGuardConfig {
  fn default() -> Self {
    Self {
      window_size: Self::default_window_size(),
      epsilon: Self::default_epsilon(),
    }
  }
}

/// Retry and circuit breaker settings for node execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
  #[serde(default = "RetryConfig::default_max_attempts")]
  pub max_attempts: u32,
  #[serde(default = "RetryConfig::default_circuit_threshold")]
  pub circuit_threshold: u32,
  /// Delay before the second attempt; doubles for every further attempt.
  #[serde(default = "RetryConfig::default_base_delay_ms")]
  pub base_delay_ms: u64,
}

impl RetryConfig {
  fn default_max_attempts() -> u32 {
    3
  }

  fn default_circuit_threshold() -> u32 {
    5
  }

  fn default_base_delay_ms() -> u64 {
    1000
  }

  /// Backoff to wait after the given failed attempt (0-based).
  pub fn backoff(&self, attempt: u32) -> Duration {
    let factor = 2u64.saturating_pow(attempt);
    Duration::from_millis(self.base_delay_ms.saturating_mul(factor))
  }
}

impl Default for RetryConfig {
  fn default() -> Self {
    Self {
      max_attempts: Self::default_max_attempts(),
      circuit_threshold: Self::default_circuit_threshold(),
      base_delay_ms: Self::default_base_delay_ms(),
    }
  }
}

/// Configuration for a single orchestrated run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RunConfig {
  /// Candidate strategies, in selection order.
  #[serde(default)]
  pub macros: Vec<String>,
  #[serde(rename = "ci", default)]
  pub scoring: ScoringConfig,
  #[serde(default)]
  pub loop_guard: LoopGuardConfig,
  #[serde(default)]
  pub retry: RetryConfig,
}

impl RunConfig {
  /// Parse and validate a run configuration from JSON.
  pub fn from_json(content: &str) -> Result<Self, ConfigError> {
    let config: RunConfig =
      serde_json::from_str(content).map_err(|source| ConfigError::Parse {
        document: "run configuration",
        source,
      })?;
    config.validate()
  }

  /// Check value ranges and drop duplicate macros (first occurrence wins).
  pub fn validate(mut self) -> Result<Self, ConfigError> {
    let minimum_score = self.scoring.minimum_score;
    if !(0.0..=1.0).contains(&minimum_score) {
      return Err(ConfigError::OutOfRange {
        field: "ci.minimum_score",
        value: minimum_score.to_string(),
        reason: "must be within [0, 1]",
      });
    }

    if self.loop_guard.window_size < 1 {
      return Err(ConfigError::OutOfRange {
        field: "loop_guard.N",
        value: self.loop_guard.window_size.to_string(),
        reason: "must be at least 1",
      });
    }

    let epsilon = self.loop_guard.epsilon;
    if !epsilon.is_finite() || epsilon < 0.0 {
      return Err(ConfigError::OutOfRange {
        field: "loop_guard.epsilon",
        value: epsilon.to_string(),
        reason: "must be a non-negative number",
      });
    }

    if self.retry.max_attempts < 1 {
      return Err(ConfigError::OutOfRange {
        field: "retry.max_attempts",
        value: self.retry.max_attempts.to_string(),
        reason: "must be at least 1",
      });
    }

    if self.retry.circuit_threshold < 1 {
      return Err(ConfigError::OutOfRange {
        field: "retry.circuit_threshold",
        value: self.retry.circuit_threshold.to_string(),
        reason: "must be at least 1",
      });
    }

    if self.macros.iter().any(|m| m.trim().is_empty()) {
      return Err(ConfigError::EmptyMacroName);
    }

    let mut seen = Vec::with_capacity(self.macros.len());
    for name in self.macros.drain(..) {
      if seen.contains(&name) {
        tracing::warn!(macro_name = %name, "duplicate_macro_dropped");
        continue;
      }
      seen.push(name);
    }
    self.macros = seen;

    Ok(self)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_defaults_when_sections_missing() {
    let config = RunConfig::from_json(r#"{"macros": ["a"]}"#).unwrap();
    assert_eq!(config.macros, vec!["a".to_string()]);
    assert_eq!(config.scoring.minimum_score, 0.8);
    assert_eq!(config.loop_guard.window_size, 3);
    assert_eq!(config.loop_guard.epsilon, 0.02);
    assert_eq!(config.retry.max_attempts, 3);
    assert_eq!(config.retry.circuit_threshold, 5);
    assert_eq!(config.retry.base_delay_ms, 1000);
  }

  #[test]
  fn test_parse_full_document() {
    let config = RunConfig::from_json(
      r#"{
        "macros": ["macro_A", "macro_B"],
        "selector": {"algorithm": "bandit_ts"},
        "ci": {"minimum_score": 0.75},
        "loop_guard": {"enabled": true, "N": 4, "epsilon": 0.05},
        "retry": {"max_attempts": 2, "circuit_threshold": 6, "base_delay_ms": 10}
      }"#,
    )
    .unwrap();

    assert_eq!(config.scoring.minimum_score, 0.75);
    assert_eq!(config.loop_guard.window_size, 4);
    assert_eq!(config.loop_guard.epsilon, 0.05);
    assert_eq!(config.retry.max_attempts, 2);
    assert_eq!(config.retry.circuit_threshold, 6);
    assert_eq!(config.retry.base_delay_ms, 10);
  }

  #[test]
  fn test_duplicate_macros_are_dropped() {
    let config = RunConfig::from_json(r#"{"macros": ["a", "b", "a", "c", "b"]}"#).unwrap();
    assert_eq!(config.macros, vec!["a", "b", "c"]);
  }

  #[test]
  fn test_rejects_out_of_range_values() {
    let cases = [
      r#"{"ci": {"minimum_score": 1.5}}"#,
      r#"{"loop_guard": {"N": 0}}"#,
      r#"{"loop_guard": {"epsilon": -0.1}}"#,
      r#"{"retry": {"max_attempts": 0}}"#,
      r#"{"retry": {"circuit_threshold": 0}}"#,
    ];
    for case in cases {
      let err = RunConfig::from_json(case).unwrap_err();
      assert!(
        matches!(err, ConfigError::OutOfRange { .. }),
        "expected range error for {case}, got {err:?}"
      );
    }
  }

  #[test]
  fn test_rejects_blank_macro_name() {
    let err = RunConfig::from_json(r#"{"macros": ["ok", "  "]}"#).unwrap_err();
    assert!(matches!(err, ConfigError::EmptyMacroName));
  }

  #[test]
  fn test_backoff_doubles() {
    let retry = RetryConfig {
      base_delay_ms: 100,
      ..RetryConfig::default()
    };
    assert_eq!(retry.backoff(0), Duration::from_millis(100));
    assert_eq!(retry.backoff(1), Duration::from_millis(200));
    assert_eq!(retry.backoff(3), Duration::from_millis(800));
  }
}
