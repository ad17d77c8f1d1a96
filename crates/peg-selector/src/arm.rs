use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Learned statistics for one macro.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArmStats {
  pub successes: f64,
  pub failures: f64,
  #[serde(default)]
  pub plays: f64,
  #[serde(default)]
  pub total_reward: f64,
}

impl ArmStats {
  /// The uniform prior, `Beta(1, 1)`, for a macro seen for the first time.
  pub fn uniform() -> Self {
    Self {
      successes: 1.0,
      failures: 1.0,
      plays: 0.0,
      total_reward: 0.0,
    }
  }

  /// Scale every statistic by `factor`.
  pub fn decay(&mut self, factor: f64) {
    self.successes *= factor;
    self.failures *= factor;
    self.plays *= factor;
    self.total_reward *= factor;
  }

  /// Record one play with a reward in `[0, 1]`.
  pub fn record(&mut self, reward: f64) {
    self.successes += reward;
    self.failures += 1.0 - reward;
    self.plays += 1.0;
    self.total_reward += reward;
  }

  /// Bonus favouring rarely played arms.
  pub fn exploration_bonus(&self) -> f64 {
    1.0 / (1.0 + self.plays)
  }
}

impl Default for ArmStats {
  fn default() -> Self {
    Self::uniform()
  }
}

/// Arm statistics keyed by macro name.
///
/// Persisted as a flat JSON object: `{"macro_A": {"successes": ..}, ..}`.
pub type ArmTable = BTreeMap<String, ArmStats>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_record_and_decay() {
    let mut arm = ArmStats::uniform();
    arm.record(1.0);
    arm.record(0.0);
    assert_eq!(
      arm,
      ArmStats {
        successes: 2.0,
        failures: 2.0,
        plays: 2.0,
        total_reward: 1.0
      }
    );

    arm.decay(0.5);
    assert_eq!(arm.successes, 1.0);
    assert_eq!(arm.plays, 1.0);
    assert_eq!(arm.total_reward, 0.5);
  }

  #[test]
  fn test_missing_counters_default_to_zero() {
    let arm: ArmStats = serde_json::from_str(r#"{"successes": 3, "failures": 2}"#).unwrap();
    assert_eq!(arm.plays, 0.0);
    assert_eq!(arm.total_reward, 0.0);
  }

  #[test]
  fn test_exploration_bonus() {
    assert_eq!(ArmStats::uniform().exploration_bonus(), 1.0);
    let mut arm = ArmStats::uniform();
    arm.record(1.0);
    arm.record(1.0);
    arm.record(1.0);
    assert_eq!(arm.exploration_bonus(), 0.25);
  }
}
