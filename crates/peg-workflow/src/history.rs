use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One executed node, as recorded in a run's history.
///
/// Entries are append-only. The selector and the loop guard read nothing but
/// this history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
  pub node: String,
  /// The transition condition the node produced.
  pub result: String,
  /// The run's last score at the time the node executed.
  pub score: f64,
  pub timestamp: DateTime<Utc>,
  /// Strategy chosen by the node, for strategy-selecting nodes only.
  #[serde(rename = "macro", default, skip_serializing_if = "Option::is_none")]
  pub macro_name: Option<String>,
  /// Explicit reward overriding the score-derived one when replayed.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub reward: Option<f64>,
}

impl HistoryEntry {
  pub fn new(node: impl Into<String>, result: impl Into<String>, score: f64) -> Self {
    Self {
      node: node.into(),
      result: result.into(),
      score,
      timestamp: Utc::now(),
      macro_name: None,
      reward: None,
    }
  }

  pub fn with_macro(mut self, macro_name: impl Into<String>) -> Self {
    self.macro_name = Some(macro_name.into());
    self
  }

  pub fn with_reward(mut self, reward: f64) -> Self {
    self.reward = Some(reward);
    self
  }
}
