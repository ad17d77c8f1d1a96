//! Run outcome types.

use peg_workflow::{Artifact, HistoryEntry};
use serde::{Deserialize, Serialize};

/// Why a run stopped advancing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum HaltReason {
  /// A terminal node (export) finished the run.
  Completed,

  /// No edge matched the node's result and there was no fallback.
  NoPathForward { node: String, result: String },

  /// The node's circuit is open; an operator has to step in.
  EscalatedToOperator { node: String },

  /// The current node id does not exist in the graph.
  GraphIntegrity { node: String },
}

impl HaltReason {
  pub fn is_completed(&self) -> bool {
    matches!(self, HaltReason::Completed)
  }
}

/// Result of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutcome {
  pub run_id: String,
  pub halt: HaltReason,
  /// Every executed node, in order.
  pub history: Vec<HistoryEntry>,
  /// The last artifact produced by a macro, if any.
  pub output: Option<Artifact>,
  pub last_score: f64,
  pub loop_iterations: u32,
}
