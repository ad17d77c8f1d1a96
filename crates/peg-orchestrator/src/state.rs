use peg_workflow::{Artifact, HistoryEntry};

/// Mutable state of a single run.
///
/// Created with the executor and dropped when the run ends; nothing here
/// outlives the run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunState {
  /// `None` once the run reached a terminal node or lost its way.
  pub current_node: Option<String>,
  pub history: Vec<HistoryEntry>,
  pub last_score: f64,
  pub output: Option<Artifact>,
  /// Builds since the last passing review.
  pub loop_iterations: u32,
}

impl RunState {
  pub fn new(start: impl Into<String>) -> Self {
    Self {
      current_node: Some(start.into()),
      history: Vec::new(),
      last_score: 0.0,
      output: None,
      loop_iterations: 0,
    }
  }
}
