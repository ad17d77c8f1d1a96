//! Error types for node execution.

use peg_scoring::ScoringError;
use peg_selector::SelectorError;
use thiserror::Error;

use crate::macros::MacroError;

/// A failed attempt at executing a node.
///
/// These are transient from the executor's point of view: the attempt is
/// retried, and once retries are exhausted the node produces a `failure`
/// result instead of aborting the run.
#[derive(Debug, Error)]
pub enum NodeError {
  /// The run configuration has no macros for the build node to choose from.
  #[error("no macros configured")]
  NoStrategies,

  /// Macro selection failed.
  #[error("macro selection failed: {0}")]
  Selector(#[from] SelectorError),

  /// Scoring the current output failed.
  #[error("scoring failed: {0}")]
  Scoring(#[from] ScoringError),

  /// Running the chosen macro failed.
  #[error("macro execution failed: {0}")]
  Macro(#[from] MacroError),

  /// A node needed the run's output before any was produced.
  #[error("no output to review")]
  MissingOutput,

  /// Failure raised by a custom handler.
  #[error("{0}")]
  Failed(String),
}
