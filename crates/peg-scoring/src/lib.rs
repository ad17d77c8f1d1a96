//! Peg Scoring
//!
//! The quality scoring function itself lives outside the orchestrator. This
//! crate defines the seam it plugs into ([`Scorer`]) and the gate that turns
//! a score into the review node's pass/fail verdict ([`ScoringGate`]).

mod gate;
mod scorer;

pub use gate::{GateVerdict, ScoringGate};
pub use scorer::{FixedScorer, Scorer, SimulatedScorer};

/// Errors raised while scoring an artifact.
#[derive(Debug, thiserror::Error)]
pub enum ScoringError {
  /// The scorer could not produce a score.
  #[error("scoring failed: {0}")]
  Failed(String),

  /// The scorer returned something outside `[0, 1]`.
  #[error("score {0} is outside [0, 1]")]
  OutOfRange(f64),
}
