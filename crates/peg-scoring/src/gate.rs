use peg_workflow::Artifact;

use crate::ScoringError;
use crate::scorer::Scorer;

/// Outcome of passing an artifact through the gate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateVerdict {
  pub score: f64,
  pub passed: bool,
}

/// Adapter between a [`Scorer`] and the review node's transition condition.
pub struct ScoringGate<'a> {
  scorer: &'a dyn Scorer,
  minimum_score: f64,
}

impl<'a> ScoringGate<'a> {
  pub fn new(scorer: &'a dyn Scorer, minimum_score: f64) -> Self {
    Self {
      scorer,
      minimum_score,
    }
  }

  /// Score the artifact and compare it with the minimum score.
  ///
  /// A score equal to the minimum passes.
  pub fn evaluate(&self, artifact: &Artifact) -> Result<GateVerdict, ScoringError> {
    let score = self.scorer.score(artifact)?;
    if !(0.0..=1.0).contains(&score) {
      return Err(ScoringError::OutOfRange(score));
    }

    Ok(GateVerdict {
      score,
      passed: score >= self.minimum_score,
    })
  }
}
