use std::sync::Mutex;

use peg_workflow::Artifact;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::ScoringError;

/// A quality scoring function.
///
/// Implementations must be callable synchronously and must not mutate state
/// shared with the orchestrator; they only return a value.
pub trait Scorer: Send + Sync {
  /// Score an artifact. Expected to return a value in `[0, 1]`.
  fn score(&self, artifact: &Artifact) -> Result<f64, ScoringError>;
}

impl<F> Scorer for F
where
  F: Fn(&Artifact) -> Result<f64, ScoringError> + Send + Sync,
{
  fn score(&self, artifact: &Artifact) -> Result<f64, ScoringError> {
    self(artifact)
  }
}

/// A scorer that always returns the same score.
#[derive(Debug, Clone, Copy)]
pub struct FixedScorer(pub f64);

impl Scorer for FixedScorer {
  fn score(&self, _artifact: &Artifact) -> Result<f64, ScoringError> {
    Ok(self.0)
  }
}

/// Stand-in for the real scoring pipeline: uniform scores in `[0.7, 1.0)`.
pub struct SimulatedScorer {
  rng: Mutex<StdRng>,
}

impl SimulatedScorer {
  pub fn new() -> Self {
    Self {
      rng: Mutex::new(StdRng::from_entropy()),
    }
  }

  /// Create a scorer with a reproducible sequence of scores.
  pub fn with_seed(seed: u64) -> Self {
    Self {
      rng: Mutex::new(StdRng::seed_from_u64(seed)),
    }
  }
}

impl Default for SimulatedScorer {
  fn default() -> Self {
    Self::new()
  }
}

impl Scorer for SimulatedScorer {
  fn score(&self, artifact: &Artifact) -> Result<f64, ScoringError> {
    let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
    let score = rng.gen_range(0.7..1.0);
    tracing::debug!(macro_name = %artifact.macro_name, score, "simulated_score");
    Ok(score)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn artifact() -> Artifact {
    Artifact::new("macro_A", serde_json::json!({"content": "draft"}))
  }

  #[test]
  fn test_simulated_scores_in_range() {
    let scorer = SimulatedScorer::with_seed(7);
    for _ in 0..200 {
      let score = scorer.score(&artifact()).unwrap();
      assert!((0.7..1.0).contains(&score));
    }
  }

  #[test]
  fn test_seeded_scorers_agree() {
    let a = SimulatedScorer::with_seed(42);
    let b = SimulatedScorer::with_seed(42);
    for _ in 0..10 {
      assert_eq!(a.score(&artifact()).unwrap(), b.score(&artifact()).unwrap());
    }
  }

  #[test]
  fn test_closure_scorer() {
    let scorer = |a: &Artifact| -> Result<f64, ScoringError> {
      Ok(if a.macro_name == "macro_A" { 0.9 } else { 0.1 })
    };
    assert_eq!(scorer.score(&artifact()).unwrap(), 0.9);
  }
}
