//! Peg Selector
//!
//! Chooses which macro (strategy) the build node runs next. The selector is a
//! Thompson-sampling multi-armed bandit:
//!
//! 1. **Decay** every known arm when there is history to learn from.
//! 2. **Replay** the run history into per-macro success/failure counts.
//! 3. **Sample** `Beta(successes, failures)` per candidate and add an
//!    exploration bonus of `1 / (1 + plays)`.
//! 4. **Persist** the updated [`ArmTable`] through a [`WeightStore`].
//!
//! The arm statistics are the only state shared between sessions. Stores are
//! responsible for serializing concurrent writers.

mod arm;
mod bandit;
mod fs_store;
mod store;

pub use arm::{ArmStats, ArmTable};
pub use bandit::{BanditSelector, DEFAULT_DECAY};
pub use fs_store::FsWeightStore;
pub use store::{InMemoryWeightStore, StoreError, WeightStore};

/// Errors raised by the selector.
#[derive(Debug, thiserror::Error)]
pub enum SelectorError {
  /// `choose` was called without any candidate strategy.
  #[error("no strategies to choose from")]
  NoStrategies,

  /// The decay factor is outside `(0, 1]`.
  #[error("decay factor {0} must be within (0, 1]")]
  InvalidDecay(f64),

  /// An arm's statistics cannot parameterize a Beta distribution.
  #[error("arm '{name}' has invalid statistics: successes={successes}, failures={failures}")]
  InvalidArm {
    name: String,
    successes: f64,
    failures: f64,
  },

  /// Loading or persisting the arm statistics failed.
  #[error("weight store error: {0}")]
  Store(#[from] StoreError),
}
