use peg_workflow::HistoryEntry;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Beta, Distribution};
use tracing::{debug, info};

use crate::SelectorError;
use crate::arm::{ArmStats, ArmTable};
use crate::store::WeightStore;

/// Decay applied to all arms before new evidence is replayed.
pub const DEFAULT_DECAY: f64 = 0.9;

/// Thompson-sampling macro selector backed by a [`WeightStore`].
///
/// Arm statistics are loaded once at construction and written back after
/// every [`choose`](Self::choose).
pub struct BanditSelector {
  store: Box<dyn WeightStore>,
  arms: ArmTable,
  decay: f64,
  rng: StdRng,
  selections: u64,
}

impl BanditSelector {
  /// Create a selector, loading the persisted arm statistics.
  pub fn new(store: impl WeightStore + 'static) -> Result<Self, SelectorError> {
    let arms = store.load()?;
    debug!(arms = arms.len(), "bandit_weights_loaded");

    Ok(Self {
      store: Box::new(store),
      arms,
      decay: DEFAULT_DECAY,
      rng: StdRng::from_entropy(),
      selections: 0,
    })
  }

  /// Use a different decay factor.
  pub fn with_decay(mut self, decay: f64) -> Result<Self, SelectorError> {
    if !(decay > 0.0 && decay <= 1.0) {
      return Err(SelectorError::InvalidDecay(decay));
    }
    self.decay = decay;
    Ok(self)
  }

  /// Seed the sampling RNG for reproducible selections.
  pub fn with_seed(mut self, seed: u64) -> Self {
    self.rng = StdRng::seed_from_u64(seed);
    self
  }

  /// Current arm statistics.
  pub fn arms(&self) -> &ArmTable {
    &self.arms
  }

  /// Number of successful `choose` calls made by this selector.
  pub fn selections(&self) -> u64 {
    self.selections
  }

  /// Fold a history into the arm statistics without sampling or persisting.
  ///
  /// Decays every known arm when `history` is non-empty, gives each strategy
  /// an arm, then replays every entry that names a macro. The whole history
  /// is replayed on every call.
  pub fn observe(&mut self, strategies: &[String], history: &[HistoryEntry], pass_threshold: f64) {
    fold(&mut self.arms, self.decay, strategies, history, pass_threshold);
  }

  /// Pick the strategy to run next.
  ///
  /// The candidate with the highest `Beta(successes, failures)` sample plus
  /// exploration bonus wins; ties go to the earlier candidate. The updated
  /// statistics are persisted before returning. On error the selector's
  /// statistics are left as they were.
  pub fn choose(
    &mut self,
    strategies: &[String],
    history: &[HistoryEntry],
    pass_threshold: f64,
  ) -> Result<String, SelectorError> {
    if strategies.is_empty() {
      return Err(SelectorError::NoStrategies);
    }

    let mut arms = self.arms.clone();
    fold(&mut arms, self.decay, strategies, history, pass_threshold);

    let mut best: Option<(&String, f64)> = None;
    for strategy in strategies {
      let stats = arms.get(strategy).copied().unwrap_or_default();
      let sample = self.sample(strategy, &stats)? + stats.exploration_bonus();
      if best.is_none_or(|(_, best_sample)| sample > best_sample) {
        best = Some((strategy, sample));
      }
    }
    let chosen = best
      .map(|(name, _)| name.clone())
      .ok_or(SelectorError::NoStrategies)?;

    self.store.save(&arms)?;
    self.arms = arms;
    self.selections += 1;

    info!(
      macro_name = %chosen,
      candidates = strategies.len(),
      history_len = history.len(),
      selections = self.selections,
      "macro_chosen"
    );
    Ok(chosen)
  }

  fn sample(&mut self, name: &str, stats: &ArmStats) -> Result<f64, SelectorError> {
    let beta = Beta::new(stats.successes, stats.failures).map_err(|_| SelectorError::InvalidArm {
      name: name.to_string(),
      successes: stats.successes,
      failures: stats.failures,
    })?;
    Ok(beta.sample(&mut self.rng))
  }
}

/// Binary reward for a replayed entry.
///
/// An explicit reward counts as a success when positive; otherwise the
/// entry's score is compared against the pass threshold.
fn reward(entry: &HistoryEntry, pass_threshold: f64) -> f64 {
  let passed = match entry.reward {
    Some(reward) => reward > 0.0,
    None => entry.score >= pass_threshold,
  };
  if passed { 1.0 } else { 0.0 }
}

fn fold(
  arms: &mut ArmTable,
  decay: f64,
  strategies: &[String],
  history: &[HistoryEntry],
  pass_threshold: f64,
) {
  if !history.is_empty() {
    for stats in arms.values_mut() {
      stats.decay(decay);
    }
  }

  for strategy in strategies {
    arms.entry(strategy.clone()).or_default();
  }

  for entry in history {
    let Some(macro_name) = entry.macro_name.as_deref() else {
      continue;
    };
    arms
      .entry(macro_name.to_string())
      .or_default()
      .record(reward(entry, pass_threshold));
  }
}
