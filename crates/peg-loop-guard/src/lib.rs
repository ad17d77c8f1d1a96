//! Peg Loop Guard
//!
//! Detects a run that keeps retrying the same strategy without getting
//! anywhere: the last `window_size` builds all used one macro and no build
//! improved on the previous one by more than `epsilon`.
//!
//! [`detect_loop`] is a pure function of the history it is given.

use peg_workflow::{HistoryEntry, NodeKind};
use tracing::info;

/// Check the history for a stagnating build loop.
pub fn detect_loop(history: &[HistoryEntry], window_size: usize, epsilon: f64) -> bool {
  if window_size == 0 {
    return false;
  }

  let builds: Vec<(&str, f64)> = history
    .iter()
    .filter(|h| h.node == NodeKind::Build.id())
    .filter_map(|h| h.macro_name.as_deref().map(|m| (m, h.score)))
    .collect();

  if builds.len() < window_size {
    return false;
  }

  let recent = &builds[builds.len() - window_size..];
  let (first_macro, _) = recent[0];
  if recent.iter().any(|(m, _)| *m != first_macro) {
    return false;
  }

  if recent.windows(2).any(|pair| pair[1].1 - pair[0].1 > epsilon) {
    return false;
  }

  info!(
    macro_name = %first_macro,
    repeats = window_size,
    "loop_detected"
  );
  true
}
