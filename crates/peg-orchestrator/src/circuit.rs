//! Per-node circuit breaker.
//!
//! Each node has a failure counter. Every failed attempt increments it and
//! every successful attempt resets it. Once a node has exhausted its retries
//! with the counter at or above the threshold, its circuit opens and stays
//! open until [`CircuitBreaker::reset`]; there is no half-open state.

use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, Default)]
pub struct CircuitBreaker {
  failures: HashMap<String, u32>,
  open: BTreeSet<String>,
}

impl CircuitBreaker {
  pub fn new() -> Self {
    Self::default()
  }

  /// Record a successful attempt.
  pub fn record_success(&mut self, node_id: &str) {
    self.failures.remove(node_id);
  }

  /// Record a failed attempt and return the node's failure count.
  pub fn record_failure(&mut self, node_id: &str) -> u32 {
    let count = self.failures.entry(node_id.to_string()).or_insert(0);
    *count += 1;
    *count
  }

  pub fn failure_count(&self, node_id: &str) -> u32 {
    self.failures.get(node_id).copied().unwrap_or(0)
  }

  /// Open the node's circuit if its failure count reached `threshold`.
  ///
  /// Returns `true` if the circuit opened on this call.
  pub fn trip_if_exceeded(&mut self, node_id: &str, threshold: u32) -> bool {
    if self.failure_count(node_id) >= threshold && !self.is_open(node_id) {
      self.open.insert(node_id.to_string());
      return true;
    }
    false
  }

  pub fn is_open(&self, node_id: &str) -> bool {
    self.open.contains(node_id)
  }

  /// Nodes whose circuit is open, sorted by id.
  pub fn open_nodes(&self) -> impl Iterator<Item = &str> {
    self.open.iter().map(String::as_str)
  }

  /// Close every circuit and forget all failures.
  pub fn reset(&mut self) {
    self.failures.clear();
    self.open.clear();
  }
}
