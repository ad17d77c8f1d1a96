use std::sync::{Arc, Mutex};

use crate::arm::ArmTable;

/// Error type for weight store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
  /// An I/O error occurred.
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  /// The persisted document is not a valid arm table.
  #[error("invalid weights document: {0}")]
  Format(#[from] serde_json::Error),
}

/// Durable storage for the selector's arm statistics.
pub trait WeightStore: Send {
  /// Load the persisted table. A store with nothing persisted yet returns
  /// an empty table.
  fn load(&self) -> Result<ArmTable, StoreError>;

  /// Persist the table. Stores shared between sessions may keep arms that
  /// `arms` does not contain.
  fn save(&self, arms: &ArmTable) -> Result<(), StoreError>;
}

/// In-memory weight store.
///
/// Clones share the same table, so a test can hand one clone to a selector
/// and inspect what it persisted through another.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWeightStore {
  arms: Arc<Mutex<ArmTable>>,
}

impl InMemoryWeightStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Create a store that already holds the given table.
  pub fn with_arms(arms: ArmTable) -> Self {
    Self {
      arms: Arc::new(Mutex::new(arms)),
    }
  }

  /// Snapshot of the persisted table.
  pub fn snapshot(&self) -> ArmTable {
    self.arms.lock().unwrap_or_else(|e| e.into_inner()).clone()
  }
}

impl WeightStore for InMemoryWeightStore {
  fn load(&self) -> Result<ArmTable, StoreError> {
    Ok(self.snapshot())
  }

  fn save(&self, arms: &ArmTable) -> Result<(), StoreError> {
    *self.arms.lock().unwrap_or_else(|e| e.into_inner()) = arms.clone();
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::arm::ArmStats;

  #[test]
  fn test_in_memory_store() {
    let store = InMemoryWeightStore::new();
    assert!(store.load().unwrap().is_empty());

    let mut arms = ArmTable::new();
    arms.insert("macro_A".to_string(), ArmStats::uniform());
    store.save(&arms).unwrap();

    let other = store.clone();
    assert_eq!(other.load().unwrap(), arms);
  }
}
