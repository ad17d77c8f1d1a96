use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::arm::ArmTable;
use crate::store::{StoreError, WeightStore};

/// File-backed weight store.
///
/// The table lives in a single JSON document. Writers take an exclusive
/// advisory lock on a sibling lock file, re-read the document under the lock
/// and replace it through a temporary file. Arms persisted by another session
/// and absent from the table being saved are kept; for an arm both sessions
/// track, the last save wins.
/// ```text
/// {dir}/
/// ├── bandit_weights.json
/// └── bandit_weights.json.lock
/// ```
pub struct FsWeightStore {
  path: PathBuf,
}

impl FsWeightStore {
  /// Create a store persisting to the given file.
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  /// Get the path of the weights document.
  pub fn path(&self) -> &Path {
    &self.path
  }

  fn sibling(&self, suffix: &str) -> PathBuf {
    let mut name = self
      .path
      .file_name()
      .map(|n| n.to_os_string())
      .unwrap_or_default();
    name.push(suffix);
    self.path.with_file_name(name)
  }

  fn open_lock(&self) -> Result<File, StoreError> {
    if let Some(parent) = self.path.parent()
      && !parent.as_os_str().is_empty()
    {
      fs::create_dir_all(parent)?;
    }

    Ok(
      OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(self.sibling(".lock"))?,
    )
  }
}

impl FsWeightStore {
  /// Read the document; the caller holds the lock.
  fn read_table(&self) -> Result<ArmTable, StoreError> {
    let content = match fs::read_to_string(&self.path) {
      Ok(content) => content,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(ArmTable::new()),
      Err(e) => return Err(e.into()),
    };
    if content.trim().is_empty() {
      return Ok(ArmTable::new());
    }
    Ok(serde_json::from_str(&content)?)
  }
}

impl WeightStore for FsWeightStore {
  fn load(&self) -> Result<ArmTable, StoreError> {
    if !self.path.exists() {
      return Ok(ArmTable::new());
    }

    let lock = self.open_lock()?;
    FileExt::lock_shared(&lock)?;
    let table = self.read_table();
    // Lock is released when `lock` is dropped.
    drop(lock);
    table
  }

  fn save(&self, arms: &ArmTable) -> Result<(), StoreError> {
    let lock = self.open_lock()?;
    FileExt::lock_exclusive(&lock)?;

    let mut merged = arms.clone();
    match self.read_table() {
      Ok(persisted) => {
        for (name, stats) in persisted {
          merged.entry(name).or_insert(stats);
        }
      }
      Err(e) => {
        tracing::warn!(path = %self.path.display(), error = %e, "weights_unreadable_overwriting");
      }
    }

    let tmp_path = self.sibling(".tmp");
    let mut tmp = File::create(&tmp_path)?;
    serde_json::to_writer(&mut tmp, &merged)?;
    tmp.flush()?;
    tmp.sync_all()?;
    fs::rename(&tmp_path, &self.path)?;

    tracing::debug!(path = %self.path.display(), arms = merged.len(), "weights_saved");
    Ok(())
  }
}
