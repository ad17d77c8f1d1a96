//! Read-only access to configuration documents.
//!
//! The knowledge layer that owns these documents lives outside this crate;
//! the orchestrator only ever reads from it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::graph::GraphDef;
use crate::run::RunConfig;

/// Errors raised while reading a document from a [`DocumentSource`].
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
  /// The named document does not exist.
  #[error("document not found: {0}")]
  NotFound(String),

  /// An I/O error occurred.
  #[error("io error reading '{name}': {source}")]
  Io {
    name: String,
    #[source]
    source: std::io::Error,
  },

  /// The document exists but is not a valid configuration.
  #[error(transparent)]
  Config(#[from] ConfigError),
}

/// A read-only store of named configuration documents.
pub trait DocumentSource {
  /// Read the raw contents of a document.
  fn read(&self, name: &str) -> Result<String, SourceError>;

  /// Read and parse a workflow graph document.
  fn load_graph(&self, name: &str) -> Result<GraphDef, SourceError> {
    let content = self.read(name)?;
    Ok(GraphDef::from_json(&content)?)
  }

  /// Read, parse and validate a run configuration document.
  fn load_run_config(&self, name: &str) -> Result<RunConfig, SourceError> {
    let content = self.read(name)?;
    Ok(RunConfig::from_json(&content)?)
  }
}

/// Filesystem-backed document source.
///
/// Documents are files directly below the root:
/// ```text
/// {root}/
/// ├── WorkflowGraph.json
/// └── SessionConfig.json
/// ```
pub struct FsDocumentSource {
  root: PathBuf,
}

impl FsDocumentSource {
  /// Create a new source rooted at the given directory.
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  /// Get the root directory.
  pub fn root(&self) -> &Path {
    &self.root
  }
}

impl DocumentSource for FsDocumentSource {
  fn read(&self, name: &str) -> Result<String, SourceError> {
    let path = self.root.join(name);
    std::fs::read_to_string(&path).map_err(|source| {
      if source.kind() == std::io::ErrorKind::NotFound {
        SourceError::NotFound(path.display().to_string())
      } else {
        SourceError::Io {
          name: name.to_string(),
          source,
        }
      }
    })
  }
}

/// In-memory document source.
///
/// Suitable for tests and embedding.
#[derive(Debug, Default)]
pub struct InMemoryDocumentSource {
  documents: HashMap<String, String>,
}

impl InMemoryDocumentSource {
  pub fn new() -> Self {
    Self::default()
  }

  /// Add or replace a document.
  pub fn insert(&mut self, name: impl Into<String>, content: impl Into<String>) {
    self.documents.insert(name.into(), content.into());
  }
}

impl DocumentSource for InMemoryDocumentSource {
  fn read(&self, name: &str) -> Result<String, SourceError> {
    self
      .documents
      .get(name)
      .cloned()
      .ok_or_else(|| SourceError::NotFound(name.to_string()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_in_memory_source() {
    let mut source = InMemoryDocumentSource::new();
    source.insert("SessionConfig.json", r#"{"macros": ["a"]}"#);

    let config = source.load_run_config("SessionConfig.json").unwrap();
    assert_eq!(config.macros, vec!["a"]);

    let err = source.load_graph("WorkflowGraph.json").unwrap_err();
    assert!(matches!(err, SourceError::NotFound(_)));
  }

  #[test]
  fn test_invalid_config_surfaces_as_config_error() {
    let mut source = InMemoryDocumentSource::new();
    source.insert("bad.json", r#"{"retry": {"max_attempts": 0}}"#);

    let err = source.load_run_config("bad.json").unwrap_err();
    assert!(matches!(
      err,
      SourceError::Config(ConfigError::OutOfRange { .. })
    ));
  }
}
