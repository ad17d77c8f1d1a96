use serde::{Deserialize, Serialize};

/// Opaque output of a macro run.
///
/// The orchestrator never looks inside `content`; it only hands the artifact
/// to the scorer and returns it to the caller at the end of the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
  /// The macro that produced this artifact.
  pub macro_name: String,
  pub content: serde_json::Value,
}

impl Artifact {
  pub fn new(macro_name: impl Into<String>, content: serde_json::Value) -> Self {
    Self {
      macro_name: macro_name.into(),
      content,
    }
  }
}
