use serde::{Deserialize, Serialize};

/// A node in the workflow graph document.
///
/// Everything except `id` is descriptive metadata for review tooling. The
/// orchestrator picks a node's behavior from its id alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDef {
  pub id: String,
  #[serde(default)]
  pub label: String,
  #[serde(default)]
  pub agent: String,
  #[serde(default)]
  pub action: String,
  #[serde(rename = "type", default)]
  pub node_type: String,
}

impl NodeDef {
  /// Create a node definition with only an id.
  pub fn bare(id: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      label: String::new(),
      agent: String::new(),
      action: String::new(),
      node_type: String::new(),
    }
  }
}
