use serde::{Deserialize, Serialize};

use crate::edge::EdgeDef;
use crate::error::ConfigError;
use crate::node::NodeDef;

fn default_entry_point() -> String {
  "intake".to_string()
}

/// The workflow graph document (`WorkflowGraph.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphDef {
  #[serde(default = "default_entry_point")]
  pub entry_point: String,
  #[serde(default)]
  pub nodes: Vec<NodeDef>,
  #[serde(default)]
  pub edges: Vec<EdgeDef>,
}

impl GraphDef {
  /// Parse a graph document from JSON.
  pub fn from_json(content: &str) -> Result<Self, ConfigError> {
    serde_json::from_str(content).map_err(|source| ConfigError::Parse {
      document: "workflow graph",
      source,
    })
  }
}
