use std::fmt;

use peg_config::NodeDef;
use serde::{Deserialize, Serialize};

/// Behavior class of a node, derived from its id.
///
/// The built-in pipeline stages have dedicated variants; every other id maps
/// to [`NodeKind::Other`] and gets the default no-op behavior unless a
/// handler is registered for it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
  Build,
  Review,
  LoopDetector,
  Export,
  Other(String),
}

impl NodeKind {
  pub fn from_id(id: &str) -> Self {
    match id {
      "build" => NodeKind::Build,
      "review" => NodeKind::Review,
      "loop_detector" => NodeKind::LoopDetector,
      "export" => NodeKind::Export,
      other => NodeKind::Other(other.to_string()),
    }
  }

  /// The node id this kind is bound to.
  pub fn id(&self) -> &str {
    match self {
      NodeKind::Build => "build",
      NodeKind::Review => "review",
      NodeKind::LoopDetector => "loop_detector",
      NodeKind::Export => "export",
      NodeKind::Other(id) => id,
    }
  }
}

impl fmt::Display for NodeKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.id())
  }
}

/// A node in a validated workflow graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
  pub id: String,
  pub kind: NodeKind,
  pub label: String,
  pub agent: String,
  pub action: String,
  pub node_type: String,
}

impl From<NodeDef> for Node {
  fn from(def: NodeDef) -> Self {
    Self {
      kind: NodeKind::from_id(&def.id),
      id: def.id,
      label: def.label,
      agent: def.agent,
      action: def.action,
      node_type: def.node_type,
    }
  }
}
