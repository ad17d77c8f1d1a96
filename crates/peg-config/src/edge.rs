use serde::{Deserialize, Serialize};

/// A directed edge between two nodes.
///
/// An edge without a `condition` is a fallback: it is taken only when no
/// conditioned edge from the same node matches the node's result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeDef {
  pub from: String,
  pub to: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub condition: Option<String>,
}
