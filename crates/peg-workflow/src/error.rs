use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
  #[error("duplicate node id: {0}")]
  DuplicateNodeId(String),

  #[error("entry point '{0}' is not a node in the graph")]
  EntryPointNotFound(String),

  #[error("edge references unknown node: from={from}, to={to}")]
  InvalidEdge { from: String, to: String },

  #[error("more than one edge from '{from}' for condition {condition:?}")]
  AmbiguousEdge {
    from: String,
    condition: Option<String>,
  },
}
