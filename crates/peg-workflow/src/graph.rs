use std::collections::{HashMap, HashSet};

use peg_config::{EdgeDef, GraphDef};
use serde::{Deserialize, Serialize};

use crate::error::WorkflowError;
use crate::node::Node;

/// A directed, optionally conditioned transition between two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
  pub from: String,
  pub to: String,
  pub condition: Option<String>,
}

impl From<EdgeDef> for Edge {
  fn from(def: EdgeDef) -> Self {
    Self {
      from: def.from,
      to: def.to,
      condition: def.condition,
    }
  }
}

/// A validated workflow graph ready for execution.
#[derive(Debug, Clone)]
pub struct WorkflowGraph {
  entry_point: String,
  nodes: Vec<Node>,
  edges: Vec<Edge>,
  /// node_id -> index into `nodes`.
  index: HashMap<String, usize>,
  /// node_id -> indices into `edges` of its outgoing edges, in document order.
  outgoing: HashMap<String, Vec<usize>>,
}

impl WorkflowGraph {
  /// Validate a graph document and build the lookup tables.
  pub fn from_def(def: GraphDef) -> Result<Self, WorkflowError> {
    let mut nodes = Vec::with_capacity(def.nodes.len());
    let mut index = HashMap::with_capacity(def.nodes.len());

    for node_def in def.nodes {
      if index.contains_key(&node_def.id) {
        return Err(WorkflowError::DuplicateNodeId(node_def.id));
      }
      index.insert(node_def.id.clone(), nodes.len());
      nodes.push(Node::from(node_def));
    }

    if !index.contains_key(&def.entry_point) {
      return Err(WorkflowError::EntryPointNotFound(def.entry_point));
    }

    let mut outgoing: HashMap<String, Vec<usize>> = HashMap::new();
    let mut seen: HashSet<(String, Option<String>)> = HashSet::new();
    let mut edges = Vec::with_capacity(def.edges.len());

    for edge_def in def.edges {
      if !index.contains_key(&edge_def.from) || !index.contains_key(&edge_def.to) {
        return Err(WorkflowError::InvalidEdge {
          from: edge_def.from,
          to: edge_def.to,
        });
      }

      let key = (edge_def.from.clone(), edge_def.condition.clone());
      if !seen.insert(key) {
        return Err(WorkflowError::AmbiguousEdge {
          from: edge_def.from,
          condition: edge_def.condition,
        });
      }

      outgoing
        .entry(edge_def.from.clone())
        .or_default()
        .push(edges.len());
      edges.push(Edge::from(edge_def));
    }

    Ok(Self {
      entry_point: def.entry_point,
      nodes,
      edges,
      index,
      outgoing,
    })
  }

  pub fn entry_point(&self) -> &str {
    &self.entry_point
  }

  /// Get a node by ID.
  pub fn get_node(&self, node_id: &str) -> Option<&Node> {
    self.index.get(node_id).map(|&i| &self.nodes[i])
  }

  pub fn nodes(&self) -> &[Node] {
    &self.nodes
  }

  pub fn edges(&self) -> &[Edge] {
    &self.edges
  }

  /// Outgoing edges of a node, in document order.
  pub fn outgoing(&self, node_id: &str) -> impl Iterator<Item = &Edge> {
    self
      .outgoing
      .get(node_id)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
      .iter()
      .map(|&i| &self.edges[i])
  }

  /// Resolve the next node for a node's result.
  ///
  /// An edge whose condition equals `result` wins; otherwise the first
  /// unconditioned edge is taken. `None` means there is no path forward.
  pub fn next_node(&self, node_id: &str, result: &str) -> Option<&str> {
    self
      .outgoing(node_id)
      .find(|e| e.condition.as_deref() == Some(result))
      .or_else(|| self.outgoing(node_id).find(|e| e.condition.is_none()))
      .map(|e| e.to.as_str())
  }
}
