//! Peg Workflow
//!
//! This crate provides the validated workflow representation for peg.
//! A [`WorkflowGraph`] is built from a [`peg_config::GraphDef`] document and
//! stays immutable for the lifetime of a run.
//!
//! Key differences from `peg-config`:
//! - Node ids are unique and every edge points at a known node
//! - The entry point is known to exist
//! - Each node carries a [`NodeKind`] used for behavior dispatch
//! - Edge resolution (conditioned first, fallback second) lives here
//!
//! It also defines [`HistoryEntry`], the append-only record shared by the
//! orchestrator, the selector and the loop guard.

mod artifact;
pub mod condition;
mod error;
mod graph;
mod history;
mod node;

pub use artifact::Artifact;
pub use error::WorkflowError;
pub use graph::{Edge, WorkflowGraph};
pub use history::HistoryEntry;
pub use node::{Node, NodeKind};
