//! Peg Config
//!
//! This crate contains the serializable configuration documents for peg.
//! These types represent a workflow graph and a run configuration before they
//! are validated and handed to the orchestrator.
//!
//! Documents can be loaded from:
//! - JSON files (via the CLI with `--graph` / `--config`)
//! - Any [`DocumentSource`] (the read-only knowledge layer)
//!
//! The orchestrator never writes these documents back; it reads them once at
//! the start of a run.

mod edge;
mod error;
mod graph;
mod node;
mod run;
mod source;

pub use edge::EdgeDef;
pub use error::ConfigError;
pub use graph::GraphDef;
pub use node::NodeDef;
pub use run::{LoopGuardConfig, RetryConfig, RunConfig, ScoringConfig};
pub use source::{DocumentSource, FsDocumentSource, InMemoryDocumentSource, SourceError};
