//! Peg Orchestrator
//!
//! This crate drives a [`WorkflowGraph`](peg_workflow::WorkflowGraph) from its
//! entry point to a halt, one node at a time.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Session                            │
//! │  - selector, scorer, macro runner (collaborators)           │
//! │  - handler table (NodeKind -> NodeHandler)                  │
//! │  - circuit breaker, event notifier                          │
//! └─────────────────────────────────────────────────────────────┘
//!                               │ borrowed by
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       GraphExecutor                         │
//! │  - owns RunState (current node, history, score, output)     │
//! │  - step(): resolve node → retry handler → record → advance  │
//! │  - run() → RunOutcome with a structured HaltReason          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! let selector = BanditSelector::new(FsWeightStore::new("bandit_weights.json"))?;
//! let mut session = Session::builder(selector)
//!   .scorer(SimulatedScorer::new())
//!   .build();
//!
//! let outcome = session.run(&graph, &config);
//! println!("{:?} after {} nodes", outcome.halt, outcome.history.len());
//! ```

mod circuit;
mod error;
mod events;
mod executor;
mod handler;
mod macros;
mod result;
mod retry;
mod session;
mod state;

pub use circuit::CircuitBreaker;
pub use error::NodeError;
pub use events::{ChannelNotifier, EventNotifier, NoopNotifier, RunEvent};
pub use executor::{GraphExecutor, Step};
pub use handler::{
  BuildHandler, ExportHandler, HandlerTable, LoopDetectorHandler, NodeContext, NodeHandler,
  NodeOutcome, NodeResult, PassThroughHandler, ReviewHandler, Services,
};
pub use macros::{MacroError, MacroRunner, SimulatedMacroRunner};
pub use result::{HaltReason, RunOutcome};
pub use session::{Session, SessionBuilder};
pub use state::RunState;
