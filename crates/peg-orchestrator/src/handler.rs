//! Node behaviors.
//!
//! Each [`NodeKind`] maps to one [`NodeHandler`] in a [`HandlerTable`].
//! The built-in pipeline stages are registered by
//! [`HandlerTable::with_defaults`]; any registration can be replaced, and
//! handlers for [`NodeKind::Other`] ids can be added. Kinds without a
//! registration fall back to [`PassThroughHandler`].

use std::collections::HashMap;

use peg_config::RunConfig;
use peg_loop_guard::detect_loop;
use peg_scoring::{Scorer, ScoringGate};
use peg_selector::BanditSelector;
use peg_workflow::{Node, NodeKind, condition};
use tracing::info;

use crate::error::NodeError;
use crate::macros::MacroRunner;
use crate::state::RunState;

/// Collaborators available to node handlers.
pub struct Services {
  pub selector: BanditSelector,
  pub scorer: Box<dyn Scorer>,
  pub macros: Box<dyn MacroRunner>,
}

/// Everything a handler may read or change while executing a node.
pub struct NodeContext<'a> {
  pub node: &'a Node,
  pub config: &'a RunConfig,
  pub state: &'a mut RunState,
  pub services: &'a mut Services,
}

/// What a node produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeResult {
  /// A transition condition matched against outgoing edges.
  Condition(String),
  /// The run is finished.
  Terminal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeOutcome {
  pub result: NodeResult,
  /// Strategy chosen by the node, if it chose one.
  pub macro_name: Option<String>,
}

impl NodeOutcome {
  pub fn condition(condition: impl Into<String>) -> Self {
    Self {
      result: NodeResult::Condition(condition.into()),
      macro_name: None,
    }
  }

  pub fn terminal() -> Self {
    Self {
      result: NodeResult::Terminal,
      macro_name: None,
    }
  }

  pub fn with_macro(mut self, macro_name: impl Into<String>) -> Self {
    self.macro_name = Some(macro_name.into());
    self
  }
}

/// Behavior attached to a kind of node.
pub trait NodeHandler: Send + Sync {
  fn execute(&self, ctx: &mut NodeContext<'_>) -> Result<NodeOutcome, NodeError>;
}

impl<F> NodeHandler for F
where
  F: Fn(&mut NodeContext<'_>) -> Result<NodeOutcome, NodeError> + Send + Sync,
{
  fn execute(&self, ctx: &mut NodeContext<'_>) -> Result<NodeOutcome, NodeError> {
    self(ctx)
  }
}

/// Chooses a macro, runs it and keeps its artifact as the run's output.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildHandler;

impl NodeHandler for BuildHandler {
  fn execute(&self, ctx: &mut NodeContext<'_>) -> Result<NodeOutcome, NodeError> {
    let macros = &ctx.config.macros;
    if macros.is_empty() {
      return Err(NodeError::NoStrategies);
    }

    let chosen = ctx.services.selector.choose(
      macros,
      &ctx.state.history,
      ctx.config.scoring.minimum_score,
    )?;
    let artifact = ctx.services.macros.run(&chosen)?;

    ctx.state.output = Some(artifact);
    ctx.state.loop_iterations += 1;

    Ok(NodeOutcome::condition(condition::SUCCESS).with_macro(chosen))
  }
}

/// Scores the current output against the minimum score.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReviewHandler;

impl NodeHandler for ReviewHandler {
  fn execute(&self, ctx: &mut NodeContext<'_>) -> Result<NodeOutcome, NodeError> {
    let output = ctx.state.output.as_ref().ok_or(NodeError::MissingOutput)?;
    let gate = ScoringGate::new(
      ctx.services.scorer.as_ref(),
      ctx.config.scoring.minimum_score,
    );
    let verdict = gate.evaluate(output)?;

    ctx.state.last_score = verdict.score;
    info!(
      score = verdict.score,
      minimum_score = ctx.config.scoring.minimum_score,
      passed = verdict.passed,
      "review_scored"
    );

    if verdict.passed {
      ctx.state.loop_iterations = 0;
      Ok(NodeOutcome::condition(condition::SCORE_PASSED))
    } else {
      Ok(NodeOutcome::condition(condition::VALIDATION_FAILED))
    }
  }
}

/// Checks the history for a build loop that stopped making progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoopDetectorHandler;

impl NodeHandler for LoopDetectorHandler {
  fn execute(&self, ctx: &mut NodeContext<'_>) -> Result<NodeOutcome, NodeError> {
    let guard = &ctx.config.loop_guard;
    let looping = detect_loop(&ctx.state.history, guard.window_size, guard.epsilon);

    Ok(NodeOutcome::condition(if looping {
      condition::LOOP_DETECTED
    } else {
      condition::LOOP_NOT_DETECTED
    }))
  }
}

/// Ends the run.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExportHandler;

impl NodeHandler for ExportHandler {
  fn execute(&self, ctx: &mut NodeContext<'_>) -> Result<NodeOutcome, NodeError> {
    info!(
      node_id = %ctx.node.id,
      has_output = ctx.state.output.is_some(),
      "workflow_exported"
    );
    Ok(NodeOutcome::terminal())
  }
}

/// Does nothing and reports `success`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThroughHandler;

impl NodeHandler for PassThroughHandler {
  fn execute(&self, _ctx: &mut NodeContext<'_>) -> Result<NodeOutcome, NodeError> {
    Ok(NodeOutcome::condition(condition::SUCCESS))
  }
}

/// Registry of node behaviors keyed by [`NodeKind`].
pub struct HandlerTable {
  handlers: HashMap<NodeKind, Box<dyn NodeHandler>>,
  fallback: Box<dyn NodeHandler>,
}

impl HandlerTable {
  /// A table with no registrations; every node passes through.
  pub fn empty() -> Self {
    Self {
      handlers: HashMap::new(),
      fallback: Box::new(PassThroughHandler),
    }
  }

  /// A table with the built-in build, review, loop detector and export
  /// behaviors.
  pub fn with_defaults() -> Self {
    let mut table = Self::empty();
    table.register(NodeKind::Build, BuildHandler);
    table.register(NodeKind::Review, ReviewHandler);
    table.register(NodeKind::LoopDetector, LoopDetectorHandler);
    table.register(NodeKind::Export, ExportHandler);
    table
  }

  /// Register a handler, replacing any previous one for the same kind.
  pub fn register(&mut self, kind: NodeKind, handler: impl NodeHandler + 'static) {
    self.handlers.insert(kind, Box::new(handler));
  }

  pub fn contains(&self, kind: &NodeKind) -> bool {
    self.handlers.contains_key(kind)
  }

  /// The handler for a kind, or the pass-through fallback.
  pub fn get(&self, kind: &NodeKind) -> &dyn NodeHandler {
    self
      .handlers
      .get(kind)
      .map(|h| h.as_ref())
      .unwrap_or(self.fallback.as_ref())
  }
}

impl Default for HandlerTable {
  fn default() -> Self {
    Self::with_defaults()
  }
}
