//! Process-level handle owning everything that outlives a single run.

use peg_config::RunConfig;
use peg_scoring::{Scorer, SimulatedScorer};
use peg_selector::BanditSelector;
use peg_workflow::{NodeKind, WorkflowGraph};

use crate::circuit::CircuitBreaker;
use crate::events::{EventNotifier, NoopNotifier};
use crate::executor::GraphExecutor;
use crate::handler::{HandlerTable, NodeHandler, Services};
use crate::macros::{MacroRunner, SimulatedMacroRunner};
use crate::result::RunOutcome;

/// Owns the selector, collaborators, handler table, circuit breaker and
/// event notifier.
///
/// Each run borrows the session mutably, so learned arm statistics and open
/// circuits carry over from one run to the next.
pub struct Session {
  pub(crate) services: Services,
  pub(crate) handlers: HandlerTable,
  pub(crate) breaker: CircuitBreaker,
  pub(crate) notifier: Box<dyn EventNotifier>,
}

impl Session {
  pub fn builder(selector: BanditSelector) -> SessionBuilder {
    SessionBuilder::new(selector)
  }

  /// Run `graph` from its entry point until it halts.
  pub fn run(&mut self, graph: &WorkflowGraph, config: &RunConfig) -> RunOutcome {
    GraphExecutor::new(graph, config).run(self)
  }

  pub fn circuit_breaker(&self) -> &CircuitBreaker {
    &self.breaker
  }

  /// Close every open circuit.
  pub fn reset_circuits(&mut self) {
    self.breaker.reset();
  }

  pub fn selector(&self) -> &BanditSelector {
    &self.services.selector
  }

  pub fn handlers_mut(&mut self) -> &mut HandlerTable {
    &mut self.handlers
  }
}

/// Builder for [`Session`].
///
/// Unset collaborators default to [`SimulatedScorer`] and
/// [`SimulatedMacroRunner`]; the handler table starts from
/// [`HandlerTable::with_defaults`].
pub struct SessionBuilder {
  selector: BanditSelector,
  scorer: Option<Box<dyn Scorer>>,
  macros: Option<Box<dyn MacroRunner>>,
  handlers: HandlerTable,
  notifier: Option<Box<dyn EventNotifier>>,
}

impl SessionBuilder {
  pub fn new(selector: BanditSelector) -> Self {
    Self {
      selector,
      scorer: None,
      macros: None,
      handlers: HandlerTable::with_defaults(),
      notifier: None,
    }
  }

  pub fn scorer(mut self, scorer: impl Scorer + 'static) -> Self {
    self.scorer = Some(Box::new(scorer));
    self
  }

  pub fn macro_runner(mut self, runner: impl MacroRunner + 'static) -> Self {
    self.macros = Some(Box::new(runner));
    self
  }

  /// Replace or add the handler for a node kind.
  pub fn handler(mut self, kind: NodeKind, handler: impl NodeHandler + 'static) -> Self {
    self.handlers.register(kind, handler);
    self
  }

  pub fn notifier(mut self, notifier: impl EventNotifier + 'static) -> Self {
    self.notifier = Some(Box::new(notifier));
    self
  }

  pub fn build(self) -> Session {
    Session {
      services: Services {
        selector: self.selector,
        scorer: self
          .scorer
          .unwrap_or_else(|| Box::new(SimulatedScorer::new())),
        macros: self
          .macros
          .unwrap_or_else(|| Box::new(SimulatedMacroRunner)),
      },
      handlers: self.handlers,
      breaker: CircuitBreaker::new(),
      notifier: self.notifier.unwrap_or_else(|| Box::new(NoopNotifier)),
    }
  }
}
