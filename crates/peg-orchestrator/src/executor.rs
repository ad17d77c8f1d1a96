//! The graph state machine.

use peg_config::RunConfig;
use peg_workflow::{HistoryEntry, WorkflowGraph, condition};
use tracing::{debug, error, info, instrument, warn};

use crate::events::{EventNotifier, RunEvent};
use crate::handler::{NodeContext, NodeResult};
use crate::result::{HaltReason, RunOutcome};
use crate::retry::with_retry;
use crate::session::Session;
use crate::state::RunState;

/// Result of a single [`GraphExecutor::step`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
  /// A node ran and the run moved on to the next one.
  Continue,
  /// The run stopped; further steps return the same reason.
  Halted(HaltReason),
}

enum Advance {
  To(String),
  Halt(HaltReason),
}

/// Drives one run of a graph, one node per step.
///
/// The executor owns the run's [`RunState`]; everything that outlives the
/// run lives in the [`Session`] passed to each step.
pub struct GraphExecutor<'g> {
  graph: &'g WorkflowGraph,
  config: &'g RunConfig,
  run_id: String,
  state: RunState,
  started: bool,
  halt: Option<HaltReason>,
}

impl<'g> GraphExecutor<'g> {
  /// Start a run at the graph's entry point.
  pub fn new(graph: &'g WorkflowGraph, config: &'g RunConfig) -> Self {
    Self::resume_from(graph, config, graph.entry_point())
  }

  /// Start a run at an arbitrary node id.
  ///
  /// The id is not checked here; an unknown id halts the first step with
  /// [`HaltReason::GraphIntegrity`].
  pub fn resume_from(
    graph: &'g WorkflowGraph,
    config: &'g RunConfig,
    node_id: impl Into<String>,
  ) -> Self {
    Self {
      graph,
      config,
      run_id: uuid::Uuid::new_v4().to_string(),
      state: RunState::new(node_id),
      started: false,
      halt: None,
    }
  }

  pub fn run_id(&self) -> &str {
    &self.run_id
  }

  pub fn state(&self) -> &RunState {
    &self.state
  }

  pub fn history(&self) -> &[HistoryEntry] {
    &self.state.history
  }

  /// Execute the current node and advance.
  pub fn step(&mut self, session: &mut Session) -> Step {
    if let Some(halt) = &self.halt {
      return Step::Halted(halt.clone());
    }

    if !self.started {
      self.started = true;
      let entry_point = self.state.current_node.clone().unwrap_or_default();
      info!(
        run_id = %self.run_id,
        entry_point = %entry_point,
        macros = ?self.config.macros,
        "run_started"
      );
      session.notifier.notify(RunEvent::RunStarted {
        run_id: self.run_id.clone(),
        entry_point,
      });
    }

    let Some(node_id) = self.state.current_node.clone() else {
      return self.finish(session.notifier.as_ref(), HaltReason::Completed);
    };

    let graph = self.graph;
    let config = self.config;

    let Some(node) = graph.get_node(&node_id) else {
      error!(run_id = %self.run_id, node_id = %node_id, "node_not_found");
      return self.finish(
        session.notifier.as_ref(),
        HaltReason::GraphIntegrity { node: node_id },
      );
    };

    if session.breaker.is_open(&node.id) {
      warn!(run_id = %self.run_id, node_id = %node.id, "escalated_to_operator");
      return self.finish(
        session.notifier.as_ref(),
        HaltReason::EscalatedToOperator {
          node: node.id.clone(),
        },
      );
    }

    debug!(run_id = %self.run_id, node_id = %node.id, kind = %node.kind, "node_started");
    session.notifier.notify(RunEvent::NodeStarted {
      run_id: self.run_id.clone(),
      node_id: node.id.clone(),
    });

    let Session {
      services,
      handlers,
      breaker,
      notifier,
    } = session;
    let handler = handlers.get(&node.kind);
    let run_id = &self.run_id;
    let state = &mut self.state;

    let attempted = with_retry(
      &config.retry,
      |_| {
        let mut ctx = NodeContext {
          node,
          config,
          state: &mut *state,
          services: &mut *services,
        };
        handler.execute(&mut ctx)
      },
      |attempt, e| {
        let failures = breaker.record_failure(&node.id);
        warn!(
          run_id = %run_id,
          node_id = %node.id,
          attempt = attempt + 1,
          max_attempts = config.retry.max_attempts,
          failures,
          error = %e,
          "node_failed"
        );
        notifier.notify(RunEvent::NodeFailed {
          run_id: run_id.clone(),
          node_id: node.id.clone(),
          attempt: attempt + 1,
          error: e.to_string(),
        });
      },
    );

    let (result, macro_name) = match attempted {
      Ok(outcome) => {
        breaker.record_success(&node.id);
        (outcome.result, outcome.macro_name)
      }
      Err(_) => {
        if breaker.trip_if_exceeded(&node.id, config.retry.circuit_threshold) {
          let failures = breaker.failure_count(&node.id);
          error!(
            run_id = %run_id,
            node_id = %node.id,
            failures,
            threshold = config.retry.circuit_threshold,
            "circuit_opened"
          );
          notifier.notify(RunEvent::CircuitOpened {
            run_id: run_id.clone(),
            node_id: node.id.clone(),
            failures,
          });
        }
        (NodeResult::Condition(condition::FAILURE.to_string()), None)
      }
    };

    let (recorded, advance) = match result {
      NodeResult::Terminal => (condition::END.to_string(), Advance::Halt(HaltReason::Completed)),
      NodeResult::Condition(cond) => {
        let advance = match graph.next_node(&node.id, &cond) {
          Some(next) => Advance::To(next.to_string()),
          None => Advance::Halt(HaltReason::NoPathForward {
            node: node.id.clone(),
            result: cond.clone(),
          }),
        };
        (cond, advance)
      }
    };

    let mut entry = HistoryEntry::new(node.id.clone(), recorded, state.last_score);
    if let Some(macro_name) = macro_name {
      entry = entry.with_macro(macro_name);
    }
    info!(
      run_id = %run_id,
      node_id = %entry.node,
      result = %entry.result,
      score = entry.score,
      macro_name = ?entry.macro_name,
      "node_completed"
    );
    state.history.push(entry.clone());
    notifier.notify(RunEvent::NodeCompleted {
      run_id: run_id.clone(),
      entry,
    });

    match advance {
      Advance::To(next) => {
        self.state.current_node = Some(next);
        Step::Continue
      }
      Advance::Halt(halt) => self.finish(notifier.as_ref(), halt),
    }
  }

  /// Step until the run halts.
  #[instrument(
    name = "workflow_run",
    skip(self, session),
    fields(run_id = %self.run_id)
  )]
  pub fn run(mut self, session: &mut Session) -> RunOutcome {
    let halt = loop {
      if let Step::Halted(halt) = self.step(session) {
        break halt;
      }
    };

    RunOutcome {
      run_id: self.run_id,
      halt,
      history: self.state.history,
      output: self.state.output,
      last_score: self.state.last_score,
      loop_iterations: self.state.loop_iterations,
    }
  }

  fn finish(&mut self, notifier: &dyn EventNotifier, halt: HaltReason) -> Step {
    self.state.current_node = None;
    if halt.is_completed() {
      info!(
        run_id = %self.run_id,
        nodes = self.state.history.len(),
        last_score = self.state.last_score,
        "run_completed"
      );
    } else {
      warn!(run_id = %self.run_id, halt = ?halt, nodes = self.state.history.len(), "run_halted");
    }
    notifier.notify(RunEvent::RunHalted {
      run_id: self.run_id.clone(),
      halt: halt.clone(),
    });
    self.halt = Some(halt.clone());
    Step::Halted(halt)
  }
}

#[cfg(test)]
mod tests {
  use peg_config::{EdgeDef, GraphDef, NodeDef};
  use peg_scoring::FixedScorer;
  use peg_selector::{BanditSelector, InMemoryWeightStore};

  use super::*;

  fn graph(nodes: &[&str], edges: &[(&str, &str, Option<&str>)]) -> WorkflowGraph {
    WorkflowGraph::from_def(GraphDef {
      entry_point: nodes[0].to_string(),
      nodes: nodes.iter().map(|id| NodeDef::bare(*id)).collect(),
      edges: edges
        .iter()
        .map(|(from, to, cond)| EdgeDef {
          from: from.to_string(),
          to: to.to_string(),
          condition: cond.map(str::to_string),
        })
        .collect(),
    })
    .unwrap()
  }

  fn session() -> Session {
    let selector = BanditSelector::new(InMemoryWeightStore::new())
      .unwrap()
      .with_seed(1);
    Session::builder(selector).scorer(FixedScorer(0.9)).build()
  }

  #[test]
  fn test_step_by_step() {
    let graph = graph(&["intake", "export"], &[("intake", "export", None)]);
    let config = RunConfig::default();
    let mut session = session();
    let mut executor = GraphExecutor::new(&graph, &config);

    assert_eq!(executor.step(&mut session), Step::Continue);
    assert_eq!(executor.state().current_node.as_deref(), Some("export"));
    assert_eq!(executor.history().len(), 1);

    assert_eq!(executor.step(&mut session), Step::Halted(HaltReason::Completed));
    assert_eq!(executor.history()[1].result, "__end__");
    assert!(executor.state().current_node.is_none());

    // Halted executors stay halted.
    assert_eq!(executor.step(&mut session), Step::Halted(HaltReason::Completed));
    assert_eq!(executor.history().len(), 2);
  }

  #[test]
  fn test_unknown_resume_point_is_integrity_failure() {
    let graph = graph(&["intake"], &[]);
    let config = RunConfig::default();
    let mut session = session();

    let outcome = GraphExecutor::resume_from(&graph, &config, "ghost").run(&mut session);
    assert_eq!(
      outcome.halt,
      HaltReason::GraphIntegrity {
        node: "ghost".to_string()
      }
    );
    assert!(outcome.history.is_empty());
  }

  #[test]
  fn test_conditioned_edge_preferred_over_fallback() {
    let graph = graph(
      &["intake", "a", "b"],
      &[("intake", "a", None), ("intake", "b", Some("success"))],
    );
    let config = RunConfig::default();
    let mut session = session();

    let outcome = session.run(&graph, &config);
    let visited: Vec<_> = outcome.history.iter().map(|h| h.node.as_str()).collect();
    assert_eq!(visited, vec!["intake", "b"]);
    assert_eq!(
      outcome.halt,
      HaltReason::NoPathForward {
        node: "b".to_string(),
        result: "success".to_string()
      }
    );
  }
}
