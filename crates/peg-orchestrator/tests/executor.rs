use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use peg_config::{EdgeDef, GraphDef, NodeDef, RetryConfig, RunConfig};
use peg_orchestrator::{
  ChannelNotifier, HaltReason, NodeContext, NodeError, NodeHandler, NodeOutcome, RunEvent,
  Session,
};
use peg_scoring::FixedScorer;
use peg_selector::{BanditSelector, InMemoryWeightStore};
use peg_workflow::{NodeKind, WorkflowGraph};

fn edge(from: &str, to: &str, condition: Option<&str>) -> EdgeDef {
  EdgeDef {
    from: from.to_string(),
    to: to.to_string(),
    condition: condition.map(str::to_string),
  }
}

fn graph(nodes: &[&str], edges: Vec<EdgeDef>) -> WorkflowGraph {
  WorkflowGraph::from_def(GraphDef {
    entry_point: nodes[0].to_string(),
    nodes: nodes.iter().map(|id| NodeDef::bare(*id)).collect(),
    edges,
  })
  .unwrap()
}

/// intake -> build -> review -> (export | loop_detector -> (build | escalate))
fn pipeline() -> WorkflowGraph {
  graph(
    &[
      "intake",
      "build",
      "review",
      "loop_detector",
      "export",
      "escalate",
    ],
    vec![
      edge("intake", "build", None),
      edge("build", "review", Some("success")),
      edge("review", "export", Some("score_passed")),
      edge("review", "loop_detector", Some("validation_failed")),
      edge("loop_detector", "escalate", Some("loop_detected")),
      edge("loop_detector", "build", Some("loop_not_detected")),
    ],
  )
}

fn config(macros: &[&str], max_attempts: u32, circuit_threshold: u32) -> RunConfig {
  RunConfig {
    macros: macros.iter().map(|m| m.to_string()).collect(),
    retry: RetryConfig {
      max_attempts,
      circuit_threshold,
      base_delay_ms: 0,
    },
    ..RunConfig::default()
  }
}

fn selector() -> BanditSelector {
  BanditSelector::new(InMemoryWeightStore::new())
    .unwrap()
    .with_seed(42)
}

fn visited(outcome: &peg_orchestrator::RunOutcome) -> Vec<&str> {
  outcome.history.iter().map(|h| h.node.as_str()).collect()
}

/// Fails until it has been called `failures` times.
struct Flaky {
  calls: Arc<AtomicU32>,
  failures: u32,
}

impl Flaky {
  fn new(failures: u32) -> Self {
    Self {
      calls: Arc::new(AtomicU32::new(0)),
      failures,
    }
  }

  /// Shared view of the call count, readable after the handler is moved
  /// into a session.
  fn calls(&self) -> Arc<AtomicU32> {
    Arc::clone(&self.calls)
  }
}

impl NodeHandler for Flaky {
  fn execute(&self, _ctx: &mut NodeContext<'_>) -> Result<NodeOutcome, NodeError> {
    let call = self.calls.fetch_add(1, Ordering::SeqCst);
    if call < self.failures {
      Err(NodeError::Failed(format!("flaky call {call}")))
    } else {
      Ok(NodeOutcome::condition("success"))
    }
  }
}

#[test]
fn test_passing_review_completes() {
  let graph = pipeline();
  let config = config(&["macro_A"], 3, 5);
  let mut session = Session::builder(selector())
    .scorer(FixedScorer(0.9))
    .build();

  let outcome = session.run(&graph, &config);

  assert_eq!(outcome.halt, HaltReason::Completed);
  assert_eq!(visited(&outcome), vec!["intake", "build", "review", "export"]);
  assert_eq!(outcome.history[1].macro_name.as_deref(), Some("macro_A"));
  assert_eq!(outcome.history[2].result, "score_passed");
  assert_eq!(outcome.history[3].result, "__end__");
  assert_eq!(outcome.last_score, 0.9);
  assert_eq!(outcome.loop_iterations, 0);
  assert_eq!(outcome.output.unwrap().macro_name, "macro_A");
}

#[test]
fn test_stagnating_review_escalates_through_loop_detector() {
  let graph = pipeline();
  let config = config(&["macro_A"], 3, 5);
  let mut session = Session::builder(selector())
    .scorer(FixedScorer(0.5))
    .build();

  let outcome = session.run(&graph, &config);

  // The first build is recorded before any review, so it carries score 0.0
  // and the window only goes flat after the fourth build.
  assert_eq!(
    outcome.halt,
    HaltReason::NoPathForward {
      node: "escalate".to_string(),
      result: "success".to_string(),
    }
  );
  assert_eq!(outcome.history.len(), 14);
  assert_eq!(
    outcome
      .history
      .iter()
      .filter(|h| h.node == "build")
      .count(),
    4
  );
  assert_eq!(outcome.history[12].node, "loop_detector");
  assert_eq!(outcome.history[12].result, "loop_detected");
  assert_eq!(outcome.loop_iterations, 4);
  assert_eq!(outcome.last_score, 0.5);
  assert_eq!(session.selector().selections(), 4);
}

#[test]
fn test_retry_recovers_transient_failures() {
  let graph = graph(&["flaky", "export"], vec![edge("flaky", "export", Some("success"))]);
  let config = config(&[], 3, 5);
  let (notifier, mut events) = ChannelNotifier::channel();
  let mut session = Session::builder(selector())
    .handler(NodeKind::from_id("flaky"), Flaky::new(2))
    .notifier(notifier)
    .build();

  let outcome = session.run(&graph, &config);

  assert_eq!(outcome.halt, HaltReason::Completed);
  assert_eq!(outcome.history[0].result, "success");
  assert_eq!(session.circuit_breaker().failure_count("flaky"), 0);

  let mut failed_attempts = Vec::new();
  while let Ok(event) = events.try_recv() {
    if let RunEvent::NodeFailed { attempt, .. } = event {
      failed_attempts.push(attempt);
    }
  }
  assert_eq!(failed_attempts, vec![1, 2]);
}

#[test]
fn test_exhausted_retries_produce_failure_result() {
  let graph = graph(
    &["flaky", "export", "fallback"],
    vec![
      edge("flaky", "export", Some("success")),
      edge("flaky", "fallback", Some("failure")),
    ],
  );
  let config = config(&[], 2, 5);
  let mut session = Session::builder(selector())
    .handler(NodeKind::from_id("flaky"), Flaky::new(u32::MAX))
    .build();

  let outcome = session.run(&graph, &config);

  assert_eq!(visited(&outcome), vec!["flaky", "fallback"]);
  assert_eq!(outcome.history[0].result, "failure");
  assert_eq!(session.circuit_breaker().failure_count("flaky"), 2);
  assert!(!session.circuit_breaker().is_open("flaky"));
}

#[test]
fn test_circuit_opens_after_cumulative_failures() {
  let graph = graph(
    &["flaky", "export"],
    vec![edge("flaky", "export", Some("failure"))],
  );
  let config = config(&[], 1, 3);
  let flaky = Flaky::new(u32::MAX);
  let calls = flaky.calls();
  let mut session = Session::builder(selector())
    .handler(NodeKind::from_id("flaky"), flaky)
    .build();

  for _ in 0..2 {
    let outcome = session.run(&graph, &config);
    assert_eq!(outcome.halt, HaltReason::Completed);
    assert!(!session.circuit_breaker().is_open("flaky"));
  }

  let outcome = session.run(&graph, &config);
  assert_eq!(outcome.history[0].result, "failure");
  assert!(session.circuit_breaker().is_open("flaky"));
  assert_eq!(calls.load(Ordering::SeqCst), 3);

  let outcome = session.run(&graph, &config);
  assert_eq!(
    outcome.halt,
    HaltReason::EscalatedToOperator {
      node: "flaky".to_string()
    }
  );
  assert!(outcome.history.is_empty());
  assert_eq!(calls.load(Ordering::SeqCst), 3);

  session.reset_circuits();
  let outcome = session.run(&graph, &config);
  assert_eq!(outcome.halt, HaltReason::Completed);
  assert_eq!(outcome.history.len(), 2);
  assert_eq!(calls.load(Ordering::SeqCst), 4);
}

#[test]
fn test_build_without_macros_fails_the_node() {
  let graph = graph(
    &["build", "review"],
    vec![edge("build", "review", Some("success"))],
  );
  let config = config(&[], 2, 5);
  let mut session = Session::builder(selector()).build();

  let outcome = session.run(&graph, &config);

  assert_eq!(
    outcome.halt,
    HaltReason::NoPathForward {
      node: "build".to_string(),
      result: "failure".to_string(),
    }
  );
  assert!(outcome.output.is_none());
  assert_eq!(outcome.history[0].macro_name, None);
  assert_eq!(session.selector().selections(), 0);
}

#[test]
fn test_events_follow_the_run() {
  let graph = pipeline();
  let config = config(&["macro_A", "macro_B"], 3, 5);
  let (notifier, mut events) = ChannelNotifier::channel();
  let mut session = Session::builder(selector())
    .scorer(FixedScorer(0.95))
    .notifier(notifier)
    .build();

  let outcome = session.run(&graph, &config);

  let mut received = Vec::new();
  while let Ok(event) = events.try_recv() {
    received.push(event);
  }

  match received.first() {
    Some(RunEvent::RunStarted {
      run_id,
      entry_point,
    }) => {
      assert_eq!(run_id, &outcome.run_id);
      assert_eq!(entry_point, "intake");
    }
    other => panic!("expected RunStarted, got {other:?}"),
  }
  match received.last() {
    Some(RunEvent::RunHalted { halt, .. }) => assert_eq!(halt, &HaltReason::Completed),
    other => panic!("expected RunHalted, got {other:?}"),
  }

  let completed: Vec<_> = received
    .iter()
    .filter_map(|e| match e {
      RunEvent::NodeCompleted { entry, .. } => Some(entry.clone()),
      _ => None,
    })
    .collect();
  assert_eq!(completed, outcome.history);
}

#[test]
fn test_session_keeps_learning_across_runs() {
  let graph = pipeline();
  let config = config(&["macro_A", "macro_B"], 3, 5);
  let store = InMemoryWeightStore::new();
  let selector = BanditSelector::new(store.clone()).unwrap().with_seed(3);
  let mut session = Session::builder(selector)
    .scorer(FixedScorer(0.9))
    .build();

  session.run(&graph, &config);
  session.run(&graph, &config);

  assert_eq!(session.selector().selections(), 2);
  let persisted = store.snapshot();
  assert!(persisted.contains_key("macro_A"));
  assert!(persisted.contains_key("macro_B"));
}
