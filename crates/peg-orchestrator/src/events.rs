//! Progress events for a graph run.
//!
//! Every node visit, failed attempt and circuit trip is reported to the
//! session's [`EventNotifier`]. The final [`RunOutcome`](crate::RunOutcome)
//! carries the same history; events expose it while the run is in flight.

use peg_workflow::HistoryEntry;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::result::HaltReason;

/// Events emitted during a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RunEvent {
  /// The run has started.
  RunStarted { run_id: String, entry_point: String },

  /// A node is about to execute.
  NodeStarted { run_id: String, node_id: String },

  /// An attempt at executing a node failed.
  NodeFailed {
    run_id: String,
    node_id: String,
    attempt: u32,
    error: String,
  },

  /// A node's circuit opened; the next visit escalates to an operator.
  CircuitOpened {
    run_id: String,
    node_id: String,
    failures: u32,
  },

  /// A node finished and its history entry was recorded.
  NodeCompleted { run_id: String, entry: HistoryEntry },

  /// The run stopped advancing.
  RunHalted { run_id: String, halt: HaltReason },
}

/// Sink for [`RunEvent`]s.
///
/// Called synchronously from the executor between node attempts, so an
/// implementation must not block for long.
pub trait EventNotifier: Send + Sync {
  fn notify(&self, event: RunEvent);
}

/// Drops every event. Used when a session has no notifier configured.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl EventNotifier for NoopNotifier {
  fn notify(&self, _event: RunEvent) {}
}

/// Forwards events into a tokio unbounded channel for a consumer on another
/// thread or task.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  sender: mpsc::UnboundedSender<RunEvent>,
}

impl ChannelNotifier {
  pub fn new(sender: mpsc::UnboundedSender<RunEvent>) -> Self {
    Self { sender }
  }

  /// Create a notifier together with the receiving end of its channel.
  pub fn channel() -> (Self, mpsc::UnboundedReceiver<RunEvent>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (Self::new(sender), receiver)
  }
}

impl EventNotifier for ChannelNotifier {
  fn notify(&self, event: RunEvent) {
    // Closed receiver: nobody is listening anymore.
    let _ = self.sender.send(event);
  }
}
