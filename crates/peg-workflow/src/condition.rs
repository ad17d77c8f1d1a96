//! Result strings produced by the built-in node behaviors.
//!
//! Edge conditions in a graph document are matched against these.

pub const SUCCESS: &str = "success";
pub const FAILURE: &str = "failure";
pub const SCORE_PASSED: &str = "score_passed";
pub const VALIDATION_FAILED: &str = "validation_failed";
pub const LOOP_DETECTED: &str = "loop_detected";
pub const LOOP_NOT_DETECTED: &str = "loop_not_detected";

/// Recorded in history for the node that ended the run.
pub const END: &str = "__end__";
