//! Macro execution seam.
//!
//! Running a macro (generating code, documents, ...) happens outside the
//! orchestrator. The build node only needs something that turns a macro name
//! into an [`Artifact`].

use peg_workflow::Artifact;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MacroError {
  #[error("unknown macro: {0}")]
  Unknown(String),

  #[error("macro '{macro_name}' failed: {message}")]
  Failed { macro_name: String, message: String },
}

/// Executes a macro and returns its output.
pub trait MacroRunner: Send + Sync {
  fn run(&self, macro_name: &str) -> Result<Artifact, MacroError>;
}

impl<F> MacroRunner for F
where
  F: Fn(&str) -> Result<Artifact, MacroError> + Send + Sync,
{
  fn run(&self, macro_name: &str) -> Result<Artifact, MacroError> {
    self(macro_name)
  }
}

/// Stand-in runner that tags a placeholder output with the macro name.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedMacroRunner;

impl MacroRunner for SimulatedMacroRunner {
  fn run(&self, macro_name: &str) -> Result<Artifact, MacroError> {
    Ok(Artifact::new(
      macro_name,
      serde_json::json!({ "content": format!("Output from {macro_name}") }),
    ))
  }
}
