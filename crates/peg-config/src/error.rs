use thiserror::Error;

/// Errors raised while parsing or validating configuration documents.
#[derive(Debug, Error)]
pub enum ConfigError {
  /// The document is not valid JSON for its type.
  #[error("failed to parse {document} document: {source}")]
  Parse {
    document: &'static str,
    #[source]
    source: serde_json::Error,
  },

  /// A numeric field is outside its allowed range.
  #[error("invalid value for '{field}': {value} ({reason})")]
  OutOfRange {
    field: &'static str,
    value: String,
    reason: &'static str,
  },

  /// A macro name is empty or whitespace.
  #[error("macro names must not be empty")]
  EmptyMacroName,
}
