//! Error types for the codegraph-engine crate
//!
//! One closed kind set for the whole pipeline. The propagation rule:
//! budget breaches become stop reasons, programmer errors propagate,
//! internal failures degrade gracefully into partial results.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed query: unknown selector type, illegal connectivity, or
    /// direct execution outside the engine.
    #[error("invalid query: {message}")]
    InvalidQuery { message: String, suggestion: String },

    /// Traversal exceeded its wall-clock budget. Surfaced to callers as a
    /// partial `PathSet` with `StopReason::Timeout`, never as an error.
    #[error("query timed out after {elapsed_ms}ms (budget {timeout_ms}ms)")]
    QueryTimeout { elapsed_ms: u64, timeout_ms: u64 },

    /// Path budget breached. Internal only; becomes `StopReason::MaxPaths`.
    #[error("path limit exceeded: {limit}")]
    PathLimitExceeded { limit: usize },

    /// Node budget breached. Internal only; becomes `StopReason::MaxNodes`.
    #[error("node limit exceeded: {limit}")]
    NodeLimitExceeded { limit: usize },

    /// A single file failed to parse. The pipeline continues with the
    /// remaining files.
    #[error("parse error in {file_path}: {message}")]
    Parse { file_path: String, message: String },

    /// No builder or parser is registered for the language.
    #[error("unsupported language: {language}")]
    UnsupportedLanguage { language: String },

    /// Caller misuse (bad mode, missing project context, malformed
    /// selector). Re-raised verbatim.
    #[error("{0}")]
    User(String),

    /// Internal analysis failure. Converted into a partial `PathSet` with
    /// `StopReason::Error` plus diagnostics by the query engine.
    #[error("analysis error: {0}")]
    Analysis(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl EngineError {
    pub fn invalid_query(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        EngineError::InvalidQuery {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    pub fn parse(file_path: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::Parse {
            file_path: file_path.into(),
            message: message.into(),
        }
    }

    /// User errors propagate; everything else may be degraded into a
    /// partial result by the engine facade.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            EngineError::User(_) | EngineError::InvalidQuery { .. }
        )
    }

    /// Short kind tag used in diagnostics and log events.
    pub fn kind_str(&self) -> &'static str {
        match self {
            EngineError::InvalidQuery { .. } => "invalid_query",
            EngineError::QueryTimeout { .. } => "timeout",
            EngineError::PathLimitExceeded { .. } => "path_limit",
            EngineError::NodeLimitExceeded { .. } => "node_limit",
            EngineError::Parse { .. } => "parse",
            EngineError::UnsupportedLanguage { .. } => "unsupported_language",
            EngineError::User(_) => "user",
            EngineError::Analysis(_) => "analysis",
            EngineError::Serialization(_) => "serialization",
            EngineError::Internal(_) => "internal",
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_error_classification() {
        assert!(EngineError::User("bad mode".into()).is_user_error());
        assert!(EngineError::invalid_query("direct execution", "use the engine").is_user_error());
        assert!(!EngineError::Analysis("boom".into()).is_user_error());
    }

    #[test]
    fn test_error_display() {
        let err = EngineError::parse("test.py", "unexpected token");
        let msg = format!("{}", err);
        assert!(msg.contains("test.py"));
        assert!(msg.contains("unexpected token"));
    }
}
