//! Error taxonomy for a compile request.

use std::path::PathBuf;

use super::diagnostic::{Diagnostic, Suppression};
use super::entry::ArgLocation;

/// The source argument could not be mapped to a compilable file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("could not resolve {} ({location}): {reason}", source_path.display())]
pub struct ResolutionError {
    pub source_path: PathBuf,
    pub location: ArgLocation,
    pub reason: String,
}

impl ResolutionError {
    pub fn new(
        source_path: impl Into<PathBuf>,
        location: ArgLocation,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            source_path: source_path.into(),
            location,
            reason: reason.into(),
        }
    }
}

/// The worker or bundler invocation itself failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{operation} failed: {reason}")]
pub struct TransportError {
    pub operation: String,
    pub reason: String,
}

impl TransportError {
    pub fn new(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            reason: reason.into(),
        }
    }
}

/// Compilation produced diagnostics; carries them and the suppressions verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}: {} diagnostic(s), {} suppressed", diagnostics.len(), suppressions.len())]
pub struct DiagnosticsError {
    pub message: String,
    pub diagnostics: Vec<Diagnostic>,
    pub suppressions: Vec<Suppression>,
}

impl DiagnosticsError {
    pub fn new(
        message: impl Into<String>,
        diagnostics: Vec<Diagnostic>,
        suppressions: Vec<Suppression>,
    ) -> Self {
        Self {
            message: message.into(),
            diagnostics,
            suppressions,
        }
    }
}

/// Every way a compile request can end without emitting code.
#[derive(Debug, thiserror::Error)]
pub enum CompileCommandError {
    #[error("expected {expected} argument(s) but got {actual}")]
    Arity { expected: usize, actual: usize },

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Diagnostics(#[from] DiagnosticsError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("compile request cancelled")]
    Cancelled,

    #[error("failed to write compiled output: {0}")]
    Output(#[from] std::io::Error),
}

impl CompileCommandError {
    /// Stable short name, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            CompileCommandError::Arity { .. } => "arity",
            CompileCommandError::Resolution(_) => "resolution",
            CompileCommandError::Diagnostics(_) => "diagnostics",
            CompileCommandError::Transport(_) => "transport",
            CompileCommandError::Cancelled => "cancelled",
            CompileCommandError::Output(_) => "output",
        }
    }
}

/// Result type for compile requests.
pub type CommandResult<T> = std::result::Result<T, CompileCommandError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arity_error_display() {
        let err = CompileCommandError::Arity {
            expected: 1,
            actual: 2,
        };
        assert_eq!(err.to_string(), "expected 1 argument(s) but got 2");
        assert_eq!(err.kind(), "arity");
    }

    #[test]
    fn test_resolution_error_is_located() {
        let err =
            ResolutionError::new("src/missing.js", ArgLocation::Arg { index: 0 }, "not found");
        let msg = CompileCommandError::from(err).to_string();
        assert!(msg.contains("src/missing.js"));
        assert!(msg.contains("argument #1"));
        assert!(msg.contains("not found"));
    }

    #[test]
    fn test_diagnostics_error_counts() {
        let err = DiagnosticsError::new(
            "Compile diagnostics",
            vec![Diagnostic::new("parse/unclosedDelimiter", "unclosed `(`")],
            Vec::new(),
        );
        assert_eq!(err.to_string(), "Compile diagnostics: 1 diagnostic(s), 0 suppressed");
    }

    #[test]
    fn test_transport_error_display() {
        let err = TransportError::new("worker compile", "timed out after 30s");
        assert_eq!(err.to_string(), "worker compile failed: timed out after 30s");
    }
}
