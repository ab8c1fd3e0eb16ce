//! Compile results, outcomes and the worker request vocabulary.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::diagnostic::{Diagnostic, Suppression};

/// What a worker or bundler hands back for one entry.
///
/// `compiled_code` is only meaningful when `diagnostics` is empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CompileResult {
    pub compiled_code: String,
    pub diagnostics: Vec<Diagnostic>,
    pub suppressions: Vec<Suppression>,
}

impl CompileResult {
    /// A clean result carrying only code.
    pub fn code(compiled_code: impl Into<String>) -> Self {
        Self {
            compiled_code: compiled_code.into(),
            diagnostics: Vec::new(),
            suppressions: Vec::new(),
        }
    }

    pub fn with_diagnostics(mut self, diagnostics: Vec<Diagnostic>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn with_suppressions(mut self, suppressions: Vec<Suppression>) -> Self {
        self.suppressions = suppressions;
        self
    }
}

/// Classification of a [`CompileResult`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompilationOutcome {
    Success {
        code: String,
    },
    Failure {
        diagnostics: Vec<Diagnostic>,
        suppressions: Vec<Suppression>,
    },
}

impl CompilationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CompilationOutcome::Success { .. })
    }
}

/// Operation tag sent to a compile worker.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum WorkerMode {
    Compile,
}

impl WorkerMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerMode::Compile => "compile",
        }
    }
}

impl std::fmt::Display for WorkerMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Free-form option bag forwarded to a worker.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct CompileOptions(pub BTreeMap<String, serde_json::Value>);

impl CompileOptions {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
