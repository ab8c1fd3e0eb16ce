//! Diagnostic and suppression records reported by compile steps.

use serde::{Deserialize, Serialize};

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(s)
    }
}

/// Position inside a source file (1-indexed line and column).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// A single compilation problem.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Diagnostic {
    /// Slash-separated category (e.g. "parse/unterminatedString").
    pub category: String,

    /// Human-readable message.
    pub message: String,

    pub severity: Severity,

    /// Where the problem was found, when known.
    pub location: Option<SourceLocation>,
}

impl Diagnostic {
    /// Create an error-level diagnostic without a location.
    pub fn new(category: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            message: message.into(),
            severity: Severity::Error,
            location: None,
        }
    }

    /// Set the source location.
    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    /// Set the severity.
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

/// A diagnostic that a `rome-ignore` comment silenced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Suppression {
    /// Category named by the suppression comment.
    pub category: String,

    /// Location of the suppressed diagnostic.
    pub location: SourceLocation,
}

impl Suppression {
    pub fn new(category: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            category: category.into(),
            location,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Warning < Severity::Error);
    }

    #[test]
    fn test_severity_serializes_snake_case() {
        let json = serde_json::to_string(&Severity::Warning).expect("serialize");
        assert_eq!(json, "\"warning\"");
    }

    #[test]
    fn test_diagnostic_builder() {
        let diag = Diagnostic::new("lint/noDebugger", "unexpected debugger statement")
            .with_location(SourceLocation::new("src/a.js", 3, 5))
            .with_severity(Severity::Warning);

        assert_eq!(diag.category, "lint/noDebugger");
        assert_eq!(diag.severity, Severity::Warning);
        assert_eq!(
            diag.location.as_ref().map(ToString::to_string).as_deref(),
            Some("src/a.js:3:5")
        );
    }

    #[test]
    fn test_diagnostic_defaults_to_error() {
        let diag = Diagnostic::new("parse/unclosedDelimiter", "unclosed `{`");
        assert_eq!(diag.severity, Severity::Error);
        assert!(diag.location.is_none());
    }
}
