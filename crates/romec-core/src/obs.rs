//! Structured observability hooks for compile requests.
//!
//! This module provides:
//! - Request-scoped tracing spans via [`request_span`]
//! - Emission functions for the request lifecycle: start, entry resolved,
//!   finish and failure
//!
//! Events are emitted at `info!` level except failures, which use `warn!`.

use std::path::Path;

use tracing::info;

use crate::domain::CompileStrategy;

/// Build the span a compile request runs in.
///
/// Attach it to the request future with `tracing::Instrument`; an entered
/// guard must not be held across `.await`.
///
/// # Example
///
/// ```ignore
/// dispatch(args).instrument(request_span("7f0c...", "src/a.js")).await
/// ```
pub fn request_span(request_id: &str, source: &str) -> tracing::Span {
    tracing::info_span!("romec.compile", request_id = %request_id, source = %source)
}

/// Emit event: compile request accepted.
pub fn emit_compile_started(source: &str, strategy: CompileStrategy) {
    info!(event = "compile.started", source = %source, strategy = %strategy);
}

/// Emit event: source argument resolved to an entry.
pub fn emit_entry_resolved(source: &str, entry: &Path) {
    info!(
        event = "compile.entry_resolved",
        source = %source,
        entry = %entry.display(),
    );
}

/// Emit event: compile step returned and was classified.
pub fn emit_compile_finished(
    strategy: CompileStrategy,
    diagnostics: usize,
    suppressions: usize,
    success: bool,
) {
    info!(
        event = "compile.finished",
        strategy = %strategy,
        diagnostics = diagnostics,
        suppressions = suppressions,
        success = success,
    );
}

/// Emit event: request ended in an error (warning level).
pub fn emit_compile_failed(kind: &str, error: &dyn std::fmt::Display) {
    tracing::warn!(event = "compile.failed", kind = %kind, error = %error);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_span_create() {
        let span = request_span("req-1", "src/a.js");
        let _entered = span.enter();
    }
}
