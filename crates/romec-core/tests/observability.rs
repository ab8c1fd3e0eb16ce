//! Observability tests for compile request tracing.

use std::path::Path;

use romec_core::{
    emit_compile_failed, emit_compile_finished, emit_compile_started, emit_entry_resolved,
    request_span, CompileStrategy,
};
use tracing_test::traced_test;

#[traced_test]
#[test]
fn test_emit_compile_started_logs_source_and_strategy() {
    emit_compile_started("src/a.js", CompileStrategy::Direct);

    assert!(logs_contain("compile.started"));
    assert!(logs_contain("src/a.js"));
    assert!(logs_contain("direct"));
}

#[traced_test]
#[test]
fn test_emit_entry_resolved_logs_entry() {
    emit_entry_resolved("src/a", Path::new("/work/src/a.ts"));

    assert!(logs_contain("compile.entry_resolved"));
    assert!(logs_contain("/work/src/a.ts"));
}

#[traced_test]
#[test]
fn test_emit_compile_finished_logs_counts() {
    emit_compile_finished(CompileStrategy::Bundle, 2, 1, false);

    assert!(logs_contain("compile.finished"));
    assert!(logs_contain("diagnostics=2"));
    assert!(logs_contain("suppressions=1"));
}

#[traced_test]
#[test]
fn test_emit_compile_failed_logs_warning() {
    emit_compile_failed("transport", &"worker exited with status 1");

    assert!(logs_contain("compile.failed"));
    assert!(logs_contain("WARN"));
}

#[traced_test]
#[test]
fn test_request_span_tags_events() {
    let span = request_span("req-42", "src/b.js");
    let _entered = span.enter();
    emit_compile_started("src/b.js", CompileStrategy::Bundle);

    assert!(logs_contain("req-42"));
}
