//! Success/failure classification of compile results.

use crate::domain::{CompilationOutcome, CompileResult};

/// Classify a compile result.
///
/// Fails iff `diagnostics` is non-empty. Suppressions are carried through
/// untouched and never change the decision: `diagnostics` only holds
/// surfaced problems, even when a suppression names the same category.
pub fn classify(result: CompileResult) -> CompilationOutcome {
    let CompileResult {
        compiled_code,
        diagnostics,
        suppressions,
    } = result;

    if diagnostics.is_empty() {
        CompilationOutcome::Success {
            code: compiled_code,
        }
    } else {
        CompilationOutcome::Failure {
            diagnostics,
            suppressions,
        }
    }
}
