//! Compile request dispatch.
//!
//! [`CompilationDispatcher`] sequences one request through
//! `Validating → Resolving → Compiling → Classifying → {Emitting | Failing}`.
//! Each collaborator is called at most once, in that order, and the output
//! sink is written at most once, only after a clean classification.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, Instrument};
use uuid::Uuid;

use crate::aggregator::classify;
use crate::cancel::CancelSignal;
use crate::collaborators::{Bundler, EntryResolver, Reporter, WorkerCompileClient};
use crate::config::CompilerConfig;
use crate::domain::{
    ArgLocation, CommandFlags, CommandResult, CompilationOutcome, CompileCommandError,
    CompileOptions, CompileStrategy, DiagnosticsError, ResolverOptions, WorkerMode,
    DEFAULT_EXTENSIONS,
};
use crate::obs::{
    emit_compile_failed, emit_compile_finished, emit_compile_started, emit_entry_resolved,
    request_span,
};

/// Message attached to every diagnostics failure.
pub const COMPILE_DIAGNOSTICS_MESSAGE: &str = "Compile diagnostics";

/// Number of positional arguments the compile command takes.
const EXPECTED_ARGS: usize = 1;

/// Stages of a single request. Ordered; a request only moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DispatchPhase {
    Idle,
    Validating,
    Resolving,
    Compiling,
    Classifying,
    Emitting,
    Failing,
}

#[derive(Debug)]
struct PhaseTracker {
    current: DispatchPhase,
}

impl PhaseTracker {
    fn new() -> Self {
        Self {
            current: DispatchPhase::Idle,
        }
    }

    fn advance(&mut self, next: DispatchPhase) {
        debug_assert!(
            next > self.current,
            "phase went backwards: {:?} -> {:?}",
            self.current,
            next
        );
        debug!(from = ?self.current, to = ?next, "dispatch phase");
        self.current = next;
    }
}

/// What a successful request wrote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Emitted {
    pub entry: PathBuf,
    pub strategy: CompileStrategy,
    pub bytes: usize,
}

/// Orchestrates one compile request across the collaborators.
///
/// Holds no per-request state, so one dispatcher can serve concurrent
/// requests.
pub struct CompilationDispatcher {
    resolver: Arc<dyn EntryResolver>,
    worker: Arc<dyn WorkerCompileClient>,
    bundler: Arc<dyn Bundler>,
    reporter: Arc<dyn Reporter>,
    cwd: PathBuf,
    extensions: Vec<String>,
}

impl CompilationDispatcher {
    pub fn new(
        resolver: Arc<dyn EntryResolver>,
        worker: Arc<dyn WorkerCompileClient>,
        bundler: Arc<dyn Bundler>,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            resolver,
            worker,
            bundler,
            reporter,
            cwd: PathBuf::from("."),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }

    /// Directory relative source arguments are resolved against.
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = cwd.into();
        self
    }

    pub fn with_config(mut self, config: &CompilerConfig) -> Self {
        self.extensions = config.extensions.clone();
        self
    }

    /// Run a request that cannot be cancelled.
    pub async fn run(&self, args: &[String], flags: CommandFlags) -> CommandResult<Emitted> {
        self.run_with_cancel(args, flags, &CancelSignal::never()).await
    }

    /// Run a request, abandoning it as soon as `cancel` fires.
    ///
    /// A cancelled request never writes output; an in-flight collaborator
    /// call is dropped.
    pub async fn run_with_cancel(
        &self,
        args: &[String],
        flags: CommandFlags,
        cancel: &CancelSignal,
    ) -> CommandResult<Emitted> {
        let request_id = Uuid::new_v4().to_string();
        let source = args.first().map(String::as_str).unwrap_or_default();
        let span = request_span(&request_id, source);

        let result = self.dispatch(args, flags, cancel).instrument(span.clone()).await;
        if let Err(err) = &result {
            let _entered = span.enter();
            emit_compile_failed(err.kind(), err);
        }
        result
    }

    async fn dispatch(
        &self,
        args: &[String],
        flags: CommandFlags,
        cancel: &CancelSignal,
    ) -> CommandResult<Emitted> {
        let mut phase = PhaseTracker::new();

        phase.advance(DispatchPhase::Validating);
        if args.len() != EXPECTED_ARGS {
            return Err(CompileCommandError::Arity {
                expected: EXPECTED_ARGS,
                actual: args.len(),
            });
        }
        let source = args[0].as_str();
        let strategy = flags.strategy();
        emit_compile_started(source, strategy);

        phase.advance(DispatchPhase::Resolving);
        let options = self.resolver_options(source);
        let entry = cancel
            .guard(self.resolver.resolve(&options, ArgLocation::Arg { index: 0 }))
            .await??;
        emit_entry_resolved(source, &entry.path);

        phase.advance(DispatchPhase::Compiling);
        let result = match strategy {
            CompileStrategy::Bundle => cancel.guard(self.bundler.compile(&entry.path)).await??,
            CompileStrategy::Direct => {
                let options = CompileOptions::empty();
                let parse_options = CompileOptions::empty();
                cancel
                    .guard(self.worker.compile(
                        &entry.path,
                        WorkerMode::Compile,
                        &options,
                        &parse_options,
                    ))
                    .await??
            }
        };

        phase.advance(DispatchPhase::Classifying);
        let diagnostics_count = result.diagnostics.len();
        let suppressions_count = result.suppressions.len();
        let outcome = classify(result);
        emit_compile_finished(
            strategy,
            diagnostics_count,
            suppressions_count,
            outcome.is_success(),
        );

        match outcome {
            CompilationOutcome::Success { code } => {
                if cancel.is_cancelled() {
                    return Err(CompileCommandError::Cancelled);
                }
                phase.advance(DispatchPhase::Emitting);
                self.reporter.write_all(&code)?;
                Ok(Emitted {
                    entry: entry.path,
                    strategy,
                    bytes: code.len(),
                })
            }
            CompilationOutcome::Failure {
                diagnostics,
                suppressions,
            } => {
                phase.advance(DispatchPhase::Failing);
                let failure =
                    DiagnosticsError::new(COMPILE_DIAGNOSTICS_MESSAGE, diagnostics, suppressions);
                Err(failure.into())
            }
        }
    }

    fn resolver_options(&self, source: &str) -> ResolverOptions {
        ResolverOptions::new(self.cwd.clone(), source).with_extensions(self.extensions.clone())
    }
}
