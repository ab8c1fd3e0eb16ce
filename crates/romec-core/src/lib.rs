//! romec core library
//!
//! The compile-request dispatcher, the collaborator traits it sequences,
//! the diagnostics model and the ambient logging/config plumbing shared by
//! the romec binaries.

pub mod aggregator;
pub mod cancel;
pub mod collaborators;
pub mod config;
pub mod dispatcher;
pub mod domain;
pub mod fakes;
pub mod obs;
pub mod telemetry;

pub use aggregator::classify;
pub use cancel::{cancel_pair, CancelHandle, CancelSignal};
pub use collaborators::{Bundler, EntryResolver, Reporter, WorkerCompileClient};
pub use config::{CompilerConfig, ConfigError, ConfigResult};
pub use dispatcher::{CompilationDispatcher, DispatchPhase, Emitted, COMPILE_DIAGNOSTICS_MESSAGE};

pub use domain::{
    ArgLocation, CommandFlags, CommandResult, CompilationOutcome, CompileCommandError,
    CompileOptions, CompileResult, CompileStrategy, Diagnostic, DiagnosticsError, Resolution,
    ResolutionError, ResolvedEntry, ResolverOptions, Severity, SourceLocation, Suppression,
    TransportError, WorkerMode, DEFAULT_EXTENSIONS,
};

pub use obs::{
    emit_compile_failed, emit_compile_finished, emit_compile_started, emit_entry_resolved,
    request_span,
};
pub use telemetry::init_tracing;

/// romec version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
