//! Domain models for romec.
//!
//! Canonical definitions for the request-scoped entities:
//! - `CommandFlags` / `CompileStrategy`: what the user asked for
//! - `ResolverOptions` / `ResolvedEntry`: entry resolution
//! - `CompileResult` / `CompilationOutcome`: what a compile step produced
//! - `Diagnostic` / `Suppression`: reported and silenced problems

pub mod compile;
pub mod diagnostic;
pub mod entry;
pub mod error;
pub mod flags;

pub use compile::{CompilationOutcome, CompileOptions, CompileResult, WorkerMode};
pub use diagnostic::{Diagnostic, Severity, SourceLocation, Suppression};
pub use entry::{ArgLocation, Resolution, ResolvedEntry, ResolverOptions, DEFAULT_EXTENSIONS};
pub use error::{
    CommandResult, CompileCommandError, DiagnosticsError, ResolutionError, TransportError,
};
pub use flags::{CommandFlags, CompileStrategy};
