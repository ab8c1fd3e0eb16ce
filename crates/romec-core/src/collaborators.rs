//! Collaborator trait definitions for the compile dispatcher.
//!
//! These traits define the seams the dispatcher sequences:
//! - `EntryResolver`: maps a raw source argument to a canonical entry
//! - `WorkerCompileClient`: single-file compilation in a worker process
//! - `Bundler`: whole-program compilation from an entry
//! - `Reporter`: sink for emitted code
//!
//! Resolution and compilation are async and backend-agnostic. In-memory
//! fakes are provided for testing via the `fakes` module.

use std::path::Path;

use async_trait::async_trait;

use crate::domain::{
    ArgLocation, CompileOptions, CompileResult, ResolutionError, ResolvedEntry, ResolverOptions,
    TransportError, WorkerMode,
};

/// Resolves a raw source path to a compilable entry.
///
/// Failures are located: the returned error points at `location`.
#[async_trait]
pub trait EntryResolver: Send + Sync {
    async fn resolve(
        &self,
        options: &ResolverOptions,
        location: ArgLocation,
    ) -> Result<ResolvedEntry, ResolutionError>;
}

/// Compiles a single file out of process.
///
/// A returned `Ok` may still carry diagnostics; `Err` means the worker
/// invocation itself failed.
#[async_trait]
pub trait WorkerCompileClient: Send + Sync {
    async fn compile(
        &self,
        path: &Path,
        mode: WorkerMode,
        options: &CompileOptions,
        parse_options: &CompileOptions,
    ) -> Result<CompileResult, TransportError>;
}

/// Compiles a whole module graph rooted at an entry.
///
/// Results have the same shape as [`WorkerCompileClient::compile`].
#[async_trait]
pub trait Bundler: Send + Sync {
    async fn compile(&self, path: &Path) -> Result<CompileResult, TransportError>;
}

/// Receives the compiled output of a successful request.
pub trait Reporter: Send + Sync {
    /// Write the full output as one unit.
    fn write_all(&self, code: &str) -> std::io::Result<()>;
}
