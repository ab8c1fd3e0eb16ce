//! In-memory fakes for the collaborator traits (testing only)
//!
//! Provides `SpyResolver`, `ScriptedWorker`, `ScriptedBundler` and
//! `MemoryReporter`. Each records its calls so tests can assert which
//! collaborators a request reached.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::collaborators::{Bundler, EntryResolver, Reporter, WorkerCompileClient};
use crate::domain::{
    ArgLocation, CompileOptions, CompileResult, Resolution, ResolutionError, ResolvedEntry,
    ResolverOptions, TransportError, WorkerMode,
};

// ---------------------------------------------------------------------------
// SpyResolver
// ---------------------------------------------------------------------------

/// Resolver that echoes the joined source path, or fails with a fixed reason.
#[derive(Debug, Default)]
pub struct SpyResolver {
    failure: Option<String>,
    calls: Mutex<Vec<(ResolverOptions, ArgLocation)>>,
}

impl SpyResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails with `reason`.
    pub fn failing(reason: &str) -> Self {
        Self {
            failure: Some(reason.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<(ResolverOptions, ArgLocation)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl EntryResolver for SpyResolver {
    async fn resolve(
        &self,
        options: &ResolverOptions,
        location: ArgLocation,
    ) -> Result<ResolvedEntry, ResolutionError> {
        self.calls
            .lock()
            .unwrap()
            .push((options.clone(), location.clone()));

        match &self.failure {
            Some(reason) => Err(ResolutionError::new(
                options.source.clone(),
                location,
                reason.clone(),
            )),
            None => Ok(ResolvedEntry::new(
                options.joined_source(),
                options.source.to_string_lossy(),
                Resolution::Exact,
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// ScriptedWorker
// ---------------------------------------------------------------------------

/// One recorded worker invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerCall {
    pub path: PathBuf,
    pub mode: WorkerMode,
    pub options: CompileOptions,
    pub parse_options: CompileOptions,
}

#[derive(Debug, Clone)]
enum Script {
    Respond(Result<CompileResult, TransportError>),
    Hang,
}

impl Script {
    async fn play(&self) -> Result<CompileResult, TransportError> {
        match self {
            Script::Respond(result) => result.clone(),
            Script::Hang => std::future::pending().await,
        }
    }
}

/// Worker client that replays a fixed response.
#[derive(Debug)]
pub struct ScriptedWorker {
    script: Script,
    calls: Mutex<Vec<WorkerCall>>,
}

impl ScriptedWorker {
    pub fn returning(result: CompileResult) -> Self {
        Self::with_script(Script::Respond(Ok(result)))
    }

    pub fn failing(error: TransportError) -> Self {
        Self::with_script(Script::Respond(Err(error)))
    }

    /// Every call suspends forever.
    pub fn hanging() -> Self {
        Self::with_script(Script::Hang)
    }

    fn with_script(script: Script) -> Self {
        Self {
            script,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<WorkerCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl WorkerCompileClient for ScriptedWorker {
    async fn compile(
        &self,
        path: &Path,
        mode: WorkerMode,
        options: &CompileOptions,
        parse_options: &CompileOptions,
    ) -> Result<CompileResult, TransportError> {
        self.calls.lock().unwrap().push(WorkerCall {
            path: path.to_path_buf(),
            mode,
            options: options.clone(),
            parse_options: parse_options.clone(),
        });
        self.script.play().await
    }
}

// ---------------------------------------------------------------------------
// ScriptedBundler
// ---------------------------------------------------------------------------

/// Bundler that replays a fixed response.
#[derive(Debug)]
pub struct ScriptedBundler {
    script: Script,
    calls: Mutex<Vec<PathBuf>>,
}

impl ScriptedBundler {
    pub fn returning(result: CompileResult) -> Self {
        Self::with_script(Script::Respond(Ok(result)))
    }

    pub fn failing(error: TransportError) -> Self {
        Self::with_script(Script::Respond(Err(error)))
    }

    pub fn hanging() -> Self {
        Self::with_script(Script::Hang)
    }

    fn with_script(script: Script) -> Self {
        Self {
            script,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<PathBuf> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Bundler for ScriptedBundler {
    async fn compile(&self, path: &Path) -> Result<CompileResult, TransportError> {
        self.calls.lock().unwrap().push(path.to_path_buf());
        self.script.play().await
    }
}

// ---------------------------------------------------------------------------
// MemoryReporter
// ---------------------------------------------------------------------------

/// Reporter that keeps every write in memory.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    broken: bool,
    writes: Mutex<Vec<String>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every write fails with `BrokenPipe`.
    pub fn broken() -> Self {
        Self {
            broken: true,
            writes: Mutex::new(Vec::new()),
        }
    }

    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }
}

impl Reporter for MemoryReporter {
    fn write_all(&self, code: &str) -> std::io::Result<()> {
        if self.broken {
            return Err(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "reporter closed",
            ));
        }
        self.writes.lock().unwrap().push(code.to_string());
        Ok(())
    }
}
