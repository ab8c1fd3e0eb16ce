//! romec toolchain
//!
//! Concrete collaborators for the romec dispatcher: a filesystem entry
//! resolver, the single-file transform and the worker process that runs it,
//! a module-graph bundler and stdout reporting.

pub mod bundler;
pub mod protocol;
pub mod reporter;
pub mod resolver;
pub mod transform;
pub mod worker;

pub use bundler::{
    scan_imports, GraphBundler, ImportRef, UNRESOLVED_IMPORT, UNSUPPORTED_MODULE_SYNTAX,
};
pub use protocol::{handle_request, serve_worker, WorkerRequest, WorkerResponse};
pub use reporter::{StdoutReporter, WriterReporter};
pub use resolver::{probe, FsEntryResolver, Probe};
pub use transform::{compile_source, transform_source, Transformed};
pub use worker::ProcessWorkerClient;
