//! Out-of-process single-file compilation.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, instrument};

use romec_core::{
    CompileOptions, CompileResult, CompilerConfig, TransportError, WorkerCompileClient, WorkerMode,
};

use crate::protocol::{WorkerRequest, WorkerResponse};

const OPERATION: &str = "worker compile";

fn transport(reason: impl Into<String>) -> TransportError {
    TransportError::new(OPERATION, reason)
}

/// Spawns a fresh worker process per compile request.
#[derive(Debug, Clone)]
pub struct ProcessWorkerClient {
    program: PathBuf,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl ProcessWorkerClient {
    /// Run `program worker` with a 30 second timeout.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: vec!["worker".to_string()],
            timeout: Some(Duration::from_secs(30)),
        }
    }

    /// Use the configured worker program if set, otherwise `fallback`.
    pub fn from_config(config: &CompilerConfig, fallback: impl Into<PathBuf>) -> Self {
        let program = config
            .worker_program
            .clone()
            .unwrap_or_else(|| fallback.into());
        Self::new(program).with_timeout(config.worker_timeout())
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// `None` waits indefinitely.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

#[async_trait]
impl WorkerCompileClient for ProcessWorkerClient {
    #[instrument(skip(self, options, parse_options), fields(path = %path.display()))]
    async fn compile(
        &self,
        path: &Path,
        mode: WorkerMode,
        options: &CompileOptions,
        parse_options: &CompileOptions,
    ) -> Result<CompileResult, TransportError> {
        let start = Instant::now();
        let request = WorkerRequest {
            path: path.to_path_buf(),
            mode,
            options: options.clone(),
            parse_options: parse_options.clone(),
        };
        let payload = serde_json::to_vec(&request)
            .map_err(|e| transport(format!("failed to encode request: {e}")))?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| transport(format!("failed to spawn {}: {}", self.program.display(), e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(&payload).await {
                Ok(()) => {}
                // the exit status and output decide what happened
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
                Err(e) => return Err(transport(format!("failed to send request: {e}"))),
            }
        }

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| transport(format!("timed out after {} seconds", limit.as_secs())))?,
            None => child.wait_with_output().await,
        }
        .map_err(|e| transport(format!("failed to collect worker output: {e}")))?;

        debug!(
            duration_ms = start.elapsed().as_millis() as u64,
            status = %output.status,
            "worker exited"
        );

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(transport(format!(
                "worker exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let response: WorkerResponse = serde_json::from_slice(&output.stdout)
            .map_err(|e| transport(format!("malformed worker response: {e}")))?;

        match response {
            WorkerResponse::Ok { result } => Ok(result),
            WorkerResponse::Error { message } => Err(transport(message)),
        }
    }
}
