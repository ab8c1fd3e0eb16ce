//! Wire format between the compile client and a worker process.
//!
//! The client writes one JSON [`WorkerRequest`] to the worker's stdin and
//! closes it; the worker answers with one JSON [`WorkerResponse`] on stdout.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use romec_core::{CompileOptions, CompileResult, WorkerMode};

use crate::transform::compile_source;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkerRequest {
    pub path: PathBuf,
    pub mode: WorkerMode,
    #[serde(default)]
    pub options: CompileOptions,
    #[serde(default)]
    pub parse_options: CompileOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WorkerResponse {
    Ok { result: CompileResult },
    Error { message: String },
}

/// Label used for diagnostic locations produced by the worker.
fn file_label(path: &Path) -> String {
    path.display().to_string()
}

/// Execute one request inside the worker.
pub async fn handle_request(request: &WorkerRequest) -> WorkerResponse {
    match request.mode {
        WorkerMode::Compile => match tokio::fs::read_to_string(&request.path).await {
            Ok(source) => WorkerResponse::Ok {
                result: compile_source(&file_label(&request.path), &source),
            },
            Err(e) => WorkerResponse::Error {
                message: format!("failed to read {}: {}", request.path.display(), e),
            },
        },
    }
}

/// Worker main loop: read one request from `reader`, answer on `writer`.
pub async fn serve_worker<R, W>(mut reader: R, mut writer: W) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut raw = Vec::new();
    reader.read_to_end(&mut raw).await?;

    let response = match serde_json::from_slice::<WorkerRequest>(&raw) {
        Ok(request) => {
            debug!(path = %request.path.display(), mode = %request.mode, "worker request");
            handle_request(&request).await
        }
        Err(e) => {
            warn!(error = %e, "malformed worker request");
            WorkerResponse::Error {
                message: format!("malformed worker request: {e}"),
            }
        }
    };

    let mut payload = serde_json::to_vec(&response)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    payload.push(b'\n');
    writer.write_all(&payload).await?;
    writer.flush().await
}
