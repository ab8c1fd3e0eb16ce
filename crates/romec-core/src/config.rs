//! Runtime configuration for the compile command.
//!
//! Read from the environment with [`CompilerConfig::from_env`]:
//! - ROMEC_WORKER_TIMEOUT_SECS (optional, default: 30, 0 disables the timeout)
//! - ROMEC_WORKER_PROGRAM (optional, default: the running executable)
//! - ROMEC_EXTENSIONS (optional, comma separated, default: js,jsx,mjs,cjs,ts,tsx)

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::DEFAULT_EXTENSIONS;

pub const ENV_WORKER_TIMEOUT_SECS: &str = "ROMEC_WORKER_TIMEOUT_SECS";
pub const ENV_WORKER_PROGRAM: &str = "ROMEC_WORKER_PROGRAM";
pub const ENV_EXTENSIONS: &str = "ROMEC_EXTENSIONS";

/// Errors raised while reading configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be a non-negative integer, got {value:?}")]
    InvalidNumber { var: String, value: String },

    #[error("{var} must list at least one extension")]
    EmptyExtensions { var: String },
}

/// Result type for configuration loading.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompilerConfig {
    /// Seconds a worker may run before it is killed; 0 means no limit.
    pub worker_timeout_secs: u64,

    /// Executable to spawn as the compile worker.
    pub worker_program: Option<PathBuf>,

    /// Extensions (without the dot) accepted as compilable sources.
    pub extensions: Vec<String>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            worker_timeout_secs: 30,
            worker_program: None,
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

impl CompilerConfig {
    /// Load from process environment, falling back to defaults.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_WORKER_TIMEOUT_SECS) {
            config.worker_timeout_secs =
                raw.trim().parse().map_err(|_| ConfigError::InvalidNumber {
                    var: ENV_WORKER_TIMEOUT_SECS.to_string(),
                    value: raw.clone(),
                })?;
        }

        if let Some(program) = lookup(ENV_WORKER_PROGRAM).filter(|p| !p.trim().is_empty()) {
            config.worker_program = Some(PathBuf::from(program));
        }

        if let Some(raw) = lookup(ENV_EXTENSIONS) {
            let extensions: Vec<String> = raw
                .split(',')
                .map(|e| e.trim().trim_start_matches('.').to_string())
                .filter(|e| !e.is_empty())
                .collect();
            if extensions.is_empty() {
                return Err(ConfigError::EmptyExtensions {
                    var: ENV_EXTENSIONS.to_string(),
                });
            }
            config.extensions = extensions;
        }

        Ok(config)
    }

    /// `None` when the timeout is disabled.
    pub fn worker_timeout(&self) -> Option<Duration> {
        (self.worker_timeout_secs > 0).then(|| Duration::from_secs(self.worker_timeout_secs))
    }
}
