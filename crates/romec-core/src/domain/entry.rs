//! Entry resolution inputs and results.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Extensions treated as compilable when none are configured.
pub const DEFAULT_EXTENSIONS: &[&str] = &["js", "jsx", "mjs", "cjs", "ts", "tsx"];

/// Points at the piece of command-line input a failure is about.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ArgLocation {
    Arg { index: usize },
}

impl std::fmt::Display for ArgLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArgLocation::Arg { index } => write!(f, "argument #{}", index + 1),
        }
    }
}

/// Options an entry resolver works from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolverOptions {
    /// Directory relative sources are joined onto.
    pub cwd: PathBuf,

    /// Source path exactly as the user typed it.
    pub source: PathBuf,

    /// Extensions (without the dot) that mark a compilable file.
    pub extensions: Vec<String>,
}

impl ResolverOptions {
    pub fn new(cwd: impl Into<PathBuf>, source: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            source: source.into(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }

    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions;
        self
    }

    /// `source` joined onto `cwd` unless it is already absolute.
    pub fn joined_source(&self) -> PathBuf {
        if self.source.is_absolute() {
            self.source.clone()
        } else {
            self.cwd.join(&self.source)
        }
    }
}

/// How a resolver arrived at the entry file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "extension", rename_all = "snake_case")]
pub enum Resolution {
    /// The source named a compilable file directly.
    Exact,
    /// An extension was appended to the source.
    Extension(String),
    /// The source was a directory holding an index file.
    DirectoryIndex(String),
}

/// A canonical, compilable entry file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolvedEntry {
    /// Canonical path of the entry.
    pub path: PathBuf,

    /// Source as typed by the user.
    pub source: String,

    pub resolution: Resolution,
}

impl ResolvedEntry {
    pub fn new(
        path: impl Into<PathBuf>,
        source: impl Into<String>,
        resolution: Resolution,
    ) -> Self {
        Self {
            path: path.into(),
            source: source.into(),
            resolution,
        }
    }
}
