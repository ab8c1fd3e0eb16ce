//! Filesystem entry resolution.
//!
//! A source resolves, in order, to: the file itself when it has a compilable
//! extension, `<source>.<ext>` for each configured extension, then
//! `<source>/index.<ext>`. The winner is canonicalised.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use romec_core::{
    ArgLocation, EntryResolver, Resolution, ResolutionError, ResolvedEntry, ResolverOptions,
};

/// Result of probing one path on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
    Found(PathBuf, Resolution),
    /// A file exists but its extension is not compilable.
    NotCompilable(PathBuf),
    Missing,
}

/// Probe `target` against `extensions` the same way entries and imports resolve.
pub async fn probe(target: &Path, extensions: &[String]) -> Probe {
    let target_is_file = is_file(target).await;
    if target_is_file && has_extension(target, extensions) {
        return Probe::Found(target.to_path_buf(), Resolution::Exact);
    }

    for ext in extensions {
        let candidate = append_extension(target, ext);
        if is_file(&candidate).await {
            return Probe::Found(candidate, Resolution::Extension(ext.clone()));
        }
    }

    if is_dir(target).await {
        for ext in extensions {
            let candidate = target.join(format!("index.{ext}"));
            if is_file(&candidate).await {
                return Probe::Found(candidate, Resolution::DirectoryIndex(ext.clone()));
            }
        }
    }

    if target_is_file {
        Probe::NotCompilable(target.to_path_buf())
    } else {
        Probe::Missing
    }
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| extensions.iter().any(|allowed| allowed == e))
        .unwrap_or(false)
}

/// `a.config` + `js` → `a.config.js` (unlike `with_extension`).
fn append_extension(path: &Path, ext: &str) -> PathBuf {
    let mut raw: OsString = path.as_os_str().to_owned();
    raw.push(".");
    raw.push(ext);
    PathBuf::from(raw)
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

async fn is_dir(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
}

/// Resolves entries against the local filesystem.
#[derive(Debug, Default, Clone)]
pub struct FsEntryResolver;

impl FsEntryResolver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EntryResolver for FsEntryResolver {
    async fn resolve(
        &self,
        options: &ResolverOptions,
        location: ArgLocation,
    ) -> Result<ResolvedEntry, ResolutionError> {
        let source = options.source.clone();
        if source.as_os_str().is_empty() {
            return Err(ResolutionError::new(source, location, "source path is empty"));
        }

        let target = options.joined_source();
        debug!(target = %target.display(), "probing entry");

        match probe(&target, &options.extensions).await {
            Probe::Found(path, resolution) => {
                let canonical = tokio::fs::canonicalize(&path).await.map_err(|e| {
                    ResolutionError::new(
                        source.clone(),
                        location.clone(),
                        format!("failed to canonicalize {}: {}", path.display(), e),
                    )
                })?;
                Ok(ResolvedEntry::new(
                    canonical,
                    source.to_string_lossy(),
                    resolution,
                ))
            }
            Probe::NotCompilable(path) => Err(ResolutionError::new(
                source,
                location,
                format!(
                    "{} is not a compilable file (expected one of: {})",
                    path.display(),
                    options.extensions.join(", ")
                ),
            )),
            Probe::Missing => Err(ResolutionError::new(
                source,
                location,
                format!(
                    "file not found (tried extensions: {} and index files)",
                    options.extensions.join(", ")
                ),
            )),
        }
    }
}
