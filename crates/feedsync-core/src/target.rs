//! Target store seam and the local-directory implementation.
//!
//! # Design
//! - The pipeline only needs four primitives: list, delete, write, rename.
//!   The write-then-rename commit discipline lives in the transfer
//!   executor, not here.
//! - Backends differ in how they list (bare names vs. prefixed paths); the
//!   diff engine normalizes, so implementations return whatever is natural.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::{SyncError, SyncResult};

/// Storage operations required of a target backend.
#[async_trait]
pub trait TargetStore: Send + Sync {
    /// List the entries of a directory.
    async fn list(&self, dir: &str) -> SyncResult<Vec<String>>;
    /// Delete one entry.
    async fn delete(&self, path: &str) -> SyncResult<()>;
    /// Write a payload to a path, creating parent directories as needed.
    async fn write(&self, path: &str, payload: &[u8]) -> SyncResult<()>;
    /// Rename an entry within the store.
    async fn rename(&self, from: &str, to: &str) -> SyncResult<()>;
}

/// Target store over a local archive directory.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// Create a store rooted at `root`; all paths are resolved beneath it.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }

    fn store_error(operation: &'static str, path: &Path, source: io::Error) -> SyncError {
        SyncError::Store {
            operation,
            path: path.to_path_buf(),
            source,
        }
    }
}

#[async_trait]
impl TargetStore for LocalStore {
    /// Lists bare filenames. A directory that does not exist yet is an
    /// empty listing, so the first run against a fresh archive works.
    async fn list(&self, dir: &str) -> SyncResult<Vec<String>> {
        let path = self.resolve(dir);
        let mut reader = match tokio::fs::read_dir(&path).await {
            Ok(reader) => reader,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(Self::store_error("list", &path, err)),
        };
        let mut names = Vec::new();
        loop {
            match reader.next_entry().await {
                Ok(Some(entry)) => {
                    let file_type = entry
                        .file_type()
                        .await
                        .map_err(|err| Self::store_error("list", &entry.path(), err))?;
                    if file_type.is_file() {
                        names.push(entry.file_name().to_string_lossy().into_owned());
                    }
                }
                Ok(None) => break,
                Err(err) => return Err(Self::store_error("list", &path, err)),
            }
        }
        names.sort_unstable();
        Ok(names)
    }

    async fn delete(&self, path: &str) -> SyncResult<()> {
        let resolved = self.resolve(path);
        tokio::fs::remove_file(&resolved)
            .await
            .map_err(|err| Self::store_error("delete", &resolved, err))
    }

    async fn write(&self, path: &str, payload: &[u8]) -> SyncResult<()> {
        let resolved = self.resolve(path);
        if let Some(parent) = resolved.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| Self::store_error("write", parent, err))?;
        }
        tokio::fs::write(&resolved, payload)
            .await
            .map_err(|err| Self::store_error("write", &resolved, err))
    }

    async fn rename(&self, from: &str, to: &str) -> SyncResult<()> {
        let from_path = self.resolve(from);
        let to_path = self.resolve(to);
        tokio::fs::rename(&from_path, &to_path)
            .await
            .map_err(|err| Self::store_error("rename", &from_path, err))
    }
}
