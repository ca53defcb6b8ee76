//! Object store
//!
//! Byte blobs keyed by relative path strings such as `cleaned/{id}.csv`.
//! Any failure is fatal for the job that hit it.

use async_trait::async_trait;
use sentiprep_common::{Error, Result};
use std::fmt::Debug;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

#[async_trait]
pub trait ObjectStore: Send + Sync + Debug {
    /// Write `bytes` at `path`, replacing any existing object
    async fn upload(&self, path: &str, bytes: Vec<u8>) -> Result<()>;

    async fn download(&self, path: &str) -> Result<Vec<u8>>;

    async fn remove(&self, path: &str) -> Result<()>;
}

/// Objects stored as files under a root directory
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map an object key to a file path, rejecting keys that escape the root
    fn resolve(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        let valid = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !valid {
            return Err(Error::InvalidInput(format!("Invalid object path: {}", key)));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn upload(&self, path: &str, bytes: Vec<u8>) -> Result<()> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        debug!(path, bytes = bytes.len(), "Uploading object");
        tokio::fs::write(&target, bytes)
            .await
            .map_err(|e| Error::Storage(format!("Failed to write {}: {}", path, e)))
    }

    async fn download(&self, path: &str) -> Result<Vec<u8>> {
        let target = self.resolve(path)?;
        match tokio::fs::read(&target).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::NotFound(format!("Object not found: {}", path)))
            }
            Err(e) => Err(Error::Storage(format!("Failed to read {}: {}", path, e))),
        }
    }

    async fn remove(&self, path: &str) -> Result<()> {
        let target = self.resolve(path)?;
        match tokio::fs::remove_file(&target).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Storage(format!("Failed to remove {}: {}", path, e))),
        }
    }
}
