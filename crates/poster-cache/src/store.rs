//! On-disk layout of the cache root and its partitions

use crate::error::{CacheError, Result};
use crate::partition::Partition;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

const DEFAULT_EXTENSION: &str = "jpg";

/// Owns the cache root and resolves partitions to directories.
///
/// Holds no state besides the root path and the recognized image
/// extension; cloning it is cheap.
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
    extension: String,
}

impl CacheStore {
    /// Create a store rooted at `root` that recognizes `*.<extension>` files
    pub fn new(root: impl Into<PathBuf>, extension: &str) -> Self {
        Self {
            root: root.into(),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    /// Create a store that recognizes `*.jpg` files
    pub fn with_defaults(root: impl Into<PathBuf>) -> Self {
        Self::new(root, DEFAULT_EXTENSION)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Recognized image extension, without the leading dot
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Physical directories behind a selector, Movies before Custom
    pub fn directories(&self, selector: Partition) -> Vec<PathBuf> {
        selector
            .concrete()
            .iter()
            .filter_map(|p| p.dir_name())
            .map(|name| self.root.join(name))
            .collect()
    }

    /// Create the root and both partition directories if they are missing
    pub async fn ensure_directories(&self) -> Result<()> {
        fs::create_dir_all(&self.root).await?;
        for dir in self.directories(Partition::Both) {
            fs::create_dir_all(&dir).await?;
        }
        info!(cache_dir = ?self.root, "Cache directories ready");
        Ok(())
    }

    /// Path of `filename` inside a single partition.
    ///
    /// Purely lexical: the file does not have to exist.
    pub fn resolve(&self, filename: &str, selector: Partition) -> Result<PathBuf> {
        let dirs = self.directories(selector);
        let [dir] = dirs.as_slice() else {
            return Err(CacheError::AmbiguousPartition);
        };
        let path = dir.join(filename);
        debug!(filename, partition = %selector, path = ?path, "Resolved cache path");
        Ok(path)
    }
}
