//! Normalize a source image and persist it as a new cache entry

use crate::error::{CacheError, IngestError, Result};
use crate::normalize::{self, NormalizePolicy, OutputFormat};
use crate::partition::Partition;
use crate::store::CacheStore;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Tunables for the normalization pipeline
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Bounding box side for [`NormalizePolicy::Standard`]
    pub max_dimension: u32,
    /// JPEG quality, ignored for lossless formats
    pub quality: u8,
    pub format: OutputFormat,
    /// Exact output size for [`NormalizePolicy::Palette`]
    pub display_width: u32,
    pub display_height: u32,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            max_dimension: 512,
            quality: 85,
            format: OutputFormat::Jpeg,
            display_width: 800,
            display_height: 480,
        }
    }
}

/// Turns source image bytes into a new, uniquely named cache entry
#[derive(Debug, Clone)]
pub struct ImageIngestor {
    store: CacheStore,
    options: IngestOptions,
}

impl ImageIngestor {
    /// The store's recognized extension is taken from `options.format`
    pub fn new(root: impl Into<std::path::PathBuf>, options: IngestOptions) -> Self {
        Self {
            store: CacheStore::new(root, options.format.extension()),
            options,
        }
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    pub fn options(&self) -> &IngestOptions {
        &self.options
    }

    /// Normalize `bytes` and write them to a fresh file in `selector`.
    ///
    /// Returns the generated filename. Existing entries are never
    /// overwritten, and nothing is left behind on failure.
    pub async fn ingest(
        &self,
        bytes: Vec<u8>,
        selector: Partition,
        policy: NormalizePolicy,
    ) -> Result<String> {
        if selector == Partition::Both {
            return Err(CacheError::AmbiguousPartition);
        }

        let source_size = bytes.len();
        let options = self.options.clone();
        let encoded =
            tokio::task::spawn_blocking(move || normalize::normalize(&bytes, policy, &options))
                .await
                .map_err(|e| IngestError::Transform(format!("transform task failed: {}", e)))??;

        let id = Uuid::new_v4().simple();
        let filename = format!("{}.{}", id, self.store.extension());
        let path = self.store.resolve(&filename, selector)?;
        let temp_path = self.store.resolve(&format!(".{}.tmp", id), selector)?;

        write_atomically(&temp_path, &path, &encoded)
            .await
            .map_err(IngestError::Write)?;

        info!(
            filename = %filename,
            partition = %selector,
            policy = ?policy,
            source_size,
            size = encoded.len(),
            "Ingested image"
        );
        Ok(filename)
    }
}

async fn write_atomically(temp_path: &Path, path: &Path, data: &[u8]) -> std::io::Result<()> {
    let result = async {
        fs::write(temp_path, data).await?;
        fs::rename(temp_path, path).await
    }
    .await;

    if let Err(e) = &result {
        warn!(path = ?path, error = %e, "Failed to write cache entry");
        if let Err(cleanup) = fs::remove_file(temp_path).await {
            debug!(path = ?temp_path, error = %cleanup, "No temporary file to clean up");
        }
    }
    result
}
