//! Listing cached images

use crate::error::{CacheError, Result};
use crate::partition::Partition;
use crate::store::CacheStore;
use crate::types::CacheStats;
use rand::seq::SliceRandom;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, warn};

impl CacheStore {
    /// Full paths of recognized images, partition by partition.
    ///
    /// Order within a partition is whatever the directory listing yields.
    /// A partition whose directory does not exist contributes nothing.
    pub async fn list(&self, selector: Partition) -> Result<Vec<PathBuf>> {
        let suffix = format!(".{}", self.extension());
        let mut files = Vec::new();

        for dir in self.directories(selector) {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    debug!(dir = ?dir, "Partition directory missing, skipping");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            while let Some(entry) = entries.next_entry().await? {
                let name = entry.file_name();
                if name.to_str().is_some_and(|n| n.ends_with(&suffix)) {
                    files.push(dir.join(name));
                }
            }
        }

        Ok(files)
    }

    /// A uniformly random cached image
    pub async fn random_entry(&self, selector: Partition) -> Result<PathBuf> {
        let files = self.list(selector).await?;
        let picked = {
            let mut rng = rand::thread_rng();
            files.choose(&mut rng).cloned()
        };
        picked.ok_or(CacheError::EmptyCache(selector))
    }

    /// Recognized image count per partition
    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            movies: self.count(Partition::Movies).await,
            custom: self.count(Partition::Custom).await,
        }
    }

    async fn count(&self, partition: Partition) -> usize {
        match self.list(partition).await {
            Ok(files) => files.len(),
            Err(e) => {
                warn!(partition = %partition, error = %e, "Failed to count cache entries");
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn populated_store(root: &std::path::Path) -> CacheStore {
        let store = CacheStore::with_defaults(root);
        store.ensure_directories().await.unwrap();
        for (name, partition) in [
            ("a.jpg", Partition::Custom),
            ("b.jpg", Partition::Movies),
            ("skip.txt", Partition::Movies),
        ] {
            let path = store.resolve(name, partition).unwrap();
            std::fs::write(path, b"fake").unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_list_only_recognized_images() {
        let dir = tempdir().unwrap();
        let store = populated_store(dir.path()).await;

        let custom = store.list(Partition::Custom).await.unwrap();
        let movies = store.list(Partition::Movies).await.unwrap();
        let both = store.list(Partition::Both).await.unwrap();

        assert_eq!(custom.len(), 1);
        assert!(custom[0].ends_with("custom/a.jpg"));
        assert_eq!(movies.len(), 1);
        assert!(movies[0].ends_with("movies/b.jpg"));
        assert_eq!(both.len(), 2);
    }

    #[tokio::test]
    async fn test_list_both_is_movies_then_custom() {
        let dir = tempdir().unwrap();
        let store = populated_store(dir.path()).await;

        let both = store.list(Partition::Both).await.unwrap();

        assert!(both[0].ends_with("movies/b.jpg"));
        assert!(both[1].ends_with("custom/a.jpg"));
    }

    #[tokio::test]
    async fn test_list_suffix_is_case_sensitive() {
        let dir = tempdir().unwrap();
        let store = CacheStore::with_defaults(dir.path());
        store.ensure_directories().await.unwrap();
        let upper = store.resolve("LOUD.JPG", Partition::Movies).unwrap();
        std::fs::write(upper, b"fake").unwrap();

        assert!(store.list(Partition::Movies).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_uses_configured_extension() {
        let dir = tempdir().unwrap();
        let store = CacheStore::new(dir.path(), "png");
        store.ensure_directories().await.unwrap();
        for name in ["a.png", "b.jpg"] {
            std::fs::write(store.resolve(name, Partition::Custom).unwrap(), b"fake").unwrap();
        }

        let files = store.list(Partition::Custom).await.unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("a.png"));
    }

    #[tokio::test]
    async fn test_list_missing_directory_is_empty() {
        let dir = tempdir().unwrap();
        let store = CacheStore::with_defaults(dir.path().join("cold"));

        assert!(store.list(Partition::Both).await.unwrap().is_empty());
        assert!(store.list(Partition::Movies).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_random_entry_empty_cache() {
        let dir = tempdir().unwrap();
        let store = CacheStore::with_defaults(dir.path());
        store.ensure_directories().await.unwrap();

        let result = store.random_entry(Partition::Both).await;
        assert!(matches!(
            result,
            Err(CacheError::EmptyCache(Partition::Both))
        ));
    }

    #[tokio::test]
    async fn test_random_entry_picks_listed_file() {
        let dir = tempdir().unwrap();
        let store = populated_store(dir.path()).await;

        for _ in 0..10 {
            let picked = store.random_entry(Partition::Movies).await.unwrap();
            assert!(picked.ends_with("movies/b.jpg"));
        }
    }

    #[tokio::test]
    async fn test_stats_counts_per_partition() {
        let dir = tempdir().unwrap();
        let store = populated_store(dir.path()).await;

        let stats = store.stats().await;
        assert_eq!(stats, CacheStats { movies: 1, custom: 1 });
    }
}
