//! Age-based eviction and explicit clearing

use crate::error::Result;
use crate::partition::Partition;
use crate::store::CacheStore;
use std::fs::Metadata;
use std::io::ErrorKind;
use std::time::{Duration, SystemTime};
use tokio::fs;
use tracing::{debug, info, warn};

impl CacheStore {
    /// Delete regular files last modified more than `max_age` ago.
    ///
    /// Returns the number of files removed. Missing partition directories
    /// and files that vanish mid-pass are not errors.
    pub async fn clean(&self, selector: Partition, max_age: Duration) -> Result<usize> {
        let now = SystemTime::now();
        let removed = self
            .remove_files(selector, |metadata| {
                // Future mtimes count as age zero
                metadata
                    .modified()
                    .ok()
                    .and_then(|modified| now.duration_since(modified).ok())
                    .is_some_and(|age| age > max_age)
            })
            .await?;

        if removed > 0 {
            info!(partition = %selector, removed, max_age_secs = max_age.as_secs(), "Evicted stale cache entries");
        }
        Ok(removed)
    }

    /// Delete every regular file regardless of age
    pub async fn clear(&self, selector: Partition) -> Result<usize> {
        let removed = self.remove_files(selector, |_| true).await?;
        info!(partition = %selector, removed, "Cleared cache");
        Ok(removed)
    }

    async fn remove_files<F>(&self, selector: Partition, should_remove: F) -> Result<usize>
    where
        F: Fn(&Metadata) -> bool,
    {
        let mut removed = 0;

        for dir in self.directories(selector) {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    debug!(dir = ?dir, "Partition directory missing, nothing to remove");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();

                // DirEntry metadata does not follow symlinks
                let metadata = match entry.metadata().await {
                    Ok(metadata) => metadata,
                    Err(e) if e.kind() == ErrorKind::NotFound => continue,
                    Err(e) => {
                        warn!(path = ?path, error = %e, "Failed to stat cache entry");
                        continue;
                    }
                };

                if !metadata.is_file() || !should_remove(&metadata) {
                    continue;
                }

                match fs::remove_file(&path).await {
                    Ok(()) => {
                        removed += 1;
                        debug!(path = ?path, "Removed cache entry");
                    }
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(e) => warn!(path = ?path, error = %e, "Failed to remove cache entry"),
                }
            }
        }

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::FileTime;
    use std::path::Path;
    use tempfile::tempdir;

    const WEEK: Duration = Duration::from_secs(60 * 60 * 24 * 7);

    async fn setup(root: &Path) -> CacheStore {
        let store = CacheStore::with_defaults(root);
        store.ensure_directories().await.unwrap();
        store
    }

    fn backdate(path: &Path, age: Duration) {
        let past = SystemTime::now() - age;
        filetime::set_file_mtime(path, FileTime::from_system_time(past)).unwrap();
    }

    #[tokio::test]
    async fn test_clean_removes_old_files() {
        let dir = tempdir().unwrap();
        let store = setup(dir.path()).await;
        let old = store.resolve("old.jpg", Partition::Movies).unwrap();
        std::fs::write(&old, b"data").unwrap();
        backdate(&old, Duration::from_secs(60 * 60 * 24 * 8));

        let removed = store.clean(Partition::Movies, WEEK).await.unwrap();

        assert_eq!(removed, 1);
        assert!(!old.exists());
    }

    #[tokio::test]
    async fn test_clean_keeps_new_files() {
        let dir = tempdir().unwrap();
        let store = setup(dir.path()).await;
        let new = store.resolve("new.jpg", Partition::Movies).unwrap();
        std::fs::write(&new, b"data").unwrap();

        let removed = store.clean(Partition::Movies, WEEK).await.unwrap();

        assert_eq!(removed, 0);
        assert!(new.exists());
    }

    #[tokio::test]
    async fn test_clean_only_touches_selected_partition() {
        let dir = tempdir().unwrap();
        let store = setup(dir.path()).await;
        let movie = store.resolve("a.jpg", Partition::Movies).unwrap();
        let custom = store.resolve("b.jpg", Partition::Custom).unwrap();
        for path in [&movie, &custom] {
            std::fs::write(path, b"data").unwrap();
            backdate(path, WEEK * 2);
        }

        store.clean(Partition::Custom, WEEK).await.unwrap();
        assert!(movie.exists());
        assert!(!custom.exists());

        store.clean(Partition::Both, WEEK).await.unwrap();
        assert!(!movie.exists());
    }

    #[tokio::test]
    async fn test_clean_skips_directories() {
        let dir = tempdir().unwrap();
        let store = setup(dir.path()).await;
        let nested = store.resolve("nested", Partition::Movies).unwrap();
        std::fs::create_dir(&nested).unwrap();
        backdate(&nested, WEEK * 2);

        let removed = store.clean(Partition::Movies, WEEK).await.unwrap();

        assert_eq!(removed, 0);
        assert!(nested.is_dir());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_clear_skips_symlinks() {
        let dir = tempdir().unwrap();
        let store = setup(dir.path()).await;
        let target = dir.path().join("outside.jpg");
        std::fs::write(&target, b"data").unwrap();
        let link = store.resolve("link.jpg", Partition::Custom).unwrap();
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let removed = store.clear(Partition::Custom).await.unwrap();

        assert_eq!(removed, 0);
        assert!(link.symlink_metadata().is_ok());
        assert!(target.exists());
    }

    #[tokio::test]
    async fn test_missing_directory_is_tolerated() {
        let dir = tempdir().unwrap();
        let store = CacheStore::with_defaults(dir.path().join("never-created"));

        assert_eq!(store.clean(Partition::Both, WEEK).await.unwrap(), 0);
        assert_eq!(store.clear(Partition::Both).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_clear_removes_fresh_files() {
        let dir = tempdir().unwrap();
        let store = setup(dir.path()).await;
        let movie = store.resolve("a.jpg", Partition::Movies).unwrap();
        let custom = store.resolve("b.jpg", Partition::Custom).unwrap();
        let notes = store.resolve("notes.txt", Partition::Custom).unwrap();
        for path in [&movie, &custom, &notes] {
            std::fs::write(path, b"data").unwrap();
        }

        let removed = store.clear(Partition::Both).await.unwrap();

        assert_eq!(removed, 3);
        assert!(!movie.exists());
        assert!(!custom.exists());
        assert!(!notes.exists());
    }

    #[tokio::test]
    async fn test_clear_single_partition() {
        let dir = tempdir().unwrap();
        let store = setup(dir.path()).await;
        let movie = store.resolve("a.jpg", Partition::Movies).unwrap();
        let custom = store.resolve("b.jpg", Partition::Custom).unwrap();
        std::fs::write(&movie, b"data").unwrap();
        std::fs::write(&custom, b"data").unwrap();

        store.clear(Partition::Movies).await.unwrap();

        assert!(!movie.exists());
        assert!(custom.exists());
    }

    #[tokio::test]
    async fn test_concurrent_clears_do_not_fail() {
        let dir = tempdir().unwrap();
        let store = setup(dir.path()).await;
        for i in 0..20 {
            let path = store.resolve(&format!("{i}.jpg"), Partition::Movies).unwrap();
            std::fs::write(path, b"data").unwrap();
        }

        let (a, b) = tokio::join!(
            store.clear(Partition::Movies),
            store.clear(Partition::Movies)
        );

        assert_eq!(a.unwrap() + b.unwrap(), 20);
        assert_eq!(
            std::fs::read_dir(&store.directories(Partition::Movies)[0])
                .unwrap()
                .count(),
            0
        );
    }
}
