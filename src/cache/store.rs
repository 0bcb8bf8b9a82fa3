//! Dataset cache backed by one JSON file per dataset

use crate::cache::types::{CacheEntry, CacheStats, Dataset};
use crate::error::{Result, SlackMigrateError};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::sync::RwLock;

/// Storage seam for the fetch layer.
///
/// `read` returns `Ok(None)` when nothing is stored or the stored entry is
/// older than `max_age`, and `Err(CacheCorruption)` when something is stored
/// but unusable; callers treat both as a miss.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn read(&self, dataset: Dataset, max_age: Duration) -> Result<Option<CacheEntry>>;

    /// Replace the whole entry for `dataset`, stamped with the current time
    async fn write(&self, dataset: Dataset, payload: serde_json::Value) -> Result<CacheEntry>;
}

pub struct FileCacheStore {
    dir: PathBuf,

    /// Entries already read or written during this run
    entries: DashMap<Dataset, CacheEntry>,

    stats: RwLock<CacheStats>,
}

impl FileCacheStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        tracing::debug!(cache_dir = %dir.display(), "Creating file cache store");

        Self {
            dir,
            entries: DashMap::new(),
            stats: RwLock::new(CacheStats::default()),
        }
    }

    pub fn path_for(&self, dataset: Dataset) -> PathBuf {
        self.dir.join(dataset.file_name())
    }

    pub async fn get_stats(&self) -> CacheStats {
        self.stats.read().await.clone()
    }

    /// Log cache statistics at the end of a run
    pub async fn log_stats(&self) {
        let stats = self.get_stats().await;
        tracing::debug!(
            hits = stats.hits,
            misses = stats.misses,
            writes = stats.writes,
            stale = stats.stale,
            corrupt = stats.corrupt,
            "Cache statistics"
        );
    }

    async fn load_from_disk(&self, dataset: Dataset) -> Result<Option<CacheEntry>> {
        let path = self.path_for(dataset);
        let corruption = |reason: String| SlackMigrateError::CacheCorruption {
            dataset: dataset.to_string(),
            reason,
        };

        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(corruption(format!("{}: {e}", path.display()))),
        };

        let entry: CacheEntry = serde_json::from_slice(&bytes)
            .map_err(|e| corruption(format!("{}: {e}", path.display())))?;

        if entry.dataset != dataset {
            return Err(corruption(format!(
                "{} holds the {} dataset",
                path.display(),
                entry.dataset
            )));
        }

        Ok(Some(entry))
    }
}

#[async_trait]
impl CacheStore for FileCacheStore {
    async fn read(&self, dataset: Dataset, max_age: Duration) -> Result<Option<CacheEntry>> {
        let in_memory = self.entries.get(&dataset).map(|e| e.value().clone());
        let entry = match in_memory {
            Some(entry) => entry,
            None => match self.load_from_disk(dataset).await {
                Ok(Some(entry)) => {
                    tracing::trace!(dataset = %dataset, "Loaded cache entry from disk");
                    self.entries.insert(dataset, entry.clone());
                    entry
                }
                Ok(None) => {
                    self.stats.write().await.misses += 1;
                    return Ok(None);
                }
                Err(e) => {
                    self.stats.write().await.corrupt += 1;
                    return Err(e);
                }
            },
        };

        let now = Utc::now();
        if !entry.is_fresh(max_age, now) {
            self.stats.write().await.stale += 1;
            tracing::debug!(
                dataset = %dataset,
                age_secs = entry.age(now).as_secs(),
                "Cache entry stale"
            );
            return Ok(None);
        }

        self.stats.write().await.hits += 1;
        Ok(Some(entry))
    }

    async fn write(&self, dataset: Dataset, payload: serde_json::Value) -> Result<CacheEntry> {
        let entry = CacheEntry::new(dataset, payload);
        let bytes = serde_json::to_vec(&entry)?;

        let path = self.path_for(dataset);
        atomic_write(&path, &bytes).await?;

        self.entries.insert(dataset, entry.clone());
        self.stats.write().await.writes += 1;

        tracing::debug!(
            dataset = %dataset,
            path = %path.display(),
            bytes = bytes.len(),
            "Cache entry written"
        );
        Ok(entry)
    }
}

/// Write to a uniquely named temp file in the same directory, then rename over
/// the target. Readers see either the old or the new file, never a partial one;
/// concurrent writers resolve as last-rename-wins.
async fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).await?;

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("cache");
    let temp_path = parent.join(format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4()));

    fs::write(&temp_path, content).await?;
    if let Err(e) = fs::rename(&temp_path, path).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(e.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    const DAY: Duration = Duration::from_secs(24 * 3600);

    #[tokio::test]
    async fn test_read_missing_is_none() {
        let dir = TempDir::new().unwrap();
        let store = FileCacheStore::new(dir.path());

        assert!(store.read(Dataset::Channels, DAY).await.unwrap().is_none());
        assert_eq!(store.get_stats().await.misses, 1);
    }

    #[tokio::test]
    async fn test_write_then_read_from_new_store() {
        let dir = TempDir::new().unwrap();
        let written = FileCacheStore::new(dir.path())
            .write(Dataset::Users, json!([{"id": "U1"}]))
            .await
            .unwrap();

        // A fresh store has an empty memory map, so this goes to disk
        let store = FileCacheStore::new(dir.path());
        let read = store.read(Dataset::Users, DAY).await.unwrap().unwrap();

        assert_eq!(read, written);
        assert_eq!(store.get_stats().await.hits, 1);
    }

    #[tokio::test]
    async fn test_write_replaces_whole_entry_and_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let store = FileCacheStore::new(dir.path());

        store
            .write(Dataset::Emoji, json!([{"name": "a"}, {"name": "b"}]))
            .await
            .unwrap();
        store
            .write(Dataset::Emoji, json!([{"name": "c"}]))
            .await
            .unwrap();

        let on_disk: CacheEntry =
            serde_json::from_slice(&std::fs::read(store.path_for(Dataset::Emoji)).unwrap())
                .unwrap();
        assert_eq!(on_disk.payload, json!([{"name": "c"}]));

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["emoji.json".to_string()]);
        assert_eq!(store.get_stats().await.writes, 2);
    }

    #[tokio::test]
    async fn test_stale_entry_is_not_a_hit() {
        let dir = TempDir::new().unwrap();
        let mut entry = CacheEntry::new(Dataset::Users, json!([]));
        entry.fetched_at = Utc::now() - chrono::Duration::hours(25);
        std::fs::write(
            dir.path().join("users.json"),
            serde_json::to_vec(&entry).unwrap(),
        )
        .unwrap();

        let store = FileCacheStore::new(dir.path());
        assert!(store.read(Dataset::Users, DAY).await.unwrap().is_none());

        let stats = store.get_stats().await;
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.stale, 1);

        // Still on disk: a longer max age serves it
        let week = Duration::from_secs(7 * 24 * 3600);
        assert!(store.read(Dataset::Users, week).await.unwrap().is_some());
        assert_eq!(store.get_stats().await.hits, 1);
    }

    #[tokio::test]
    async fn test_garbage_file_is_corruption() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("channels.json"), b"{not json").unwrap();

        let store = FileCacheStore::new(dir.path());
        let err = store.read(Dataset::Channels, DAY).await.unwrap_err();

        assert!(matches!(
            err,
            SlackMigrateError::CacheCorruption { ref dataset, .. } if dataset == "channels"
        ));
        assert_eq!(store.get_stats().await.corrupt, 1);
    }

    #[tokio::test]
    async fn test_mismatched_dataset_is_corruption() {
        let dir = TempDir::new().unwrap();
        let entry = CacheEntry::new(Dataset::Users, json!([]));
        std::fs::write(
            dir.path().join("channels.json"),
            serde_json::to_vec(&entry).unwrap(),
        )
        .unwrap();

        let store = FileCacheStore::new(dir.path());
        assert!(matches!(
            store.read(Dataset::Channels, DAY).await,
            Err(SlackMigrateError::CacheCorruption { .. })
        ));
    }

    #[tokio::test]
    async fn test_creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("nested").join("cache");
        let store = FileCacheStore::new(&nested);

        store.write(Dataset::Users, json!([])).await.unwrap();
        assert!(nested.join("users.json").exists());
    }
}
