//! Filesystem-backed object store.

use crate::adapter::{Listing, ObjectStore};
use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use bytes::Bytes;
use std::io;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

/// An object store persisting each blob as one file under a root
/// directory.
///
/// Keys map directly to relative paths, so the on-disk layout mirrors the
/// keyspace: `data/authors/{id}.json` lands at
/// `<root>/data/authors/{id}.json`. Listings walk the tree and sort keys
/// lexicographically, matching [`MemoryStore`](crate::MemoryStore)
/// semantics. Suitable for local workloads and durable test fixtures.
///
/// # Concurrency
///
/// No file locking is performed; concurrent writers to the same key follow
/// last-write-wins at the filesystem's granularity.
#[derive(Debug)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Creates a store rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the root cannot be created.
    pub fn new(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Returns the root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a key to its on-disk path. Rejects empty keys and any path
    /// component that would escape the root.
    fn path_for(&self, key: &str) -> Option<PathBuf> {
        if key.is_empty() {
            return None;
        }
        let relative = Path::new(key);
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        safe.then(|| self.root.join(relative))
    }

    /// Recovers the key from an on-disk path.
    fn key_for(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<&str> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => part.to_str(),
                _ => None,
            })
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("/"))
        }
    }

    /// Collects every key under the root matching `prefix`, sorted.
    async fn walk_keys(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let mut keys = Vec::new();
        let mut pending = vec![self.root.clone()];
        while let Some(dir) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
                Err(err) => return Err(StoreError::list(prefix, err.to_string())),
            };
            loop {
                let entry = match entries.next_entry().await {
                    Ok(Some(entry)) => entry,
                    Ok(None) => break,
                    Err(err) => return Err(StoreError::list(prefix, err.to_string())),
                };
                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|err| StoreError::list(prefix, err.to_string()))?;
                if file_type.is_dir() {
                    pending.push(entry.path());
                } else if let Some(key) = self.key_for(&entry.path()) {
                    if key.starts_with(prefix) {
                        keys.push(key);
                    }
                }
            }
        }
        keys.sort_unstable();
        Ok(keys)
    }
}

#[async_trait]
impl ObjectStore for FsStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Bytes>> {
        let Some(path) = self.path_for(key) else {
            return Err(StoreError::read(key, "invalid key"));
        };
        match fs::read(&path).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StoreError::read(key, err.to_string())),
        }
    }

    async fn put(&self, key: &str, data: Bytes) -> StoreResult<()> {
        let Some(path) = self.path_for(key) else {
            return Err(StoreError::write(key, "invalid key"));
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|err| StoreError::write(key, err.to_string()))?;
        }
        fs::write(&path, &data)
            .await
            .map_err(|err| StoreError::write(key, err.to_string()))
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        let Some(path) = self.path_for(key) else {
            return Err(StoreError::write(key, "invalid key"));
        };
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(StoreError::write(key, err.to_string())),
        }
    }

    async fn head(&self, key: &str) -> StoreResult<bool> {
        let Some(path) = self.path_for(key) else {
            return Err(StoreError::read(key, "invalid key"));
        };
        match fs::metadata(&path).await {
            Ok(metadata) => Ok(metadata.is_file()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(StoreError::read(key, err.to_string())),
        }
    }

    async fn list(
        &self,
        prefix: &str,
        limit: usize,
        marker: Option<&str>,
    ) -> StoreResult<Listing> {
        let all = self.walk_keys(prefix).await?;

        let mut keys = Vec::new();
        let mut remaining = false;
        for key in all {
            // Markers resume strictly after the last key of the prior page
            if let Some(m) = marker {
                if key.as_str() <= m {
                    continue;
                }
            }
            if keys.len() == limit {
                remaining = true;
                break;
            }
            keys.push(key);
        }

        // A zero limit yields an empty page; the marker then echoes the
        // caller's position so truncation is still reported
        let next_marker = if remaining {
            match keys.last() {
                Some(last) => Some(last.clone()),
                None => Some(marker.unwrap_or_default().to_string()),
            }
        } else {
            None
        };
        Ok(Listing { keys, next_marker })
    }
}
