//! In-memory object store for testing.

use crate::adapter::{Listing, ObjectStore};
use crate::error::StoreResult;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// An in-memory object store.
///
/// Blobs live in a sorted map, which makes prefix listing naturally
/// lexicographic - the same ordering contract S3-style stores provide.
/// Suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral databases that don't need persistence
///
/// # Thread Safety
///
/// This store is thread-safe and can be shared across tasks.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: RwLock<BTreeMap<String, Bytes>>,
}

impl MemoryStore {
    /// Creates a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of blobs held.
    ///
    /// Useful for testing and debugging.
    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    /// Returns `true` if the store holds no blobs.
    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }

    /// Returns all keys currently held, in order.
    ///
    /// Useful for testing and debugging.
    pub async fn keys(&self) -> Vec<String> {
        self.blobs.read().await.keys().cloned().collect()
    }

    /// Removes all blobs from the store.
    pub async fn clear(&self) {
        self.blobs.write().await.clear();
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Bytes>> {
        Ok(self.blobs.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, data: Bytes) -> StoreResult<()> {
        self.blobs.write().await.insert(key.to_string(), data);
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        Ok(self.blobs.write().await.remove(key).is_some())
    }

    async fn head(&self, key: &str) -> StoreResult<bool> {
        Ok(self.blobs.read().await.contains_key(key))
    }

    async fn list(
        &self,
        prefix: &str,
        limit: usize,
        marker: Option<&str>,
    ) -> StoreResult<Listing> {
        let blobs = self.blobs.read().await;

        let mut keys = Vec::new();
        let mut remaining = false;

        for key in blobs.range(prefix.to_string()..).map(|(k, _)| k) {
            if !key.starts_with(prefix) {
                break;
            }
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
            keys.push(key.clone());
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

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn new_is_empty() {
        let store = MemoryStore::new();
        assert!(store.is_empty().await);
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn put_and_get() {
        let store = MemoryStore::new();
        store.put("a/1", Bytes::from_static(b"one")).await.unwrap();

        let blob = store.get("a/1").await.unwrap();
        assert_eq!(blob, Some(Bytes::from_static(b"one")));
    }

    #[tokio::test]
    async fn get_absent_is_none() {
        let store = MemoryStore::new();
        assert_eq!(store.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn put_overwrites() {
        let store = MemoryStore::new();
        store.put("a/1", Bytes::from_static(b"old")).await.unwrap();
        store.put("a/1", Bytes::from_static(b"new")).await.unwrap();

        assert_eq!(store.get("a/1").await.unwrap(), Some(Bytes::from_static(b"new")));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = MemoryStore::new();
        store.put("a/1", Bytes::from_static(b"x")).await.unwrap();

        assert!(store.delete("a/1").await.unwrap());
        assert!(!store.delete("a/1").await.unwrap());
        assert_eq!(store.get("a/1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn head_does_not_need_body() {
        let store = MemoryStore::new();
        assert!(!store.head("a/1").await.unwrap());

        store.put("a/1", Bytes::new()).await.unwrap();
        assert!(store.head("a/1").await.unwrap());
    }

    #[tokio::test]
    async fn list_respects_prefix() {
        let store = MemoryStore::new();
        store.put("a/1", Bytes::new()).await.unwrap();
        store.put("a/2", Bytes::new()).await.unwrap();
        store.put("b/1", Bytes::new()).await.unwrap();

        let listing = store.list("a/", 10, None).await.unwrap();
        assert_eq!(listing.keys, vec!["a/1", "a/2"]);
        assert!(!listing.is_truncated());
    }

    #[tokio::test]
    async fn list_is_ordered() {
        let store = MemoryStore::new();
        store.put("a/3", Bytes::new()).await.unwrap();
        store.put("a/1", Bytes::new()).await.unwrap();
        store.put("a/2", Bytes::new()).await.unwrap();

        let listing = store.list("a/", 10, None).await.unwrap();
        assert_eq!(listing.keys, vec!["a/1", "a/2", "a/3"]);
    }

    #[tokio::test]
    async fn list_pages_with_markers() {
        let store = MemoryStore::new();
        for i in 0..5 {
            store.put(&format!("a/{i}"), Bytes::new()).await.unwrap();
        }

        let page1 = store.list("a/", 2, None).await.unwrap();
        assert_eq!(page1.keys, vec!["a/0", "a/1"]);
        assert!(page1.is_truncated());

        let page2 = store
            .list("a/", 2, page1.next_marker.as_deref())
            .await
            .unwrap();
        assert_eq!(page2.keys, vec!["a/2", "a/3"]);
        assert!(page2.is_truncated());

        let page3 = store
            .list("a/", 2, page2.next_marker.as_deref())
            .await
            .unwrap();
        assert_eq!(page3.keys, vec!["a/4"]);
        assert!(!page3.is_truncated());
    }

    #[tokio::test]
    async fn list_exact_page_boundary_has_no_marker() {
        let store = MemoryStore::new();
        store.put("a/1", Bytes::new()).await.unwrap();
        store.put("a/2", Bytes::new()).await.unwrap();

        let listing = store.list("a/", 2, None).await.unwrap();
        assert_eq!(listing.keys.len(), 2);
        assert!(!listing.is_truncated());
    }

    #[tokio::test]
    async fn list_zero_limit_still_reports_truncation() {
        let store = MemoryStore::new();
        store.put("a/1", Bytes::new()).await.unwrap();
        store.put("a/2", Bytes::new()).await.unwrap();

        let listing = store.list("a/", 0, None).await.unwrap();
        assert!(listing.keys.is_empty());
        assert!(listing.is_truncated());

        // Resuming from the echoed marker makes progress once the limit
        // is positive
        let resumed = store
            .list("a/", 10, listing.next_marker.as_deref())
            .await
            .unwrap();
        assert_eq!(resumed.keys, vec!["a/1", "a/2"]);

        // Nothing left past the last key: no truncation even at limit 0
        let exhausted = store.list("a/", 0, Some("a/2")).await.unwrap();
        assert!(exhausted.keys.is_empty());
        assert!(!exhausted.is_truncated());
    }

    #[tokio::test]
    async fn list_empty_prefix_lists_everything() {
        let store = MemoryStore::new();
        store.put("a/1", Bytes::new()).await.unwrap();
        store.put("b/1", Bytes::new()).await.unwrap();

        let listing = store.list("", 10, None).await.unwrap();
        assert_eq!(listing.keys.len(), 2);
    }

    #[tokio::test]
    async fn clear_removes_everything() {
        let store = MemoryStore::new();
        store.put("a/1", Bytes::new()).await.unwrap();
        store.clear().await;
        assert!(store.is_empty().await);
    }
}
