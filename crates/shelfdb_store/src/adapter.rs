//! Object-store adapter trait definition.

use crate::error::StoreResult;
use async_trait::async_trait;
use bytes::Bytes;

/// One page of a prefix listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    /// Keys in this page, in prefix (lexicographic) order.
    pub keys: Vec<String>,
    /// Opaque marker to resume from, or `None` when the listing is
    /// exhausted.
    pub next_marker: Option<String>,
}

impl Listing {
    /// Returns `true` if there are more pages after this one.
    #[must_use]
    pub const fn is_truncated(&self) -> bool {
        self.next_marker.is_some()
    }
}

/// A low-level object store for ShelfDB.
///
/// Object stores are **opaque blob stores** addressed by string keys. They
/// provide the minimal S3-style capability set the engine depends on: no
/// server-side filtering, no transactions, no secondary indexes, and only
/// prefix-ordered listing with a continuation marker.
///
/// # Invariants
///
/// - `get` of an absent key returns `Ok(None)`, not an error
/// - `delete` of an absent key returns `Ok(false)`, not an error
/// - `list` returns keys in lexicographic order and resumes strictly after
///   the given marker
/// - Markers are opaque: callers thread them back unchanged
/// - Stores must be `Send + Sync` for concurrent access
///
/// Timeouts and retries live behind this trait and are passed through, not
/// reinterpreted, by the engine.
///
/// # Implementors
///
/// - [`super::MemoryStore`] - For testing and ephemeral databases
/// - [`super::FsStore`] - One file per blob under a local directory
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Reads the blob stored at `key`.
    ///
    /// Returns `None` if the key does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying read fails.
    async fn get(&self, key: &str) -> StoreResult<Option<Bytes>>;

    /// Writes `data` at `key`, overwriting any existing blob.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying write fails.
    async fn put(&self, key: &str, data: Bytes) -> StoreResult<()>;

    /// Deletes the blob at `key`.
    ///
    /// Returns `true` if a blob existed and was removed. Deleting an
    /// absent key is a no-op returning `false`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying delete fails.
    async fn delete(&self, key: &str) -> StoreResult<bool>;

    /// Checks whether a blob exists at `key` without reading its body.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying probe fails.
    async fn head(&self, key: &str) -> StoreResult<bool>;

    /// Lists up to `limit` keys sharing `prefix`, resuming after `marker`.
    ///
    /// The returned [`Listing`] carries the next marker when more keys
    /// remain, even for a zero `limit` (the page is empty but truncation
    /// is still reported). Pages for a single enumeration must be fetched
    /// in marker order; independent enumerations may run concurrently.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying listing fails.
    async fn list(
        &self,
        prefix: &str,
        limit: usize,
        marker: Option<&str>,
    ) -> StoreResult<Listing>;
}
