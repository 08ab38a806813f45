//! Per-type data service: CRUD with uniqueness enforcement.

use crate::config::EngineConfig;
use crate::entity::EntityType;
use crate::error::{CoreError, CoreResult};
use crate::query::Query;
use serde_json::{Map, Value};
use shelfdb_codec::{decode, encode, key_for, prefix_for, Document, EntityId};
use shelfdb_store::ObjectStore;
use std::ops::ControlFlow;
use std::sync::Arc;
use tracing::{debug, warn};

/// Provides CRUD operations for one entity type.
///
/// A `DataService` is parameterized by the type's configuration (storage
/// prefix, unique-field set) and a shared store handle. It enforces
/// uniqueness constraints with a prefix scan before every write.
///
/// Uniqueness enforcement is **optimistic and non-atomic**: the
/// check-then-write sequence has a race window, and two concurrent creates
/// with the same unique value can both succeed. The engine documents this
/// rather than masking it; callers needing a stronger guarantee must
/// serialize writes externally.
#[derive(Clone)]
pub struct DataService {
    store: Arc<dyn ObjectStore>,
    entity_type: Arc<EntityType>,
    config: EngineConfig,
}

impl DataService {
    /// Creates a new data service.
    #[must_use]
    pub fn new(
        store: Arc<dyn ObjectStore>,
        entity_type: Arc<EntityType>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            entity_type,
            config,
        }
    }

    /// Returns the entity type this service operates on.
    #[must_use]
    pub fn entity_type(&self) -> &EntityType {
        &self.entity_type
    }

    /// Starts a query over this type.
    #[must_use]
    pub fn query(&self) -> Query {
        Query::new(self.clone())
    }

    fn key(&self, id: EntityId) -> String {
        key_for(
            &self.config.base_path,
            self.entity_type.plural_name(),
            id,
        )
    }

    fn prefix(&self) -> String {
        prefix_for(&self.config.base_path, self.entity_type.plural_name())
    }

    /// Creates a document from the given attributes.
    ///
    /// Assigns a fresh id and timestamps (`created_at == updated_at`), runs
    /// one uniqueness scan per declared unique field - short-circuiting on
    /// the first violation - and writes the blob.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UniqueConstraint`] for the first violated
    /// field, or the store's error unmodified if the write fails.
    pub async fn create(&self, attrs: Map<String, Value>) -> CoreResult<Document> {
        let doc = Document::with_attrs(attrs);

        for field in self.entity_type.unique_fields() {
            if let Some(value) = doc.field(field) {
                if !value.is_null() {
                    self.check_unique(field, &value, None).await?;
                }
            }
        }

        let bytes = encode(&doc)?;
        self.store.put(&self.key(doc.id()), bytes.into()).await?;
        debug!(
            entity_type = self.entity_type.name(),
            id = %doc.id(),
            "document created"
        );
        Ok(doc)
    }

    /// Gets a document by id.
    ///
    /// Returns `Ok(None)` if the id does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Codec`] if the stored blob is corrupt.
    pub async fn get(&self, id: EntityId) -> CoreResult<Option<Document>> {
        match self.store.get(&self.key(id)).await? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Updates a document by merging `changes` into its attributes.
    ///
    /// Re-runs uniqueness checks for changed unique fields, excluding this
    /// document's own id from the match set. Advances `updated_at` and
    /// overwrites the blob in place - last write wins, no versioning.
    /// A `null` change stores an explicit null (relevant for `isnull`
    /// filters and the set-null cascade policy); reserved field names in
    /// `changes` are ignored.
    ///
    /// Returns `Ok(None)` if the id does not exist.
    pub async fn update(
        &self,
        id: EntityId,
        changes: Map<String, Value>,
    ) -> CoreResult<Option<Document>> {
        let Some(mut doc) = self.get(id).await? else {
            return Ok(None);
        };

        for field in self.entity_type.unique_fields() {
            if let Some(value) = changes.get(field.as_str()) {
                if !value.is_null() {
                    self.check_unique(field, value, Some(id)).await?;
                }
            }
        }

        for (name, value) in changes {
            doc.set_attr(name, value);
        }
        doc.touch();

        let bytes = encode(&doc)?;
        self.store.put(&self.key(id), bytes.into()).await?;
        debug!(
            entity_type = self.entity_type.name(),
            id = %id,
            "document updated"
        );
        Ok(Some(doc))
    }

    /// Deletes a document by id.
    ///
    /// Returns `true` if something was actually deleted. Idempotent:
    /// deleting an absent id returns `false`, not an error. Cascade and
    /// set-null side effects are the caller's responsibility, driven by the
    /// cascade handler before this call - never automatically.
    pub async fn delete(&self, id: EntityId) -> CoreResult<bool> {
        let deleted = self.store.delete(&self.key(id)).await?;
        if deleted {
            debug!(
                entity_type = self.entity_type.name(),
                id = %id,
                "document deleted"
            );
        }
        Ok(deleted)
    }

    /// Checks whether a document exists, without reading its body.
    pub async fn exists(&self, id: EntityId) -> CoreResult<bool> {
        Ok(self.store.head(&self.key(id)).await?)
    }

    /// Returns up to `limit` documents plus the continuation marker for the
    /// next page, or no marker when the listing is exhausted.
    ///
    /// This is the sole primitive other components use to enumerate a
    /// type's instances. The marker comes straight from the underlying
    /// listing call - object listings do not support offset seeks, so none
    /// are synthesized.
    pub async fn list_by_prefix(
        &self,
        limit: usize,
        marker: Option<&str>,
    ) -> CoreResult<(Vec<Document>, Option<String>)> {
        let prefix = self.prefix();
        let listing = self.store.list(&prefix, limit, marker).await?;

        let mut docs = Vec::with_capacity(listing.keys.len());
        for key in &listing.keys {
            match self.store.get(key).await? {
                Some(bytes) => docs.push(decode(&bytes)?),
                // Deleted between list and get; skip
                None => warn!(key, "listed key vanished before read"),
            }
        }
        Ok((docs, listing.next_marker))
    }

    /// Walks every document of this type in listing order, feeding each to
    /// `visit`. The walk stops early when `visit` breaks.
    ///
    /// This single full-scan loop is what uniqueness checks, query
    /// execution, and relationship resolution ride on.
    pub(crate) async fn for_each(
        &self,
        mut visit: impl FnMut(Document) -> ControlFlow<()>,
    ) -> CoreResult<()> {
        let mut marker: Option<String> = None;
        loop {
            let (docs, next) = self
                .list_by_prefix(self.config.list_page_size, marker.as_deref())
                .await?;
            for doc in docs {
                if let ControlFlow::Break(()) = visit(doc) {
                    return Ok(());
                }
            }
            match next {
                Some(m) => marker = Some(m),
                None => return Ok(()),
            }
        }
    }

    /// Materializes every document of this type, in listing order.
    pub(crate) async fn scan_all(&self) -> CoreResult<Vec<Document>> {
        let mut docs = Vec::new();
        self.for_each(|doc| {
            docs.push(doc);
            ControlFlow::Continue(())
        })
        .await?;
        Ok(docs)
    }

    /// Fails if any other instance already holds `value` in `field`.
    async fn check_unique(
        &self,
        field: &str,
        value: &Value,
        exclude: Option<EntityId>,
    ) -> CoreResult<()> {
        let mut violated = false;
        self.for_each(|doc| {
            if exclude == Some(doc.id()) {
                return ControlFlow::Continue(());
            }
            if doc.field(field).as_ref() == Some(value) {
                violated = true;
                return ControlFlow::Break(());
            }
            ControlFlow::Continue(())
        })
        .await?;

        if violated {
            Err(CoreError::unique_constraint(field, display_value(value)))
        } else {
            Ok(())
        }
    }
}

impl std::fmt::Debug for DataService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataService")
            .field("entity_type", &self.entity_type.name())
            .field("base_path", &self.config.base_path)
            .finish_non_exhaustive()
    }
}

/// Renders a JSON value for error messages without quoting strings.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shelfdb_store::MemoryStore;

    fn attrs(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    fn service() -> DataService {
        let entity_type = EntityType::new("product", "products").unique_field("sku");
        DataService::new(
            Arc::new(MemoryStore::new()),
            Arc::new(entity_type),
            EngineConfig::default(),
        )
    }

    #[tokio::test]
    async fn create_then_get() {
        let svc = service();
        let created = svc
            .create(attrs(&[("sku", json!("A-1")), ("price", json!(10))]))
            .await
            .unwrap();

        assert_eq!(created.created_at(), created.updated_at());

        let fetched = svc.get(created.id()).await.unwrap().unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn get_absent_is_none() {
        let svc = service();
        assert!(svc.get(EntityId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn create_enforces_unique_sku() {
        let svc = service();
        svc.create(attrs(&[("sku", json!("A-1"))])).await.unwrap();

        let err = svc
            .create(attrs(&[("sku", json!("A-1"))]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::UniqueConstraint { field, value } if field == "sku" && value == "A-1"
        ));
    }

    #[tokio::test]
    async fn first_create_survives_second_failing() {
        let svc = service();
        let first = svc
            .create(attrs(&[("sku", json!("A-1")), ("price", json!(10))]))
            .await
            .unwrap();
        let _ = svc.create(attrs(&[("sku", json!("A-1"))])).await;

        let fetched = svc.get(first.id()).await.unwrap().unwrap();
        assert_eq!(fetched, first);
    }

    #[tokio::test]
    async fn null_unique_values_are_not_constrained() {
        let svc = service();
        svc.create(attrs(&[("sku", Value::Null)])).await.unwrap();
        svc.create(attrs(&[("sku", Value::Null)])).await.unwrap();
        svc.create(attrs(&[])).await.unwrap();
    }

    #[tokio::test]
    async fn update_merges_and_bumps_updated_at() {
        let svc = service();
        let created = svc
            .create(attrs(&[("sku", json!("A-1")), ("price", json!(10))]))
            .await
            .unwrap();

        let updated = svc
            .update(created.id(), attrs(&[("price", json!(20))]))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.attr("sku"), Some(&json!("A-1")));
        assert_eq!(updated.attr("price"), Some(&json!(20)));
        assert_eq!(updated.created_at(), created.created_at());
        assert!(updated.updated_at() > created.updated_at());
    }

    #[tokio::test]
    async fn update_absent_is_none() {
        let svc = service();
        let result = svc
            .update(EntityId::new(), attrs(&[("price", json!(1))]))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn update_unique_check_excludes_self() {
        let svc = service();
        let created = svc.create(attrs(&[("sku", json!("A-1"))])).await.unwrap();

        // Re-writing the same value on the same document is allowed
        let updated = svc
            .update(created.id(), attrs(&[("sku", json!("A-1"))]))
            .await
            .unwrap();
        assert!(updated.is_some());
    }

    #[tokio::test]
    async fn update_unique_check_catches_collision() {
        let svc = service();
        svc.create(attrs(&[("sku", json!("A-1"))])).await.unwrap();
        let other = svc.create(attrs(&[("sku", json!("B-2"))])).await.unwrap();

        let err = svc
            .update(other.id(), attrs(&[("sku", json!("A-1"))]))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::UniqueConstraint { field, .. } if field == "sku"));
    }

    #[tokio::test]
    async fn delete_twice_then_get() {
        let svc = service();
        let created = svc.create(attrs(&[("sku", json!("A-1"))])).await.unwrap();

        assert!(svc.delete(created.id()).await.unwrap());
        assert!(!svc.delete(created.id()).await.unwrap());
        assert!(svc.get(created.id()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn exists_does_not_decode() {
        let svc = service();
        let created = svc.create(attrs(&[("sku", json!("A-1"))])).await.unwrap();

        assert!(svc.exists(created.id()).await.unwrap());
        assert!(!svc.exists(EntityId::new()).await.unwrap());
    }

    #[tokio::test]
    async fn list_by_prefix_pages_cover_everything_once() {
        let svc = DataService::new(
            Arc::new(MemoryStore::new()),
            Arc::new(EntityType::new("product", "products")),
            EngineConfig::default().list_page_size(2),
        );

        let mut ids = Vec::new();
        for i in 0..5 {
            let doc = svc.create(attrs(&[("n", json!(i))])).await.unwrap();
            ids.push(doc.id());
        }

        let mut seen = Vec::new();
        let mut marker: Option<String> = None;
        loop {
            let (docs, next) = svc.list_by_prefix(2, marker.as_deref()).await.unwrap();
            assert!(docs.len() <= 2);
            seen.extend(docs.iter().map(Document::id));
            match next {
                Some(m) => marker = Some(m),
                None => break,
            }
        }

        ids.sort();
        let mut seen_sorted = seen.clone();
        seen_sorted.sort();
        assert_eq!(seen_sorted, ids);
        assert_eq!(seen.len(), 5);
    }

    #[tokio::test]
    async fn get_corrupt_blob_is_codec_error() {
        let store = Arc::new(MemoryStore::new());
        let svc = DataService::new(
            Arc::clone(&store) as Arc<dyn ObjectStore>,
            Arc::new(EntityType::new("product", "products")),
            EngineConfig::default(),
        );

        let id = EntityId::new();
        store
            .put(&key_for("data", "products", id), b"not json".as_ref().into())
            .await
            .unwrap();

        let err = svc.get(id).await.unwrap_err();
        assert!(matches!(err, CoreError::Codec(_)));
    }
}
