//! Relationship descriptors and batch resolution.
//!
//! Relationships are declared on the [`EntityType`](crate::EntityType) of
//! the side that *names* them. A many-to-one relationship lives on the
//! child and points at its parent through a foreign-key attribute; one-to-
//! many and one-to-one live on the parent and are resolved by querying the
//! related type's back-reference field.

use crate::engine::Engine;
use crate::error::CoreResult;
use futures::future::try_join_all;
use serde_json::Value;
use shelfdb_codec::{Document, EntityId};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// The shape of a relationship between two entity types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    /// Many instances of this type reference one related instance.
    ManyToOne,
    /// One instance of this type is referenced by many related instances.
    OneToMany,
    /// One instance of this type is referenced by exactly one related
    /// instance.
    OneToOne,
}

/// What happens to dependents when the referenced document is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnDelete {
    /// Delete dependents recursively.
    Cascade,
    /// Null out the dependents' foreign key.
    SetNull,
    /// Refuse the deletion while dependents exist.
    Protect,
    /// Leave dependents untouched.
    #[default]
    DoNothing,
}

/// A declared relationship between two entity types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// The relationship name, unique within its entity type.
    pub name: String,
    /// The related entity type's registered name.
    pub related_type: String,
    /// The attribute holding the reference. For [`RelationKind::ManyToOne`]
    /// it lives on this type; otherwise it lives on the related type and
    /// points back here.
    pub foreign_key: String,
    /// The relationship shape.
    pub kind: RelationKind,
    /// The delete behavior for dependents.
    pub on_delete: OnDelete,
}

impl Relationship {
    /// Declares a many-to-one relationship: this type holds `foreign_key`
    /// referencing `related_type`.
    #[must_use]
    pub fn foreign_key(
        name: impl Into<String>,
        related_type: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            related_type: related_type.into(),
            foreign_key: foreign_key.into(),
            kind: RelationKind::ManyToOne,
            on_delete: OnDelete::default(),
        }
    }

    /// Declares a one-to-many relationship: `related_type` holds
    /// `foreign_key` referencing this type.
    #[must_use]
    pub fn has_many(
        name: impl Into<String>,
        related_type: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self {
            kind: RelationKind::OneToMany,
            ..Self::foreign_key(name, related_type, foreign_key)
        }
    }

    /// Declares a one-to-one relationship: `related_type` holds
    /// `foreign_key` referencing this type.
    #[must_use]
    pub fn has_one(
        name: impl Into<String>,
        related_type: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self {
            kind: RelationKind::OneToOne,
            ..Self::foreign_key(name, related_type, foreign_key)
        }
    }

    /// Sets the delete behavior for dependents.
    #[must_use]
    pub const fn on_delete(mut self, on_delete: OnDelete) -> Self {
        self.on_delete = on_delete;
        self
    }
}

/// The result of resolving one relationship for a batch of documents,
/// keyed by source document id.
#[derive(Debug, Clone)]
pub enum Resolved {
    /// At most one related document per source (many-to-one, one-to-one).
    One(HashMap<EntityId, Option<Document>>),
    /// Zero or more related documents per source (one-to-many).
    Many(HashMap<EntityId, Vec<Document>>),
}

impl Resolved {
    /// Returns the single related document for a source id, if resolved as
    /// a to-one relationship.
    #[must_use]
    pub fn one(&self, id: EntityId) -> Option<&Document> {
        match self {
            Self::One(map) => map.get(&id).and_then(Option::as_ref),
            Self::Many(_) => None,
        }
    }

    /// Returns the related documents for a source id, if resolved as a
    /// to-many relationship.
    #[must_use]
    pub fn many(&self, id: EntityId) -> Option<&[Document]> {
        match self {
            Self::Many(map) => map.get(&id).map(Vec::as_slice),
            Self::One(_) => None,
        }
    }
}

/// Resolves declared relationships for batches of documents.
///
/// Resolution is batch-oriented: one call answers the relationship for
/// every input document, deduplicating parent fetches and issuing a single
/// back-reference query for to-many shapes.
#[derive(Debug, Clone)]
pub struct RelationshipResolver {
    engine: Engine,
}

impl RelationshipResolver {
    pub(crate) fn new(engine: Engine) -> Self {
        Self { engine }
    }

    /// Resolves `relationship` for every document in `docs`.
    ///
    /// Every input document gets an entry in the result, even when nothing
    /// is related: `None` for to-one shapes, an empty list for to-many.
    ///
    /// # Errors
    ///
    /// Fails if the related type is not registered or a store operation
    /// fails.
    pub async fn resolve(
        &self,
        docs: &[Document],
        relationship: &Relationship,
    ) -> CoreResult<Resolved> {
        debug!(
            relationship = relationship.name.as_str(),
            related_type = relationship.related_type.as_str(),
            sources = docs.len(),
            "resolving relationship"
        );
        match relationship.kind {
            RelationKind::ManyToOne => self.resolve_many_to_one(docs, relationship).await,
            RelationKind::OneToMany => {
                let grouped = self.group_by_back_reference(docs, relationship).await?;
                Ok(Resolved::Many(grouped))
            }
            RelationKind::OneToOne => {
                let grouped = self.group_by_back_reference(docs, relationship).await?;
                Ok(Resolved::One(
                    grouped
                        .into_iter()
                        .map(|(id, mut related)| {
                            (id, if related.is_empty() { None } else { Some(related.remove(0)) })
                        })
                        .collect(),
                ))
            }
        }
    }

    /// Fetches each distinct parent once, then maps every source document
    /// to its parent (or `None` for a missing or unset foreign key).
    async fn resolve_many_to_one(
        &self,
        docs: &[Document],
        relationship: &Relationship,
    ) -> CoreResult<Resolved> {
        let service = self.engine.related_service(relationship)?;

        let mut parent_ids = BTreeSet::new();
        for doc in docs {
            if let Some(id) = foreign_key_id(doc, &relationship.foreign_key) {
                parent_ids.insert(id);
            }
        }

        let fetches = parent_ids.iter().map(|id| {
            let service = service.clone();
            let id = *id;
            async move { service.get(id).await.map(|doc| (id, doc)) }
        });
        let parents: HashMap<EntityId, Option<Document>> =
            try_join_all(fetches).await?.into_iter().collect();

        let mut resolved = HashMap::with_capacity(docs.len());
        for doc in docs {
            let parent = foreign_key_id(doc, &relationship.foreign_key)
                .and_then(|id| parents.get(&id).cloned().flatten());
            resolved.insert(doc.id(), parent);
        }
        Ok(Resolved::One(resolved))
    }

    /// Queries the related type for back-references to any of the source
    /// ids and groups the results by referenced source.
    async fn group_by_back_reference(
        &self,
        docs: &[Document],
        relationship: &Relationship,
    ) -> CoreResult<HashMap<EntityId, Vec<Document>>> {
        let service = self.engine.related_service(relationship)?;

        let source_ids: Vec<Value> = docs
            .iter()
            .map(|doc| Value::String(doc.id().to_string()))
            .collect();
        let spec = format!("{}__in", relationship.foreign_key);
        let related = service
            .query()
            .filter(&spec, Value::Array(source_ids))?
            .all()
            .await?;

        let mut grouped: HashMap<EntityId, Vec<Document>> = docs
            .iter()
            .map(|doc| (doc.id(), Vec::new()))
            .collect();
        for doc in related {
            if let Some(source) = foreign_key_id(&doc, &relationship.foreign_key) {
                if let Some(bucket) = grouped.get_mut(&source) {
                    bucket.push(doc);
                }
            }
        }
        Ok(grouped)
    }
}

/// Reads a foreign-key attribute as an [`EntityId`], tolerating unset,
/// null, and malformed values.
pub(crate) fn foreign_key_id(doc: &Document, field: &str) -> Option<EntityId> {
    match doc.attr(field) {
        Some(Value::String(raw)) => EntityId::parse(raw),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_constructors_set_kind() {
        let many_to_one = Relationship::foreign_key("author", "author", "author_id");
        assert_eq!(many_to_one.kind, RelationKind::ManyToOne);
        assert_eq!(many_to_one.on_delete, OnDelete::DoNothing);

        let has_many = Relationship::has_many("posts", "post", "author_id")
            .on_delete(OnDelete::Cascade);
        assert_eq!(has_many.kind, RelationKind::OneToMany);
        assert_eq!(has_many.on_delete, OnDelete::Cascade);

        let has_one = Relationship::has_one("profile", "profile", "author_id");
        assert_eq!(has_one.kind, RelationKind::OneToOne);
    }

    #[test]
    fn foreign_key_id_tolerates_bad_values() {
        let mut doc = Document::new();
        assert!(foreign_key_id(&doc, "author_id").is_none());

        doc.set_attr("author_id", Value::Null);
        assert!(foreign_key_id(&doc, "author_id").is_none());

        doc.set_attr("author_id", Value::String("not-a-uuid".into()));
        assert!(foreign_key_id(&doc, "author_id").is_none());

        let id = EntityId::new();
        doc.set_attr("author_id", Value::String(id.to_string()));
        assert_eq!(foreign_key_id(&doc, "author_id"), Some(id));
    }

    #[test]
    fn resolved_accessors_respect_shape() {
        let id = EntityId::new();
        let one = Resolved::One(HashMap::from([(id, None)]));
        assert!(one.one(id).is_none());
        assert!(one.many(id).is_none());

        let many = Resolved::Many(HashMap::from([(id, vec![])]));
        assert_eq!(many.many(id), Some(&[][..]));
        assert!(many.one(id).is_none());
    }
}
