//! Referential-integrity enforcement on delete.
//!
//! When a document is deleted, its declared one-to-many and one-to-one
//! relationships decide what happens to dependents: cascade the deletion,
//! null out their foreign key, refuse the deletion, or do nothing. The
//! handler runs in two passes over the dependency tree: a read-only
//! planning pass that surfaces every protected relationship and detects
//! reference cycles, then a mutation pass. A protected dependent anywhere
//! in the tree fails the whole call before a single write happens.

use crate::engine::Engine;
use crate::error::{BlockedRelationship, CoreError, CoreResult};
use crate::relationship::{OnDelete, RelationKind, Relationship};
use futures::future::BoxFuture;
use serde_json::{Map, Value};
use shelfdb_codec::{Document, EntityId};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Counts of what a cascade actually did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CascadeSummary {
    /// Dependents deleted, including transitively.
    pub cascaded: usize,
    /// Dependents whose foreign key was nulled.
    pub set_null: usize,
}

/// Applies relationship delete behavior ahead of a document deletion.
///
/// The handler mutates dependents only; deleting the root document stays
/// with the caller.
#[derive(Debug, Clone)]
pub struct CascadeHandler {
    engine: Engine,
}

impl CascadeHandler {
    pub(crate) fn new(engine: Engine) -> Self {
        Self { engine }
    }

    /// Prepares dependents of `doc` for its deletion.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DeletionProtected`] if any relationship in the
    /// dependency tree is protected and populated, without mutating
    /// anything. Returns [`CoreError::CascadeCycle`] if the cascade would
    /// revisit a document it already covers.
    pub async fn handle_delete(
        &self,
        type_name: &str,
        doc: &Document,
    ) -> CoreResult<CascadeSummary> {
        let mut visited = HashSet::new();
        visited.insert((type_name.to_string(), doc.id()));

        let mut blocked = Vec::new();
        self.plan(type_name, doc.id(), &mut visited, &mut blocked)
            .await?;
        if !blocked.is_empty() {
            warn!(
                entity_type = type_name,
                id = %doc.id(),
                blocked = blocked.len(),
                "deletion blocked by protected relationships"
            );
            return Err(CoreError::DeletionProtected { blocked });
        }

        let mut summary = CascadeSummary::default();
        self.apply(type_name, doc.id(), &mut summary).await?;
        debug!(
            entity_type = type_name,
            id = %doc.id(),
            cascaded = summary.cascaded,
            set_null = summary.set_null,
            "cascade applied"
        );
        Ok(summary)
    }

    /// Read-only pass: collects protected blockers across the whole tree
    /// and verifies the cascade graph is acyclic.
    fn plan<'a>(
        &'a self,
        type_name: &'a str,
        id: EntityId,
        visited: &'a mut HashSet<(String, EntityId)>,
        blocked: &'a mut Vec<BlockedRelationship>,
    ) -> BoxFuture<'a, CoreResult<()>> {
        Box::pin(async move {
            let entity_type = self.engine.registry().get(type_name)?;
            for relationship in delete_side(entity_type.relationships()) {
                match relationship.on_delete {
                    OnDelete::Protect => {
                        let count = self.dependents_query(relationship, id)?.count().await?;
                        if count > 0 {
                            blocked.push(BlockedRelationship {
                                relationship: relationship.name.clone(),
                                count,
                            });
                        }
                    }
                    OnDelete::Cascade => {
                        let dependents =
                            self.dependents_query(relationship, id)?.all().await?;
                        for dependent in dependents {
                            let key = (relationship.related_type.clone(), dependent.id());
                            if !visited.insert(key) {
                                return Err(CoreError::cascade_cycle(
                                    &relationship.related_type,
                                    dependent.id(),
                                ));
                            }
                            self.plan(
                                &relationship.related_type,
                                dependent.id(),
                                visited,
                                blocked,
                            )
                            .await?;
                        }
                    }
                    OnDelete::SetNull | OnDelete::DoNothing => {}
                }
            }
            Ok(())
        })
    }

    /// Mutation pass: deletes cascaded dependents depth-first and nulls
    /// set-null foreign keys.
    fn apply<'a>(
        &'a self,
        type_name: &'a str,
        id: EntityId,
        summary: &'a mut CascadeSummary,
    ) -> BoxFuture<'a, CoreResult<()>> {
        Box::pin(async move {
            let entity_type = self.engine.registry().get(type_name)?;
            for relationship in delete_side(entity_type.relationships()) {
                match relationship.on_delete {
                    OnDelete::Cascade => {
                        let service = self.engine.related_service(relationship)?;
                        let dependents =
                            self.dependents_query(relationship, id)?.all().await?;
                        for dependent in dependents {
                            self.apply(
                                &relationship.related_type,
                                dependent.id(),
                                summary,
                            )
                            .await?;
                            service.delete(dependent.id()).await?;
                            summary.cascaded += 1;
                        }
                    }
                    OnDelete::SetNull => {
                        let service = self.engine.related_service(relationship)?;
                        let dependents =
                            self.dependents_query(relationship, id)?.all().await?;
                        for dependent in dependents {
                            let mut changes = Map::new();
                            changes.insert(relationship.foreign_key.clone(), Value::Null);
                            service.update(dependent.id(), changes).await?;
                            summary.set_null += 1;
                        }
                    }
                    OnDelete::Protect | OnDelete::DoNothing => {}
                }
            }
            Ok(())
        })
    }

    /// Builds the query enumerating dependents of `id` through one
    /// relationship.
    fn dependents_query(
        &self,
        relationship: &Relationship,
        id: EntityId,
    ) -> CoreResult<crate::query::Query> {
        self.engine
            .related_service(relationship)?
            .query()
            .filter(
                &relationship.foreign_key,
                Value::String(id.to_string()),
            )
    }
}

/// Filters for the relationship shapes that carry delete behavior. A
/// many-to-one descriptor describes the child's own foreign key, so it
/// never drives the parent-side cascade.
fn delete_side(relationships: &[Relationship]) -> impl Iterator<Item = &Relationship> {
    relationships
        .iter()
        .filter(|r| matches!(r.kind, RelationKind::OneToMany | RelationKind::OneToOne))
}
