//! Per-type entity configuration.

use crate::relationship::Relationship;

/// Immutable configuration for one entity type.
///
/// An `EntityType` is declarative metadata attached to a type at
/// registration time: its storage prefix segment, declared unique fields,
/// indexed-field hints, and relationship descriptors. The Data Service and
/// Query Engine consult it; they never reflect over documents.
///
/// Indexed-field hints mark attributes expected to be filtered or sorted
/// frequently. The engine is correct without any physical index - every
/// operation degrades to a full prefix scan - so the hints are carried for
/// callers and future read-through caches, never as a source of truth.
///
/// # Example
///
/// ```
/// use shelfdb_core::{EntityType, OnDelete, Relationship};
///
/// let author = EntityType::new("author", "authors")
///     .unique_field("email")
///     .indexed_field("name")
///     .relationship(
///         Relationship::has_many("posts", "post", "author_id")
///             .on_delete(OnDelete::Cascade),
///     );
/// assert_eq!(author.plural_name(), "authors");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct EntityType {
    name: String,
    plural_name: String,
    unique_fields: Vec<String>,
    indexed_fields: Vec<String>,
    relationships: Vec<Relationship>,
}

impl EntityType {
    /// Creates a new entity type configuration.
    ///
    /// `plural_name` becomes the storage prefix segment for the type.
    #[must_use]
    pub fn new(name: impl Into<String>, plural_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            plural_name: plural_name.into(),
            unique_fields: Vec::new(),
            indexed_fields: Vec::new(),
            relationships: Vec::new(),
        }
    }

    /// Declares a field whose value must be distinct across all instances.
    #[must_use]
    pub fn unique_field(mut self, field: impl Into<String>) -> Self {
        self.unique_fields.push(field.into());
        self
    }

    /// Declares a field expected to be filtered or sorted frequently.
    #[must_use]
    pub fn indexed_field(mut self, field: impl Into<String>) -> Self {
        self.indexed_fields.push(field.into());
        self
    }

    /// Declares a relationship to another entity type.
    #[must_use]
    pub fn relationship(mut self, relationship: Relationship) -> Self {
        self.relationships.push(relationship);
        self
    }

    /// Returns the type name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the plural name (storage prefix segment).
    #[must_use]
    pub fn plural_name(&self) -> &str {
        &self.plural_name
    }

    /// Returns the declared unique fields.
    #[must_use]
    pub fn unique_fields(&self) -> &[String] {
        &self.unique_fields
    }

    /// Returns the declared indexed-field hints.
    #[must_use]
    pub fn indexed_fields(&self) -> &[String] {
        &self.indexed_fields
    }

    /// Returns the declared relationships.
    #[must_use]
    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    /// Looks up a relationship by name.
    #[must_use]
    pub fn relationship_named(&self, name: &str) -> Option<&Relationship> {
        self.relationships.iter().find(|r| r.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relationship::OnDelete;

    #[test]
    fn builder_accumulates() {
        let entity_type = EntityType::new("author", "authors")
            .unique_field("email")
            .unique_field("handle")
            .indexed_field("name")
            .relationship(
                Relationship::has_many("posts", "post", "author_id").on_delete(OnDelete::Cascade),
            );

        assert_eq!(entity_type.name(), "author");
        assert_eq!(entity_type.plural_name(), "authors");
        assert_eq!(entity_type.unique_fields(), ["email", "handle"]);
        assert_eq!(entity_type.indexed_fields(), ["name"]);
        assert_eq!(entity_type.relationships().len(), 1);
    }

    #[test]
    fn relationship_lookup_by_name() {
        let entity_type = EntityType::new("author", "authors")
            .relationship(Relationship::has_many("posts", "post", "author_id"));

        assert!(entity_type.relationship_named("posts").is_some());
        assert!(entity_type.relationship_named("comments").is_none());
    }
}
