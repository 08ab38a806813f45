//! Error types for the ShelfDB engine.

use shelfdb_codec::EntityId;
use thiserror::Error;

/// Result type for engine operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// One relationship that blocked a deletion, with its dependent count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockedRelationship {
    /// Name of the protecting relationship.
    pub relationship: String,
    /// Number of dependents found.
    pub count: usize,
}

/// Errors that can occur in ShelfDB engine operations.
///
/// Absence is never reported through this type: `get`-like operations
/// return `Ok(None)` and `delete` returns `Ok(false)` for missing ids.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Object-store error, passed through unmodified.
    #[error("store error: {0}")]
    Store(#[from] shelfdb_store::StoreError),

    /// Codec error: corrupt or schema-incompatible stored data.
    #[error("codec error: {0}")]
    Codec(#[from] shelfdb_codec::CodecError),

    /// A declared unique field already holds this value on another
    /// instance.
    #[error("unique constraint violated: field '{field}' already has value '{value}'")]
    UniqueConstraint {
        /// The constrained field.
        field: String,
        /// The duplicated value.
        value: String,
    },

    /// Malformed filter, sort, or pagination input. Raised at query-build
    /// time, before any store access.
    #[error("invalid query: {message}")]
    InvalidQuery {
        /// Description of what is malformed.
        message: String,
    },

    /// `get()` matched more than one document.
    #[error("query for '{type_name}' matched {count} documents, expected exactly one")]
    MultipleResults {
        /// The entity type queried.
        type_name: String,
        /// How many documents matched.
        count: usize,
    },

    /// Deletion refused because protected relationships have dependents.
    #[error("deletion blocked by protected relationships: {}", format_blocked(.blocked))]
    DeletionProtected {
        /// Every blocking relationship with its dependent count.
        blocked: Vec<BlockedRelationship>,
    },

    /// A cascade walk revisited a (type, id) pair: the relationship graph
    /// is cyclic, which is a configuration error.
    #[error("cascade cycle detected at {type_name}/{id}")]
    CascadeCycle {
        /// The entity type where the cycle closed.
        type_name: String,
        /// The document id where the cycle closed.
        id: EntityId,
    },

    /// The entity type has not been registered.
    #[error("unknown entity type '{name}': register it before use")]
    UnknownEntityType {
        /// The unregistered type name.
        name: String,
    },

    /// A relationship descriptor references an entity type that has not
    /// been registered.
    #[error("relationship '{relationship}' references unknown entity type '{related_type}'")]
    UnknownRelatedType {
        /// The relationship whose descriptor is broken.
        relationship: String,
        /// The unregistered type it references.
        related_type: String,
    },
}

impl CoreError {
    /// Creates a unique-constraint violation error.
    pub fn unique_constraint(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::UniqueConstraint {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Creates an invalid-query error.
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery {
            message: message.into(),
        }
    }

    /// Creates a multiple-results error.
    pub fn multiple_results(type_name: impl Into<String>, count: usize) -> Self {
        Self::MultipleResults {
            type_name: type_name.into(),
            count,
        }
    }

    /// Creates a cascade-cycle error.
    pub fn cascade_cycle(type_name: impl Into<String>, id: EntityId) -> Self {
        Self::CascadeCycle {
            type_name: type_name.into(),
            id,
        }
    }

    /// Creates an unknown-entity-type error.
    pub fn unknown_entity_type(name: impl Into<String>) -> Self {
        Self::UnknownEntityType { name: name.into() }
    }

    /// Creates an unknown-related-type error.
    pub fn unknown_related_type(
        relationship: impl Into<String>,
        related_type: impl Into<String>,
    ) -> Self {
        Self::UnknownRelatedType {
            relationship: relationship.into(),
            related_type: related_type.into(),
        }
    }
}

fn format_blocked(blocked: &[BlockedRelationship]) -> String {
    blocked
        .iter()
        .map(|b| format!("{} ({} dependents)", b.relationship, b.count))
        .collect::<Vec<_>>()
        .join(", ")
}
