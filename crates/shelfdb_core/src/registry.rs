//! Entity-type registry.

use crate::entity::EntityType;
use crate::error::{CoreError, CoreResult};
use std::collections::HashMap;
use std::sync::Arc;

/// Holds every registered entity type, keyed by type name.
///
/// Registration is explicit: every type must be registered before the
/// engine will serve it. The registry is a plain value handed to the engine
/// at construction - there is no process-wide mutable registry, so separate
/// engines (and separate tests) never observe each other's types.
#[derive(Debug, Default, Clone)]
pub struct Registry {
    types: HashMap<String, Arc<EntityType>>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an entity type, replacing any previous registration under
    /// the same name.
    pub fn register(&mut self, entity_type: EntityType) {
        self.types
            .insert(entity_type.name().to_string(), Arc::new(entity_type));
    }

    /// Looks up an entity type by name.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownEntityType`] if the type was never
    /// registered.
    pub fn get(&self, name: &str) -> CoreResult<Arc<EntityType>> {
        self.types
            .get(name)
            .cloned()
            .ok_or_else(|| CoreError::unknown_entity_type(name))
    }

    /// Returns `true` if a type with this name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Returns the number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if no types are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
