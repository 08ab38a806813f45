//! The engine: one store, one configuration, one registry.

use crate::cascade::CascadeHandler;
use crate::config::EngineConfig;
use crate::error::{CoreError, CoreResult};
use crate::registry::Registry;
use crate::relationship::{Relationship, RelationshipResolver};
use crate::service::DataService;
use shelfdb_store::ObjectStore;
use std::fmt;
use std::sync::Arc;

/// The top-level entry point tying a store, a configuration, and a
/// registry together.
///
/// An engine is cheap to clone; clones share the same store and registry.
/// Per-type access goes through [`Engine::service`], cross-type features
/// through [`Engine::resolver`] and [`Engine::cascade`].
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    store: Arc<dyn ObjectStore>,
    config: EngineConfig,
    registry: Registry,
}

impl Engine {
    /// Creates an engine over a store with the given configuration and
    /// type registry.
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>, config: EngineConfig, registry: Registry) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                store,
                config,
                registry,
            }),
        }
    }

    /// Returns the engine configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Returns the type registry.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    /// Returns a data service for a registered entity type.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownEntityType`](crate::CoreError::UnknownEntityType)
    /// if the type was never registered.
    pub fn service(&self, type_name: &str) -> CoreResult<DataService> {
        let entity_type = self.inner.registry.get(type_name)?;
        Ok(DataService::new(
            Arc::clone(&self.inner.store),
            entity_type,
            self.inner.config.clone(),
        ))
    }

    /// Looks up the service for a relationship's related type, reporting a
    /// broken descriptor as [`CoreError::UnknownRelatedType`](crate::CoreError::UnknownRelatedType)
    /// so the error names the relationship that referenced it.
    pub(crate) fn related_service(
        &self,
        relationship: &Relationship,
    ) -> CoreResult<DataService> {
        self.service(&relationship.related_type).map_err(|err| match err {
            CoreError::UnknownEntityType { .. } => CoreError::unknown_related_type(
                &relationship.name,
                &relationship.related_type,
            ),
            other => other,
        })
    }

    /// Returns a relationship resolver bound to this engine.
    #[must_use]
    pub fn resolver(&self) -> RelationshipResolver {
        RelationshipResolver::new(self.clone())
    }

    /// Returns a cascade handler bound to this engine.
    #[must_use]
    pub fn cascade(&self) -> CascadeHandler {
        CascadeHandler::new(self.clone())
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.inner.config)
            .field("registered_types", &self.inner.registry.len())
            .finish_non_exhaustive()
    }
}
