//! # ShelfDB Core
//!
//! The document engine: typed data services, a client-side query engine,
//! relationship resolution, and delete-time referential integrity, all on
//! top of any [`ObjectStore`](shelfdb_store::ObjectStore) implementation.
//!
//! ## Architecture
//!
//! - [`Engine`] ties a store, an [`EngineConfig`], and a [`Registry`] of
//!   [`EntityType`] declarations together.
//! - [`DataService`] is the per-type CRUD surface with unique-field
//!   enforcement.
//! - [`Query`] filters, sorts, windows, and projects documents entirely
//!   client-side; the store only ever lists and fetches.
//! - [`RelationshipResolver`] answers declared relationships for batches
//!   of documents; [`CascadeHandler`] applies delete behavior (cascade,
//!   set-null, protect) before a deletion.
//!
//! ## Usage
//!
//! ```
//! use shelfdb_core::{Engine, EngineConfig, EntityType, OnDelete, Registry, Relationship};
//! use shelfdb_store::MemoryStore;
//! use serde_json::{json, Map};
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut registry = Registry::new();
//! registry.register(
//!     EntityType::new("author", "authors")
//!         .unique_field("email")
//!         .relationship(
//!             Relationship::has_many("posts", "post", "author_id")
//!                 .on_delete(OnDelete::Cascade),
//!         ),
//! );
//! registry.register(EntityType::new("post", "posts"));
//!
//! let engine = Engine::new(
//!     Arc::new(MemoryStore::new()),
//!     EngineConfig::default(),
//!     registry,
//! );
//!
//! let authors = engine.service("author")?;
//! let mut attrs = Map::new();
//! attrs.insert("email".into(), json!("alice@example.com"));
//! let alice = authors.create(attrs).await?;
//!
//! let found = authors
//!     .query()
//!     .filter("email", json!("alice@example.com"))?
//!     .first()
//!     .await?;
//! assert_eq!(found.map(|d| d.id()), Some(alice.id()));
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cascade;
mod config;
mod engine;
mod entity;
mod error;
mod query;
mod registry;
mod relationship;
mod service;

pub use cascade::{CascadeHandler, CascadeSummary};
pub use config::EngineConfig;
pub use engine::Engine;
pub use entity::EntityType;
pub use error::{BlockedRelationship, CoreError, CoreResult};
pub use query::{Operator, Page, Predicate, Query, SortSpec};
pub use registry::Registry;
pub use relationship::{
    OnDelete, RelationKind, Relationship, RelationshipResolver, Resolved,
};
pub use service::DataService;

pub use shelfdb_codec::{Document, EntityId};
