//! Storage-key layout.
//!
//! These functions alone define a type's keyspace. No other code may
//! construct storage paths - keeping the layout in one place is what makes
//! the `{base_path}/{plural_name}/{id}.json` contract enforceable.

use crate::id::EntityId;

/// File extension for stored documents.
const EXTENSION: &str = ".json";

/// Returns the storage key for a document of a given type.
///
/// Layout: `{base_path}/{plural_name}/{id}.json`.
#[must_use]
pub fn key_for(base_path: &str, plural_name: &str, id: EntityId) -> String {
    format!("{base_path}/{plural_name}/{id}{EXTENSION}")
}

/// Returns the listing prefix covering all documents of a type.
///
/// Every key produced by [`key_for`] for the same type starts with this
/// prefix, and no key of any other type does.
#[must_use]
pub fn prefix_for(base_path: &str, plural_name: &str) -> String {
    format!("{base_path}/{plural_name}/")
}

/// Recovers the document id from a listing key.
///
/// Returns `None` for keys that do not follow the `{id}.json` layout.
#[must_use]
pub fn id_from_key(key: &str) -> Option<EntityId> {
    let file = key.rsplit('/').next()?;
    let stem = file.strip_suffix(EXTENSION)?;
    EntityId::parse(stem)
}
