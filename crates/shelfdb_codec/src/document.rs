//! The persisted document record.

use crate::id::EntityId;
use serde_json::{Map, Value};
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};

/// Reserved field name for the document identity.
pub const FIELD_ID: &str = "id";
/// Reserved field name for the creation timestamp.
pub const FIELD_CREATED_AT: &str = "created_at";
/// Reserved field name for the last-mutation timestamp.
pub const FIELD_UPDATED_AT: &str = "updated_at";

/// Returns the current UTC time, truncated to whole microseconds.
///
/// Truncation keeps timestamps byte-stable across a JSON round-trip: the
/// RFC 3339 text form written by the codec carries microsecond precision.
#[must_use]
pub fn now() -> OffsetDateTime {
    let t = OffsetDateTime::now_utc();
    // nanosecond() is always < 1e9, so the truncated value is valid
    t.replace_nanosecond(t.nanosecond() / 1_000 * 1_000)
        .unwrap_or(t)
}

/// Formats a timestamp in the stored RFC 3339 form (UTC, `Z` offset).
pub(crate) fn format_timestamp(t: OffsetDateTime) -> String {
    t.format(&Rfc3339)
        .unwrap_or_else(|_| String::from("1970-01-01T00:00:00Z"))
}

/// Parses a timestamp from its stored RFC 3339 form.
pub(crate) fn parse_timestamp(s: &str) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(s, &Rfc3339).ok()
}

/// A typed, identity-bearing record persisted as one object-store blob.
///
/// A document carries three server-assigned reserved fields - [`FIELD_ID`],
/// [`FIELD_CREATED_AT`], [`FIELD_UPDATED_AT`] - plus an ordered map of
/// type-specific attributes. The id is immutable; `updated_at` advances on
/// every mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    id: EntityId,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
    attrs: Map<String, Value>,
}

impl Document {
    /// Creates a new document with a fresh id and no attributes.
    ///
    /// `created_at` and `updated_at` are equal at creation.
    #[must_use]
    pub fn new() -> Self {
        Self::with_attrs(Map::new())
    }

    /// Creates a new document with a fresh id and the given attributes.
    ///
    /// Reserved field names present in `attrs` are discarded - identity and
    /// timestamps are always server-assigned.
    #[must_use]
    pub fn with_attrs(mut attrs: Map<String, Value>) -> Self {
        strip_reserved(&mut attrs);
        let created = now();
        Self {
            id: EntityId::new(),
            created_at: created,
            updated_at: created,
            attrs,
        }
    }

    /// Reassembles a document from already-persisted parts.
    ///
    /// Used by the codec when decoding; `attrs` must not contain reserved
    /// field names (the codec extracts them first).
    #[must_use]
    pub fn from_parts(
        id: EntityId,
        created_at: OffsetDateTime,
        updated_at: OffsetDateTime,
        attrs: Map<String, Value>,
    ) -> Self {
        Self {
            id,
            created_at,
            updated_at,
            attrs,
        }
    }

    /// Returns the document id.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    /// Returns the last-mutation timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> OffsetDateTime {
        self.updated_at
    }

    /// Returns the type-specific attributes.
    #[must_use]
    pub const fn attrs(&self) -> &Map<String, Value> {
        &self.attrs
    }

    /// Returns one attribute value, if present.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.attrs.get(name)
    }

    /// Sets an attribute value.
    ///
    /// Reserved field names are ignored - identity and timestamps cannot be
    /// set through the attribute map.
    pub fn set_attr(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        if !is_reserved(&name) {
            self.attrs.insert(name, value);
        }
    }

    /// Removes an attribute, returning its previous value.
    pub fn remove_attr(&mut self, name: &str) -> Option<Value> {
        self.attrs.remove(name)
    }

    /// Advances `updated_at`.
    ///
    /// Guaranteed to move the timestamp strictly forward even when the
    /// clock has not ticked past the previous value.
    pub fn touch(&mut self) {
        let t = now();
        self.updated_at = if t > self.updated_at {
            t
        } else {
            self.updated_at + Duration::microseconds(1)
        };
    }

    /// Looks up a field by name, resolving reserved fields as virtual
    /// attributes.
    ///
    /// `id` resolves to its string form and the timestamps to their RFC 3339
    /// string form, so the query engine sees one uniform, comparable view of
    /// every field. Returns `None` for absent attributes.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<Value> {
        match name {
            FIELD_ID => Some(Value::String(self.id.to_string())),
            FIELD_CREATED_AT => Some(Value::String(format_timestamp(self.created_at))),
            FIELD_UPDATED_AT => Some(Value::String(format_timestamp(self.updated_at))),
            _ => self.attrs.get(name).cloned(),
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns `true` if `name` is a reserved field name.
#[must_use]
pub(crate) fn is_reserved(name: &str) -> bool {
    matches!(name, FIELD_ID | FIELD_CREATED_AT | FIELD_UPDATED_AT)
}

fn strip_reserved(attrs: &mut Map<String, Value>) {
    attrs.remove(FIELD_ID);
    attrs.remove(FIELD_CREATED_AT);
    attrs.remove(FIELD_UPDATED_AT);
}
