//! # ShelfDB Codec
//!
//! Document model and JSON encoding/decoding for ShelfDB.
//!
//! This crate defines the persisted record shape ([`Document`]) and the two
//! pure transforms between documents and stored bytes. It also owns the
//! keyspace: [`key_for`] and [`prefix_for`] are the only functions allowed
//! to construct storage paths.
//!
//! ## Document Layout
//!
//! Every document is stored as one JSON object with three reserved fields -
//! `id`, `created_at`, `updated_at` - alongside its type-specific
//! attributes:
//!
//! ```json
//! {
//!   "id": "4d5e...-....",
//!   "created_at": "2026-01-05T09:30:00.000001Z",
//!   "updated_at": "2026-01-05T09:30:00.000001Z",
//!   "name": "Alice",
//!   "email": "alice@example.com"
//! }
//! ```
//!
//! Unknown extra fields found when decoding are **passed through** into the
//! attribute map and survive the next encode; nothing is silently dropped.
//!
//! ## Usage
//!
//! ```
//! use shelfdb_codec::{decode, encode, Document};
//! use serde_json::json;
//!
//! let mut doc = Document::new();
//! doc.set_attr("name", json!("Alice"));
//!
//! let bytes = encode(&doc).unwrap();
//! let decoded = decode(&bytes).unwrap();
//! assert_eq!(doc, decoded);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod codec;
mod document;
mod error;
mod id;
mod keys;

pub use codec::{decode, encode};
pub use document::{now, Document, FIELD_CREATED_AT, FIELD_ID, FIELD_UPDATED_AT};
pub use error::{CodecError, CodecResult};
pub use id::EntityId;
pub use keys::{id_from_key, key_for, prefix_for};
