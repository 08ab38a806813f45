//! # ShelfDB Store
//!
//! Object-store adapter trait and implementations for ShelfDB.
//!
//! This crate provides the lowest-level storage abstraction for ShelfDB.
//! Stores are **opaque blob stores** addressed by string keys - they do not
//! interpret the data they hold.
//!
//! ## Design Principles
//!
//! - Stores expose the minimal S3-style capability set: get, put, delete,
//!   head, and list-by-prefix with a continuation marker
//! - No server-side filtering, no transactions, no secondary indexes
//! - Listings are prefix-ordered; markers are opaque
//! - Must be `Send + Sync` for concurrent access
//! - ShelfDB owns all key layout and payload interpretation
//! - Retry and timeout policy belongs to the store implementation, never to
//!   the engine above it
//!
//! ## Available Stores
//!
//! - [`MemoryStore`] - For testing and ephemeral databases
//! - [`FsStore`] - One file per blob under a local directory
//!
//! ## Example
//!
//! ```rust
//! use shelfdb_store::{MemoryStore, ObjectStore};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let store = MemoryStore::new();
//! store.put("data/users/1.json", b"{}".as_ref().into()).await.unwrap();
//! let blob = store.get("data/users/1.json").await.unwrap();
//! assert!(blob.is_some());
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod adapter;
mod error;
mod fs;
mod memory;

pub use adapter::{Listing, ObjectStore};
pub use error::{StoreError, StoreResult};
pub use fs::FsStore;
pub use memory::MemoryStore;
