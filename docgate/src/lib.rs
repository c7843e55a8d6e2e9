//! Main docgate crate providing a thin access layer over document databases.
//!
//! This crate is the primary entry point for users of docgate. It re-exports
//! the core types from the sub-crates and provides access to the available
//! database clients.
//!
//! # Features
//!
//! - **Shaped queries** - Find one or all documents by one or two field predicates, with optional ordering
//! - **Mutations** - Add, merge-update and delete documents by reference
//! - **Uniform errors** - Not-found, unretrievable and failed operations are told apart by variant
//! - **Per-call context** - Every operation honours a deadline and cancellation token
//!
//! # Quick Start
//!
//! ```ignore
//! use docgate::{prelude::*, memory::MemoryClient};
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! pub struct User {
//!     pub name: String,
//!     pub age: i32,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), DocumentStoreError> {
//!     let store = DocumentStore::new(MemoryClient::new());
//!     let ctx = Context::new();
//!
//!     store.add(&ctx, "users", &User { name: "Alice".into(), age: 30 }).await?;
//!     store.add(&ctx, "users", &User { name: "Bob".into(), age: 25 }).await?;
//!
//!     let adults = store
//!         .find_all_by_field_and_order(&ctx, "users", "age", ">=", 18, "age", Direction::Ascending)
//!         .await?;
//!
//!     for snapshot in adults {
//!         let user: User = snapshot.data_to()?;
//!         println!("{} is {}", user.name, user.age);
//!     }
//!
//!     store.shutdown().await
//! }
//! ```
//!
//! # Dynamic Dispatch
//!
//! A store can be converted into a [`DynDocumentStore`](store::DynDocumentStore)
//! when the client is only chosen at runtime, and converted back with
//! `into_static` when the concrete client type is known again.
//!
//! ```ignore
//! use docgate::{prelude::*, memory::MemoryClient};
//!
//! let store = DocumentStore::new(MemoryClient::new()).into_dyn();
//! let users = store.get_all(&Context::new(), "users").await;
//!
//! let store = store.into_static::<MemoryClient>().unwrap();
//! ```
//!
//! # Clients
//!
//! - [`memory`] - In-memory client for development and testing
//! - [`mongodb`] - MongoDB client (requires `mongodb` feature)

pub mod prelude;

pub use docgate_core::{client, context, credentials, document, error, query, store, value};

// Re-export BSON types for convenience
pub use bson;

/// In-memory client implementations.
pub mod memory {
    pub use docgate_memory::{MemoryClient, MemoryClientBuilder};
}

/// MongoDB client implementations.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use docgate_mongodb::{MongoClient, MongoClientBuilder};
}
