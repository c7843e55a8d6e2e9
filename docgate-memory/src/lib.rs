//! In-memory document database client for docgate.
//!
//! This crate provides a thread-safe, in-memory implementation of the
//! `DocumentClient` trait. It uses async-aware read-write locks for concurrent
//! access and is meant for development and tests.
//!
//! # Features
//!
//! - **Thread-safe access** - Concurrent reads and writes using async-aware RwLock
//! - **Managed-database semantics** - Missing fields never match, ordering drops documents lacking the order field
//! - **Failure injection** - Simulated transport failures for exercising error paths
//! - **Deadline aware** - Expired or cancelled contexts are refused
//!
//! # Quick Start
//!
//! ```ignore
//! use docgate::{prelude::*, memory::MemoryClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = DocumentStore::connect(MemoryClient::builder()).await?;
//!     let ctx = Context::new();
//!
//!     store.add(&ctx, "users", &doc! { "name": "Alice" }).await?;
//!     let alice = store.find_one_by_field(&ctx, "users", "name", "==", "Alice").await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as docgate_memory;

pub mod client;
pub(crate) mod evaluator;

pub use client::{MemoryClient, MemoryClientBuilder};
