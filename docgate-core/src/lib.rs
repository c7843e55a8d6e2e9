//! A thin access layer over managed document databases.
//!
//! This crate is the core of the docgate project and provides:
//!
//! - **Document store facade** ([`store`]) - Shaped queries and mutations keyed by collection name
//! - **Client abstraction** ([`client`]) - The trait a database SDK is wrapped behind
//! - **Queries** ([`query`]) - Field predicates, ordering and limits
//! - **Values** ([`value`]) - The closed set of values a predicate can compare against
//! - **Documents** ([`document`]) - References and immutable snapshots
//! - **Call context** ([`context`]) - Per-call deadlines and cancellation
//! - **Credentials** ([`credentials`]) - What a client needs to connect
//! - **Error handling** ([`error`]) - The error taxonomy returned to callers
//!
//! # Example
//!
//! ```ignore
//! use docgate::{prelude::*, memory::MemoryClient};
//!
//! let store = DocumentStore::new(MemoryClient::new());
//! let ctx = Context::new();
//!
//! store.add(&ctx, "users", &doc! { "name": "a", "age": 30 }).await?;
//!
//! match store.find_one_by_field(&ctx, "users", "name", "==", "b").await {
//!     Ok(snapshot) => println!("found {}", snapshot.reference()),
//!     Err(err) if err.is_not_found() => println!("no such user"),
//!     Err(err) => return Err(err),
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as docgate_core;

pub mod client;
pub mod context;
pub mod credentials;
pub mod document;
pub mod error;
pub mod query;
pub mod store;
pub mod value;
