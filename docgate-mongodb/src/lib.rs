//! MongoDB client for docgate.
//!
//! This crate wraps the official MongoDB driver behind the `DocumentClient`
//! trait, translating docgate queries into MongoDB filters and sort documents.
//!
//! To use this client, include the `mongodb` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! docgate = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! # Example
//!
//! ```ignore
//! use docgate::{prelude::*, mongodb::MongoClientBuilder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let credentials = Credentials::from_file("credentials.json")?;
//!     let store = DocumentStore::connect(MongoClientBuilder::new(credentials)).await?;
//!
//!     let users = store.get_all(&Context::new(), "users").await?;
//!     println!("{} users", users.len());
//!
//!     store.shutdown().await?;
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as docgate_mongodb;

pub mod client;
pub(crate) mod query;

pub use client::{MongoClient, MongoClientBuilder};
