//! Convenient re-exports of commonly used types from docgate.
//!
//! ```ignore
//! use docgate::prelude::*;
//! ```
//!
//! `DynDocumentClient` is not re-exported: with both client traits in
//! scope, method calls on a concrete client become ambiguous. Import it from
//! [`client`](crate::client) where it is needed.

pub use bson::doc;

pub use docgate_core::{
    store::{DocumentStore, DynDocumentStore},
    client::{DocumentClient, ClientBuilder},
    context::Context,
    credentials::Credentials,
    document::{DocumentRef, DocumentSnapshot},
    query::{Query, QueryBuilder, QueryVisitor, Predicate, FieldOp, Direction, Order},
    value::FieldValue,
    error::{ClientError, DocumentStoreError, DocumentStoreResult},
};
