//! Client abstraction over a managed document database.
//!
//! The [`DocumentClient`] trait is the seam between the
//! [`DocumentStore`](crate::store::DocumentStore) facade and whatever SDK
//! actually talks to the database. It exposes only the primitives the facade
//! needs: a collection-scoped query, insert, get, merge-set and delete by id.
//!
//! # Traits
//!
//! - [`DocumentClient`]: The core trait for database clients
//! - [`DynDocumentClient`]: Object-safe companion for runtime client selection
//! - [`ClientBuilder`]: Builds a client from credentials
//!
//! # Example
//!
//! ```ignore
//! use docgate::{client::DocumentClient, context::Context, query::Query};
//!
//! let docs = client.run_query(&Context::new(), "users", &Query::new()).await?;
//! ```

use async_trait::async_trait;
use bson::{Document, Uuid};
use std::{any::Any, fmt::Debug};

use crate::{
    context::Context,
    document::RawDocument,
    error::{ClientResult, DocumentStoreResult},
    query::Query,
};

/// Abstract interface for document database clients.
///
/// # Thread Safety
///
/// Implementations must be safe to share between tasks. The facade issues
/// concurrent calls against a single client without any locking of its own.
///
/// # Deadlines
///
/// Every method takes the caller's [`Context`]. Implementations are
/// responsible for honouring its deadline and cancellation, typically through
/// [`Context::run`].
#[async_trait]
pub trait DocumentClient: Send + Sync + Debug {
    /// Runs a filtered, optionally ordered and limited query against a collection.
    ///
    /// An empty result is `Ok(vec![])`. Documents are returned in query order.
    async fn run_query(
        &self,
        ctx: &Context,
        collection: &str,
        query: &Query,
    ) -> ClientResult<Vec<RawDocument>>;

    /// Inserts a new document under `id`.
    async fn insert(
        &self,
        ctx: &Context,
        collection: &str,
        id: Uuid,
        fields: Document,
    ) -> ClientResult<()>;

    /// Reads a single document by id, or `None` if it does not exist.
    async fn get(
        &self,
        ctx: &Context,
        collection: &str,
        id: Uuid,
    ) -> ClientResult<Option<RawDocument>>;

    /// Merges `fields` into the document, overwriting only the fields given.
    ///
    /// A missing document is created from `fields`.
    async fn set_merge(
        &self,
        ctx: &Context,
        collection: &str,
        id: Uuid,
        fields: Document,
    ) -> ClientResult<()>;

    /// Deletes the document. Deleting a missing document succeeds.
    async fn delete(&self, ctx: &Context, collection: &str, id: Uuid) -> ClientResult<()>;

    /// Releases the connection held by the client.
    ///
    /// The default implementation is a no-op.
    async fn shutdown(self) -> DocumentStoreResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

#[async_trait]
impl<C> DocumentClient for &C
where
    C: DocumentClient,
{
    async fn run_query(
        &self,
        ctx: &Context,
        collection: &str,
        query: &Query,
    ) -> ClientResult<Vec<RawDocument>> {
        <C as DocumentClient>::run_query(*self, ctx, collection, query)
            .await
    }

    async fn insert(
        &self,
        ctx: &Context,
        collection: &str,
        id: Uuid,
        fields: Document,
    ) -> ClientResult<()> {
        <C as DocumentClient>::insert(*self, ctx, collection, id, fields)
            .await
    }

    async fn get(
        &self,
        ctx: &Context,
        collection: &str,
        id: Uuid,
    ) -> ClientResult<Option<RawDocument>> {
        <C as DocumentClient>::get(*self, ctx, collection, id).await
    }

    async fn set_merge(
        &self,
        ctx: &Context,
        collection: &str,
        id: Uuid,
        fields: Document,
    ) -> ClientResult<()> {
        <C as DocumentClient>::set_merge(*self, ctx, collection, id, fields)
            .await
    }

    async fn delete(&self, ctx: &Context, collection: &str, id: Uuid) -> ClientResult<()> {
        <C as DocumentClient>::delete(*self, ctx, collection, id).await
    }
}

#[async_trait]
pub trait DynDocumentClient: Send + Sync + Debug {
    async fn run_query(
        &self,
        ctx: &Context,
        collection: &str,
        query: &Query,
    ) -> ClientResult<Vec<RawDocument>>;
    async fn insert(
        &self,
        ctx: &Context,
        collection: &str,
        id: Uuid,
        fields: Document,
    ) -> ClientResult<()>;
    async fn get(
        &self,
        ctx: &Context,
        collection: &str,
        id: Uuid,
    ) -> ClientResult<Option<RawDocument>>;
    async fn set_merge(
        &self,
        ctx: &Context,
        collection: &str,
        id: Uuid,
        fields: Document,
    ) -> ClientResult<()>;
    async fn delete(&self, ctx: &Context, collection: &str, id: Uuid) -> ClientResult<()>;
    async fn shutdown_boxed(self: Box<Self>) -> DocumentStoreResult<()>;

    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

#[async_trait]
impl<C: DocumentClient + 'static> DynDocumentClient for C {
    async fn run_query(
        &self,
        ctx: &Context,
        collection: &str,
        query: &Query,
    ) -> ClientResult<Vec<RawDocument>> {
        DocumentClient::run_query(self, ctx, collection, query).await
    }

    async fn insert(
        &self,
        ctx: &Context,
        collection: &str,
        id: Uuid,
        fields: Document,
    ) -> ClientResult<()> {
        DocumentClient::insert(self, ctx, collection, id, fields).await
    }

    async fn get(
        &self,
        ctx: &Context,
        collection: &str,
        id: Uuid,
    ) -> ClientResult<Option<RawDocument>> {
        DocumentClient::get(self, ctx, collection, id).await
    }

    async fn set_merge(
        &self,
        ctx: &Context,
        collection: &str,
        id: Uuid,
        fields: Document,
    ) -> ClientResult<()> {
        DocumentClient::set_merge(self, ctx, collection, id, fields).await
    }

    async fn delete(&self, ctx: &Context, collection: &str, id: Uuid) -> ClientResult<()> {
        DocumentClient::delete(self, ctx, collection, id).await
    }

    async fn shutdown_boxed(self: Box<Self>) -> DocumentStoreResult<()> {
        DocumentClient::shutdown(*self).await
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

#[async_trait]
impl DocumentClient for Box<dyn DynDocumentClient> {
    async fn run_query(
        &self,
        ctx: &Context,
        collection: &str,
        query: &Query,
    ) -> ClientResult<Vec<RawDocument>> {
        DynDocumentClient::run_query(&**self, ctx, collection, query)
            .await
    }

    async fn insert(
        &self,
        ctx: &Context,
        collection: &str,
        id: Uuid,
        fields: Document,
    ) -> ClientResult<()> {
        DynDocumentClient::insert(&**self, ctx, collection, id, fields)
            .await
    }

    async fn get(
        &self,
        ctx: &Context,
        collection: &str,
        id: Uuid,
    ) -> ClientResult<Option<RawDocument>> {
        DynDocumentClient::get(&**self, ctx, collection, id).await
    }

    async fn set_merge(
        &self,
        ctx: &Context,
        collection: &str,
        id: Uuid,
        fields: Document,
    ) -> ClientResult<()> {
        DynDocumentClient::set_merge(&**self, ctx, collection, id, fields)
            .await
    }

    async fn delete(&self, ctx: &Context, collection: &str, id: Uuid) -> ClientResult<()> {
        DynDocumentClient::delete(&**self, ctx, collection, id).await
    }

    async fn shutdown(self) -> DocumentStoreResult<()> {
        DynDocumentClient::shutdown_boxed(self).await
    }
}

/// Builds a connected client, typically from [`Credentials`](crate::credentials::Credentials).
#[async_trait]
pub trait ClientBuilder {
    type Client: DocumentClient;

    /// Connects and returns the client.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Initialization`](crate::error::DocumentStoreError::Initialization)
    /// when the client cannot be set up.
    async fn build(self) -> DocumentStoreResult<Self::Client>;
}
