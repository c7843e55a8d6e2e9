//! The document store facade.
//!
//! [`DocumentStore`] wraps a single [`DocumentClient`] and offers a fixed set
//! of query and mutation shapes keyed by collection name. Client results pass
//! through unchanged. Client failures are translated into
//! [`DocumentStoreError`]:
//!
//! - a failed query becomes [`DocumentStoreError::DocumentsNotRetrievable`],
//! - a query that matched nothing becomes [`DocumentStoreError::NotFound`],
//! - a failed insert, update or delete becomes [`DocumentStoreError::Operation`].
//!
//! # Example
//!
//! ```ignore
//! use docgate::{prelude::*, memory::MemoryClient};
//!
//! let store = DocumentStore::new(MemoryClient::new());
//! let ctx = Context::new();
//!
//! let added = store.add(&ctx, "users", &doc! { "name": "a", "age": 30 }).await?;
//! let found = store.find_one_by_field(&ctx, "users", "name", "==", "a").await?;
//! store.update(&ctx, found.reference(), &doc! { "age": 31 }).await?;
//! store.delete(&ctx, added.reference()).await?;
//! ```

use bson::{Uuid, ser::serialize_to_document};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    client::{ClientBuilder, DocumentClient},
    context::Context,
    document::{DocumentRef, DocumentSnapshot},
    error::{ClientError, DocumentStoreError, DocumentStoreResult},
    query::{Direction, FieldOp, Predicate, Query},
    value::FieldValue,
};

/// A document store whose client type is chosen at runtime.
pub type DynDocumentStore = DocumentStore<Box<dyn crate::client::DynDocumentClient>>;

/// Facade over a document database client.
///
/// The store holds no mutable state, so a shared reference can serve
/// concurrent callers. Every call takes the caller's [`Context`]; the client
/// enforces its deadline and cancellation.
///
/// # Type Parameters
///
/// * `C` - The client implementation
#[derive(Debug)]
pub struct DocumentStore<C: DocumentClient> {
    client: C,
}

impl<C: DocumentClient> DocumentStore<C> {
    /// Wraps an already connected client.
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Builds a client and wraps it.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Initialization`] if the client cannot be
    /// built from the builder's credentials.
    pub async fn connect<B>(builder: B) -> DocumentStoreResult<Self>
    where
        B: ClientBuilder<Client = C>,
    {
        let client = builder.build().await?;
        info!("document store connected");

        Ok(Self::new(client))
    }

    /// Returns the underlying client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Returns the first document whose `field` satisfies `op value`.
    ///
    /// # Errors
    ///
    /// [`DocumentStoreError::NotFound`] when nothing matches,
    /// [`DocumentStoreError::DocumentsNotRetrievable`] when the query fails.
    pub async fn find_one_by_field<O, V>(
        &self,
        ctx: &Context,
        collection: &str,
        field: &str,
        op: O,
        value: V,
    ) -> DocumentStoreResult<DocumentSnapshot>
    where
        O: TryInto<FieldOp>,
        ClientError: From<O::Error>,
        V: Into<FieldValue>,
    {
        let query = Query::builder()
            .filter(predicate(collection, field, op, value)?)
            .limit(1)
            .build();

        self.fetch_one(ctx, collection, query).await
    }

    /// Returns the first document satisfying both predicates.
    #[allow(clippy::too_many_arguments)]
    pub async fn find_one_by_two_fields<O1, V1, O2, V2>(
        &self,
        ctx: &Context,
        collection: &str,
        first_field: &str,
        first_op: O1,
        first_value: V1,
        second_field: &str,
        second_op: O2,
        second_value: V2,
    ) -> DocumentStoreResult<DocumentSnapshot>
    where
        O1: TryInto<FieldOp>,
        ClientError: From<O1::Error>,
        V1: Into<FieldValue>,
        O2: TryInto<FieldOp>,
        ClientError: From<O2::Error>,
        V2: Into<FieldValue>,
    {
        let query = Query::builder()
            .filter(predicate(collection, first_field, first_op, first_value)?)
            .filter(predicate(collection, second_field, second_op, second_value)?)
            .limit(1)
            .build();

        self.fetch_one(ctx, collection, query).await
    }

    /// Returns every document whose `field` satisfies `op value`.
    pub async fn find_all_by_field<O, V>(
        &self,
        ctx: &Context,
        collection: &str,
        field: &str,
        op: O,
        value: V,
    ) -> DocumentStoreResult<Vec<DocumentSnapshot>>
    where
        O: TryInto<FieldOp>,
        ClientError: From<O::Error>,
        V: Into<FieldValue>,
    {
        let query = Query::builder()
            .filter(predicate(collection, field, op, value)?)
            .build();

        self.fetch(ctx, collection, query).await
    }

    /// Returns every matching document, ordered by `order_field`.
    ///
    /// Documents without `order_field` are not returned.
    #[allow(clippy::too_many_arguments)]
    pub async fn find_all_by_field_and_order<O, V>(
        &self,
        ctx: &Context,
        collection: &str,
        field: &str,
        op: O,
        value: V,
        order_field: &str,
        direction: Direction,
    ) -> DocumentStoreResult<Vec<DocumentSnapshot>>
    where
        O: TryInto<FieldOp>,
        ClientError: From<O::Error>,
        V: Into<FieldValue>,
    {
        let query = Query::builder()
            .filter(predicate(collection, field, op, value)?)
            .order_by(order_field, direction)
            .build();

        self.fetch(ctx, collection, query).await
    }

    /// Returns every document satisfying both predicates.
    #[allow(clippy::too_many_arguments)]
    pub async fn find_all_by_two_fields<O1, V1, O2, V2>(
        &self,
        ctx: &Context,
        collection: &str,
        first_field: &str,
        first_op: O1,
        first_value: V1,
        second_field: &str,
        second_op: O2,
        second_value: V2,
    ) -> DocumentStoreResult<Vec<DocumentSnapshot>>
    where
        O1: TryInto<FieldOp>,
        ClientError: From<O1::Error>,
        V1: Into<FieldValue>,
        O2: TryInto<FieldOp>,
        ClientError: From<O2::Error>,
        V2: Into<FieldValue>,
    {
        let query = Query::builder()
            .filter(predicate(collection, first_field, first_op, first_value)?)
            .filter(predicate(collection, second_field, second_op, second_value)?)
            .build();

        self.fetch(ctx, collection, query).await
    }

    /// Returns every document whose array field `field` contains `value`.
    pub async fn find_from_array<V>(
        &self,
        ctx: &Context,
        collection: &str,
        field: &str,
        value: V,
    ) -> DocumentStoreResult<Vec<DocumentSnapshot>>
    where
        V: Into<FieldValue>,
    {
        let query = Query::builder()
            .filter(predicate(collection, field, FieldOp::ArrayContains, value)?)
            .build();

        self.fetch(ctx, collection, query).await
    }

    /// Returns every document in the collection.
    pub async fn get_all(
        &self,
        ctx: &Context,
        collection: &str,
    ) -> DocumentStoreResult<Vec<DocumentSnapshot>> {
        self.fetch(ctx, collection, Query::new()).await
    }

    /// Returns every document in the collection, ordered by `order_field`.
    pub async fn get_all_by_order(
        &self,
        ctx: &Context,
        collection: &str,
        order_field: &str,
        direction: Direction,
    ) -> DocumentStoreResult<Vec<DocumentSnapshot>> {
        let query = Query::builder()
            .order_by(order_field, direction)
            .build();

        self.fetch(ctx, collection, query).await
    }

    /// Runs an arbitrary query with the same not-found and failure translation
    /// as the shaped finders.
    pub async fn query(
        &self,
        ctx: &Context,
        collection: &str,
        query: Query,
    ) -> DocumentStoreResult<Vec<DocumentSnapshot>> {
        self.fetch(ctx, collection, query).await
    }

    /// Inserts `data` as a new document and returns its committed snapshot.
    ///
    /// # Errors
    ///
    /// [`DocumentStoreError::Serialization`] if `data` does not encode as a
    /// document, [`DocumentStoreError::Operation`] if the insert or the
    /// follow-up read fails.
    pub async fn add<T>(
        &self,
        ctx: &Context,
        collection: &str,
        data: &T,
    ) -> DocumentStoreResult<DocumentSnapshot>
    where
        T: Serialize + ?Sized,
    {
        let fields = serialize_to_document(data)?;
        let reference = DocumentRef::new(collection, Uuid::new());

        self.client
            .insert(ctx, collection, *reference.id(), fields)
            .await
            .map_err(|source| {
                warn!(collection, error = %source, "insert failed");
                DocumentStoreError::operation(format!("adding document to {collection}"), source)
            })?;

        let raw = self
            .client
            .get(ctx, collection, *reference.id())
            .await
            .and_then(|raw| raw.ok_or_else(|| ClientError::NotFound(reference.path())))
            .map_err(|source| {
                warn!(document = %reference, error = %source, "reading inserted document failed");
                DocumentStoreError::operation(
                    format!("getting document snapshot {reference}"),
                    source,
                )
            })?;

        debug!(document = %reference, "document added");

        Ok(DocumentSnapshot::from_raw(collection, raw))
    }

    /// Merges `data` into the referenced document.
    ///
    /// Fields present in `data` are overwritten; all others keep their values.
    pub async fn update<T>(
        &self,
        ctx: &Context,
        reference: &DocumentRef,
        data: &T,
    ) -> DocumentStoreResult<()>
    where
        T: Serialize + ?Sized,
    {
        let fields = serialize_to_document(data)?;

        self.client
            .set_merge(ctx, reference.collection(), *reference.id(), fields)
            .await
            .map_err(|source| {
                warn!(document = %reference, error = %source, "update failed");
                DocumentStoreError::operation(format!("updating document {reference}"), source)
            })?;

        debug!(document = %reference, "document updated");

        Ok(())
    }

    /// Deletes the referenced document.
    pub async fn delete(&self, ctx: &Context, reference: &DocumentRef) -> DocumentStoreResult<()> {
        self.client
            .delete(ctx, reference.collection(), *reference.id())
            .await
            .map_err(|source| {
                warn!(document = %reference, error = %source, "delete failed");
                DocumentStoreError::operation(format!("deleting document {reference}"), source)
            })?;

        debug!(document = %reference, "document deleted");

        Ok(())
    }

    /// Shuts down the store and releases the client's connection.
    pub async fn shutdown(self) -> DocumentStoreResult<()> {
        self.client.shutdown().await?;
        info!("document store shut down");

        Ok(())
    }

    async fn fetch_one(
        &self,
        ctx: &Context,
        collection: &str,
        query: Query,
    ) -> DocumentStoreResult<DocumentSnapshot> {
        self.fetch(ctx, collection, query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DocumentStoreError::not_found(collection))
    }

    async fn fetch(
        &self,
        ctx: &Context,
        collection: &str,
        query: Query,
    ) -> DocumentStoreResult<Vec<DocumentSnapshot>> {
        let documents = self
            .client
            .run_query(ctx, collection, &query)
            .await
            .map_err(|source| {
                warn!(collection, error = %source, "query failed");
                DocumentStoreError::not_retrievable(collection, source)
            })?;

        if documents.is_empty() {
            debug!(collection, "query matched no documents");
            return Err(DocumentStoreError::not_found(collection));
        }

        debug!(collection, count = documents.len(), "query returned documents");

        Ok(documents
            .into_iter()
            .map(|raw| DocumentSnapshot::from_raw(collection, raw))
            .collect())
    }
}

impl<C: DocumentClient + 'static> DocumentStore<C> {
    /// Erases the client type, for stores chosen at runtime.
    pub fn into_dyn(self) -> DynDocumentStore {
        DocumentStore::new(Box::new(self.client))
    }
}

impl DynDocumentStore {
    /// Borrows the client as its concrete type, if it is a `C`.
    pub fn downcast_client<C: DocumentClient + 'static>(&self) -> Option<&C> {
        crate::client::DynDocumentClient::as_any(&*self.client).downcast_ref::<C>()
    }

    /// Recovers the statically typed store, if the client is a `C`.
    pub fn into_static<C: DocumentClient + 'static>(self) -> Option<DocumentStore<C>> {
        crate::client::DynDocumentClient::into_any(self.client)
            .downcast::<C>()
            .ok()
            .map(|client| DocumentStore::new(*client))
    }
}

/// Builds a predicate, reporting a malformed one as an unretrievable query.
fn predicate<O, V>(collection: &str, field: &str, op: O, value: V) -> DocumentStoreResult<Predicate>
where
    O: TryInto<FieldOp>,
    ClientError: From<O::Error>,
    V: Into<FieldValue>,
{
    Predicate::parse(field, op, value).map_err(|source| {
        warn!(collection, field, error = %source, "rejected predicate");
        DocumentStoreError::not_retrievable(collection, source)
    })
}
