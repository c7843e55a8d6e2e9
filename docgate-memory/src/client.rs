//! In-memory client implementation.
//!
//! This module provides a [`DocumentClient`] that keeps documents as BSON in
//! ordered maps behind an async-aware read-write lock. It behaves like a
//! managed document database for the operations the facade uses, and can be
//! told to fail so callers can exercise their error paths.

use std::{
    collections::{BTreeMap, HashMap},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering as AtomicOrdering},
    },
};
use async_trait::async_trait;
use mea::rwlock::RwLock;
use bson::{Document, Uuid};
use tracing::trace;

use docgate_core::{
    client::{ClientBuilder, DocumentClient},
    context::Context,
    document::{RawDocument, check_payload},
    error::{ClientError, ClientResult, DocumentStoreResult},
    query::{Direction, Query},
};

use crate::evaluator::{Comparable, DocumentEvaluator, lookup};

#[derive(Debug, Clone)]
struct StoredDocument {
    id: Uuid,
    fields: Document,
}

/// Documents of one collection, keyed and therefore ordered by id.
type CollectionMap = BTreeMap<String, StoredDocument>;
type StoreMap = HashMap<String, CollectionMap>;


/// Thread-safe in-memory document database client.
///
/// `MemoryClient` is cloneable and uses `Arc`-wrapped internal state, so clones
/// share the same documents. Queries scan the whole collection; results come
/// back in document id order unless the query asks for an ordering, in which
/// case ties keep id order.
///
/// # Failure injection
///
/// [`MemoryClient::fail_reads`] and [`MemoryClient::fail_writes`] make the
/// client report [`ClientError::Transport`] until switched off again.
///
/// # Example
///
/// ```ignore
/// use docgate::{prelude::*, memory::MemoryClient};
///
/// let client = MemoryClient::new();
/// let store = DocumentStore::new(client.clone());
///
/// client.fail_reads(true);
/// let err = store.get_all(&Context::new(), "users").await.unwrap_err();
/// assert!(err.is_not_retrievable());
/// ```
#[derive(Default, Clone, Debug)]
pub struct MemoryClient {
    /// collection_name -> (document_id -> document)
    store: Arc<RwLock<StoreMap>>,
    failing_reads: Arc<AtomicBool>,
    failing_writes: Arc<AtomicBool>,
}

impl MemoryClient {
    /// Creates a new empty client.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> MemoryClientBuilder {
        MemoryClientBuilder::default()
    }

    /// Makes queries and reads fail with a transport error while `failing` is set.
    pub fn fail_reads(&self, failing: bool) {
        self.failing_reads.store(failing, AtomicOrdering::SeqCst);
    }

    /// Makes inserts, updates and deletes fail with a transport error while `failing` is set.
    pub fn fail_writes(&self, failing: bool) {
        self.failing_writes.store(failing, AtomicOrdering::SeqCst);
    }

    /// Returns the number of documents held in a collection.
    pub async fn len(&self, collection: &str) -> usize {
        self.store
            .read()
            .await
            .get(collection)
            .map_or(0, BTreeMap::len)
    }

    fn check_read(&self, ctx: &Context) -> ClientResult<()> {
        ctx.check()?;
        if self.failing_reads.load(AtomicOrdering::SeqCst) {
            return Err(ClientError::Transport("simulated read failure".into()));
        }

        Ok(())
    }

    fn check_write(&self, ctx: &Context) -> ClientResult<()> {
        ctx.check()?;
        if self.failing_writes.load(AtomicOrdering::SeqCst) {
            return Err(ClientError::Transport("simulated write failure".into()));
        }

        Ok(())
    }
}


#[async_trait]
impl DocumentClient for MemoryClient {
    async fn run_query(&self, ctx: &Context, collection: &str, query: &Query) -> ClientResult<Vec<RawDocument>> {
        self.check_read(ctx)?;
        query.validate()?;

        let store = self.store.read().await;
        let collection_map = match store.get(collection) {
            Some(col) => col,
            None => return Ok(vec![]),
        };

        let mut matched = Vec::new();
        for document in collection_map.values() {
            if DocumentEvaluator::new(&document.fields).matches(&query.predicates)? {
                matched.push(document);
            }
        }

        if let Some(order) = &query.order {
            // Ordering by a field implies the field exists.
            matched.retain(|document| lookup(&document.fields, &order.field).is_some());

            matched.sort_by(|a, b| {
                let left = lookup(&a.fields, &order.field)
                    .map(Comparable::from)
                    .unwrap_or(Comparable::Null);
                let right = lookup(&b.fields, &order.field)
                    .map(Comparable::from)
                    .unwrap_or(Comparable::Null);

                match order.direction {
                    Direction::Ascending => left.total_cmp(&right),
                    Direction::Descending => right.total_cmp(&left),
                }
            });
        }

        trace!(collection, matched = matched.len(), "in-memory query evaluated");

        Ok(
            matched
                .into_iter()
                .take(query.limit.unwrap_or(usize::MAX))
                .map(|document| RawDocument::new(document.id, document.fields.clone()))
                .collect()
        )
    }

    async fn insert(&self, ctx: &Context, collection: &str, id: Uuid, fields: Document) -> ClientResult<()> {
        self.check_write(ctx)?;
        check_payload(&fields)?;

        let mut store = self.store.write().await;
        let collection_map = store
            .entry(collection.to_string())
            .or_default();

        let key = id.to_string();
        if collection_map.contains_key(&key) {
            return Err(ClientError::AlreadyExists(format!("{collection}/{key}")));
        }

        collection_map.insert(key, StoredDocument { id, fields });

        Ok(())
    }

    async fn get(&self, ctx: &Context, collection: &str, id: Uuid) -> ClientResult<Option<RawDocument>> {
        self.check_read(ctx)?;

        Ok(
            self.store
                .read()
                .await
                .get(collection)
                .and_then(|collection_map| collection_map.get(&id.to_string()))
                .map(|document| RawDocument::new(document.id, document.fields.clone()))
        )
    }

    async fn set_merge(&self, ctx: &Context, collection: &str, id: Uuid, fields: Document) -> ClientResult<()> {
        self.check_write(ctx)?;
        check_payload(&fields)?;

        let mut store = self.store.write().await;
        let document = store
            .entry(collection.to_string())
            .or_default()
            .entry(id.to_string())
            .or_insert_with(|| StoredDocument { id, fields: Document::new() });

        for (field, value) in fields {
            document.fields.insert(field, value);
        }

        Ok(())
    }

    async fn delete(&self, ctx: &Context, collection: &str, id: Uuid) -> ClientResult<()> {
        self.check_write(ctx)?;

        if let Some(collection_map) = self.store.write().await.get_mut(collection) {
            collection_map.remove(&id.to_string());
        }

        Ok(())
    }
}


/// Builder for constructing [`MemoryClient`] instances.
///
/// Exists so the in-memory client can stand in wherever a
/// [`ClientBuilder`] is expected, such as `DocumentStore::connect`.
#[derive(Default)]
pub struct MemoryClientBuilder;

#[async_trait]
impl ClientBuilder for MemoryClientBuilder {
    type Client = MemoryClient;

    /// This always succeeds and returns a freshly initialized client.
    async fn build(self) -> DocumentStoreResult<Self::Client> {
        Ok(MemoryClient::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use docgate_core::query::{FieldOp, Predicate};
    use std::time::{Duration, Instant};

    async fn seeded() -> MemoryClient {
        let client = MemoryClient::new();
        let ctx = Context::new();

        for (name, age) in [("a", 30), ("b", 25), ("c", 41)] {
            client
                .insert(&ctx, "users", Uuid::new(), doc! { "name": name, "age": age })
                .await
                .unwrap();
        }
        client
            .insert(&ctx, "users", Uuid::new(), doc! { "name": "d" })
            .await
            .unwrap();

        client
    }

    fn names(documents: &[RawDocument]) -> Vec<&str> {
        documents
            .iter()
            .map(|document| document.fields.get_str("name").unwrap())
            .collect()
    }

    #[tokio::test]
    async fn unknown_collection_is_empty() {
        let client = MemoryClient::new();

        let documents = client
            .run_query(&Context::new(), "missing", &Query::new())
            .await
            .unwrap();

        assert!(documents.is_empty());
    }

    #[tokio::test]
    async fn ordering_sorts_and_drops_documents_without_the_field() {
        let client = seeded().await;
        let query = Query::builder()
            .order_by("age", Direction::Descending)
            .build();

        let documents = client.run_query(&Context::new(), "users", &query).await.unwrap();

        assert_eq!(names(&documents), vec!["c", "a", "b"]);
    }

    #[tokio::test]
    async fn limit_applies_after_ordering() {
        let client = seeded().await;
        let query = Query::builder()
            .filter(Predicate::new("age", FieldOp::Gt, 0))
            .order_by("age", Direction::Ascending)
            .limit(1)
            .build();

        let documents = client.run_query(&Context::new(), "users", &query).await.unwrap();

        assert_eq!(names(&documents), vec!["b"]);
    }

    #[tokio::test]
    async fn malformed_predicate_fails_even_on_empty_collection() {
        let client = MemoryClient::new();
        let query = Query::builder()
            .filter(Predicate::new("age", FieldOp::In, 3))
            .build();

        let result = client.run_query(&Context::new(), "users", &query).await;

        assert!(matches!(result, Err(ClientError::InvalidQuery(_))));
    }

    #[tokio::test]
    async fn set_merge_keeps_untouched_fields() {
        let client = MemoryClient::new();
        let ctx = Context::new();
        let id = Uuid::new();

        client.insert(&ctx, "users", id, doc! { "name": "a", "age": 30 }).await.unwrap();
        client.set_merge(&ctx, "users", id, doc! { "age": 31, "city": "Porto" }).await.unwrap();

        let document = client.get(&ctx, "users", id).await.unwrap().unwrap();
        assert_eq!(document.fields, doc! { "name": "a", "age": 31, "city": "Porto" });
    }

    #[tokio::test]
    async fn duplicate_insert_is_rejected() {
        let client = MemoryClient::new();
        let ctx = Context::new();
        let id = Uuid::new();

        client.insert(&ctx, "users", id, doc! { "name": "a" }).await.unwrap();
        let result = client.insert(&ctx, "users", id, doc! { "name": "b" }).await;

        assert!(matches!(result, Err(ClientError::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn payload_with_id_field_is_refused() {
        let client = MemoryClient::new();
        let ctx = Context::new();
        let id = Uuid::new();

        assert!(matches!(
            client.insert(&ctx, "users", id, doc! { "_id": "x", "name": "a" }).await,
            Err(ClientError::Serialization(_))
        ));
        assert_eq!(client.len("users").await, 0);

        client.insert(&ctx, "users", id, doc! { "name": "a" }).await.unwrap();
        assert!(matches!(
            client.set_merge(&ctx, "users", id, doc! { "_id": "x" }).await,
            Err(ClientError::Serialization(_))
        ));
        assert_eq!(
            client.get(&ctx, "users", id).await.unwrap().unwrap().fields,
            doc! { "name": "a" }
        );
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let client = seeded().await;
        let ctx = Context::new();
        let id = client.run_query(&ctx, "users", &Query::new()).await.unwrap()[0].id;

        client.delete(&ctx, "users", id).await.unwrap();
        client.delete(&ctx, "users", id).await.unwrap();

        assert_eq!(client.len("users").await, 3);
        assert!(client.get(&ctx, "users", id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn injected_failures_surface_as_transport_errors() {
        let client = seeded().await;
        let ctx = Context::new();

        client.fail_reads(true);
        assert!(matches!(
            client.run_query(&ctx, "users", &Query::new()).await,
            Err(ClientError::Transport(_))
        ));

        client.fail_reads(false);
        client.fail_writes(true);
        assert!(matches!(
            client.delete(&ctx, "users", Uuid::new()).await,
            Err(ClientError::Transport(_))
        ));
        assert!(client.run_query(&ctx, "users", &Query::new()).await.is_ok());
    }

    #[tokio::test]
    async fn expired_context_is_refused() {
        let client = seeded().await;
        let ctx = Context::with_deadline(Instant::now() - Duration::from_millis(1));

        assert!(matches!(
            client.run_query(&ctx, "users", &Query::new()).await,
            Err(ClientError::DeadlineExceeded)
        ));
        assert_eq!(client.len("users").await, 4);
    }
}
