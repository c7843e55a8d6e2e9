use async_trait::async_trait;
use futures::TryStreamExt;
use bson::{Bson, Document, Uuid, doc};
use mongodb::{
    Client, Collection as MongoCollection,
    options::{ClientOptions, FindOptions},
};
use tracing::{debug, info};

use docgate_core::{
    client::{ClientBuilder, DocumentClient},
    context::Context,
    credentials::Credentials,
    document::{ID_FIELD, RawDocument, check_payload},
    error::{ClientError, ClientResult, DocumentStoreError, DocumentStoreResult},
    query::{Direction, Query},
};

use crate::query::MongoQueryTranslator;


/// [`DocumentClient`] backed by a MongoDB deployment.
///
/// Each collection name maps to a MongoDB collection of the configured
/// database, and a document id is stored as the `_id` of the record.
#[derive(Debug)]
pub struct MongoClient {
    client: Client,
    database: String,
}

impl MongoClient {
    pub fn new(client: Client, database: impl Into<String>) -> Self {
        Self {
            client,
            database: database.into(),
        }
    }

    pub fn builder(credentials: Credentials) -> MongoClientBuilder {
        MongoClientBuilder::new(credentials)
    }

    fn get_collection(&self, collection: &str) -> MongoCollection<Document> {
        self.client
            .database(&self.database)
            .collection(collection)
    }

    /// Splits a stored record into its id and the caller's fields.
    fn restore_document(mut document: Document) -> ClientResult<RawDocument> {
        let id = match document.remove(ID_FIELD) {
            Some(Bson::Binary(binary)) => binary.to_uuid()?,
            Some(other) => {
                return Err(ClientError::Serialization(format!(
                    "document id {other} is not a uuid"
                )));
            },
            None => return Err(ClientError::Serialization("document has no id".into())),
        };

        Ok(RawDocument::new(id, document))
    }
}

fn transport(error: mongodb::error::Error) -> ClientError {
    ClientError::Transport(error.to_string())
}

#[async_trait]
impl DocumentClient for MongoClient {
    async fn run_query(&self, ctx: &Context, collection: &str, query: &Query) -> ClientResult<Vec<RawDocument>> {
        let filter = MongoQueryTranslator::filter(query)?;
        let mut options = FindOptions::default();

        if let Some(limit) = query.limit {
            options.limit = Some(limit as i64);
        }
        if let Some(order) = &query.order {
            options.sort = Some(doc! {
                order.field.clone(): match order.direction {
                    Direction::Ascending => 1,
                    Direction::Descending => -1,
                },
                // Ties fall back to id order.
                "_id": 1,
            });
        }
        options.max_time = ctx.remaining();

        ctx.run(async {
            self.get_collection(collection)
                .find(filter)
                .with_options(options)
                .await
                .map_err(transport)?
                .try_collect::<Vec<Document>>()
                .await
                .map_err(transport)?
                .into_iter()
                .map(Self::restore_document)
                .collect::<ClientResult<Vec<_>>>()
        })
        .await
    }

    async fn insert(&self, ctx: &Context, collection: &str, id: Uuid, fields: Document) -> ClientResult<()> {
        check_payload(&fields)?;

        let document = Document::from_iter(
            fields
                .into_iter()
                .chain(std::iter::once((ID_FIELD.to_string(), Bson::from(id))))
        );

        ctx.run(async {
            self.get_collection(collection)
                .insert_one(document)
                .await
                .map_err(transport)?;

            Ok(())
        })
        .await
    }

    async fn get(&self, ctx: &Context, collection: &str, id: Uuid) -> ClientResult<Option<RawDocument>> {
        ctx.run(async {
            self.get_collection(collection)
                .find_one(doc! { "_id": id })
                .await
                .map_err(transport)?
                .map(Self::restore_document)
                .transpose()
        })
        .await
    }

    async fn set_merge(&self, ctx: &Context, collection: &str, id: Uuid, fields: Document) -> ClientResult<()> {
        check_payload(&fields)?;

        ctx.run(async {
            // An empty `$set` is rejected by the server; upsert an empty record instead.
            let update = if fields.is_empty() {
                doc! { "$setOnInsert": { "_id": id } }
            } else {
                doc! { "$set": fields }
            };

            self.get_collection(collection)
                .update_one(doc! { "_id": id }, update)
                .upsert(true)
                .await
                .map_err(transport)?;

            Ok(())
        })
        .await
    }

    async fn delete(&self, ctx: &Context, collection: &str, id: Uuid) -> ClientResult<()> {
        ctx.run(async {
            self.get_collection(collection)
                .delete_one(doc! { "_id": id })
                .await
                .map_err(transport)?;

            Ok(())
        })
        .await
    }

    async fn shutdown(self) -> DocumentStoreResult<()> {
        self.client.shutdown().await;
        info!(database = %self.database, "mongodb client shut down");

        Ok(())
    }
}


/// Builds a [`MongoClient`] from [`Credentials`].
///
/// Building parses the connection string, applies the optional application
/// name and connect timeout, and pings the deployment so that bad credentials
/// surface as [`DocumentStoreError::Initialization`] instead of on first use.
pub struct MongoClientBuilder {
    credentials: Credentials,
}

impl MongoClientBuilder {
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }
}

#[async_trait]
impl ClientBuilder for MongoClientBuilder {
    type Client = MongoClient;

    async fn build(self) -> DocumentStoreResult<Self::Client> {
        let Credentials { uri, database, app_name, .. } = &self.credentials;

        let mut options = ClientOptions::parse(uri)
            .await
            .map_err(|e| DocumentStoreError::Initialization(e.to_string()))?;
        if app_name.is_some() {
            options.app_name = app_name.clone();
        }
        if let Some(timeout) = self.credentials.connect_timeout() {
            options.connect_timeout = Some(timeout);
            options.server_selection_timeout = Some(timeout);
        }

        let client = Client::with_options(options)
            .map_err(|e| DocumentStoreError::Initialization(e.to_string()))?;

        client
            .database(database)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| DocumentStoreError::Initialization(e.to_string()))?;

        debug!(database = %database, "mongodb deployment reachable");

        Ok(MongoClient::new(client, database.clone()))
    }
}
