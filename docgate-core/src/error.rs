//! Error types and result types for document store operations.
//!
//! Two layers of errors live here. [`ClientError`] is what a
//! [`DocumentClient`](crate::client::DocumentClient) reports about a single
//! round trip. [`DocumentStoreError`] is what the
//! [`DocumentStore`](crate::store::DocumentStore) facade hands back to callers,
//! after translating client failures into a small, closed taxonomy.

use std::convert::Infallible;

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Failures reported by a document database client for a single call.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The service could not be reached or returned a server-side error.
    #[error("Transport error: {0}")]
    Transport(String),
    /// The query was rejected before or during execution (bad operator, bad operand).
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
    /// The caller's deadline passed before the call completed.
    #[error("Deadline exceeded")]
    DeadlineExceeded,
    /// The caller cancelled the call.
    #[error("Operation cancelled")]
    Cancelled,
    /// The addressed document does not exist. Carries the document path.
    #[error("Document {0} not found")]
    NotFound(String),
    /// A document with the same path already exists. Carries the document path.
    #[error("Document {0} already exists")]
    AlreadyExists(String),
    /// The client could not encode or decode a document.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// A specialized `Result` type for client round trips.
pub type ClientResult<T> = Result<T, ClientError>;

impl From<Infallible> for ClientError {
    fn from(err: Infallible) -> Self {
        match err {}
    }
}

impl From<BsonError> for ClientError {
    fn from(err: BsonError) -> Self {
        ClientError::Serialization(err.to_string())
    }
}

/// Represents all possible errors returned by the document store facade.
///
/// Every failure builds a fresh value with the collection or document it
/// concerns, so callers can branch on the kind and still log the detail.
#[derive(Error, Debug)]
pub enum DocumentStoreError {
    /// The client handle could not be built from the supplied credentials.
    #[error("Initialization error: {0}")]
    Initialization(String),
    /// The query itself failed. This is never used for an empty result.
    #[error("Error getting documents from collection {collection}")]
    DocumentsNotRetrievable {
        collection: String,
        #[source]
        source: ClientError,
    },
    /// The query succeeded but matched no documents.
    #[error("No document found in collection {collection}")]
    NotFound { collection: String },
    /// An insert, update or delete failed. `context` names the operation and its target.
    #[error("{context}: {source}")]
    Operation {
        context: String,
        #[source]
        source: ClientError,
    },
    /// A payload or snapshot could not be converted locally.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// A specialized `Result` type for document store operations.
pub type DocumentStoreResult<T> = Result<T, DocumentStoreError>;

impl DocumentStoreError {
    /// Returns `true` when a query succeeded but matched nothing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DocumentStoreError::NotFound { .. })
    }

    /// Returns `true` when the query call itself failed.
    pub fn is_not_retrievable(&self) -> bool {
        matches!(self, DocumentStoreError::DocumentsNotRetrievable { .. })
    }

    pub(crate) fn not_retrievable(collection: &str, source: ClientError) -> Self {
        DocumentStoreError::DocumentsNotRetrievable {
            collection: collection.to_string(),
            source,
        }
    }

    pub(crate) fn not_found(collection: &str) -> Self {
        DocumentStoreError::NotFound {
            collection: collection.to_string(),
        }
    }

    pub(crate) fn operation(context: impl Into<String>, source: ClientError) -> Self {
        DocumentStoreError::Operation {
            context: context.into(),
            source,
        }
    }
}

impl From<BsonError> for DocumentStoreError {
    fn from(err: BsonError) -> Self {
        DocumentStoreError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for DocumentStoreError {
    fn from(err: SerdeJsonError) -> Self {
        DocumentStoreError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn operation_error_keeps_cause() {
        let err = DocumentStoreError::operation(
            "deleting document users/42",
            ClientError::Transport("connection reset".into()),
        );

        assert_eq!(
            err.to_string(),
            "deleting document users/42: Transport error: connection reset"
        );
        assert!(err.source().is_some());
        assert!(!err.is_not_found());
    }

    #[test]
    fn kinds_are_distinguishable() {
        let missing = DocumentStoreError::not_found("users");
        let failed = DocumentStoreError::not_retrievable("users", ClientError::DeadlineExceeded);

        assert!(missing.is_not_found());
        assert!(!missing.is_not_retrievable());
        assert!(failed.is_not_retrievable());
        assert!(!failed.is_not_found());
    }
}
