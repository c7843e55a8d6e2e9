//! Document references and snapshots.
//!
//! A [`DocumentRef`] addresses a single document for a later update or delete.
//! A [`DocumentSnapshot`] is the immutable result of a read. Both are produced
//! by the [`DocumentStore`](crate::store::DocumentStore); callers never build
//! references by hand, so every reference they hold came from a successful read.

use std::fmt;

use bson::{Bson, Document, Uuid, de::deserialize_from_bson, de::deserialize_from_document};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;

use crate::error::{ClientError, ClientResult, DocumentStoreError, DocumentStoreResult};

/// Field the database keeps the document id under.
pub const ID_FIELD: &str = "_id";

/// Rejects a payload that carries its own [`ID_FIELD`].
///
/// Clients call this before writing, so an insert or merge can never
/// replace or collide with the id the document is addressed by.
pub fn check_payload(fields: &Document) -> ClientResult<()> {
    if fields.contains_key(ID_FIELD) {
        return Err(ClientError::Serialization(format!(
            "field {ID_FIELD} is reserved for the document id"
        )));
    }

    Ok(())
}

/// Address of a document: its collection and identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentRef {
    collection: String,
    id: Uuid,
}

impl DocumentRef {
    pub(crate) fn new(collection: &str, id: Uuid) -> Self {
        Self {
            collection: collection.to_string(),
            id,
        }
    }

    /// Returns the name of the collection holding the document.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Returns the document identifier.
    pub fn id(&self) -> &Uuid {
        &self.id
    }

    /// Returns the `collection/id` path of the document.
    pub fn path(&self) -> String {
        format!("{}/{}", self.collection, self.id)
    }
}

impl fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// A document as returned by a [`DocumentClient`](crate::client::DocumentClient).
#[derive(Debug, Clone, PartialEq)]
pub struct RawDocument {
    pub id: Uuid,
    pub fields: Document,
    pub read_time: DateTime<Utc>,
}

impl RawDocument {
    pub fn new(id: Uuid, fields: Document) -> Self {
        Self {
            id,
            fields,
            read_time: Utc::now(),
        }
    }
}

/// Immutable, point-in-time view of a document.
///
/// # Example
///
/// ```ignore
/// let snapshot = store.find_one_by_field(&ctx, "users", "name", "==", "a").await?;
/// let age: i64 = snapshot.get("age")?;
/// let user: User = snapshot.data_to()?;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    reference: DocumentRef,
    fields: Document,
    read_time: DateTime<Utc>,
}

impl DocumentSnapshot {
    pub(crate) fn from_raw(collection: &str, raw: RawDocument) -> Self {
        Self {
            reference: DocumentRef::new(collection, raw.id),
            fields: raw.fields,
            read_time: raw.read_time,
        }
    }

    /// Returns the reference to use for a later update or delete.
    pub fn reference(&self) -> &DocumentRef {
        &self.reference
    }

    pub fn id(&self) -> &Uuid {
        self.reference.id()
    }

    /// Returns when the document was read.
    pub fn read_time(&self) -> DateTime<Utc> {
        self.read_time
    }

    /// Returns the raw fields of the document.
    pub fn data(&self) -> &Document {
        &self.fields
    }

    pub fn into_data(self) -> Document {
        self.fields
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Decodes a single field.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Serialization`] if the field is missing
    /// or does not decode as `T`.
    pub fn get<T: DeserializeOwned>(&self, field: &str) -> DocumentStoreResult<T> {
        let value: &Bson = self.fields.get(field).ok_or_else(|| {
            DocumentStoreError::Serialization(format!(
                "field {field} is missing from document {}",
                self.reference
            ))
        })?;

        Ok(deserialize_from_bson(value.clone())?)
    }

    /// Decodes the whole document into `T`.
    pub fn data_to<T: DeserializeOwned>(&self) -> DocumentStoreResult<T> {
        Ok(deserialize_from_document(self.fields.clone())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct User {
        name: String,
        age: i64,
    }

    fn snapshot() -> DocumentSnapshot {
        DocumentSnapshot::from_raw(
            "users",
            RawDocument::new(Uuid::new(), doc! { "name": "a", "age": 30_i64 }),
        )
    }

    #[test]
    fn payload_may_not_carry_an_id() {
        assert!(check_payload(&doc! { "name": "a", "nested": { "_id": 1 } }).is_ok());
        assert!(matches!(
            check_payload(&doc! { "_id": "x", "name": "a" }),
            Err(ClientError::Serialization(_))
        ));
    }

    #[test]
    fn reference_path_joins_collection_and_id() {
        let snapshot = snapshot();
        let reference = snapshot.reference();

        assert_eq!(reference.collection(), "users");
        assert_eq!(reference.path(), format!("users/{}", reference.id()));
        assert_eq!(reference.to_string(), reference.path());
    }

    #[test]
    fn fields_decode() {
        let snapshot = snapshot();

        assert_eq!(snapshot.get::<String>("name").unwrap(), "a");
        assert_eq!(
            snapshot.data_to::<User>().unwrap(),
            User { name: "a".into(), age: 30 }
        );
    }

    #[test]
    fn missing_field_is_a_serialization_error() {
        let err = snapshot().get::<String>("email").unwrap_err();

        assert!(matches!(err, DocumentStoreError::Serialization(_)));
    }
}
