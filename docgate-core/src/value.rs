//! Comparison values accepted in query predicates.
//!
//! [`FieldValue`] is deliberately closed: it only carries the types a managed
//! document database can compare against a stored field. Anything richer
//! belongs in the document payload, not in a predicate.

use bson::Bson;
use chrono::{DateTime, Utc};

use crate::document::DocumentRef;

/// A value a document field can be compared against.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Integer(i64),
    Double(f64),
    String(String),
    Timestamp(DateTime<Utc>),
    /// Compared against fields holding the referenced document's path.
    Reference(DocumentRef),
    /// Operand list for `in`, `not-in` and `array-contains-any`.
    Array(Vec<FieldValue>),
}

impl From<FieldValue> for Bson {
    fn from(value: FieldValue) -> Self {
        match value {
            FieldValue::Null => Bson::Null,
            FieldValue::Bool(value) => Bson::Boolean(value),
            FieldValue::Integer(value) => Bson::Int64(value),
            FieldValue::Double(value) => Bson::Double(value),
            FieldValue::String(value) => Bson::String(value),
            FieldValue::Timestamp(value) => Bson::DateTime(bson::DateTime::from_chrono(value)),
            FieldValue::Reference(reference) => Bson::String(reference.path()),
            FieldValue::Array(values) => Bson::Array(
                values
                    .into_iter()
                    .map(Bson::from)
                    .collect()
            ),
        }
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Integer(value as i64)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        FieldValue::Integer(value as i64)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Double(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl From<&String> for FieldValue {
    fn from(value: &String) -> Self {
        FieldValue::String(value.clone())
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(value)
    }
}

impl From<bson::DateTime> for FieldValue {
    fn from(value: bson::DateTime) -> Self {
        FieldValue::Timestamp(value.to_chrono())
    }
}

impl From<DocumentRef> for FieldValue {
    fn from(value: DocumentRef) -> Self {
        FieldValue::Reference(value)
    }
}

impl From<&DocumentRef> for FieldValue {
    fn from(value: &DocumentRef) -> Self {
        FieldValue::Reference(value.clone())
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Null, Into::into)
    }
}

impl<T: Into<FieldValue>> From<Vec<T>> for FieldValue {
    fn from(values: Vec<T>) -> Self {
        FieldValue::Array(
            values
                .into_iter()
                .map(Into::into)
                .collect()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn scalars_convert_to_bson() {
        assert_eq!(Bson::from(FieldValue::from(30)), Bson::Int64(30));
        assert_eq!(Bson::from(FieldValue::from("a")), Bson::String("a".into()));
        assert_eq!(Bson::from(FieldValue::from(None::<i64>)), Bson::Null);
    }

    #[test]
    fn timestamps_keep_millisecond_precision() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();

        match Bson::from(FieldValue::from(at)) {
            Bson::DateTime(value) => assert_eq!(value.to_chrono(), at),
            other => panic!("unexpected value {other:?}"),
        }
    }

    #[test]
    fn lists_become_arrays() {
        let value = FieldValue::from(vec!["a", "b"]);

        assert_eq!(
            Bson::from(value),
            Bson::Array(vec![Bson::String("a".into()), Bson::String("b".into())])
        );
    }
}
