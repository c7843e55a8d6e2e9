//! Predicate evaluation and ordering for in-memory queries.
//!
//! This module provides the evaluation engine for query predicates,
//! enabling filtering and ordering of BSON documents.

use std::{cmp::Ordering, collections::HashMap};
use bson::{Bson, Document, datetime::DateTime};

use docgate_core::{
    error::ClientError,
    query::{FieldOp, Predicate, QueryVisitor},
};


/// Type-erased, comparable representation of BSON values.
///
/// Integers keep their exact 64-bit value. An integer only widens to f64 when
/// it meets a double, so the two still compare numerically.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    Null,
    Bool(bool),
    Int(i64),
    Number(f64),
    DateTime(DateTime),
    String(&'a str),
    Array(Vec<Comparable<'a>>),
    Map(HashMap<&'a str, Comparable<'a>>),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Int(i64::from(*value)),
            Bson::Int64(value) => Comparable::Int(*value),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::Array(arr) => Comparable::Array(
                arr
                    .iter()
                    .map(Comparable::from)
                    .collect::<Vec<_>>()
            ),
            Bson::Document(doc) => Comparable::Map(
                doc
                    .iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect::<HashMap<_, _>>()
            ),
            _ => Comparable::Null, // Other types are not comparable
        }
    }
}

impl<'a> Comparable<'a> {
    /// Position of the value's type in the cross-type ordering.
    fn type_rank(&self) -> u8 {
        match self {
            Comparable::Null => 0,
            Comparable::Bool(_) => 1,
            Comparable::Int(_) | Comparable::Number(_) => 2,
            Comparable::DateTime(_) => 3,
            Comparable::String(_) => 4,
            Comparable::Array(_) => 5,
            Comparable::Map(_) => 6,
        }
    }

    /// Total order used for sorting: values of different types order by type,
    /// values of the same type by value.
    pub(crate) fn total_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Comparable::Int(a), Comparable::Int(b)) => a.cmp(b),
            (Comparable::Int(a), Comparable::Number(b)) => (*a as f64).total_cmp(b),
            (Comparable::Number(a), Comparable::Int(b)) => a.total_cmp(&(*b as f64)),
            (Comparable::Number(a), Comparable::Number(b)) => a.total_cmp(b),
            (Comparable::Array(a), Comparable::Array(b)) => a
                .iter()
                .zip(b.iter())
                .map(|(left, right)| left.total_cmp(right))
                .find(|ordering| ordering.is_ne())
                .unwrap_or_else(|| a.len().cmp(&b.len())),
            _ => self
                .partial_cmp(other)
                .unwrap_or_else(|| self.type_rank().cmp(&other.type_rank())),
        }
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Int(a), Comparable::Int(b)) => a == b,
            (Comparable::Int(a), Comparable::Number(b)) => *a as f64 == *b,
            (Comparable::Number(a), Comparable::Int(b)) => *a == *b as f64,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a> PartialOrd for Comparable<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => Some(Ordering::Equal),
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Int(a), Comparable::Int(b)) => a.partial_cmp(b),
            (Comparable::Int(a), Comparable::Number(b)) => (*a as f64).partial_cmp(b),
            (Comparable::Number(a), Comparable::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

/// Resolves a possibly dotted field path inside a document.
pub(crate) fn lookup<'a>(document: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut segments = path.split('.');
    let mut current = document.get(segments.next()?)?;

    for segment in segments {
        current = current.as_document()?.get(segment)?;
    }

    Some(current)
}


pub(crate) struct DocumentEvaluator<'a> {
    document: &'a Document,
}

impl<'a> DocumentEvaluator<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self { document }
    }

    /// Returns whether the document satisfies every predicate.
    pub fn matches(&mut self, predicates: &[Predicate]) -> Result<bool, ClientError> {
        self.visit_filter(predicates)
    }
}

impl<'a> QueryVisitor for DocumentEvaluator<'a> {
    type Output = bool;
    type Error = ClientError;

    fn visit_and(&mut self, predicates: &[Predicate]) -> Result<Self::Output, Self::Error> {
        for predicate in predicates {
            if !self.visit_predicate(predicate)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn visit_field(&mut self, field: &str, op: &FieldOp, value: &Bson) -> Result<Self::Output, Self::Error> {
        // A missing field never matches, not even `!=` or `not-in`.
        let Some(field_value) = lookup(self.document, field) else {
            return Ok(false);
        };
        let left = Comparable::from(field_value);
        let right = Comparable::from(value);

        match op {
            FieldOp::Eq => Ok(left == right),
            FieldOp::Ne => Ok(left != right),
            FieldOp::Gt => Ok(left.partial_cmp(&right).is_some_and(Ordering::is_gt)),
            FieldOp::Gte => Ok(left.partial_cmp(&right).is_some_and(Ordering::is_ge)),
            FieldOp::Lt => Ok(left.partial_cmp(&right).is_some_and(Ordering::is_lt)),
            FieldOp::Lte => Ok(left.partial_cmp(&right).is_some_and(Ordering::is_le)),
            FieldOp::ArrayContains => match left {
                Comparable::Array(items) => Ok(items.iter().any(|item| item == &right)),
                _ => Ok(false),
            },
            FieldOp::ArrayContainsAny => match (left, right) {
                (Comparable::Array(items), Comparable::Array(values)) => Ok(
                    values
                        .iter()
                        .any(|value| items.iter().any(|item| item == value))
                ),
                (_, Comparable::Array(_)) => Ok(false),
                _ => Err(list_required(op, field)),
            },
            FieldOp::In => match right {
                Comparable::Array(values) => Ok(values.iter().any(|value| value == &left)),
                _ => Err(list_required(op, field)),
            },
            FieldOp::NotIn => match right {
                Comparable::Array(values) => Ok(!values.iter().any(|value| value == &left)),
                _ => Err(list_required(op, field)),
            },
        }
    }
}

fn list_required(op: &FieldOp, field: &str) -> ClientError {
    ClientError::InvalidQuery(format!("operator {op} on field {field} requires a list operand"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    fn user() -> Document {
        doc! {
            "name": "a",
            "age": 30_i32,
            "score": 4.5,
            "tags": ["admin", "ops"],
            "address": { "city": "Lisbon" },
        }
    }

    fn eval(predicate: Predicate) -> bool {
        DocumentEvaluator::new(&user())
            .matches(&[predicate])
            .unwrap()
    }

    #[test]
    fn comparisons_mix_integer_widths() {
        assert!(eval(Predicate::new("age", FieldOp::Eq, 30_i64)));
        assert!(eval(Predicate::new("age", FieldOp::Gt, 29.5)));
        assert!(eval(Predicate::new("age", FieldOp::Lte, 30)));
        assert!(!eval(Predicate::new("age", FieldOp::Lt, 30)));
    }

    #[test]
    fn large_integers_compare_exactly() {
        let document = doc! { "n": 9_007_199_254_740_993_i64 };
        let mut evaluator = DocumentEvaluator::new(&document);

        assert!(!evaluator.matches(&[Predicate::new("n", FieldOp::Eq, 9_007_199_254_740_992_i64)]).unwrap());
        assert!(evaluator.matches(&[Predicate::new("n", FieldOp::Eq, 9_007_199_254_740_993_i64)]).unwrap());
        assert!(evaluator.matches(&[Predicate::new("n", FieldOp::Gt, 9_007_199_254_740_992_i64)]).unwrap());
        assert!(!evaluator.matches(&[Predicate::new("n", FieldOp::Lt, 9_007_199_254_740_993_i64)]).unwrap());

        let a = Bson::Int64(i64::MAX - 1);
        let b = Bson::Int64(i64::MAX);
        assert_eq!(Comparable::from(&a).total_cmp(&Comparable::from(&b)), Ordering::Less);
    }

    #[test]
    fn incompatible_types_never_match() {
        assert!(!eval(Predicate::new("age", FieldOp::Gt, "20")));
        assert!(!eval(Predicate::new("name", FieldOp::Eq, 1)));
    }

    #[test]
    fn missing_fields_never_match() {
        assert!(!eval(Predicate::new("email", FieldOp::Ne, "x")));
        assert!(!eval(Predicate::new("email", FieldOp::NotIn, vec!["x"])));
        assert!(!eval(Predicate::new("email", FieldOp::Eq, None::<String>)));
        assert!(!eval(Predicate::new("email", FieldOp::In, vec![None::<String>])));
    }

    #[test]
    fn array_membership() {
        assert!(eval(Predicate::new("tags", FieldOp::ArrayContains, "ops")));
        assert!(!eval(Predicate::new("tags", FieldOp::ArrayContains, "dev")));
        assert!(!eval(Predicate::new("name", FieldOp::ArrayContains, "a")));
        assert!(eval(Predicate::new("tags", FieldOp::ArrayContainsAny, vec!["dev", "ops"])));
    }

    #[test]
    fn list_operators() {
        assert!(eval(Predicate::new("name", FieldOp::In, vec!["a", "b"])));
        assert!(!eval(Predicate::new("name", FieldOp::NotIn, vec!["a", "b"])));
        assert!(eval(Predicate::new("age", FieldOp::NotIn, vec![1, 2])));
    }

    #[test]
    fn dotted_paths_reach_nested_fields() {
        assert!(eval(Predicate::new("address.city", FieldOp::Eq, "Lisbon")));
        assert!(!eval(Predicate::new("address.zip", FieldOp::Eq, "1000")));
    }

    #[test]
    fn conjunction_requires_all() {
        let document = user();
        let mut evaluator = DocumentEvaluator::new(&document);

        assert!(evaluator.matches(&[
            Predicate::new("name", FieldOp::Eq, "a"),
            Predicate::new("age", FieldOp::Gte, 30),
        ]).unwrap());
        assert!(!evaluator.matches(&[
            Predicate::new("name", FieldOp::Eq, "a"),
            Predicate::new("age", FieldOp::Gt, 30),
        ]).unwrap());
    }

    #[test]
    fn total_order_ranks_types() {
        let number = Bson::Int32(5);
        let text = Bson::String("5".into());

        assert_eq!(
            Comparable::from(&number).total_cmp(&Comparable::from(&text)),
            Ordering::Less
        );
    }
}
