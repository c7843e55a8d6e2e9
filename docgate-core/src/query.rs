//! Query construction for collection-scoped document reads.
//!
//! A [`Query`] is a conjunction of field [`Predicate`]s, an optional [`Order`]
//! and an optional limit. That covers every shape the
//! [`DocumentStore`](crate::store::DocumentStore) issues, from "find one by
//! field" to "get all by order".
//!
//! # Query Building
//!
//! ```ignore
//! use docgate::query::{Query, Predicate, FieldOp, Direction};
//!
//! let query = Query::builder()
//!     .filter(Predicate::new("age", FieldOp::Gt, 0))
//!     .order_by("age", Direction::Ascending)
//!     .limit(10)
//!     .build();
//! ```
//!
//! # Operators
//!
//! [`FieldOp`] parses the operator spelling managed document databases use on
//! the wire (`==`, `!=`, `<`, `<=`, `>`, `>=`, `array-contains`,
//! `array-contains-any`, `in`, `not-in`), so call sites can pass either the
//! enum or its string form.

use std::{fmt, str::FromStr};

use bson::Bson;

use crate::{
    error::{ClientError, ClientResult},
    value::FieldValue,
};

/// Sort direction for ordered queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Ascending order (A to Z, 0 to 9, earliest to latest).
    #[default]
    Ascending,
    /// Descending order (Z to A, 9 to 0, latest to earliest).
    Descending,
}

/// Field comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOp {
    /// Equal to (exact match).
    Eq,
    /// Not equal to. Documents without the field never match.
    Ne,
    /// Less than.
    Lt,
    /// Less than or equal to.
    Lte,
    /// Greater than.
    Gt,
    /// Greater than or equal to.
    Gte,
    /// Array field contains the value.
    ArrayContains,
    /// Array field contains at least one of the listed values.
    ArrayContainsAny,
    /// Field equals one of the listed values.
    In,
    /// Field exists and equals none of the listed values.
    NotIn,
}

impl FieldOp {
    /// Returns the wire spelling of the operator.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldOp::Eq => "==",
            FieldOp::Ne => "!=",
            FieldOp::Lt => "<",
            FieldOp::Lte => "<=",
            FieldOp::Gt => ">",
            FieldOp::Gte => ">=",
            FieldOp::ArrayContains => "array-contains",
            FieldOp::ArrayContainsAny => "array-contains-any",
            FieldOp::In => "in",
            FieldOp::NotIn => "not-in",
        }
    }

    /// Returns `true` for operators whose operand must be a list.
    pub fn takes_list(&self) -> bool {
        matches!(self, FieldOp::ArrayContainsAny | FieldOp::In | FieldOp::NotIn)
    }
}

impl fmt::Display for FieldOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldOp {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "==" => Ok(FieldOp::Eq),
            "!=" => Ok(FieldOp::Ne),
            "<" => Ok(FieldOp::Lt),
            "<=" => Ok(FieldOp::Lte),
            ">" => Ok(FieldOp::Gt),
            ">=" => Ok(FieldOp::Gte),
            "array-contains" => Ok(FieldOp::ArrayContains),
            "array-contains-any" => Ok(FieldOp::ArrayContainsAny),
            "in" => Ok(FieldOp::In),
            "not-in" => Ok(FieldOp::NotIn),
            _ => Err(ClientError::InvalidQuery(format!("unsupported operator {s:?}"))),
        }
    }
}

impl TryFrom<&str> for FieldOp {
    type Error = ClientError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A single `(field, operator, value)` filter condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    /// The field name to compare. Dotted paths address nested fields.
    pub field: String,
    /// The comparison operator.
    pub op: FieldOp,
    /// The value to compare against.
    pub value: Bson,
}

impl Predicate {
    /// Creates a predicate from an already typed operator.
    pub fn new(field: impl Into<String>, op: FieldOp, value: impl Into<FieldValue>) -> Self {
        Self {
            field: field.into(),
            op,
            value: Bson::from(value.into()),
        }
    }

    /// Creates a predicate from anything convertible to a [`FieldOp`], such as its
    /// wire spelling.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidQuery`] for an unknown operator or an
    /// operand the operator cannot take.
    pub fn parse<O, V>(field: impl Into<String>, op: O, value: V) -> ClientResult<Self>
    where
        O: TryInto<FieldOp>,
        ClientError: From<O::Error>,
        V: Into<FieldValue>,
    {
        let predicate = Self::new(field, op.try_into()?, value);
        predicate.validate()?;

        Ok(predicate)
    }

    /// Checks that the operand has the shape the operator needs.
    pub fn validate(&self) -> ClientResult<()> {
        if self.field.is_empty() {
            return Err(ClientError::InvalidQuery("field name must not be empty".into()));
        }
        if self.op.takes_list() && !matches!(self.value, Bson::Array(_)) {
            return Err(ClientError::InvalidQuery(format!(
                "operator {} on field {} requires a list operand",
                self.op, self.field
            )));
        }

        Ok(())
    }
}

/// Ordering specification for query results.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    /// The field to order by. Documents lacking it are left out of ordered results.
    pub field: String,
    pub direction: Direction,
}

/// A collection-scoped query.
///
/// Use [`QueryBuilder`] for ergonomic construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    /// Conditions that must all hold. Empty means every document.
    pub predicates: Vec<Predicate>,
    /// Optional result ordering.
    pub order: Option<Order>,
    /// Maximum number of documents to return.
    pub limit: Option<usize>,
}

impl Query {
    /// Creates a query matching every document.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> QueryBuilder {
        QueryBuilder::new()
    }

    /// Validates every predicate of the query.
    pub fn validate(&self) -> ClientResult<()> {
        if let Some(order) = &self.order {
            if order.field.is_empty() {
                return Err(ClientError::InvalidQuery("order field must not be empty".into()));
            }
        }

        self.predicates
            .iter()
            .try_for_each(Predicate::validate)
    }
}

#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    query: Query,
}

impl QueryBuilder {
    pub fn new() -> Self {
        QueryBuilder { query: Query::default() }
    }

    /// Adds a predicate. Predicates are combined with logical AND.
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.query.predicates.push(predicate);
        self
    }

    /// Sets the ordering of the results.
    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.query.order = Some(Order { field: field.into(), direction });
        self
    }

    /// Sets the maximum number of documents to return.
    pub fn limit(mut self, limit: usize) -> Self {
        self.query.limit = Some(limit);
        self
    }

    pub fn build(self) -> Query {
        self.query
    }
}

/// Walks the filter of a query, letting backends evaluate or translate it.
pub trait QueryVisitor {
    type Output;
    type Error: Into<ClientError>;

    fn visit_and(&mut self, predicates: &[Predicate]) -> Result<Self::Output, Self::Error>;
    fn visit_field(
        &mut self,
        field: &str,
        op: &FieldOp,
        value: &Bson,
    ) -> Result<Self::Output, Self::Error>;

    fn visit_predicate(&mut self, predicate: &Predicate) -> Result<Self::Output, Self::Error> {
        self.visit_field(&predicate.field, &predicate.op, &predicate.value)
    }

    /// Visits a conjunction, collapsing the single-predicate case.
    fn visit_filter(&mut self, predicates: &[Predicate]) -> Result<Self::Output, Self::Error> {
        match predicates {
            [predicate] => self.visit_predicate(predicate),
            _ => self.visit_and(predicates),
        }
    }
}
