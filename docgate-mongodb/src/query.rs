//! Query translation from docgate predicates to MongoDB filter documents.

use bson::{Bson, Document, doc};

use docgate_core::{
    error::ClientError,
    query::{FieldOp, Order, Predicate, Query, QueryVisitor},
};


/// Translates docgate predicates into MongoDB's native BSON filter syntax.
pub(crate) struct MongoQueryTranslator;

impl MongoQueryTranslator {
    /// Builds the filter document for a whole query.
    ///
    /// An ordered query also requires the order field to exist, so documents
    /// lacking it are left out the same way a managed document database does.
    pub(crate) fn filter(query: &Query) -> Result<Document, ClientError> {
        query.validate()?;

        let filter = MongoQueryTranslator.visit_filter(&query.predicates)?;

        Ok(match &query.order {
            Some(Order { field, .. }) if filter.is_empty() => doc! {
                field.as_str(): { "$exists": true },
            },
            Some(Order { field, .. }) => doc! {
                "$and": [filter, { field.as_str(): { "$exists": true } }],
            },
            None => filter,
        })
    }
}

impl QueryVisitor for MongoQueryTranslator {
    type Output = Document;
    type Error = ClientError;

    fn visit_and(&mut self, predicates: &[Predicate]) -> Result<Self::Output, Self::Error> {
        if predicates.is_empty() {
            return Ok(doc! {});
        }

        Ok(doc! {
            "$and": predicates
                .iter()
                .map(|predicate| self.visit_predicate(predicate))
                .collect::<Result<Vec<_>, _>>()?,
        })
    }

    fn visit_field(&mut self, field: &str, op: &FieldOp, value: &Bson) -> Result<Self::Output, Self::Error> {
        // MongoDB matches a missing field against null; require the field on every operator.
        Ok(doc! {
            field: match op {
                FieldOp::Eq => doc! { "$exists": true, "$eq": value },
                FieldOp::Ne => doc! { "$exists": true, "$ne": value },
                FieldOp::Gt => doc! { "$exists": true, "$gt": value },
                FieldOp::Gte => doc! { "$exists": true, "$gte": value },
                FieldOp::Lt => doc! { "$exists": true, "$lt": value },
                FieldOp::Lte => doc! { "$exists": true, "$lte": value },
                FieldOp::ArrayContains => doc! { "$exists": true, "$elemMatch": { "$eq": value } },
                FieldOp::ArrayContainsAny => match value {
                    Bson::Array(values) => doc! { "$exists": true, "$elemMatch": { "$in": values } },
                    _ => return Err(list_required(op, field)),
                },
                FieldOp::In => match value {
                    Bson::Array(values) => doc! { "$exists": true, "$in": values },
                    _ => return Err(list_required(op, field)),
                },
                FieldOp::NotIn => match value {
                    Bson::Array(values) => doc! { "$exists": true, "$nin": values },
                    _ => return Err(list_required(op, field)),
                },
            }
        })
    }
}

fn list_required(op: &FieldOp, field: &str) -> ClientError {
    ClientError::InvalidQuery(format!("operator {op} on field {field} requires a list operand"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use docgate_core::query::Direction;

    #[test]
    fn single_predicate_is_not_wrapped() {
        let query = Query::builder()
            .filter(Predicate::new("name", FieldOp::Eq, "a"))
            .build();

        assert_eq!(
            MongoQueryTranslator::filter(&query).unwrap(),
            doc! { "name": { "$exists": true, "$eq": "a" } }
        );
    }

    #[test]
    fn two_predicates_become_a_conjunction() {
        let query = Query::builder()
            .filter(Predicate::new("name", FieldOp::Eq, "a"))
            .filter(Predicate::new("age", FieldOp::Gte, 18))
            .build();

        assert_eq!(
            MongoQueryTranslator::filter(&query).unwrap(),
            doc! { "$and": [
                { "name": { "$exists": true, "$eq": "a" } },
                { "age": { "$exists": true, "$gte": 18_i64 } },
            ] }
        );
    }

    #[test]
    fn empty_query_matches_everything() {
        assert_eq!(MongoQueryTranslator::filter(&Query::new()).unwrap(), doc! {});
    }

    #[test]
    fn ordering_requires_the_order_field() {
        let unfiltered = Query::builder()
            .order_by("age", Direction::Ascending)
            .build();
        let filtered = Query::builder()
            .filter(Predicate::new("age", FieldOp::Gt, 0))
            .order_by("age", Direction::Ascending)
            .build();

        assert_eq!(
            MongoQueryTranslator::filter(&unfiltered).unwrap(),
            doc! { "age": { "$exists": true } }
        );
        assert_eq!(
            MongoQueryTranslator::filter(&filtered).unwrap(),
            doc! { "$and": [
                { "age": { "$exists": true, "$gt": 0_i64 } },
                { "age": { "$exists": true } },
            ] }
        );
    }

    #[test]
    fn array_operators() {
        let contains = Query::builder()
            .filter(Predicate::new("tags", FieldOp::ArrayContains, "ops"))
            .build();
        let any = Query::builder()
            .filter(Predicate::new("tags", FieldOp::ArrayContainsAny, vec!["ops", "dev"]))
            .build();

        assert_eq!(
            MongoQueryTranslator::filter(&contains).unwrap(),
            doc! { "tags": { "$exists": true, "$elemMatch": { "$eq": "ops" } } }
        );
        assert_eq!(
            MongoQueryTranslator::filter(&any).unwrap(),
            doc! { "tags": { "$exists": true, "$elemMatch": { "$in": ["ops", "dev"] } } }
        );
    }

    #[test]
    fn null_operands_still_require_the_field() {
        let equal = Query::builder()
            .filter(Predicate::new("deleted_at", FieldOp::Eq, None::<i64>))
            .build();
        let listed = Query::builder()
            .filter(Predicate::new("deleted_at", FieldOp::In, vec![None, Some(1_i64)]))
            .build();
        let bounded = Query::builder()
            .filter(Predicate::new("deleted_at", FieldOp::Lte, None::<i64>))
            .build();

        assert_eq!(
            MongoQueryTranslator::filter(&equal).unwrap(),
            doc! { "deleted_at": { "$exists": true, "$eq": null } }
        );
        assert_eq!(
            MongoQueryTranslator::filter(&listed).unwrap(),
            doc! { "deleted_at": { "$exists": true, "$in": [null, 1_i64] } }
        );
        assert_eq!(
            MongoQueryTranslator::filter(&bounded).unwrap(),
            doc! { "deleted_at": { "$exists": true, "$lte": null } }
        );
    }

    #[test]
    fn list_operator_without_list_is_rejected() {
        let query = Query::builder()
            .filter(Predicate::new("age", FieldOp::NotIn, 3))
            .build();

        assert!(matches!(
            MongoQueryTranslator::filter(&query),
            Err(ClientError::InvalidQuery(_))
        ));
    }
}
