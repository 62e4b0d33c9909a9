//! Equality-filtered, ordered queries over a collection.

use serde_json::Value;

use crate::document::Document;

/// Sort direction for [`OrderBy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Smallest value first.
    Ascending,
    /// Largest value first.
    Descending,
}

/// An equality condition on a top-level field.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    /// Field name.
    pub field: String,
    /// Value the field must equal.
    pub value: Value,
}

/// Ordering on a top-level field.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    /// Field name.
    pub field: String,
    /// Sort direction.
    pub direction: Direction,
}

/// A query over one collection.
///
/// Documents match when every filter holds. Backends break ordering ties by
/// insertion order, following the direction of the ordering (newest first
/// when descending).
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// Collection to search.
    pub collection: String,
    /// Equality filters, all of which must hold.
    pub filters: Vec<Filter>,
    /// Optional ordering.
    pub order_by: Option<OrderBy>,
    /// Maximum number of documents to return.
    pub limit: Option<usize>,
}

impl Query {
    /// Start a query over every document of a collection.
    pub fn collection(name: impl Into<String>) -> Self {
        Self {
            collection: name.into(),
            filters: Vec::new(),
            order_by: None,
            limit: None,
        }
    }

    /// Require `field == value`.
    pub fn where_eq(mut self, field: impl Into<String>, value: Value) -> Self {
        self.filters.push(Filter {
            field: field.into(),
            value,
        });
        self
    }

    /// Order results by `field`.
    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    /// Cap the number of results.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Check whether a document satisfies every filter of this query.
    pub fn matches(&self, document: &Document) -> bool {
        self.filters
            .iter()
            .all(|filter| document.get(&filter.field) == Some(&filter.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::to_fields;
    use serde_json::json;

    #[test]
    fn test_builder() {
        let query = Query::collection("chatMessages")
            .where_eq("userId", json!("u1"))
            .order_by("timestamp", Direction::Ascending)
            .limit(50);

        assert_eq!(query.collection, "chatMessages");
        assert_eq!(query.filters[0].field, "userId");
        assert_eq!(
            query.order_by,
            Some(OrderBy {
                field: "timestamp".to_string(),
                direction: Direction::Ascending
            })
        );
        assert_eq!(query.limit, Some(50));
    }

    #[test]
    fn test_matches() {
        let doc = Document::new("d", to_fields(&json!({ "userId": "u1", "region": "north" })).unwrap());

        assert!(Query::collection("c").matches(&doc));
        assert!(Query::collection("c").where_eq("userId", json!("u1")).matches(&doc));
        assert!(!Query::collection("c").where_eq("userId", json!("u2")).matches(&doc));
        assert!(!Query::collection("c").where_eq("missing", json!("x")).matches(&doc));
    }
}
