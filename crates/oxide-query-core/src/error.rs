//! Error types for statement building and the filter DSL.

use thiserror::Error;

/// Errors raised while building or compiling a query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// A statement was requested before a base relation was chosen.
    #[error("No table specified. Call table() before building a statement.")]
    NoBaseRelation,

    /// A `table.column` reference named no relation of the query.
    #[error("Unknown table/model '{table}'. Available: {}", available.join(", "))]
    UnknownTable {
        /// The reference that failed to resolve.
        table: String,
        /// Relations that could have been addressed, as `Name(table)`.
        available: Vec<String>,
    },

    /// The relation exists but lacks the column.
    #[error("Column '{column}' not found in '{table}'.")]
    UnknownColumn {
        /// Requested column.
        column: String,
        /// Relation it was looked up in.
        table: String,
    },

    /// A filter key was not of the form `table.column[__operator]`.
    #[error(
        "Column must be 'table.column' or 'table.column__operator', got '{0}'.\n\
         Examples: 'user.name', 'user.age__gt', 'post.title__like'"
    )]
    MalformedFilterKey(String),

    /// The operator suffix of a filter key is not supported.
    #[error("Unsupported operator: {0}")]
    UnsupportedOperator(String),

    /// A range operator did not receive exactly two bounds.
    #[error("'{operator}' requires a list of exactly 2 values, got {got}")]
    InvalidRange {
        /// Operator name.
        operator: String,
        /// Number of values supplied.
        got: usize,
    },

    /// A scalar operator received a list.
    #[error("'{operator}' expects a single value, not a list")]
    InvalidFilterValue {
        /// Operator name.
        operator: String,
    },

    /// LIMIT below 1.
    #[error("Limit must be at least 1, got {0}")]
    InvalidLimit(i64),

    /// OFFSET below 0.
    #[error("Offset must be non-negative, got {0}")]
    InvalidOffset(i64),

    /// UPDATE or DELETE without any predicate.
    #[error("{0} requires at least one where condition")]
    MissingPredicate(&'static str),

    /// INSERT or UPDATE with nothing to write.
    #[error("{0} requires a non-empty payload")]
    EmptyPayload(&'static str),

    /// Schema names are restricted to letters, digits and underscores.
    #[error("Invalid schema name '{0}': only letters, digits and underscores are allowed")]
    InvalidSchemaName(String),

    /// The operation needs a primary key the relation does not declare.
    #[error("'{0}' has no primary key")]
    MissingPrimaryKey(String),
}

/// Result type alias for query building.
pub type Result<T> = std::result::Result<T, QueryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_table_lists_relations() {
        let err = QueryError::UnknownTable {
            table: String::from("comment"),
            available: vec![String::from("User(users)"), String::from("subquery(stats)")],
        };
        assert_eq!(
            err.to_string(),
            "Unknown table/model 'comment'. Available: User(users), subquery(stats)"
        );
    }

    #[test]
    fn test_malformed_key_shows_examples() {
        let err = QueryError::MalformedFilterKey(String::from("age"));
        let message = err.to_string();
        assert!(message.starts_with("Column must be 'table.column'"));
        assert!(message.contains("got 'age'"));
        assert!(message.contains("'user.age__gt'"));
    }
}
