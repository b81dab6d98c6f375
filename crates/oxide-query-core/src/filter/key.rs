//! Parsing of `table.column[__operator]` filter keys.

use crate::error::{QueryError, Result};

/// A parsed filter key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterKey<'a> {
    /// Table, type or alias reference.
    pub table: &'a str,
    /// Column name.
    pub column: &'a str,
    /// Operator suffix; `None` means equality.
    pub operator: Option<&'a str>,
}

impl<'a> FilterKey<'a> {
    /// Parses a key. The operator is whatever follows the last `__`; the rest
    /// must be exactly `table.column`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::MalformedFilterKey`] when the path does not have
    /// exactly two non-empty dot-separated parts.
    pub fn parse(key: &'a str) -> Result<Self> {
        let (path, operator) = match key.rsplit_once("__") {
            Some((path, operator)) => (path, Some(operator)),
            None => (key, None),
        };
        let mut parts = path.split('.');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(table), Some(column), None) if !table.is_empty() && !column.is_empty() => {
                Ok(Self {
                    table,
                    column,
                    operator,
                })
            }
            _ => Err(QueryError::MalformedFilterKey(String::from(key))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_key_means_equality() {
        let key = FilterKey::parse("user.name").unwrap();
        assert_eq!(key.table, "user");
        assert_eq!(key.column, "name");
        assert_eq!(key.operator, None);
    }

    #[test]
    fn test_operator_suffix() {
        let key = FilterKey::parse("post.title__icontains").unwrap();
        assert_eq!(key.column, "title");
        assert_eq!(key.operator, Some("icontains"));
    }

    #[test]
    fn test_splits_on_last_double_underscore() {
        let key = FilterKey::parse("user.first__name__eq").unwrap();
        assert_eq!(key.column, "first__name");
        assert_eq!(key.operator, Some("eq"));

        let key = FilterKey::parse("user.first__name").unwrap();
        assert_eq!(key.column, "first");
        assert_eq!(key.operator, Some("name"));
    }

    #[test]
    fn test_malformed_keys() {
        for key in ["age", "a.b.c", "a.b.c__gt", ".name", "user.", "age__gt"] {
            assert!(
                matches!(FilterKey::parse(key), Err(QueryError::MalformedFilterKey(_))),
                "{key} should be rejected"
            );
        }
    }
}
