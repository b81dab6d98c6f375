//! The mapping filter DSL: `{"table.column__op": value}` entries compiled to
//! predicates.
//!
//! ```rust
//! use oxide_query_core::filter::build_filters;
//! use oxide_query_core::{FilterValue, Relation};
//!
//! let users = Relation::table("users").with_columns(["id", "age"]);
//! let filters = [("users.age__gte", FilterValue::from(18))];
//! let predicate = build_filters(&users, &[], filters, false).unwrap();
//! assert!(predicate.is_some());
//! ```

mod key;
mod operator;
mod resolve;

pub use key::FilterKey;
pub use operator::Operator;
pub use resolve::resolve_column;

use crate::error::Result;
use crate::expr::Expr;
use crate::schema::Relation;
use crate::statement::Join;
use crate::value::FilterValue;

/// Compiles filter entries into one predicate.
///
/// Entries with a null value are skipped. The remaining predicates are
/// combined with AND, or with OR when `use_or` is set. Returns `None` when no
/// entry produced a predicate.
///
/// # Errors
///
/// Fails on the first malformed key, unsupported operator, unknown
/// table/column or invalid value, in entry order.
pub fn build_filters<I, K, V>(
    base: &Relation,
    joins: &[Join],
    filters: I,
    use_or: bool,
) -> Result<Option<Expr>>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<FilterValue>,
{
    let mut predicates = Vec::new();
    for (key, value) in filters {
        let value = value.into();
        if value == FilterValue::Null {
            continue;
        }
        let key = FilterKey::parse(key.as_ref())?;
        let operator = match key.operator {
            Some(name) => name.parse()?,
            None => Operator::Eq,
        };
        let column = resolve_column(base, joins, key.table, key.column)?;
        predicates.push(operator.apply(column, value)?);
    }
    Ok(if use_or {
        Expr::any(predicates)
    } else {
        Expr::all(predicates)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueryError;
    use crate::expr::Column;

    fn users() -> Relation {
        Relation::table("users").with_columns(["id", "name", "age"])
    }

    #[test]
    fn test_and_combination_in_entry_order() {
        let filters = vec![
            ("users.name", FilterValue::from("ann")),
            ("users.age__gt", FilterValue::from(30)),
        ];
        let expr = build_filters(&users(), &[], filters, false).unwrap().unwrap();
        assert_eq!(
            expr,
            Expr::And(vec![
                Column::qualified("users", "name").eq("ann"),
                Column::qualified("users", "age").gt(30),
            ])
        );
    }

    #[test]
    fn test_or_combination_single_entry_is_bare() {
        let filters = [("users.name__like", FilterValue::from("an"))];
        let expr = build_filters(&users(), &[], filters, true).unwrap().unwrap();
        assert_eq!(expr, Column::qualified("users", "name").icontains("an"));
    }

    #[test]
    fn test_null_entries_are_skipped() {
        let filters = [
            ("users.name", FilterValue::Null),
            ("not even a key", FilterValue::Null),
        ];
        assert_eq!(build_filters(&users(), &[], filters, false).unwrap(), None);
    }

    #[test]
    fn test_errors_surface() {
        let err = build_filters(&users(), &[], [("age", 3)], false).unwrap_err();
        assert!(matches!(err, QueryError::MalformedFilterKey(_)));

        let err = build_filters(&users(), &[], [("users.age__near", 3)], false).unwrap_err();
        assert_eq!(err, QueryError::UnsupportedOperator(String::from("near")));

        let err = build_filters(&users(), &[], [("posts.id", 3)], false).unwrap_err();
        assert!(matches!(err, QueryError::UnknownTable { .. }));
    }

    #[test]
    fn test_json_document_filters() {
        let doc = serde_json::json!({ "users.id__in": [1, 2], "users.name": null });
        let serde_json::Value::Object(map) = doc else {
            unreachable!()
        };
        let expr = build_filters(&users(), &[], map, false).unwrap().unwrap();
        assert_eq!(expr, Column::qualified("users", "id").in_list(vec![1, 2]));
    }
}
