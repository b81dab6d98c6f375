#![allow(dead_code)]

use oxide_query_core::filter::build_filters;
use oxide_query_core::render::compile;
use oxide_query_core::statement::{FromItem, SelectStatement, Statement};
use oxide_query_core::{Dialect, FilterValue, Join, JoinKind, QueryError, Relation, SqlValue};

pub fn users() -> Relation {
    Relation::table("users")
        .with_columns(["id", "name", "age", "email"])
        .with_primary_key("id")
        .with_type_name("User")
}

pub fn posts() -> Relation {
    Relation::table("posts")
        .with_columns(["id", "user_id", "title"])
        .with_primary_key("id")
}

pub fn posts_join() -> Join {
    Join {
        kind: JoinKind::Inner,
        relation: posts(),
        on: posts().col("user_id").eq_col(users().col("id")),
    }
}

/// Compiles `SELECT * FROM users WHERE <filters>` and returns the WHERE text
/// and the bound parameters.
pub fn where_clause<K, V>(
    dialect: &dyn Dialect,
    filters: Vec<(K, V)>,
    use_or: bool,
) -> (String, Vec<SqlValue>)
where
    K: AsRef<str>,
    V: Into<FilterValue>,
{
    let predicate = build_filters(&users(), &[posts_join()], filters, use_or)
        .unwrap_or_else(|e| panic!("Failed to build filters: {e}"))
        .expect("Expected a predicate");
    let mut select = SelectStatement::from(FromItem::Relation(users()));
    select.selection = Some(predicate);
    let compiled = compile(&Statement::Select(select), dialect);
    let (_, condition) = compiled
        .sql
        .split_once(" WHERE ")
        .unwrap_or_else(|| panic!("No WHERE in: {}", compiled.sql));
    (String::from(condition), compiled.params)
}

pub fn filter_err<V: Into<FilterValue>>(key: &str, value: V) -> QueryError {
    build_filters(&users(), &[posts_join()], [(key, value)], false)
        .expect_err(&format!("Expected filter error for: {key}"))
}

pub fn text(value: &str) -> SqlValue {
    SqlValue::Text(String::from(value))
}
