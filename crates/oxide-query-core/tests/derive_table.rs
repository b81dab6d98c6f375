//! Tests for the `#[derive(Table)]` macro output.
//!
//! These tests verify that the derive macro generates:
//! - A `Table` implementation with name, type name, columns and primary key
//! - Table-qualified column accessors usable in expressions
//! - A relation the filter DSL can resolve against

use oxide_query_core::filter::build_filters;
use oxide_query_core::render::compile;
use oxide_query_core::statement::{FromItem, SelectStatement, Statement};
use oxide_query_core::{Column, FilterValue, PostgresDialect, Table};
use oxide_query_derive::Table;

#[allow(dead_code)]
#[derive(Debug, Clone, Table)]
pub struct User {
    #[column(primary_key)]
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
}

#[allow(dead_code)]
#[derive(Debug, Clone, Table)]
#[table(name = "blog_posts")]
pub struct BlogPost {
    #[column(primary_key, name = "post_id")]
    pub id: i64,
    #[column(name = "author_id")]
    pub author: i64,
    pub title: String,
}

#[allow(dead_code)]
#[derive(Debug, Clone, Table)]
pub struct AuditEntry {
    pub message: String,
}

#[test]
fn test_default_table_name_is_snake_case() {
    assert_eq!(User::NAME, "user");
    assert_eq!(AuditEntry::NAME, "audit_entry");
}

#[test]
fn test_custom_names() {
    assert_eq!(BlogPost::NAME, "blog_posts");
    assert_eq!(BlogPost::TYPE_NAME, "BlogPost");
    assert_eq!(BlogPost::COLUMNS, &["post_id", "author_id", "title"]);
    assert_eq!(BlogPost::PRIMARY_KEY, Some("post_id"));
}

#[test]
fn test_missing_primary_key() {
    assert_eq!(AuditEntry::PRIMARY_KEY, None);
    assert!(AuditEntry::relation().primary_key_column().is_err());
}

#[test]
fn test_column_accessors_are_qualified() {
    assert_eq!(User::email(), Column::qualified("user", "email"));
    assert_eq!(BlogPost::author(), Column::qualified("blog_posts", "author_id"));
}

#[test]
fn test_relation_from_derive() {
    let relation = User::relation();
    assert_eq!(relation.name(), "user");
    assert_eq!(relation.type_name(), Some("User"));
    assert_eq!(relation.columns(), ["id", "name", "email"]);
    assert_eq!(relation.primary_key(), Some("id"));
}

#[test]
fn test_derived_relation_in_filters_and_sql() {
    let relation = BlogPost::relation();
    let predicate = build_filters(
        &relation,
        &[],
        [("BlogPost.title__startswith", FilterValue::from("Rust"))],
        false,
    )
    .unwrap();
    assert_eq!(predicate, Some(BlogPost::title().starts_with("Rust")));

    let mut select = SelectStatement::from(FromItem::Relation(relation));
    select.projection = vec![BlogPost::id().into(), BlogPost::title().into()];
    select.selection = predicate;
    let compiled = compile(&Statement::Select(select), &PostgresDialect);
    assert_eq!(
        compiled.sql,
        "SELECT \"blog_posts\".\"post_id\", \"blog_posts\".\"title\" FROM \"blog_posts\" \
         WHERE \"blog_posts\".\"title\" LIKE $1"
    );
}
