//! # oxide-query-core
//!
//! Statement building blocks for the oxide query builder.
//!
//! This crate provides:
//! - SQL values, rows and filter operands
//! - An expression tree with a column-oriented builder API
//! - Relations (tables, aliases, subqueries) and the `Table` trait
//! - PostgreSQL, MySQL and SQLite dialects and a renderer that turns
//!   statements into SQL text plus positional parameters
//! - The `table.column__operator` filter DSL
//!
//! ## Building expressions
//!
//! ```rust
//! use oxide_query_core::render::compile;
//! use oxide_query_core::statement::{FromItem, SelectStatement, Statement};
//! use oxide_query_core::{PostgresDialect, Relation};
//!
//! let users = Relation::table("users").with_columns(["id", "name"]);
//! let mut select = SelectStatement::from(FromItem::Relation(users.clone()));
//! select.selection = Some(users.col("name").eq("'; DROP TABLE users; --"));
//!
//! let compiled = compile(&Statement::Select(select), &PostgresDialect);
//! assert_eq!(
//!     compiled.sql,
//!     "SELECT * FROM \"users\" WHERE \"users\".\"name\" = $1"
//! );
//! assert_eq!(compiled.params.len(), 1);
//! ```

pub mod dialect;
pub mod error;
pub mod expr;
pub mod filter;
pub mod render;
pub mod schema;
pub mod statement;
pub mod value;

pub use dialect::{dialect_for_name, Dialect, MySqlDialect, PostgresDialect, SqliteDialect};
pub use error::{QueryError, Result};
pub use expr::{col, Column, Expr, OrderBy, OrderDirection, SelectItem};
pub use schema::{Relation, Table};
pub use statement::{CompiledStatement, Join, JoinKind, Statement};
pub use value::{FilterValue, Row, SqlValue, ToSqlValue};
