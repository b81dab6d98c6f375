//! # oxide-query
//!
//! A fluent async query builder.
//!
//! This crate provides:
//! - [`Query`], a chainable clause set with joins, grouping, unions,
//!   subqueries and the `table.column__operator` filter DSL
//! - Read terminals (`all`, `first`, `find`, `count`, `paginate`, ...)
//!   running on any [`Session`]
//! - Mutations (`create`, `create_many`, `update`, `delete`) returned as
//!   pending [`Effect`] values that run inside caller-controlled
//!   [`Transaction`]s
//! - A SQLite session and connection settings
//!
//! ## Quick Start
//!
//! ```ignore
//! use oxide_query::{Effect, Query, SqliteSession, row};
//! use oxide_query_derive::Table;
//! use sqlx::SqlitePool;
//!
//! #[derive(Table)]
//! #[table(name = "users")]
//! struct User {
//!     #[column(primary_key)]
//!     id: i64,
//!     name: String,
//!     age: i64,
//! }
//!
//! async fn example(pool: &SqlitePool) -> oxide_query::Result<()> {
//!     let session = SqliteSession::acquire(pool).await?;
//!
//!     Query::of::<User>()
//!         .create(row! { "name" => "Ada", "age" => 36 })?
//!         .commit(&session)
//!         .await?;
//!
//!     let adults = Query::of::<User>()
//!         .apply_filters([("users.age__gte", 18)], false)?
//!         .order_by([User::name().asc()])
//!         .paginate(&session, 1, 20)
//!         .await?;
//!     println!("{} of {}", adults.items.len(), adults.pagination.total_records);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod effect;
pub mod error;
pub mod pagination;
pub mod query;
pub mod session;
pub mod sqlite;

pub use config::{ConnectionSettings, DbConfig, Driver};
pub use effect::{Delete, Effect, Insert, InsertMany, Update, DEFAULT_CHUNK_SIZE};
pub use error::{Error, Result};
pub use pagination::{Page, Pagination, DEFAULT_PER_PAGE};
pub use query::{LoadOption, Query};
pub use session::{ExecOutcome, Session, Transaction};
pub use sqlite::SqliteSession;

pub use oxide_query_core::{
    col, dialect_for_name, row, Column, CompiledStatement, Dialect, Expr, FilterValue, JoinKind,
    MySqlDialect, PostgresDialect, QueryError, Relation, Row, SqlValue, SqliteDialect, Table,
    ToSqlValue,
};
