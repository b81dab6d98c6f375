//! SQLite session backed by a pooled sqlx connection.

use std::str::FromStr;

use oxide_query_core::{
    CompiledStatement, Dialect, QueryError, Relation, Row, SqlValue, SqliteDialect,
};
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqliteRow};
use sqlx::{Column as _, Row as _, Sqlite, SqlitePool, TypeInfo as _, ValueRef as _};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::Result;
use crate::session::{ExecOutcome, Session};

/// Parses a SQLite URL into connect options that register a `REGEXP`
/// function on every connection, which the `regexp` operator compiles to.
///
/// # Errors
///
/// Returns [`crate::Error::Database`] when `url` is not a valid SQLite URL.
pub fn connect_options(url: &str) -> Result<SqliteConnectOptions> {
    Ok(SqliteConnectOptions::from_str(url)?.with_regexp())
}

/// A unit of work on one SQLite connection taken from a pool.
///
/// Every statement, including transaction control, runs on the same
/// connection, so a [`crate::Transaction`] on this session spans all the
/// statements issued through it.
#[derive(Debug)]
pub struct SqliteSession {
    conn: Mutex<PoolConnection<Sqlite>>,
    echo: bool,
}

impl SqliteSession {
    /// Takes a connection from `pool` for the lifetime of the session.
    pub async fn acquire(pool: &SqlitePool) -> Result<Self> {
        let conn = pool.acquire().await?;
        Ok(Self {
            conn: Mutex::new(conn),
            echo: false,
        })
    }

    /// Logs every statement at INFO instead of DEBUG.
    #[must_use]
    pub const fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    fn log(&self, statement: &CompiledStatement) {
        if self.echo {
            info!(sql = %statement.sql, params = statement.params.len(), "Executing SQL");
        } else {
            debug!(sql = %statement.sql, params = statement.params.len(), "Executing SQL");
        }
    }

    /// Builds a relation for `table` from `PRAGMA table_info`: its columns in
    /// declaration order and its primary key, if it has a single-column one.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::UnknownTable`] listing the existing tables when
    /// `table` does not exist.
    pub async fn describe(&self, table: &str) -> Result<Relation> {
        let pragma = format!(
            "PRAGMA table_info({})",
            SqliteDialect.quote_identifier(table)
        );
        let info = self.fetch_all(&CompiledStatement::raw(pragma)).await?;
        if info.is_empty() {
            let tables = self
                .fetch_all(&CompiledStatement::raw(
                    "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
                ))
                .await?;
            let available = tables
                .iter()
                .filter_map(|row| row.get("name").and_then(SqlValue::as_str))
                .map(|name| format!("{name}({name})"))
                .collect();
            return Err(QueryError::UnknownTable {
                table: String::from(table),
                available,
            }
            .into());
        }

        let columns: Vec<&str> = info
            .iter()
            .filter_map(|row| row.get("name").and_then(SqlValue::as_str))
            .collect();
        let keys: Vec<&str> = info
            .iter()
            .filter(|row| row.get("pk").and_then(SqlValue::as_i64).unwrap_or(0) > 0)
            .filter_map(|row| row.get("name").and_then(SqlValue::as_str))
            .collect();
        let relation = Relation::table(table).with_columns(columns);
        Ok(match keys.as_slice() {
            [pk] => relation.with_primary_key(pk),
            _ => relation,
        })
    }
}

impl Session for SqliteSession {
    fn dialect(&self) -> &'static dyn Dialect {
        &SqliteDialect
    }

    async fn fetch_all(&self, statement: &CompiledStatement) -> Result<Vec<Row>> {
        self.log(statement);
        let query = statement
            .params
            .iter()
            .cloned()
            .fold(sqlx::query(&statement.sql), bind_param);
        let mut conn = self.conn.lock().await;
        let rows = query.fetch_all(&mut **conn).await?;
        rows.iter().map(decode_row).collect()
    }

    async fn execute(&self, statement: &CompiledStatement) -> Result<ExecOutcome> {
        self.log(statement);
        let query = statement
            .params
            .iter()
            .cloned()
            .fold(sqlx::query(&statement.sql), bind_param);
        let mut conn = self.conn.lock().await;
        let result = query.execute(&mut **conn).await?;
        Ok(ExecOutcome {
            rows_affected: result.rows_affected(),
            last_insert_id: Some(result.last_insert_rowid()),
        })
    }
}

/// Binds a SqlValue parameter to a query.
fn bind_param<'q>(
    query: sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>,
    value: SqlValue,
) -> sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        SqlValue::Null => query.bind(Option::<i64>::None),
        SqlValue::Bool(b) => query.bind(b),
        SqlValue::Int(i) => query.bind(i),
        SqlValue::Float(f) => query.bind(f),
        SqlValue::Text(s) => query.bind(s),
        SqlValue::Blob(b) => query.bind(b),
    }
}

/// Decodes a row by the storage class of each value.
fn decode_row(row: &SqliteRow) -> Result<Row> {
    let mut decoded = Row::with_capacity(row.columns().len());
    for column in row.columns() {
        let index = column.ordinal();
        let raw = row.try_get_raw(index)?;
        let value = if raw.is_null() {
            SqlValue::Null
        } else {
            let storage = raw.type_info().name().to_ascii_uppercase();
            match storage.as_str() {
                "INTEGER" | "BOOLEAN" => SqlValue::Int(row.try_get_unchecked(index)?),
                "REAL" => SqlValue::Float(row.try_get_unchecked(index)?),
                "BLOB" => SqlValue::Blob(row.try_get_unchecked(index)?),
                _ => SqlValue::Text(row.try_get_unchecked(index)?),
            }
        };
        decoded.insert(String::from(column.name()), value);
    }
    Ok(decoded)
}
