//! Read terminals: execute the query on a session and return rows,
//! aggregates or pages.

use std::collections::HashSet;

use oxide_query_core::expr::{avg, max, min, sum, SelectItem};
use oxide_query_core::render::compile;
use oxide_query_core::{Column, Expr, Row, SqlValue, Statement, ToSqlValue};
use tracing::debug;

use super::Query;
use crate::error::{Error, Result};
use crate::pagination::{Page, Pagination};
use crate::session::{fetch_scalar, Session};

async fn fetch<S: Session>(session: &S, statement: &Statement) -> Result<Vec<Row>> {
    let compiled = compile(statement, session.dialect());
    session.fetch_all(&compiled).await
}

async fn fetch_count<S: Session>(session: &S, statement: &Statement) -> Result<u64> {
    let compiled = compile(statement, session.dialect());
    let value = fetch_scalar(session, &compiled).await?;
    Ok(value.as_i64().and_then(|n| u64::try_from(n).ok()).unwrap_or(0))
}

impl Query {
    /// Runs the query and returns every row.
    ///
    /// # Errors
    ///
    /// Fails when the query cannot be compiled or the database errors.
    pub async fn all<S: Session>(self, session: &S) -> Result<Vec<Row>> {
        let statement = self.statement()?;
        fetch(session, &statement).await
    }

    /// Same as [`Self::all`].
    ///
    /// # Errors
    ///
    /// Fails when the query cannot be compiled or the database errors.
    pub async fn get<S: Session>(self, session: &S) -> Result<Vec<Row>> {
        self.all(session).await
    }

    /// The first row, fetched with `LIMIT 1`.
    ///
    /// # Errors
    ///
    /// Fails when the query cannot be compiled or the database errors.
    pub async fn first<S: Session>(mut self, session: &S) -> Result<Option<Row>> {
        self.limit = Some(1);
        Ok(self.all(session).await?.into_iter().next())
    }

    /// The first row, or [`Error::RecordNotFound`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::RecordNotFound`] when no row matches.
    pub async fn first_or_fail<S: Session>(self, session: &S) -> Result<Row> {
        self.first(session)
            .await?
            .ok_or_else(|| Error::RecordNotFound(String::from("No records found")))
    }

    /// The only matching row.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RecordNotFound`] when no row matches and
    /// [`Error::MultipleRecords`] when more than one does.
    pub async fn one_or_fail<S: Session>(mut self, session: &S) -> Result<Row> {
        self.limit = Some(2);
        let mut rows = self.all(session).await?;
        match rows.len() {
            0 => Err(Error::RecordNotFound(String::from(
                "Expected exactly one record, found none",
            ))),
            1 => Ok(rows.remove(0)),
            n => Err(Error::MultipleRecords(n)),
        }
    }

    /// The row whose primary key is `id`.
    ///
    /// # Errors
    ///
    /// Fails when the base relation has no primary key.
    pub async fn find<S, T>(self, session: &S, id: T) -> Result<Option<Row>>
    where
        S: Session,
        T: ToSqlValue,
    {
        let pk = self.base()?.primary_key_column()?;
        self.r#where(pk.eq(id)).first(session).await
    }

    /// The row whose primary key is `id`, or [`Error::RecordNotFound`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::RecordNotFound`] when there is no such row.
    pub async fn find_or_fail<S, T>(self, session: &S, id: T) -> Result<Row>
    where
        S: Session,
        T: ToSqlValue,
    {
        let id = id.to_sql_value();
        let label = id.to_sql_inline();
        self.find(session, id)
            .await?
            .ok_or_else(|| Error::RecordNotFound(format!("Record with id {label} not found")))
    }

    /// The row with the highest primary key. Existing ordering is replaced.
    ///
    /// # Errors
    ///
    /// Fails when the base relation has no primary key.
    pub async fn last<S: Session>(mut self, session: &S) -> Result<Option<Row>> {
        let pk = self.base()?.primary_key_column()?;
        self.order_by = vec![pk.desc()];
        self.first(session).await
    }

    /// Number of matching rows: distinct primary keys, or rows of the whole
    /// compound when unions are set.
    ///
    /// # Errors
    ///
    /// Fails when the query cannot be compiled or the database errors.
    pub async fn count<S: Session>(self, session: &S) -> Result<u64> {
        fetch_count(session, &self.count_statement()?).await
    }

    async fn aggregate<S: Session>(self, session: &S, function: Expr) -> Result<SqlValue> {
        let statement = Statement::Select(self.filtered_select(vec![function.into()])?);
        let compiled = compile(&statement, session.dialect());
        fetch_scalar(session, &compiled).await
    }

    /// `MAX(column)` over the matching rows; NULL when none match.
    ///
    /// # Errors
    ///
    /// Fails when the query cannot be compiled or the database errors.
    pub async fn max<S: Session>(self, session: &S, column: impl Into<Expr>) -> Result<SqlValue> {
        self.aggregate(session, max(column)).await
    }

    /// `MIN(column)` over the matching rows; NULL when none match.
    ///
    /// # Errors
    ///
    /// Fails when the query cannot be compiled or the database errors.
    pub async fn min<S: Session>(self, session: &S, column: impl Into<Expr>) -> Result<SqlValue> {
        self.aggregate(session, min(column)).await
    }

    /// `SUM(column)` over the matching rows; NULL when none match.
    ///
    /// # Errors
    ///
    /// Fails when the query cannot be compiled or the database errors.
    pub async fn sum<S: Session>(self, session: &S, column: impl Into<Expr>) -> Result<SqlValue> {
        self.aggregate(session, sum(column)).await
    }

    /// `AVG(column)` over the matching rows; NULL when none match.
    ///
    /// # Errors
    ///
    /// Fails when the query cannot be compiled or the database errors.
    pub async fn avg<S: Session>(self, session: &S, column: impl Into<Expr>) -> Result<SqlValue> {
        self.aggregate(session, avg(column)).await
    }

    /// Whether any row matches.
    ///
    /// # Errors
    ///
    /// Fails when the query cannot be compiled or the database errors.
    pub async fn exists<S: Session>(self, session: &S) -> Result<bool> {
        Ok(self.first(session).await?.is_some())
    }

    /// `SELECT DISTINCT` over `columns`, or over the default projection when
    /// `columns` is empty.
    ///
    /// # Errors
    ///
    /// Fails when the query cannot be compiled or the database errors.
    pub async fn distinct<S, I>(self, session: &S, columns: I) -> Result<Vec<Row>>
    where
        S: Session,
        I: IntoIterator,
        I::Item: Into<SelectItem>,
    {
        let columns = columns.into_iter().map(Into::into).collect();
        let statement = self.distinct_statement(columns)?;
        fetch(session, &statement).await
    }

    /// Runs the query and keeps the first row for each combination of
    /// values in `columns`.
    ///
    /// # Errors
    ///
    /// Fails when the query cannot be compiled or the database errors.
    pub async fn distinct_by<S, I>(self, session: &S, columns: I) -> Result<Vec<Row>>
    where
        S: Session,
        I: IntoIterator,
        I::Item: Into<Column>,
    {
        let columns: Vec<Column> = columns.into_iter().map(Into::into).collect();
        let rows = self.all(session).await?;
        Ok(dedupe_rows(rows, &columns))
    }

    /// Same as [`Self::distinct_by`].
    ///
    /// # Errors
    ///
    /// Fails when the query cannot be compiled or the database errors.
    pub async fn group_and_deduplicate<S, I>(self, session: &S, columns: I) -> Result<Vec<Row>>
    where
        S: Session,
        I: IntoIterator,
        I::Item: Into<Column>,
    {
        self.distinct_by(session, columns).await
    }

    /// One page of results plus pagination metadata. The total is counted
    /// with the same FROM/JOIN/WHERE; a page below 1 becomes 1 and a size
    /// below 1 becomes the default size.
    ///
    /// # Errors
    ///
    /// Fails when the query cannot be compiled or the database errors.
    pub async fn paginate<S: Session>(
        mut self,
        session: &S,
        page: i64,
        per_page: i64,
    ) -> Result<Page> {
        let total = fetch_count(session, &self.count_statement()?).await?;
        let pagination = Pagination::new(total, page, per_page);
        debug!(
            total,
            page = pagination.current_page,
            per_page = pagination.limit,
            "Paginating"
        );

        self.limit = Some(pagination.limit);
        self.offset = Some(pagination.offset);
        let items = self.all(session).await?;
        Ok(Page { items, pagination })
    }
}

/// Keeps the first row of each distinct combination of `columns`. Columns
/// are looked up in the row by name; a missing column counts as NULL.
fn dedupe_rows(rows: Vec<Row>, columns: &[Column]) -> Vec<Row> {
    let mut seen = HashSet::new();
    rows.into_iter()
        .filter(|row| {
            let key: Vec<String> = columns
                .iter()
                .map(|c| {
                    row.get(&c.name)
                        .map_or_else(|| SqlValue::Null.to_sql_inline(), SqlValue::to_sql_inline)
                })
                .collect();
            seen.insert(key)
        })
        .collect()
}
