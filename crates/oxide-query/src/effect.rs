//! Pending mutations.
//!
//! The mutation methods of [`crate::Query`] validate their input and return
//! an effect value without touching the database. The caller decides how it
//! runs: [`Effect::apply`] inside a transaction the caller controls, or
//! [`Effect::commit`] in a transaction of its own.

use oxide_query_core::render::compile;
use oxide_query_core::statement::{
    DeleteStatement, FromItem, InsertStatement, SelectStatement, UpdateStatement,
};
use oxide_query_core::{Expr, Relation, Row, SqlValue, Statement};
use tracing::{debug, warn};

use crate::error::Result;
use crate::session::{Session, Transaction};

/// Rows per INSERT used by `create_many` unless told otherwise.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// A pending mutation.
#[allow(async_fn_in_trait)]
pub trait Effect {
    /// What the mutation reports back.
    type Output;

    /// Runs the mutation on `session` without transaction control.
    async fn apply<S: Session>(&self, session: &S) -> Result<Self::Output>;

    /// Runs the mutation in its own transaction: committed on success,
    /// rolled back on failure.
    async fn commit<S: Session>(&self, session: &S) -> Result<Self::Output> {
        let tx = Transaction::begin(session).await?;
        match self.apply(session).await {
            Ok(output) => {
                tx.commit().await?;
                Ok(output)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "Rollback failed");
                }
                Err(err)
            }
        }
    }
}

/// `SELECT <columns> FROM table WHERE condition`, selecting every known
/// column of the table.
fn select_rows(table: &Relation, condition: Option<Expr>) -> SelectStatement {
    let mut select = SelectStatement::from(FromItem::Relation(table.clone()));
    if !table.columns().is_empty() {
        select.projection = table.columns().iter().map(|c| table.col(c).into()).collect();
    }
    select.selection = condition;
    select
}

fn returning_columns(table: &Relation) -> Vec<String> {
    if table.columns().is_empty() {
        vec![String::from("*")]
    } else {
        table.columns().to_vec()
    }
}

/// Column list of a batch: every key of every row, in first-seen order.
fn batch_columns(rows: &[Row]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for key in rows.iter().flat_map(Row::keys) {
        if !columns.contains(key) {
            columns.push(key.clone());
        }
    }
    columns
}

async fn insert_rows<S: Session>(session: &S, table: &Relation, rows: &[Row]) -> Result<Vec<Row>> {
    let dialect = session.dialect();
    let columns = batch_columns(rows);
    let values = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|c| row.get(c).cloned().unwrap_or(SqlValue::Null))
                .collect()
        })
        .collect();
    let mut insert = InsertStatement {
        table: table.clone(),
        columns,
        rows: values,
        returning: Vec::new(),
    };

    if dialect.supports_returning() {
        insert.returning = returning_columns(table);
        let statement = compile(&Statement::Insert(insert), dialect);
        debug!(sql = %statement.sql, rows = rows.len(), "Inserting with RETURNING");
        return session.fetch_all(&statement).await;
    }

    // Reading back needs the primary key; check it before anything is written.
    let pk = table.primary_key_column()?;
    let statement = compile(&Statement::Insert(insert), dialect);
    debug!(sql = %statement.sql, rows = rows.len(), "Inserting");
    let outcome = session.execute(&statement).await?;

    if let [_] = rows {
        let Some(id) = outcome.last_insert_id else {
            return Ok(Vec::new());
        };
        let select = select_rows(table, Some(pk.eq(id)));
        return session
            .fetch_all(&compile(&Statement::Select(select), dialect))
            .await;
    }

    // Newest rows first, then restored to insertion order.
    let mut select = select_rows(table, None);
    select.order_by = vec![pk.desc()];
    select.limit = Some(rows.len() as u64);
    let mut created = session
        .fetch_all(&compile(&Statement::Select(select), dialect))
        .await?;
    created.reverse();
    Ok(created)
}

/// A pending single-row INSERT.
#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    table: Relation,
    row: Row,
}

impl Insert {
    pub(crate) const fn new(table: Relation, row: Row) -> Self {
        Self { table, row }
    }

    /// The row to be written.
    #[must_use]
    pub const fn row(&self) -> &Row {
        &self.row
    }
}

impl Effect for Insert {
    /// The stored row, as read back from the database. `None` when the
    /// database reported no generated id to read it back by.
    type Output = Option<Row>;

    async fn apply<S: Session>(&self, session: &S) -> Result<Self::Output> {
        let created = insert_rows(session, &self.table, std::slice::from_ref(&self.row)).await?;
        Ok(created.into_iter().next())
    }
}

/// A pending multi-row INSERT, issued in fixed-size batches.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertMany {
    table: Relation,
    rows: Vec<Row>,
    chunk_size: usize,
}

impl InsertMany {
    pub(crate) fn new(table: Relation, rows: Vec<Row>, chunk_size: usize) -> Self {
        Self {
            table,
            rows,
            chunk_size: chunk_size.max(1),
        }
    }

    /// Rows to be written.
    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// The batches, in order.
    pub fn batches(&self) -> impl Iterator<Item = &[Row]> {
        self.rows.chunks(self.chunk_size)
    }
}

impl Effect for InsertMany {
    /// Created rows, batch by batch.
    type Output = Vec<Row>;

    async fn apply<S: Session>(&self, session: &S) -> Result<Self::Output> {
        let mut created = Vec::with_capacity(self.rows.len());
        for batch in self.batches() {
            created.extend(insert_rows(session, &self.table, batch).await?);
        }
        Ok(created)
    }

    /// Commits each batch in its own transaction. A failing batch is rolled
    /// back; batches committed before it stay committed.
    async fn commit<S: Session>(&self, session: &S) -> Result<Self::Output> {
        let mut created = Vec::with_capacity(self.rows.len());
        for (index, batch) in self.batches().enumerate() {
            let tx = Transaction::begin(session).await?;
            match insert_rows(session, &self.table, batch).await {
                Ok(rows) => {
                    tx.commit().await?;
                    debug!(batch = index, rows = rows.len(), "Batch committed");
                    created.extend(rows);
                }
                Err(err) => {
                    if let Err(rollback_err) = tx.rollback().await {
                        warn!(error = %rollback_err, "Rollback failed");
                    }
                    return Err(err);
                }
            }
        }
        Ok(created)
    }
}

/// A pending UPDATE.
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    table: Relation,
    assignments: Row,
    condition: Expr,
}

impl Update {
    pub(crate) const fn new(table: Relation, assignments: Row, condition: Expr) -> Self {
        Self {
            table,
            assignments,
            condition,
        }
    }
}

impl Effect for Update {
    /// The updated rows, re-read after the UPDATE.
    type Output = Vec<Row>;

    async fn apply<S: Session>(&self, session: &S) -> Result<Self::Output> {
        let dialect = session.dialect();
        let pk = self.table.primary_key_column()?;

        let mut affected = SelectStatement::from(FromItem::Relation(self.table.clone()));
        affected.projection = vec![pk.clone().into()];
        affected.selection = Some(self.condition.clone());
        let ids: Vec<SqlValue> = session
            .fetch_all(&compile(&Statement::Select(affected), dialect))
            .await?
            .into_iter()
            .filter_map(|row| row.into_values().next())
            .collect();
        if ids.is_empty() {
            debug!("Update matched no rows");
            return Ok(Vec::new());
        }

        let update = UpdateStatement {
            table: self.table.clone(),
            assignments: self
                .assignments
                .iter()
                .map(|(column, value)| (column.clone(), value.clone()))
                .collect(),
            selection: Some(self.condition.clone()),
        };
        let statement = compile(&Statement::Update(update), dialect);
        debug!(sql = %statement.sql, matched = ids.len(), "Updating");
        session.execute(&statement).await?;

        let select = select_rows(&self.table, Some(pk.in_list(ids)));
        session
            .fetch_all(&compile(&Statement::Select(select), dialect))
            .await
    }
}

/// A pending DELETE.
#[derive(Debug, Clone, PartialEq)]
pub struct Delete {
    table: Relation,
    condition: Expr,
}

impl Delete {
    pub(crate) const fn new(table: Relation, condition: Expr) -> Self {
        Self { table, condition }
    }
}

impl Effect for Delete {
    /// Rows deleted, as reported by the database.
    type Output = u64;

    async fn apply<S: Session>(&self, session: &S) -> Result<Self::Output> {
        let delete = DeleteStatement {
            table: self.table.clone(),
            selection: Some(self.condition.clone()),
        };
        let statement = compile(&Statement::Delete(delete), session.dialect());
        debug!(sql = %statement.sql, "Deleting");
        Ok(session.execute(&statement).await?.rows_affected)
    }
}
