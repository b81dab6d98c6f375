//! Database sessions and transactions.
//!
//! A [`Session`] executes compiled statements and decodes result rows. Query
//! terminals and mutation effects are written against this trait, so the
//! same query runs on [`crate::SqliteSession`] or on any other
//! implementation (tests use a recording mock).

use oxide_query_core::{CompiledStatement, Dialect, Row, SqlValue};
use tracing::{debug, warn};

use crate::effect::Effect;
use crate::error::Result;

/// Outcome of a statement that returns no rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecOutcome {
    /// Rows inserted, updated or deleted.
    pub rows_affected: u64,
    /// Row id generated by the last INSERT, when the driver reports one.
    pub last_insert_id: Option<i64>,
}

/// A connection-like handle that executes compiled statements.
///
/// Transaction control has default implementations issuing plain SQL; a
/// session only has to provide its dialect and the two execution methods.
#[allow(async_fn_in_trait)]
pub trait Session {
    /// Dialect statements are compiled for.
    fn dialect(&self) -> &'static dyn Dialect;

    /// Runs a statement and returns every result row.
    async fn fetch_all(&self, statement: &CompiledStatement) -> Result<Vec<Row>>;

    /// Runs a statement that returns no rows.
    async fn execute(&self, statement: &CompiledStatement) -> Result<ExecOutcome>;

    /// Starts a transaction.
    async fn begin(&self) -> Result<()> {
        self.execute(&CompiledStatement::raw("BEGIN")).await.map(drop)
    }

    /// Commits the current transaction.
    async fn commit(&self) -> Result<()> {
        self.execute(&CompiledStatement::raw("COMMIT")).await.map(drop)
    }

    /// Rolls back the current transaction.
    async fn rollback(&self) -> Result<()> {
        self.execute(&CompiledStatement::raw("ROLLBACK")).await.map(drop)
    }

    /// Opens a savepoint inside the current transaction.
    async fn savepoint(&self, name: &str) -> Result<()> {
        let sql = format!("SAVEPOINT {}", self.dialect().quote_identifier(name));
        self.execute(&CompiledStatement::raw(sql)).await.map(drop)
    }

    /// Releases a savepoint, keeping its changes.
    async fn release_savepoint(&self, name: &str) -> Result<()> {
        let sql = format!("RELEASE SAVEPOINT {}", self.dialect().quote_identifier(name));
        self.execute(&CompiledStatement::raw(sql)).await.map(drop)
    }

    /// Discards changes made since a savepoint.
    async fn rollback_to_savepoint(&self, name: &str) -> Result<()> {
        let sql = format!(
            "ROLLBACK TO SAVEPOINT {}",
            self.dialect().quote_identifier(name)
        );
        self.execute(&CompiledStatement::raw(sql)).await.map(drop)
    }
}

/// Runs a statement and returns the first column of its first row, or NULL
/// when it returned no rows.
pub(crate) async fn fetch_scalar<S: Session>(
    session: &S,
    statement: &CompiledStatement,
) -> Result<SqlValue> {
    let rows = session.fetch_all(statement).await?;
    Ok(rows
        .into_iter()
        .next()
        .and_then(|row| row.into_values().next())
        .unwrap_or(SqlValue::Null))
}

/// A transaction scope on a session.
///
/// The outermost scope issues `BEGIN`/`COMMIT`/`ROLLBACK`; scopes opened
/// with [`Transaction::nested`] use savepoints. A scope must be ended with
/// [`Transaction::commit`] or [`Transaction::rollback`]; dropping an open
/// scope only logs a warning since no statement can be awaited in `Drop`.
///
/// ```ignore
/// let tx = Transaction::begin(&session).await?;
/// tx.apply(&Query::of::<User>().create(row! { "name" => "Ada" })?).await?;
/// tx.commit().await?;
/// ```
#[derive(Debug)]
pub struct Transaction<'s, S: Session> {
    session: &'s S,
    depth: usize,
    open: bool,
}

impl<'s, S: Session> Transaction<'s, S> {
    /// Starts a top-level transaction.
    pub async fn begin(session: &'s S) -> Result<Self> {
        session.begin().await?;
        debug!("Transaction started");
        Ok(Self {
            session,
            depth: 0,
            open: true,
        })
    }

    /// Opens a nested scope backed by a savepoint.
    pub async fn nested(&self) -> Result<Transaction<'s, S>> {
        let depth = self.depth + 1;
        self.session.savepoint(&savepoint_name(depth)).await?;
        debug!(depth, "Savepoint created");
        Ok(Transaction {
            session: self.session,
            depth,
            open: true,
        })
    }

    /// The session this scope runs on.
    #[must_use]
    pub const fn session(&self) -> &'s S {
        self.session
    }

    /// Nesting depth; 0 for the outermost scope.
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Applies a pending mutation inside this scope.
    pub async fn apply<E: Effect>(&self, effect: &E) -> Result<E::Output> {
        effect.apply(self.session).await
    }

    /// Commits the transaction, or releases the savepoint of a nested scope.
    pub async fn commit(mut self) -> Result<()> {
        self.open = false;
        if self.depth == 0 {
            self.session.commit().await?;
            debug!("Transaction committed");
        } else {
            self.session
                .release_savepoint(&savepoint_name(self.depth))
                .await?;
            debug!(depth = self.depth, "Savepoint released");
        }
        Ok(())
    }

    /// Rolls back the transaction, or to the savepoint of a nested scope.
    pub async fn rollback(mut self) -> Result<()> {
        self.open = false;
        if self.depth == 0 {
            self.session.rollback().await?;
            debug!("Transaction rolled back");
        } else {
            self.session
                .rollback_to_savepoint(&savepoint_name(self.depth))
                .await?;
            debug!(depth = self.depth, "Rolled back to savepoint");
        }
        Ok(())
    }
}

impl<S: Session> Drop for Transaction<'_, S> {
    fn drop(&mut self) {
        if self.open {
            warn!(
                depth = self.depth,
                "Transaction dropped without commit or rollback"
            );
        }
    }
}

fn savepoint_name(depth: usize) -> String {
    format!("sp_{depth}")
}
