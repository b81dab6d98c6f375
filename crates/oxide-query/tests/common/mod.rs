#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use oxide_query::{
    CompiledStatement, Dialect, Error, ExecOutcome, MySqlDialect, PostgresDialect, Relation,
    Result, Row, Session, SqliteDialect,
};

/// A session that records every statement and answers from a script.
///
/// `fetch_all` pops the next scripted row set (empty when the script is
/// exhausted); `execute` pops the next scripted outcome (default when
/// exhausted). Statements whose SQL contains the failure marker return a
/// database error.
pub struct MockSession {
    dialect: &'static dyn Dialect,
    statements: Mutex<Vec<CompiledStatement>>,
    rows: Mutex<VecDeque<Vec<Row>>>,
    outcomes: Mutex<VecDeque<ExecOutcome>>,
    fail_on: Mutex<Option<String>>,
}

impl MockSession {
    pub fn new(dialect: &'static dyn Dialect) -> Self {
        Self {
            dialect,
            statements: Mutex::new(Vec::new()),
            rows: Mutex::new(VecDeque::new()),
            outcomes: Mutex::new(VecDeque::new()),
            fail_on: Mutex::new(None),
        }
    }

    pub fn sqlite() -> Self {
        Self::new(&SqliteDialect)
    }

    pub fn postgres() -> Self {
        Self::new(&PostgresDialect)
    }

    pub fn mysql() -> Self {
        Self::new(&MySqlDialect)
    }

    pub fn push_rows(&self, rows: Vec<Row>) {
        self.rows.lock().unwrap().push_back(rows);
    }

    pub fn push_outcome(&self, outcome: ExecOutcome) {
        self.outcomes.lock().unwrap().push_back(outcome);
    }

    pub fn fail_on(&self, marker: &str) {
        *self.fail_on.lock().unwrap() = Some(String::from(marker));
    }

    pub fn statements(&self) -> Vec<CompiledStatement> {
        self.statements.lock().unwrap().clone()
    }

    pub fn sql(&self) -> Vec<String> {
        self.statements().into_iter().map(|s| s.sql).collect()
    }

    fn record(&self, statement: &CompiledStatement) -> Result<()> {
        self.statements.lock().unwrap().push(statement.clone());
        let failing = self
            .fail_on
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|marker| statement.sql.contains(marker.as_str()));
        if failing {
            return Err(Error::Database(sqlx::Error::Protocol(format!(
                "scripted failure: {}",
                statement.sql
            ))));
        }
        Ok(())
    }
}

impl Session for MockSession {
    fn dialect(&self) -> &'static dyn Dialect {
        self.dialect
    }

    async fn fetch_all(&self, statement: &CompiledStatement) -> Result<Vec<Row>> {
        self.record(statement)?;
        Ok(self.rows.lock().unwrap().pop_front().unwrap_or_default())
    }

    async fn execute(&self, statement: &CompiledStatement) -> Result<ExecOutcome> {
        self.record(statement)?;
        Ok(self.outcomes.lock().unwrap().pop_front().unwrap_or_default())
    }
}

pub fn users() -> Relation {
    Relation::table("users")
        .with_columns(["id", "name", "email", "age", "active"])
        .with_primary_key("id")
}

pub fn posts() -> Relation {
    Relation::table("posts")
        .with_columns(["id", "user_id", "title", "score"])
        .with_primary_key("id")
}
