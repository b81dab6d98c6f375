//! SQL Dialect support.
//!
//! Different databases have slightly different SQL syntax. This module provides
//! a trait for dialect-specific behavior and the three supported dialects.

mod mysql;
mod postgres;
mod sqlite;

pub use mysql::MySqlDialect;
pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;

/// Trait for SQL dialect-specific behavior.
pub trait Dialect: std::fmt::Debug + Send + Sync {
    /// Returns the name of the dialect.
    fn name(&self) -> &'static str;

    /// Returns the identifier quote character (e.g., `"` for standard SQL, `` ` `` for MySQL).
    fn identifier_quote(&self) -> char {
        '"'
    }

    /// Returns the placeholder for the `index`-th parameter (1-based).
    fn placeholder(&self, _index: usize) -> String {
        String::from("?")
    }

    /// Returns whether the dialect supports RETURNING clause.
    fn supports_returning(&self) -> bool {
        false
    }

    /// Returns whether the dialect has a native case-insensitive `ILIKE`.
    fn supports_ilike(&self) -> bool {
        false
    }

    /// Returns the regular-expression match operator.
    fn regexp_operator(&self) -> &'static str {
        "REGEXP"
    }

    /// Renders a case-sensitive test that `needle` occurs within `haystack`.
    /// The needle is matched literally, without wildcards.
    fn contains(&self, haystack: &str, needle: &str) -> String {
        format!("instr({haystack}, {needle}) > 0")
    }

    /// Renders a null-safe identity comparison between two rendered operands.
    fn identity(&self, left: &str, right: &str, negated: bool) -> String {
        if negated {
            format!("{left} IS NOT {right}")
        } else {
            format!("{left} IS {right}")
        }
    }

    /// Renders the LIMIT/OFFSET tail, without a leading space. Empty when
    /// neither is set.
    fn limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> String {
        match (limit, offset) {
            (Some(limit), Some(offset)) => format!("LIMIT {limit} OFFSET {offset}"),
            (Some(limit), None) => format!("LIMIT {limit}"),
            (None, Some(offset)) => format!("OFFSET {offset}"),
            (None, None) => String::new(),
        }
    }

    /// Quotes an identifier, doubling embedded quote characters.
    fn quote_identifier(&self, name: &str) -> String {
        let quote = self.identifier_quote();
        let escaped = name.replace(quote, &format!("{quote}{quote}"));
        format!("{quote}{escaped}{quote}")
    }
}

/// Looks up a dialect by name, case-insensitively.
///
/// Accepts `postgresql`, `postgres`, `mysql` and `sqlite`; anything else
/// falls back to PostgreSQL.
#[must_use]
pub fn dialect_for_name(name: &str) -> &'static dyn Dialect {
    match name.to_ascii_lowercase().as_str() {
        "mysql" => &MySqlDialect,
        "sqlite" => &SqliteDialect,
        _ => &PostgresDialect,
    }
}
