//! PostgreSQL dialect implementation.

use super::Dialect;

/// PostgreSQL dialect: numbered placeholders, native `ILIKE` and RETURNING.
#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresDialect;

impl PostgresDialect {
    /// Creates a new PostgreSQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgresql"
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${index}")
    }

    fn supports_returning(&self) -> bool {
        true
    }

    fn supports_ilike(&self) -> bool {
        true
    }

    fn regexp_operator(&self) -> &'static str {
        "~"
    }

    fn contains(&self, haystack: &str, needle: &str) -> String {
        format!("strpos({haystack}, {needle}) > 0")
    }

    fn identity(&self, left: &str, right: &str, negated: bool) -> String {
        // IS only accepts NULL/TRUE/FALSE/UNKNOWN on the right-hand side.
        if negated {
            format!("{left} IS DISTINCT FROM {right}")
        } else {
            format!("{left} IS NOT DISTINCT FROM {right}")
        }
    }
}
