//! MySQL dialect implementation.

use super::Dialect;

/// MySQL dialect: backtick quoting, `?` placeholders, no RETURNING.
#[derive(Debug, Default, Clone, Copy)]
pub struct MySqlDialect;

impl MySqlDialect {
    /// Creates a new MySQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for MySqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn identifier_quote(&self) -> char {
        '`'
    }

    fn contains(&self, haystack: &str, needle: &str) -> String {
        // A binary operand makes INSTR compare bytes instead of collated text.
        format!("INSTR(CAST({haystack} AS BINARY), {needle}) > 0")
    }

    fn identity(&self, left: &str, right: &str, negated: bool) -> String {
        if negated {
            format!("NOT ({left} <=> {right})")
        } else {
            format!("{left} <=> {right}")
        }
    }

    fn limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> String {
        match (limit, offset) {
            // OFFSET is only valid after LIMIT.
            (None, Some(offset)) => format!("LIMIT {} OFFSET {offset}", u64::MAX),
            (Some(limit), Some(offset)) => format!("LIMIT {limit} OFFSET {offset}"),
            (Some(limit), None) => format!("LIMIT {limit}"),
            (None, None) => String::new(),
        }
    }
}
