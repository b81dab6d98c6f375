//! Maps `table.column` references onto the relations of a query.

use crate::error::{QueryError, Result};
use crate::expr::Column;
use crate::schema::Relation;
use crate::statement::Join;

/// Resolves `table` and `column` against the base relation, then each joined
/// relation in join order. The first relation that answers to `table` wins,
/// so the base shadows any join of the same name.
///
/// # Errors
///
/// Returns [`QueryError::UnknownTable`] listing every addressable relation
/// when nothing answers to `table`, and [`QueryError::UnknownColumn`] when
/// the matched relation lacks `column`.
pub fn resolve_column(base: &Relation, joins: &[Join], table: &str, column: &str) -> Result<Column> {
    let relation = std::iter::once(base)
        .chain(joins.iter().map(|join| &join.relation))
        .find(|relation| relation.answers_to(table))
        .ok_or_else(|| QueryError::UnknownTable {
            table: String::from(table),
            available: std::iter::once(base)
                .chain(joins.iter().map(|join| &join.relation))
                .map(Relation::describe)
                .collect(),
        })?;
    relation.column(column)
}
