//! Mutation constructors. Each validates its input against the base relation
//! and returns a pending [`crate::effect::Effect`].

use oxide_query_core::{Expr, QueryError, Relation, Row, ToSqlValue};

use super::Query;
use crate::effect::{Delete, Insert, InsertMany, Update};
use crate::error::Result;

fn check_columns(table: &Relation, row: &Row, operation: &'static str) -> Result<()> {
    if row.is_empty() {
        return Err(QueryError::EmptyPayload(operation).into());
    }
    for key in row.keys() {
        table.column(key)?;
    }
    Ok(())
}

impl Query {
    /// The base relation with the schema applied, as mutations target it.
    fn target(&self) -> Result<Relation> {
        Ok(self.scoped(self.base()?))
    }

    fn required_predicate(&self, operation: &'static str) -> Result<Expr> {
        Ok(self
            .predicate()
            .ok_or(QueryError::MissingPredicate(operation))?)
    }

    /// Prepares an INSERT of one row.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::EmptyPayload`] for an empty row and
    /// [`QueryError::UnknownColumn`] for keys that are not columns of the
    /// base relation.
    pub fn create(self, data: Row) -> Result<Insert> {
        let table = self.target()?;
        check_columns(&table, &data, "create")?;
        Ok(Insert::new(table, data))
    }

    /// Prepares an INSERT of many rows in batches of `chunk_size` (see
    /// [`crate::effect::DEFAULT_CHUNK_SIZE`]). Every row is checked before
    /// anything is written.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::EmptyPayload`] for an empty row and
    /// [`QueryError::UnknownColumn`] for keys that are not columns of the
    /// base relation.
    pub fn create_many(self, rows: Vec<Row>, chunk_size: usize) -> Result<InsertMany> {
        let table = self.target()?;
        for row in &rows {
            check_columns(&table, row, "create_many")?;
        }
        Ok(InsertMany::new(table, rows, chunk_size))
    }

    /// Prepares an UPDATE of the rows matching the query's conditions.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::MissingPredicate`] when no condition is set, and
    /// the payload errors of [`Self::create`].
    pub fn update(self, data: Row) -> Result<Update> {
        let table = self.target()?;
        check_columns(&table, &data, "update")?;
        let condition = self.required_predicate("update")?;
        Ok(Update::new(table, data, condition))
    }

    /// Prepares an UPDATE of the row whose primary key is `id`.
    ///
    /// # Errors
    ///
    /// Fails when the base relation has no primary key, and with the payload
    /// errors of [`Self::create`].
    pub fn update_by_id<T: ToSqlValue>(self, id: T, data: Row) -> Result<Update> {
        let pk = self.base()?.primary_key_column()?;
        self.r#where(pk.eq(id)).update(data)
    }

    /// Prepares a DELETE of the rows matching the query's conditions.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::MissingPredicate`] when no condition is set.
    pub fn delete(self) -> Result<Delete> {
        let table = self.target()?;
        let condition = self.required_predicate("delete")?;
        Ok(Delete::new(table, condition))
    }

    /// Prepares a DELETE of the row whose primary key is `id`.
    ///
    /// # Errors
    ///
    /// Fails when the base relation has no primary key.
    pub fn delete_by_id<T: ToSqlValue>(self, id: T) -> Result<Delete> {
        let pk = self.base()?.primary_key_column()?;
        self.r#where(pk.eq(id)).delete()
    }
}

#[cfg(test)]
mod tests {
    use oxide_query_core::row;

    use super::*;
    use crate::Error;

    fn users() -> Relation {
        Relation::table("users")
            .with_columns(["id", "name", "email"])
            .with_primary_key("id")
    }

    #[test]
    fn test_create_rejects_unknown_and_empty_payloads() {
        let err = Query::new()
            .table(users())
            .create(row! { "name" => "Ada", "nickname" => "ada" })
            .unwrap_err();
        assert_eq!(err.to_string(), "Column 'nickname' not found in 'users'.");

        assert!(matches!(
            Query::new().table(users()).create(Row::new()),
            Err(Error::Query(QueryError::EmptyPayload("create")))
        ));
    }

    #[test]
    fn test_create_many_validates_every_row_first() {
        let rows = vec![row! { "name" => "a" }, row! { "name" => "b", "age" => 3 }];
        assert!(matches!(
            Query::new().table(users()).create_many(rows, 10),
            Err(Error::Query(QueryError::UnknownColumn { .. }))
        ));
    }

    #[test]
    fn test_update_and_delete_require_a_predicate() {
        assert!(matches!(
            Query::new().table(users()).update(row! { "name" => "x" }),
            Err(Error::Query(QueryError::MissingPredicate("update")))
        ));
        assert!(matches!(
            Query::new().table(users()).delete(),
            Err(Error::Query(QueryError::MissingPredicate("delete")))
        ));
        assert!(Query::new()
            .table(users())
            .or_where(users().col("id").eq(1))
            .delete()
            .is_ok());
    }

    #[test]
    fn test_by_id_needs_primary_key() {
        let events = Relation::table("events").with_columns(["kind"]);
        assert!(matches!(
            Query::new().table(events).delete_by_id(1),
            Err(Error::Query(QueryError::MissingPrimaryKey(_)))
        ));
        assert!(Query::new().table(users()).delete_by_id(1).is_ok());
    }

    #[test]
    fn test_chunk_size_splits_batches() {
        let rows = (0..2500).map(|i| row! { "name" => format!("user{i}") }).collect();
        let insert = Query::new().table(users()).create_many(rows, 1000).unwrap();
        let sizes: Vec<usize> = insert.batches().map(<[Row]>::len).collect();
        assert_eq!(sizes, vec![1000, 1000, 500]);
    }
}
