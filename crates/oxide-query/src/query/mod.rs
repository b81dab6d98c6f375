//! The fluent query builder.
//!
//! A [`Query`] accumulates clauses through chained calls and is compiled into
//! a single statement when a terminal runs. Chain methods take the query by
//! value and return the extended query, so a clause set is never shared:
//! cloning is the only way to reuse one.
//!
//! ```rust
//! use oxide_query::{Query, Relation};
//!
//! let users = Relation::table("users").with_columns(["id", "active"]).with_primary_key("id");
//! let sql = Query::new()
//!     .table(users.clone())
//!     .r#where(users.col("active").eq(true))
//!     .limit(10)
//!     .unwrap()
//!     .to_sql("postgresql", false)
//!     .unwrap();
//! assert_eq!(
//!     sql,
//!     "SELECT \"users\".\"id\", \"users\".\"active\" FROM \"users\" \
//!      WHERE \"users\".\"active\" = $1 LIMIT 10"
//! );
//! ```

mod compile;
mod read;
mod write;

use oxide_query_core::expr::{OrderBy, SelectItem};
use oxide_query_core::filter::{build_filters, resolve_column, Operator};
use oxide_query_core::schema::validate_schema_name;
use oxide_query_core::{
    Column, Expr, FilterValue, Join, JoinKind, QueryError, Relation, Table, ToSqlValue,
};

use crate::error::Result;

/// Loader hints for the default projection. They only take effect once ORM
/// mode is enabled with [`Query::with_orm`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOption {
    /// Load the primary key plus the listed columns.
    LoadOnly(Vec<String>),
    /// Leave the listed columns out.
    Defer(Vec<String>),
}

/// An accumulated clause set.
#[derive(Debug, Clone, Default)]
pub struct Query {
    base: Option<Relation>,
    schema: Option<String>,
    projection: Vec<SelectItem>,
    joins: Vec<Join>,
    predicates: Vec<Expr>,
    or_predicates: Vec<Expr>,
    group_by: Vec<Expr>,
    having: Vec<Expr>,
    order_by: Vec<OrderBy>,
    limit: Option<u64>,
    offset: Option<u64>,
    unions: Vec<Query>,
    union_all: bool,
    orm: bool,
    load_options: Vec<LoadOption>,
}

impl Query {
    /// Creates an empty query.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a query on the table of a `#[derive(Table)]` type.
    #[must_use]
    pub fn of<T: Table>() -> Self {
        Self::new().table(T::relation())
    }

    /// Sets the base relation.
    #[must_use]
    pub fn table(mut self, relation: Relation) -> Self {
        self.base = Some(relation);
        self
    }

    /// Qualifies the base and joined tables with a schema when compiling.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidSchemaName`] unless the name is made of
    /// letters, digits and underscores.
    pub fn schema(mut self, name: &str) -> Result<Self> {
        validate_schema_name(name)?;
        self.schema = Some(String::from(name));
        Ok(self)
    }

    /// Replaces the projection. An empty projection selects every column of
    /// the base relation.
    #[must_use]
    pub fn select<I>(mut self, items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<SelectItem>,
    {
        self.projection = items.into_iter().map(Into::into).collect();
        self
    }

    /// Adds a join of the given kind.
    #[must_use]
    pub fn join_as(mut self, kind: JoinKind, relation: Relation, on: Expr) -> Self {
        self.joins.push(Join { kind, relation, on });
        self
    }

    /// `INNER JOIN relation ON on`.
    #[must_use]
    pub fn join(self, relation: Relation, on: Expr) -> Self {
        self.join_as(JoinKind::Inner, relation, on)
    }

    /// Same as [`Self::join`].
    #[must_use]
    pub fn inner_join(self, relation: Relation, on: Expr) -> Self {
        self.join_as(JoinKind::Inner, relation, on)
    }

    /// `LEFT OUTER JOIN relation ON on`.
    #[must_use]
    pub fn left_join(self, relation: Relation, on: Expr) -> Self {
        self.join_as(JoinKind::Left, relation, on)
    }

    /// Right outer join; compiled as a left outer join with the operands
    /// swapped.
    #[must_use]
    pub fn right_join(self, relation: Relation, on: Expr) -> Self {
        self.join_as(JoinKind::Right, relation, on)
    }

    /// `FULL OUTER JOIN relation ON on`.
    #[must_use]
    pub fn full_join(self, relation: Relation, on: Expr) -> Self {
        self.join_as(JoinKind::Full, relation, on)
    }

    /// Joins a derived table (see [`Self::subquery`]). `alias` renames it;
    /// without one it keeps its own alias, or gets `anon_<n>` where `n` is
    /// the join's position.
    #[must_use]
    pub fn join_subquery(self, subquery: Relation, on: Expr, alias: Option<&str>) -> Self {
        self.join_subquery_as(JoinKind::Inner, subquery, on, alias)
    }

    /// Left outer join on a derived table.
    #[must_use]
    pub fn left_join_subquery(self, subquery: Relation, on: Expr, alias: Option<&str>) -> Self {
        self.join_subquery_as(JoinKind::Left, subquery, on, alias)
    }

    /// Right outer join on a derived table.
    #[must_use]
    pub fn right_join_subquery(self, subquery: Relation, on: Expr, alias: Option<&str>) -> Self {
        self.join_subquery_as(JoinKind::Right, subquery, on, alias)
    }

    /// Full outer join on a derived table.
    #[must_use]
    pub fn full_join_subquery(self, subquery: Relation, on: Expr, alias: Option<&str>) -> Self {
        self.join_subquery_as(JoinKind::Full, subquery, on, alias)
    }

    fn join_subquery_as(
        self,
        kind: JoinKind,
        subquery: Relation,
        on: Expr,
        alias: Option<&str>,
    ) -> Self {
        let relation = match alias {
            Some(alias) => subquery.alias(alias),
            None if subquery.alias_name().is_some() => subquery,
            None => {
                let anonymous = format!("anon_{}", self.joins.len() + 1);
                subquery.alias(&anonymous)
            }
        };
        self.join_as(kind, relation, on)
    }

    /// Adds a condition to the AND group.
    #[must_use]
    pub fn r#where(mut self, condition: Expr) -> Self {
        self.predicates.push(condition);
        self
    }

    /// Adds a condition to the OR group.
    #[must_use]
    pub fn or_where(mut self, condition: Expr) -> Self {
        self.or_predicates.push(condition);
        self
    }

    /// `column IN (values)`.
    #[must_use]
    pub fn where_in<T: ToSqlValue>(self, column: Column, values: Vec<T>) -> Self {
        self.r#where(column.in_list(values))
    }

    /// `column NOT IN (values)`.
    #[must_use]
    pub fn where_not_in<T: ToSqlValue>(self, column: Column, values: Vec<T>) -> Self {
        self.r#where(column.not_in_list(values))
    }

    /// `column IS NULL`.
    #[must_use]
    pub fn where_null(self, column: Column) -> Self {
        self.r#where(column.is_null())
    }

    /// `column IS NOT NULL`.
    #[must_use]
    pub fn where_not_null(self, column: Column) -> Self {
        self.r#where(column.is_not_null())
    }

    /// `column BETWEEN low AND high` from a two-element range.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidRange`] unless exactly two values are given.
    pub fn where_between(self, column: Column, range: impl Into<FilterValue>) -> Result<Self> {
        let condition = Operator::Between.apply(column, range.into())?;
        Ok(self.r#where(condition))
    }

    /// `column NOT BETWEEN low AND high` from a two-element range.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidRange`] unless exactly two values are given.
    pub fn where_not_between(self, column: Column, range: impl Into<FilterValue>) -> Result<Self> {
        let condition = Operator::NotBetween.apply(column, range.into())?;
        Ok(self.r#where(condition))
    }

    /// Case-insensitive substring match on `column`.
    #[must_use]
    pub fn where_like<T: ToSqlValue>(self, column: Column, value: T) -> Self {
        self.r#where(column.icontains(value))
    }

    /// `column IN (subquery)`. The producer runs once, immediately. The
    /// produced query may carry union members; any member without an
    /// explicit projection selects its primary key.
    ///
    /// # Errors
    ///
    /// Fails when the produced query cannot be compiled.
    pub fn where_in_subquery<F>(self, column: Column, producer: F) -> Result<Self>
    where
        F: FnOnce() -> Self,
    {
        let subquery = producer().project_primary_key()?.statement()?;
        Ok(self.r#where(column.in_subquery(subquery)))
    }

    fn project_primary_key(mut self) -> Result<Self> {
        if self.projection.is_empty() {
            let pk = self.base()?.primary_key_column()?;
            self.projection = vec![pk.into()];
        }
        self.unions = self
            .unions
            .into_iter()
            .map(Self::project_primary_key)
            .collect::<Result<_>>()?;
        Ok(self)
    }

    /// `EXISTS (subquery)`, unions included.
    ///
    /// # Errors
    ///
    /// Fails when the produced query cannot be compiled.
    pub fn where_exists_subquery<F>(self, producer: F) -> Result<Self>
    where
        F: FnOnce() -> Self,
    {
        let subquery = producer().statement()?;
        Ok(self.r#where(Expr::exists(subquery)))
    }

    /// `NOT EXISTS (subquery)`, unions included.
    ///
    /// # Errors
    ///
    /// Fails when the produced query cannot be compiled.
    pub fn where_not_exists_subquery<F>(self, producer: F) -> Result<Self>
    where
        F: FnOnce() -> Self,
    {
        let subquery = producer().statement()?;
        Ok(self.r#where(Expr::not_exists(subquery)))
    }

    /// Applies `table.column__operator` filters. The entries are combined
    /// with AND (or OR when `use_or` is set) into one condition, which is
    /// added to the AND group (or the OR group). Null values are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::NoBaseRelation`] before [`Self::table`], or the
    /// first key, operator, resolution or value error.
    pub fn apply_filters<I, K, V>(self, filters: I, use_or: bool) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<FilterValue>,
    {
        let condition = build_filters(self.base()?, &self.joins, filters, use_or)?;
        Ok(match condition {
            Some(condition) if use_or => self.or_where(condition),
            Some(condition) => self.r#where(condition),
            None => self,
        })
    }

    /// Resolves a `table.column` reference against the base relation and the
    /// joins.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::MalformedFilterKey`] for references without
    /// exactly one dot, or the resolver's unknown table/column errors.
    pub fn column(&self, reference: &str) -> Result<Column> {
        let (table, column) = reference
            .split_once('.')
            .filter(|(table, column)| {
                !table.is_empty() && !column.is_empty() && !column.contains('.')
            })
            .ok_or_else(|| QueryError::MalformedFilterKey(String::from(reference)))?;
        Ok(resolve_column(self.base()?, &self.joins, table, column)?)
    }

    /// Adds GROUP BY keys.
    #[must_use]
    pub fn group_by<I>(mut self, keys: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Expr>,
    {
        self.group_by.extend(keys.into_iter().map(Into::into));
        self
    }

    /// Adds a HAVING condition; several are combined with AND.
    #[must_use]
    pub fn having(mut self, condition: Expr) -> Self {
        self.having.push(condition);
        self
    }

    /// Adds ORDER BY keys. A bare column sorts ascending.
    #[must_use]
    pub fn order_by<I>(mut self, keys: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<OrderBy>,
    {
        self.order_by.extend(keys.into_iter().map(Into::into));
        self
    }

    /// Sets LIMIT.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidLimit`] when `n` is below 1.
    pub fn limit(mut self, n: i64) -> Result<Self> {
        let n = u64::try_from(n)
            .ok()
            .filter(|n| *n >= 1)
            .ok_or(QueryError::InvalidLimit(n))?;
        self.limit = Some(n);
        Ok(self)
    }

    /// Sets OFFSET.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidOffset`] when `n` is negative.
    pub fn offset(mut self, n: i64) -> Result<Self> {
        let n = u64::try_from(n).map_err(|_| QueryError::InvalidOffset(n))?;
        self.offset = Some(n);
        Ok(self)
    }

    /// Same as [`Self::limit`].
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidLimit`] when `n` is below 1.
    pub fn take(self, n: i64) -> Result<Self> {
        self.limit(n)
    }

    /// Same as [`Self::offset`].
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidOffset`] when `n` is negative.
    pub fn skip(self, n: i64) -> Result<Self> {
        self.offset(n)
    }

    /// Combines this query with others using UNION. Replaces members and mode
    /// set by an earlier `union`/`union_all`.
    #[must_use]
    pub fn union<I: IntoIterator<Item = Self>>(mut self, queries: I) -> Self {
        self.unions = queries.into_iter().collect();
        self.union_all = false;
        self
    }

    /// Combines this query with others using UNION ALL. Replaces members and
    /// mode set by an earlier `union`/`union_all`.
    #[must_use]
    pub fn union_all<I: IntoIterator<Item = Self>>(mut self, queries: I) -> Self {
        self.unions = queries.into_iter().collect();
        self.union_all = true;
        self
    }

    /// Selects from the query produced by `producer`, aliased `alias`. The
    /// projection, joins and conditions added so far are discarded.
    ///
    /// # Errors
    ///
    /// Fails when the produced query cannot be compiled.
    pub fn from_subquery<F>(mut self, alias: &str, producer: F) -> Result<Self>
    where
        F: FnOnce() -> Self,
    {
        let derived = producer().subquery(alias)?;
        self.base = Some(derived);
        self.projection.clear();
        self.joins.clear();
        self.predicates.clear();
        self.or_predicates.clear();
        Ok(self)
    }

    /// Enables ORM mode, in which loader hints shape the default projection.
    #[must_use]
    pub const fn with_orm(mut self, enabled: bool) -> Self {
        self.orm = enabled;
        self
    }

    /// Adds loader hints.
    #[must_use]
    pub fn options<I: IntoIterator<Item = LoadOption>>(mut self, options: I) -> Self {
        self.load_options.extend(options);
        self
    }

    /// Restricts the default projection to the primary key and `columns`.
    #[must_use]
    pub fn load_only<I>(self, columns: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Column>,
    {
        let names = columns
            .into_iter()
            .map(|c| Into::<Column>::into(c).name)
            .collect();
        self.options([LoadOption::LoadOnly(names)])
    }

    pub(crate) fn base(&self) -> Result<&Relation> {
        Ok(self.base.as_ref().ok_or(QueryError::NoBaseRelation)?)
    }
}
