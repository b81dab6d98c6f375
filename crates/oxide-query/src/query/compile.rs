//! Lowering of a clause set into statement trees.

use oxide_query_core::expr::{count_all, count_distinct, SelectItem};
use oxide_query_core::render::{compile, compile_inline, format_sql};
use oxide_query_core::statement::{CompoundSelect, FromItem, JoinOperator, SelectStatement};
use oxide_query_core::{
    dialect_for_name, CompiledStatement, Dialect, Expr, JoinKind, Relation, Statement,
};
use tracing::debug;

use super::{LoadOption, Query};
use crate::error::Result;

impl Query {
    /// The WHERE condition: the AND group and the OR group, combined as
    /// `(AND group) OR (OR group)` when both are present.
    pub(crate) fn predicate(&self) -> Option<Expr> {
        let and_group = Expr::all(self.predicates.clone());
        let or_group = Expr::any(self.or_predicates.clone());
        match (and_group, or_group) {
            (Some(and_group), Some(or_group)) => {
                Some(Expr::Or(vec![and_group.paren(), or_group.paren()]))
            }
            (Some(and_group), None) => Some(and_group),
            (None, or_group) => or_group,
        }
    }

    pub(crate) fn scoped(&self, relation: &Relation) -> Relation {
        match &self.schema {
            Some(schema) => relation.clone().in_schema(schema),
            None => relation.clone(),
        }
    }

    fn default_projection(&self, base: &Relation) -> Vec<SelectItem> {
        let mut columns: Vec<&str> = base.columns().iter().map(String::as_str).collect();
        if self.orm {
            for option in &self.load_options {
                match option {
                    LoadOption::LoadOnly(keep) => columns.retain(|c| {
                        base.primary_key() == Some(*c) || keep.iter().any(|k| k == c)
                    }),
                    LoadOption::Defer(deferred) => {
                        columns.retain(|c| !deferred.iter().any(|d| d == c));
                    }
                }
            }
        } else if !self.load_options.is_empty() {
            debug!(
                hints = self.load_options.len(),
                "Loader hints ignored outside ORM mode"
            );
        }
        if columns.is_empty() {
            return vec![Expr::Wildcard(Some(String::from(base.qualifier()))).into()];
        }
        columns.into_iter().map(|c| base.col(c).into()).collect()
    }

    /// FROM and the join tree, joins nested left to right in insertion order.
    fn from_clause(&self, base: &Relation) -> FromItem {
        let from = FromItem::Relation(self.scoped(base));
        self.joins.iter().fold(from, |from, join| {
            let joined = FromItem::Relation(self.scoped(&join.relation));
            let on = join.on.clone();
            match join.kind {
                JoinKind::Inner => FromItem::join(from, joined, JoinOperator::Inner, on),
                JoinKind::Left => FromItem::join(from, joined, JoinOperator::LeftOuter, on),
                JoinKind::Full => FromItem::join(from, joined, JoinOperator::FullOuter, on),
                JoinKind::Right => FromItem::join(joined, from, JoinOperator::LeftOuter, on),
            }
        })
    }

    /// `SELECT <aggregate> FROM ... WHERE ...`: only the FROM, JOIN and WHERE
    /// parts of the clause set are kept.
    pub(crate) fn filtered_select(&self, projection: Vec<SelectItem>) -> Result<SelectStatement> {
        let base = self.base()?;
        let mut select = SelectStatement::from(self.from_clause(base));
        select.projection = projection;
        select.selection = self.predicate();
        Ok(select)
    }

    /// The SELECT of this clause set, ignoring union members.
    pub(crate) fn select_statement(&self) -> Result<SelectStatement> {
        let base = self.base()?;
        let projection = if self.projection.is_empty() {
            self.default_projection(base)
        } else {
            self.projection.clone()
        };
        Ok(SelectStatement {
            distinct: false,
            projection,
            from: self.from_clause(base),
            selection: self.predicate(),
            group_by: self.group_by.clone(),
            having: Expr::all(self.having.clone()),
            order_by: self.order_by.clone(),
            limit: self.limit,
            offset: self.offset,
        })
    }

    /// Compiles the clause set into a statement tree.
    ///
    /// With union members, ordering and paging of this query apply to the
    /// combined result.
    ///
    /// # Errors
    ///
    /// Returns [`oxide_query_core::QueryError::NoBaseRelation`] when this
    /// query or a union member has no base relation.
    pub fn statement(&self) -> Result<Statement> {
        let first = self.select_statement()?;
        if self.unions.is_empty() {
            return Ok(Statement::Select(first));
        }
        Ok(Statement::Compound(self.compound(first)?))
    }

    fn compound(&self, mut first: SelectStatement) -> Result<CompoundSelect> {
        let order_by = std::mem::take(&mut first.order_by);
        let limit = first.limit.take();
        let offset = first.offset.take();
        let members = self
            .unions
            .iter()
            .enumerate()
            .map(|(i, member)| member.union_member(i + 1))
            .collect::<Result<Vec<_>>>()?;
        Ok(CompoundSelect {
            first,
            members,
            all: self.union_all,
            order_by,
            limit,
            offset,
        })
    }

    /// A union member; members with their own ordering, paging or unions are
    /// wrapped as `SELECT * FROM (...) AS "union_<n>"`.
    fn union_member(&self, index: usize) -> Result<SelectStatement> {
        let alias = format!("union_{index}");
        let select = self.select_statement()?;
        let derived = if !self.unions.is_empty() {
            Relation::compound(self.compound(select)?, &alias)
        } else if select.is_windowed() {
            Relation::subquery(select, &alias)
        } else {
            return Ok(select);
        };
        Ok(SelectStatement::from(FromItem::Relation(derived)))
    }

    /// Wraps the query as a derived table named `alias`, for joins and
    /// [`Self::from_subquery`].
    ///
    /// # Errors
    ///
    /// Fails when the query cannot be compiled.
    pub fn subquery(&self, alias: &str) -> Result<Relation> {
        let select = self.select_statement()?;
        if self.unions.is_empty() {
            Ok(Relation::subquery(select, alias))
        } else {
            Ok(Relation::compound(self.compound(select)?, alias))
        }
    }

    /// The COUNT statement: distinct primary keys (or the first selected
    /// expression when grouped) over the FROM/JOIN/WHERE part of the query.
    /// With unions, the rows of the whole compound are counted.
    pub(crate) fn count_statement(&self) -> Result<Statement> {
        if !self.unions.is_empty() {
            let mut compound = self.compound(self.select_statement()?)?;
            compound.order_by.clear();
            compound.limit = None;
            compound.offset = None;
            let source = Relation::compound(compound, "count_source");
            let mut select = SelectStatement::from(FromItem::Relation(source));
            select.projection = vec![count_all().into()];
            return Ok(Statement::Select(select));
        }

        let base = self.base()?;
        let pk = base.primary_key().map(|pk| Expr::from(base.col(pk)));
        let target = if self.group_by.is_empty() {
            pk
        } else {
            self.projection.first().map(|item| item.expr.clone()).or(pk)
        };
        let count = match target {
            Some(target) => count_distinct(target),
            None => count_all(),
        };
        Ok(Statement::Select(self.filtered_select(vec![count.into()])?))
    }

    /// `SELECT DISTINCT` over `columns` (the default projection when empty),
    /// keeping ordering and paging.
    pub(crate) fn distinct_statement(&self, columns: Vec<SelectItem>) -> Result<Statement> {
        let mut select = self.select_statement()?;
        select.distinct = true;
        if !columns.is_empty() {
            select.projection = columns;
        }
        Ok(Statement::Select(select))
    }

    /// Compiles the query for `dialect`.
    ///
    /// # Errors
    ///
    /// Fails when the query has no base relation.
    pub fn compile(&self, dialect: &dyn Dialect) -> Result<CompiledStatement> {
        Ok(compile(&self.statement()?, dialect))
    }

    /// Renders the query for a dialect named `postgresql`, `mysql` or
    /// `sqlite`; other names fall back to postgresql. With `show_params`,
    /// parameters are inlined as literals.
    ///
    /// # Errors
    ///
    /// Fails when the query has no base relation.
    pub fn to_sql(&self, dialect: &str, show_params: bool) -> Result<String> {
        let statement = self.statement()?;
        let dialect = dialect_for_name(dialect);
        Ok(if show_params {
            compile_inline(&statement, dialect)
        } else {
            compile(&statement, dialect).sql
        })
    }

    /// [`Self::to_sql`] laid out one clause per line, with `ON`, `AND` and
    /// `OR` continuations indented by `indent` spaces.
    ///
    /// # Errors
    ///
    /// Fails when the query has no base relation.
    pub fn format_sql(&self, dialect: &str, show_params: bool, indent: usize) -> Result<String> {
        Ok(format_sql(&self.to_sql(dialect, show_params)?, indent))
    }
}
