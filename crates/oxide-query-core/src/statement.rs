//! Statement tree produced by the query compiler and consumed by the renderer.

use crate::expr::{Expr, OrderBy, SelectItem};
use crate::schema::Relation;
use crate::value::SqlValue;

/// Join kinds accepted by the builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// `INNER JOIN`
    Inner,
    /// `LEFT OUTER JOIN`
    Left,
    /// Right outer join, rendered as a left outer join with operands swapped.
    Right,
    /// `FULL OUTER JOIN`
    Full,
}

/// A join recorded on a query: target relation, kind and ON condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    /// Join kind.
    pub kind: JoinKind,
    /// Joined table, alias or subquery.
    pub relation: Relation,
    /// ON condition.
    pub on: Expr,
}

/// Join operators as they appear in rendered SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOperator {
    /// `INNER JOIN`
    Inner,
    /// `LEFT OUTER JOIN`
    LeftOuter,
    /// `FULL OUTER JOIN`
    FullOuter,
}

impl JoinOperator {
    /// Returns the SQL keywords.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::LeftOuter => "LEFT OUTER JOIN",
            Self::FullOuter => "FULL OUTER JOIN",
        }
    }
}

/// The FROM clause: a relation or a (possibly nested) join tree.
#[derive(Debug, Clone, PartialEq)]
pub enum FromItem {
    /// A single table, alias or subquery.
    Relation(Relation),
    /// `left <op> right ON on`.
    Join {
        /// Left operand.
        left: Box<FromItem>,
        /// Right operand; parenthesized when it is itself a join.
        right: Box<FromItem>,
        /// Join operator.
        operator: JoinOperator,
        /// ON condition.
        on: Expr,
    },
}

impl FromItem {
    /// Builds a join node.
    #[must_use]
    pub fn join(left: Self, right: Self, operator: JoinOperator, on: Expr) -> Self {
        Self::Join {
            left: Box::new(left),
            right: Box::new(right),
            operator,
            on,
        }
    }
}

/// A SELECT statement.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    /// `SELECT DISTINCT`.
    pub distinct: bool,
    /// Projection list.
    pub projection: Vec<SelectItem>,
    /// FROM clause.
    pub from: FromItem,
    /// WHERE clause.
    pub selection: Option<Expr>,
    /// GROUP BY keys.
    pub group_by: Vec<Expr>,
    /// HAVING clause.
    pub having: Option<Expr>,
    /// ORDER BY keys.
    pub order_by: Vec<OrderBy>,
    /// LIMIT.
    pub limit: Option<u64>,
    /// OFFSET.
    pub offset: Option<u64>,
}

impl SelectStatement {
    /// Creates `SELECT * FROM from` with no other clauses.
    #[must_use]
    pub fn from(from: FromItem) -> Self {
        Self {
            distinct: false,
            projection: vec![SelectItem::from(Expr::Wildcard(None))],
            from,
            selection: None,
            group_by: Vec::new(),
            having: None,
            order_by: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// Names of the columns this statement produces, in order. Projections
    /// without a knowable name are skipped.
    #[must_use]
    pub fn output_columns(&self) -> Vec<String> {
        self.projection
            .iter()
            .filter_map(SelectItem::output_name)
            .map(String::from)
            .collect()
    }

    /// Whether ordering or paging is attached to this statement.
    #[must_use]
    pub fn is_windowed(&self) -> bool {
        !self.order_by.is_empty() || self.limit.is_some() || self.offset.is_some()
    }
}

/// `first UNION [ALL] member ...`, with ordering and paging applied to the
/// combined result.
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundSelect {
    /// First member.
    pub first: SelectStatement,
    /// Following members.
    pub members: Vec<SelectStatement>,
    /// `UNION ALL` instead of `UNION`.
    pub all: bool,
    /// ORDER BY of the compound.
    pub order_by: Vec<OrderBy>,
    /// LIMIT of the compound.
    pub limit: Option<u64>,
    /// OFFSET of the compound.
    pub offset: Option<u64>,
}

/// `INSERT INTO table (columns) VALUES (...), (...) [RETURNING ...]`.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    /// Target table.
    pub table: Relation,
    /// Column list.
    pub columns: Vec<String>,
    /// One value list per row, aligned with `columns`.
    pub rows: Vec<Vec<SqlValue>>,
    /// RETURNING columns; empty for no RETURNING clause.
    pub returning: Vec<String>,
}

/// `UPDATE table SET ... WHERE ...`.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStatement {
    /// Target table.
    pub table: Relation,
    /// Assignments, in payload order.
    pub assignments: Vec<(String, SqlValue)>,
    /// WHERE clause.
    pub selection: Option<Expr>,
}

/// `DELETE FROM table WHERE ...`.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStatement {
    /// Target table.
    pub table: Relation,
    /// WHERE clause.
    pub selection: Option<Expr>,
}

/// Any statement the renderer understands.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// SELECT.
    Select(SelectStatement),
    /// UNION / UNION ALL.
    Compound(CompoundSelect),
    /// INSERT.
    Insert(InsertStatement),
    /// UPDATE.
    Update(UpdateStatement),
    /// DELETE.
    Delete(DeleteStatement),
}

impl From<SelectStatement> for Statement {
    fn from(select: SelectStatement) -> Self {
        Self::Select(select)
    }
}

impl From<CompoundSelect> for Statement {
    fn from(compound: CompoundSelect) -> Self {
        Self::Compound(compound)
    }
}

impl Statement {
    /// Output column names of a SELECT or UNION; empty for mutations.
    #[must_use]
    pub fn output_columns(&self) -> Vec<String> {
        match self {
            Self::Select(select) => select.output_columns(),
            Self::Compound(compound) => compound.first.output_columns(),
            Self::Insert(_) | Self::Update(_) | Self::Delete(_) => Vec::new(),
        }
    }
}

/// Rendered SQL text plus its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledStatement {
    /// SQL text with dialect placeholders.
    pub sql: String,
    /// Parameters in placeholder order.
    pub params: Vec<SqlValue>,
}

impl CompiledStatement {
    /// A statement without parameters, such as DDL or transaction control.
    #[must_use]
    pub fn raw(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }
}
