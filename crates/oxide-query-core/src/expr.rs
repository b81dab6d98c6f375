//! Expression tree for predicates, projections and orderings.
//!
//! Expressions are plain data: they are rendered to SQL text and a parameter
//! list by [`crate::render`] for a concrete dialect.

use crate::statement::Statement;
use crate::value::{SqlValue, ToSqlValue};

/// Creates an unqualified column reference.
#[must_use]
pub fn col(name: &str) -> Column {
    Column {
        table: None,
        name: String::from(name),
    }
}

/// A column reference, optionally qualified by a table name or alias.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Column {
    /// Optional table qualifier.
    pub table: Option<String>,
    /// Column name.
    pub name: String,
}

impl From<&str> for Column {
    fn from(name: &str) -> Self {
        col(name)
    }
}

impl Column {
    /// Creates a qualified column reference.
    #[must_use]
    pub fn qualified(table: &str, name: &str) -> Self {
        Self {
            table: Some(String::from(table)),
            name: String::from(name),
        }
    }

    /// Creates an equality expression.
    #[must_use]
    pub fn eq<T: ToSqlValue>(self, value: T) -> Expr {
        Expr::binary(self.into(), BinaryOp::Eq, Expr::value(value))
    }

    /// Creates an inequality expression.
    #[must_use]
    pub fn not_eq<T: ToSqlValue>(self, value: T) -> Expr {
        Expr::binary(self.into(), BinaryOp::NotEq, Expr::value(value))
    }

    /// Creates a less-than expression.
    #[must_use]
    pub fn lt<T: ToSqlValue>(self, value: T) -> Expr {
        Expr::binary(self.into(), BinaryOp::Lt, Expr::value(value))
    }

    /// Creates a less-than-or-equal expression.
    #[must_use]
    pub fn lt_eq<T: ToSqlValue>(self, value: T) -> Expr {
        Expr::binary(self.into(), BinaryOp::LtEq, Expr::value(value))
    }

    /// Creates a greater-than expression.
    #[must_use]
    pub fn gt<T: ToSqlValue>(self, value: T) -> Expr {
        Expr::binary(self.into(), BinaryOp::Gt, Expr::value(value))
    }

    /// Creates a greater-than-or-equal expression.
    #[must_use]
    pub fn gt_eq<T: ToSqlValue>(self, value: T) -> Expr {
        Expr::binary(self.into(), BinaryOp::GtEq, Expr::value(value))
    }

    /// Compares this column with another column.
    #[must_use]
    pub fn eq_col(self, other: Self) -> Expr {
        Expr::binary(self.into(), BinaryOp::Eq, other.into())
    }

    /// Creates an IS NULL expression.
    #[must_use]
    pub fn is_null(self) -> Expr {
        Expr::IsNull {
            expr: Box::new(self.into()),
            negated: false,
        }
    }

    /// Creates an IS NOT NULL expression.
    #[must_use]
    pub fn is_not_null(self) -> Expr {
        Expr::IsNull {
            expr: Box::new(self.into()),
            negated: true,
        }
    }

    /// Identity comparison (`IS value`), null-safe on every dialect.
    #[must_use]
    pub fn is<T: ToSqlValue>(self, value: T) -> Expr {
        Expr::identity(self.into(), value.to_sql_value(), false)
    }

    /// Negated identity comparison (`IS NOT value`).
    #[must_use]
    pub fn is_not<T: ToSqlValue>(self, value: T) -> Expr {
        Expr::identity(self.into(), value.to_sql_value(), true)
    }

    /// Creates a LIKE expression with a caller-supplied pattern.
    #[must_use]
    pub fn like<T: ToSqlValue>(self, pattern: T) -> Expr {
        Expr::like(self.into(), pattern.to_sql_value(), false, false)
    }

    /// Creates a NOT LIKE expression.
    #[must_use]
    pub fn not_like<T: ToSqlValue>(self, pattern: T) -> Expr {
        Expr::like(self.into(), pattern.to_sql_value(), false, true)
    }

    /// Creates a case-insensitive LIKE expression with a caller-supplied pattern.
    #[must_use]
    pub fn ilike<T: ToSqlValue>(self, pattern: T) -> Expr {
        Expr::like(self.into(), pattern.to_sql_value(), true, false)
    }

    /// Case-sensitive substring match, rendered by
    /// [`crate::dialect::Dialect::contains`]. `%` and `_` in the value match
    /// literally.
    #[must_use]
    pub fn contains<T: ToSqlValue>(self, value: T) -> Expr {
        Expr::Contains {
            expr: Box::new(self.into()),
            needle: SqlValue::Text(value.to_sql_value().to_pattern_text()),
        }
    }

    /// Case-insensitive substring match (`ILIKE '%v%'`).
    #[must_use]
    pub fn icontains<T: ToSqlValue>(self, value: T) -> Expr {
        let text = value.to_sql_value().to_pattern_text();
        self.ilike(format!("%{text}%"))
    }

    /// Prefix match (`LIKE 'v%'`).
    #[must_use]
    pub fn starts_with<T: ToSqlValue>(self, value: T) -> Expr {
        let text = value.to_sql_value().to_pattern_text();
        self.like(format!("{text}%"))
    }

    /// Suffix match (`LIKE '%v'`).
    #[must_use]
    pub fn ends_with<T: ToSqlValue>(self, value: T) -> Expr {
        let text = value.to_sql_value().to_pattern_text();
        self.like(format!("%{text}"))
    }

    /// Regular-expression match.
    #[must_use]
    pub fn regexp<T: ToSqlValue>(self, pattern: T) -> Expr {
        Expr::Regexp {
            expr: Box::new(self.into()),
            pattern: pattern.to_sql_value(),
        }
    }

    /// Creates a BETWEEN expression.
    #[must_use]
    pub fn between<T: ToSqlValue, U: ToSqlValue>(self, low: T, high: U) -> Expr {
        Expr::Between {
            expr: Box::new(self.into()),
            low: low.to_sql_value(),
            high: high.to_sql_value(),
            negated: false,
        }
    }

    /// Creates a NOT BETWEEN expression.
    #[must_use]
    pub fn not_between<T: ToSqlValue, U: ToSqlValue>(self, low: T, high: U) -> Expr {
        Expr::Between {
            expr: Box::new(self.into()),
            low: low.to_sql_value(),
            high: high.to_sql_value(),
            negated: true,
        }
    }

    /// Creates an IN expression.
    #[must_use]
    pub fn in_list<T: ToSqlValue>(self, values: Vec<T>) -> Expr {
        Expr::in_list(
            self.into(),
            values.into_iter().map(ToSqlValue::to_sql_value).collect(),
            false,
        )
    }

    /// Creates a NOT IN expression.
    #[must_use]
    pub fn not_in_list<T: ToSqlValue>(self, values: Vec<T>) -> Expr {
        Expr::in_list(
            self.into(),
            values.into_iter().map(ToSqlValue::to_sql_value).collect(),
            true,
        )
    }

    /// Membership in the rows produced by a subquery, which may be a UNION.
    #[must_use]
    pub fn in_subquery(self, subquery: impl Into<Statement>) -> Expr {
        Expr::InSubquery {
            expr: Box::new(self.into()),
            subquery: Box::new(subquery.into()),
            negated: false,
        }
    }

    /// Ascending ordering on this column.
    #[must_use]
    pub fn asc(self) -> OrderBy {
        OrderBy::asc(self.into())
    }

    /// Descending ordering on this column.
    #[must_use]
    pub fn desc(self) -> OrderBy {
        OrderBy::desc(self.into())
    }

    /// Projects this column under another name.
    #[must_use]
    pub fn alias(self, alias: &str) -> SelectItem {
        Expr::from(self).alias(alias)
    }
}

/// Binary comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `=`
    Eq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
}

impl BinaryOp {
    /// Returns the SQL operator token.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
        }
    }
}

/// A SQL expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A column reference.
    Column(Column),
    /// A bound value.
    Value(SqlValue),
    /// `*` or `table.*`.
    Wildcard(Option<String>),
    /// A comparison.
    Binary {
        /// Left operand.
        left: Box<Expr>,
        /// Operator.
        op: BinaryOp,
        /// Right operand.
        right: Box<Expr>,
    },
    /// Conjunction of all members.
    And(Vec<Expr>),
    /// Disjunction of all members.
    Or(Vec<Expr>),
    /// Negation.
    Not(Box<Expr>),
    /// Explicit parentheses.
    Nested(Box<Expr>),
    /// `IS [NOT] NULL`.
    IsNull {
        /// Operand.
        expr: Box<Expr>,
        /// `IS NOT NULL` when true.
        negated: bool,
    },
    /// Null-safe identity comparison against a value.
    Identity {
        /// Operand.
        expr: Box<Expr>,
        /// Compared value.
        value: SqlValue,
        /// `IS NOT` when true.
        negated: bool,
    },
    /// `[NOT] IN (values)`.
    InList {
        /// Operand.
        expr: Box<Expr>,
        /// Members.
        list: Vec<SqlValue>,
        /// `NOT IN` when true.
        negated: bool,
    },
    /// `[NOT] IN (SELECT ...)`.
    InSubquery {
        /// Operand.
        expr: Box<Expr>,
        /// The subquery, a SELECT or a compound.
        subquery: Box<Statement>,
        /// `NOT IN` when true.
        negated: bool,
    },
    /// `[NOT] EXISTS (SELECT ...)`.
    Exists {
        /// The subquery, a SELECT or a compound.
        subquery: Box<Statement>,
        /// `NOT EXISTS` when true.
        negated: bool,
    },
    /// `[NOT] BETWEEN low AND high`.
    Between {
        /// Operand.
        expr: Box<Expr>,
        /// Lower bound.
        low: SqlValue,
        /// Upper bound.
        high: SqlValue,
        /// `NOT BETWEEN` when true.
        negated: bool,
    },
    /// Pattern match.
    Like {
        /// Operand.
        expr: Box<Expr>,
        /// Pattern value.
        pattern: SqlValue,
        /// Case-insensitive match.
        case_insensitive: bool,
        /// `NOT LIKE` when true.
        negated: bool,
    },
    /// Case-sensitive substring test.
    Contains {
        /// Operand.
        expr: Box<Expr>,
        /// Substring, matched literally.
        needle: SqlValue,
    },
    /// Regular-expression match.
    Regexp {
        /// Operand.
        expr: Box<Expr>,
        /// Pattern value.
        pattern: SqlValue,
    },
    /// A function call such as `COUNT(DISTINCT x)`.
    Function {
        /// Function name, rendered verbatim.
        name: String,
        /// Arguments.
        args: Vec<Expr>,
        /// Prefix the arguments with `DISTINCT`.
        distinct: bool,
    },
    /// Raw SQL with `?` placeholders for `params`.
    ///
    /// **Warning**: Only use this for SQL fragments that don't contain user input.
    Raw {
        /// SQL fragment.
        sql: String,
        /// Values bound to the fragment's `?` markers, in order.
        params: Vec<SqlValue>,
    },
}

impl From<Column> for Expr {
    fn from(column: Column) -> Self {
        Self::Column(column)
    }
}

impl From<SqlValue> for Expr {
    fn from(value: SqlValue) -> Self {
        Self::Value(value)
    }
}

impl Expr {
    /// Creates a value expression (parameterized).
    #[must_use]
    pub fn value<T: ToSqlValue>(value: T) -> Self {
        Self::Value(value.to_sql_value())
    }

    /// Creates an expression from raw SQL.
    #[must_use]
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::Raw {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Creates a raw SQL fragment with bound values for its `?` markers.
    #[must_use]
    pub fn raw_with(sql: impl Into<String>, params: Vec<SqlValue>) -> Self {
        Self::Raw {
            sql: sql.into(),
            params,
        }
    }

    fn binary(left: Self, op: BinaryOp, right: Self) -> Self {
        Self::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    fn identity(expr: Self, value: SqlValue, negated: bool) -> Self {
        if value.is_null() {
            return Self::IsNull {
                expr: Box::new(expr),
                negated,
            };
        }
        Self::Identity {
            expr: Box::new(expr),
            value,
            negated,
        }
    }

    fn like(expr: Self, pattern: SqlValue, case_insensitive: bool, negated: bool) -> Self {
        Self::Like {
            expr: Box::new(expr),
            pattern,
            case_insensitive,
            negated,
        }
    }

    fn in_list(expr: Self, list: Vec<SqlValue>, negated: bool) -> Self {
        Self::InList {
            expr: Box::new(expr),
            list,
            negated,
        }
    }

    /// `EXISTS (subquery)`.
    #[must_use]
    pub fn exists(subquery: impl Into<Statement>) -> Self {
        Self::Exists {
            subquery: Box::new(subquery.into()),
            negated: false,
        }
    }

    /// `NOT EXISTS (subquery)`.
    #[must_use]
    pub fn not_exists(subquery: impl Into<Statement>) -> Self {
        Self::Exists {
            subquery: Box::new(subquery.into()),
            negated: true,
        }
    }

    /// Creates an AND expression.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        match self {
            Self::And(mut items) => {
                items.push(other);
                Self::And(items)
            }
            first => Self::And(vec![first, other]),
        }
    }

    /// Creates an OR expression.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        match self {
            Self::Or(mut items) => {
                items.push(other);
                Self::Or(items)
            }
            first => Self::Or(vec![first, other]),
        }
    }

    /// Wraps the expression in parentheses.
    #[must_use]
    pub fn paren(self) -> Self {
        Self::Nested(Box::new(self))
    }

    /// Negates the expression with NOT.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Projects this expression under a name.
    #[must_use]
    pub fn alias(self, alias: &str) -> SelectItem {
        SelectItem {
            expr: self,
            alias: Some(String::from(alias)),
        }
    }

    /// Combines expressions with AND; `None` when empty, the lone member when
    /// there is only one.
    #[must_use]
    pub fn all(mut items: Vec<Self>) -> Option<Self> {
        match items.len() {
            0 => None,
            1 => items.pop(),
            _ => Some(Self::And(items)),
        }
    }

    /// Combines expressions with OR; `None` when empty, the lone member when
    /// there is only one.
    #[must_use]
    pub fn any(mut items: Vec<Self>) -> Option<Self> {
        match items.len() {
            0 => None,
            1 => items.pop(),
            _ => Some(Self::Or(items)),
        }
    }

    /// Name this expression contributes to a result row, when it has one.
    #[must_use]
    pub fn output_name(&self) -> Option<&str> {
        match self {
            Self::Column(column) => Some(&column.name),
            _ => None,
        }
    }
}

/// `COUNT(*)`.
#[must_use]
pub fn count_all() -> Expr {
    function("COUNT", vec![Expr::Wildcard(None)], false)
}

/// `COUNT(expr)`.
#[must_use]
pub fn count(expr: impl Into<Expr>) -> Expr {
    function("COUNT", vec![expr.into()], false)
}

/// `COUNT(DISTINCT expr)`.
#[must_use]
pub fn count_distinct(expr: impl Into<Expr>) -> Expr {
    function("COUNT", vec![expr.into()], true)
}

/// `SUM(expr)`.
#[must_use]
pub fn sum(expr: impl Into<Expr>) -> Expr {
    function("SUM", vec![expr.into()], false)
}

/// `AVG(expr)`.
#[must_use]
pub fn avg(expr: impl Into<Expr>) -> Expr {
    function("AVG", vec![expr.into()], false)
}

/// `MAX(expr)`.
#[must_use]
pub fn max(expr: impl Into<Expr>) -> Expr {
    function("MAX", vec![expr.into()], false)
}

/// `MIN(expr)`.
#[must_use]
pub fn min(expr: impl Into<Expr>) -> Expr {
    function("MIN", vec![expr.into()], false)
}

/// An arbitrary function call.
#[must_use]
pub fn function(name: &str, args: Vec<Expr>, distinct: bool) -> Expr {
    Expr::Function {
        name: String::from(name),
        args,
        distinct,
    }
}

/// One entry of a projection list.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectItem {
    /// Projected expression.
    pub expr: Expr,
    /// Optional `AS` name.
    pub alias: Option<String>,
}

impl SelectItem {
    /// Name of the resulting column, when it can be known without executing.
    #[must_use]
    pub fn output_name(&self) -> Option<&str> {
        self.alias.as_deref().or_else(|| self.expr.output_name())
    }
}

impl From<Expr> for SelectItem {
    fn from(expr: Expr) -> Self {
        Self { expr, alias: None }
    }
}

impl From<Column> for SelectItem {
    fn from(column: Column) -> Self {
        Self {
            expr: column.into(),
            alias: None,
        }
    }
}

/// Order direction for sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    /// Ascending order (ASC)
    Asc,
    /// Descending order (DESC)
    Desc,
}

/// An ordering specification.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    /// Sort key.
    pub expr: Expr,
    /// Order direction.
    pub direction: OrderDirection,
}

impl OrderBy {
    /// Creates a new ascending order specification.
    #[must_use]
    pub const fn asc(expr: Expr) -> Self {
        Self {
            expr,
            direction: OrderDirection::Asc,
        }
    }

    /// Creates a new descending order specification.
    #[must_use]
    pub const fn desc(expr: Expr) -> Self {
        Self {
            expr,
            direction: OrderDirection::Desc,
        }
    }
}

impl From<Column> for OrderBy {
    fn from(column: Column) -> Self {
        Self::asc(column.into())
    }
}

impl From<Expr> for OrderBy {
    fn from(expr: Expr) -> Self {
        Self::asc(expr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comparisons_build_binary_nodes() {
        let expr = Column::qualified("users", "age").gt(18);
        assert_eq!(
            expr,
            Expr::Binary {
                left: Box::new(Expr::Column(Column::qualified("users", "age"))),
                op: BinaryOp::Gt,
                right: Box::new(Expr::Value(SqlValue::Int(18))),
            }
        );
    }

    #[test]
    fn test_is_with_null_becomes_is_null() {
        assert_eq!(
            col("deleted_at").is(SqlValue::Null),
            col("deleted_at").is_null()
        );
        assert_eq!(
            col("deleted_at").is_not(SqlValue::Null),
            col("deleted_at").is_not_null()
        );
    }

    #[test]
    fn test_pattern_helpers_wrap_value() {
        let Expr::Like { pattern, case_insensitive, .. } = col("title").icontains("rust") else {
            panic!("expected LIKE");
        };
        assert_eq!(pattern, SqlValue::Text(String::from("%rust%")));
        assert!(case_insensitive);

        let Expr::Like { pattern, .. } = col("title").starts_with("ru") else {
            panic!("expected LIKE");
        };
        assert_eq!(pattern, SqlValue::Text(String::from("ru%")));

        let Expr::Like { pattern, .. } = col("title").ends_with(5) else {
            panic!("expected LIKE");
        };
        assert_eq!(pattern, SqlValue::Text(String::from("%5")));

        let Expr::Contains { needle, .. } = col("title").contains("Ru%") else {
            panic!("expected containment");
        };
        assert_eq!(needle, SqlValue::Text(String::from("Ru%")));
    }

    #[test]
    fn test_and_or_flatten_chains() {
        let expr = col("a").eq(1).and(col("b").eq(2)).and(col("c").eq(3));
        let Expr::And(items) = expr else {
            panic!("expected AND");
        };
        assert_eq!(items.len(), 3);

        let expr = col("a").eq(1).or(col("b").eq(2));
        assert!(matches!(expr, Expr::Or(ref items) if items.len() == 2));
    }

    #[test]
    fn test_all_and_any_collapse_single_members() {
        assert_eq!(Expr::all(Vec::new()), None);
        assert_eq!(Expr::all(vec![col("a").eq(1)]), Some(col("a").eq(1)));
        assert!(matches!(
            Expr::any(vec![col("a").eq(1), col("b").eq(1)]),
            Some(Expr::Or(_))
        ));
    }

    #[test]
    fn test_select_item_output_name() {
        assert_eq!(SelectItem::from(col("email")).output_name(), Some("email"));
        assert_eq!(count_all().alias("total").output_name(), Some("total"));
        assert_eq!(SelectItem::from(count_all()).output_name(), None);
    }
}
