//! The operator table of the filter DSL.

use std::fmt;
use std::str::FromStr;

use crate::error::{QueryError, Result};
use crate::expr::{Column, Expr};
use crate::value::{FilterValue, SqlValue};

/// Operators accepted after `__` in a filter key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `eq`
    Eq,
    /// `ne` / `neq`
    Ne,
    /// `gt`
    Gt,
    /// `gte`
    Gte,
    /// `lt`
    Lt,
    /// `lte`
    Lte,
    /// `like`: case-insensitive containment.
    Like,
    /// `icontains`: case-insensitive containment.
    IContains,
    /// `in`
    In,
    /// `notin`
    NotIn,
    /// `is`
    Is,
    /// `isnot` / `not`
    IsNot,
    /// `isnull`
    IsNull,
    /// `notnull`
    NotNull,
    /// `startswith`
    StartsWith,
    /// `endswith`
    EndsWith,
    /// `contains`: case-sensitive containment.
    Contains,
    /// `regexp`
    Regexp,
    /// `between`
    Between,
    /// `not_between`
    NotBetween,
}

impl FromStr for Operator {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "eq" => Self::Eq,
            "ne" | "neq" => Self::Ne,
            "gt" => Self::Gt,
            "gte" => Self::Gte,
            "lt" => Self::Lt,
            "lte" => Self::Lte,
            "like" => Self::Like,
            "icontains" => Self::IContains,
            "in" => Self::In,
            "notin" => Self::NotIn,
            "is" => Self::Is,
            "isnot" | "not" => Self::IsNot,
            "isnull" => Self::IsNull,
            "notnull" => Self::NotNull,
            "startswith" => Self::StartsWith,
            "endswith" => Self::EndsWith,
            "contains" => Self::Contains,
            "regexp" => Self::Regexp,
            "between" => Self::Between,
            "not_between" => Self::NotBetween,
            other => return Err(QueryError::UnsupportedOperator(String::from(other))),
        })
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Like => "like",
            Self::IContains => "icontains",
            Self::In => "in",
            Self::NotIn => "notin",
            Self::Is => "is",
            Self::IsNot => "isnot",
            Self::IsNull => "isnull",
            Self::NotNull => "notnull",
            Self::StartsWith => "startswith",
            Self::EndsWith => "endswith",
            Self::Contains => "contains",
            Self::Regexp => "regexp",
            Self::Between => "between",
            Self::NotBetween => "not_between",
        };
        f.write_str(name)
    }
}

impl Operator {
    /// Builds the predicate for `column <op> value`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidRange`] when a range operator does not get
    /// exactly two values and [`QueryError::InvalidFilterValue`] when a scalar
    /// operator gets a list.
    pub fn apply(self, column: Column, value: FilterValue) -> Result<Expr> {
        Ok(match self {
            Self::Eq => column.eq(self.scalar(value)?),
            Self::Ne => column.not_eq(self.scalar(value)?),
            Self::Gt => column.gt(self.scalar(value)?),
            Self::Gte => column.gt_eq(self.scalar(value)?),
            Self::Lt => column.lt(self.scalar(value)?),
            Self::Lte => column.lt_eq(self.scalar(value)?),
            Self::Like | Self::IContains => column.icontains(self.scalar(value)?),
            Self::In => column.in_list(value.into_list()),
            Self::NotIn => column.not_in_list(value.into_list()),
            Self::Is => column.is(self.scalar(value)?),
            Self::IsNot => column.is_not(self.scalar(value)?),
            Self::IsNull => column.is_null(),
            Self::NotNull => column.is_not_null(),
            Self::StartsWith => column.starts_with(self.scalar(value)?),
            Self::EndsWith => column.ends_with(self.scalar(value)?),
            Self::Contains => column.contains(self.scalar(value)?),
            Self::Regexp => column.regexp(self.scalar(value)?),
            Self::Between => {
                let (low, high) = self.bounds(value)?;
                column.between(low, high)
            }
            Self::NotBetween => {
                let (low, high) = self.bounds(value)?;
                column.not_between(low, high)
            }
        })
    }

    fn scalar(self, value: FilterValue) -> Result<SqlValue> {
        match value {
            FilterValue::Null => Ok(SqlValue::Null),
            FilterValue::Scalar(v) => Ok(v),
            FilterValue::List(_) => Err(QueryError::InvalidFilterValue {
                operator: self.to_string(),
            }),
        }
    }

    fn bounds(self, value: FilterValue) -> Result<(SqlValue, SqlValue)> {
        let values = value.into_list();
        let got = values.len();
        let mut values = values.into_iter();
        match (values.next(), values.next(), values.next()) {
            (Some(low), Some(high), None) => Ok((low, high)),
            _ => Err(QueryError::InvalidRange {
                operator: self.to_string(),
                got,
            }),
        }
    }
}
