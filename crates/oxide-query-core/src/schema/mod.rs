//! Relations: tables, aliases and subqueries that queries select from.
//!
//! The [`Table`] trait is implemented by `#[derive(Table)]`; runtime tables
//! (for example ones introspected from a database) are described with
//! [`Relation::table`] directly.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{QueryError, Result};
use crate::expr::Column;
use crate::statement::{CompoundSelect, SelectStatement, Statement};

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^[A-Za-z0-9_]+$").expect("identifier pattern is valid"));

/// Returns true when `name` only contains ASCII letters, digits and `_`.
#[must_use]
pub fn is_plain_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

/// Checks a schema name before it is used for table qualification.
///
/// # Errors
///
/// Returns [`QueryError::InvalidSchemaName`] for anything but letters, digits
/// and underscores.
pub fn validate_schema_name(name: &str) -> Result<()> {
    if is_plain_identifier(name) {
        Ok(())
    } else {
        Err(QueryError::InvalidSchemaName(String::from(name)))
    }
}

/// Trait for table metadata.
///
/// Implemented by `#[derive(Table)]` to provide table-level information.
pub trait Table {
    /// The SQL table name.
    const NAME: &'static str;

    /// The Rust type name, accepted as a table reference by the filter DSL.
    const TYPE_NAME: &'static str;

    /// List of all column names.
    const COLUMNS: &'static [&'static str];

    /// The primary key column name, if any.
    const PRIMARY_KEY: Option<&'static str>;

    /// Returns the relation describing this table.
    #[must_use]
    fn relation() -> Relation {
        let relation = Relation::table(Self::NAME)
            .with_type_name(Self::TYPE_NAME)
            .with_columns(Self::COLUMNS.iter().copied());
        match Self::PRIMARY_KEY {
            Some(pk) => relation.with_primary_key(pk),
            None => relation,
        }
    }
}

/// Where a relation's rows come from.
#[derive(Debug, Clone, PartialEq)]
pub enum RelationSource {
    /// A named table, optionally in a schema.
    Table {
        /// Schema qualifier.
        schema: Option<String>,
        /// Table name.
        name: String,
    },
    /// A derived table: a select or a compound select.
    Subquery(Box<Statement>),
}

/// A table, aliased table or aliased subquery.
#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    source: RelationSource,
    type_name: Option<String>,
    alias: Option<String>,
    columns: Vec<String>,
    primary_key: Option<String>,
}

impl Relation {
    /// Describes a named table with no known columns.
    #[must_use]
    pub fn table(name: &str) -> Self {
        Self {
            source: RelationSource::Table {
                schema: None,
                name: String::from(name),
            },
            type_name: None,
            alias: None,
            columns: Vec::new(),
            primary_key: None,
        }
    }

    /// Wraps a compiled select as a derived table named `alias`. Its columns
    /// are the select's named outputs.
    #[must_use]
    pub fn subquery(select: SelectStatement, alias: &str) -> Self {
        Self::derived(Statement::Select(select), alias)
    }

    /// Wraps a `UNION` as a derived table named `alias`. Its columns are
    /// those of the first member.
    #[must_use]
    pub fn compound(compound: CompoundSelect, alias: &str) -> Self {
        Self::derived(Statement::Compound(compound), alias)
    }

    fn derived(statement: Statement, alias: &str) -> Self {
        let columns = statement.output_columns();
        Self {
            source: RelationSource::Subquery(Box::new(statement)),
            type_name: None,
            alias: Some(String::from(alias)),
            columns,
            primary_key: None,
        }
    }

    /// Sets the column list.
    #[must_use]
    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the primary key column.
    #[must_use]
    pub fn with_primary_key(mut self, column: &str) -> Self {
        self.primary_key = Some(String::from(column));
        self
    }

    /// Sets the type name used in error listings and filter keys.
    #[must_use]
    pub fn with_type_name(mut self, name: &str) -> Self {
        self.type_name = Some(String::from(name));
        self
    }

    /// Returns the same relation under an alias.
    #[must_use]
    pub fn alias(mut self, alias: &str) -> Self {
        self.alias = Some(String::from(alias));
        self
    }

    /// Qualifies a table with a schema unless it already has one. Subqueries
    /// are returned unchanged.
    #[must_use]
    pub fn in_schema(mut self, schema: &str) -> Self {
        if let RelationSource::Table { schema: current, .. } = &mut self.source {
            if current.is_none() {
                *current = Some(String::from(schema));
            }
        }
        self
    }

    /// Where the rows come from.
    #[must_use]
    pub const fn source(&self) -> &RelationSource {
        &self.source
    }

    /// Table name, or the alias for subqueries.
    #[must_use]
    pub fn name(&self) -> &str {
        match &self.source {
            RelationSource::Table { name, .. } => name,
            RelationSource::Subquery(_) => self.alias.as_deref().unwrap_or_default(),
        }
    }

    /// Type name, if one was declared.
    #[must_use]
    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    /// Alias, if any.
    #[must_use]
    pub fn alias_name(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// The name columns of this relation are qualified with.
    #[must_use]
    pub fn qualifier(&self) -> &str {
        self.alias.as_deref().unwrap_or_else(|| self.name())
    }

    /// Known column names.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Primary key column name.
    #[must_use]
    pub fn primary_key(&self) -> Option<&str> {
        self.primary_key.as_deref()
    }

    /// Whether this relation is a derived table.
    #[must_use]
    pub const fn is_subquery(&self) -> bool {
        matches!(self.source, RelationSource::Subquery(_))
    }

    /// Whether `name` is one of the known columns.
    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// A column of this relation, qualified with [`Self::qualifier`]. No
    /// existence check is made.
    #[must_use]
    pub fn col(&self, name: &str) -> Column {
        Column::qualified(self.qualifier(), name)
    }

    /// A column of this relation, checked against the known columns.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::UnknownColumn`] when the column is not declared.
    pub fn column(&self, name: &str) -> Result<Column> {
        if self.has_column(name) {
            Ok(self.col(name))
        } else {
            Err(QueryError::UnknownColumn {
                column: String::from(name),
                table: String::from(self.qualifier()),
            })
        }
    }

    /// The primary key column.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::MissingPrimaryKey`] when none is declared.
    pub fn primary_key_column(&self) -> Result<Column> {
        self.primary_key()
            .map(|pk| self.col(pk))
            .ok_or_else(|| QueryError::MissingPrimaryKey(String::from(self.qualifier())))
    }

    /// Whether a `table.column` key may address this relation: the alias,
    /// table name or type name, all compared case-insensitively.
    #[must_use]
    pub fn answers_to(&self, reference: &str) -> bool {
        if self
            .alias
            .as_deref()
            .is_some_and(|alias| alias.eq_ignore_ascii_case(reference))
        {
            return true;
        }
        if self.is_subquery() {
            return false;
        }
        self.name().eq_ignore_ascii_case(reference)
            || self
                .type_name
                .as_deref()
                .is_some_and(|t| t.eq_ignore_ascii_case(reference))
    }

    /// Label used when listing available relations in error messages:
    /// `TypeName(table)` for tables, `subquery(alias)` for derived tables.
    #[must_use]
    pub fn describe(&self) -> String {
        if self.is_subquery() {
            return format!("subquery({})", self.qualifier());
        }
        let type_name = self.type_name.as_deref().unwrap_or_else(|| self.name());
        match &self.alias {
            Some(alias) => format!("{type_name}({} AS {alias})", self.name()),
            None => format!("{type_name}({})", self.name()),
        }
    }
}
