//! Renders statement trees to SQL text for a dialect.
//!
//! Parameters are collected left to right in the order their placeholders
//! appear in the text, so the same statement always renders to the same
//! output.

use crate::dialect::Dialect;
use crate::expr::{Column, Expr, OrderBy, OrderDirection, SelectItem};
use crate::schema::{Relation, RelationSource};
use crate::statement::{
    CompiledStatement, CompoundSelect, DeleteStatement, FromItem, InsertStatement,
    SelectStatement, Statement, UpdateStatement,
};
use crate::value::SqlValue;

/// Renders a statement with dialect placeholders and collects its parameters.
#[must_use]
pub fn compile(statement: &Statement, dialect: &dyn Dialect) -> CompiledStatement {
    let mut renderer = Renderer::new(dialect, false);
    let sql = renderer.statement(statement);
    CompiledStatement {
        sql,
        params: renderer.params,
    }
}

/// Renders a statement with every parameter inlined as an escaped literal.
///
/// Meant for logging and debugging; execute [`compile`] output instead.
#[must_use]
pub fn compile_inline(statement: &Statement, dialect: &dyn Dialect) -> String {
    Renderer::new(dialect, true).statement(statement)
}

/// Keywords that start a new line at the top level of a statement.
const CLAUSES: [&str; 13] = [
    "SELECT",
    "FROM",
    "INNER JOIN",
    "LEFT OUTER JOIN",
    "FULL OUTER JOIN",
    "WHERE",
    "GROUP BY",
    "HAVING",
    "ORDER BY",
    "LIMIT",
    "OFFSET",
    "UNION ALL",
    "UNION",
];

/// Keywords that start an indented continuation line.
const CONTINUATIONS: [&str; 3] = ["ON", "AND", "OR"];

/// Lays out rendered SQL one clause per line, with `ON`, `AND` and `OR`
/// continuations indented by `indent` spaces.
///
/// Only top-level keywords break lines: text inside parentheses, quoted
/// identifiers and string literals stays as rendered, as does the `AND` of
/// a `BETWEEN`.
#[must_use]
pub fn format_sql(sql: &str, indent: usize) -> String {
    let mut lines: Vec<(usize, &str)> = Vec::new();
    let mut start = 0;
    let mut level = 0;
    let mut depth = 0_usize;
    let mut quote: Option<char> = None;
    let mut in_between = false;
    for (i, ch) in sql.char_indices() {
        match (quote, ch) {
            (Some(open), _) if ch == open => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"' | '`') => quote = Some(ch),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, ' ') if depth == 0 => {
                let tail = &sql[i + 1..];
                if starts_with_keyword(tail, "BETWEEN") {
                    in_between = true;
                } else if in_between && starts_with_keyword(tail, "AND") {
                    in_between = false;
                } else if let Some(next) = line_level(tail) {
                    lines.push((level, &sql[start..i]));
                    start = i + 1;
                    level = next;
                }
            }
            _ => {}
        }
    }
    lines.push((level, &sql[start..]));

    let pad = " ".repeat(indent);
    lines
        .into_iter()
        .map(|(level, line)| format!("{}{line}", pad.repeat(level)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn starts_with_keyword(text: &str, keyword: &str) -> bool {
    text.strip_prefix(keyword)
        .is_some_and(|rest| rest.starts_with(' '))
}

fn line_level(tail: &str) -> Option<usize> {
    if CLAUSES.iter().any(|k| starts_with_keyword(tail, k)) {
        Some(0)
    } else if CONTINUATIONS.iter().any(|k| starts_with_keyword(tail, k)) {
        Some(1)
    } else {
        None
    }
}

struct Renderer<'d> {
    dialect: &'d dyn Dialect,
    inline: bool,
    unqualified: bool,
    params: Vec<SqlValue>,
}

impl<'d> Renderer<'d> {
    fn new(dialect: &'d dyn Dialect, inline: bool) -> Self {
        Self {
            dialect,
            inline,
            unqualified: false,
            params: Vec::new(),
        }
    }

    fn statement(&mut self, statement: &Statement) -> String {
        match statement {
            Statement::Select(select) => self.select(select),
            Statement::Compound(compound) => self.compound(compound),
            Statement::Insert(insert) => self.insert(insert),
            Statement::Update(update) => self.update(update),
            Statement::Delete(delete) => self.delete(delete),
        }
    }

    fn quote(&self, name: &str) -> String {
        self.dialect.quote_identifier(name)
    }

    fn bind(&mut self, value: &SqlValue) -> String {
        if self.inline {
            return value.to_sql_inline();
        }
        self.params.push(value.clone());
        self.dialect.placeholder(self.params.len())
    }

    fn select(&mut self, select: &SelectStatement) -> String {
        let mut sql = String::from("SELECT ");
        if select.distinct {
            sql.push_str("DISTINCT ");
        }
        let items: Vec<String> = select
            .projection
            .iter()
            .map(|item| self.select_item(item))
            .collect();
        sql.push_str(&items.join(", "));

        sql.push_str(" FROM ");
        let from = self.from_item(&select.from);
        sql.push_str(&from);

        if let Some(selection) = &select.selection {
            sql.push_str(" WHERE ");
            let selection = self.expr(selection);
            sql.push_str(&selection);
        }

        if !select.group_by.is_empty() {
            let keys: Vec<String> = select.group_by.iter().map(|e| self.expr(e)).collect();
            sql.push_str(" GROUP BY ");
            sql.push_str(&keys.join(", "));
        }

        if let Some(having) = &select.having {
            sql.push_str(" HAVING ");
            let having = self.expr(having);
            sql.push_str(&having);
        }

        self.push_tail(&mut sql, &select.order_by, select.limit, select.offset);
        sql
    }

    fn compound(&mut self, compound: &CompoundSelect) -> String {
        let mut sql = self.select(&compound.first);
        let keyword = if compound.all { " UNION ALL " } else { " UNION " };
        for member in &compound.members {
            sql.push_str(keyword);
            let member = self.select(member);
            sql.push_str(&member);
        }
        // The combined result only exposes bare column names.
        self.unqualified = true;
        self.push_tail(&mut sql, &compound.order_by, compound.limit, compound.offset);
        self.unqualified = false;
        sql
    }

    fn push_tail(
        &mut self,
        sql: &mut String,
        order_by: &[OrderBy],
        limit: Option<u64>,
        offset: Option<u64>,
    ) {
        if !order_by.is_empty() {
            let keys: Vec<String> = order_by.iter().map(|o| self.order_by(o)).collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&keys.join(", "));
        }
        let tail = self.dialect.limit_offset(limit, offset);
        if !tail.is_empty() {
            sql.push(' ');
            sql.push_str(&tail);
        }
    }

    fn order_by(&mut self, order: &OrderBy) -> String {
        let key = self.expr(&order.expr);
        match order.direction {
            OrderDirection::Asc => format!("{key} ASC"),
            OrderDirection::Desc => format!("{key} DESC"),
        }
    }

    fn select_item(&mut self, item: &SelectItem) -> String {
        let expr = self.expr(&item.expr);
        match &item.alias {
            Some(alias) => format!("{expr} AS {}", self.quote(alias)),
            None => expr,
        }
    }

    fn table_name(&self, relation: &Relation) -> String {
        match relation.source() {
            RelationSource::Table {
                schema: Some(schema),
                name,
            } => format!("{}.{}", self.quote(schema), self.quote(name)),
            RelationSource::Table { schema: None, name } => self.quote(name),
            RelationSource::Subquery(_) => self.quote(relation.qualifier()),
        }
    }

    fn relation(&mut self, relation: &Relation) -> String {
        let source = match relation.source() {
            RelationSource::Subquery(statement) => format!("({})", self.statement(statement)),
            RelationSource::Table { .. } => self.table_name(relation),
        };
        match relation.alias_name() {
            Some(alias) => format!("{source} AS {}", self.quote(alias)),
            None => source,
        }
    }

    fn from_item(&mut self, item: &FromItem) -> String {
        match item {
            FromItem::Relation(relation) => self.relation(relation),
            FromItem::Join {
                left,
                right,
                operator,
                on,
            } => {
                let left = self.from_item(left);
                let right_sql = self.from_item(right);
                let right_sql = if matches!(**right, FromItem::Join { .. }) {
                    format!("({right_sql})")
                } else {
                    right_sql
                };
                let on = self.expr(on);
                format!("{left} {} {right_sql} ON {on}", operator.as_str())
            }
        }
    }

    fn column(&self, column: &Column) -> String {
        match &column.table {
            Some(table) if !self.unqualified => {
                format!("{}.{}", self.quote(table), self.quote(&column.name))
            }
            _ => self.quote(&column.name),
        }
    }

    fn grouped(&mut self, expr: &Expr) -> String {
        let sql = self.expr(expr);
        if matches!(expr, Expr::And(_) | Expr::Or(_)) {
            format!("({sql})")
        } else {
            sql
        }
    }

    fn expr(&mut self, expr: &Expr) -> String {
        match expr {
            Expr::Column(column) => self.column(column),
            Expr::Value(value) => self.bind(value),
            Expr::Wildcard(None) => String::from("*"),
            Expr::Wildcard(Some(table)) => format!("{}.*", self.quote(table)),
            Expr::Binary { left, op, right } => {
                let left = self.expr(left);
                let right = self.expr(right);
                format!("{left} {} {right}", op.as_str())
            }
            Expr::And(items) if items.is_empty() => String::from("1 = 1"),
            Expr::And(items) => {
                let parts: Vec<String> = items.iter().map(|e| self.grouped(e)).collect();
                parts.join(" AND ")
            }
            Expr::Or(items) if items.is_empty() => String::from("1 = 0"),
            Expr::Or(items) => {
                let parts: Vec<String> = items.iter().map(|e| self.grouped(e)).collect();
                parts.join(" OR ")
            }
            Expr::Not(inner) => format!("NOT ({})", self.expr(inner)),
            Expr::Nested(inner) => format!("({})", self.expr(inner)),
            Expr::IsNull { expr, negated } => {
                let operand = self.expr(expr);
                if *negated {
                    format!("{operand} IS NOT NULL")
                } else {
                    format!("{operand} IS NULL")
                }
            }
            Expr::Identity {
                expr,
                value,
                negated,
            } => {
                let left = self.expr(expr);
                let right = self.bind(value);
                self.dialect.identity(&left, &right, *negated)
            }
            Expr::InList { list, negated, .. } if list.is_empty() => {
                // An empty set matches nothing; its negation matches everything.
                String::from(if *negated { "1 = 1" } else { "1 = 0" })
            }
            Expr::InList {
                expr,
                list,
                negated,
            } => {
                let operand = self.expr(expr);
                let members: Vec<String> = list.iter().map(|v| self.bind(v)).collect();
                let keyword = if *negated { "NOT IN" } else { "IN" };
                format!("{operand} {keyword} ({})", members.join(", "))
            }
            Expr::InSubquery {
                expr,
                subquery,
                negated,
            } => {
                let operand = self.expr(expr);
                let keyword = if *negated { "NOT IN" } else { "IN" };
                format!("{operand} {keyword} ({})", self.statement(subquery))
            }
            Expr::Exists { subquery, negated } => {
                let keyword = if *negated { "NOT EXISTS" } else { "EXISTS" };
                format!("{keyword} ({})", self.statement(subquery))
            }
            Expr::Between {
                expr,
                low,
                high,
                negated,
            } => {
                let operand = self.expr(expr);
                let low = self.bind(low);
                let high = self.bind(high);
                let keyword = if *negated { "NOT BETWEEN" } else { "BETWEEN" };
                format!("{operand} {keyword} {low} AND {high}")
            }
            Expr::Like {
                expr,
                pattern,
                case_insensitive,
                negated,
            } => self.like(expr, pattern, *case_insensitive, *negated),
            Expr::Contains { expr, needle } => {
                let operand = self.expr(expr);
                let needle = self.bind(needle);
                self.dialect.contains(&operand, &needle)
            }
            Expr::Regexp { expr, pattern } => {
                let operand = self.expr(expr);
                let pattern = self.bind(pattern);
                format!("{operand} {} {pattern}", self.dialect.regexp_operator())
            }
            Expr::Function {
                name,
                args,
                distinct,
            } => {
                let args: Vec<String> = args.iter().map(|a| self.expr(a)).collect();
                let distinct = if *distinct { "DISTINCT " } else { "" };
                format!("{name}({distinct}{})", args.join(", "))
            }
            Expr::Raw { sql, params } => self.raw(sql, params),
        }
    }

    fn like(
        &mut self,
        expr: &Expr,
        pattern: &SqlValue,
        case_insensitive: bool,
        negated: bool,
    ) -> String {
        let operand = self.expr(expr);
        let pattern = self.bind(pattern);
        let not = if negated { "NOT " } else { "" };
        if !case_insensitive {
            format!("{operand} {not}LIKE {pattern}")
        } else if self.dialect.supports_ilike() {
            format!("{operand} {not}ILIKE {pattern}")
        } else {
            format!("lower({operand}) {not}LIKE lower({pattern})")
        }
    }

    fn raw(&mut self, sql: &str, params: &[SqlValue]) -> String {
        let mut out = String::with_capacity(sql.len());
        let mut values = params.iter();
        for (i, piece) in sql.split('?').enumerate() {
            if i > 0 {
                match values.next() {
                    Some(value) => {
                        let placeholder = self.bind(value);
                        out.push_str(&placeholder);
                    }
                    None => out.push('?'),
                }
            }
            out.push_str(piece);
        }
        out
    }

    fn insert(&mut self, insert: &InsertStatement) -> String {
        let columns: Vec<String> = insert.columns.iter().map(|c| self.quote(c)).collect();
        let rows: Vec<String> = insert
            .rows
            .iter()
            .map(|row| {
                let values: Vec<String> = row.iter().map(|v| self.bind(v)).collect();
                format!("({})", values.join(", "))
            })
            .collect();
        let mut sql = format!(
            "INSERT INTO {} ({}) VALUES {}",
            self.table_name(&insert.table),
            columns.join(", "),
            rows.join(", ")
        );
        if !insert.returning.is_empty() {
            let returning: Vec<String> = insert
                .returning
                .iter()
                .map(|c| if c == "*" { c.clone() } else { self.quote(c) })
                .collect();
            sql.push_str(" RETURNING ");
            sql.push_str(&returning.join(", "));
        }
        sql
    }

    fn update(&mut self, update: &UpdateStatement) -> String {
        let assignments: Vec<String> = update
            .assignments
            .iter()
            .map(|(column, value)| format!("{} = {}", self.quote(column), self.bind(value)))
            .collect();
        let mut sql = format!(
            "UPDATE {} SET {}",
            self.table_name(&update.table),
            assignments.join(", ")
        );
        if let Some(selection) = &update.selection {
            sql.push_str(" WHERE ");
            let selection = self.expr(selection);
            sql.push_str(&selection);
        }
        sql
    }

    fn delete(&mut self, delete: &DeleteStatement) -> String {
        let mut sql = format!("DELETE FROM {}", self.table_name(&delete.table));
        if let Some(selection) = &delete.selection {
            sql.push_str(" WHERE ");
            let selection = self.expr(selection);
            sql.push_str(&selection);
        }
        sql
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{MySqlDialect, PostgresDialect, SqliteDialect};
    use crate::expr::{col, count_distinct};
    use crate::statement::JoinOperator;

    fn users() -> Relation {
        Relation::table("users").with_columns(["id", "name"])
    }

    fn select_users(selection: Option<Expr>) -> Statement {
        let mut select = SelectStatement::from(FromItem::Relation(users()));
        select.projection = vec![users().col("id").into(), users().col("name").into()];
        select.selection = selection;
        Statement::Select(select)
    }

    #[test]
    fn test_placeholders_follow_dialect() {
        let stmt = select_users(Some(
            users().col("id").gt(1).and(users().col("name").eq("a")),
        ));
        let pg = compile(&stmt, &PostgresDialect);
        assert_eq!(
            pg.sql,
            "SELECT \"users\".\"id\", \"users\".\"name\" FROM \"users\" \
             WHERE \"users\".\"id\" > $1 AND \"users\".\"name\" = $2"
        );
        assert_eq!(pg.params, vec![SqlValue::Int(1), SqlValue::Text(String::from("a"))]);

        let my = compile(&stmt, &MySqlDialect);
        assert_eq!(
            my.sql,
            "SELECT `users`.`id`, `users`.`name` FROM `users` \
             WHERE `users`.`id` > ? AND `users`.`name` = ?"
        );
    }

    #[test]
    fn test_inline_rendering_escapes_values() {
        let stmt = select_users(Some(users().col("name").eq("O'Brien")));
        assert_eq!(
            compile_inline(&stmt, &SqliteDialect),
            "SELECT \"users\".\"id\", \"users\".\"name\" FROM \"users\" \
             WHERE \"users\".\"name\" = 'O''Brien'"
        );
    }

    #[test]
    fn test_nested_groups_are_parenthesized() {
        let expr = col("a").eq(1).and(col("b").eq(2)).paren().or(col("c").eq(3).paren());
        let stmt = select_users(Some(expr));
        let sql = compile(&stmt, &PostgresDialect).sql;
        assert!(sql.ends_with("WHERE (\"a\" = $1 AND \"b\" = $2) OR (\"c\" = $3)"));

        let expr = Expr::And(vec![col("a").eq(1), col("b").eq(2).or(col("c").eq(3))]);
        let sql = compile(&select_users(Some(expr)), &PostgresDialect).sql;
        assert!(sql.ends_with("WHERE \"a\" = $1 AND (\"b\" = $2 OR \"c\" = $3)"));
    }

    #[test]
    fn test_case_insensitive_like_per_dialect() {
        let stmt = select_users(Some(users().col("name").icontains("ann")));
        assert!(compile(&stmt, &PostgresDialect)
            .sql
            .ends_with("WHERE \"users\".\"name\" ILIKE $1"));
        assert!(compile(&stmt, &SqliteDialect)
            .sql
            .ends_with("WHERE lower(\"users\".\"name\") LIKE lower(?)"));
    }

    #[test]
    fn test_empty_in_list_is_constant() {
        let stmt = select_users(Some(col("id").in_list(Vec::<i64>::new())));
        let compiled = compile(&stmt, &PostgresDialect);
        assert!(compiled.sql.ends_with("WHERE 1 = 0"));
        assert!(compiled.params.is_empty());

        let stmt = select_users(Some(col("id").not_in_list(Vec::<i64>::new())));
        assert!(compile(&stmt, &PostgresDialect).sql.ends_with("WHERE 1 = 1"));
    }

    #[test]
    fn test_join_tree_parenthesizes_right_operand() {
        let posts = Relation::table("posts");
        let tags = Relation::table("tags");
        let inner = FromItem::join(
            FromItem::Relation(users()),
            FromItem::Relation(tags.clone()),
            JoinOperator::Inner,
            users().col("id").eq_col(tags.col("user_id")),
        );
        let from = FromItem::join(
            FromItem::Relation(posts.clone()),
            inner,
            JoinOperator::LeftOuter,
            users().col("id").eq_col(posts.col("user_id")),
        );
        let stmt = Statement::Select(SelectStatement::from(from));
        assert_eq!(
            compile(&stmt, &PostgresDialect).sql,
            "SELECT * FROM \"posts\" LEFT OUTER JOIN (\"users\" INNER JOIN \"tags\" \
             ON \"users\".\"id\" = \"tags\".\"user_id\") \
             ON \"users\".\"id\" = \"posts\".\"user_id\""
        );
    }

    #[test]
    fn test_subquery_relation_and_schema() {
        let mut inner = SelectStatement::from(FromItem::Relation(
            Relation::table("posts").in_schema("tenant"),
        ));
        inner.projection = vec![count_distinct(col("id")).alias("total")];
        let derived = Relation::subquery(inner, "stats");
        assert_eq!(derived.columns(), ["total"]);
        let stmt = Statement::Select(SelectStatement::from(FromItem::Relation(derived)));
        assert_eq!(
            compile(&stmt, &PostgresDialect).sql,
            "SELECT * FROM (SELECT COUNT(DISTINCT \"id\") AS \"total\" \
             FROM \"tenant\".\"posts\") AS \"stats\""
        );
    }

    #[test]
    fn test_compound_orders_by_bare_columns() {
        let first = match select_users(None) {
            Statement::Select(s) => s,
            _ => unreachable!(),
        };
        let compound = CompoundSelect {
            first: first.clone(),
            members: vec![first],
            all: true,
            order_by: vec![users().col("name").desc()],
            limit: Some(5),
            offset: None,
        };
        let sql = compile(&Statement::Compound(compound), &SqliteDialect).sql;
        assert!(sql.contains(" UNION ALL SELECT "));
        assert!(sql.ends_with("ORDER BY \"name\" DESC LIMIT 5"));
    }

    #[test]
    fn test_compound_as_derived_table() {
        let first = SelectStatement::from(FromItem::Relation(users()));
        let compound = CompoundSelect {
            first: first.clone(),
            members: vec![first],
            all: false,
            order_by: Vec::new(),
            limit: None,
            offset: None,
        };
        let mut outer = SelectStatement::from(FromItem::Relation(Relation::compound(
            compound,
            "count_source",
        )));
        outer.projection = vec![crate::expr::count_all().into()];
        assert_eq!(
            compile(&Statement::Select(outer), &PostgresDialect).sql,
            "SELECT COUNT(*) FROM (SELECT * FROM \"users\" UNION SELECT * FROM \"users\") \
             AS \"count_source\""
        );
    }

    #[test]
    fn test_in_subquery_keeps_union_members() {
        let member = |id: i64| {
            let mut select = SelectStatement::from(FromItem::Relation(users()));
            select.projection = vec![users().col("id").into()];
            select.selection = Some(users().col("id").eq(id));
            select
        };
        let compound = CompoundSelect {
            first: member(1),
            members: vec![member(2)],
            all: false,
            order_by: Vec::new(),
            limit: None,
            offset: None,
        };
        let stmt = select_users(Some(users().col("id").in_subquery(compound.clone())));
        let compiled = compile(&stmt, &PostgresDialect);
        assert!(compiled.sql.ends_with(
            "WHERE \"users\".\"id\" IN (SELECT \"users\".\"id\" FROM \"users\" \
             WHERE \"users\".\"id\" = $1 UNION SELECT \"users\".\"id\" FROM \"users\" \
             WHERE \"users\".\"id\" = $2)"
        ));
        assert_eq!(compiled.params, vec![SqlValue::Int(1), SqlValue::Int(2)]);

        let stmt = select_users(Some(Expr::not_exists(compound)));
        assert!(compile(&stmt, &SqliteDialect)
            .sql
            .ends_with("WHERE NOT EXISTS (SELECT \"users\".\"id\" FROM \"users\" \
                        WHERE \"users\".\"id\" = ? UNION SELECT \"users\".\"id\" FROM \"users\" \
                        WHERE \"users\".\"id\" = ?)"));
    }

    #[test]
    fn test_contains_is_rendered_by_dialect() {
        let stmt = select_users(Some(users().col("name").contains("An")));
        let sqlite = compile(&stmt, &SqliteDialect);
        assert!(sqlite.sql.ends_with("WHERE instr(\"users\".\"name\", ?) > 0"));
        assert_eq!(sqlite.params, vec![SqlValue::Text(String::from("An"))]);
        assert!(compile(&stmt, &PostgresDialect)
            .sql
            .ends_with("WHERE strpos(\"users\".\"name\", $1) > 0"));
        assert!(compile(&stmt, &MySqlDialect)
            .sql
            .ends_with("WHERE INSTR(CAST(`users`.`name` AS BINARY), ?) > 0"));
    }

    #[test]
    fn test_format_sql_breaks_top_level_clauses() {
        let sql = "SELECT \"users\".\"id\" FROM \"users\" \
                   INNER JOIN \"posts\" ON \"posts\".\"user_id\" = \"users\".\"id\" \
                   WHERE \"users\".\"age\" BETWEEN 18 AND 30 \
                   AND \"users\".\"name\" = 'a AND b' \
                   AND \"users\".\"id\" IN (SELECT \"id\" FROM \"admins\" WHERE x = 1 OR y = 2) \
                   ORDER BY \"users\".\"id\" ASC LIMIT 5";
        assert_eq!(
            format_sql(sql, 2),
            "SELECT \"users\".\"id\"\n\
             FROM \"users\"\n\
             INNER JOIN \"posts\"\n  \
             ON \"posts\".\"user_id\" = \"users\".\"id\"\n\
             WHERE \"users\".\"age\" BETWEEN 18 AND 30\n  \
             AND \"users\".\"name\" = 'a AND b'\n  \
             AND \"users\".\"id\" IN (SELECT \"id\" FROM \"admins\" WHERE x = 1 OR y = 2)\n\
             ORDER BY \"users\".\"id\" ASC\n\
             LIMIT 5"
        );
    }

    #[test]
    fn test_format_sql_keeps_union_keyword_whole() {
        let sql = "SELECT * FROM \"a\" UNION ALL SELECT * FROM \"b\" ORDER BY \"id\" DESC";
        assert_eq!(
            format_sql(sql, 4),
            "SELECT *\nFROM \"a\"\nUNION ALL\nSELECT *\nFROM \"b\"\nORDER BY \"id\" DESC"
        );
    }

    #[test]
    fn test_raw_fragment_binds_markers() {
        let stmt = select_users(Some(Expr::raw_with(
            "length(name) > ?",
            vec![SqlValue::Int(3)],
        )));
        let compiled = compile(&stmt, &PostgresDialect);
        assert!(compiled.sql.ends_with("WHERE length(name) > $1"));
        assert_eq!(compiled.params, vec![SqlValue::Int(3)]);
    }

    #[test]
    fn test_mutations() {
        let insert = Statement::Insert(InsertStatement {
            table: users(),
            columns: vec![String::from("name")],
            rows: vec![
                vec![SqlValue::Text(String::from("a"))],
                vec![SqlValue::Text(String::from("b"))],
            ],
            returning: vec![String::from("id"), String::from("name")],
        });
        assert_eq!(
            compile(&insert, &PostgresDialect).sql,
            "INSERT INTO \"users\" (\"name\") VALUES ($1), ($2) RETURNING \"id\", \"name\""
        );

        let update = Statement::Update(UpdateStatement {
            table: users().in_schema("tenant"),
            assignments: vec![(String::from("name"), SqlValue::Text(String::from("z")))],
            selection: Some(users().col("id").eq(4)),
        });
        assert_eq!(
            compile(&update, &PostgresDialect).sql,
            "UPDATE \"tenant\".\"users\" SET \"name\" = $1 WHERE \"users\".\"id\" = $2"
        );

        let delete = Statement::Delete(DeleteStatement {
            table: users(),
            selection: Some(users().col("id").in_list(vec![1, 2])),
        });
        assert_eq!(
            compile(&delete, &MySqlDialect).sql,
            "DELETE FROM `users` WHERE `users`.`id` IN (?, ?)"
        );
    }
}
