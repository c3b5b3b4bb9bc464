//! Dialect compilers.
//!
//! [`Grammar`] turns a [`Query`] into [`Sql`]. The default methods implement
//! the standard rendering; each dialect overrides only what differs (quoting,
//! RETURNING, UPDATE with joins, locking, column types).
//!
//! Compilation is pure: the same query always yields the same text and the
//! same bindings, and bindings always appear in placeholder order.

mod ddl;
mod mysql;
mod postgres;
mod sqlite;


pub use ddl::{ColumnDef, ColumnType, CreateTable};
pub use mysql::MySqlGrammar;
pub use postgres::PostgresGrammar;
pub use sqlite::SqliteGrammar;

use crate::binding::{Binding, Fields};
use crate::condition::{Connector, InValues, Op, Where, WhereKind};
use crate::error::{OrmError, OrmResult};
use crate::query::{Changes, Join, JoinType, Lock, OrderBy, Query, Value};
use crate::sql::Sql;

/// A SQL dialect.
pub trait Grammar: Send + Sync {
    /// Dialect name, e.g. `"postgres"`.
    fn name(&self) -> &'static str;

    /// Quote an identifier; dotted names are quoted per segment.
    fn quote(&self, ident: &str) -> String {
        quote_segments(ident, '"')
    }

    fn supports_returning(&self) -> bool {
        true
    }

    fn supports_full_outer_join(&self) -> bool {
        true
    }

    // ── SELECT ─────────────────────────────────────────────────────────────

    fn compile_select(&self, query: &Query) -> OrmResult<Sql> {
        let table = require_table(query)?;
        let stages = [
            Some(self.compile_columns(query)),
            Some(Sql::new(format!("FROM {table}"))),
            self.compile_joins(&query.joins)?,
            self.compile_conditions("WHERE", &query.wheres)?,
            self.compile_groups(&query.groups),
            self.compile_conditions("HAVING", &query.havings)?,
            self.compile_orders(&query.orders),
            query.limit.map(|n| Sql::new(format!("LIMIT {n}"))),
            query.offset.map(|n| Sql::new(format!("OFFSET {n}"))),
            query.lock.as_ref().and_then(|lock| self.compile_lock(lock)),
        ];
        Ok(Sql::join(stages.into_iter().flatten(), " "))
    }

    fn compile_columns(&self, query: &Query) -> Sql {
        let mut out = Sql::new("SELECT ");
        if query.distinct {
            out.push("DISTINCT ");
        }
        if query.columns.is_empty() {
            out.push("*");
        } else {
            out.push(&query.columns.join(", "));
        }
        out
    }

    fn compile_joins(&self, joins: &[Join]) -> OrmResult<Option<Sql>> {
        let mut compiled = Vec::with_capacity(joins.len());
        for join in joins {
            if join.kind == JoinType::Outer && !self.supports_full_outer_join() {
                return Err(OrmError::validation(format!(
                    "{} does not support FULL OUTER JOIN ({})",
                    self.name(),
                    join.table
                )));
            }
            let mut out = Sql::new(format!("{} {}", join.kind.as_sql(), join.table));
            if join.kind != JoinType::Cross {
                if let Some(on) = self.compile_condition_list(&join.on)? {
                    out.push(" ON ");
                    out.push_sql(on);
                }
            }
            compiled.push(out);
        }
        Ok((!compiled.is_empty()).then(|| Sql::join(compiled, " ")))
    }

    /// `<keyword> <conditions>`, or nothing for an empty list.
    fn compile_conditions(&self, keyword: &str, list: &[Where]) -> OrmResult<Option<Sql>> {
        Ok(self.compile_condition_list(list)?.map(|body| {
            let mut out = Sql::new(format!("{keyword} "));
            out.push_sql(body);
            out
        }))
    }

    /// Render every node as `<connector> <fragment>`, then drop the leading
    /// connector of the whole list.
    fn compile_condition_list(&self, list: &[Where]) -> OrmResult<Option<Sql>> {
        let mut out = Sql::empty();
        for node in list {
            let Some(fragment) = self.compile_condition(node)? else {
                continue;
            };
            if !out.is_empty() {
                out.push(" ");
            }
            out.push(node.connector.as_sql()).push(" ").push_sql(fragment);
        }
        if out.is_empty() {
            return Ok(None);
        }
        strip_leading_connector(&mut out);
        Ok(Some(out))
    }

    /// A single node without its connector. Empty groups render nothing.
    fn compile_condition(&self, node: &Where) -> OrmResult<Option<Sql>> {
        let sql = match &node.kind {
            WhereKind::Value { column, op, value } => match (op, value) {
                (Op::Eq, Binding::Null) => Sql::new(format!("{column} IS NULL")),
                (Op::Ne, Binding::Null) => Sql::new(format!("{column} IS NOT NULL")),
                _ => {
                    let mut out = Sql::new(format!("{column} {} ", op.as_sql()));
                    out.push_bind(value.clone());
                    out
                }
            },
            WhereKind::Column { first, op, second } => {
                Sql::new(format!("{first} {} {second}", op.as_sql()))
            }
            WhereKind::In {
                column,
                values,
                negated,
            } => {
                let keyword = if *negated { "NOT IN" } else { "IN" };
                match values {
                    InValues::List(list) if list.is_empty() => {
                        Sql::new(if *negated { "TRUE" } else { "FALSE" })
                    }
                    InValues::List(list) => {
                        let mut out = Sql::new(format!("{column} {keyword} ("));
                        out.push_bind_list(list.iter().cloned()).push(")");
                        out
                    }
                    InValues::Query(sub) => {
                        let mut out = Sql::new(format!("{column} {keyword} ("));
                        out.push_sql(self.compile_select(sub)?).push(")");
                        out
                    }
                }
            }
            WhereKind::Nested(children) => match self.compile_condition_list(children)? {
                Some(inner) => {
                    let mut out = Sql::new("(");
                    out.push_sql(inner).push(")");
                    out
                }
                None => return Ok(None),
            },
            WhereKind::Raw(raw) => raw.clone(),
        };
        Ok(Some(sql))
    }

    fn compile_groups(&self, groups: &[String]) -> Option<Sql> {
        (!groups.is_empty()).then(|| Sql::new(format!("GROUP BY {}", groups.join(", "))))
    }

    fn compile_orders(&self, orders: &[OrderBy]) -> Option<Sql> {
        if orders.is_empty() {
            return None;
        }
        let items: Vec<String> = orders
            .iter()
            .map(|o| format!("{} {}", o.column, o.direction.as_sql()))
            .collect();
        Some(Sql::new(format!("ORDER BY {}", items.join(", "))))
    }

    fn compile_lock(&self, lock: &Lock) -> Option<Sql> {
        Some(Sql::new(lock.to_sql()))
    }

    /// `SELECT COUNT(*) AS count ...`, ignoring ordering, pagination and locks.
    fn compile_count(&self, query: &Query) -> OrmResult<Sql> {
        let base = query.without_tail();
        if base.distinct || !base.groups.is_empty() || !base.havings.is_empty() {
            let mut out = Sql::new("SELECT COUNT(*) AS count FROM (");
            out.push_sql(self.compile_select(&base)?);
            out.push(") AS aggregate_rows");
            return Ok(out);
        }
        self.compile_select(&Query {
            columns: vec!["COUNT(*) AS count".to_string()],
            ..base
        })
    }

    fn compile_exists(&self, query: &Query) -> OrmResult<Sql> {
        let mut out = Sql::new("SELECT EXISTS (");
        out.push_sql(self.compile_select(query)?);
        out.push(&format!(") AS {}", self.quote("exists")));
        Ok(out)
    }

    // ── INSERT ─────────────────────────────────────────────────────────────

    /// Multi-row insert. Columns come from the first row in its key order;
    /// later rows bind `NULL` for keys they lack.
    fn compile_insert(&self, query: &Query, rows: &[Fields]) -> OrmResult<Sql> {
        let table = require_table(query)?;
        let Some(first) = rows.first() else {
            return Err(OrmError::validation("INSERT requires at least one row"));
        };
        if first.is_empty() {
            if rows.len() > 1 {
                return Err(OrmError::validation("cannot insert several empty rows"));
            }
            return Ok(Sql::new(self.compile_insert_default(table)));
        }

        let columns: Vec<&str> = first.keys().map(String::as_str).collect();
        for row in &rows[1..] {
            if let Some(extra) = row.keys().find(|k| !first.contains_key(k.as_str())) {
                return Err(OrmError::validation(format!(
                    "INSERT row has column '{extra}' missing from the first row"
                )));
            }
        }

        let mut out = Sql::new(format!(
            "INSERT INTO {table} ({}) VALUES ",
            columns.join(", ")
        ));
        for (i, row) in rows.iter().enumerate() {
            if i > 0 {
                out.push(", ");
            }
            out.push("(");
            out.push_bind_list(
                columns
                    .iter()
                    .map(|c| row.get(*c).cloned().unwrap_or(Binding::Null)),
            );
            out.push(")");
        }
        Ok(out)
    }

    /// Insert of a row with no explicit values.
    fn compile_insert_default(&self, table: &str) -> String {
        format!("INSERT INTO {table} DEFAULT VALUES")
    }

    /// Statements that insert `rows` and yield them back as result rows.
    ///
    /// The caller runs every statement and concatenates the returned rows.
    fn compile_insert_return(
        &self,
        query: &Query,
        rows: &[Fields],
        primary_key: &str,
    ) -> OrmResult<Vec<Sql>> {
        let _ = primary_key;
        let mut out = self.compile_insert(query, rows)?;
        out.push(" RETURNING *");
        Ok(vec![out])
    }

    // ── UPDATE / DELETE ────────────────────────────────────────────────────

    /// `UPDATE t [joins] SET ... [WHERE ...]`; joins bind before SET.
    fn compile_update(&self, query: &Query, changes: &Changes) -> OrmResult<Sql> {
        compile_update_joined(self, query, changes)
    }

    /// `SET a = ?, b = b + ?`
    fn compile_assignments(&self, changes: &Changes) -> OrmResult<Sql> {
        if changes.is_empty() {
            return Err(OrmError::validation("UPDATE requires at least one SET"));
        }
        let items = changes.iter().map(|(column, value)| {
            let mut item = Sql::new(format!("{column} = "));
            match value {
                Value::Bind(binding) => item.push_bind(binding.clone()),
                Value::Raw(raw) => item.push_sql(raw.clone()),
            };
            item
        });
        let mut out = Sql::new("SET ");
        out.push_sql(Sql::join(items, ", "));
        Ok(out)
    }

    fn compile_delete(&self, query: &Query) -> OrmResult<Sql> {
        let table = require_table(query)?;
        let stages = [
            Some(Sql::new(format!("DELETE FROM {table}"))),
            self.compile_conditions("WHERE", &query.wheres)?,
        ];
        Ok(Sql::join(stages.into_iter().flatten(), " "))
    }

    // ── DDL ────────────────────────────────────────────────────────────────

    /// Full column type, including any auto-increment key clause.
    fn column_type(&self, ty: &ColumnType) -> String;

    fn compile_column(&self, column: &ColumnDef) -> String {
        let mut out = format!("{} {}", self.quote(&column.name), self.column_type(&column.ty));
        let increments = matches!(column.ty, ColumnType::Increments);
        if column.primary && !increments {
            out.push_str(" PRIMARY KEY");
        }
        if !column.nullable && !column.primary && !increments {
            out.push_str(" NOT NULL");
        }
        if column.unique {
            out.push_str(" UNIQUE");
        }
        if let Some(default) = &column.default {
            out.push_str(" DEFAULT ");
            out.push_str(default);
        }
        if let Some((table, key)) = &column.references {
            out.push_str(&format!(" REFERENCES {}({})", self.quote(table), self.quote(key)));
        }
        out
    }

    fn compile_create_table(&self, table: &CreateTable) -> OrmResult<Sql> {
        if table.columns.is_empty() {
            return Err(OrmError::validation(format!(
                "table '{}' has no columns",
                table.name
            )));
        }
        let columns: Vec<String> = table.columns.iter().map(|c| self.compile_column(c)).collect();
        Ok(Sql::new(format!(
            "CREATE TABLE {}{} ({})",
            if table.if_not_exists { "IF NOT EXISTS " } else { "" },
            self.quote(&table.name),
            columns.join(", ")
        )))
    }

    fn compile_drop_table(&self, table: &str, if_exists: bool) -> Sql {
        Sql::new(format!(
            "DROP TABLE {}{}",
            if if_exists { "IF EXISTS " } else { "" },
            self.quote(table)
        ))
    }

    fn compile_create_index(&self, table: &str, columns: &[&str], unique: bool) -> OrmResult<Sql> {
        if columns.is_empty() {
            return Err(OrmError::validation("index requires at least one column"));
        }
        let name = format!("{}_{}_index", table.replace('.', "_"), columns.join("_"));
        let quoted: Vec<String> = columns.iter().map(|c| self.quote(c)).collect();
        Ok(Sql::new(format!(
            "CREATE {}INDEX {} ON {} ({})",
            if unique { "UNIQUE " } else { "" },
            self.quote(&name),
            self.quote(table),
            quoted.join(", ")
        )))
    }
}

fn require_table(query: &Query) -> OrmResult<&str> {
    match query.table.as_deref() {
        Some(table) if !table.is_empty() => Ok(table),
        _ => Err(OrmError::MissingTable),
    }
}

fn strip_leading_connector(sql: &mut Sql) {
    if sql.text().starts_with("AND ") {
        sql.strip_prefix("AND ");
    } else if sql.text().starts_with("OR ") {
        sql.strip_prefix("OR ");
    }
}

pub(crate) fn quote_segments(ident: &str, quote: char) -> String {
    ident
        .split('.')
        .map(|segment| {
            let escaped = segment.replace(quote, &format!("{quote}{quote}"));
            format!("{quote}{escaped}{quote}")
        })
        .collect::<Vec<_>>()
        .join(".")
}

/// `UPDATE t [joins] SET ... [WHERE ...]`
pub(crate) fn compile_update_joined<G: Grammar + ?Sized>(
    grammar: &G,
    query: &Query,
    changes: &Changes,
) -> OrmResult<Sql> {
    let table = require_table(query)?;
    let stages = [
        Some(Sql::new(format!("UPDATE {table}"))),
        grammar.compile_joins(&query.joins)?,
        Some(grammar.compile_assignments(changes)?),
        grammar.compile_conditions("WHERE", &query.wheres)?,
    ];
    Ok(Sql::join(stages.into_iter().flatten(), " "))
}

/// `UPDATE t SET ... FROM a, b WHERE (on a) AND (on b) AND (wheres)`, for
/// dialects that express update joins with a FROM list.
pub(crate) fn compile_update_from<G: Grammar + ?Sized>(
    grammar: &G,
    query: &Query,
    changes: &Changes,
) -> OrmResult<Sql> {
    let table = require_table(query)?;
    let mut conditions = Vec::with_capacity(query.joins.len() + 1);
    let mut from = Vec::with_capacity(query.joins.len());
    for join in &query.joins {
        match join.kind {
            JoinType::Inner => conditions.push(Where::nested(Connector::And, join.on.clone())),
            JoinType::Cross => {}
            other => {
                return Err(OrmError::validation(format!(
                    "{} cannot express {} in UPDATE",
                    grammar.name(),
                    other.as_sql()
                )));
            }
        }
        from.push(join.table.as_str());
    }

    if from.is_empty() {
        return compile_update_joined(grammar, query, changes);
    }

    if !query.wheres.is_empty() {
        conditions.push(Where::nested(Connector::And, query.wheres.clone()));
    }
    let stages = [
        Some(Sql::new(format!("UPDATE {table}"))),
        Some(grammar.compile_assignments(changes)?),
        Some(Sql::new(format!("FROM {}", from.join(", ")))),
        grammar.compile_conditions("WHERE", &conditions)?,
    ];
    Ok(Sql::join(stages.into_iter().flatten(), " "))
}
