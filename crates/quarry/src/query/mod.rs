//! Fluent query builder.
//!
//! [`Query`] is a plain value: every builder method consumes it and returns
//! the extended query, and nothing is rendered until a [`Grammar`] compiles
//! it. Terminal operations (`get`, `count`, `insert`, ...) live in `exec`
//! and take the executor explicitly.
//!
//! ```ignore
//! use quarry::{Op, Query};
//!
//! let rows = Query::table("users")
//!     .where_group(|q| q.and_where("a", Op::Lt, 1).or_where("b", Op::Eq, 2))
//!     .and_where("c", Op::Gt, 3)
//!     .order_by_desc("created_at")
//!     .page(2, 20)
//!     .get(&db)
//!     .await?;
//! ```
//!
//! [`Grammar`]: crate::grammar::Grammar

mod changes;
mod exec;
mod join;
mod lock;

#[cfg(test)]
mod tests;

pub use changes::{Changes, Value};
pub use join::{Join, JoinClause, JoinType};
pub use lock::{Lock, LockOption, LockStrength};

use crate::binding::Binding;
use crate::condition::{Connector, Op, Where};
use crate::sql::Sql;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn as_sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub direction: Direction,
}

/// A query under construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub table: Option<String>,
    /// Selected columns; empty means `*`.
    pub columns: Vec<String>,
    pub distinct: bool,
    pub joins: Vec<Join>,
    pub wheres: Vec<Where>,
    pub groups: Vec<String>,
    pub havings: Vec<Where>,
    pub orders: Vec<OrderBy>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub lock: Option<Lock>,
}

impl Query {
    /// A query with no table yet. Compiling it fails until one is set.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: Some(table.into()),
            ..Self::default()
        }
    }

    pub fn from(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Replace the selected columns.
    pub fn select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn add_select(mut self, column: impl Into<String>) -> Self {
        self.columns.push(column.into());
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Run `f` against a throwaway query on the same table.
    fn scoped<F>(&self, f: F) -> Query
    where
        F: FnOnce(Query) -> Query,
    {
        f(Query {
            table: self.table.clone(),
            ..Query::default()
        })
    }

    // ── WHERE ──────────────────────────────────────────────────────────────

    pub fn and_where(
        mut self,
        column: impl Into<String>,
        op: Op,
        value: impl Into<Binding>,
    ) -> Self {
        self.wheres.push(Where::value(Connector::And, column, op, value));
        self
    }

    pub fn or_where(
        mut self,
        column: impl Into<String>,
        op: Op,
        value: impl Into<Binding>,
    ) -> Self {
        self.wheres.push(Where::value(Connector::Or, column, op, value));
        self
    }

    /// `column = value`
    pub fn where_eq(self, column: impl Into<String>, value: impl Into<Binding>) -> Self {
        self.and_where(column, Op::Eq, value)
    }

    pub fn where_null(mut self, column: impl Into<String>) -> Self {
        self.wheres.push(Where::value(Connector::And, column, Op::Eq, Binding::Null));
        self
    }

    pub fn or_where_null(mut self, column: impl Into<String>) -> Self {
        self.wheres.push(Where::value(Connector::Or, column, Op::Eq, Binding::Null));
        self
    }

    pub fn where_not_null(mut self, column: impl Into<String>) -> Self {
        self.wheres.push(Where::value(Connector::And, column, Op::Ne, Binding::Null));
        self
    }

    pub fn or_where_not_null(mut self, column: impl Into<String>) -> Self {
        self.wheres.push(Where::value(Connector::Or, column, Op::Ne, Binding::Null));
        self
    }

    pub fn where_in<I>(mut self, column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Binding>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.wheres.push(Where::in_list(Connector::And, column, values, false));
        self
    }

    pub fn or_where_in<I>(mut self, column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Binding>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.wheres.push(Where::in_list(Connector::Or, column, values, false));
        self
    }

    pub fn where_not_in<I>(mut self, column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Binding>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.wheres.push(Where::in_list(Connector::And, column, values, true));
        self
    }

    pub fn or_where_not_in<I>(mut self, column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Binding>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.wheres.push(Where::in_list(Connector::Or, column, values, true));
        self
    }

    /// `column IN (SELECT ...)`
    pub fn where_in_query(mut self, column: impl Into<String>, query: Query) -> Self {
        self.wheres.push(Where::in_query(Connector::And, column, query, false));
        self
    }

    pub fn where_not_in_query(mut self, column: impl Into<String>, query: Query) -> Self {
        self.wheres.push(Where::in_query(Connector::And, column, query, true));
        self
    }

    /// Compare two columns: `first op second`.
    pub fn where_column(
        mut self,
        first: impl Into<String>,
        op: Op,
        second: impl Into<String>,
    ) -> Self {
        self.wheres.push(Where::column(Connector::And, first, op, second));
        self
    }

    pub fn or_where_column(
        mut self,
        first: impl Into<String>,
        op: Op,
        second: impl Into<String>,
    ) -> Self {
        self.wheres.push(Where::column(Connector::Or, first, op, second));
        self
    }

    pub fn where_raw(mut self, sql: impl Into<Sql>) -> Self {
        self.wheres.push(Where::raw(Connector::And, sql));
        self
    }

    pub fn or_where_raw(mut self, sql: impl Into<Sql>) -> Self {
        self.wheres.push(Where::raw(Connector::Or, sql));
        self
    }

    /// Parenthesized group: `AND (...)`.
    pub fn where_group<F>(mut self, f: F) -> Self
    where
        F: FnOnce(Query) -> Query,
    {
        let children = self.scoped(f).wheres;
        self.wheres.push(Where::nested(Connector::And, children));
        self
    }

    /// Parenthesized group: `OR (...)`.
    pub fn or_where_group<F>(mut self, f: F) -> Self
    where
        F: FnOnce(Query) -> Query,
    {
        let children = self.scoped(f).wheres;
        self.wheres.push(Where::nested(Connector::Or, children));
        self
    }

    // ── HAVING ─────────────────────────────────────────────────────────────

    pub fn having(mut self, column: impl Into<String>, op: Op, value: impl Into<Binding>) -> Self {
        self.havings.push(Where::value(Connector::And, column, op, value));
        self
    }

    pub fn or_having(
        mut self,
        column: impl Into<String>,
        op: Op,
        value: impl Into<Binding>,
    ) -> Self {
        self.havings.push(Where::value(Connector::Or, column, op, value));
        self
    }

    pub fn having_null(mut self, column: impl Into<String>) -> Self {
        self.havings.push(Where::value(Connector::And, column, Op::Eq, Binding::Null));
        self
    }

    pub fn having_not_null(mut self, column: impl Into<String>) -> Self {
        self.havings.push(Where::value(Connector::And, column, Op::Ne, Binding::Null));
        self
    }

    pub fn having_in<I>(mut self, column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Binding>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.havings.push(Where::in_list(Connector::And, column, values, false));
        self
    }

    pub fn having_not_in<I>(mut self, column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Binding>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.havings.push(Where::in_list(Connector::And, column, values, true));
        self
    }

    pub fn having_column(
        mut self,
        first: impl Into<String>,
        op: Op,
        second: impl Into<String>,
    ) -> Self {
        self.havings.push(Where::column(Connector::And, first, op, second));
        self
    }

    pub fn having_raw(mut self, sql: impl Into<Sql>) -> Self {
        self.havings.push(Where::raw(Connector::And, sql));
        self
    }

    pub fn or_having_raw(mut self, sql: impl Into<Sql>) -> Self {
        self.havings.push(Where::raw(Connector::Or, sql));
        self
    }

    /// Group HAVING conditions. The closure's WHERE list becomes the group.
    pub fn having_group<F>(mut self, f: F) -> Self
    where
        F: FnOnce(Query) -> Query,
    {
        let children = self.scoped(f).wheres;
        self.havings.push(Where::nested(Connector::And, children));
        self
    }

    pub fn or_having_group<F>(mut self, f: F) -> Self
    where
        F: FnOnce(Query) -> Query,
    {
        let children = self.scoped(f).wheres;
        self.havings.push(Where::nested(Connector::Or, children));
        self
    }

    // ── JOIN ───────────────────────────────────────────────────────────────

    /// Inner join on `first op second`.
    pub fn join(
        self,
        table: impl Into<String>,
        first: impl Into<String>,
        op: Op,
        second: impl Into<String>,
    ) -> Self {
        self.join_with(JoinType::Inner, table, |j| j.on(first, op, second))
    }

    pub fn left_join(
        self,
        table: impl Into<String>,
        first: impl Into<String>,
        op: Op,
        second: impl Into<String>,
    ) -> Self {
        self.join_with(JoinType::Left, table, |j| j.on(first, op, second))
    }

    pub fn right_join(
        self,
        table: impl Into<String>,
        first: impl Into<String>,
        op: Op,
        second: impl Into<String>,
    ) -> Self {
        self.join_with(JoinType::Right, table, |j| j.on(first, op, second))
    }

    pub fn outer_join(
        self,
        table: impl Into<String>,
        first: impl Into<String>,
        op: Op,
        second: impl Into<String>,
    ) -> Self {
        self.join_with(JoinType::Outer, table, |j| j.on(first, op, second))
    }

    pub fn cross_join(mut self, table: impl Into<String>) -> Self {
        self.joins.push(Join {
            kind: JoinType::Cross,
            table: table.into(),
            on: Vec::new(),
        });
        self
    }

    /// Join with a multi-condition `ON` built by the closure.
    pub fn join_with<F>(mut self, kind: JoinType, table: impl Into<String>, f: F) -> Self
    where
        F: FnOnce(JoinClause) -> JoinClause,
    {
        let clause = f(JoinClause::default());
        self.joins.push(Join {
            kind,
            table: table.into(),
            on: clause.into_conditions(),
        });
        self
    }

    // ── GROUP / ORDER / PAGINATION / LOCK ──────────────────────────────────

    pub fn group_by<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups.extend(columns.into_iter().map(Into::into));
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.orders.push(OrderBy {
            column: column.into(),
            direction,
        });
        self
    }

    pub fn order_by_desc(self, column: impl Into<String>) -> Self {
        self.order_by(column, Direction::Desc)
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// 1-based page. Both arguments are clamped to at least 1.
    pub fn page(self, page: u64, per_page: u64) -> Self {
        let page = page.max(1);
        let per_page = per_page.max(1);
        self.limit(per_page).offset((page - 1).saturating_mul(per_page))
    }

    pub fn lock(mut self, lock: Lock) -> Self {
        self.lock = Some(lock);
        self
    }

    /// `FOR UPDATE`
    pub fn for_update(self) -> Self {
        self.lock(Lock::update())
    }

    /// `FOR SHARE`
    pub fn for_share(self) -> Self {
        self.lock(Lock::share())
    }

    /// Same query with ordering, pagination and locking removed.
    pub(crate) fn without_tail(&self) -> Query {
        Query {
            orders: Vec::new(),
            limit: None,
            offset: None,
            lock: None,
            ..self.clone()
        }
    }
}
