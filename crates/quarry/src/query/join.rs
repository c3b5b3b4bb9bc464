use crate::binding::Binding;
use crate::condition::{Connector, Op, Where};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    /// `FULL OUTER JOIN`, which MySQL rejects at compile time.
    Outer,
    Cross,
}

impl JoinType {
    pub fn as_sql(self) -> &'static str {
        match self {
            JoinType::Inner => "INNER JOIN",
            JoinType::Left => "LEFT JOIN",
            JoinType::Right => "RIGHT JOIN",
            JoinType::Outer => "FULL OUTER JOIN",
            JoinType::Cross => "CROSS JOIN",
        }
    }
}

/// A joined table and its `ON` conditions (empty for cross joins).
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub kind: JoinType,
    pub table: String,
    pub on: Vec<Where>,
}

/// Builder for multi-condition `ON` clauses.
///
/// ```ignore
/// Query::table("users").join_with(JoinType::Left, "posts", |j| {
///     j.on("posts.user_id", Op::Eq, "users.id")
///         .on_value("posts.published", Op::Eq, true)
/// });
/// ```
#[derive(Debug, Clone, Default)]
pub struct JoinClause {
    conditions: Vec<Where>,
}

impl JoinClause {
    /// Column-to-column condition.
    pub fn on(mut self, first: impl Into<String>, op: Op, second: impl Into<String>) -> Self {
        self.conditions.push(Where::column(Connector::And, first, op, second));
        self
    }

    pub fn or_on(mut self, first: impl Into<String>, op: Op, second: impl Into<String>) -> Self {
        self.conditions.push(Where::column(Connector::Or, first, op, second));
        self
    }

    /// Column-to-value condition; the value is bound.
    pub fn on_value(
        mut self,
        column: impl Into<String>,
        op: Op,
        value: impl Into<Binding>,
    ) -> Self {
        self.conditions.push(Where::value(Connector::And, column, op, value));
        self
    }

    pub fn or_on_value(
        mut self,
        column: impl Into<String>,
        op: Op,
        value: impl Into<Binding>,
    ) -> Self {
        self.conditions.push(Where::value(Connector::Or, column, op, value));
        self
    }

    pub(crate) fn into_conditions(self) -> Vec<Where> {
        self.conditions
    }
}
