//! Condition tree used by WHERE, HAVING and JOIN ... ON.
//!
//! A condition list is a flat sequence of [`Where`] nodes. Each node records
//! how it joins to the node before it; the compiler drops the connector of
//! whichever node ends up first. Grouping is expressed with
//! [`WhereKind::Nested`].

use crate::binding::Binding;
use crate::query::Query;
use crate::sql::Sql;

/// How a node joins to its previous sibling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connector {
    And,
    Or,
}

impl Connector {
    pub fn as_sql(self) -> &'static str {
        match self {
            Connector::And => "AND",
            Connector::Or => "OR",
        }
    }
}

/// Comparison operator.
///
/// # Example
/// ```ignore
/// Query::table("users")
///     .and_where("age", Op::Gte, 18)
///     .and_where("name", Op::Like, "a%");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    Like,
    NotLike,
}

impl Op {
    pub fn as_sql(self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Ne => "<>",
            Op::Lt => "<",
            Op::Lte => "<=",
            Op::Gt => ">",
            Op::Gte => ">=",
            Op::Like => "LIKE",
            Op::NotLike => "NOT LIKE",
        }
    }
}

/// Right-hand side of an `IN` test.
#[derive(Debug, Clone, PartialEq)]
pub enum InValues {
    List(Vec<Binding>),
    Query(Box<Query>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum WhereKind {
    /// `column op ?`
    Value {
        column: String,
        op: Op,
        value: Binding,
    },
    /// `first op second`, both columns
    Column {
        first: String,
        op: Op,
        second: String,
    },
    /// `column [NOT] IN (...)`
    In {
        column: String,
        values: InValues,
        negated: bool,
    },
    /// Parenthesized sub-list
    Nested(Vec<Where>),
    /// Caller-supplied fragment, emitted verbatim with its bindings
    Raw(Sql),
}

/// One node of a condition list.
#[derive(Debug, Clone, PartialEq)]
pub struct Where {
    pub connector: Connector,
    pub kind: WhereKind,
}

impl Where {
    pub fn value(
        connector: Connector,
        column: impl Into<String>,
        op: Op,
        value: impl Into<Binding>,
    ) -> Self {
        Self {
            connector,
            kind: WhereKind::Value {
                column: column.into(),
                op,
                value: value.into(),
            },
        }
    }

    pub fn column(
        connector: Connector,
        first: impl Into<String>,
        op: Op,
        second: impl Into<String>,
    ) -> Self {
        Self {
            connector,
            kind: WhereKind::Column {
                first: first.into(),
                op,
                second: second.into(),
            },
        }
    }

    /// `IN` list. An empty list becomes a constant: `FALSE` for `IN`,
    /// `TRUE` for `NOT IN`, so `IN ()` never reaches SQL.
    pub fn in_list(
        connector: Connector,
        column: impl Into<String>,
        values: Vec<Binding>,
        negated: bool,
    ) -> Self {
        if values.is_empty() {
            return Self::raw(connector, Sql::new(if negated { "TRUE" } else { "FALSE" }));
        }
        Self {
            connector,
            kind: WhereKind::In {
                column: column.into(),
                values: InValues::List(values),
                negated,
            },
        }
    }

    pub fn in_query(
        connector: Connector,
        column: impl Into<String>,
        query: Query,
        negated: bool,
    ) -> Self {
        Self {
            connector,
            kind: WhereKind::In {
                column: column.into(),
                values: InValues::Query(Box::new(query)),
                negated,
            },
        }
    }

    pub fn nested(connector: Connector, children: Vec<Where>) -> Self {
        Self {
            connector,
            kind: WhereKind::Nested(children),
        }
    }

    pub fn raw(connector: Connector, sql: impl Into<Sql>) -> Self {
        Self {
            connector,
            kind: WhereKind::Raw(sql.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_in_list_short_circuits() {
        let node = Where::in_list(Connector::And, "id", vec![], false);
        assert_eq!(node.kind, WhereKind::Raw(Sql::new("FALSE")));

        let node = Where::in_list(Connector::Or, "id", vec![], true);
        assert_eq!(node.connector, Connector::Or);
        assert_eq!(node.kind, WhereKind::Raw(Sql::new("TRUE")));
    }

    #[test]
    fn operators_render() {
        assert_eq!(Op::Ne.as_sql(), "<>");
        assert_eq!(Op::NotLike.as_sql(), "NOT LIKE");
        assert_eq!(Connector::Or.as_sql(), "OR");
    }
}
