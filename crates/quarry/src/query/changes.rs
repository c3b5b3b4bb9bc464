use crate::binding::Binding;
use crate::sql::Sql;

/// Right-hand side of a `SET column = ...` assignment.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Bound literal.
    Bind(Binding),
    /// Column-level expression emitted verbatim, e.g. `count + ?`.
    Raw(Sql),
}

/// Ordered assignments for an UPDATE.
///
/// ```ignore
/// let changes = Changes::new()
///     .set("name", "ann")
///     .set_raw("visits", sql("visits + ?").bind(1));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Changes {
    assignments: Vec<(String, Value)>,
}

impl Changes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, column: impl Into<String>, value: impl Into<Binding>) -> Self {
        self.assignments.push((column.into(), Value::Bind(value.into())));
        self
    }

    pub fn set_raw(mut self, column: impl Into<String>, expr: impl Into<Sql>) -> Self {
        self.assignments.push((column.into(), Value::Raw(expr.into())));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.assignments.iter().map(|(c, v)| (c.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<Binding>> FromIterator<(K, V)> for Changes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Changes::new(), |changes, (k, v)| changes.set(k, v))
    }
}

impl From<crate::binding::Fields> for Changes {
    fn from(fields: crate::binding::Fields) -> Self {
        fields.into_iter().collect()
    }
}
