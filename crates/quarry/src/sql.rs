//! Compiled SQL fragments.
//!
//! A [`Sql`] is SQL text using `?` placeholders plus the values bound to
//! them, in placeholder order. Grammars build statements by appending
//! fragments; drivers receive the final text and bindings.
//!
//! ```ignore
//! use quarry::sql;
//!
//! let raw = sql("price * ? > ?").bind(2).bind(100);
//! let q = Query::table("items").where_raw(raw);
//! ```

use crate::binding::Binding;

/// SQL text with `?` placeholders and its ordered bindings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sql {
    text: String,
    bindings: Vec<Binding>,
}

/// Start a SQL fragment.
pub fn sql(text: impl Into<String>) -> Sql {
    Sql::new(text)
}

impl Sql {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bindings: Vec::new(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn into_parts(self) -> (String, Vec<Binding>) {
        (self.text, self.bindings)
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Append raw SQL (no parameters).
    pub fn push(&mut self, sql: &str) -> &mut Self {
        self.text.push_str(sql);
        self
    }

    /// Append a `?` placeholder and bind its value.
    pub fn push_bind(&mut self, value: impl Into<Binding>) -> &mut Self {
        self.text.push('?');
        self.bindings.push(value.into());
        self
    }

    /// Append `?, ?, ?` for every value.
    pub fn push_bind_list<I>(&mut self, values: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<Binding>,
    {
        for (i, value) in values.into_iter().enumerate() {
            if i > 0 {
                self.text.push_str(", ");
            }
            self.push_bind(value);
        }
        self
    }

    /// Append another fragment, consuming it.
    pub fn push_sql(&mut self, other: Sql) -> &mut Self {
        self.text.push_str(&other.text);
        self.bindings.extend(other.bindings);
        self
    }

    /// Bind a value for a `?` that is already part of the text.
    pub fn bind(mut self, value: impl Into<Binding>) -> Self {
        self.bindings.push(value.into());
        self
    }

    /// Join fragments with a separator, concatenating bindings in order.
    pub fn join(parts: impl IntoIterator<Item = Sql>, separator: &str) -> Sql {
        let mut out = Sql::empty();
        for (i, part) in parts.into_iter().enumerate() {
            if i > 0 {
                out.push(separator);
            }
            out.push_sql(part);
        }
        out
    }

    /// Remove a leading token (e.g. a boolean connector) from the text.
    pub(crate) fn strip_prefix(&mut self, prefix: &str) {
        if let Some(rest) = self.text.strip_prefix(prefix) {
            self.text = rest.to_string();
        }
    }

    /// Number of `?` placeholders outside quoted literals and identifiers.
    pub fn placeholder_count(&self) -> usize {
        let mut count = 0;
        scan_placeholders(&self.text, |_| count += 1);
        count
    }

    /// Render the text with `$1, $2, ...` placeholders.
    pub fn numbered(&self) -> String {
        number_placeholders(&self.text)
    }
}

impl From<&str> for Sql {
    fn from(text: &str) -> Self {
        Sql::new(text)
    }
}

impl From<String> for Sql {
    fn from(text: String) -> Self {
        Sql::new(text)
    }
}

/// Rewrite `?` to `$n`, leaving `'...'`, `"..."` and `` `...` `` untouched.
pub fn number_placeholders(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    let mut last = 0;
    let mut n = 0;
    scan_placeholders(text, |idx| {
        n += 1;
        out.push_str(&text[last..idx]);
        out.push('$');
        out.push_str(&n.to_string());
        last = idx + 1;
    });
    out.push_str(&text[last..]);
    out
}

fn scan_placeholders(text: &str, mut on_placeholder: impl FnMut(usize)) {
    let mut quote: Option<char> = None;
    for (idx, ch) in text.char_indices() {
        match quote {
            // Doubled quotes re-enter the literal on the next char.
            Some(q) if ch == q => quote = None,
            Some(_) => {}
            None => match ch {
                '\'' | '"' | '`' => quote = Some(ch),
                '?' => on_placeholder(idx),
                _ => {}
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_bind_tracks_order() {
        let mut q = sql("SELECT * FROM users WHERE a = ");
        q.push_bind(1).push(" AND b IN (").push_bind_list(["x", "y"]).push(")");

        assert_eq!(q.text(), "SELECT * FROM users WHERE a = ? AND b IN (?, ?)");
        assert_eq!(
            q.bindings(),
            &[Binding::Int(1), Binding::from("x"), Binding::from("y")]
        );
        assert_eq!(q.placeholder_count(), 3);
    }

    #[test]
    fn numbering_skips_quoted_text() {
        let q = sql("SELECT '?' AS q, \"odd?\" FROM t WHERE a = ? AND b = ?");
        assert_eq!(
            q.numbered(),
            "SELECT '?' AS q, \"odd?\" FROM t WHERE a = $1 AND b = $2"
        );
        assert_eq!(q.placeholder_count(), 2);
    }

    #[test]
    fn numbering_handles_escaped_quotes() {
        assert_eq!(
            number_placeholders("SELECT 'it''s?' WHERE x = ?"),
            "SELECT 'it''s?' WHERE x = $1"
        );
    }

    #[test]
    fn join_concatenates_bindings() {
        let joined = Sql::join(
            [sql("a = ?").bind(1), sql("b"), sql("c = ?").bind(3)],
            " ",
        );
        assert_eq!(joined.text(), "a = ? b c = ?");
        assert_eq!(joined.bindings(), &[Binding::Int(1), Binding::Int(3)]);
    }
}
