use super::{RelationDescriptor, RelationKind, foreign_key};
use crate::binding::Binding;
use crate::condition::Op;
use crate::error::{OrmError, OrmResult};
use crate::query::Query;
use std::collections::HashMap;

/// Column alias carrying the owner-side key in batched relation queries.
pub const OWNER_KEY_ALIAS: &str = "__quarry_owner_key";

/// `from_table.from_key = to_table.to_key`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub from_table: String,
    pub from_key: String,
    pub to_table: String,
    pub to_key: String,
}

/// A fully resolved relationship path, owner first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    pub links: Vec<Link>,
    pub kind: RelationKind,
    pub strict: bool,
}

struct Node<'a> {
    table: &'a str,
    primary_key: &'a str,
    pivot: bool,
    /// Explicit column linking to the previous node.
    prev_key: Option<&'a str>,
    /// Explicit column linking to the next node.
    next_key: Option<&'a str>,
}

impl RelationDescriptor {
    /// Resolve every link's columns, applying explicit keys first and
    /// inferring the rest.
    pub fn resolve(&self) -> OrmResult<Chain> {
        let mut nodes = Vec::with_capacity(self.through.len() + 2);
        nodes.push(Node {
            table: &self.from_table,
            primary_key: &self.from_pk,
            pivot: false,
            prev_key: None,
            next_key: self.from_key.as_deref(),
        });
        for hop in &self.through {
            nodes.push(Node {
                table: &hop.table,
                primary_key: &hop.primary_key,
                pivot: hop.pivot,
                prev_key: hop.from_key.as_deref(),
                next_key: hop.to_key.as_deref(),
            });
        }
        nodes.push(Node {
            table: &self.to_table,
            primary_key: &self.to_pk,
            pivot: false,
            prev_key: self.to_key.as_deref(),
            next_key: None,
        });

        if let Some(node) = nodes.iter().find(|n| n.table.is_empty()) {
            return Err(OrmError::config(format!(
                "relationship has an empty table name (primary key '{}')",
                node.primary_key
            )));
        }

        // Target to source; each link only looks at its own two nodes.
        let mut links = Vec::with_capacity(nodes.len() - 1);
        for pair in nodes.windows(2).rev() {
            let (a, b) = (&pair[0], &pair[1]);
            let (from_key, to_key) = match (a.next_key, b.prev_key) {
                (Some(from), Some(to)) => (from.to_string(), to.to_string()),
                (from, to) => {
                    let (inferred_from, inferred_to) = self.infer(a, b)?;
                    (
                        from.map_or(inferred_from, str::to_string),
                        to.map_or(inferred_to, str::to_string),
                    )
                }
            };
            if from_key.is_empty() || to_key.is_empty() {
                return Err(OrmError::config(format!(
                    "empty key between '{}' and '{}'",
                    a.table, b.table
                )));
            }
            links.push(Link {
                from_table: a.table.to_string(),
                from_key,
                to_table: b.table.to_string(),
                to_key,
            });
        }
        links.reverse();

        // Pivot nodes sit strictly between the owner and the target.
        for (i, node) in nodes.iter().enumerate().filter(|(_, n)| n.pivot) {
            let explicit = node.prev_key.is_some() && node.next_key.is_some();
            if !explicit && links[i - 1].to_key == links[i].from_key {
                return Err(OrmError::config(format!(
                    "pivot '{}' links '{}' and '{}' through the same column '{}'; \
                     set distinct keys with Through::from/to",
                    node.table,
                    links[i - 1].from_table,
                    links[i].to_table,
                    links[i].from_key
                )));
            }
        }

        Ok(Chain {
            links,
            kind: self.kind,
            strict: self.strict,
        })
    }

    fn infer(&self, a: &Node<'_>, b: &Node<'_>) -> OrmResult<(String, String)> {
        let fk = |table: &str| foreign_key(table, self.key_style);
        match (a.pivot, b.pivot) {
            (true, true) => Err(OrmError::config(format!(
                "cannot infer keys between pivot tables '{}' and '{}'; set them with Through::from/to",
                a.table, b.table
            ))),
            (false, true) => Ok((a.primary_key.to_string(), fk(a.table))),
            (true, false) => Ok((fk(b.table), b.primary_key.to_string())),
            (false, false) => match self.kind {
                RelationKind::Has => Ok((a.primary_key.to_string(), fk(a.table))),
                RelationKind::Belongs => Ok((fk(b.table), b.primary_key.to_string())),
            },
        }
    }
}

impl Chain {
    /// Owner column whose values drive the batched query.
    pub fn owner_key(&self) -> &str {
        &self.links[0].from_key
    }

    /// Identifies everything that shapes the generated query.
    pub fn cache_key(&self) -> String {
        let path: Vec<String> = self
            .links
            .iter()
            .map(|l| format!("{}.{}={}.{}", l.from_table, l.from_key, l.to_table, l.to_key))
            .collect();
        let mut key = format!("{}:{}", self.kind.as_str(), path.join(","));
        if self.strict {
            key.push_str(":strict");
        }
        key
    }

    /// One query for every owner key: the target rows, joined back through
    /// each hop, plus the first hop's key as [`OWNER_KEY_ALIAS`].
    pub fn batch_query(&self, keys: Vec<Binding>) -> Query {
        let refs = self.table_refs();
        let first = &refs[0];
        let target = &refs[refs.len() - 1];

        let mut query = Query::table(target.expr.clone()).select([
            format!("{}.*", target.name),
            format!("{}.{} AS {OWNER_KEY_ALIAS}", first.name, self.links[0].to_key),
        ]);
        for i in (1..self.links.len()).rev() {
            let link = &self.links[i];
            let (left, right) = (&refs[i - 1], &refs[i]);
            query = query.join(
                left.expr.clone(),
                format!("{}.{}", left.name, link.from_key),
                Op::Eq,
                format!("{}.{}", right.name, link.to_key),
            );
        }
        query.where_in(format!("{}.{}", first.name, self.links[0].to_key), keys)
    }

    /// FROM/JOIN expression and reference name of each non-owner table.
    /// Repeated tables are aliased `<table>_<n>`.
    fn table_refs(&self) -> Vec<TableRef> {
        let mut seen: HashMap<&str, usize> = HashMap::new();
        self.links
            .iter()
            .map(|link| {
                let table = link.to_table.as_str();
                let count = seen.entry(table).or_insert(0);
                *count += 1;
                if *count == 1 {
                    TableRef {
                        expr: table.to_string(),
                        name: table.to_string(),
                    }
                } else {
                    let alias = format!("{}_{}", table.replace('.', "_"), count);
                    TableRef {
                        expr: format!("{table} AS {alias}"),
                        name: alias,
                    }
                }
            })
            .collect()
    }
}

struct TableRef {
    expr: String,
    name: String,
}
