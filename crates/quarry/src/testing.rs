//! In-crate test doubles.

use crate::binding::Binding;
use crate::error::{OrmError, OrmResult};
use crate::executor::Executor;
use crate::grammar::{Grammar, PostgresGrammar};
use crate::row::Row;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// Replays queued responses in order and records every statement it runs.
/// With the queue empty it returns no rows.
pub(crate) struct ScriptedExecutor {
    grammar: Box<dyn Grammar>,
    responses: Mutex<VecDeque<OrmResult<Vec<Row>>>>,
    calls: Mutex<Vec<(String, Vec<Binding>)>>,
    delay: Option<Duration>,
}

impl ScriptedExecutor {
    pub(crate) fn new() -> Self {
        Self {
            grammar: Box::new(PostgresGrammar),
            responses: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    pub(crate) fn with_grammar(mut self, grammar: impl Grammar + 'static) -> Self {
        self.grammar = Box::new(grammar);
        self
    }

    pub(crate) fn respond(self, rows: Vec<Row>) -> Self {
        self.responses.lock().unwrap().push_back(Ok(rows));
        self
    }

    pub(crate) fn fail(self, message: &str) -> Self {
        let err = OrmError::execution("<scripted>", std::io::Error::other(message.to_string()));
        self.responses.lock().unwrap().push_back(Err(err));
        self
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn statements(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(sql, _)| sql.clone()).collect()
    }

    pub(crate) fn calls(&self) -> Vec<(String, Vec<Binding>)> {
        self.calls.lock().unwrap().clone()
    }

    fn next(&self, sql: &str, bindings: &[Binding]) -> OrmResult<Vec<Row>> {
        self.calls
            .lock()
            .unwrap()
            .push((sql.to_string(), bindings.to_vec()));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

#[async_trait::async_trait]
impl Executor for ScriptedExecutor {
    fn grammar(&self) -> &dyn Grammar {
        self.grammar.as_ref()
    }

    async fn query(&self, sql: &str, bindings: &[Binding]) -> OrmResult<Vec<Row>> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.next(sql, bindings)
    }

    async fn execute(&self, sql: &str, bindings: &[Binding]) -> OrmResult<u64> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.next(sql, bindings).map(|rows| rows.len() as u64)
    }
}

/// Build a row from `(column, value)` pairs of mixed kinds.
pub(crate) fn row(pairs: &[(&str, Binding)]) -> Row {
    Row::from_pairs(pairs.iter().cloned())
}

pub(crate) mod models {
    use crate::binding::Binding;
    use crate::cache::RelationCache;
    use crate::error::{OrmError, OrmResult};
    use crate::model::Model;
    use crate::relation::{BelongsTo, BelongsToMany, HasMany, HasOne};
    use crate::row::{FromRow, Row};

    #[derive(Debug, Clone, Default)]
    pub(crate) struct User {
        pub id: i64,
        pub team_id: Option<i64>,
        pub name: String,
        pub relations: RelationCache,
    }

    impl User {
        pub(crate) fn new(id: i64, team_id: Option<i64>) -> Self {
            Self {
                id,
                team_id,
                name: format!("user{id}"),
                relations: RelationCache::new(),
            }
        }

        pub(crate) fn posts() -> HasMany<User, Post> {
            User::has_many()
        }

        pub(crate) fn profile() -> HasOne<User, Post> {
            User::has_one()
        }

        pub(crate) fn team() -> BelongsTo<User, Team> {
            User::belongs_to()
        }

        pub(crate) fn roles() -> BelongsToMany<User, Role> {
            User::belongs_to_many("role_user")
        }
    }

    impl FromRow for User {
        fn from_row(row: &Row) -> OrmResult<Self> {
            Ok(Self {
                id: row.try_get("id")?,
                team_id: row.try_get("team_id")?,
                name: row.try_get("name")?,
                relations: RelationCache::new(),
            })
        }
    }

    impl Model for User {
        const TABLE: &'static str = "users";

        fn field(&self, column: &str) -> OrmResult<Binding> {
            match column {
                "id" => Ok(self.id.into()),
                "team_id" => Ok(self.team_id.into()),
                "name" => Ok(self.name.as_str().into()),
                _ => Err(OrmError::decode(column, "no such field on User")),
            }
        }

        fn relations(&self) -> &RelationCache {
            &self.relations
        }
    }

    #[derive(Debug, Clone)]
    pub(crate) struct Post {
        pub id: i64,
        pub user_id: i64,
        pub title: String,
        pub relations: RelationCache,
    }

    impl Post {
        pub(crate) fn comments() -> HasMany<Post, Comment> {
            Post::has_many()
        }
    }

    impl FromRow for Post {
        fn from_row(row: &Row) -> OrmResult<Self> {
            Ok(Self {
                id: row.try_get("id")?,
                user_id: row.try_get("user_id")?,
                title: row.try_get("title")?,
                relations: RelationCache::new(),
            })
        }
    }

    impl Model for Post {
        const TABLE: &'static str = "posts";

        fn field(&self, column: &str) -> OrmResult<Binding> {
            match column {
                "id" => Ok(self.id.into()),
                "user_id" => Ok(self.user_id.into()),
                _ => Err(OrmError::decode(column, "no such field on Post")),
            }
        }

        fn relations(&self) -> &RelationCache {
            &self.relations
        }
    }

    #[derive(Debug, Clone)]
    pub(crate) struct Comment {
        pub id: i64,
        pub post_id: i64,
        pub relations: RelationCache,
    }

    impl FromRow for Comment {
        fn from_row(row: &Row) -> OrmResult<Self> {
            Ok(Self {
                id: row.try_get("id")?,
                post_id: row.try_get("post_id")?,
                relations: RelationCache::new(),
            })
        }
    }

    impl Model for Comment {
        const TABLE: &'static str = "comments";

        fn field(&self, column: &str) -> OrmResult<Binding> {
            match column {
                "id" => Ok(self.id.into()),
                "post_id" => Ok(self.post_id.into()),
                _ => Err(OrmError::decode(column, "no such field on Comment")),
            }
        }

        fn relations(&self) -> &RelationCache {
            &self.relations
        }
    }

    /// Named rows (`teams`, `roles`) share a shape.
    macro_rules! named_model {
        ($name:ident, $table:literal) => {
            #[derive(Debug, Clone)]
            pub(crate) struct $name {
                pub id: i64,
                pub name: String,
                pub relations: RelationCache,
            }

            impl FromRow for $name {
                fn from_row(row: &Row) -> OrmResult<Self> {
                    Ok(Self {
                        id: row.try_get("id")?,
                        name: row.try_get("name")?,
                        relations: RelationCache::new(),
                    })
                }
            }

            impl Model for $name {
                const TABLE: &'static str = $table;

                fn field(&self, column: &str) -> OrmResult<Binding> {
                    match column {
                        "id" => Ok(self.id.into()),
                        _ => Err(OrmError::decode(column, "unknown field")),
                    }
                }

                fn relations(&self) -> &RelationCache {
                    &self.relations
                }
            }
        };
    }

    named_model!(Team, "teams");
    named_model!(Role, "roles");
}
