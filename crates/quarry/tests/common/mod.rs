#![allow(dead_code)]

use quarry::grammar::{ColumnDef, ColumnType, CreateTable};
use quarry::prelude::*;
use quarry::{Grammar, SqliteExecutor};

#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub team_id: Option<i64>,
    pub visits: i64,
    pub relations: RelationCache,
}

impl User {
    pub fn posts() -> HasMany<User, Post> {
        User::has_many()
    }

    pub fn team() -> BelongsTo<User, Team> {
        User::belongs_to()
    }

    pub fn roles() -> BelongsToMany<User, Role> {
        User::belongs_to_many("role_user")
    }

    pub fn comments() -> HasMany<User, Comment> {
        User::has_many().through("posts")
    }
}

impl FromRow for User {
    fn from_row(row: &Row) -> OrmResult<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            team_id: row.try_get("team_id")?,
            visits: row.try_get("visits")?,
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
            _ => Err(OrmError::decode(column, "no such field on User")),
        }
    }

    fn relations(&self) -> &RelationCache {
        &self.relations
    }
}

#[derive(Debug, Clone)]
pub struct Post {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub published: bool,
    pub relations: RelationCache,
}

impl Post {
    pub fn author() -> BelongsTo<Post, User> {
        Post::belongs_to()
    }

    pub fn comments() -> HasMany<Post, Comment> {
        Post::has_many()
    }
}

impl FromRow for Post {
    fn from_row(row: &Row) -> OrmResult<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            title: row.try_get("title")?,
            published: row.try_get("published")?,
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
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub body: String,
    pub relations: RelationCache,
}

impl FromRow for Comment {
    fn from_row(row: &Row) -> OrmResult<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            post_id: row.try_get("post_id")?,
            body: row.try_get("body")?,
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

#[derive(Debug, Clone)]
pub struct Team {
    pub id: i64,
    pub name: String,
    pub relations: RelationCache,
}

impl FromRow for Team {
    fn from_row(row: &Row) -> OrmResult<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            relations: RelationCache::new(),
        })
    }
}

impl Model for Team {
    const TABLE: &'static str = "teams";

    fn field(&self, column: &str) -> OrmResult<Binding> {
        match column {
            "id" => Ok(self.id.into()),
            _ => Err(OrmError::decode(column, "no such field on Team")),
        }
    }

    fn relations(&self) -> &RelationCache {
        &self.relations
    }
}

#[derive(Debug, Clone)]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub relations: RelationCache,
}

impl FromRow for Role {
    fn from_row(row: &Row) -> OrmResult<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            relations: RelationCache::new(),
        })
    }
}

impl Model for Role {
    const TABLE: &'static str = "roles";

    fn field(&self, column: &str) -> OrmResult<Binding> {
        match column {
            "id" => Ok(self.id.into()),
            _ => Err(OrmError::decode(column, "no such field on Role")),
        }
    }

    fn relations(&self) -> &RelationCache {
        &self.relations
    }
}

fn id() -> ColumnDef {
    ColumnDef::new("id", ColumnType::Increments)
}

/// In-memory database with the blog schema and no rows.
pub fn database() -> SqliteExecutor {
    let db = SqliteExecutor::open_in_memory().expect("open in-memory sqlite");
    let tables = [
        CreateTable::new("teams")
            .column(id())
            .column(ColumnDef::new("name", ColumnType::String(None))),
        CreateTable::new("users")
            .column(id())
            .column(ColumnDef::new("name", ColumnType::String(None)))
            .column(
                ColumnDef::new("team_id", ColumnType::BigInt)
                    .nullable()
                    .references("teams", "id"),
            )
            .column(ColumnDef::new("visits", ColumnType::Int).default_raw("0")),
        CreateTable::new("posts")
            .column(id())
            .column(ColumnDef::new("user_id", ColumnType::BigInt).references("users", "id"))
            .column(ColumnDef::new("title", ColumnType::String(None)))
            .column(ColumnDef::new("published", ColumnType::Bool).default_raw("0")),
        CreateTable::new("comments")
            .column(id())
            .column(ColumnDef::new("post_id", ColumnType::BigInt).references("posts", "id"))
            .column(ColumnDef::new("body", ColumnType::Text)),
        CreateTable::new("roles")
            .column(id())
            .column(ColumnDef::new("name", ColumnType::String(None))),
        CreateTable::new("role_user")
            .column(ColumnDef::new("user_id", ColumnType::BigInt))
            .column(ColumnDef::new("role_id", ColumnType::BigInt)),
    ];
    for table in &tables {
        let sql = db.grammar().compile_create_table(table).expect("compile table");
        db.execute_batch(sql.text()).expect("create table");
    }
    db
}
