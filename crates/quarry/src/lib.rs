//! # quarry
//!
//! A fluent SQL query builder with per-dialect grammars, and a relationship
//! layer that loads related rows in batches instead of one query per row.
//!
//! ## Features
//!
//! - **Dialect-independent builder**: a [`Query`] is a plain value; a
//!   [`Grammar`] turns it into SQL text plus ordered bindings
//! - **Three dialects**: PostgreSQL, MySQL and SQLite grammars
//! - **Executor-agnostic**: anything implementing [`Executor`] can run
//!   queries; drivers for `tokio-postgres` and `rusqlite` are included
//! - **Relationships**: has-one, has-many, belongs-to, belongs-to-many and
//!   through chains with inferred keys
//! - **Eager loading**: one query per relationship, however many owners
//! - **Query monitoring**: timing, timeouts and statistics for every statement
//!
//! ## Query builder
//!
//! ```ignore
//! use quarry::{Op, Query, fields};
//!
//! let rows = Query::table("users")
//!     .where_group(|q| q.and_where("age", Op::Lt, 18).or_where("role", Op::Eq, "guest"))
//!     .where_not_null("email")
//!     .order_by_desc("created_at")
//!     .page(2, 20)
//!     .get(&db)
//!     .await?;
//!
//! Query::table("users")
//!     .insert(&db, &[fields! { "name" => "alice", "age" => 30 }])
//!     .await?;
//! ```
//!
//! ## Relationships
//!
//! ```ignore
//! let users = User::query()
//!     .with(User::posts())
//!     .with(User::roles())
//!     .all(&db)
//!     .await?;
//!
//! // Served from the instance cache; no query runs.
//! let posts = User::posts().get(&db, &users[0]).await?;
//! ```

pub mod binding;
pub mod cache;
pub mod condition;
pub mod driver;
pub mod eager;
pub mod error;
pub mod executor;
pub mod grammar;
pub mod model;
pub mod monitor;
pub mod prelude;
pub mod query;
pub mod relation;
pub mod row;
pub mod sql;

#[cfg(test)]
mod testing;

pub use binding::{Binding, Fields, to_fields};
pub use cache::RelationCache;
pub use condition::{Connector, Op, Where};
pub use eager::EagerLoad;
pub use error::{OrmError, OrmResult};
pub use executor::Executor;
pub use grammar::{Grammar, MySqlGrammar, PostgresGrammar, SqliteGrammar};
pub use model::{Model, ModelQuery};
pub use monitor::{
    CompositeMonitor, InstrumentedExecutor, MonitorConfig, NoopMonitor, QueryContext,
    QueryMonitor, QueryResult, QueryStats, QueryType, StatsMonitor, TracingMonitor,
};
pub use query::{Changes, Direction, JoinType, Lock, Query};
pub use relation::{
    BelongsTo, BelongsToMany, HasMany, HasOne, KeyStyle, Many, One, Relation, Through,
};
pub use row::{FromBinding, FromRow, Row};
pub use sql::{Sql, sql};

#[cfg(feature = "sqlite")]
pub use driver::sqlite::SqliteExecutor;
