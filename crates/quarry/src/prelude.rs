//! Convenient imports for typical `quarry` usage.
//!
//! ```ignore
//! use quarry::prelude::*;
//! ```

pub use crate::{
    Binding, Changes, Direction, Executor, Fields, FromRow, Model, ModelQuery, Op, OrmError,
    OrmResult, Query, RelationCache, Row, Sql, fields, sql,
};
pub use crate::{BelongsTo, BelongsToMany, HasMany, HasOne, Through};
