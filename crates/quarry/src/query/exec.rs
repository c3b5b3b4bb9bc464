//! Terminal operations: compile with the executor's grammar, then run.

use super::{Changes, Query};
use crate::binding::{Binding, Fields};
use crate::error::{OrmError, OrmResult};
use crate::executor::Executor;
use crate::row::{FromRow, Row};
use crate::sql::sql;

impl Query {
    /// All rows.
    pub async fn get<E: Executor + ?Sized>(&self, db: &E) -> OrmResult<Vec<Row>> {
        let compiled = db.grammar().compile_select(self)?;
        db.query(compiled.text(), compiled.bindings()).await
    }

    /// All rows, tagged for monitoring.
    pub async fn get_tagged<E: Executor + ?Sized>(&self, db: &E, tag: &str) -> OrmResult<Vec<Row>> {
        let compiled = db.grammar().compile_select(self)?;
        db.query_tagged(tag, compiled.text(), compiled.bindings()).await
    }

    pub async fn fetch_all<T: FromRow, E: Executor + ?Sized>(&self, db: &E) -> OrmResult<Vec<T>> {
        self.get(db).await?.iter().map(T::from_row).collect()
    }

    /// First row (`LIMIT 1`), or `None`.
    pub async fn first<E: Executor + ?Sized>(&self, db: &E) -> OrmResult<Option<Row>> {
        let rows = self.clone().limit(1).get(db).await?;
        Ok(rows.into_iter().next())
    }

    pub async fn fetch_opt<T: FromRow, E: Executor + ?Sized>(
        &self,
        db: &E,
    ) -> OrmResult<Option<T>> {
        self.first(db).await?.as_ref().map(T::from_row).transpose()
    }

    /// First row decoded, or [`OrmError::NotFound`].
    pub async fn fetch_one<T: FromRow, E: Executor + ?Sized>(&self, db: &E) -> OrmResult<T> {
        match self.first(db).await? {
            Some(row) => T::from_row(&row),
            None => Err(OrmError::not_found(format!(
                "no row in {}",
                self.table.as_deref().unwrap_or("<no table>")
            ))),
        }
    }

    /// First row where `column = value`.
    pub async fn find<E: Executor + ?Sized>(
        &self,
        db: &E,
        column: &str,
        value: impl Into<Binding>,
    ) -> OrmResult<Option<Row>> {
        self.clone().where_eq(column, value).first(db).await
    }

    pub async fn count<E: Executor + ?Sized>(&self, db: &E) -> OrmResult<i64> {
        let compiled = db.grammar().compile_count(self)?;
        let rows = db.query(compiled.text(), compiled.bindings()).await?;
        match rows.first() {
            Some(row) => row.try_get("count"),
            None => Ok(0),
        }
    }

    pub async fn exists<E: Executor + ?Sized>(&self, db: &E) -> OrmResult<bool> {
        let compiled = db.grammar().compile_exists(self)?;
        let rows = db.query(compiled.text(), compiled.bindings()).await?;
        match rows.first() {
            Some(row) => row.try_get("exists"),
            None => Ok(false),
        }
    }

    /// Insert rows; returns the affected row count.
    pub async fn insert<E: Executor + ?Sized>(&self, db: &E, rows: &[Fields]) -> OrmResult<u64> {
        let compiled = db.grammar().compile_insert(self, rows)?;
        db.execute(compiled.text(), compiled.bindings()).await
    }

    /// Insert rows and read them back, assuming an `id` primary key.
    pub async fn insert_return<E: Executor + ?Sized>(
        &self,
        db: &E,
        rows: &[Fields],
    ) -> OrmResult<Vec<Row>> {
        self.insert_return_keyed(db, rows, "id").await
    }

    /// Insert rows and read them back.
    ///
    /// `primary_key` is only used by dialects without `RETURNING`.
    pub async fn insert_return_keyed<E: Executor + ?Sized>(
        &self,
        db: &E,
        rows: &[Fields],
        primary_key: &str,
    ) -> OrmResult<Vec<Row>> {
        let statements = db.grammar().compile_insert_return(self, rows, primary_key)?;
        let mut out = Vec::with_capacity(rows.len());
        for statement in statements {
            out.extend(db.query(statement.text(), statement.bindings()).await?);
        }
        Ok(out)
    }

    /// Apply `changes` to every matching row; returns the affected row count.
    pub async fn update<E: Executor + ?Sized>(&self, db: &E, changes: &Changes) -> OrmResult<u64> {
        let compiled = db.grammar().compile_update(self, changes)?;
        db.execute(compiled.text(), compiled.bindings()).await
    }

    /// `column = column + by`
    pub async fn increment<E: Executor + ?Sized>(
        &self,
        db: &E,
        column: &str,
        by: impl Into<Binding>,
    ) -> OrmResult<u64> {
        let changes = Changes::new().set_raw(column, sql(format!("{column} + ?")).bind(by));
        self.update(db, &changes).await
    }

    /// `column = column - by`
    pub async fn decrement<E: Executor + ?Sized>(
        &self,
        db: &E,
        column: &str,
        by: impl Into<Binding>,
    ) -> OrmResult<u64> {
        let changes = Changes::new().set_raw(column, sql(format!("{column} - ?")).bind(by));
        self.update(db, &changes).await
    }

    /// Delete every matching row; returns the affected row count.
    pub async fn delete<E: Executor + ?Sized>(&self, db: &E) -> OrmResult<u64> {
        let compiled = db.grammar().compile_delete(self)?;
        db.execute(compiled.text(), compiled.bindings()).await
    }
}
