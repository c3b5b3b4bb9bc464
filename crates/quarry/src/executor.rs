//! The executor contract.
//!
//! Everything that runs SQL goes through [`Executor`]: the query builder's
//! terminal operations, the eager-load engine and the monitor wrapper. An
//! executor also names its [`Grammar`], so a query compiles for whichever
//! database it is sent to.

use crate::binding::Binding;
use crate::error::OrmResult;
use crate::grammar::Grammar;
use crate::row::Row;
use std::sync::Arc;

/// A database connection (or transaction) that runs compiled SQL.
///
/// SQL text uses `?` placeholders; drivers translate them if their protocol
/// needs something else. Driver errors are returned wrapped in
/// [`OrmError::Execution`](crate::OrmError::Execution) together with the SQL.
#[async_trait::async_trait]
pub trait Executor: Send + Sync {
    /// Grammar used to compile queries for this connection.
    fn grammar(&self) -> &dyn Grammar;

    /// Run a statement and return all rows.
    async fn query(&self, sql: &str, bindings: &[Binding]) -> OrmResult<Vec<Row>>;

    /// Run a statement and return the number of affected rows.
    async fn execute(&self, sql: &str, bindings: &[Binding]) -> OrmResult<u64>;

    /// Run a statement and return all rows, associating a tag for monitoring.
    ///
    /// The default implementation ignores `tag` and calls [`Executor::query`].
    async fn query_tagged(
        &self,
        tag: &str,
        sql: &str,
        bindings: &[Binding],
    ) -> OrmResult<Vec<Row>> {
        let _ = tag;
        self.query(sql, bindings).await
    }

    /// Run a statement and return the affected row count, associating a tag
    /// for monitoring.
    async fn execute_tagged(&self, tag: &str, sql: &str, bindings: &[Binding]) -> OrmResult<u64> {
        let _ = tag;
        self.execute(sql, bindings).await
    }
}

#[async_trait::async_trait]
impl<E: Executor + ?Sized> Executor for &E {
    fn grammar(&self) -> &dyn Grammar {
        (**self).grammar()
    }

    async fn query(&self, sql: &str, bindings: &[Binding]) -> OrmResult<Vec<Row>> {
        (**self).query(sql, bindings).await
    }

    async fn execute(&self, sql: &str, bindings: &[Binding]) -> OrmResult<u64> {
        (**self).execute(sql, bindings).await
    }

    async fn query_tagged(
        &self,
        tag: &str,
        sql: &str,
        bindings: &[Binding],
    ) -> OrmResult<Vec<Row>> {
        (**self).query_tagged(tag, sql, bindings).await
    }

    async fn execute_tagged(&self, tag: &str, sql: &str, bindings: &[Binding]) -> OrmResult<u64> {
        (**self).execute_tagged(tag, sql, bindings).await
    }
}

#[async_trait::async_trait]
impl<E: Executor + ?Sized> Executor for Box<E> {
    fn grammar(&self) -> &dyn Grammar {
        (**self).grammar()
    }

    async fn query(&self, sql: &str, bindings: &[Binding]) -> OrmResult<Vec<Row>> {
        (**self).query(sql, bindings).await
    }

    async fn execute(&self, sql: &str, bindings: &[Binding]) -> OrmResult<u64> {
        (**self).execute(sql, bindings).await
    }

    async fn query_tagged(
        &self,
        tag: &str,
        sql: &str,
        bindings: &[Binding],
    ) -> OrmResult<Vec<Row>> {
        (**self).query_tagged(tag, sql, bindings).await
    }

    async fn execute_tagged(&self, tag: &str, sql: &str, bindings: &[Binding]) -> OrmResult<u64> {
        (**self).execute_tagged(tag, sql, bindings).await
    }
}

#[async_trait::async_trait]
impl<E: Executor + ?Sized> Executor for Arc<E> {
    fn grammar(&self) -> &dyn Grammar {
        (**self).grammar()
    }

    async fn query(&self, sql: &str, bindings: &[Binding]) -> OrmResult<Vec<Row>> {
        (**self).query(sql, bindings).await
    }

    async fn execute(&self, sql: &str, bindings: &[Binding]) -> OrmResult<u64> {
        (**self).execute(sql, bindings).await
    }

    async fn query_tagged(
        &self,
        tag: &str,
        sql: &str,
        bindings: &[Binding],
    ) -> OrmResult<Vec<Row>> {
        (**self).query_tagged(tag, sql, bindings).await
    }

    async fn execute_tagged(&self, tag: &str, sql: &str, bindings: &[Binding]) -> OrmResult<u64> {
        (**self).execute_tagged(tag, sql, bindings).await
    }
}
