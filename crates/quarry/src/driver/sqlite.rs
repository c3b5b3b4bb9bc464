//! `rusqlite` executor.
//!
//! The connection sits behind a mutex and statements run synchronously
//! inside the async call; no lock is held across an await point.

use crate::binding::Binding;
use crate::error::{OrmError, OrmResult};
use crate::executor::Executor;
use crate::grammar::{Grammar, SqliteGrammar};
use crate::row::Row;
use rusqlite::types::{ToSqlOutput, Value, ValueRef};
use rusqlite::{Connection, ToSql, params_from_iter};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

impl ToSql for Binding {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Binding::Null => ToSqlOutput::Owned(Value::Null),
            Binding::Int(v) => ToSqlOutput::Owned(Value::Integer(*v)),
            Binding::Double(v) => ToSqlOutput::Owned(Value::Real(*v)),
            Binding::Bool(v) => ToSqlOutput::Owned(Value::Integer(i64::from(*v))),
            Binding::String(v) => ToSqlOutput::Borrowed(ValueRef::Text(v.as_bytes())),
            Binding::Date(v) => ToSqlOutput::Owned(Value::Text(
                v.to_rfc3339_opts(chrono::SecondsFormat::Micros, true),
            )),
            Binding::Uuid(v) => ToSqlOutput::Owned(Value::Text(v.to_string())),
            Binding::Json(v) => ToSqlOutput::Owned(Value::Text(v.to_string())),
            Binding::Bytes(v) => ToSqlOutput::Borrowed(ValueRef::Blob(v)),
        })
    }
}

fn from_sqlite(value: Value) -> Binding {
    match value {
        Value::Null => Binding::Null,
        Value::Integer(v) => Binding::Int(v),
        Value::Real(v) => Binding::Double(v),
        Value::Text(v) => Binding::String(v),
        Value::Blob(v) => Binding::Bytes(v),
    }
}

/// An [`Executor`] over a single SQLite connection.
pub struct SqliteExecutor {
    conn: Mutex<Connection>,
}

impl SqliteExecutor {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    pub fn open(path: impl AsRef<Path>) -> OrmResult<Self> {
        let conn = Connection::open(path.as_ref())
            .map_err(|e| OrmError::execution(format!("open {}", path.as_ref().display()), e))?;
        Ok(Self::new(conn))
    }

    pub fn open_in_memory() -> OrmResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| OrmError::execution("open :memory:", e))?;
        Ok(Self::new(conn))
    }

    /// Run a batch of `;`-separated statements without bindings.
    pub fn execute_batch(&self, sql: &str) -> OrmResult<()> {
        self.lock()
            .execute_batch(sql)
            .map_err(|e| OrmError::execution(sql, e))
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn query_sync(&self, sql: &str, bindings: &[Binding]) -> OrmResult<Vec<Row>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(sql).map_err(|e| OrmError::execution(sql, e))?;
        let columns: Arc<[String]> = stmt
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();

        let mut rows = stmt
            .query(params_from_iter(bindings.iter()))
            .map_err(|e| OrmError::execution(sql, e))?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(|e| OrmError::execution(sql, e))? {
            let mut values = Vec::with_capacity(columns.len());
            for (idx, name) in columns.iter().enumerate() {
                let value: Value = row
                    .get(idx)
                    .map_err(|e| OrmError::decode(name.as_str(), e.to_string()))?;
                values.push(from_sqlite(value));
            }
            out.push(Row::new(Arc::clone(&columns), values));
        }
        Ok(out)
    }

    fn execute_sync(&self, sql: &str, bindings: &[Binding]) -> OrmResult<u64> {
        let conn = self.lock();
        let affected = conn
            .execute(sql, params_from_iter(bindings.iter()))
            .map_err(|e| OrmError::execution(sql, e))?;
        Ok(affected as u64)
    }
}

#[async_trait::async_trait]
impl Executor for SqliteExecutor {
    fn grammar(&self) -> &dyn Grammar {
        &SqliteGrammar
    }

    async fn query(&self, sql: &str, bindings: &[Binding]) -> OrmResult<Vec<Row>> {
        self.query_sync(sql, bindings)
    }

    async fn execute(&self, sql: &str, bindings: &[Binding]) -> OrmResult<u64> {
        self.execute_sync(sql, bindings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trips_every_binding_kind() {
        let db = SqliteExecutor::open_in_memory().unwrap();
        let id = uuid::Uuid::new_v4();
        let rows = db
            .query(
                "SELECT ? AS i, ? AS d, ? AS b, ? AS s, ? AS u, ? AS n, ? AS blob",
                &[
                    Binding::Int(3),
                    Binding::Double(1.5),
                    Binding::Bool(true),
                    Binding::from("x"),
                    Binding::Uuid(id),
                    Binding::Null,
                    Binding::Bytes(vec![1, 2]),
                ],
            )
            .await
            .unwrap();

        let row = &rows[0];
        assert_eq!(row.try_get::<i64>("i").unwrap(), 3);
        assert_eq!(row.try_get::<f64>("d").unwrap(), 1.5);
        assert!(row.try_get::<bool>("b").unwrap());
        assert_eq!(row.try_get::<String>("s").unwrap(), "x");
        assert_eq!(row.try_get::<uuid::Uuid>("u").unwrap(), id);
        assert_eq!(row.try_get::<Option<String>>("n").unwrap(), None);
        assert_eq!(row.try_get::<Vec<u8>>("blob").unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn errors_carry_the_failing_sql() {
        let db = SqliteExecutor::open_in_memory().unwrap();
        let err = db.query("SELECT * FROM missing", &[]).await.unwrap_err();
        assert_eq!(err.sql(), Some("SELECT * FROM missing"));
    }
}
