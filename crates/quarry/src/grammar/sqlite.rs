use super::{ColumnType, Grammar, compile_update_from};
use crate::error::OrmResult;
use crate::query::{Changes, Lock, Query};
use crate::sql::Sql;

/// SQLite (3.35+ for `RETURNING`, 3.33+ for `UPDATE ... FROM`).
///
/// SQLite has no row locks; lock clauses are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteGrammar;

impl Grammar for SqliteGrammar {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn compile_lock(&self, _lock: &Lock) -> Option<Sql> {
        None
    }

    fn compile_update(&self, query: &Query, changes: &Changes) -> OrmResult<Sql> {
        compile_update_from(self, query, changes)
    }

    fn column_type(&self, ty: &ColumnType) -> String {
        match ty {
            ColumnType::Increments => "INTEGER PRIMARY KEY AUTOINCREMENT".to_string(),
            ColumnType::Int | ColumnType::BigInt => "INTEGER".to_string(),
            ColumnType::Double => "REAL".to_string(),
            ColumnType::String(_) | ColumnType::Text => "TEXT".to_string(),
            ColumnType::Bool => "BOOLEAN".to_string(),
            ColumnType::Date => "DATETIME".to_string(),
            ColumnType::Uuid => "TEXT".to_string(),
            ColumnType::Json => "TEXT".to_string(),
            ColumnType::Bytes => "BLOB".to_string(),
        }
    }
}
