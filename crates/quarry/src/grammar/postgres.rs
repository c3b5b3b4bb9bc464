use super::{ColumnType, Grammar, compile_update_from};
use crate::error::OrmResult;
use crate::query::{Changes, Query};
use crate::sql::Sql;

/// PostgreSQL.
///
/// UPDATE with joins uses `UPDATE ... SET ... FROM ... WHERE`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresGrammar;

impl Grammar for PostgresGrammar {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn compile_update(&self, query: &Query, changes: &Changes) -> OrmResult<Sql> {
        compile_update_from(self, query, changes)
    }

    fn column_type(&self, ty: &ColumnType) -> String {
        match ty {
            ColumnType::Increments => "BIGSERIAL PRIMARY KEY".to_string(),
            ColumnType::Int => "INTEGER".to_string(),
            ColumnType::BigInt => "BIGINT".to_string(),
            ColumnType::Double => "DOUBLE PRECISION".to_string(),
            ColumnType::String(len) => format!("VARCHAR({})", len.unwrap_or(255)),
            ColumnType::Text => "TEXT".to_string(),
            ColumnType::Bool => "BOOLEAN".to_string(),
            ColumnType::Date => "TIMESTAMPTZ".to_string(),
            ColumnType::Uuid => "UUID".to_string(),
            ColumnType::Json => "JSONB".to_string(),
            ColumnType::Bytes => "BYTEA".to_string(),
        }
    }
}
