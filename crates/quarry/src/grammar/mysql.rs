use super::{ColumnType, Grammar, quote_segments, require_table};
use crate::binding::Fields;
use crate::error::OrmResult;
use crate::query::Query;
use crate::sql::Sql;

/// MySQL 8.
///
/// No `RETURNING`: inserted rows are read back with a lookup on the primary
/// key (the supplied value, or `LAST_INSERT_ID()`).
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlGrammar;

impl Grammar for MySqlGrammar {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote(&self, ident: &str) -> String {
        quote_segments(ident, '`')
    }

    fn supports_returning(&self) -> bool {
        false
    }

    fn supports_full_outer_join(&self) -> bool {
        false
    }

    fn compile_insert_default(&self, table: &str) -> String {
        format!("INSERT INTO {table} () VALUES ()")
    }

    fn compile_insert_return(
        &self,
        query: &Query,
        rows: &[Fields],
        primary_key: &str,
    ) -> OrmResult<Vec<Sql>> {
        let table = require_table(query)?;
        if rows.is_empty() {
            // Let compile_insert report the empty input.
            self.compile_insert(query, rows)?;
        }

        let mut statements = Vec::with_capacity(rows.len() * 2);
        for row in rows {
            statements.push(self.compile_insert(query, std::slice::from_ref(row))?);

            let mut lookup = Sql::new(format!("SELECT * FROM {table} WHERE {primary_key} = "));
            match row.get(primary_key) {
                Some(key) if !key.is_null() => lookup.push_bind(key.clone()),
                _ => lookup.push("LAST_INSERT_ID()"),
            };
            statements.push(lookup);
        }
        Ok(statements)
    }

    fn column_type(&self, ty: &ColumnType) -> String {
        match ty {
            ColumnType::Increments => "BIGINT AUTO_INCREMENT PRIMARY KEY".to_string(),
            ColumnType::Int => "INT".to_string(),
            ColumnType::BigInt => "BIGINT".to_string(),
            ColumnType::Double => "DOUBLE".to_string(),
            ColumnType::String(len) => format!("VARCHAR({})", len.unwrap_or(255)),
            ColumnType::Text => "TEXT".to_string(),
            ColumnType::Bool => "BOOLEAN".to_string(),
            ColumnType::Date => "DATETIME(6)".to_string(),
            ColumnType::Uuid => "CHAR(36)".to_string(),
            ColumnType::Json => "JSON".to_string(),
            ColumnType::Bytes => "BLOB".to_string(),
        }
    }
}
