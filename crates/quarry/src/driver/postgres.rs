//! `tokio_postgres` executor.
//!
//! `?` placeholders are renumbered to `$n` before sending, and [`Binding`]s
//! are encoded against the parameter types the server infers, so an
//! `Int` can fill an `INT4` column and a text uuid a `UUID` column.

use crate::binding::Binding;
use crate::error::{OrmError, OrmResult};
use crate::executor::Executor;
use crate::grammar::{Grammar, PostgresGrammar};
use crate::row::Row;
use crate::sql::number_placeholders;
use bytes::BytesMut;
use std::error::Error;
use std::sync::Arc;
use tokio_postgres::GenericClient;
use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};

type BoxError = Box<dyn Error + Sync + Send>;

impl ToSql for Binding {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        match self {
            Binding::Null => Ok(IsNull::Yes),
            Binding::Int(v) => match *ty {
                Type::INT2 => i16::try_from(*v)?.to_sql(ty, out),
                Type::INT4 => i32::try_from(*v)?.to_sql(ty, out),
                Type::FLOAT4 => (*v as f32).to_sql(ty, out),
                Type::FLOAT8 => (*v as f64).to_sql(ty, out),
                Type::BOOL => (*v != 0).to_sql(ty, out),
                Type::TEXT | Type::VARCHAR => v.to_string().to_sql(ty, out),
                _ => v.to_sql(ty, out),
            },
            Binding::Double(v) => match *ty {
                Type::FLOAT4 => (*v as f32).to_sql(ty, out),
                _ => v.to_sql(ty, out),
            },
            Binding::Bool(v) => v.to_sql(ty, out),
            Binding::String(s) => match *ty {
                Type::UUID => uuid::Uuid::parse_str(s)?.to_sql(ty, out),
                Type::JSON | Type::JSONB => {
                    serde_json::from_str::<serde_json::Value>(s)?.to_sql(ty, out)
                }
                _ => s.as_str().to_sql(ty, out),
            },
            Binding::Date(v) => match *ty {
                Type::TIMESTAMP => v.naive_utc().to_sql(ty, out),
                Type::DATE => v.date_naive().to_sql(ty, out),
                _ => v.to_sql(ty, out),
            },
            Binding::Uuid(v) => match *ty {
                Type::TEXT | Type::VARCHAR | Type::BPCHAR => v.to_string().to_sql(ty, out),
                _ => v.to_sql(ty, out),
            },
            Binding::Json(v) => v.to_sql(ty, out),
            Binding::Bytes(v) => v.as_slice().to_sql(ty, out),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

fn decode_column(row: &tokio_postgres::Row, idx: usize, ty: &Type) -> Result<Binding, BoxError> {
    let value = match *ty {
        Type::BOOL => row.try_get::<_, Option<bool>>(idx)?.map(Binding::Bool),
        Type::INT2 => row.try_get::<_, Option<i16>>(idx)?.map(Binding::from),
        Type::INT4 => row.try_get::<_, Option<i32>>(idx)?.map(Binding::from),
        Type::INT8 => row.try_get::<_, Option<i64>>(idx)?.map(Binding::from),
        Type::OID => row.try_get::<_, Option<u32>>(idx)?.map(Binding::from),
        Type::FLOAT4 => row.try_get::<_, Option<f32>>(idx)?.map(Binding::from),
        Type::FLOAT8 => row.try_get::<_, Option<f64>>(idx)?.map(Binding::from),
        Type::TIMESTAMPTZ => row
            .try_get::<_, Option<chrono::DateTime<chrono::Utc>>>(idx)?
            .map(Binding::Date),
        Type::TIMESTAMP => row
            .try_get::<_, Option<chrono::NaiveDateTime>>(idx)?
            .map(Binding::from),
        Type::DATE => row
            .try_get::<_, Option<chrono::NaiveDate>>(idx)?
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(Binding::from),
        Type::UUID => row.try_get::<_, Option<uuid::Uuid>>(idx)?.map(Binding::Uuid),
        Type::JSON | Type::JSONB => row
            .try_get::<_, Option<serde_json::Value>>(idx)?
            .map(Binding::Json),
        Type::BYTEA => row.try_get::<_, Option<Vec<u8>>>(idx)?.map(Binding::Bytes),
        _ => match row.try_get::<_, Option<String>>(idx) {
            Ok(v) => v.map(Binding::String),
            Err(_) => {
                return Err(format!("unsupported column type `{ty}`; cast it in the query").into());
            }
        },
    };
    Ok(value.unwrap_or(Binding::Null))
}

fn convert_rows(rows: Vec<tokio_postgres::Row>) -> OrmResult<Vec<Row>> {
    let Some(first) = rows.first() else {
        return Ok(Vec::new());
    };
    let columns: Arc<[String]> = first
        .columns()
        .iter()
        .map(|c| c.name().to_string())
        .collect();

    rows.iter()
        .map(|row| {
            let values = row
                .columns()
                .iter()
                .enumerate()
                .map(|(idx, column)| {
                    decode_column(row, idx, column.type_())
                        .map_err(|e| OrmError::decode(column.name(), e.to_string()))
                })
                .collect::<OrmResult<Vec<_>>>()?;
            Ok(Row::new(Arc::clone(&columns), values))
        })
        .collect()
}

fn params(bindings: &[Binding]) -> Vec<&(dyn ToSql + Sync)> {
    bindings.iter().map(|b| b as &(dyn ToSql + Sync)).collect()
}

async fn run_query<C: GenericClient + Sync>(
    client: &C,
    sql: &str,
    bindings: &[Binding],
) -> OrmResult<Vec<Row>> {
    let numbered = number_placeholders(sql);
    let rows = client
        .query(numbered.as_str(), &params(bindings))
        .await
        .map_err(|e| OrmError::execution(sql, e))?;
    convert_rows(rows)
}

async fn run_execute<C: GenericClient + Sync>(
    client: &C,
    sql: &str,
    bindings: &[Binding],
) -> OrmResult<u64> {
    let numbered = number_placeholders(sql);
    client
        .execute(numbered.as_str(), &params(bindings))
        .await
        .map_err(|e| OrmError::execution(sql, e))
}

#[async_trait::async_trait]
impl Executor for tokio_postgres::Client {
    fn grammar(&self) -> &dyn Grammar {
        &PostgresGrammar
    }

    async fn query(&self, sql: &str, bindings: &[Binding]) -> OrmResult<Vec<Row>> {
        run_query(self, sql, bindings).await
    }

    async fn execute(&self, sql: &str, bindings: &[Binding]) -> OrmResult<u64> {
        run_execute(self, sql, bindings).await
    }
}

#[async_trait::async_trait]
impl<'a> Executor for tokio_postgres::Transaction<'a> {
    fn grammar(&self) -> &dyn Grammar {
        &PostgresGrammar
    }

    async fn query(&self, sql: &str, bindings: &[Binding]) -> OrmResult<Vec<Row>> {
        run_query(self, sql, bindings).await
    }

    async fn execute(&self, sql: &str, bindings: &[Binding]) -> OrmResult<u64> {
        run_execute(self, sql, bindings).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(binding: &Binding, ty: &Type) -> Result<Vec<u8>, BoxError> {
        let mut buf = BytesMut::new();
        binding.to_sql_checked(ty, &mut buf)?;
        Ok(buf.to_vec())
    }

    #[test]
    fn ints_narrow_to_the_parameter_type() {
        assert_eq!(encode(&Binding::Int(7), &Type::INT4).unwrap(), 7_i32.to_be_bytes());
        assert_eq!(encode(&Binding::Int(7), &Type::INT8).unwrap(), 7_i64.to_be_bytes());
        assert!(encode(&Binding::Int(i64::MAX), &Type::INT2).is_err());
    }

    #[test]
    fn null_encodes_as_sql_null() {
        let mut buf = BytesMut::new();
        let is_null = Binding::Null.to_sql_checked(&Type::INT4, &mut buf).unwrap();
        assert!(matches!(is_null, IsNull::Yes));
        assert!(buf.is_empty());
    }

    #[test]
    fn text_uuid_is_parsed_for_uuid_columns() {
        let id = uuid::Uuid::new_v4();
        let bytes = encode(&Binding::String(id.to_string()), &Type::UUID).unwrap();
        assert_eq!(bytes, id.as_bytes());
    }
}
