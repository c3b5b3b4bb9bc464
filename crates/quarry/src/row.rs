//! Row mapping traits and utilities

use crate::binding::Binding;
use crate::error::{OrmError, OrmResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// A result row: column names plus values, shared by every driver.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Binding>,
}

impl Row {
    /// Build a row; `columns` is usually shared by every row of a result set.
    pub fn new(columns: Arc<[String]>, values: Vec<Binding>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }

    /// Build a row from `(column, value)` pairs.
    pub fn from_pairs<I, C, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (C, V)>,
        C: Into<String>,
        V: Into<Binding>,
    {
        let (columns, values): (Vec<String>, Vec<Binding>) = pairs
            .into_iter()
            .map(|(c, v)| (c.into(), v.into()))
            .unzip();
        Self {
            columns: columns.into(),
            values,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Binding] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Raw value of a column. The last column wins when names repeat.
    pub fn get(&self, column: &str) -> OrmResult<&Binding> {
        self.columns
            .iter()
            .rposition(|c| c == column)
            .map(|idx| &self.values[idx])
            .ok_or_else(|| OrmError::decode(column, "column not present in row"))
    }

    /// Typed value of a column.
    pub fn try_get<T: FromBinding>(&self, column: &str) -> OrmResult<T> {
        let value = self.get(column)?;
        T::from_binding(value).map_err(|message| OrmError::decode(column, message))
    }
}

/// Trait for types that can be decoded from a [`Row`].
pub trait FromRow: Sized {
    /// Convert a database row into Self
    fn from_row(row: &Row) -> OrmResult<Self>;
}

impl FromRow for Row {
    fn from_row(row: &Row) -> OrmResult<Self> {
        Ok(row.clone())
    }
}

/// Strict scalar decoding from a [`Binding`].
///
/// `Null` only decodes into `Option<T>`. The few accepted conversions cover
/// drivers that store a kind as another one (SQLite booleans as integers,
/// uuids/dates/json as text).
pub trait FromBinding: Sized {
    fn from_binding(value: &Binding) -> Result<Self, String>;
}

fn mismatch(expected: &str, value: &Binding) -> String {
    format!("expected {expected}, found {}", value.kind())
}

impl<T: FromBinding> FromBinding for Option<T> {
    fn from_binding(value: &Binding) -> Result<Self, String> {
        match value {
            Binding::Null => Ok(None),
            other => T::from_binding(other).map(Some),
        }
    }
}

impl FromBinding for Binding {
    fn from_binding(value: &Binding) -> Result<Self, String> {
        Ok(value.clone())
    }
}

impl FromBinding for i64 {
    fn from_binding(value: &Binding) -> Result<Self, String> {
        match value {
            Binding::Int(v) => Ok(*v),
            other => Err(mismatch("int", other)),
        }
    }
}

macro_rules! impl_narrow_int {
    ($($t:ty),*) => {
        $(
            impl FromBinding for $t {
                fn from_binding(value: &Binding) -> Result<Self, String> {
                    let wide = i64::from_binding(value)?;
                    <$t>::try_from(wide)
                        .map_err(|_| format!("{wide} out of range for {}", stringify!($t)))
                }
            }
        )*
    };
}

impl_narrow_int!(i8, i16, i32, u8, u16, u32, u64, usize);

impl FromBinding for f64 {
    fn from_binding(value: &Binding) -> Result<Self, String> {
        match value {
            Binding::Double(v) => Ok(*v),
            other => Err(mismatch("double", other)),
        }
    }
}

impl FromBinding for f32 {
    fn from_binding(value: &Binding) -> Result<Self, String> {
        f64::from_binding(value).map(|v| v as f32)
    }
}

impl FromBinding for bool {
    fn from_binding(value: &Binding) -> Result<Self, String> {
        match value {
            Binding::Bool(v) => Ok(*v),
            Binding::Int(0) => Ok(false),
            Binding::Int(1) => Ok(true),
            other => Err(mismatch("bool", other)),
        }
    }
}

impl FromBinding for String {
    fn from_binding(value: &Binding) -> Result<Self, String> {
        match value {
            Binding::String(v) => Ok(v.clone()),
            other => Err(mismatch("string", other)),
        }
    }
}

impl FromBinding for Uuid {
    fn from_binding(value: &Binding) -> Result<Self, String> {
        match value {
            Binding::Uuid(v) => Ok(*v),
            Binding::String(s) => Uuid::parse_str(s).map_err(|e| e.to_string()),
            Binding::Bytes(b) => Uuid::from_slice(b).map_err(|e| e.to_string()),
            other => Err(mismatch("uuid", other)),
        }
    }
}

impl FromBinding for DateTime<Utc> {
    fn from_binding(value: &Binding) -> Result<Self, String> {
        match value {
            Binding::Date(v) => Ok(*v),
            Binding::String(s) => parse_datetime(s),
            other => Err(mismatch("date", other)),
        }
    }
}

impl FromBinding for NaiveDateTime {
    fn from_binding(value: &Binding) -> Result<Self, String> {
        DateTime::<Utc>::from_binding(value).map(|v| v.naive_utc())
    }
}

impl FromBinding for NaiveDate {
    fn from_binding(value: &Binding) -> Result<Self, String> {
        DateTime::<Utc>::from_binding(value).map(|v| v.date_naive())
    }
}

impl FromBinding for serde_json::Value {
    fn from_binding(value: &Binding) -> Result<Self, String> {
        match value {
            Binding::Json(v) => Ok(v.clone()),
            Binding::String(s) => serde_json::from_str(s).map_err(|e| e.to_string()),
            other => Err(mismatch("json", other)),
        }
    }
}

impl FromBinding for Vec<u8> {
    fn from_binding(value: &Binding) -> Result<Self, String> {
        match value {
            Binding::Bytes(v) => Ok(v.clone()),
            other => Err(mismatch("bytes", other)),
        }
    }
}

/// Text timestamps: RFC 3339 (what the drivers write) or SQLite's
/// `CURRENT_TIMESTAMP` form.
fn parse_datetime(text: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(v) = DateTime::parse_from_rfc3339(text) {
        return Ok(v.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(v) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(v.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|v| v.and_utc())
        .ok_or_else(|| format!("invalid timestamp '{text}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Row {
        Row::from_pairs([
            ("id", Binding::Int(7)),
            ("name", Binding::from("ann")),
            ("active", Binding::Int(1)),
            ("manager_id", Binding::Null),
            ("created_at", Binding::from("2024-03-01 10:20:30")),
        ])
    }

    #[test]
    fn typed_access() {
        let row = sample();
        assert_eq!(row.try_get::<i64>("id").unwrap(), 7);
        assert_eq!(row.try_get::<i32>("id").unwrap(), 7);
        assert_eq!(row.try_get::<String>("name").unwrap(), "ann");
        assert!(row.try_get::<bool>("active").unwrap());
        assert_eq!(row.try_get::<Option<i64>>("manager_id").unwrap(), None);
        assert_eq!(
            row.try_get::<DateTime<Utc>>("created_at").unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 1, 10, 20, 30).unwrap()
        );
    }

    #[test]
    fn missing_column_is_a_decode_error() {
        let err = sample().get("email").unwrap_err();
        match err {
            OrmError::Decode { column, .. } => assert_eq!(column, "email"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn null_does_not_decode_into_non_option() {
        let err = sample().try_get::<i64>("manager_id").unwrap_err();
        assert!(err.to_string().contains("found null"));
    }

    #[test]
    fn no_silent_coercion() {
        let row = sample();
        assert!(row.try_get::<i64>("name").is_err());
        assert!(row.try_get::<f64>("id").is_err());
        assert!(row.try_get::<i8>("id").is_ok());

        let big = Row::from_pairs([("n", Binding::Int(300))]);
        assert!(big.try_get::<i8>("n").is_err());
    }
}
