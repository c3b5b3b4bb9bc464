//! Bound parameter values.
//!
//! Every value that reaches the database goes through [`Binding`], a closed
//! set of scalar kinds shared by all dialects and drivers. Compiled SQL only
//! ever contains `?` placeholders; the values travel next to it in order.

use crate::error::{OrmError, OrmResult};
use chrono::{DateTime, NaiveDateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;
use std::hash::{Hash, Hasher};
use uuid::Uuid;

/// A single parameter value.
#[derive(Debug, Clone)]
pub enum Binding {
    Int(i64),
    Double(f64),
    Bool(bool),
    String(String),
    Date(DateTime<Utc>),
    Uuid(Uuid),
    Json(serde_json::Value),
    Bytes(Vec<u8>),
    Null,
}

/// Column name to value map with insertion order preserved.
///
/// Used for insert rows; the first row's key order decides the column list.
pub type Fields = IndexMap<String, Binding>;

impl Binding {
    pub fn is_null(&self) -> bool {
        matches!(self, Binding::Null)
    }

    /// Short name of the value kind, used in decode errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Binding::Int(_) => "int",
            Binding::Double(_) => "double",
            Binding::Bool(_) => "bool",
            Binding::String(_) => "string",
            Binding::Date(_) => "date",
            Binding::Uuid(_) => "uuid",
            Binding::Json(_) => "json",
            Binding::Bytes(_) => "bytes",
            Binding::Null => "null",
        }
    }

    fn discriminant(&self) -> u8 {
        match self {
            Binding::Int(_) => 0,
            Binding::Double(_) => 1,
            Binding::Bool(_) => 2,
            Binding::String(_) => 3,
            Binding::Date(_) => 4,
            Binding::Uuid(_) => 5,
            Binding::Json(_) => 6,
            Binding::Bytes(_) => 7,
            Binding::Null => 8,
        }
    }
}

impl PartialEq for Binding {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Binding::Int(a), Binding::Int(b)) => a == b,
            (Binding::Double(a), Binding::Double(b)) => a.to_bits() == b.to_bits(),
            (Binding::Bool(a), Binding::Bool(b)) => a == b,
            (Binding::String(a), Binding::String(b)) => a == b,
            (Binding::Date(a), Binding::Date(b)) => a == b,
            (Binding::Uuid(a), Binding::Uuid(b)) => a == b,
            (Binding::Json(a), Binding::Json(b)) => a == b,
            (Binding::Bytes(a), Binding::Bytes(b)) => a == b,
            (Binding::Null, Binding::Null) => true,
            _ => false,
        }
    }
}

// Doubles compare by bit pattern, so equality is reflexive.
impl Eq for Binding {}

impl Hash for Binding {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.discriminant().hash(state);
        match self {
            Binding::Int(v) => v.hash(state),
            Binding::Double(v) => v.to_bits().hash(state),
            Binding::Bool(v) => v.hash(state),
            Binding::String(v) => v.hash(state),
            Binding::Date(v) => v.hash(state),
            Binding::Uuid(v) => v.hash(state),
            Binding::Json(v) => v.to_string().hash(state),
            Binding::Bytes(v) => v.hash(state),
            Binding::Null => {}
        }
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Binding::Int(v) => write!(f, "{v}"),
            Binding::Double(v) => write!(f, "{v}"),
            Binding::Bool(v) => write!(f, "{v}"),
            Binding::String(v) => write!(f, "'{v}'"),
            Binding::Date(v) => write!(f, "'{}'", v.to_rfc3339()),
            Binding::Uuid(v) => write!(f, "'{v}'"),
            Binding::Json(v) => write!(f, "'{v}'"),
            Binding::Bytes(v) => write!(f, "<{} bytes>", v.len()),
            Binding::Null => f.write_str("NULL"),
        }
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Binding {
                fn from(value: $t) -> Self {
                    Binding::Int(i64::from(value))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Binding {
    fn from(value: f32) -> Self {
        Binding::Double(f64::from(value))
    }
}

impl From<f64> for Binding {
    fn from(value: f64) -> Self {
        Binding::Double(value)
    }
}

impl From<bool> for Binding {
    fn from(value: bool) -> Self {
        Binding::Bool(value)
    }
}

impl From<&str> for Binding {
    fn from(value: &str) -> Self {
        Binding::String(value.to_string())
    }
}

impl From<String> for Binding {
    fn from(value: String) -> Self {
        Binding::String(value)
    }
}

impl From<&String> for Binding {
    fn from(value: &String) -> Self {
        Binding::String(value.clone())
    }
}

impl From<DateTime<Utc>> for Binding {
    fn from(value: DateTime<Utc>) -> Self {
        Binding::Date(value)
    }
}

impl From<NaiveDateTime> for Binding {
    fn from(value: NaiveDateTime) -> Self {
        Binding::Date(value.and_utc())
    }
}

impl From<Uuid> for Binding {
    fn from(value: Uuid) -> Self {
        Binding::Uuid(value)
    }
}

impl From<serde_json::Value> for Binding {
    fn from(value: serde_json::Value) -> Self {
        Binding::Json(value)
    }
}

impl From<Vec<u8>> for Binding {
    fn from(value: Vec<u8>) -> Self {
        Binding::Bytes(value)
    }
}

impl From<&[u8]> for Binding {
    fn from(value: &[u8]) -> Self {
        Binding::Bytes(value.to_vec())
    }
}

impl<T: Into<Binding>> From<Option<T>> for Binding {
    fn from(value: Option<T>) -> Self {
        value.map_or(Binding::Null, Into::into)
    }
}

/// Build a [`Fields`] map from `column => value` pairs.
///
/// ```ignore
/// let row = fields! { "name" => "alice", "age" => 30 };
/// ```
#[macro_export]
macro_rules! fields {
    () => { $crate::Fields::new() };
    ($($column:expr => $value:expr),+ $(,)?) => {{
        let mut fields = $crate::Fields::new();
        $(
            fields.insert(::std::string::String::from($column), $crate::Binding::from($value));
        )+
        fields
    }};
}

/// Convert a serializable struct into insertable [`Fields`].
///
/// The value must serialize to a JSON object. Nested arrays and objects are
/// kept as JSON bindings.
pub fn to_fields<T: Serialize + ?Sized>(value: &T) -> OrmResult<Fields> {
    let json = serde_json::to_value(value)
        .map_err(|e| OrmError::validation(format!("cannot serialize fields: {e}")))?;
    let serde_json::Value::Object(map) = json else {
        return Err(OrmError::validation(
            "fields must serialize to a JSON object",
        ));
    };

    Ok(map
        .into_iter()
        .map(|(column, value)| (column, json_to_binding(value)))
        .collect())
}

fn json_to_binding(value: serde_json::Value) -> Binding {
    use serde_json::Value;

    match value {
        Value::Null => Binding::Null,
        Value::Bool(b) => Binding::Bool(b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Binding::Int(i),
            None => n.as_f64().map_or(Binding::Null, Binding::Double),
        },
        Value::String(s) => Binding::String(s),
        other => Binding::Json(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn option_none_becomes_null() {
        let v: Option<i32> = None;
        assert!(Binding::from(v).is_null());
        assert_eq!(Binding::from(Some(5_i32)), Binding::Int(5));
    }

    #[test]
    fn hashes_usable_as_group_keys() {
        let mut keys = HashSet::new();
        keys.insert(Binding::Int(1));
        keys.insert(Binding::Int(1));
        keys.insert(Binding::Double(1.5));
        keys.insert(Binding::Double(1.5));
        keys.insert(Binding::from("1"));
        assert_eq!(keys.len(), 3);
    }

    #[test]
    fn int_and_string_keys_do_not_collide() {
        assert_ne!(Binding::Int(1), Binding::String("1".into()));
        assert_ne!(Binding::Int(0), Binding::Bool(false));
    }

    #[test]
    fn fields_macro_keeps_order() {
        let row = fields! { "name" => "alice", "age" => 30, "email" => None::<String> };
        let keys: Vec<&str> = row.keys().map(String::as_str).collect();
        assert_eq!(keys, ["name", "age", "email"]);
        assert!(row["email"].is_null());
    }

    #[test]
    fn to_fields_maps_json_kinds() {
        #[derive(Serialize)]
        struct NewUser {
            name: String,
            age: i32,
            score: f64,
            tags: Vec<String>,
            manager_id: Option<i64>,
        }

        let fields = to_fields(&NewUser {
            name: "ann".into(),
            age: 41,
            score: 0.5,
            tags: vec!["a".into()],
            manager_id: None,
        })
        .unwrap();

        assert_eq!(fields["name"], Binding::from("ann"));
        assert_eq!(fields["age"], Binding::Int(41));
        assert_eq!(fields["score"], Binding::Double(0.5));
        assert_eq!(fields["tags"], Binding::Json(serde_json::json!(["a"])));
        assert!(fields["manager_id"].is_null());
    }

    #[test]
    fn to_fields_rejects_scalars() {
        let err = to_fields(&3).unwrap_err();
        assert!(matches!(err, OrmError::Validation(_)));
    }
}
