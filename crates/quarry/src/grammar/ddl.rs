//! Table and index definitions rendered by [`Grammar`](super::Grammar).
//!
//! ```ignore
//! let users = CreateTable::new("users")
//!     .if_not_exists()
//!     .column(ColumnDef::new("id", ColumnType::Increments))
//!     .column(ColumnDef::new("email", ColumnType::String(Some(255))).unique())
//!     .column(ColumnDef::new("manager_id", ColumnType::BigInt).nullable().references("users", "id"));
//! let sql = grammar.compile_create_table(&users)?;
//! ```

/// Portable column types; each grammar maps them to its own names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// Auto-incrementing integer primary key.
    Increments,
    Int,
    BigInt,
    Double,
    /// `VARCHAR(n)`; `None` uses the dialect default length.
    String(Option<u32>),
    Text,
    Bool,
    /// Timestamp in UTC.
    Date,
    Uuid,
    Json,
    Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub ty: ColumnType,
    pub nullable: bool,
    pub primary: bool,
    pub unique: bool,
    /// Raw SQL default expression.
    pub default: Option<String>,
    /// Foreign key target `(table, column)`.
    pub references: Option<(String, String)>,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, ty: ColumnType) -> Self {
        Self {
            name: name.into(),
            ty,
            nullable: false,
            primary: false,
            unique: false,
            default: None,
            references: None,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn default_raw(mut self, expr: impl Into<String>) -> Self {
        self.default = Some(expr.into());
        self
    }

    pub fn references(mut self, table: impl Into<String>, column: impl Into<String>) -> Self {
        self.references = Some((table.into(), column.into()));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTable {
    pub name: String,
    pub columns: Vec<ColumnDef>,
    pub if_not_exists: bool,
}

impl CreateTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            if_not_exists: false,
        }
    }

    pub fn if_not_exists(mut self) -> Self {
        self.if_not_exists = true;
        self
    }

    pub fn column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }
}
