//! Relationship descriptors and key inference.
//!
//! A relationship is a path of tables from an owner model to a related
//! model, optionally through intermediate hops. Column names that are not
//! given explicitly are inferred from table names ([`foreign_key`]), one
//! link at a time, so every inferred key depends only on the two tables it
//! joins.
//!
//! ```ignore
//! impl User {
//!     fn posts() -> HasMany<User, Post> {
//!         User::has_many()
//!     }
//!
//!     fn roles() -> BelongsToMany<User, Role> {
//!         User::belongs_to_many("role_user")
//!     }
//!
//!     fn comments() -> HasMany<User, Comment> {
//!         User::has_many().through("posts")
//!     }
//! }
//! ```

mod chain;
mod keys;


pub use chain::{Chain, Link, OWNER_KEY_ALIAS};
pub use keys::{KeyStyle, foreign_key, singular};

use crate::error::{OrmError, OrmResult};
use crate::model::Model;
use std::fmt;
use std::marker::PhantomData;

/// Which side of each plain link holds the foreign key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    /// The next table points back: `a.id = b.a_id`.
    Has,
    /// This table points forward: `a.b_id = b.id`.
    Belongs,
}

impl RelationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RelationKind::Has => "has",
            RelationKind::Belongs => "belongs",
        }
    }
}

/// An intermediate table in a relationship path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Through {
    pub table: String,
    pub primary_key: String,
    /// Column linking this hop to the previous table.
    pub from_key: Option<String>,
    /// Column linking this hop to the next table.
    pub to_key: Option<String>,
    /// Pivot tables hold a foreign key to each neighbour.
    pub pivot: bool,
}

impl Through {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            primary_key: "id".to_string(),
            from_key: None,
            to_key: None,
            pivot: false,
        }
    }

    pub fn pivot(table: impl Into<String>) -> Self {
        Self {
            pivot: true,
            ..Self::new(table)
        }
    }

    pub fn primary_key(mut self, key: impl Into<String>) -> Self {
        self.primary_key = key.into();
        self
    }

    pub fn from(mut self, key: impl Into<String>) -> Self {
        self.from_key = Some(key.into());
        self
    }

    pub fn to(mut self, key: impl Into<String>) -> Self {
        self.to_key = Some(key.into());
        self
    }

    pub fn as_pivot(mut self) -> Self {
        self.pivot = true;
        self
    }
}

impl From<&str> for Through {
    fn from(table: &str) -> Self {
        Through::new(table)
    }
}

impl From<String> for Through {
    fn from(table: String) -> Self {
        Through::new(table)
    }
}

/// Untyped description of a relationship: tables, explicit keys and hops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationDescriptor {
    pub kind: RelationKind,
    pub from_table: String,
    pub from_pk: String,
    pub to_table: String,
    pub to_pk: String,
    /// Owner-side column of the first link.
    pub from_key: Option<String>,
    /// Related-side column of the last link.
    pub to_key: Option<String>,
    pub through: Vec<Through>,
    pub key_style: KeyStyle,
    /// To-one only: fail when an owner matches several rows.
    pub strict: bool,
}

impl RelationDescriptor {
    pub fn new(
        kind: RelationKind,
        from_table: impl Into<String>,
        from_pk: impl Into<String>,
        to_table: impl Into<String>,
        to_pk: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            from_table: from_table.into(),
            from_pk: from_pk.into(),
            to_table: to_table.into(),
            to_pk: to_pk.into(),
            from_key: None,
            to_key: None,
            through: Vec::new(),
            key_style: KeyStyle::default(),
            strict: false,
        }
    }
}

/// How many related rows each owner receives.
pub trait Cardinality: Send + Sync + 'static {
    /// Part of every relation cache key.
    const NAME: &'static str;

    type Output<T: Clone + Send + Sync + 'static>: Clone + Send + Sync + 'static;

    /// Shape one owner's group of related rows.
    fn collect<T: Clone + Send + Sync + 'static>(
        rows: Vec<T>,
        strict: bool,
    ) -> OrmResult<Self::Output<T>>;
}

/// Every match, as a `Vec`.
#[derive(Debug, Clone, Copy)]
pub struct Many;

/// At most one match, as an `Option`.
#[derive(Debug, Clone, Copy)]
pub struct One;

impl Cardinality for Many {
    const NAME: &'static str = "many";

    type Output<T: Clone + Send + Sync + 'static> = Vec<T>;

    fn collect<T: Clone + Send + Sync + 'static>(rows: Vec<T>, _strict: bool) -> OrmResult<Vec<T>> {
        Ok(rows)
    }
}

impl Cardinality for One {
    const NAME: &'static str = "one";

    type Output<T: Clone + Send + Sync + 'static> = Option<T>;

    fn collect<T: Clone + Send + Sync + 'static>(
        rows: Vec<T>,
        strict: bool,
    ) -> OrmResult<Option<T>> {
        if strict && rows.len() > 1 {
            return Err(OrmError::too_many_rows(1, rows.len()));
        }
        Ok(rows.into_iter().next())
    }
}

/// A relationship from model `F` to model `T` with cardinality `C`.
pub struct Relation<F, T, C> {
    descriptor: RelationDescriptor,
    _marker: PhantomData<fn() -> (F, T, C)>,
}

pub type HasMany<F, T> = Relation<F, T, Many>;
pub type HasOne<F, T> = Relation<F, T, One>;
pub type BelongsTo<F, T> = Relation<F, T, One>;
pub type BelongsToMany<F, T> = Relation<F, T, Many>;

impl<F: Model, T: Model, C> Relation<F, T, C> {
    fn with_kind(kind: RelationKind) -> Self {
        let mut descriptor =
            RelationDescriptor::new(kind, F::TABLE, F::PRIMARY_KEY, T::TABLE, T::PRIMARY_KEY);
        descriptor.key_style = F::KEY_STYLE;
        Self {
            descriptor,
            _marker: PhantomData,
        }
    }
}

impl<F: Model, T: Model> Relation<F, T, Many> {
    /// Related rows hold `foreign_key(F)`.
    pub fn has_many() -> Self {
        Self::with_kind(RelationKind::Has)
    }

    /// Related rows reached through a pivot holding both foreign keys.
    pub fn belongs_to_many(pivot: impl Into<Through>) -> Self {
        Self::with_kind(RelationKind::Has).through(pivot.into().as_pivot())
    }
}

impl<F: Model, T: Model> Relation<F, T, One> {
    /// The related row holds `foreign_key(F)`.
    pub fn has_one() -> Self {
        Self::with_kind(RelationKind::Has)
    }

    /// The owner holds `foreign_key(T)`.
    pub fn belongs_to() -> Self {
        Self::with_kind(RelationKind::Belongs)
    }

    /// Fail with [`OrmError::TooManyRows`] instead of taking the first match.
    pub fn strict(mut self) -> Self {
        self.descriptor.strict = true;
        self
    }
}

impl<F, T, C> Relation<F, T, C> {
    /// Owner-side key of the first link.
    pub fn from(mut self, key: impl Into<String>) -> Self {
        self.descriptor.from_key = Some(key.into());
        self
    }

    /// Related-side key of the last link.
    pub fn to(mut self, key: impl Into<String>) -> Self {
        self.descriptor.to_key = Some(key.into());
        self
    }

    /// Append an intermediate hop; hops are walked in the order added.
    pub fn through(mut self, hop: impl Into<Through>) -> Self {
        self.descriptor.through.push(hop.into());
        self
    }

    pub fn descriptor(&self) -> &RelationDescriptor {
        &self.descriptor
    }

    pub fn resolve(&self) -> OrmResult<Chain> {
        self.descriptor.resolve()
    }
}

impl<F, T, C: Cardinality> Relation<F, T, C> {
    /// Key the loaded value is stored under in each owner's
    /// [`RelationCache`](crate::RelationCache): the resolved path plus the
    /// cardinality and target type, so relations over the same links but
    /// with different value shapes never share an entry.
    pub fn cache_key(&self) -> OrmResult<String> {
        Ok(relation_key::<T, C>(&self.resolve()?))
    }
}

pub(crate) fn relation_key<T, C: Cardinality>(chain: &Chain) -> String {
    format!(
        "{}:{}<{}>",
        chain.cache_key(),
        C::NAME,
        std::any::type_name::<T>()
    )
}

impl<F, T, C> Clone for Relation<F, T, C> {
    fn clone(&self) -> Self {
        Self {
            descriptor: self.descriptor.clone(),
            _marker: PhantomData,
        }
    }
}

impl<F, T, C> fmt::Debug for Relation<F, T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Relation")
            .field("descriptor", &self.descriptor)
            .finish()
    }
}
