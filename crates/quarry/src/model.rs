//! Models and model-scoped queries.

use crate::binding::{Binding, Fields};
use crate::cache::RelationCache;
use crate::condition::Op;
use crate::eager::{EagerLoad, EagerStep};
use crate::error::{OrmError, OrmResult};
use crate::executor::Executor;
use crate::query::{Changes, Direction, Query};
use crate::relation::{
    BelongsTo, BelongsToMany, Cardinality, HasMany, HasOne, KeyStyle, Relation, Through,
};
use crate::row::FromRow;
use std::fmt;
use std::sync::Arc;

/// A table-backed record that relationships can be loaded onto.
///
/// ```ignore
/// #[derive(Debug, Clone)]
/// struct User {
///     id: i64,
///     name: String,
///     relations: RelationCache,
/// }
///
/// impl Model for User {
///     const TABLE: &'static str = "users";
///
///     fn field(&self, column: &str) -> OrmResult<Binding> {
///         match column {
///             "id" => Ok(self.id.into()),
///             "name" => Ok(self.name.as_str().into()),
///             _ => Err(OrmError::decode(column, "no such field on User")),
///         }
///     }
///
///     fn relations(&self) -> &RelationCache {
///         &self.relations
///     }
/// }
/// ```
pub trait Model: FromRow + Clone + Send + Sync + 'static {
    const TABLE: &'static str;
    const PRIMARY_KEY: &'static str = "id";
    /// Casing of foreign keys inferred from this model's relationships.
    const KEY_STYLE: KeyStyle = KeyStyle::SnakeCase;

    /// Current value of a column, used to read relationship keys.
    fn field(&self, column: &str) -> OrmResult<Binding>;

    /// Relationship values loaded onto this instance.
    fn relations(&self) -> &RelationCache;

    fn query() -> ModelQuery<Self> {
        ModelQuery::new()
    }

    fn has_many<T: Model>() -> HasMany<Self, T> {
        Relation::has_many()
    }

    fn has_one<T: Model>() -> HasOne<Self, T> {
        Relation::has_one()
    }

    fn belongs_to<T: Model>() -> BelongsTo<Self, T> {
        Relation::belongs_to()
    }

    fn belongs_to_many<T: Model>(pivot: impl Into<Through>) -> BelongsToMany<Self, T> {
        Relation::belongs_to_many(pivot)
    }
}

/// A [`Query`] on `M::TABLE` that decodes `M` and runs registered eager
/// loads after fetching.
///
/// ```ignore
/// let users = User::query()
///     .where_eq("active", true)
///     .with(User::posts())
///     .with_nested(User::team(), |q| q.with(Team::owner()))
///     .all(&db)
///     .await?;
/// ```
pub struct ModelQuery<M: Model> {
    query: Query,
    eager: Vec<Arc<dyn EagerLoad<M>>>,
}

impl<M: Model> ModelQuery<M> {
    pub fn new() -> Self {
        Self {
            query: Query::table(M::TABLE),
            eager: Vec::new(),
        }
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn into_query(self) -> Query {
        self.query
    }

    /// Apply any [`Query`] builder method.
    pub fn map<F>(mut self, f: F) -> Self
    where
        F: FnOnce(Query) -> Query,
    {
        self.query = f(self.query);
        self
    }

    pub fn and_where(self, column: impl Into<String>, op: Op, value: impl Into<Binding>) -> Self {
        self.map(|q| q.and_where(column, op, value))
    }

    pub fn or_where(self, column: impl Into<String>, op: Op, value: impl Into<Binding>) -> Self {
        self.map(|q| q.or_where(column, op, value))
    }

    pub fn where_eq(self, column: impl Into<String>, value: impl Into<Binding>) -> Self {
        self.map(|q| q.where_eq(column, value))
    }

    pub fn where_null(self, column: impl Into<String>) -> Self {
        self.map(|q| q.where_null(column))
    }

    pub fn where_not_null(self, column: impl Into<String>) -> Self {
        self.map(|q| q.where_not_null(column))
    }

    pub fn where_in<I>(self, column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Binding>,
    {
        self.map(|q| q.where_in(column, values))
    }

    pub fn where_group<F>(self, f: F) -> Self
    where
        F: FnOnce(Query) -> Query,
    {
        self.map(|q| q.where_group(f))
    }

    pub fn order_by(self, column: impl Into<String>, direction: Direction) -> Self {
        self.map(|q| q.order_by(column, direction))
    }

    pub fn order_by_desc(self, column: impl Into<String>) -> Self {
        self.map(|q| q.order_by_desc(column))
    }

    pub fn limit(self, limit: u64) -> Self {
        self.map(|q| q.limit(limit))
    }

    pub fn offset(self, offset: u64) -> Self {
        self.map(|q| q.offset(offset))
    }

    pub fn page(self, page: u64, per_page: u64) -> Self {
        self.map(|q| q.page(page, per_page))
    }

    /// Eager-load `relation` onto every fetched model.
    pub fn with<T: Model, C: Cardinality>(self, relation: Relation<M, T, C>) -> Self {
        self.with_nested(relation, |q| q)
    }

    /// Eager-load `relation`, constraining the batched query and registering
    /// deeper loads through the closure. Only the closure's conditions and
    /// ordering apply to the batched query.
    pub fn with_nested<T, C, F>(mut self, relation: Relation<M, T, C>, f: F) -> Self
    where
        T: Model,
        C: Cardinality,
        F: FnOnce(ModelQuery<T>) -> ModelQuery<T>,
    {
        let nested = f(ModelQuery::new());
        self.eager.push(Arc::new(EagerStep::new(relation, nested)));
        self
    }

    /// Run every registered eager step over `models`, in registration order.
    pub(crate) async fn load_eager<E: Executor + ?Sized>(
        &self,
        db: &E,
        models: &[M],
    ) -> OrmResult<()> {
        if models.is_empty() {
            return Ok(());
        }
        let db: &dyn Executor = &db;
        for step in &self.eager {
            step.load(db, models).await?;
        }
        Ok(())
    }

    pub async fn all<E: Executor + ?Sized>(&self, db: &E) -> OrmResult<Vec<M>> {
        let models: Vec<M> = self.query.fetch_all(db).await?;
        self.load_eager(db, &models).await?;
        Ok(models)
    }

    pub async fn first<E: Executor + ?Sized>(&self, db: &E) -> OrmResult<Option<M>> {
        let Some(model) = self.query.fetch_opt::<M, _>(db).await? else {
            return Ok(None);
        };
        let models = [model];
        self.load_eager(db, &models).await?;
        let [model] = models;
        Ok(Some(model))
    }

    /// Model by primary key, or `None`.
    pub async fn find<E: Executor + ?Sized>(
        &self,
        db: &E,
        id: impl Into<Binding>,
    ) -> OrmResult<Option<M>> {
        let scoped = Self {
            query: self.query.clone().where_eq(qualified_pk::<M>(), id),
            eager: self.eager.clone(),
        };
        scoped.first(db).await
    }

    /// Model by primary key, or [`OrmError::NotFound`].
    pub async fn find_or_fail<E: Executor + ?Sized>(
        &self,
        db: &E,
        id: impl Into<Binding>,
    ) -> OrmResult<M> {
        let id = id.into();
        match self.find(db, id.clone()).await? {
            Some(model) => Ok(model),
            None => Err(OrmError::not_found(format!(
                "{} with {} = {id}",
                M::TABLE,
                M::PRIMARY_KEY
            ))),
        }
    }

    pub async fn count<E: Executor + ?Sized>(&self, db: &E) -> OrmResult<i64> {
        self.query.count(db).await
    }

    pub async fn exists<E: Executor + ?Sized>(&self, db: &E) -> OrmResult<bool> {
        self.query.exists(db).await
    }

    /// Insert rows and decode them back into models.
    pub async fn insert_return<E: Executor + ?Sized>(
        &self,
        db: &E,
        rows: &[Fields],
    ) -> OrmResult<Vec<M>> {
        let inserted = Query::table(M::TABLE)
            .insert_return_keyed(db, rows, M::PRIMARY_KEY)
            .await?;
        inserted.iter().map(M::from_row).collect()
    }

    pub async fn update<E: Executor + ?Sized>(&self, db: &E, changes: &Changes) -> OrmResult<u64> {
        self.query.update(db, changes).await
    }

    pub async fn delete<E: Executor + ?Sized>(&self, db: &E) -> OrmResult<u64> {
        self.query.delete(db).await
    }
}

fn qualified_pk<M: Model>() -> String {
    format!("{}.{}", M::TABLE, M::PRIMARY_KEY)
}

impl<M: Model> Default for ModelQuery<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Model> Clone for ModelQuery<M> {
    fn clone(&self) -> Self {
        Self {
            query: self.query.clone(),
            eager: self.eager.clone(),
        }
    }
}

impl<M: Model> fmt::Debug for ModelQuery<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelQuery")
            .field("query", &self.query)
            .field("eager", &self.eager.len())
            .finish()
    }
}
