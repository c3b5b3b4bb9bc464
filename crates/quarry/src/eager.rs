//! Eager loading: one batched query per relationship, however many owners.
//!
//! Owner keys are collected from every owner, deduplicated, and sent in a
//! single `IN (...)` query that also selects the owner key of each related
//! row ([`OWNER_KEY_ALIAS`]). Results are grouped by that key and handed
//! back to owners positionally; each owner also keeps its value in its
//! [`RelationCache`](crate::RelationCache).

use crate::binding::Binding;
use crate::condition::{Connector, Where};
use crate::error::{OrmError, OrmResult};
use crate::executor::Executor;
use crate::model::{Model, ModelQuery};
use crate::query::Query;
use crate::relation::{Cardinality, Chain, OWNER_KEY_ALIAS, Relation, relation_key};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// A registered eager load, run over the models a query returned.
#[async_trait::async_trait]
pub trait EagerLoad<M: Model>: Send + Sync {
    async fn load(&self, db: &dyn Executor, owners: &[M]) -> OrmResult<()>;
}

/// A relationship plus the constraints and deeper loads registered for it.
pub(crate) struct EagerStep<F: Model, T: Model, C: Cardinality> {
    relation: Relation<F, T, C>,
    nested: ModelQuery<T>,
}

impl<F: Model, T: Model, C: Cardinality> EagerStep<F, T, C> {
    pub(crate) fn new(relation: Relation<F, T, C>, nested: ModelQuery<T>) -> Self {
        Self { relation, nested }
    }
}

#[async_trait::async_trait]
impl<F: Model, T: Model, C: Cardinality> EagerLoad<F> for EagerStep<F, T, C> {
    async fn load(&self, db: &dyn Executor, owners: &[F]) -> OrmResult<()> {
        load_relation(&self.relation, db, owners, Some(&self.nested)).await?;
        Ok(())
    }
}

impl<F: Model, T: Model, C: Cardinality> Relation<F, T, C> {
    /// Load the relationship for every owner with one query. The result is
    /// aligned with `owners`, and each owner's cache is filled.
    pub async fn load<E: Executor + ?Sized>(
        &self,
        db: &E,
        owners: &[F],
    ) -> OrmResult<Vec<C::Output<T>>> {
        load_relation(self, db, owners, None).await
    }

    /// Cached value, or load and cache it.
    pub async fn get<E: Executor + ?Sized>(&self, db: &E, owner: &F) -> OrmResult<C::Output<T>> {
        if let Some(value) = self.cached(owner) {
            return Ok(value);
        }
        self.refresh(db, owner).await
    }

    /// Query again and overwrite the cached value.
    pub async fn refresh<E: Executor + ?Sized>(
        &self,
        db: &E,
        owner: &F,
    ) -> OrmResult<C::Output<T>> {
        self.load(db, std::slice::from_ref(owner))
            .await?
            .pop()
            .ok_or_else(|| OrmError::Other("relation load returned no value".to_string()))
    }

    /// Value stored on `owner` by an earlier load, if any.
    pub fn cached(&self, owner: &F) -> Option<C::Output<T>> {
        owner.relations().get(&self.cache_key().ok()?)
    }

    /// Value stored by an eager load registered through
    /// [`ModelQuery::with_nested`] with these constraints.
    pub fn cached_with(&self, owner: &F, constraints: &ModelQuery<T>) -> Option<C::Output<T>> {
        let chain = self.resolve().ok()?;
        owner.relations().get(&cache_key::<T, C>(&chain, Some(constraints)))
    }

    /// The batched query `load` would run for `owners`.
    pub fn query_for(&self, owners: &[F]) -> OrmResult<Query> {
        let chain = self.resolve()?;
        let keys = OwnerKeys::collect(owners, chain.owner_key())?;
        Ok(chain.batch_query(keys.unique.into_values().collect()))
    }
}

/// Owner keys in owner order, plus the distinct non-null ones to query.
struct OwnerKeys {
    /// Normalized key of each owner.
    per_owner: Vec<Binding>,
    /// Normalized key to the value as the owner reported it.
    unique: IndexMap<Binding, Binding>,
}

impl OwnerKeys {
    fn collect<M: Model>(owners: &[M], column: &str) -> OrmResult<Self> {
        let mut per_owner = Vec::with_capacity(owners.len());
        let mut unique = IndexMap::new();
        for owner in owners {
            let raw = owner.field(column)?;
            let key = group_key(&raw);
            if !raw.is_null() {
                unique.entry(key.clone()).or_insert(raw);
            }
            per_owner.push(key);
        }
        Ok(Self { per_owner, unique })
    }
}

/// Drivers disagree on how some keys come back (SQLite stores UUIDs as text,
/// booleans as integers); group on a common form.
fn group_key(key: &Binding) -> Binding {
    match key {
        Binding::Uuid(id) => Binding::String(id.to_string()),
        Binding::Bool(b) => Binding::Int(i64::from(*b)),
        other => other.clone(),
    }
}

fn cache_key<T: Model, C: Cardinality>(
    chain: &Chain,
    nested: Option<&ModelQuery<T>>,
) -> String {
    let mut key = relation_key::<T, C>(chain);
    if let Some(query) = nested
        .map(ModelQuery::query)
        .filter(|q| !q.wheres.is_empty() || !q.orders.is_empty())
    {
        let mut hasher = DefaultHasher::new();
        format!("{:?}|{:?}", query.wheres, query.orders).hash(&mut hasher);
        key.push_str(&format!(":constrained#{:016x}", hasher.finish()));
    }
    key
}

/// Apply a nested query's conditions (as one group) and ordering.
fn constrain(mut query: Query, nested: &Query) -> Query {
    if !nested.wheres.is_empty() {
        query
            .wheres
            .push(Where::nested(Connector::And, nested.wheres.clone()));
    }
    query.orders.extend(nested.orders.iter().cloned());
    query
}

pub(crate) async fn load_relation<F, T, C, E>(
    relation: &Relation<F, T, C>,
    db: &E,
    owners: &[F],
    nested: Option<&ModelQuery<T>>,
) -> OrmResult<Vec<C::Output<T>>>
where
    F: Model,
    T: Model,
    C: Cardinality,
    E: Executor + ?Sized,
{
    let chain = relation.resolve()?;
    let key = cache_key::<T, C>(&chain, nested);
    let owner_keys = OwnerKeys::collect(owners, chain.owner_key())?;

    let mut groups: HashMap<Binding, Vec<T>> = HashMap::new();
    if owner_keys.unique.is_empty() {
        tracing::debug!(
            target: "quarry.eager",
            relation = %key,
            owners = owners.len(),
            "no owner keys, skipping query"
        );
    } else {
        let key_count = owner_keys.unique.len();
        let mut query = chain.batch_query(owner_keys.unique.values().cloned().collect());
        if let Some(nested) = nested {
            query = constrain(query, nested.query());
        }
        let rows = query.get_tagged(db, &format!("eager:{key}")).await?;
        tracing::debug!(
            target: "quarry.eager",
            relation = %key,
            owners = owners.len(),
            keys = key_count,
            rows = rows.len(),
            "eager load"
        );

        let mut related = Vec::with_capacity(rows.len());
        let mut related_keys = Vec::with_capacity(rows.len());
        for row in &rows {
            related_keys.push(group_key(row.get(OWNER_KEY_ALIAS)?));
            related.push(T::from_row(row)?);
        }
        if let Some(nested) = nested {
            nested.load_eager(db, &related).await?;
        }
        for (owner_key, model) in related_keys.into_iter().zip(related) {
            groups.entry(owner_key).or_default().push(model);
        }
    }

    let mut out = Vec::with_capacity(owners.len());
    for (owner, owner_key) in owners.iter().zip(&owner_keys.per_owner) {
        let group = groups.get(owner_key).cloned().unwrap_or_default();
        let value = C::collect(group, chain.strict)?;
        owner.relations().insert(key.clone(), value.clone());
        out.push(value);
    }
    Ok(out)
}
