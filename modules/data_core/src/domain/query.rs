//! Fluent query builder bound to one record type's collection
//!
//! Builder-state methods perform no I/O; the terminal methods execute a
//! single request against the store client. The builder stamps `id` and the
//! engine-owned timestamps on writes so callers never control them.

use std::marker::PhantomData;
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::contract::{Document, Error, FilterSet, Record, Result, SortSpec, StoreQuery};

use super::store::StoreClient;

/// Fluent construction of a query against `T::TABLE`
pub struct QueryBuilder<T: Record> {
    store: Arc<dyn StoreClient>,
    query: StoreQuery,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> QueryBuilder<T> {
    /// Start an empty query against `T::TABLE`
    pub fn new(store: Arc<dyn StoreClient>) -> Self {
        Self {
            store,
            query: StoreQuery::default(),
            _record: PhantomData,
        }
    }

    /// AND-merge a filter set into the accumulated predicate. Calling this
    /// repeatedly is equivalent to passing one merged set.
    pub fn filter(mut self, filters: FilterSet) -> Self {
        self.query.filters = std::mem::take(&mut self.query.filters).merge(filters);
        self
    }

    /// Project the result to the given fields
    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.query.select = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Append an ordering instruction
    pub fn order_by(mut self, column: &str, ascending: bool) -> Self {
        self.query.order.push(SortSpec::new(column, ascending));
        self
    }

    /// Cap the number of returned rows
    pub fn limit(mut self, n: u64) -> Self {
        self.query.limit = Some(n);
        self
    }

    /// Skip the first `n` matching rows
    pub fn offset(mut self, n: u64) -> Self {
        self.query.offset = Some(n);
        self
    }

    /// Execute and decode all matching records
    pub async fn find(self) -> Result<Vec<T>> {
        let rows = self.store.select(T::TABLE, &self.query).await?;
        decode(rows)
    }

    /// Execute and return the raw documents; useful with a projection,
    /// where decoding into `T` may not be possible
    pub async fn find_docs(self) -> Result<Vec<Value>> {
        self.store.select(T::TABLE, &self.query).await
    }

    /// Execute and return the first match, or `None` when nothing matches
    pub async fn find_one(mut self) -> Result<Option<T>> {
        self.query.limit = Some(1);
        let rows = self.store.select(T::TABLE, &self.query).await?;
        Ok(decode(rows)?.into_iter().next())
    }

    /// Count matching rows. Ordering, windowing and projection are ignored;
    /// pass the same filters as the data query to keep pagination counts
    /// consistent.
    pub async fn count(self) -> Result<u64> {
        self.store.count(T::TABLE, &self.query.filters).await
    }

    /// Persist one new row
    pub async fn insert(self, doc: Document) -> Result<T> {
        let mut rows = self.insert_many(vec![doc]).await?;
        rows.pop()
            .ok_or_else(|| Error::Internal("insert returned no row".to_string()))
    }

    /// Persist a batch of new rows in a single store call
    pub async fn insert_many(self, docs: Vec<Document>) -> Result<Vec<T>> {
        let now = Utc::now().to_rfc3339();
        let stamped = docs
            .into_iter()
            .map(|mut doc| {
                let missing_id = !matches!(doc.get("id"), Some(Value::String(s)) if !s.is_empty());
                if missing_id {
                    doc.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
                }
                doc.insert("created_at".to_string(), Value::String(now.clone()));
                doc.insert("updated_at".to_string(), Value::String(now.clone()));
                doc
            })
            .collect();
        let rows = self.store.insert(T::TABLE, stamped).await?;
        decode(rows)
    }

    /// Apply a partial patch to all rows matching the accumulated predicate
    /// and return the updated rows
    pub async fn update(self, mut patch: Document) -> Result<Vec<T>> {
        patch.insert(
            "updated_at".to_string(),
            Value::String(Utc::now().to_rfc3339()),
        );
        let rows = self
            .store
            .update(T::TABLE, &self.query.filters, patch)
            .await?;
        decode(rows)
    }

    /// Physically remove matching rows
    pub async fn delete(self) -> Result<u64> {
        self.store.delete(T::TABLE, &self.query.filters).await
    }

    /// Mark matching rows as logically removed by setting `deleted_at`,
    /// returning the updated rows
    pub async fn soft_delete(self) -> Result<Vec<T>> {
        let mut patch = Document::new();
        patch.insert(
            "deleted_at".to_string(),
            Value::String(Utc::now().to_rfc3339()),
        );
        self.update(patch).await
    }
}

fn decode<T: Record>(rows: Vec<Value>) -> Result<Vec<T>> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(Error::from))
        .collect()
}
