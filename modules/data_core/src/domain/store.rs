//! Store client trait - the consumed relational-store interface
//!
//! Implementations are in infra/storage. The trait is the only seam between
//! the engine and the underlying store; the engine performs no retries, so
//! any store failure surfaces to the caller unmodified.

use async_trait::async_trait;
use serde_json::Value;

use crate::contract::{Document, FilterSet, Result, StoreQuery};

/// Per-collection operations against a relational store.
///
/// Each implementation must evaluate a [`FilterSet`] through a single code
/// path so select, count, update and delete always agree on what a filter
/// matches.
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Fetch rows matching the query's predicate, ordering and window,
    /// projected to the selected fields (all fields when none are selected)
    async fn select(&self, table: &str, query: &StoreQuery) -> Result<Vec<Value>>;

    /// Count rows matching the predicate, ignoring ordering and windowing
    async fn count(&self, table: &str, filters: &FilterSet) -> Result<u64>;

    /// Persist new rows and return them as stored
    async fn insert(&self, table: &str, rows: Vec<Document>) -> Result<Vec<Value>>;

    /// Apply a partial patch to all matching rows and return the updated rows
    async fn update(&self, table: &str, filters: &FilterSet, patch: Document)
        -> Result<Vec<Value>>;

    /// Physically remove matching rows, returning how many were removed
    async fn delete(&self, table: &str, filters: &FilterSet) -> Result<u64>;
}
