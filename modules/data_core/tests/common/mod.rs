//! Shared fixtures for data core integration tests

use std::sync::Arc;

use data_core::{Document, MemoryStore, Organization, OrganizationRepository, StoreClient};
use serde_json::{json, Value};

/// Fresh in-memory store
pub fn memory_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new())
}

/// Organization repository wired against the given store
pub fn org_repo(store: &Arc<MemoryStore>) -> OrganizationRepository {
    let client: Arc<dyn StoreClient> = store.clone();
    OrganizationRepository::new(client)
}

/// Convert a `json!` literal into a draft document
pub fn doc(value: Value) -> Document {
    value.as_object().cloned().unwrap_or_default()
}

/// Minimal valid organization draft
pub fn org(name: &str) -> Document {
    doc(json!({ "name": name }))
}

/// Seed `n` organizations with zero-padded names so name ordering is
/// deterministic
#[allow(dead_code)]
pub async fn seed(
    repo: &OrganizationRepository,
    n: usize,
    prefix: &str,
) -> anyhow::Result<Vec<Organization>> {
    let mut created = Vec::with_capacity(n);
    for i in 0..n {
        created.push(repo.create(org(&format!("{prefix} {i:02}"))).await?);
    }
    Ok(created)
}
