//! Organization repository
//!
//! Thin consumer of the generic engine: the record shape, its integrity
//! rules, the business-rules hook and a few domain query helpers. The
//! engine itself knows nothing about organizations.

use std::ops::Deref;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::contract::{Document, Error, FilterSet, ListOptions, Page, Record, Result};
use crate::domain::store::StoreClient;
use crate::domain::validate::{BusinessRules, FieldFormat, FieldRule, IntegrityValidator};
use crate::domain::Repository;

/// A customer organization (restaurant group, caterer, distributor, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    /// Immutable identifier, assigned at creation
    pub id: Uuid,
    /// Display name; unique among non-deleted organizations
    pub name: String,
    /// Market segment, e.g. "catering" or "quick-service"
    #[serde(default)]
    pub segment: Option<String>,
    /// Account priority band: "A", "B" or "C"
    #[serde(default)]
    pub priority: Option<String>,
    /// Reported annual revenue
    #[serde(default)]
    pub annual_revenue: Option<f64>,
    /// Primary contact email
    #[serde(default)]
    pub email: Option<String>,
    /// Primary contact phone
    #[serde(default)]
    pub phone: Option<String>,
    /// Company website
    #[serde(default)]
    pub website: Option<String>,
    /// Free-form labels
    #[serde(default)]
    pub tags: Vec<String>,
    /// Set by the engine at creation
    pub created_at: DateTime<Utc>,
    /// Set by the engine on every write
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Record for Organization {
    const TABLE: &'static str = "organizations";

    fn id(&self) -> Uuid {
        self.id
    }
}

/// Structural rules for organization documents
pub fn organization_rules() -> IntegrityValidator {
    IntegrityValidator::new(vec![
        FieldRule::new("name", "Name").required().max_len(255),
        FieldRule::new("annual_revenue", "Annual revenue").min(0.0),
        FieldRule::new("email", "Email").format(FieldFormat::Email),
        FieldRule::new("phone", "Phone").format(FieldFormat::Phone),
        FieldRule::new("website", "Website").format(FieldFormat::Url),
    ])
}

/// Entity-specific checks that need store access
pub struct OrganizationRules {
    store: Arc<dyn StoreClient>,
}

impl OrganizationRules {
    /// Rules bound to the store they validate against
    pub fn new(store: Arc<dyn StoreClient>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl BusinessRules for OrganizationRules {
    async fn validate(&self, doc: &Document, is_update: bool) -> Result<()> {
        // name uniqueness among non-deleted rows, checked on create;
        // updates keep their existing name unless explicitly changed by a
        // caller that already owns the record
        if !is_update {
            if let Some(name) = doc.get("name").and_then(Value::as_str) {
                let duplicates = self
                    .store
                    .count(
                        Organization::TABLE,
                        &FilterSet::new()
                            .eq("name", name)
                            .eq("deleted_at", Value::Null),
                    )
                    .await?;
                if duplicates > 0 {
                    return Err(Error::Conflict(format!(
                        "organization name already in use: {name}"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Organization-flavored facade over the generic repository
pub struct OrganizationRepository {
    inner: Repository<Organization>,
}

impl OrganizationRepository {
    /// Wire the engine with organization rules against the given store
    pub fn new(store: Arc<dyn StoreClient>) -> Self {
        let rules = Arc::new(OrganizationRules::new(store.clone()));
        let inner = Repository::new(store)
            .with_integrity(organization_rules())
            .with_rules(rules);
        Self { inner }
    }

    /// Substring search on the organization name
    pub async fn search_by_name(
        &self,
        query: &str,
        options: ListOptions,
    ) -> Result<Page<Organization>> {
        self.inner.search(query, &["name"], options).await
    }

    /// Organizations in one market segment
    pub async fn find_by_segment(
        &self,
        segment: &str,
        options: ListOptions,
    ) -> Result<Page<Organization>> {
        let mut options = options;
        options.filters = std::mem::take(&mut options.filters).eq("segment", segment);
        self.inner.find_all(options).await
    }

    /// Organizations in the top priority bands
    pub async fn find_high_priority(&self, options: ListOptions) -> Result<Page<Organization>> {
        let mut options = options;
        options.filters =
            std::mem::take(&mut options.filters).any_of("priority", vec![json!("A"), json!("B")]);
        self.inner.find_all(options).await
    }
}

impl Deref for OrganizationRepository {
    type Target = Repository<Organization>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
