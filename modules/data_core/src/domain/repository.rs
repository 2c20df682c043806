//! Generic repository engine
//!
//! Composes the query builder, the sanitize/validate pipeline and the audit
//! wrapper into the CRUD/pagination/search/upsert surface every entity
//! repository builds on. The engine holds no entity state; all records are
//! transient values round-tripped through the store on every call, so a
//! repository instance is safe for concurrent use at the call level.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Instant;

use futures::future::BoxFuture;
use serde_json::Value;
use uuid::Uuid;

use crate::config::Config;
use crate::contract::{
    DateRange, Document, FilterSet, ListOptions, Page, PageMeta, Record, Result, TableAnalytics,
};

use super::audit::{AuditEntry, AuditSink, TracingAuditSink};
use super::query::QueryBuilder;
use super::sanitize::{Normalizer, Sanitizer};
use super::store::StoreClient;
use super::validate::{BusinessRules, IntegrityValidator, NoRules};

/// Engine-owned fields a caller may never set directly
const PROTECTED_FIELDS: [&str; 3] = ["created_at", "updated_at", "deleted_at"];

/// Default page size for `find_all`
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Hard cap on the page size
pub const MAX_PAGE_SIZE: u64 = 100;

/// Generic data-access engine for one record type.
///
/// Collaborators are injected through the constructor and the `with_*`
/// builders; there is no process-wide repository cache.
pub struct Repository<T: Record> {
    store: Arc<dyn StoreClient>,
    sanitizer: Sanitizer,
    normalizer: Normalizer,
    integrity: IntegrityValidator,
    rules: Arc<dyn BusinessRules>,
    audit: Arc<dyn AuditSink>,
    default_page_size: u64,
    max_page_size: u64,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            sanitizer: self.sanitizer.clone(),
            normalizer: self.normalizer,
            integrity: self.integrity.clone(),
            rules: self.rules.clone(),
            audit: self.audit.clone(),
            default_page_size: self.default_page_size,
            max_page_size: self.max_page_size,
            _record: PhantomData,
        }
    }
}

impl<T: Record> Repository<T> {
    /// Repository with default pipeline components: no integrity rules, no
    /// business rules, tracing audit sink
    pub fn new(store: Arc<dyn StoreClient>) -> Self {
        Self {
            store,
            sanitizer: Sanitizer::default(),
            normalizer: Normalizer,
            integrity: IntegrityValidator::empty(),
            rules: Arc::new(NoRules),
            audit: Arc::new(TracingAuditSink),
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
            _record: PhantomData,
        }
    }

    /// Replace the integrity rule set
    pub fn with_integrity(mut self, integrity: IntegrityValidator) -> Self {
        self.integrity = integrity;
        self
    }

    /// Install the entity-specific business-rules hook
    pub fn with_rules(mut self, rules: Arc<dyn BusinessRules>) -> Self {
        self.rules = rules;
        self
    }

    /// Replace the audit sink
    pub fn with_audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    /// Replace the sanitizer
    pub fn with_sanitizer(mut self, sanitizer: Sanitizer) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    /// Apply module configuration (page sizes, sanitizer length)
    pub fn with_config(mut self, config: &Config) -> Self {
        self.default_page_size = config.default_page_size;
        self.max_page_size = config.max_page_size;
        self.sanitizer = Sanitizer::new(config.max_string_len);
        self
    }

    /// The store client this repository executes against
    pub fn store(&self) -> &Arc<dyn StoreClient> {
        &self.store
    }

    /// Fresh query builder against `T::TABLE`, with no implicit filters
    pub fn query(&self) -> QueryBuilder<T> {
        QueryBuilder::new(self.store.clone())
    }

    // reads exclude soft-deleted rows by default
    fn read_query(&self) -> QueryBuilder<T> {
        self.query()
            .filter(FilterSet::new().eq("deleted_at", Value::Null))
    }

    /// Paginated listing. The data query and an independent count query run
    /// in parallel with identical filters; a page beyond range yields empty
    /// `data` with a correct `total`.
    pub async fn find_all(&self, options: ListOptions) -> Result<Page<T>> {
        self.observed("find_all", async {
            let page = options.page.unwrap_or(1).max(1);
            let limit = options
                .limit
                .unwrap_or(self.default_page_size)
                .clamp(1, self.max_page_size);
            let offset = (page - 1) * limit;

            let mut data_query = self
                .read_query()
                .filter(options.filters.clone())
                .limit(limit)
                .offset(offset);
            for sort in &options.order {
                data_query = data_query.order_by(&sort.column, sort.ascending);
            }
            let count_query = self.read_query().filter(options.filters.clone());

            let (data, total) = futures::try_join!(data_query.find(), count_query.count())?;
            Ok(Page {
                data,
                pagination: PageMeta::compute(page, limit, total),
            })
        })
        .await
    }

    /// Fetch one record by id; `None` when absent or soft-deleted
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<T>> {
        self.observed("find_by_id", async {
            self.read_query()
                .filter(FilterSet::new().eq("id", id.to_string()))
                .find_one()
                .await
        })
        .await
    }

    /// First record matching the filters; `None` when nothing matches
    pub async fn find_one(&self, filters: FilterSet) -> Result<Option<T>> {
        self.observed("find_one", async {
            self.read_query().filter(filters).find_one().await
        })
        .await
    }

    /// All records matching the filters, with optional ordering and window
    pub async fn find_many(&self, filters: FilterSet, options: ListOptions) -> Result<Vec<T>> {
        self.observed("find_many", async {
            let mut query = self.read_query().filter(filters);
            for sort in &options.order {
                query = query.order_by(&sort.column, sort.ascending);
            }
            if let Some(limit) = options.limit {
                query = query.limit(limit);
                if let Some(page) = options.page {
                    query = query.offset((page.max(1) - 1) * limit);
                }
            }
            query.find().await
        })
        .await
    }

    /// Sanitize, validate and persist one new record
    pub async fn create(&self, data: Document) -> Result<T> {
        self.observed("create", async {
            let doc = self.prepare(data, false).await?;
            self.query().insert(doc).await
        })
        .await
    }

    /// Run the pipeline per item, then persist the batch in one insert
    pub async fn create_many(&self, data: Vec<Document>) -> Result<Vec<T>> {
        self.observed("create_many", async {
            let mut prepared = Vec::with_capacity(data.len());
            for item in data {
                prepared.push(self.prepare(item, false).await?);
            }
            self.query().insert_many(prepared).await
        })
        .await
    }

    /// Sanitize, validate and patch one record by id; `None` when the id
    /// matches nothing
    pub async fn update(&self, id: Uuid, data: Document) -> Result<Option<T>> {
        self.observed("update", async {
            let doc = self.prepare(data, true).await?;
            let mut rows = self
                .query()
                .filter(FilterSet::new().eq("id", id.to_string()))
                .update(doc)
                .await?;
            Ok(rows.pop())
        })
        .await
    }

    /// Patch all records matching the filters, returning the updated rows
    pub async fn update_many(&self, filters: FilterSet, data: Document) -> Result<Vec<T>> {
        self.observed("update_many", async {
            let doc = self.prepare(data, true).await?;
            self.query().filter(filters).update(doc).await
        })
        .await
    }

    /// Physically remove one record; `true` when a row was removed
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        self.observed("delete", async {
            let removed = self
                .query()
                .filter(FilterSet::new().eq("id", id.to_string()))
                .delete()
                .await?;
            Ok(removed > 0)
        })
        .await
    }

    /// Physically remove all records matching the filters
    pub async fn delete_many(&self, filters: FilterSet) -> Result<u64> {
        self.observed("delete_many", async {
            self.query().filter(filters).delete().await
        })
        .await
    }

    /// Logically remove one record by setting `deleted_at`
    pub async fn soft_delete(&self, id: Uuid) -> Result<Option<T>> {
        self.observed("soft_delete", async {
            let mut rows = self
                .query()
                .filter(FilterSet::new().eq("id", id.to_string()))
                .soft_delete()
                .await?;
            Ok(rows.pop())
        })
        .await
    }

    /// Logically remove all records matching the filters
    pub async fn soft_delete_many(&self, filters: FilterSet) -> Result<Vec<T>> {
        self.observed("soft_delete_many", async {
            self.query().filter(filters).soft_delete().await
        })
        .await
    }

    /// Count non-deleted records matching the filters
    pub async fn count(&self, filters: FilterSet) -> Result<u64> {
        self.observed("count", async {
            self.read_query().filter(filters).count().await
        })
        .await
    }

    /// Whether any non-deleted record matches the filters
    pub async fn exists(&self, filters: FilterSet) -> Result<bool> {
        let count = self.count(filters).await?;
        Ok(count > 0)
    }

    /// Substring search. Only the first entry of `fields` is applied, as a
    /// case-insensitive `%query%` match on that field; remaining entries
    /// are accepted but not matched against.
    pub async fn search(&self, query: &str, fields: &[&str], options: ListOptions) -> Result<Page<T>> {
        self.observed("search", async {
            let mut options = options;
            if let Some(field) = fields.first() {
                let pattern = format!("%{}%", escape_like(query));
                options.filters = std::mem::take(&mut options.filters).ilike(field, pattern);
            }
            self.find_all(options).await
        })
        .await
    }

    /// Run a closure against this repository instance as one logical unit.
    ///
    /// This is best-effort sequencing: the store client exposes no
    /// multi-statement transaction primitive, so there is no rollback
    /// guarantee. A failure partway leaves earlier writes committed.
    pub async fn transaction<R, F>(&self, f: F) -> Result<R>
    where
        R: Send,
        F: for<'a> FnOnce(&'a Self) -> BoxFuture<'a, Result<R>> + Send,
    {
        self.observed("transaction", f(self)).await
    }

    /// Total count plus count of records created inside the given range
    pub async fn get_analytics(&self, range: Option<DateRange>) -> Result<TableAnalytics> {
        self.observed("get_analytics", async {
            let total = self.read_query().count().await?;
            let created_in_range = match range {
                Some(range) => {
                    let filters = FilterSet::new()
                        .gte("created_at", range.start.to_rfc3339())
                        .lte("created_at", range.end.to_rfc3339());
                    self.read_query().filter(filters).count().await?
                }
                None => total,
            };
            Ok(TableAnalytics {
                total,
                created_in_range,
                table: T::TABLE.to_string(),
            })
        })
        .await
    }

    /// Create-or-update reconciliation keyed by `conflict_columns`
    /// (defaults to the primary key when empty).
    ///
    /// Items are processed one at a time: an existing record matching the
    /// conflict columns is patched, anything else is created. The loop is
    /// sequential and non-atomic; a failure partway leaves a mix of
    /// already-committed and unprocessed items, and concurrent calls
    /// matching the same conflict columns can race into duplicate creates.
    pub async fn bulk_upsert(
        &self,
        items: Vec<Document>,
        conflict_columns: &[&str],
    ) -> Result<Vec<T>> {
        self.observed("bulk_upsert", async {
            let columns: &[&str] = if conflict_columns.is_empty() {
                &["id"]
            } else {
                conflict_columns
            };

            let mut results = Vec::with_capacity(items.len());
            for item in items {
                let mut probe = FilterSet::new();
                let mut matchable = true;
                for column in columns {
                    match item.get(*column) {
                        Some(value) if !value.is_null() => {
                            probe = probe.eq(column, value.clone());
                        }
                        _ => {
                            matchable = false;
                            break;
                        }
                    }
                }

                let existing = if matchable {
                    self.find_one(probe).await?
                } else {
                    None
                };

                match existing {
                    Some(record) => {
                        if let Some(updated) = self.update(record.id(), item).await? {
                            results.push(updated);
                        }
                    }
                    None => results.push(self.create(item).await?),
                }
            }
            Ok(results)
        })
        .await
    }

    // sanitize -> normalize -> integrity -> business rules; validation
    // failures never reach the store
    async fn prepare(&self, mut doc: Document, is_update: bool) -> Result<Document> {
        for field in PROTECTED_FIELDS {
            doc.remove(field);
        }
        if is_update {
            doc.remove("id");
        }
        self.sanitizer.sanitize_document(&mut doc);
        self.normalizer.normalize_document(&mut doc);
        self.integrity.check(&doc, is_update)?;
        self.rules.validate(&doc, is_update).await?;
        Ok(doc)
    }

    async fn observed<R>(
        &self,
        operation: &'static str,
        fut: impl std::future::Future<Output = Result<R>>,
    ) -> Result<R> {
        let started = Instant::now();
        let result = fut.await;
        self.audit.record(&AuditEntry {
            table: T::TABLE,
            operation,
            elapsed: started.elapsed(),
            success: result.is_ok(),
            cache_hit: None,
        });
        result
    }
}

// escape LIKE wildcards so user input is matched literally
fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::escape_like;

    #[test]
    fn escapes_like_wildcards() {
        assert_eq!(escape_like("50%_off\\now"), "50\\%\\_off\\\\now");
        assert_eq!(escape_like("plain"), "plain");
    }
}
