//! Domain layer - the generic data-access engine

pub mod audit;
pub mod query;
pub mod repository;
pub mod sanitize;
pub mod store;
pub mod validate;

pub use audit::{AuditEntry, AuditSink, NoOpAuditSink, TracingAuditSink};
pub use query::QueryBuilder;
pub use repository::{Repository, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use sanitize::{Normalizer, Sanitizer, DEFAULT_MAX_STRING_LEN};
pub use store::StoreClient;
pub use validate::{BusinessRules, FieldFormat, FieldRule, IntegrityValidator, NoRules};
