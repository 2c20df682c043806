//! Data Core Module
//!
//! Generic repository and query-abstraction layer for the Miseboard CRM.
//! Entity repositories compose the typed engine with their own business
//! rules; the engine handles filter composition, pagination with consistent
//! counts, the sanitize/validate/persist pipeline, soft deletion, bulk
//! upsert reconciliation and execution instrumentation.

// Public exports
pub mod contract;
pub use contract::{
    DateRange, Document, Error, Filter, FilterOp, FilterSet, ListOptions, Page, PageMeta, Record,
    Result, SortSpec, StoreQuery, TableAnalytics,
};

pub mod domain;
pub use domain::{
    AuditEntry, AuditSink, BusinessRules, FieldFormat, FieldRule, IntegrityValidator,
    NoOpAuditSink, NoRules, Normalizer, QueryBuilder, Repository, Sanitizer, StoreClient,
    TracingAuditSink,
};

pub mod infra;
pub use infra::{MemoryStore, SeaOrmStore};

pub mod entities;
pub use entities::{Organization, OrganizationRepository};

pub mod config;
pub use config::Config;
