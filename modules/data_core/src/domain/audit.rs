//! Execution instrumentation and audit logging
//!
//! Every public repository operation is wrapped by a pure-observation step
//! that measures elapsed time and hands a structured entry to the configured
//! sink. The wrapper never alters the result or error of the inner
//! operation.

use std::time::Duration;

/// One observed repository operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    /// Collection the operation ran against
    pub table: &'static str,
    /// Operation name, e.g. `find_all`
    pub operation: &'static str,
    /// Wall-clock time of the inner operation
    pub elapsed: Duration,
    /// Whether the inner operation succeeded
    pub success: bool,
    /// Advisory cache-hit flag; metadata only, never a correctness
    /// mechanism
    pub cache_hit: Option<bool>,
}

/// Sink for audit entries; must be side-effect-only
pub trait AuditSink: Send + Sync {
    /// Record one observed operation
    fn record(&self, entry: &AuditEntry);
}

/// Default sink: emits a structured `tracing` event under the `audit`
/// target
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, entry: &AuditEntry) {
        tracing::info!(
            target: "audit",
            table = entry.table,
            operation = entry.operation,
            elapsed_ms = entry.elapsed.as_millis() as u64,
            success = entry.success,
            cache_hit = entry.cache_hit,
            "repository operation"
        );
    }
}

/// Sink that drops everything; for tests or when auditing is disabled
pub struct NoOpAuditSink;

impl AuditSink for NoOpAuditSink {
    fn record(&self, _entry: &AuditEntry) {}
}
