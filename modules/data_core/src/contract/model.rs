//! Contract models for the data core
//!
//! Records are typed entities that round-trip through the store as JSON
//! documents. Drafts and patches stay loosely typed (`Document`) until they
//! have passed the sanitize/validate pipeline.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

/// Loosely-typed draft/patch payload: a JSON object keyed by field name
pub type Document = serde_json::Map<String, serde_json::Value>;

/// A typed entity with an immutable id, bound to one named collection.
///
/// `id` is assigned once at creation and never reassigned; `created_at` and
/// `updated_at` are set by the engine, never by the caller.
pub trait Record: Serialize + DeserializeOwned + Send + Sync + Unpin + 'static {
    /// Collection the record lives in
    const TABLE: &'static str;

    /// Immutable record identifier
    fn id(&self) -> Uuid;
}

/// Pagination metadata computed from a count query that used the same
/// filters as the data query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageMeta {
    /// 1-based page number
    pub page: u64,
    /// Page size
    pub limit: u64,
    /// Total matching rows, independent of the window
    pub total: u64,
    /// `ceil(total / limit)`
    pub total_pages: u64,
    /// Whether a following page exists
    pub has_next_page: bool,
    /// Whether a preceding page exists
    pub has_previous_page: bool,
}

impl PageMeta {
    /// Derive the envelope metadata for a window
    pub fn compute(page: u64, limit: u64, total: u64) -> Self {
        let total_pages = total.div_ceil(limit.max(1));
        Self {
            page,
            limit,
            total,
            total_pages,
            has_next_page: page < total_pages,
            has_previous_page: page > 1,
        }
    }
}

/// Pagination envelope: one page of data plus its metadata
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Ordered page contents
    pub data: Vec<T>,
    /// Envelope metadata
    pub pagination: PageMeta,
}

/// Closed creation-date interval for analytics queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    /// Interval start (inclusive)
    pub start: DateTime<Utc>,
    /// Interval end (inclusive)
    pub end: DateTime<Utc>,
}

/// Per-collection creation analytics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableAnalytics {
    /// Total non-deleted rows
    pub total: u64,
    /// Rows created inside the requested range; equals `total` when no
    /// range was given
    pub created_in_range: u64,
    /// Collection the numbers describe
    pub table: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_meta_middle_page() {
        let meta = PageMeta::compute(2, 10, 25);
        assert_eq!(meta.total_pages, 3);
        assert!(meta.has_next_page);
        assert!(meta.has_previous_page);
    }

    #[test]
    fn page_meta_empty_result() {
        let meta = PageMeta::compute(1, 10, 0);
        assert_eq!(meta.total_pages, 0);
        assert!(!meta.has_next_page);
        assert!(!meta.has_previous_page);
    }

    #[test]
    fn page_meta_exact_boundary() {
        let meta = PageMeta::compute(3, 10, 30);
        assert_eq!(meta.total_pages, 3);
        assert!(!meta.has_next_page);
        assert!(meta.has_previous_page);
    }
}
