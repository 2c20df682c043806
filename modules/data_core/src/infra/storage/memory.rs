//! In-memory store client
//!
//! Reference implementation of the filter semantics, keyed by table name.
//! Rows are plain JSON objects; reads here ignore `deleted_at`, so tests can
//! see soft-deleted rows the repository layer hides.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use regex::Regex;
use serde_json::Value;

use crate::contract::{Document, Filter, FilterOp, FilterSet, Result, SortSpec, StoreQuery};
use crate::domain::store::StoreClient;

/// Thread-safe in-memory table map
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Vec<Value>>>,
}

impl MemoryStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StoreClient for MemoryStore {
    async fn select(&self, table: &str, query: &StoreQuery) -> Result<Vec<Value>> {
        let tables = self.tables.read();
        let rows = tables.get(table).map(Vec::as_slice).unwrap_or_default();

        let mut matched: Vec<Value> = rows
            .iter()
            .filter(|row| matches(&query.filters, row))
            .cloned()
            .collect();

        sort_rows(&mut matched, &query.order);

        let offset = query.offset.unwrap_or(0) as usize;
        let matched: Vec<Value> = match query.limit {
            Some(limit) => matched.into_iter().skip(offset).take(limit as usize).collect(),
            None => matched.into_iter().skip(offset).collect(),
        };

        if query.select.is_empty() {
            return Ok(matched);
        }
        Ok(matched.into_iter().map(|row| project(row, &query.select)).collect())
    }

    async fn count(&self, table: &str, filters: &FilterSet) -> Result<u64> {
        let tables = self.tables.read();
        let rows = tables.get(table).map(Vec::as_slice).unwrap_or_default();
        Ok(rows.iter().filter(|row| matches(filters, row)).count() as u64)
    }

    async fn insert(&self, table: &str, rows: Vec<Document>) -> Result<Vec<Value>> {
        let mut tables = self.tables.write();
        let stored = tables.entry(table.to_string()).or_default();
        let mut inserted = Vec::with_capacity(rows.len());
        for row in rows {
            let value = Value::Object(row);
            stored.push(value.clone());
            inserted.push(value);
        }
        Ok(inserted)
    }

    async fn update(
        &self,
        table: &str,
        filters: &FilterSet,
        patch: Document,
    ) -> Result<Vec<Value>> {
        let mut tables = self.tables.write();
        let stored = tables.entry(table.to_string()).or_default();
        let mut updated = Vec::new();
        for row in stored.iter_mut() {
            if !matches(filters, row) {
                continue;
            }
            if let Value::Object(fields) = row {
                for (key, value) in &patch {
                    fields.insert(key.clone(), value.clone());
                }
            }
            updated.push(row.clone());
        }
        Ok(updated)
    }

    async fn delete(&self, table: &str, filters: &FilterSet) -> Result<u64> {
        let mut tables = self.tables.write();
        let stored = tables.entry(table.to_string()).or_default();
        let before = stored.len();
        stored.retain(|row| !matches(filters, row));
        Ok((before - stored.len()) as u64)
    }
}

// single evaluation routine shared by select, count, update and delete
fn matches(filters: &FilterSet, row: &Value) -> bool {
    filters.iter().all(|filter| matches_one(filter, row))
}

fn matches_one(filter: &Filter, row: &Value) -> bool {
    let actual = row.get(&filter.field).unwrap_or(&Value::Null);
    match filter.op {
        FilterOp::Eq => json_eq(actual, &filter.value),
        FilterOp::Neq => !json_eq(actual, &filter.value),
        FilterOp::Gte => {
            json_cmp(actual, &filter.value).is_some_and(|o| o != Ordering::Less)
        }
        FilterOp::Lte => {
            json_cmp(actual, &filter.value).is_some_and(|o| o != Ordering::Greater)
        }
        FilterOp::In => filter
            .value
            .as_array()
            .is_some_and(|candidates| candidates.iter().any(|v| json_eq(actual, v))),
        FilterOp::ILike => match (actual.as_str(), filter.value.as_str()) {
            (Some(actual), Some(pattern)) => like_match(pattern, actual),
            _ => false,
        },
    }
}

// numbers compare by value so 5 == 5.0; everything else is strict equality
fn json_eq(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn json_cmp(a: &Value, b: &Value) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) {
        return x.partial_cmp(&y);
    }
    if let (Some(x), Some(y)) = (a.as_str(), b.as_str()) {
        return Some(x.cmp(y));
    }
    None
}

// translate a LIKE pattern (%, _, backslash escapes) into an anchored
// case-insensitive regex
fn like_match(pattern: &str, actual: &str) -> bool {
    let mut regex = String::with_capacity(pattern.len() + 8);
    regex.push_str("(?is)^");
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    regex.push_str(&regex::escape(&escaped.to_string()));
                }
            }
            '%' => regex.push_str(".*"),
            '_' => regex.push('.'),
            other => regex.push_str(&regex::escape(&other.to_string())),
        }
    }
    regex.push('$');
    Regex::new(&regex).map(|re| re.is_match(actual)).unwrap_or(false)
}

fn sort_rows(rows: &mut [Value], order: &[SortSpec]) {
    if order.is_empty() {
        return;
    }
    rows.sort_by(|a, b| {
        for sort in order {
            let left = a.get(&sort.column).unwrap_or(&Value::Null);
            let right = b.get(&sort.column).unwrap_or(&Value::Null);
            let ordering = json_cmp(left, right).unwrap_or(Ordering::Equal);
            let ordering = if sort.ascending {
                ordering
            } else {
                ordering.reverse()
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

fn project(row: Value, fields: &[String]) -> Value {
    let Value::Object(source) = row else {
        return row;
    };
    let mut projected = serde_json::Map::new();
    for field in fields {
        if let Some(value) = source.get(field) {
            projected.insert(field.clone(), value.clone());
        }
    }
    Value::Object(projected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ilike_is_case_insensitive_substring() {
        assert!(like_match("%acme%", "Big ACME Catering"));
        assert!(!like_match("%acme%", "Bistro"));
        assert!(like_match("acme%", "Acme Catering"));
        assert!(!like_match("acme%", "Big Acme"));
    }

    #[test]
    fn ilike_escapes_match_literally() {
        assert!(like_match("%50\\%%", "save 50% today"));
        assert!(!like_match("%50\\%%", "save 500 today"));
    }

    #[test]
    fn eq_against_null_matches_missing_fields() {
        let filter = Filter {
            field: "deleted_at".to_string(),
            op: FilterOp::Eq,
            value: Value::Null,
        };
        assert!(matches_one(&filter, &json!({ "name": "Acme" })));
        assert!(matches_one(&filter, &json!({ "deleted_at": null })));
        assert!(!matches_one(&filter, &json!({ "deleted_at": "2026-01-01T00:00:00Z" })));
    }

    #[test]
    fn numeric_comparison_crosses_int_and_float() {
        let gte = Filter {
            field: "revenue".to_string(),
            op: FilterOp::Gte,
            value: json!(100),
        };
        assert!(matches_one(&gte, &json!({ "revenue": 100.0 })));
        assert!(matches_one(&gte, &json!({ "revenue": 250 })));
        assert!(!matches_one(&gte, &json!({ "revenue": 99.9 })));
        // a missing field never satisfies an ordering comparison
        assert!(!matches_one(&gte, &json!({})));
    }

    #[test]
    fn in_operator_checks_membership() {
        let filter = Filter {
            field: "priority".to_string(),
            op: FilterOp::In,
            value: json!(["A", "B"]),
        };
        assert!(matches_one(&filter, &json!({ "priority": "A" })));
        assert!(!matches_one(&filter, &json!({ "priority": "C" })));
    }

    #[test]
    fn string_comparison_orders_iso_dates() {
        let filter = Filter {
            field: "created_at".to_string(),
            op: FilterOp::Gte,
            value: json!("2026-01-01T00:00:00+00:00"),
        };
        assert!(matches_one(&filter, &json!({ "created_at": "2026-06-01T00:00:00+00:00" })));
        assert!(!matches_one(&filter, &json!({ "created_at": "2025-06-01T00:00:00+00:00" })));
    }
}
