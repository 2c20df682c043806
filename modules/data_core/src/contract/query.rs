//! Filter and query model
//!
//! Predicates are AND-combined `field / operator / value` triples with a
//! closed operator vocabulary. Every store backend must interpret a
//! `FilterSet` identically for select, count, update and delete.

use serde_json::Value;

use super::model::Document;

/// Closed comparison-operator vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    /// Equality; against JSON `null` this means `IS NULL`
    Eq,
    /// Inequality; against JSON `null` this means `IS NOT NULL`
    Neq,
    /// Greater-than-or-equal
    Gte,
    /// Less-than-or-equal
    Lte,
    /// Membership in a value list
    In,
    /// Case-insensitive `LIKE` pattern match (`%` and `_` wildcards,
    /// backslash escapes)
    ILike,
}

impl FilterOp {
    /// Split a map key into field name and operator.
    ///
    /// Keys may carry one of the suffix tokens `__gte`, `__lte`, `__in`,
    /// `__ilike`, `__neq`; anything else is an equality filter on the full
    /// key, so unknown suffixes stay part of the field name.
    pub fn parse_key(key: &str) -> (&str, FilterOp) {
        const SUFFIXES: [(&str, FilterOp); 5] = [
            ("__gte", FilterOp::Gte),
            ("__lte", FilterOp::Lte),
            ("__in", FilterOp::In),
            ("__ilike", FilterOp::ILike),
            ("__neq", FilterOp::Neq),
        ];
        for (suffix, op) in SUFFIXES {
            if let Some(field) = key.strip_suffix(suffix) {
                if !field.is_empty() {
                    return (field, op);
                }
            }
        }
        (key, FilterOp::Eq)
    }
}

/// A single predicate
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    /// Field the predicate applies to
    pub field: String,
    /// Comparison operator
    pub op: FilterOp,
    /// Comparison value
    pub value: Value,
}

/// AND-combined predicate list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSet {
    filters: Vec<Filter>,
}

impl FilterSet {
    /// Empty filter set (matches everything)
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a loosely-typed filter map using the suffix vocabulary
    /// (`revenue__gte`, `segment__in`, ...). Plain keys become equality
    /// filters.
    pub fn from_map(map: &Document) -> Self {
        let mut set = Self::new();
        for (key, value) in map {
            let (field, op) = FilterOp::parse_key(key);
            set.push(Filter {
                field: field.to_string(),
                op,
                value: value.clone(),
            });
        }
        set
    }

    /// Add an equality predicate
    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.push(Filter {
            field: field.to_string(),
            op: FilterOp::Eq,
            value: value.into(),
        });
        self
    }

    /// Add an inequality predicate
    pub fn neq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.push(Filter {
            field: field.to_string(),
            op: FilterOp::Neq,
            value: value.into(),
        });
        self
    }

    /// Add a greater-than-or-equal predicate
    pub fn gte(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.push(Filter {
            field: field.to_string(),
            op: FilterOp::Gte,
            value: value.into(),
        });
        self
    }

    /// Add a less-than-or-equal predicate
    pub fn lte(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.push(Filter {
            field: field.to_string(),
            op: FilterOp::Lte,
            value: value.into(),
        });
        self
    }

    /// Add a membership predicate over a list of candidate values
    pub fn any_of(mut self, field: &str, values: Vec<Value>) -> Self {
        self.push(Filter {
            field: field.to_string(),
            op: FilterOp::In,
            value: Value::Array(values),
        });
        self
    }

    /// Add a case-insensitive pattern predicate. The value is a `LIKE`
    /// pattern; wrap with `%` for substring search.
    pub fn ilike(mut self, field: &str, pattern: impl Into<String>) -> Self {
        self.push(Filter {
            field: field.to_string(),
            op: FilterOp::ILike,
            value: Value::String(pattern.into()),
        });
        self
    }

    /// Append a predicate
    pub fn push(&mut self, filter: Filter) {
        self.filters.push(filter);
    }

    /// AND-merge another filter set into this one
    pub fn merge(mut self, other: FilterSet) -> Self {
        self.filters.extend(other.filters);
        self
    }

    /// Whether the set matches everything
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Number of predicates
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Iterate over the predicates
    pub fn iter(&self) -> impl Iterator<Item = &Filter> {
        self.filters.iter()
    }
}

/// Ordering instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    /// Column to order by
    pub column: String,
    /// Ascending when true
    pub ascending: bool,
}

impl SortSpec {
    /// Build an ordering instruction
    pub fn new(column: &str, ascending: bool) -> Self {
        Self {
            column: column.to_string(),
            ascending,
        }
    }
}

/// Fully-assembled store query: predicate, projection, ordering, window
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreQuery {
    /// AND-combined predicates
    pub filters: FilterSet,
    /// Selected fields; empty means all
    pub select: Vec<String>,
    /// Ordering instructions, applied in sequence
    pub order: Vec<SortSpec>,
    /// Maximum number of rows
    pub limit: Option<u64>,
    /// Number of rows to skip
    pub offset: Option<u64>,
}

/// Caller-facing pagination/filter options for list operations
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    /// 1-based page number; defaults to 1
    pub page: Option<u64>,
    /// Page size; defaults to the repository's configured page size
    pub limit: Option<u64>,
    /// Predicates applied to both the data and the count query
    pub filters: FilterSet,
    /// Ordering instructions
    pub order: Vec<SortSpec>,
}

impl ListOptions {
    /// Select a page
    pub fn page(mut self, page: u64) -> Self {
        self.page = Some(page);
        self
    }

    /// Set the page size
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set the predicate list
    pub fn filters(mut self, filters: FilterSet) -> Self {
        self.filters = filters;
        self
    }

    /// Append an ordering instruction
    pub fn order_by(mut self, column: &str, ascending: bool) -> Self {
        self.order.push(SortSpec::new(column, ascending));
        self
    }
}
