//! Input sanitization and normalization
//!
//! Both steps run before validation, so validators only ever see cleaned,
//! canonical values. Sanitization is idempotent: applying it twice yields
//! the same document as applying it once.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::contract::Document;

static TAG_RE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"<[^>]*>").unwrap()
});

/// Default maximum length applied to every string field, independent of any
/// field-specific length rule
pub const DEFAULT_MAX_STRING_LEN: usize = 1000;

/// String cleanup: strips HTML tags, collapses whitespace, trims, and
/// truncates to a maximum length
#[derive(Debug, Clone)]
pub struct Sanitizer {
    max_len: usize,
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self {
            max_len: DEFAULT_MAX_STRING_LEN,
        }
    }
}

impl Sanitizer {
    /// Sanitizer with a custom truncation length
    pub fn new(max_len: usize) -> Self {
        Self { max_len }
    }

    /// Clean every string field in the document, including strings inside
    /// arrays
    pub fn sanitize_document(&self, doc: &mut Document) {
        for value in doc.values_mut() {
            self.sanitize_value(value);
        }
    }

    fn sanitize_value(&self, value: &mut Value) {
        match value {
            Value::String(s) => *s = self.clean(s),
            Value::Array(items) => {
                for item in items {
                    self.sanitize_value(item);
                }
            }
            _ => {}
        }
    }

    fn clean(&self, raw: &str) -> String {
        let stripped = TAG_RE.replace_all(raw, "");
        let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
        collapsed.chars().take(self.max_len).collect()
    }
}

/// Type coercion into canonical in-memory representations
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer;

impl Normalizer {
    /// Coerce boolean-looking strings and date-like fields in place.
    ///
    /// Fields whose names end in `_at` or `_date` are parsed as RFC 3339 or
    /// `YYYY-MM-DD` and re-emitted as RFC 3339; unparseable dates are
    /// dropped from the document rather than raising.
    pub fn normalize_document(&self, doc: &mut Document) {
        let mut dropped: Vec<String> = Vec::new();
        for (key, value) in doc.iter_mut() {
            if let Value::String(s) = value {
                match s.as_str() {
                    "true" => {
                        *value = Value::Bool(true);
                        continue;
                    }
                    "false" => {
                        *value = Value::Bool(false);
                        continue;
                    }
                    _ => {}
                }
            }
            if is_date_field(key) {
                match value {
                    Value::Null => {}
                    Value::String(s) => match parse_date(s) {
                        Some(canonical) => *value = Value::String(canonical),
                        None => dropped.push(key.clone()),
                    },
                    _ => dropped.push(key.clone()),
                }
            }
        }
        for key in dropped {
            doc.remove(&key);
        }
    }
}

fn is_date_field(key: &str) -> bool {
    key.ends_with("_at") || key.ends_with("_date")
}

fn parse_date(raw: &str) -> Option<String> {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&chrono::Utc).to_rfc3339());
    }
    if let Ok(date) = chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let dt = date.and_hms_opt(0, 0, 0)?.and_utc();
        return Some(dt.to_rfc3339());
    }
    None
}
