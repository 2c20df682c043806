//! Declarative integrity rules and the business-rules hook
//!
//! The integrity validator enforces generic structural constraints
//! (required / length / range / format) and fails fast on the first
//! violation. Entity-specific checks live behind the [`BusinessRules`]
//! trait; the engine only ever calls through the interface.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::contract::{Document, Error, Result};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap()
});

static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"^\+?[0-9()./\-\s]{7,20}$").unwrap()
});

static URL_RE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"^https?://\S+$").unwrap()
});

/// Recognized string formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldFormat {
    /// RFC-5322-ish email shape
    Email,
    /// International phone number shape
    Phone,
    /// http/https URL
    Url,
}

impl FieldFormat {
    fn matches(self, value: &str) -> bool {
        match self {
            Self::Email => EMAIL_RE.is_match(value),
            Self::Phone => PHONE_RE.is_match(value),
            Self::Url => URL_RE.is_match(value),
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Self::Email => "must be a valid email address",
            Self::Phone => "must be a valid phone number",
            Self::Url => "must be a valid URL",
        }
    }
}

/// One field's structural constraints
#[derive(Debug, Clone)]
pub struct FieldRule {
    /// Field the rule applies to
    pub field: String,
    /// Human-readable label used in error messages
    pub label: String,
    /// Field must be present and non-empty on create
    pub required: bool,
    /// Maximum string length
    pub max_len: Option<usize>,
    /// Minimum numeric value
    pub min: Option<f64>,
    /// Expected string format
    pub format: Option<FieldFormat>,
}

impl FieldRule {
    /// Rule with no constraints yet
    pub fn new(field: &str, label: &str) -> Self {
        Self {
            field: field.to_string(),
            label: label.to_string(),
            required: false,
            max_len: None,
            min: None,
            format: None,
        }
    }

    /// Require the field on create
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Cap the string length
    pub fn max_len(mut self, n: usize) -> Self {
        self.max_len = Some(n);
        self
    }

    /// Set the minimum numeric value
    pub fn min(mut self, n: f64) -> Self {
        self.min = Some(n);
        self
    }

    /// Expect a string format
    pub fn format(mut self, format: FieldFormat) -> Self {
        self.format = Some(format);
        self
    }
}

/// Structural constraint checks over a sanitized document.
///
/// Raises on the first violation encountered, in rule order.
#[derive(Debug, Clone, Default)]
pub struct IntegrityValidator {
    rules: Vec<FieldRule>,
}

impl IntegrityValidator {
    /// Validator with the given rule list
    pub fn new(rules: Vec<FieldRule>) -> Self {
        Self { rules }
    }

    /// Validator that accepts everything
    pub fn empty() -> Self {
        Self::default()
    }

    /// Check a document. On update, absent fields are skipped; required
    /// fields are only enforced on create.
    pub fn check(&self, doc: &Document, is_update: bool) -> Result<()> {
        for rule in &self.rules {
            let value = doc.get(&rule.field);
            let present = value.is_some_and(|v| !v.is_null());

            if !present {
                if rule.required && !is_update {
                    return Err(Error::validation(
                        &rule.field,
                        format!("{} is required", rule.label),
                    ));
                }
                continue;
            }

            let value = value.unwrap_or(&Value::Null);

            if let Value::String(s) = value {
                if rule.required && s.trim().is_empty() {
                    return Err(Error::validation(
                        &rule.field,
                        format!("{} is required", rule.label),
                    ));
                }
                if let Some(max) = rule.max_len {
                    if s.chars().count() > max {
                        return Err(Error::validation(
                            &rule.field,
                            format!("{} must be at most {} characters", rule.label, max),
                        ));
                    }
                }
                if let Some(format) = rule.format {
                    if !s.is_empty() && !format.matches(s) {
                        return Err(Error::validation(
                            &rule.field,
                            format!("{} {}", rule.label, format.describe()),
                        ));
                    }
                }
            }

            if let Some(min) = rule.min {
                if let Some(n) = value.as_f64() {
                    if n < min {
                        let message = if min == 0.0 {
                            format!("{} cannot be negative", rule.label)
                        } else {
                            format!("{} must be at least {}", rule.label, min)
                        };
                        return Err(Error::validation(&rule.field, message));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Entity-specific validation hook, supplied per repository.
///
/// Implementations may query the store (uniqueness, parent-reference
/// validity); the generic engine never implements domain rules itself.
#[async_trait]
pub trait BusinessRules: Send + Sync {
    /// Validate a sanitized document before it is persisted
    async fn validate(&self, doc: &Document, is_update: bool) -> Result<()>;
}

/// No-op rules for repositories without entity-specific checks
pub struct NoRules;

#[async_trait]
impl BusinessRules for NoRules {
    async fn validate(&self, _doc: &Document, _is_update: bool) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> Document {
        value.as_object().cloned().unwrap_or_default()
    }

    fn validator() -> IntegrityValidator {
        IntegrityValidator::new(vec![
            FieldRule::new("name", "Name").required().max_len(10),
            FieldRule::new("annual_revenue", "Annual revenue").min(0.0),
            FieldRule::new("email", "Email").format(FieldFormat::Email),
            FieldRule::new("website", "Website").format(FieldFormat::Url),
            FieldRule::new("phone", "Phone").format(FieldFormat::Phone),
        ])
    }

    #[test]
    fn missing_required_field_fails_on_create() {
        let err = validator().check(&doc(json!({})), false).unwrap_err();
        assert!(err.to_string().contains("Name is required"));
    }

    #[test]
    fn missing_required_field_is_fine_on_update() {
        assert!(validator().check(&doc(json!({})), true).is_ok());
    }

    #[test]
    fn empty_string_counts_as_missing() {
        let err = validator()
            .check(&doc(json!({ "name": "   " })), false)
            .unwrap_err();
        assert!(err.to_string().contains("Name is required"));
    }

    #[test]
    fn negative_minimum_message() {
        let err = validator()
            .check(&doc(json!({ "name": "Acme", "annual_revenue": -5 })), false)
            .unwrap_err();
        assert!(err.to_string().contains("Annual revenue cannot be negative"));
    }

    #[test]
    fn max_len_violation() {
        let err = validator()
            .check(&doc(json!({ "name": "a very long name" })), false)
            .unwrap_err();
        assert!(err.to_string().contains("at most 10 characters"));
    }

    #[test]
    fn format_checks() {
        let v = validator();
        let base = json!({ "name": "Acme" });
        let mut with_email = doc(base.clone());
        with_email.insert("email".into(), json!("not-an-email"));
        assert!(v.check(&with_email, false).is_err());

        let mut ok = doc(base.clone());
        ok.insert("email".into(), json!("ops@acme.test"));
        ok.insert("website".into(), json!("https://acme.test"));
        ok.insert("phone".into(), json!("+1 (555) 123-4567"));
        assert!(v.check(&ok, false).is_ok());

        let mut bad_url = doc(base);
        bad_url.insert("website".into(), json!("acme.test"));
        assert!(v.check(&bad_url, false).is_err());
    }

    #[test]
    fn fails_fast_in_rule_order() {
        // both name and revenue are invalid; the name rule comes first
        let err = validator()
            .check(&doc(json!({ "name": "", "annual_revenue": -1 })), false)
            .unwrap_err();
        assert!(err.to_string().contains("Name"));
    }
}
