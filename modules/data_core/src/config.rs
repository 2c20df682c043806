//! Configuration for the data core module

use serde::Deserialize;

/// Data core configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Database connection URL; absent when a store client is injected
    /// directly
    #[serde(default)]
    pub database_url: Option<String>,

    /// Default page size for list operations
    #[serde(default = "default_page_size")]
    pub default_page_size: u64,

    /// Hard cap on the page size
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u64,

    /// Maximum string length applied by the sanitizer
    #[serde(default = "default_max_string_len")]
    pub max_string_len: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            max_string_len: default_max_string_len(),
        }
    }
}

fn default_page_size() -> u64 {
    10
}

fn default_max_page_size() -> u64 {
    100
}

fn default_max_string_len() -> usize {
    1000
}
