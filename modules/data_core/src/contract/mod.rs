//! Contract layer - public types shared with consuming modules
//!
//! Transport-agnostic query model, pagination envelope and error taxonomy.

pub mod error;
pub mod model;
pub mod query;

pub use error::{Error, Result};
pub use model::{DateRange, Document, Page, PageMeta, Record, TableAnalytics};
pub use query::{Filter, FilterOp, FilterSet, ListOptions, SortSpec, StoreQuery};
