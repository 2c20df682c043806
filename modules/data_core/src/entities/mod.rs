//! Entity repositories - thin consumers of the generic engine

pub mod organization;

pub use organization::{Organization, OrganizationRepository, OrganizationRules};
