//! Storage layer - store client implementations

pub mod memory;
pub mod sea_orm;

pub use memory::MemoryStore;
pub use sea_orm::SeaOrmStore;
