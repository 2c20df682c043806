//! Infrastructure layer - store client implementations

pub mod storage;

pub use storage::{MemoryStore, SeaOrmStore};
