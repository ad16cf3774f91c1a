#![forbid(unsafe_code)]

pub mod plans;
pub mod repository;
pub mod sqlite;

pub use plans::{PLAN_INDEX_KEY, PlanStore};
pub use repository::{InMemoryStore, KeyValueStore, Storage, StorageError};
