pub mod memory_storage;
#[cfg(feature = "storage")]
pub mod sqlite;

pub use memory_storage::InMemoryStore;
#[cfg(feature = "storage")]
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crate::core::ToDo;

#[async_trait]
pub trait ToDoStore: Send + Sync {
    async fn find_by_id(&self, id: i32) -> anyhow::Result<Option<ToDo>>;
    async fn find_all(&self) -> anyhow::Result<Vec<ToDo>>;
    /// Both bounds inclusive.
    async fn find_by_expiry_range(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> anyhow::Result<Vec<ToDo>>;
    /// Stores `todo` under a fresh id and returns the stored record.
    async fn insert(&self, todo: &ToDo) -> anyhow::Result<ToDo>;
    async fn update(&self, todo: &ToDo) -> anyhow::Result<()>;
    /// Returns whether a row was removed.
    async fn delete(&self, id: i32) -> anyhow::Result<bool>;
}
