use std::collections::BTreeMap;
use async_trait::async_trait;
use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::core::ToDo;

use super::ToDoStore;

#[derive(Default)]
struct Table {
    last_id: i32,
    rows: BTreeMap<i32, ToDo>,
}

/// Keeps records in process memory, ordered by id.
#[derive(Default)]
pub struct InMemoryStore {
    table: RwLock<Table>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ToDoStore for InMemoryStore {
    async fn find_by_id(&self, id: i32) -> Result<Option<ToDo>> {
        Ok(self.table.read().await.rows.get(&id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<ToDo>> {
        Ok(self.table.read().await.rows.values().cloned().collect())
    }

    async fn find_by_expiry_range(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<ToDo>> {
        let table = self.table.read().await;
        Ok(table
            .rows
            .values()
            .filter(|todo| (from..=to).contains(&todo.expiry_date))
            .cloned()
            .collect())
    }

    async fn insert(&self, todo: &ToDo) -> Result<ToDo> {
        let mut table = self.table.write().await;
        table.last_id = table
            .last_id
            .checked_add(1)
            .ok_or_else(|| anyhow::anyhow!("to-do id space exhausted"))?;
        let stored = ToDo { id: table.last_id, ..todo.clone() };
        table.rows.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update(&self, todo: &ToDo) -> Result<()> {
        let mut table = self.table.write().await;
        // A row deleted since it was read is left deleted, like an UPDATE matching nothing.
        if let Some(row) = table.rows.get_mut(&todo.id) {
            *row = todo.clone();
        }
        Ok(())
    }

    async fn delete(&self, id: i32) -> Result<bool> {
        Ok(self.table.write().await.rows.remove(&id).is_some())
    }
}
