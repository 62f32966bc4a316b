#[cfg(feature = "storage")]
mod sqlite;

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::core::{NewToDo, ToDo, ToDoService};
use crate::storage::{InMemoryStore, ToDoStore};

pub(crate) fn memory_service() -> ToDoService<InMemoryStore> {
    ToDoService::new(Arc::new(InMemoryStore::new()))
}

pub(crate) fn new_todo(title: &str, expiry_date: DateTime<Utc>) -> NewToDo {
    NewToDo {
        title: Some(title.to_string()),
        description: Some("Test Description".to_string()),
        expiry_date: Some(expiry_date),
    }
}

pub(crate) fn tomorrow() -> DateTime<Utc> {
    Utc::now() + Duration::days(1)
}

/// Writes a record straight to the store, bypassing create-path rules.
pub(crate) async fn seed<S: ToDoStore + 'static>(
    service: &ToDoService<S>,
    title: &str,
    expiry_date: DateTime<Utc>,
    completion_percentage: i32,
) -> anyhow::Result<ToDo> {
    let todo = ToDo {
        id: 0,
        title: Some(title.to_string()),
        description: Some("Test Description".to_string()),
        expiry_date,
        completion_percentage,
    };
    service.store().insert(&todo).await
}
