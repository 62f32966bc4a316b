use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::core::{
    DONE_PERCENTAGE, DeleteOutcome, NewToDo, ToDo, ToDoError, ToDoPatch, UpdateOutcome,
    ValidationError,
};
use crate::storage::ToDoStore;

#[cfg(feature = "tracing")]
use tracing::{debug, instrument};

/// Validation and state-transition rules for to-do records.
///
/// Holds nothing but the injected store, so it is cheap to clone and safe to
/// call from any number of tasks at once. Concurrent updates to the same
/// record are last-write-wins at the store.
pub struct ToDoService<S: ToDoStore + 'static> {
    store: Arc<S>,
}

impl<S: ToDoStore + 'static> Clone for ToDoService<S> {
    fn clone(&self) -> Self {
        Self { store: self.store.clone() }
    }
}

impl<S: ToDoStore + 'static> ToDoService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    #[cfg_attr(feature = "tracing", instrument(skip(self)))]
    pub async fn find_by_id(&self, id: i32) -> Result<Option<ToDo>, ToDoError> {
        Ok(self.store.find_by_id(id).await?)
    }

    #[cfg_attr(feature = "tracing", instrument(skip(self)))]
    pub async fn get_all(&self) -> Result<Vec<ToDo>, ToDoError> {
        Ok(self.store.find_all().await?)
    }

    /// Records whose expiry lies in `[from, to]`.
    #[cfg_attr(feature = "tracing", instrument(skip(self)))]
    pub async fn find_by_expiry_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<ToDo>, ToDoError> {
        if from > to {
            return Err(ValidationError::InvertedRange.into());
        }
        Ok(self.store.find_by_expiry_range(from, to).await?)
    }

    #[cfg_attr(feature = "tracing", instrument(skip(self, candidate)))]
    pub async fn create(&self, candidate: NewToDo) -> Result<ToDo, ToDoError> {
        let record = candidate.into_record(Utc::now())?;
        let created = self.store.insert(&record).await?;

        #[cfg(feature = "tracing")]
        debug!(id = created.id, "Created to-do");
        Ok(created)
    }

    #[cfg_attr(feature = "tracing", instrument(skip(self, patch)))]
    pub async fn update_by_id(&self, id: i32, patch: ToDoPatch) -> Result<UpdateOutcome, ToDoError> {
        let Some(mut existing) = self.store.find_by_id(id).await? else {
            return Ok(UpdateOutcome::NotFound);
        };
        let changed = patch.apply_to(&mut existing, Utc::now());
        self.persist_if_changed(&existing, changed).await
    }

    #[cfg_attr(feature = "tracing", instrument(skip(self)))]
    pub async fn update_completion_percentage_by_id(
        &self,
        id: i32,
        completion_percentage: i32,
    ) -> Result<UpdateOutcome, ToDoError> {
        let Some(mut existing) = self.store.find_by_id(id).await? else {
            return Ok(UpdateOutcome::NotFound);
        };
        let changed = existing.set_completion(completion_percentage);
        self.persist_if_changed(&existing, changed).await
    }

    pub async fn mark_done(&self, id: i32) -> Result<UpdateOutcome, ToDoError> {
        self.update_completion_percentage_by_id(id, DONE_PERCENTAGE).await
    }

    #[cfg_attr(feature = "tracing", instrument(skip(self)))]
    pub async fn delete_by_id(&self, id: i32) -> Result<DeleteOutcome, ToDoError> {
        if self.store.delete(id).await? {
            Ok(DeleteOutcome::Deleted)
        } else {
            Ok(DeleteOutcome::NotFound)
        }
    }

    async fn persist_if_changed(&self, todo: &ToDo, changed: bool) -> Result<UpdateOutcome, ToDoError> {
        if changed {
            self.store.update(todo).await?;
        }

        #[cfg(feature = "tracing")]
        debug!(id = todo.id, changed, "Applied update");
        Ok(UpdateOutcome::from_changed(changed))
    }
}
