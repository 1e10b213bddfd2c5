use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::RwLock;

use task_api::types::task::{TaskRecord, TaskStatus};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("task {0} not found")]
    NotFound(String),

    #[error("task {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: String,
        from: TaskStatus,
        to: TaskStatus,
    },
}

/// Process-wide task records, keyed by task id. Nothing is ever evicted.
///
/// Each id is written by a single orchestrator run. Reusing an id replaces
/// the record, and the last writer wins.
#[derive(Debug, Clone, Default)]
pub struct TaskStore {
    tasks: Arc<RwLock<HashMap<String, TaskRecord>>>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put(&self, record: TaskRecord) {
        let mut tasks = self.tasks.write().await;
        if tasks.contains_key(&record.id) {
            log::warn!("Replacing existing task {}", record.id);
        }
        tasks.insert(record.id.clone(), record);
    }

    pub async fn get(&self, id: &str) -> Result<TaskRecord, StoreError> {
        self.tasks
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_owned()))
    }

    /// Apply `patch` to the record of `id`, refusing any status change that
    /// would move the task backwards or out of a terminal state.
    pub async fn update<F>(&self, id: &str, patch: F) -> Result<TaskRecord, StoreError>
    where
        F: FnOnce(&mut TaskRecord),
    {
        let mut tasks = self.tasks.write().await;
        let current = tasks
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_owned()))?;

        let mut next = current.clone();
        patch(&mut next);
        next.id = current.id.clone();

        if next.status != current.status && !current.status.can_advance_to(next.status) {
            return Err(StoreError::InvalidTransition {
                id: id.to_owned(),
                from: current.status,
                to: next.status,
            });
        }

        next.updated_at = Utc::now();
        *current = next.clone();
        Ok(next)
    }

    pub async fn transition(&self, id: &str, status: TaskStatus) -> Result<TaskRecord, StoreError> {
        self.update(id, |record| record.status = status).await
    }

    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }
}
