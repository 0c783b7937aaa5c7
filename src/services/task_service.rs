use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::db::TaskStore;
use crate::db::filter::TaskFilter;
use crate::db::update::{SubtaskChanges, TaskChanges};
use crate::error::{AppError, Resource};
use crate::models::{
    NewSubtaskRequest, NewTask, NewTaskRequest, Subtask, Task, TaskQueryParams,
    UpdateSubtaskRequest, UpdateTaskRequest,
};

/// Task and subtask operations. Mutations are validated in full before
/// the store is called.
#[derive(Clone)]
pub struct TaskService {
    store: Arc<dyn TaskStore>,
}

impl TaskService {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }

    pub async fn health(&self) -> Result<(), AppError> {
        self.store.ping().await
    }

    pub async fn list_tasks(&self, params: &TaskQueryParams) -> Result<Vec<Task>, AppError> {
        let filter = TaskFilter::from_params(params);
        debug!("listing tasks with {:?}", filter);
        self.store.list_tasks(&filter.build()).await
    }

    pub async fn get_task(&self, id: i64) -> Result<Task, AppError> {
        self.store
            .get_task(id)
            .await?
            .ok_or(AppError::NotFound(Resource::Task))
    }

    pub async fn create_task(&self, req: NewTaskRequest) -> Result<Task, AppError> {
        let task = NewTask::try_from(req).inspect_err(|e| warn!("rejected new task: {}", e))?;
        let created = self.store.insert_task(&task).await?;
        info!("created task {}", created.id);
        Ok(created)
    }

    pub async fn update_task(&self, id: i64, req: UpdateTaskRequest) -> Result<Task, AppError> {
        let changes =
            TaskChanges::resolve(req).inspect_err(|e| warn!("rejected update for task {}: {}", id, e))?;
        if changes.is_empty() {
            debug!("update for task {} only touches updated_at", id);
        }
        let updated = self
            .store
            .update_task(id, &changes)
            .await?
            .ok_or(AppError::NotFound(Resource::Task))?;
        info!("updated task {}", id);
        Ok(updated)
    }

    /// Subtasks go with the task.
    pub async fn delete_task(&self, id: i64) -> Result<(), AppError> {
        if !self.store.delete_task(id).await? {
            return Err(AppError::NotFound(Resource::Task));
        }
        info!("deleted task {}", id);
        Ok(())
    }

    pub async fn list_subtasks(&self, task_id: i64) -> Result<Vec<Subtask>, AppError> {
        self.ensure_task(task_id).await?;
        self.store.list_subtasks(task_id).await
    }

    pub async fn create_subtask(
        &self,
        task_id: i64,
        req: NewSubtaskRequest,
    ) -> Result<Subtask, AppError> {
        if req.title.is_empty() {
            warn!("rejected new subtask for task {}: empty title", task_id);
            return Err(AppError::Validation("title is required".to_string()));
        }
        self.ensure_task(task_id).await?;

        let created = self.store.insert_subtask(task_id, &req.title).await?;
        info!("created subtask {} on task {}", created.id, task_id);
        Ok(created)
    }

    pub async fn update_subtask(
        &self,
        task_id: i64,
        id: i64,
        req: UpdateSubtaskRequest,
    ) -> Result<Subtask, AppError> {
        let changes = SubtaskChanges::resolve(req);
        self.ensure_task(task_id).await?;

        self.store
            .update_subtask(task_id, id, &changes)
            .await?
            .ok_or(AppError::NotFound(Resource::Subtask))
    }

    pub async fn delete_subtask(&self, task_id: i64, id: i64) -> Result<(), AppError> {
        if !self.store.delete_subtask(task_id, id).await? {
            return Err(AppError::NotFound(Resource::Subtask));
        }
        info!("deleted subtask {} from task {}", id, task_id);
        Ok(())
    }

    async fn ensure_task(&self, task_id: i64) -> Result<(), AppError> {
        if self.store.task_exists(task_id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound(Resource::Task))
        }
    }
}
