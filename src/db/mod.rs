pub mod filter;
pub mod repository;
pub mod update;

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::info;

use crate::config::DatabaseConfig;
use crate::error::AppError;
use crate::models::{NewTask, Subtask, Task};

use self::filter::ListQuery;
use self::update::{SubtaskChanges, TaskChanges};

/// Opens the pool and brings the schema up to date.
pub async fn connect(config: &DatabaseConfig) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(&config.url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("database ready ({} max connections)", config.max_connections);

    Ok(pool)
}

/// Storage used by the task service.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn ping(&self) -> Result<(), AppError>;
    async fn list_tasks(&self, query: &ListQuery) -> Result<Vec<Task>, AppError>;
    async fn get_task(&self, id: i64) -> Result<Option<Task>, AppError>;
    async fn task_exists(&self, id: i64) -> Result<bool, AppError>;
    async fn insert_task(&self, task: &NewTask) -> Result<Task, AppError>;
    async fn update_task(&self, id: i64, changes: &TaskChanges) -> Result<Option<Task>, AppError>;
    async fn delete_task(&self, id: i64) -> Result<bool, AppError>;
    async fn list_subtasks(&self, task_id: i64) -> Result<Vec<Subtask>, AppError>;
    async fn insert_subtask(&self, task_id: i64, title: &str) -> Result<Subtask, AppError>;
    async fn update_subtask(
        &self,
        task_id: i64,
        id: i64,
        changes: &SubtaskChanges,
    ) -> Result<Option<Subtask>, AppError>;
    async fn delete_subtask(&self, task_id: i64, id: i64) -> Result<bool, AppError>;
}

#[derive(Clone)]
pub struct SqliteStore {
    db: SqlitePool,
}

impl SqliteStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TaskStore for SqliteStore {
    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("select 1").execute(&self.db).await?;
        Ok(())
    }

    async fn list_tasks(&self, query: &ListQuery) -> Result<Vec<Task>, AppError> {
        Ok(repository::fetch_tasks(&self.db, query).await?)
    }

    async fn get_task(&self, id: i64) -> Result<Option<Task>, AppError> {
        Ok(repository::find_task_by_id(&self.db, id).await?)
    }

    async fn task_exists(&self, id: i64) -> Result<bool, AppError> {
        Ok(repository::task_exists(&self.db, id).await?)
    }

    async fn insert_task(&self, task: &NewTask) -> Result<Task, AppError> {
        Ok(repository::insert_task(&self.db, task).await?)
    }

    async fn update_task(&self, id: i64, changes: &TaskChanges) -> Result<Option<Task>, AppError> {
        Ok(repository::update_task(&self.db, id, changes).await?)
    }

    async fn delete_task(&self, id: i64) -> Result<bool, AppError> {
        Ok(repository::delete_task(&self.db, id).await?)
    }

    async fn list_subtasks(&self, task_id: i64) -> Result<Vec<Subtask>, AppError> {
        Ok(repository::fetch_subtasks(&self.db, task_id).await?)
    }

    async fn insert_subtask(&self, task_id: i64, title: &str) -> Result<Subtask, AppError> {
        Ok(repository::insert_subtask(&self.db, task_id, title).await?)
    }

    async fn update_subtask(
        &self,
        task_id: i64,
        id: i64,
        changes: &SubtaskChanges,
    ) -> Result<Option<Subtask>, AppError> {
        Ok(repository::update_subtask(&self.db, task_id, id, changes).await?)
    }

    async fn delete_subtask(&self, task_id: i64, id: i64) -> Result<bool, AppError> {
        Ok(repository::delete_subtask(&self.db, task_id, id).await?)
    }
}
