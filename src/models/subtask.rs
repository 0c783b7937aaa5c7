use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::Patch;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Subtask {
    pub id: i64,
    pub task_id: i64,
    pub title: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewSubtaskRequest {
    #[serde(default)]
    pub title: String,
}

/// `completed` is always written; a missing key means `false`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdateSubtaskRequest {
    pub title: Patch<String>,
    pub completed: bool,
}
