use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::AppError;
use crate::models::Patch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Todo,
    InProgress,
    Done,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Todo => "todo",
            Status::InProgress => "in_progress",
            Status::Done => "done",
        }
    }
}

impl FromStr for Status {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "todo" => Ok(Status::Todo),
            "in_progress" => Ok(Status::InProgress),
            "done" => Ok(Status::Done),
            _ => Err(AppError::Validation(
                "Invalid status value. Must be one of: todo, in_progress, done".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "PascalCase")]
#[sqlx(rename_all = "PascalCase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }

    /// Sort rank: High sorts first in ascending order.
    pub fn rank(&self) -> i64 {
        match self {
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
        }
    }
}

impl FromStr for Priority {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "High" => Ok(Priority::High),
            "Medium" => Ok(Priority::Medium),
            "Low" => Ok(Priority::Low),
            _ => Err(AppError::Validation(
                "Invalid priority value. Must be one of: High, Medium, Low".to_string(),
            )),
        }
    }
}

/// Effort estimate, restricted to 1, 2, 3, 5 or 8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[serde(try_from = "i64", into = "i64")]
#[sqlx(transparent)]
pub struct StoryPoints(i64);

impl StoryPoints {
    pub const ALLOWED: [i64; 5] = [1, 2, 3, 5, 8];

    pub fn new(value: i64) -> Result<Self, AppError> {
        if Self::ALLOWED.contains(&value) {
            Ok(StoryPoints(value))
        } else {
            Err(AppError::Validation(
                "Invalid story points value. Must be one of: 1, 2, 3, 5, 8".to_string(),
            ))
        }
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for StoryPoints {
    type Error = AppError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        StoryPoints::new(value)
    }
}

impl From<StoryPoints> for i64 {
    fn from(points: StoryPoints) -> Self {
        points.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub status: Status,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: Priority,
    pub story_points: Option<StoryPoints>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of a create call, before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTaskRequest {
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    pub status: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: Option<String>,
    pub story_points: Option<i64>,
}

/// A validated create payload with defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub status: Status,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: Priority,
    pub story_points: Option<StoryPoints>,
}

impl TryFrom<NewTaskRequest> for NewTask {
    type Error = AppError;

    fn try_from(req: NewTaskRequest) -> Result<Self, Self::Error> {
        if req.title.is_empty() {
            return Err(AppError::Validation("title is required".to_string()));
        }

        let status = match req.status.as_deref() {
            None | Some("") => Status::default(),
            Some(s) => s.parse()?,
        };
        let priority = match req.priority.as_deref() {
            None | Some("") => Priority::default(),
            Some(p) => p.parse()?,
        };
        let story_points = req.story_points.map(StoryPoints::new).transpose()?;

        Ok(NewTask {
            title: req.title,
            description: req.description.filter(|d| !d.is_empty()),
            status,
            due_date: req.due_date,
            priority,
            story_points,
        })
    }
}

/// Body of a partial update. Every field may be left out.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdateTaskRequest {
    pub title: Patch<String>,
    pub description: Patch<String>,
    pub status: Patch<String>,
    pub due_date: Patch<DateTime<Utc>>,
    pub priority: Patch<String>,
    pub story_points: Patch<i64>,
}

/// Raw listing options as they arrive in the query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskQueryParams {
    pub sort_by: Option<String>,
    pub order: Option<String>,
    pub status: Option<String>,
    pub story_points_min: Option<String>,
    pub story_points_max: Option<String>,
}
