//! Partial update resolution.
//!
//! A request is validated and folded into per-column changes up front, then
//! written by one `UPDATE ... RETURNING` statement that only mentions the
//! columns that change. There is no read before the write.

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite};

use crate::error::AppError;
use crate::models::{
    Patch, Priority, Status, StoryPoints, UpdateSubtaskRequest, UpdateTaskRequest,
};

/// A value written to one column.
#[derive(Debug, Clone, PartialEq)]
pub enum Assignment {
    Null,
    Text(String),
    Int(i64),
    Bool(bool),
    Timestamp(DateTime<Utc>),
}

/// Validated changes for a task. `Absent` leaves a column as it is,
/// `Null` clears it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TaskChanges {
    pub title: Patch<String>,
    pub description: Patch<String>,
    pub status: Patch<Status>,
    pub due_date: Patch<DateTime<Utc>>,
    pub priority: Patch<Priority>,
    pub story_points: Patch<StoryPoints>,
}

impl TaskChanges {
    /// Validates every enum and range field before anything is merged, so a
    /// bad field rejects the whole request.
    pub fn resolve(req: UpdateTaskRequest) -> Result<Self, AppError> {
        let status = match req.status.non_empty() {
            Patch::Value(s) => Patch::Value(s.parse::<Status>()?),
            _ => Patch::Absent,
        };
        let priority = match req.priority.non_empty() {
            Patch::Value(p) => Patch::Value(p.parse::<Priority>()?),
            _ => Patch::Absent,
        };
        let story_points = match req.story_points {
            Patch::Value(v) => Patch::Value(StoryPoints::new(v)?),
            _ => Patch::Absent,
        };

        // an empty title is never written
        let title = match req.title.non_empty() {
            Patch::Value(t) => Patch::Value(t),
            _ => Patch::Absent,
        };
        let due_date = match req.due_date {
            Patch::Value(d) => Patch::Value(d),
            _ => Patch::Absent,
        };

        Ok(TaskChanges {
            title,
            description: req.description.non_empty(),
            status,
            due_date,
            priority,
            story_points,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_absent()
            && self.description.is_absent()
            && self.status.is_absent()
            && self.due_date.is_absent()
            && self.priority.is_absent()
            && self.story_points.is_absent()
    }

    /// Columns to write, in a fixed order. `updated_at` is not included.
    pub fn assignments(&self) -> Vec<(&'static str, Assignment)> {
        let mut out = Vec::new();

        if let Patch::Value(title) = &self.title {
            out.push(("title", Assignment::Text(title.clone())));
        }
        match &self.description {
            Patch::Value(d) => out.push(("description", Assignment::Text(d.clone()))),
            Patch::Null => out.push(("description", Assignment::Null)),
            Patch::Absent => {}
        }
        if let Patch::Value(status) = self.status {
            out.push(("status", Assignment::Text(status.as_str().to_string())));
        }
        if let Patch::Value(d) = self.due_date {
            out.push(("due_date", Assignment::Timestamp(d)));
        }
        if let Patch::Value(priority) = self.priority {
            out.push(("priority", Assignment::Text(priority.as_str().to_string())));
        }
        if let Patch::Value(p) = self.story_points {
            out.push(("story_points", Assignment::Int(p.get())));
        }

        out
    }
}

/// Changes for a subtask. `completed` is always written.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SubtaskChanges {
    pub title: Patch<String>,
    pub completed: bool,
}

impl SubtaskChanges {
    pub fn resolve(req: UpdateSubtaskRequest) -> Self {
        let title = match req.title.non_empty() {
            Patch::Value(t) => Patch::Value(t),
            _ => Patch::Absent,
        };
        SubtaskChanges {
            title,
            completed: req.completed,
        }
    }

    pub fn assignments(&self) -> Vec<(&'static str, Assignment)> {
        let mut out = Vec::new();
        if let Patch::Value(title) = &self.title {
            out.push(("title", Assignment::Text(title.clone())));
        }
        out.push(("completed", Assignment::Bool(self.completed)));
        out
    }
}

/// Appends `, column = ?` for each assignment. Column names come from the
/// fixed lists above; values are always bound.
pub fn push_assignments(
    qb: &mut QueryBuilder<'_, Sqlite>,
    assignments: Vec<(&'static str, Assignment)>,
) {
    for (column, value) in assignments {
        qb.push(", ");
        qb.push(column);
        match value {
            Assignment::Null => {
                qb.push(" = NULL");
            }
            Assignment::Text(s) => {
                qb.push(" = ");
                qb.push_bind(s);
            }
            Assignment::Int(i) => {
                qb.push(" = ");
                qb.push_bind(i);
            }
            Assignment::Bool(b) => {
                qb.push(" = ");
                qb.push_bind(b);
            }
            Assignment::Timestamp(t) => {
                qb.push(" = ");
                qb.push_bind(t);
            }
        }
    }
}
