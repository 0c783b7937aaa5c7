use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::db::filter::{BindValue, ListQuery};
use crate::db::update::{SubtaskChanges, TaskChanges, push_assignments};
use crate::models::{NewTask, Subtask, Task};

const TASK_COLUMNS: &str =
    "id, title, description, status, due_date, priority, story_points, created_at, updated_at";
const SUBTASK_COLUMNS: &str = "id, task_id, title, completed, created_at, updated_at";

pub async fn fetch_tasks(db: &SqlitePool, query: &ListQuery) -> Result<Vec<Task>, sqlx::Error> {
    let sql = query.to_sql(&format!("SELECT {} FROM tasks", TASK_COLUMNS));

    let mut q = sqlx::query_as::<_, Task>(&sql);
    for arg in query.args() {
        q = match arg {
            BindValue::Text(s) => q.bind(s.clone()),
            BindValue::Int(i) => q.bind(*i),
        };
    }
    q.fetch_all(db).await
}

pub async fn find_task_by_id(db: &SqlitePool, id: i64) -> Result<Option<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(&format!("SELECT {} FROM tasks WHERE id = ?1", TASK_COLUMNS))
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn task_exists(db: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM tasks WHERE id = ?1)")
        .bind(id)
        .fetch_one(db)
        .await
}

pub async fn insert_task(db: &SqlitePool, task: &NewTask) -> Result<Task, sqlx::Error> {
    let now = Utc::now();

    sqlx::query_as::<_, Task>(&format!(
        r#"
        INSERT INTO tasks
            (title, description, status, due_date, priority, story_points,
            created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
        RETURNING {}
        "#,
        TASK_COLUMNS
    ))
    .bind(&task.title)
    .bind(&task.description)
    .bind(task.status.as_str())
    .bind(task.due_date)
    .bind(task.priority.as_str())
    .bind(task.story_points.map(|p| p.get()))
    .bind(now)
    .fetch_one(db)
    .await
}

/// Applies `changes` in one statement. `None` when no row has this id.
pub async fn update_task(
    db: &SqlitePool,
    id: i64,
    changes: &TaskChanges,
) -> Result<Option<Task>, sqlx::Error> {
    let mut qb = QueryBuilder::<Sqlite>::new("UPDATE tasks SET updated_at = ");
    qb.push_bind(Utc::now());
    push_assignments(&mut qb, changes.assignments());
    qb.push(" WHERE id = ");
    qb.push_bind(id);
    qb.push(" RETURNING ");
    qb.push(TASK_COLUMNS);

    qb.build_query_as::<Task>().fetch_optional(db).await
}

pub async fn delete_task(db: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM tasks WHERE id = ?1")
        .bind(id)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result > 0)
}

pub async fn fetch_subtasks(db: &SqlitePool, task_id: i64) -> Result<Vec<Subtask>, sqlx::Error> {
    sqlx::query_as::<_, Subtask>(&format!(
        "SELECT {} FROM subtasks WHERE task_id = ?1 ORDER BY created_at ASC, id ASC",
        SUBTASK_COLUMNS
    ))
    .bind(task_id)
    .fetch_all(db)
    .await
}

pub async fn insert_subtask(
    db: &SqlitePool,
    task_id: i64,
    title: &str,
) -> Result<Subtask, sqlx::Error> {
    let now = Utc::now();

    sqlx::query_as::<_, Subtask>(&format!(
        r#"
        INSERT INTO subtasks (task_id, title, completed, created_at, updated_at)
        VALUES (?1, ?2, 0, ?3, ?3)
        RETURNING {}
        "#,
        SUBTASK_COLUMNS
    ))
    .bind(task_id)
    .bind(title)
    .bind(now)
    .fetch_one(db)
    .await
}

/// `None` when the subtask does not exist or belongs to another task.
pub async fn update_subtask(
    db: &SqlitePool,
    task_id: i64,
    id: i64,
    changes: &SubtaskChanges,
) -> Result<Option<Subtask>, sqlx::Error> {
    let mut qb = QueryBuilder::<Sqlite>::new("UPDATE subtasks SET updated_at = ");
    qb.push_bind(Utc::now());
    push_assignments(&mut qb, changes.assignments());
    qb.push(" WHERE id = ");
    qb.push_bind(id);
    qb.push(" AND task_id = ");
    qb.push_bind(task_id);
    qb.push(" RETURNING ");
    qb.push(SUBTASK_COLUMNS);

    qb.build_query_as::<Subtask>().fetch_optional(db).await
}

pub async fn delete_subtask(db: &SqlitePool, task_id: i64, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM subtasks WHERE id = ?1 AND task_id = ?2")
        .bind(id)
        .bind(task_id)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    use crate::config::DatabaseConfig;
    use crate::db::filter::TaskFilter;
    use crate::models::{
        NewTaskRequest, Patch, Priority, Status, TaskQueryParams, UpdateSubtaskRequest,
        UpdateTaskRequest,
    };

    async fn setup_test_db() -> SqlitePool {
        crate::db::connect(&DatabaseConfig::in_memory())
            .await
            .expect("Failed to create test db")
    }

    async fn create(pool: &SqlitePool, req: NewTaskRequest) -> Task {
        let task = NewTask::try_from(req).expect("invalid test task");
        insert_task(pool, &task).await.expect("Failed to insert task")
    }

    fn titled(title: &str) -> NewTaskRequest {
        NewTaskRequest {
            title: title.to_string(),
            ..Default::default()
        }
    }

    async fn list(pool: &SqlitePool, params: TaskQueryParams) -> Vec<String> {
        let query = TaskFilter::from_params(&params).build();
        fetch_tasks(pool, &query)
            .await
            .expect("Failed to fetch tasks")
            .into_iter()
            .map(|t| t.title)
            .collect()
    }

    fn sorted(sort_by: &str, order: &str) -> TaskQueryParams {
        TaskQueryParams {
            sort_by: Some(sort_by.to_string()),
            order: Some(order.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_insert_and_find_task() {
        let pool = setup_test_db().await;

        let created = create(
            &pool,
            NewTaskRequest {
                title: "Buy groceries".to_string(),
                description: Some("Milk, eggs, bread".to_string()),
                due_date: Some(Utc.with_ymd_and_hms(2024, 12, 31, 0, 0, 0).unwrap()),
                story_points: Some(3),
                ..Default::default()
            },
        )
        .await;

        assert!(created.id > 0);
        assert_eq!(created.status, Status::Todo);
        assert_eq!(created.priority, Priority::Medium);
        assert_eq!(created.created_at, created.updated_at);

        let found = find_task_by_id(&pool, created.id)
            .await
            .expect("Failed to find task")
            .expect("Task not found");
        assert_eq!(found, created);

        assert!(find_task_by_id(&pool, created.id + 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_priority_sort() {
        let pool = setup_test_db().await;
        for (title, priority) in [("a", "High"), ("b", "Low"), ("c", "Medium")] {
            create(
                &pool,
                NewTaskRequest {
                    title: title.to_string(),
                    priority: Some(priority.to_string()),
                    ..Default::default()
                },
            )
            .await;
        }

        assert_eq!(list(&pool, sorted("priority", "asc")).await, vec!["a", "c", "b"]);
        assert_eq!(list(&pool, sorted("priority", "desc")).await, vec!["b", "c", "a"]);
    }

    #[tokio::test]
    async fn test_due_date_sort_puts_missing_last() {
        let pool = setup_test_db().await;
        create(&pool, titled("none")).await;
        for (title, month) in [("jan", 1), ("jun", 6)] {
            create(
                &pool,
                NewTaskRequest {
                    title: title.to_string(),
                    due_date: Some(Utc.with_ymd_and_hms(2024, month, 1, 0, 0, 0).unwrap()),
                    ..Default::default()
                },
            )
            .await;
        }

        assert_eq!(list(&pool, sorted("due_date", "asc")).await, vec!["jan", "jun", "none"]);
        assert_eq!(list(&pool, sorted("due_date", "desc")).await, vec!["jun", "jan", "none"]);
    }

    #[tokio::test]
    async fn test_filters() {
        let pool = setup_test_db().await;
        for (title, status, points) in [
            ("one", "todo", Some(1)),
            ("three", "in_progress", Some(3)),
            ("five", "in_progress", Some(5)),
            ("unestimated", "done", None),
        ] {
            create(
                &pool,
                NewTaskRequest {
                    title: title.to_string(),
                    status: Some(status.to_string()),
                    story_points: points,
                    ..Default::default()
                },
            )
            .await;
        }

        let mut by_status = list(
            &pool,
            TaskQueryParams {
                status: Some("in_progress".to_string()),
                ..Default::default()
            },
        )
        .await;
        by_status.sort();
        assert_eq!(by_status, vec!["five", "three"]);

        let mut in_range = list(
            &pool,
            TaskQueryParams {
                story_points_min: Some("2".to_string()),
                story_points_max: Some("8".to_string()),
                ..Default::default()
            },
        )
        .await;
        in_range.sort();
        assert_eq!(in_range, vec!["five", "three"]);

        let inverted = list(
            &pool,
            TaskQueryParams {
                story_points_min: Some("5".to_string()),
                story_points_max: Some("1".to_string()),
                ..Default::default()
            },
        )
        .await;
        assert!(inverted.is_empty());

        let ignored = list(
            &pool,
            TaskQueryParams {
                status: Some("archived".to_string()),
                ..Default::default()
            },
        )
        .await;
        assert_eq!(ignored.len(), 4);
    }

    #[tokio::test]
    async fn test_update_task_partial() {
        let pool = setup_test_db().await;
        let task = create(
            &pool,
            NewTaskRequest {
                title: "Buy milk".to_string(),
                description: Some("2 litres".to_string()),
                story_points: Some(2),
                ..Default::default()
            },
        )
        .await;

        let changes = TaskChanges::resolve(UpdateTaskRequest {
            title: Patch::Value(String::new()),
            description: Patch::Value(String::new()),
            status: Patch::Value("in_progress".to_string()),
            ..Default::default()
        })
        .unwrap();
        let updated = update_task(&pool, task.id, &changes)
            .await
            .expect("Failed to update task")
            .expect("Task not found");

        assert_eq!(updated.title, "Buy milk");
        assert_eq!(updated.description, None);
        assert_eq!(updated.status, Status::InProgress);
        assert_eq!(updated.story_points, task.story_points);
        assert_eq!(updated.created_at, task.created_at);
        assert!(updated.updated_at >= task.updated_at);
    }

    #[tokio::test]
    async fn test_update_missing_task() {
        let pool = setup_test_db().await;
        let changes = TaskChanges::resolve(UpdateTaskRequest {
            title: Patch::Value("ghost".to_string()),
            ..Default::default()
        })
        .unwrap();

        let result = update_task(&pool, 42, &changes).await.expect("Failed to run update");
        assert!(result.is_none());
        assert!(find_task_by_id(&pool, 42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_task_cascades_to_subtasks() {
        let pool = setup_test_db().await;
        let task = create(&pool, titled("parent")).await;
        let other = create(&pool, titled("other")).await;
        insert_subtask(&pool, task.id, "first").await.unwrap();
        insert_subtask(&pool, task.id, "second").await.unwrap();
        insert_subtask(&pool, other.id, "kept").await.unwrap();

        assert!(delete_task(&pool, task.id).await.unwrap());
        assert!(!delete_task(&pool, task.id).await.unwrap());

        let orphans: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM subtasks WHERE task_id = ?1")
            .bind(task.id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(orphans, 0);
        assert_eq!(fetch_subtasks(&pool, other.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_subtask_lifecycle() {
        let pool = setup_test_db().await;
        let task = create(&pool, titled("parent")).await;
        let other = create(&pool, titled("other")).await;

        let subtask = insert_subtask(&pool, task.id, "Buy milk").await.unwrap();
        assert!(!subtask.completed);
        assert_eq!(subtask.task_id, task.id);

        let changes = SubtaskChanges::resolve(UpdateSubtaskRequest {
            title: Patch::Value(String::new()),
            completed: true,
        });
        let updated = update_subtask(&pool, task.id, subtask.id, &changes)
            .await
            .unwrap()
            .expect("Subtask not found");
        assert_eq!(updated.title, "Buy milk");
        assert!(updated.completed);

        // wrong parent
        assert!(update_subtask(&pool, other.id, subtask.id, &changes).await.unwrap().is_none());
        assert!(!delete_subtask(&pool, other.id, subtask.id).await.unwrap());

        assert!(delete_subtask(&pool, task.id, subtask.id).await.unwrap());
        assert!(fetch_subtasks(&pool, task.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_task_exists() {
        let pool = setup_test_db().await;
        let task = create(&pool, titled("here")).await;
        assert!(task_exists(&pool, task.id).await.unwrap());
        assert!(!task_exists(&pool, task.id + 100).await.unwrap());
    }
}
