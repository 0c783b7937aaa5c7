mod extract;

use axum::Json;
use axum::extract::Query;
use axum::{Router, extract::State, http::StatusCode, routing::get};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use self::extract::{AppJson, AppPath};
use crate::error::AppError;
use crate::models::*;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/tasks", get(list_tasks).post(create_task))
        .route(
            "/tasks/{id}",
            get(get_task)
                .put(update_task)
                .patch(update_task)
                .delete(delete_task),
        )
        .route(
            "/tasks/{id}/subtasks",
            get(list_subtasks).post(create_subtask),
        )
        .route(
            "/tasks/{id}/subtasks/{subtask_id}",
            axum::routing::put(update_subtask)
                .patch(update_subtask)
                .delete(delete_subtask),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.tasks.health().await?;
    Ok(StatusCode::OK)
}

async fn list_tasks(
    State(state): State<AppState>,
    Query(params): Query<TaskQueryParams>,
) -> Result<Json<Vec<Task>>, AppError> {
    let tasks = state.tasks.list_tasks(&params).await?;
    Ok(Json(tasks))
}

async fn get_task(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> Result<Json<Task>, AppError> {
    let task = state.tasks.get_task(id).await?;
    Ok(Json(task))
}

async fn create_task(
    State(state): State<AppState>,
    AppJson(req): AppJson<NewTaskRequest>,
) -> Result<(StatusCode, Json<Task>), AppError> {
    let task = state.tasks.create_task(req).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

async fn update_task(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
    AppJson(req): AppJson<UpdateTaskRequest>,
) -> Result<Json<Task>, AppError> {
    let task = state.tasks.update_task(id, req).await?;
    Ok(Json(task))
}

async fn delete_task(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> Result<StatusCode, AppError> {
    state.tasks.delete_task(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_subtasks(
    State(state): State<AppState>,
    AppPath(task_id): AppPath<i64>,
) -> Result<Json<Vec<Subtask>>, AppError> {
    let subtasks = state.tasks.list_subtasks(task_id).await?;
    Ok(Json(subtasks))
}

async fn create_subtask(
    State(state): State<AppState>,
    AppPath(task_id): AppPath<i64>,
    AppJson(req): AppJson<NewSubtaskRequest>,
) -> Result<(StatusCode, Json<Subtask>), AppError> {
    let subtask = state.tasks.create_subtask(task_id, req).await?;
    Ok((StatusCode::CREATED, Json(subtask)))
}

async fn update_subtask(
    State(state): State<AppState>,
    AppPath((task_id, subtask_id)): AppPath<(i64, i64)>,
    AppJson(req): AppJson<UpdateSubtaskRequest>,
) -> Result<Json<Subtask>, AppError> {
    let subtask = state.tasks.update_subtask(task_id, subtask_id, req).await?;
    Ok(Json(subtask))
}

async fn delete_subtask(
    State(state): State<AppState>,
    AppPath((task_id, subtask_id)): AppPath<(i64, i64)>,
) -> Result<StatusCode, AppError> {
    state.tasks.delete_subtask(task_id, subtask_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
