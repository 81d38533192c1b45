use crate::task::{Priority, Task, TaskDraft, TaskService, TaskServiceError, ValidationErrors};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

/// Shared state for the task routes.
#[derive(Clone, Debug)]
pub struct TaskState {
    pub db: Arc<sea_orm::DatabaseConnection>,
}

/// JSON representation of a Task for API responses. The field list is
/// enumerated here so the wire contract stays fixed even if storage changes.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TaskJson {
    /// Unique identifier for the task
    id: i32,
    /// Short title of the task
    title: String,
    /// Free-form description
    description: String,
    /// Whether the task is done
    completed: bool,
    /// Person the task is assigned to
    assignee: String,
    /// Priority code: low, medium or high
    priority: Priority,
    /// Opaque client-formatted deadline string
    deadline: String,
    /// Category label
    category: String,
    /// When the task was created
    created_at: DateTime<Utc>,
    /// When the task was last modified
    updated_at: DateTime<Utc>,
}

impl From<Task> for TaskJson {
    fn from(task: Task) -> Self {
        Self {
            id: task.id(),
            title: task.title().to_string(),
            description: task.description().to_string(),
            completed: task.completed(),
            assignee: task.assignee().to_string(),
            priority: task.priority(),
            deadline: task.deadline().to_string(),
            category: task.category().to_string(),
            created_at: task.created_at(),
            updated_at: task.updated_at(),
        }
    }
}

/// Request body for create and update operations. Every field is optional at
/// the shape level; which ones are required is decided by the operation
/// (create and full update require `title`).
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct TaskPayload {
    /// Short title of the task, at most 200 characters
    pub title: Option<String>,
    /// Free-form description
    pub description: Option<String>,
    /// Whether the task is done
    pub completed: Option<bool>,
    /// Person the task is assigned to, at most 100 characters
    pub assignee: Option<String>,
    /// Priority code: low, medium or high
    pub priority: Option<String>,
    /// Opaque deadline string, at most 20 characters
    pub deadline: Option<String>,
    /// Category label, at most 100 characters
    pub category: Option<String>,
}

impl From<TaskPayload> for TaskDraft {
    fn from(payload: TaskPayload) -> Self {
        TaskDraft {
            title: payload.title,
            description: payload.description,
            completed: payload.completed,
            assignee: payload.assignee,
            priority: payload.priority,
            deadline: payload.deadline,
            category: payload.category,
        }
    }
}

/// JSON response for API errors
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Wraps `TaskServiceError` so service failures map onto HTTP responses in
/// one place instead of per handler.
#[derive(Debug)]
pub struct TaskApiError(TaskServiceError);

impl From<TaskServiceError> for TaskApiError {
    fn from(err: TaskServiceError) -> Self {
        TaskApiError(err)
    }
}

impl IntoResponse for TaskApiError {
    fn into_response(self) -> Response {
        match self.0 {
            TaskServiceError::Validation(errors) => {
                tracing::warn!("Rejected task write: {}", errors);
                // The 400 body is the bare field-to-messages map.
                (StatusCode::BAD_REQUEST, Json(errors)).into_response()
            }
            TaskServiceError::TaskNotFound(id) => (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: "NOT_FOUND".to_string(),
                    message: format!("Task with ID {} not found", id),
                }),
            )
                .into_response(),
            TaskServiceError::Database(err) => {
                tracing::error!("Database error while handling task request: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        error: "INTERNAL_SERVER_ERROR".to_string(),
                        message: "An unexpected error occurred while processing your request."
                            .to_string(),
                    }),
                )
                    .into_response()
            }
        }
    }
}

/// Handler for GET /tasks/ - Returns all tasks, newest first.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/tasks/",
    responses(
        (status = 200, description = "Successfully retrieved tasks", body = Vec<TaskJson>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn list_tasks_handler(
    State(state): State<Arc<TaskState>>,
) -> Result<Json<Vec<TaskJson>>, TaskApiError> {
    let service = TaskService::new(&state.db);
    let tasks = service.get_all_tasks().await?;
    Ok(Json(tasks.into_iter().map(TaskJson::from).collect()))
}

/// Handler for POST /tasks/ - Creates a new task.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    post,
    path = "/tasks/",
    request_body = TaskPayload,
    responses(
        (status = 201, description = "Task created", body = TaskJson),
        (status = 400, description = "Validation failed", body = ValidationErrors),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn create_task_handler(
    State(state): State<Arc<TaskState>>,
    Json(payload): Json<TaskPayload>,
) -> Result<(StatusCode, Json<TaskJson>), TaskApiError> {
    let service = TaskService::new(&state.db);
    let task = service.create_task(payload.into()).await?;
    Ok((StatusCode::CREATED, Json(TaskJson::from(task))))
}

/// Handler for GET /tasks/{id}/ - Returns a single task.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/tasks/{id}/",
    params(("id" = i32, Path, description = "ID of the task")),
    responses(
        (status = 200, description = "Successfully retrieved task", body = TaskJson),
        (status = 404, description = "Task not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn get_task_handler(
    State(state): State<Arc<TaskState>>,
    Path(id): Path<i32>,
) -> Result<Json<TaskJson>, TaskApiError> {
    let service = TaskService::new(&state.db);
    let task = service.get_task_by_id(id).await?;
    Ok(Json(TaskJson::from(task)))
}

/// Handler for PUT /tasks/{id}/ - Replaces all mutable fields of a task.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    put,
    path = "/tasks/{id}/",
    params(("id" = i32, Path, description = "ID of the task")),
    request_body = TaskPayload,
    responses(
        (status = 200, description = "Task updated", body = TaskJson),
        (status = 400, description = "Validation failed", body = ValidationErrors),
        (status = 404, description = "Task not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn replace_task_handler(
    State(state): State<Arc<TaskState>>,
    Path(id): Path<i32>,
    Json(payload): Json<TaskPayload>,
) -> Result<Json<TaskJson>, TaskApiError> {
    let service = TaskService::new(&state.db);
    let task = service.replace_task_by_id(id, payload.into()).await?;
    Ok(Json(TaskJson::from(task)))
}

/// Handler for PATCH /tasks/{id}/ - Updates only the supplied fields.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    patch,
    path = "/tasks/{id}/",
    params(("id" = i32, Path, description = "ID of the task")),
    request_body = TaskPayload,
    responses(
        (status = 200, description = "Task updated", body = TaskJson),
        (status = 400, description = "Validation failed", body = ValidationErrors),
        (status = 404, description = "Task not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn patch_task_handler(
    State(state): State<Arc<TaskState>>,
    Path(id): Path<i32>,
    Json(payload): Json<TaskPayload>,
) -> Result<Json<TaskJson>, TaskApiError> {
    let service = TaskService::new(&state.db);
    let task = service.patch_task_by_id(id, payload.into()).await?;
    Ok(Json(TaskJson::from(task)))
}

/// Handler for DELETE /tasks/{id}/ - Deletes a task. No response body.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    delete,
    path = "/tasks/{id}/",
    params(("id" = i32, Path, description = "ID of the task")),
    responses(
        (status = 204, description = "Task deleted"),
        (status = 404, description = "Task not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn delete_task_handler(
    State(state): State<Arc<TaskState>>,
    Path(id): Path<i32>,
) -> Result<StatusCode, TaskApiError> {
    let service = TaskService::new(&state.db);
    let deleted = service.delete_task_by_id(id).await?;
    tracing::info!("Deleted task {} (\"{}\")", deleted.id(), deleted.title());
    Ok(StatusCode::NO_CONTENT)
}

/// Creates and returns the tasks API router.
pub fn create_task_router(state: TaskState) -> Router {
    let state = Arc::new(state);
    Router::new()
        .route(
            "/tasks/",
            get(list_tasks_handler).post(create_task_handler),
        )
        .route(
            "/tasks/{id}/",
            get(get_task_handler)
                .put(replace_task_handler)
                .patch(patch_task_handler)
                .delete(delete_task_handler),
        )
        .with_state(state)
}
