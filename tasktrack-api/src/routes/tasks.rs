/// Task endpoints
///
/// - `GET /v1/tasks?date=YYYY-MM-DD` - The caller's board for a day
/// - `POST /v1/tasks` - Create a task (admin/manager)
/// - `PUT /v1/tasks/:task_id/status` - Set the caller's status for a task
///
/// Days default to today in UTC.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use tasktrack_shared::{
    auth::session::Session,
    models::task::{Task, TaskStatus},
    tracker::{self, DailyBoard, NewTask, TaskView},
};
use uuid::Uuid;
use validator::Validate;

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Board query
#[derive(Debug, Deserialize)]
pub struct BoardQuery {
    pub date: Option<NaiveDate>,
}

/// Create task request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1 to 200 characters"))]
    pub title: String,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    #[serde(default)]
    pub description: String,

    pub deadline: Option<DateTime<Utc>>,

    /// Day the task belongs to (default: today)
    pub date: Option<NaiveDate>,

    /// Seller the task is for; unassigned tasks are visible to admins and the
    /// managing manager only
    pub assigned_to: Option<Uuid>,

    /// Managing admin/manager (default: the creating manager)
    pub manager_id: Option<Uuid>,
}

/// Status update request
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: TaskStatus,

    /// Day of the record (default: today)
    pub date: Option<NaiveDate>,
}

/// The caller's reconciled board
///
/// Each row carries the task plus the caller's own status for the day.
/// Tasks without a record for the caller show the task's template status.
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(query): Query<BoardQuery>,
) -> ApiResult<Json<DailyBoard>> {
    let date = query.date.unwrap_or_else(today);
    let board = tracker::load_board(&*state.store, &session, date).await?;

    Ok(Json(board))
}

/// Create a task
///
/// # Errors
///
/// - `400 Bad Request`: assignee or manager is not a valid member
/// - `403 Forbidden`: caller is a seller
/// - `422 Unprocessable Entity`: validation failed
pub async fn create_task(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    req.validate().map_err(ApiError::from_validation)?;

    let task = tracker::create_task(
        &*state.store,
        &session,
        NewTask {
            title: req.title,
            description: req.description,
            deadline: req.deadline,
            date: req.date.unwrap_or_else(today),
            assigned_to: req.assigned_to,
            manager_id: req.manager_id,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(task)))
}

/// Set the caller's status for a task
///
/// Writes the caller's record for `(task, caller, date)`; other users' rows
/// and the task's template status are untouched. Repeating the call updates
/// the same record.
///
/// # Errors
///
/// - `403 Forbidden`: the task is not visible to the caller or belongs to
///   another day
/// - `404 Not Found`: no such task in the caller's company
pub async fn update_status(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(task_id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> ApiResult<Json<TaskView>> {
    let date = req.date.unwrap_or_else(today);

    // Requests are stateless; an empty board yields the row built from the write
    let mut board = DailyBoard::new(session.user_id, date, Vec::new());
    let row = tracker::set_status(&*state.store, &session, &mut board, task_id, req.status).await?;

    Ok(Json(row))
}
