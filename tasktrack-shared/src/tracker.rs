/// Daily task board: reconciliation and status changes
///
/// A [`DailyBoard`] is the list of tasks one user sees for one day. Each row
/// shows the user's own [`TaskRecord`] status when one exists and the task's
/// template status otherwise.
///
/// # Flow
///
/// ```text
/// load_board(session, day)
///   ├─> store.list_tasks(company, day, visibility)
///   └─> reconcile: store.find_record(task, user, day) for every task, concurrently
///
/// set_status(session, board, task, status)
///   ├─> authorize: task exists in the company and is visible to the session
///   ├─> store.upsert_record(task, user, day, status, completed_at)
///   └─> board row updated from the stored record
/// ```
///
/// The board is only touched after the store confirms a write; on any error it
/// keeps its previous contents.
///
/// # Example
///
/// ```no_run
/// use tasktrack_shared::tracker::{load_board, set_status};
/// use tasktrack_shared::models::task::TaskStatus;
/// # use tasktrack_shared::{auth::session::Session, store::memory::MemoryStore};
/// # use chrono::NaiveDate;
/// # use uuid::Uuid;
///
/// # async fn example(store: MemoryStore, session: Session, task_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let day = NaiveDate::from_ymd_opt(2025, 4, 10).unwrap();
/// let mut board = load_board(&store, &session, day).await?;
///
/// let row = set_status(&store, &session, &mut board, task_id, TaskStatus::Done).await?;
/// assert!(row.completed_at.is_some());
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::auth::authorization::{require_task_creation, AuthzError};
use crate::auth::session::Session;
use crate::models::profile::Role;
use crate::models::task::{CreateTask, Task, TaskStatus};
use crate::models::task_record::{TaskRecord, UpsertTaskRecord};
use crate::store::{StoreError, TaskStore, UserStore};
use crate::visibility::TaskVisibility;

/// Tracker errors
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error(transparent)]
    Unauthorized(#[from] AuthzError),

    #[error("Task not found")]
    TaskNotFound,

    #[error("Invalid task: {0}")]
    Invalid(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// One row of a daily board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskView {
    /// The shared task
    pub task: Task,

    /// Displayed status: the user's record if present, else the task's own
    pub status: TaskStatus,

    /// Completion time from the user's record
    pub completed_at: Option<DateTime<Utc>>,

    /// The user's record for the day, if one exists
    pub record_id: Option<Uuid>,
}

impl TaskView {
    /// Overlays an optional record onto a task
    pub fn new(task: Task, record: Option<&TaskRecord>) -> Self {
        match record {
            Some(record) => Self {
                status: record.status,
                completed_at: record.completed_at,
                record_id: Some(record.id),
                task,
            },
            None => Self {
                status: task.status,
                completed_at: None,
                record_id: None,
                task,
            },
        }
    }

    fn apply(&mut self, record: &TaskRecord) {
        self.status = record.status;
        self.completed_at = record.completed_at;
        self.record_id = Some(record.id);
    }
}

/// The reconciled tasks of one user for one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBoard {
    user_id: Uuid,
    date: NaiveDate,
    rows: Vec<TaskView>,
}

impl DailyBoard {
    pub fn new(user_id: Uuid, date: NaiveDate, rows: Vec<TaskView>) -> Self {
        Self { user_id, date, rows }
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn rows(&self) -> &[TaskView] {
        &self.rows
    }

    /// The row of a task, if it is on the board
    pub fn get(&self, task_id: Uuid) -> Option<&TaskView> {
        self.rows.iter().find(|row| row.task.id == task_id)
    }

    /// Appends a newly created task so it shows without reloading
    ///
    /// Returns `false` and leaves the board alone when the task belongs to
    /// another day or is already on the board.
    pub fn push(&mut self, task: Task) -> bool {
        if task.date != self.date || self.get(task.id).is_some() {
            return false;
        }

        self.rows.push(TaskView::new(task, None));
        true
    }

    fn apply(&mut self, record: &TaskRecord) -> Option<&TaskView> {
        let row = self.rows.iter_mut().find(|row| row.task.id == record.task_id)?;
        row.apply(record);
        Some(row)
    }
}

/// Overlays each task with the user's record for the day
///
/// Lookups are independent and run concurrently; the output keeps the input
/// order. Any failed lookup fails the whole call.
pub async fn reconcile<S>(
    store: &S,
    tasks: Vec<Task>,
    user_id: Uuid,
    date: NaiveDate,
) -> Result<Vec<TaskView>, StoreError>
where
    S: TaskStore + ?Sized,
{
    let lookups = tasks
        .iter()
        .map(|task| store.find_record(task.id, user_id, date));
    let records = try_join_all(lookups).await?;

    Ok(tasks
        .into_iter()
        .zip(records)
        .map(|(task, record)| TaskView::new(task, record.as_ref()))
        .collect())
}

/// Loads the session's board for a day
pub async fn load_board<S>(
    store: &S,
    session: &Session,
    date: NaiveDate,
) -> Result<DailyBoard, TrackerError>
where
    S: TaskStore + ?Sized,
{
    let visibility = TaskVisibility::for_session(session);
    let tasks = store
        .list_tasks(session.company_id, date, &visibility)
        .await
        .map_err(|e| {
            warn!(user_id = %session.user_id, %date, error = %e, "Failed to list tasks");
            e
        })?;

    let rows = reconcile(store, tasks, session.user_id, date).await?;
    debug!(user_id = %session.user_id, %date, rows = rows.len(), "Board loaded");

    Ok(DailyBoard::new(session.user_id, date, rows))
}

/// Sets the session user's status for a task on the board's day
///
/// # Errors
///
/// - `Unauthorized` if the board belongs to another user, or the task is not
///   visible to the session on the board's day
/// - `TaskNotFound` if the task does not exist in the session's company
/// - `Store` if the write fails; the board is unchanged
pub async fn set_status<S>(
    store: &S,
    session: &Session,
    board: &mut DailyBoard,
    task_id: Uuid,
    status: TaskStatus,
) -> Result<TaskView, TrackerError>
where
    S: TaskStore + ?Sized,
{
    if board.user_id != session.user_id {
        return Err(AuthzError::NotAuthorized.into());
    }

    let task = store
        .find_task(session.company_id, task_id)
        .await?
        .ok_or(TrackerError::TaskNotFound)?;

    // Records are keyed by the board's day; a task dated elsewhere is not on it
    if task.date != board.date || !TaskVisibility::for_session(session).matches(&task) {
        return Err(AuthzError::NotAuthorized.into());
    }

    let completed_at = status.is_done().then(Utc::now);

    let record = store
        .upsert_record(UpsertTaskRecord {
            company_id: session.company_id,
            task_id,
            user_id: session.user_id,
            user_name: session.name.clone(),
            date: board.date,
            status,
            completed_at,
        })
        .await
        .map_err(|e| {
            warn!(%task_id, user_id = %session.user_id, error = %e, "Failed to write task record");
            e
        })?;

    info!(
        %task_id,
        user_id = %session.user_id,
        date = %board.date,
        status = status.as_str(),
        "Task status updated"
    );

    let row = match board.apply(&record) {
        Some(row) => row.clone(),
        None => TaskView::new(task, Some(&record)),
    };

    Ok(row)
}

/// Input for creating a task
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub deadline: Option<DateTime<Utc>>,
    pub date: NaiveDate,
    pub assigned_to: Option<Uuid>,
    pub manager_id: Option<Uuid>,
}

/// Creates a task in the session's company
///
/// Only admins and managers may create tasks. The assignee must be an
/// approved member of the company; the manager, when given, must be an
/// approved admin or manager. A manager creating a task without naming a
/// manager becomes the task's manager.
pub async fn create_task<S>(
    store: &S,
    session: &Session,
    input: NewTask,
) -> Result<Task, TrackerError>
where
    S: TaskStore + UserStore + ?Sized,
{
    require_task_creation(session)?;

    let title = input.title.trim();
    if title.is_empty() {
        return Err(TrackerError::Invalid("title must not be empty".to_string()));
    }

    if let Some(assignee) = input.assigned_to {
        let member = store.find_profile(assignee).await?;
        if !member.map_or(false, |p| p.approved && p.company_id == session.company_id) {
            return Err(TrackerError::Invalid(
                "assignee is not an approved member of the company".to_string(),
            ));
        }
    }

    let manager_id = match input.manager_id {
        Some(manager) => {
            let profile = store.find_profile(manager).await?;
            let valid = profile.map_or(false, |p| {
                p.approved && p.company_id == session.company_id && p.role.can_manage_users()
            });
            if !valid {
                return Err(TrackerError::Invalid(
                    "manager must be an approved admin or manager of the company".to_string(),
                ));
            }
            Some(manager)
        }
        None if session.role == Role::Admin => None,
        None => Some(session.user_id),
    };

    let task = store
        .create_task(CreateTask {
            company_id: session.company_id,
            title: title.to_string(),
            description: input.description.trim().to_string(),
            deadline: input.deadline,
            status: TaskStatus::Pending,
            date: input.date,
            created_by: session.user_id,
            assigned_to: input.assigned_to,
            manager_id,
        })
        .await?;

    Ok(task)
}
