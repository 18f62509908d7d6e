/// Task model and database operations
///
/// Tasks are daily units of work created by admins and managers. The task's
/// own `status` is a template: what a user actually sees for a day comes from
/// their [`TaskRecord`](crate::models::task_record::TaskRecord) when one exists.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('pending', 'in_progress', 'done');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
///     title VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     deadline TIMESTAMPTZ,
///     status task_status NOT NULL DEFAULT 'pending',
///     date DATE NOT NULL,
///     created_by UUID NOT NULL REFERENCES accounts(id),
///     assigned_to UUID REFERENCES accounts(id) ON DELETE SET NULL,
///     manager_id UUID REFERENCES accounts(id) ON DELETE SET NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use tasktrack_shared::models::task::{Task, CreateTask, TaskStatus};
/// use tasktrack_shared::visibility::TaskVisibility;
/// use tasktrack_shared::db::pool::{create_pool, DatabaseConfig};
/// use chrono::NaiveDate;
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
/// let company_id = Uuid::new_v4();
/// let manager = Uuid::new_v4();
/// let day = NaiveDate::from_ymd_opt(2025, 4, 10).unwrap();
///
/// Task::create(&pool, CreateTask {
///     company_id,
///     title: "Restock shelf".to_string(),
///     description: String::new(),
///     deadline: None,
///     status: TaskStatus::Pending,
///     date: day,
///     created_by: manager,
///     assigned_to: None,
///     manager_id: Some(manager),
/// }).await?;
///
/// let visible = Task::list_for_day(
///     &pool,
///     company_id,
///     day,
///     &TaskVisibility::Team { user_id: manager },
/// ).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::visibility::TaskVisibility;

/// Completion status of a task or task record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started
    Pending,

    /// Being worked on
    InProgress,

    /// Finished; records carry a completion timestamp
    Done,
}

impl TaskStatus {
    /// Converts status to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
        }
    }

    /// Checks if the status counts as completed
    pub fn is_done(&self) -> bool {
        matches!(self, TaskStatus::Done)
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Pending
    }
}

/// Task model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Company that owns the task
    pub company_id: Uuid,

    /// Short title
    pub title: String,

    /// Free-form description (may be empty)
    pub description: String,

    /// Optional deadline
    pub deadline: Option<DateTime<Utc>>,

    /// Template status shown when the user has no record for the day
    pub status: TaskStatus,

    /// Calendar day the task belongs to
    pub date: NaiveDate,

    /// Profile that created the task
    pub created_by: Uuid,

    /// Seller the task is assigned to
    pub assigned_to: Option<Uuid>,

    /// Manager responsible for the task
    pub manager_id: Option<Uuid>,

    /// When the task was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    pub company_id: Uuid,
    pub title: String,
    pub description: String,
    pub deadline: Option<DateTime<Utc>>,
    pub status: TaskStatus,
    pub date: NaiveDate,
    pub created_by: Uuid,
    pub assigned_to: Option<Uuid>,
    pub manager_id: Option<Uuid>,
}

const TASK_COLUMNS: &str = "id, company_id, title, description, deadline, status, date, \
                            created_by, assigned_to, manager_id, created_at";

impl Task {
    /// Creates a new task
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Company or referenced accounts don't exist (foreign key violation)
    /// - Database connection fails
    pub async fn create<'e, E>(executor: E, data: CreateTask) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let sql = format!(
            r#"
            INSERT INTO tasks (company_id, title, description, deadline, status, date,
                               created_by, assigned_to, manager_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {TASK_COLUMNS}
            "#
        );

        let task = sqlx::query_as::<_, Task>(&sql)
            .bind(data.company_id)
            .bind(data.title)
            .bind(data.description)
            .bind(data.deadline)
            .bind(data.status)
            .bind(data.date)
            .bind(data.created_by)
            .bind(data.assigned_to)
            .bind(data.manager_id)
            .fetch_one(executor)
            .await?;

        Ok(task)
    }

    /// Finds a task by ID within a company
    ///
    /// Tasks of other companies are reported as absent.
    pub async fn find_by_id_and_company<'e, E>(
        executor: E,
        company_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE company_id = $1 AND id = $2");

        let task = sqlx::query_as::<_, Task>(&sql)
            .bind(company_id)
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(task)
    }

    /// Lists the tasks of one day that a visibility scope allows
    ///
    /// Ordered by creation time so repeated calls return the same order.
    pub async fn list_for_day<'e, E>(
        executor: E,
        company_id: Uuid,
        date: NaiveDate,
        visibility: &TaskVisibility,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let scope = match visibility {
            TaskVisibility::All => "",
            TaskVisibility::Team { .. } => "AND (created_by = $3 OR manager_id = $3)",
            TaskVisibility::Own { .. } => "AND assigned_to = $3",
        };

        let sql = format!(
            r#"
            SELECT {TASK_COLUMNS}
            FROM tasks
            WHERE company_id = $1 AND date = $2 {scope}
            ORDER BY created_at ASC, id ASC
            "#
        );

        let mut query = sqlx::query_as::<_, Task>(&sql).bind(company_id).bind(date);
        if let Some(user_id) = visibility.user_id() {
            query = query.bind(user_id);
        }

        let tasks = query.fetch_all(executor).await?;

        Ok(tasks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_as_str() {
        assert_eq!(TaskStatus::Pending.as_str(), "pending");
        assert_eq!(TaskStatus::InProgress.as_str(), "in_progress");
        assert_eq!(TaskStatus::Done.as_str(), "done");
    }

    #[test]
    fn test_status_serde_uses_snake_case() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");

        let status: TaskStatus = serde_json::from_str("\"done\"").unwrap();
        assert_eq!(status, TaskStatus::Done);
    }

    #[test]
    fn test_status_is_done() {
        assert!(TaskStatus::Done.is_done());
        assert!(!TaskStatus::InProgress.is_done());
        assert!(!TaskStatus::Pending.is_done());
    }

    #[test]
    fn test_default_status_is_pending() {
        assert_eq!(TaskStatus::default(), TaskStatus::Pending);
    }
}
