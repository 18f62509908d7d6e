/// Task record model and database operations
///
/// A task record is one user's status for one task on one day. There is at
/// most one record per `(task_id, user_id, date)`; writes are upserts on that
/// key so concurrent clients never create duplicates (last write wins).
///
/// # Schema
///
/// ```sql
/// CREATE TABLE task_records (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
///     task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
///     user_name VARCHAR(255) NOT NULL,
///     date DATE NOT NULL,
///     status task_status NOT NULL,
///     completed_at TIMESTAMPTZ,
///     notes TEXT,
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT task_records_task_user_date_key UNIQUE (task_id, user_id, date)
/// );
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

use super::task::TaskStatus;

/// Per-user, per-day status of a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaskRecord {
    /// Unique record ID
    pub id: Uuid,

    /// Company that owns the task
    pub company_id: Uuid,

    /// Task the record belongs to
    pub task_id: Uuid,

    /// User whose progress this is
    pub user_id: Uuid,

    /// Display name of the user at the time of the first write
    pub user_name: String,

    /// Calendar day
    pub date: NaiveDate,

    /// Current status
    pub status: TaskStatus,

    /// Set when status is `done`, cleared otherwise
    pub completed_at: Option<DateTime<Utc>>,

    /// Optional free-form notes
    pub notes: Option<String>,

    /// Last write time
    pub updated_at: DateTime<Utc>,
}

/// Input for inserting or updating a record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertTaskRecord {
    pub company_id: Uuid,
    pub task_id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub date: NaiveDate,
    pub status: TaskStatus,
    pub completed_at: Option<DateTime<Utc>>,
}

const RECORD_COLUMNS: &str = "id, company_id, task_id, user_id, user_name, date, status, \
                              completed_at, notes, updated_at";

impl TaskRecord {
    /// Finds the record for a task, user and day
    pub async fn find<'e, E>(
        executor: E,
        task_id: Uuid,
        user_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM task_records \
             WHERE task_id = $1 AND user_id = $2 AND date = $3"
        );

        let record = sqlx::query_as::<_, TaskRecord>(&sql)
            .bind(task_id)
            .bind(user_id)
            .bind(date)
            .fetch_optional(executor)
            .await?;

        Ok(record)
    }

    /// Inserts the record, or updates status and completion time if it exists
    ///
    /// On conflict only `status`, `completed_at` and `updated_at` change; the
    /// stored `user_name` and `notes` are kept.
    pub async fn upsert<'e, E>(executor: E, data: UpsertTaskRecord) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let sql = format!(
            r#"
            INSERT INTO task_records (company_id, task_id, user_id, user_name, date, status, completed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT ON CONSTRAINT task_records_task_user_date_key DO UPDATE
            SET status = EXCLUDED.status,
                completed_at = EXCLUDED.completed_at,
                updated_at = NOW()
            RETURNING {RECORD_COLUMNS}
            "#
        );

        let record = sqlx::query_as::<_, TaskRecord>(&sql)
            .bind(data.company_id)
            .bind(data.task_id)
            .bind(data.user_id)
            .bind(data.user_name)
            .bind(data.date)
            .bind(data.status)
            .bind(data.completed_at)
            .fetch_one(executor)
            .await?;

        Ok(record)
    }

    /// Lists the records of a company within an inclusive date range
    ///
    /// When `user_id` is set only that user's records are returned. Newest day
    /// first.
    pub async fn list_in_range<'e, E>(
        executor: E,
        company_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
        user_id: Option<Uuid>,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let sql = format!(
            r#"
            SELECT {RECORD_COLUMNS}
            FROM task_records
            WHERE company_id = $1
              AND date BETWEEN $2 AND $3
              AND ($4::uuid IS NULL OR user_id = $4)
            ORDER BY date DESC, updated_at DESC, id ASC
            "#
        );

        let records = sqlx::query_as::<_, TaskRecord>(&sql)
            .bind(company_id)
            .bind(from)
            .bind(to)
            .bind(user_id)
            .fetch_all(executor)
            .await?;

        Ok(records)
    }
}
