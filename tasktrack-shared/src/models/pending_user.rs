/// Pending user model and database operations
///
/// A pending user is a registration into a company that already has members.
/// It waits until an admin or manager approves it (turning it into a seller
/// profile) or rejects it. Either way the row is deleted.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE pending_users (
///     id UUID PRIMARY KEY REFERENCES accounts(id) ON DELETE CASCADE,
///     company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
///     email VARCHAR(255) NOT NULL,
///     name VARCHAR(255) NOT NULL,
///     requested_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

/// Registration awaiting approval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PendingUser {
    /// Pending user ID (same as the account ID)
    pub id: Uuid,

    /// Company the applicant asked to join
    pub company_id: Uuid,

    /// Email address copied from the account
    pub email: String,

    /// Display name
    pub name: String,

    /// When the registration was made
    pub requested_at: DateTime<Utc>,
}

/// Input for creating a pending user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePendingUser {
    pub id: Uuid,
    pub company_id: Uuid,
    pub email: String,
    pub name: String,
}

impl PendingUser {
    /// Creates a pending registration
    pub async fn create<'e, E>(executor: E, data: CreatePendingUser) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let pending = sqlx::query_as::<_, PendingUser>(
            r#"
            INSERT INTO pending_users (id, company_id, email, name)
            VALUES ($1, $2, $3, $4)
            RETURNING id, company_id, email, name, requested_at
            "#,
        )
        .bind(data.id)
        .bind(data.company_id)
        .bind(data.email)
        .bind(data.name)
        .fetch_one(executor)
        .await?;

        Ok(pending)
    }

    /// Finds a pending user by ID, in any company
    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let pending = sqlx::query_as::<_, PendingUser>(
            r#"
            SELECT id, company_id, email, name, requested_at
            FROM pending_users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(pending)
    }

    /// Lists the pending users of a company, oldest request first
    pub async fn list_by_company<'e, E>(
        executor: E,
        company_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let pending = sqlx::query_as::<_, PendingUser>(
            r#"
            SELECT id, company_id, email, name, requested_at
            FROM pending_users
            WHERE company_id = $1
            ORDER BY requested_at ASC
            "#,
        )
        .bind(company_id)
        .fetch_all(executor)
        .await?;

        Ok(pending)
    }

    /// Deletes a pending user within a company and returns the deleted row
    ///
    /// Returns `None` when the row is gone already, which makes approval and
    /// rejection happen at most once.
    pub async fn delete<'e, E>(
        executor: E,
        company_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let pending = sqlx::query_as::<_, PendingUser>(
            r#"
            DELETE FROM pending_users
            WHERE company_id = $1 AND id = $2
            RETURNING id, company_id, email, name, requested_at
            "#,
        )
        .bind(company_id)
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(pending)
    }
}
