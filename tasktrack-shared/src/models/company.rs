/// Company model and database operations
///
/// A company is the tenant boundary of TaskTrack. Profiles, pending users,
/// tasks and task records all carry a `company_id` and every query filters on
/// it.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE companies (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL UNIQUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

/// Company (tenant) model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Company {
    /// Unique company ID
    pub id: Uuid,

    /// Display name, unique across the installation
    pub name: String,

    /// When the company was created
    pub created_at: DateTime<Utc>,
}

impl Company {
    /// Finds a company by name, creating it if it does not exist yet
    ///
    /// Uses `ON CONFLICT` so two concurrent registrations naming the same new
    /// company end up in the same row.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use tasktrack_shared::models::company::Company;
    /// # use sqlx::PgPool;
    /// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
    /// let company = Company::find_or_create(&pool, "Loja Centro").await?;
    /// println!("Company: {}", company.id);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn find_or_create<'e, E>(executor: E, name: &str) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        // The no-op update makes RETURNING yield the existing row on conflict
        let company = sqlx::query_as::<_, Company>(
            r#"
            INSERT INTO companies (name)
            VALUES ($1)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id, name, created_at
            "#,
        )
        .bind(name)
        .fetch_one(executor)
        .await?;

        Ok(company)
    }

    /// Locks the company row for the rest of the transaction
    ///
    /// Registration takes this lock before counting profiles so that only one
    /// applicant can become the bootstrap admin of an empty company. Returns
    /// `None` if the company does not exist.
    pub async fn lock<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let company = sqlx::query_as::<_, Company>(
            "SELECT id, name, created_at FROM companies WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(company)
    }
}
