/// PostgreSQL store
///
/// Composes the `models` queries into the store traits. Multi-step operations
/// (`register_applicant`, `approve_pending`) run in a single transaction.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{
    RegistrationOutcome, ReportFilter, StoreError, StoreResult, TaskStore, UserStore,
};
use crate::db::pool::health_check;
use crate::models::account::{Account, CreateAccount};
use crate::models::company::Company;
use crate::models::pending_user::{CreatePendingUser, PendingUser};
use crate::models::profile::{CreateProfile, Profile, Role};
use crate::models::task::{CreateTask, Task};
use crate::models::task_record::{TaskRecord, UpsertTaskRecord};
use crate::visibility::TaskVisibility;

/// Store backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Maps unique violations to `Conflict`, everything else to `Database`
fn map_err(err: sqlx::Error, what: &str) -> StoreError {
    let unique = err
        .as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false);

    if unique {
        StoreError::Conflict(format!("{} already exists", what))
    } else {
        StoreError::Database(err)
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn list_tasks(
        &self,
        company_id: Uuid,
        date: NaiveDate,
        visibility: &TaskVisibility,
    ) -> StoreResult<Vec<Task>> {
        let tasks = Task::list_for_day(&self.pool, company_id, date, visibility).await?;
        debug!(%company_id, %date, count = tasks.len(), "Listed tasks");
        Ok(tasks)
    }

    async fn find_task(&self, company_id: Uuid, task_id: Uuid) -> StoreResult<Option<Task>> {
        Ok(Task::find_by_id_and_company(&self.pool, company_id, task_id).await?)
    }

    async fn create_task(&self, data: CreateTask) -> StoreResult<Task> {
        let task = Task::create(&self.pool, data)
            .await
            .map_err(|e| map_err(e, "task"))?;
        info!(task_id = %task.id, company_id = %task.company_id, "Task created");
        Ok(task)
    }

    async fn find_record(
        &self,
        task_id: Uuid,
        user_id: Uuid,
        date: NaiveDate,
    ) -> StoreResult<Option<TaskRecord>> {
        Ok(TaskRecord::find(&self.pool, task_id, user_id, date).await?)
    }

    async fn upsert_record(&self, data: UpsertTaskRecord) -> StoreResult<TaskRecord> {
        let record = TaskRecord::upsert(&self.pool, data).await?;
        debug!(
            task_id = %record.task_id,
            user_id = %record.user_id,
            status = record.status.as_str(),
            "Task record written"
        );
        Ok(record)
    }

    async fn list_records(
        &self,
        company_id: Uuid,
        filter: &ReportFilter,
    ) -> StoreResult<Vec<TaskRecord>> {
        Ok(TaskRecord::list_in_range(
            &self.pool,
            company_id,
            filter.from,
            filter.to,
            filter.user_id,
        )
        .await?)
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_account(&self, data: CreateAccount) -> StoreResult<Account> {
        Account::create(&self.pool, data)
            .await
            .map_err(|e| map_err(e, "email"))
    }

    async fn find_account_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        Ok(Account::find_by_email(&self.pool, email).await?)
    }

    async fn touch_last_login(&self, account_id: Uuid) -> StoreResult<()> {
        Account::update_last_login(&self.pool, account_id).await?;
        Ok(())
    }

    async fn find_or_create_company(&self, name: &str) -> StoreResult<Company> {
        Ok(Company::find_or_create(&self.pool, name).await?)
    }

    async fn register_applicant(
        &self,
        company_id: Uuid,
        account: &Account,
    ) -> StoreResult<RegistrationOutcome> {
        let mut tx = self.pool.begin().await?;

        // Serializes registrations into the same company
        if Company::lock(&mut *tx, company_id).await?.is_none() {
            return Err(StoreError::NotFound);
        }

        if Profile::find_by_id(&mut *tx, account.id).await?.is_some()
            || PendingUser::find_by_id(&mut *tx, account.id).await?.is_some()
        {
            return Err(StoreError::Conflict(
                "account is already registered".to_string(),
            ));
        }

        let outcome = if Profile::count_by_company(&mut *tx, company_id).await? == 0 {
            let profile = Profile::create(
                &mut *tx,
                CreateProfile {
                    id: account.id,
                    company_id,
                    email: account.email.clone(),
                    name: account.name.clone(),
                    role: Role::Admin,
                    approved: true,
                },
            )
            .await
            .map_err(|e| map_err(e, "profile"))?;

            RegistrationOutcome::Bootstrapped(profile)
        } else {
            let pending = PendingUser::create(
                &mut *tx,
                CreatePendingUser {
                    id: account.id,
                    company_id,
                    email: account.email.clone(),
                    name: account.name.clone(),
                },
            )
            .await
            .map_err(|e| map_err(e, "pending registration"))?;

            RegistrationOutcome::Pending(pending)
        };

        tx.commit().await?;
        Ok(outcome)
    }

    async fn find_profile(&self, user_id: Uuid) -> StoreResult<Option<Profile>> {
        Ok(Profile::find_by_id(&self.pool, user_id).await?)
    }

    async fn find_pending(&self, user_id: Uuid) -> StoreResult<Option<PendingUser>> {
        Ok(PendingUser::find_by_id(&self.pool, user_id).await?)
    }

    async fn list_profiles(&self, company_id: Uuid) -> StoreResult<Vec<Profile>> {
        Ok(Profile::list_by_company(&self.pool, company_id).await?)
    }

    async fn list_pending_users(&self, company_id: Uuid) -> StoreResult<Vec<PendingUser>> {
        Ok(PendingUser::list_by_company(&self.pool, company_id).await?)
    }

    async fn approve_pending(&self, company_id: Uuid, pending_id: Uuid) -> StoreResult<Profile> {
        let mut tx = self.pool.begin().await?;

        // Deleting first locks the row; a concurrent approval finds nothing
        let pending = PendingUser::delete(&mut *tx, company_id, pending_id)
            .await?
            .ok_or(StoreError::NotFound)?;

        let profile = Profile::create(
            &mut *tx,
            CreateProfile {
                id: pending.id,
                company_id: pending.company_id,
                email: pending.email,
                name: pending.name,
                role: Role::Seller,
                approved: true,
            },
        )
        .await
        .map_err(|e| map_err(e, "profile"))?;

        tx.commit().await?;

        info!(user_id = %profile.id, %company_id, "Pending user approved");
        Ok(profile)
    }

    async fn reject_pending(
        &self,
        company_id: Uuid,
        pending_id: Uuid,
    ) -> StoreResult<PendingUser> {
        let pending = PendingUser::delete(&self.pool, company_id, pending_id)
            .await?
            .ok_or(StoreError::NotFound)?;

        info!(user_id = %pending.id, %company_id, "Pending user rejected");
        Ok(pending)
    }

    async fn update_role(
        &self,
        company_id: Uuid,
        user_id: Uuid,
        role: Role,
    ) -> StoreResult<Profile> {
        let profile = Profile::update_role(&self.pool, company_id, user_id, role)
            .await?
            .ok_or(StoreError::NotFound)?;

        info!(%user_id, %company_id, role = role.as_str(), "Role updated");
        Ok(profile)
    }

    async fn ping(&self) -> StoreResult<()> {
        health_check(&self.pool).await.map_err(|e| {
            warn!(error = %e, "Database ping failed");
            StoreError::Database(e)
        })
    }
}
