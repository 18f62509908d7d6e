/// Data-store boundary
///
/// Domain code (`tracker`, `onboarding`, `report`) talks to persistence only
/// through the [`TaskStore`] and [`UserStore`] traits. Two implementations
/// exist:
///
/// - [`postgres::PgStore`]: the production store on top of the `models` queries
/// - [`memory::MemoryStore`]: an in-process store backing the test suites
///
/// # Contract
///
/// Every implementation must:
/// 1. Scope company-owned rows by the `company_id` it is given
/// 2. Keep at most one task record per `(task_id, user_id, date)`
/// 3. Make `register_applicant` and `approve_pending` atomic
/// 4. Report a missing row as [`StoreError::NotFound`] and a uniqueness clash
///    as [`StoreError::Conflict`]
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use tasktrack_shared::store::{memory::MemoryStore, Store};
///
/// let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
/// ```

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::account::{Account, CreateAccount};
use crate::models::company::Company;
use crate::models::pending_user::PendingUser;
use crate::models::profile::{Profile, Role};
use crate::models::task::{CreateTask, Task};
use crate::models::task_record::{TaskRecord, UpsertTaskRecord};
use crate::visibility::TaskVisibility;

pub mod memory;
pub mod postgres;

/// Store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The addressed row does not exist (or belongs to another company)
    #[error("Record not found")]
    NotFound,

    /// A uniqueness rule would be violated
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The backing database failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Record query for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportFilter {
    /// First day, inclusive
    pub from: NaiveDate,

    /// Last day, inclusive
    pub to: NaiveDate,

    /// Restrict to one user's records
    pub user_id: Option<Uuid>,
}

/// Result of registering an account into a company
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RegistrationOutcome {
    /// The company had no profiles; the applicant became its approved admin
    Bootstrapped(Profile),

    /// The company has members; the applicant waits for approval
    Pending(PendingUser),
}

/// Tasks and per-user task records
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Tasks of `company_id` on `date` allowed by `visibility`, oldest first
    async fn list_tasks(
        &self,
        company_id: Uuid,
        date: NaiveDate,
        visibility: &TaskVisibility,
    ) -> StoreResult<Vec<Task>>;

    /// A task of `company_id` by ID
    async fn find_task(&self, company_id: Uuid, task_id: Uuid) -> StoreResult<Option<Task>>;

    /// Inserts a task
    async fn create_task(&self, data: CreateTask) -> StoreResult<Task>;

    /// The record keyed by `(task_id, user_id, date)`
    async fn find_record(
        &self,
        task_id: Uuid,
        user_id: Uuid,
        date: NaiveDate,
    ) -> StoreResult<Option<TaskRecord>>;

    /// Inserts the record, or updates its status and completion time
    async fn upsert_record(&self, data: UpsertTaskRecord) -> StoreResult<TaskRecord>;

    /// Records of `company_id` matching the filter, newest day first
    async fn list_records(
        &self,
        company_id: Uuid,
        filter: &ReportFilter,
    ) -> StoreResult<Vec<TaskRecord>>;
}

/// Accounts, companies, profiles and pending registrations
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Creates an account; a taken email is a `Conflict`
    async fn create_account(&self, data: CreateAccount) -> StoreResult<Account>;

    /// Case-insensitive account lookup
    async fn find_account_by_email(&self, email: &str) -> StoreResult<Option<Account>>;

    /// Stamps the account's last login time
    async fn touch_last_login(&self, account_id: Uuid) -> StoreResult<()>;

    /// The company with this name, created on first use
    async fn find_or_create_company(&self, name: &str) -> StoreResult<Company>;

    /// Atomically bootstraps the company's admin or files a pending request
    ///
    /// An account that already has a profile or a pending row is a `Conflict`.
    async fn register_applicant(
        &self,
        company_id: Uuid,
        account: &Account,
    ) -> StoreResult<RegistrationOutcome>;

    /// The profile of an account, in any company
    async fn find_profile(&self, user_id: Uuid) -> StoreResult<Option<Profile>>;

    /// The pending row of an account, in any company
    async fn find_pending(&self, user_id: Uuid) -> StoreResult<Option<PendingUser>>;

    /// Every profile of a company
    async fn list_profiles(&self, company_id: Uuid) -> StoreResult<Vec<Profile>>;

    /// Every pending registration of a company, oldest first
    async fn list_pending_users(&self, company_id: Uuid) -> StoreResult<Vec<PendingUser>>;

    /// Atomically inserts an approved seller profile and deletes the pending row
    ///
    /// A second call for the same ID is `NotFound`.
    async fn approve_pending(&self, company_id: Uuid, pending_id: Uuid) -> StoreResult<Profile>;

    /// Deletes the pending row and returns it
    async fn reject_pending(&self, company_id: Uuid, pending_id: Uuid)
        -> StoreResult<PendingUser>;

    /// Sets the role of a profile in the company
    async fn update_role(&self, company_id: Uuid, user_id: Uuid, role: Role)
        -> StoreResult<Profile>;

    /// Checks the backing store is reachable
    async fn ping(&self) -> StoreResult<()>;
}

/// The full store used by the API
pub trait Store: TaskStore + UserStore {}

impl<T: TaskStore + UserStore> Store for T {}
