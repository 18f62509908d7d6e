/// In-memory store
///
/// Holds every table behind one `tokio::sync::RwLock`, so each trait call is
/// atomic with respect to every other call. Backs the unit and router tests,
/// which need no database.
///
/// [`MemoryStore::set_unavailable`] makes every call fail with a database
/// error, which lets tests exercise the failure paths of the domain code.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    RegistrationOutcome, ReportFilter, StoreError, StoreResult, TaskStore, UserStore,
};
use crate::models::account::{normalize_email, Account, CreateAccount};
use crate::models::company::Company;
use crate::models::pending_user::PendingUser;
use crate::models::profile::{Profile, Role};
use crate::models::task::{CreateTask, Task};
use crate::models::task_record::{TaskRecord, UpsertTaskRecord};
use crate::visibility::TaskVisibility;

type RecordKey = (Uuid, Uuid, NaiveDate);

#[derive(Debug, Default)]
struct Tables {
    accounts: HashMap<Uuid, Account>,
    companies: HashMap<Uuid, Company>,
    profiles: HashMap<Uuid, Profile>,
    pending: HashMap<Uuid, PendingUser>,
    /// Insertion order doubles as creation order
    tasks: Vec<Task>,
    records: HashMap<RecordKey, TaskRecord>,
}

/// Store keeping all rows in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// While set, every call fails with `StoreError::Database`
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn available(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn list_tasks(
        &self,
        company_id: Uuid,
        date: NaiveDate,
        visibility: &TaskVisibility,
    ) -> StoreResult<Vec<Task>> {
        self.available()?;
        let tables = self.tables.read().await;

        Ok(tables
            .tasks
            .iter()
            .filter(|t| t.company_id == company_id && t.date == date && visibility.matches(t))
            .cloned()
            .collect())
    }

    async fn find_task(&self, company_id: Uuid, task_id: Uuid) -> StoreResult<Option<Task>> {
        self.available()?;
        let tables = self.tables.read().await;

        Ok(tables
            .tasks
            .iter()
            .find(|t| t.id == task_id && t.company_id == company_id)
            .cloned())
    }

    async fn create_task(&self, data: CreateTask) -> StoreResult<Task> {
        self.available()?;
        let mut tables = self.tables.write().await;

        let task = Task {
            id: Uuid::new_v4(),
            company_id: data.company_id,
            title: data.title,
            description: data.description,
            deadline: data.deadline,
            status: data.status,
            date: data.date,
            created_by: data.created_by,
            assigned_to: data.assigned_to,
            manager_id: data.manager_id,
            created_at: Utc::now(),
        };
        tables.tasks.push(task.clone());

        Ok(task)
    }

    async fn find_record(
        &self,
        task_id: Uuid,
        user_id: Uuid,
        date: NaiveDate,
    ) -> StoreResult<Option<TaskRecord>> {
        self.available()?;
        let tables = self.tables.read().await;

        Ok(tables.records.get(&(task_id, user_id, date)).cloned())
    }

    async fn upsert_record(&self, data: UpsertTaskRecord) -> StoreResult<TaskRecord> {
        self.available()?;
        let mut tables = self.tables.write().await;
        let now = Utc::now();

        let record = tables
            .records
            .entry((data.task_id, data.user_id, data.date))
            .and_modify(|existing| {
                existing.status = data.status;
                existing.completed_at = data.completed_at;
                existing.updated_at = now;
            })
            .or_insert_with(|| TaskRecord {
                id: Uuid::new_v4(),
                company_id: data.company_id,
                task_id: data.task_id,
                user_id: data.user_id,
                user_name: data.user_name.clone(),
                date: data.date,
                status: data.status,
                completed_at: data.completed_at,
                notes: None,
                updated_at: now,
            });

        Ok(record.clone())
    }

    async fn list_records(
        &self,
        company_id: Uuid,
        filter: &ReportFilter,
    ) -> StoreResult<Vec<TaskRecord>> {
        self.available()?;
        let tables = self.tables.read().await;

        let mut records: Vec<TaskRecord> = tables
            .records
            .values()
            .filter(|r| {
                r.company_id == company_id
                    && r.date >= filter.from
                    && r.date <= filter.to
                    && filter.user_id.map_or(true, |user| r.user_id == user)
            })
            .cloned()
            .collect();

        records.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then(b.updated_at.cmp(&a.updated_at))
                .then(a.id.cmp(&b.id))
        });

        Ok(records)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_account(&self, data: CreateAccount) -> StoreResult<Account> {
        self.available()?;
        let mut tables = self.tables.write().await;
        let email = normalize_email(&data.email);

        if tables.accounts.values().any(|a| a.email == email) {
            return Err(StoreError::Conflict("email already exists".to_string()));
        }

        let account = Account {
            id: Uuid::new_v4(),
            email,
            password_hash: data.password_hash,
            name: data.name,
            created_at: Utc::now(),
            last_login_at: None,
        };
        tables.accounts.insert(account.id, account.clone());

        Ok(account)
    }

    async fn find_account_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        self.available()?;
        let tables = self.tables.read().await;
        let email = normalize_email(email);

        Ok(tables.accounts.values().find(|a| a.email == email).cloned())
    }

    async fn touch_last_login(&self, account_id: Uuid) -> StoreResult<()> {
        self.available()?;
        let mut tables = self.tables.write().await;

        if let Some(account) = tables.accounts.get_mut(&account_id) {
            account.last_login_at = Some(Utc::now());
        }

        Ok(())
    }

    async fn find_or_create_company(&self, name: &str) -> StoreResult<Company> {
        self.available()?;
        let mut tables = self.tables.write().await;

        if let Some(company) = tables.companies.values().find(|c| c.name == name) {
            return Ok(company.clone());
        }

        let company = Company {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_at: Utc::now(),
        };
        tables.companies.insert(company.id, company.clone());

        Ok(company)
    }

    async fn register_applicant(
        &self,
        company_id: Uuid,
        account: &Account,
    ) -> StoreResult<RegistrationOutcome> {
        self.available()?;
        let mut tables = self.tables.write().await;

        if !tables.companies.contains_key(&company_id) {
            return Err(StoreError::NotFound);
        }

        if tables.profiles.contains_key(&account.id) || tables.pending.contains_key(&account.id) {
            return Err(StoreError::Conflict(
                "account is already registered".to_string(),
            ));
        }

        let company_is_empty = !tables.profiles.values().any(|p| p.company_id == company_id);

        if company_is_empty {
            let profile = Profile {
                id: account.id,
                company_id,
                email: account.email.clone(),
                name: account.name.clone(),
                role: Role::Admin,
                approved: true,
                created_at: Utc::now(),
            };
            tables.profiles.insert(profile.id, profile.clone());

            Ok(RegistrationOutcome::Bootstrapped(profile))
        } else {
            let pending = PendingUser {
                id: account.id,
                company_id,
                email: account.email.clone(),
                name: account.name.clone(),
                requested_at: Utc::now(),
            };
            tables.pending.insert(pending.id, pending.clone());

            Ok(RegistrationOutcome::Pending(pending))
        }
    }

    async fn find_profile(&self, user_id: Uuid) -> StoreResult<Option<Profile>> {
        self.available()?;
        let tables = self.tables.read().await;

        Ok(tables.profiles.get(&user_id).cloned())
    }

    async fn find_pending(&self, user_id: Uuid) -> StoreResult<Option<PendingUser>> {
        self.available()?;
        let tables = self.tables.read().await;

        Ok(tables.pending.get(&user_id).cloned())
    }

    async fn list_profiles(&self, company_id: Uuid) -> StoreResult<Vec<Profile>> {
        self.available()?;
        let tables = self.tables.read().await;

        let mut profiles: Vec<Profile> = tables
            .profiles
            .values()
            .filter(|p| p.company_id == company_id)
            .cloned()
            .collect();
        profiles.sort_by(|a, b| a.name.cmp(&b.name).then(a.created_at.cmp(&b.created_at)));

        Ok(profiles)
    }

    async fn list_pending_users(&self, company_id: Uuid) -> StoreResult<Vec<PendingUser>> {
        self.available()?;
        let tables = self.tables.read().await;

        let mut pending: Vec<PendingUser> = tables
            .pending
            .values()
            .filter(|p| p.company_id == company_id)
            .cloned()
            .collect();
        pending.sort_by(|a, b| a.requested_at.cmp(&b.requested_at).then(a.id.cmp(&b.id)));

        Ok(pending)
    }

    async fn approve_pending(&self, company_id: Uuid, pending_id: Uuid) -> StoreResult<Profile> {
        self.available()?;
        let mut tables = self.tables.write().await;

        let in_company = tables
            .pending
            .get(&pending_id)
            .map_or(false, |p| p.company_id == company_id);
        if !in_company {
            return Err(StoreError::NotFound);
        }

        let pending = tables.pending.remove(&pending_id).ok_or(StoreError::NotFound)?;

        let profile = Profile {
            id: pending.id,
            company_id: pending.company_id,
            email: pending.email,
            name: pending.name,
            role: Role::Seller,
            approved: true,
            created_at: Utc::now(),
        };
        tables.profiles.insert(profile.id, profile.clone());

        Ok(profile)
    }

    async fn reject_pending(
        &self,
        company_id: Uuid,
        pending_id: Uuid,
    ) -> StoreResult<PendingUser> {
        self.available()?;
        let mut tables = self.tables.write().await;

        let in_company = tables
            .pending
            .get(&pending_id)
            .map_or(false, |p| p.company_id == company_id);
        if !in_company {
            return Err(StoreError::NotFound);
        }

        tables.pending.remove(&pending_id).ok_or(StoreError::NotFound)
    }

    async fn update_role(
        &self,
        company_id: Uuid,
        user_id: Uuid,
        role: Role,
    ) -> StoreResult<Profile> {
        self.available()?;
        let mut tables = self.tables.write().await;

        let profile = tables
            .profiles
            .get_mut(&user_id)
            .filter(|p| p.company_id == company_id)
            .ok_or(StoreError::NotFound)?;
        profile.role = role;

        Ok(profile.clone())
    }

    async fn ping(&self) -> StoreResult<()> {
        self.available()
    }
}

impl MemoryStore {
    /// Inserts a profile directly, bypassing registration
    ///
    /// Lets tests set up unapproved or arbitrary-role profiles.
    pub async fn insert_profile(&self, profile: Profile) {
        let mut tables = self.tables.write().await;
        tables.profiles.insert(profile.id, profile);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task::TaskStatus;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, 10).unwrap()
    }

    async fn account(store: &MemoryStore, email: &str) -> Account {
        store
            .create_account(CreateAccount {
                email: email.to_string(),
                password_hash: "$argon2id$test".to_string(),
                name: email.split('@').next().unwrap().to_string(),
            })
            .await
            .unwrap()
    }

    fn upsert(task_id: Uuid, user_id: Uuid, status: TaskStatus) -> UpsertTaskRecord {
        UpsertTaskRecord {
            company_id: Uuid::nil(),
            task_id,
            user_id,
            user_name: "Ana".to_string(),
            date: day(),
            status,
            completed_at: status.is_done().then(Utc::now),
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let store = MemoryStore::new();
        account(&store, "ana@loja.com").await;

        let result = store
            .create_account(CreateAccount {
                email: "ANA@loja.com".to_string(),
                password_hash: "x".to_string(),
                name: "Ana".to_string(),
            })
            .await;

        assert!(matches!(result, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_first_applicant_bootstraps_company() {
        let store = MemoryStore::new();
        let company = store.find_or_create_company("Loja").await.unwrap();
        let first = account(&store, "ana@loja.com").await;
        let second = account(&store, "bia@loja.com").await;

        let outcome = store.register_applicant(company.id, &first).await.unwrap();
        match outcome {
            RegistrationOutcome::Bootstrapped(profile) => {
                assert_eq!(profile.role, Role::Admin);
                assert!(profile.approved);
            }
            other => panic!("expected bootstrap, got {:?}", other),
        }
        assert!(store.find_pending(first.id).await.unwrap().is_none());

        let outcome = store.register_applicant(company.id, &second).await.unwrap();
        assert!(matches!(outcome, RegistrationOutcome::Pending(_)));
        assert!(store.find_profile(second.id).await.unwrap().is_none());

        let again = store.register_applicant(company.id, &second).await;
        assert!(matches!(again, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_find_or_create_company_is_stable() {
        let store = MemoryStore::new();
        let a = store.find_or_create_company("Loja").await.unwrap();
        let b = store.find_or_create_company("Loja").await.unwrap();
        let c = store.find_or_create_company("Outra").await.unwrap();

        assert_eq!(a.id, b.id);
        assert_ne!(a.id, c.id);
    }

    #[tokio::test]
    async fn test_approve_is_exactly_once() {
        let store = MemoryStore::new();
        let company = store.find_or_create_company("Loja").await.unwrap();
        let admin = account(&store, "ana@loja.com").await;
        let applicant = account(&store, "bia@loja.com").await;
        store.register_applicant(company.id, &admin).await.unwrap();
        store.register_applicant(company.id, &applicant).await.unwrap();

        let profile = store.approve_pending(company.id, applicant.id).await.unwrap();
        assert_eq!(profile.role, Role::Seller);
        assert!(profile.approved);
        assert!(store.find_pending(applicant.id).await.unwrap().is_none());

        let second = store.approve_pending(company.id, applicant.id).await;
        assert!(matches!(second, Err(StoreError::NotFound)));
    }

    #[tokio::test]
    async fn test_approve_other_company_is_not_found() {
        let store = MemoryStore::new();
        let loja = store.find_or_create_company("Loja").await.unwrap();
        let outra = store.find_or_create_company("Outra").await.unwrap();
        let admin = account(&store, "ana@loja.com").await;
        let applicant = account(&store, "bia@loja.com").await;
        store.register_applicant(loja.id, &admin).await.unwrap();
        store.register_applicant(loja.id, &applicant).await.unwrap();

        let result = store.approve_pending(outra.id, applicant.id).await;
        assert!(matches!(result, Err(StoreError::NotFound)));
        assert!(store.find_pending(applicant.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_upsert_keeps_one_record_per_key() {
        let store = MemoryStore::new();
        let task_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();

        let first = store
            .upsert_record(upsert(task_id, user_id, TaskStatus::InProgress))
            .await
            .unwrap();
        let second = store
            .upsert_record(upsert(task_id, user_id, TaskStatus::Done))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.status, TaskStatus::Done);
        assert!(second.completed_at.is_some());

        let filter = ReportFilter {
            from: day(),
            to: day(),
            user_id: None,
        };
        let records = store.list_records(Uuid::nil(), &filter).await.unwrap();
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn test_find_task_is_company_scoped() {
        let store = MemoryStore::new();
        let company_id = Uuid::new_v4();
        let task = store
            .create_task(CreateTask {
                company_id,
                title: "Vitrine".to_string(),
                description: String::new(),
                deadline: None,
                status: TaskStatus::Pending,
                date: day(),
                created_by: Uuid::new_v4(),
                assigned_to: None,
                manager_id: None,
            })
            .await
            .unwrap();

        assert!(store.find_task(company_id, task.id).await.unwrap().is_some());
        assert!(store.find_task(Uuid::new_v4(), task.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_every_call() {
        let store = MemoryStore::new();
        store.set_unavailable(true);

        assert!(matches!(store.ping().await, Err(StoreError::Database(_))));
        assert!(store.find_profile(Uuid::new_v4()).await.is_err());

        store.set_unavailable(false);
        assert!(store.ping().await.is_ok());
    }
}
