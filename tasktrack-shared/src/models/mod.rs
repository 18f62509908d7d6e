/// Database models for TaskTrack
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `company`: Tenants; every other row is scoped to one
/// - `account`: Login identities (email + Argon2id hash)
/// - `profile`: Approved, role-bearing users of a company
/// - `pending_user`: Registrations waiting for approval
/// - `task`: Daily tasks created by admins and managers
/// - `task_record`: Per-user, per-day completion records
///
/// # Example
///
/// ```no_run
/// use tasktrack_shared::models::account::{Account, CreateAccount};
/// use tasktrack_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let account = Account::create(&pool, CreateAccount {
///     email: "user@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     name: "Maria Silva".to_string(),
/// }).await?;
/// # Ok(())
/// # }
/// ```

pub mod account;
pub mod company;
pub mod pending_user;
pub mod profile;
pub mod task;
pub mod task_record;
