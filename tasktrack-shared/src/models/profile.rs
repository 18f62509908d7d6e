/// Profile model and database operations
///
/// A profile is the role-bearing identity of an account inside a company. It
/// shares its ID with the account. Only approved profiles may act; an
/// unapproved profile ends the session.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE user_role AS ENUM ('admin', 'manager', 'seller');
///
/// CREATE TABLE profiles (
///     id UUID PRIMARY KEY REFERENCES accounts(id) ON DELETE CASCADE,
///     company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
///     email VARCHAR(255) NOT NULL,
///     name VARCHAR(255) NOT NULL,
///     role user_role NOT NULL DEFAULT 'seller',
///     approved BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Roles
///
/// - **admin**: Sees every task of the company, manages all users
/// - **manager**: Sees tasks they created or manage, approves sellers
/// - **seller**: Sees tasks assigned to them
///
/// # Example
///
/// ```no_run
/// use tasktrack_shared::models::profile::{Profile, Role};
/// use tasktrack_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let company_id = Uuid::new_v4();
/// let team = Profile::list_by_company(&pool, company_id).await?;
/// let managers = team.iter().filter(|p| p.role == Role::Manager).count();
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Roles a profile can hold inside its company
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full visibility and user management
    Admin,

    /// Team-scoped visibility, can create tasks and approve sellers
    Manager,

    /// Sees and updates only the tasks assigned to them
    Seller,
}

impl Role {
    /// Converts role to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Seller => "seller",
        }
    }

    /// Can approve, reject and re-role users
    pub fn can_manage_users(&self) -> bool {
        matches!(self, Role::Admin | Role::Manager)
    }

    /// Can create tasks
    pub fn can_create_tasks(&self) -> bool {
        matches!(self, Role::Admin | Role::Manager)
    }

    /// Can read every record of the company in reports
    pub fn can_view_company_reports(&self) -> bool {
        matches!(self, Role::Admin | Role::Manager)
    }

    /// Can grant the admin role or change an admin's role
    pub fn can_manage_admins(&self) -> bool {
        matches!(self, Role::Admin)
    }

    /// Checks if this role has the permission level of the required role
    ///
    /// Hierarchy: Admin > Manager > Seller
    pub fn has_permission(&self, required: &Role) -> bool {
        self.permission_level() >= required.permission_level()
    }

    fn permission_level(&self) -> u8 {
        match self {
            Role::Admin => 3,
            Role::Manager => 2,
            Role::Seller => 1,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown role name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "manager" | "gestor" => Ok(Role::Manager),
            "seller" | "vendedor" => Ok(Role::Seller),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Profile model: an account's role inside a company
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Profile {
    /// Profile ID (same as the account ID)
    pub id: Uuid,

    /// Company the profile belongs to
    pub company_id: Uuid,

    /// Email address copied from the account
    pub email: String,

    /// Display name
    pub name: String,

    /// Role within the company
    pub role: Role,

    /// Whether the profile may act
    pub approved: bool,

    /// When the profile was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProfile {
    pub id: Uuid,
    pub company_id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub approved: bool,
}

impl Profile {
    /// Creates a new profile
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A profile with this ID already exists
    /// - Account or company doesn't exist (foreign key violation)
    /// - Database connection fails
    pub async fn create<'e, E>(executor: E, data: CreateProfile) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            INSERT INTO profiles (id, company_id, email, name, role, approved)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, company_id, email, name, role, approved, created_at
            "#,
        )
        .bind(data.id)
        .bind(data.company_id)
        .bind(data.email)
        .bind(data.name)
        .bind(data.role)
        .bind(data.approved)
        .fetch_one(executor)
        .await?;

        Ok(profile)
    }

    /// Finds a profile by ID, in any company
    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            SELECT id, company_id, email, name, role, approved, created_at
            FROM profiles
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(profile)
    }

    /// Lists all profiles of a company, ordered by name
    pub async fn list_by_company<'e, E>(
        executor: E,
        company_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let profiles = sqlx::query_as::<_, Profile>(
            r#"
            SELECT id, company_id, email, name, role, approved, created_at
            FROM profiles
            WHERE company_id = $1
            ORDER BY name ASC, created_at ASC
            "#,
        )
        .bind(company_id)
        .fetch_all(executor)
        .await?;

        Ok(profiles)
    }

    /// Counts the profiles of a company
    pub async fn count_by_company<'e, E>(executor: E, company_id: Uuid) -> Result<i64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM profiles WHERE company_id = $1")
            .bind(company_id)
            .fetch_one(executor)
            .await?;

        Ok(count.0)
    }

    /// Changes the role of a profile within a company
    ///
    /// # Returns
    ///
    /// The updated profile, or `None` if no such profile exists in the company
    pub async fn update_role<'e, E>(
        executor: E,
        company_id: Uuid,
        id: Uuid,
        role: Role,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            UPDATE profiles
            SET role = $3
            WHERE company_id = $1 AND id = $2
            RETURNING id, company_id, email, name, role, approved, created_at
            "#,
        )
        .bind(company_id)
        .bind(id)
        .bind(role)
        .fetch_optional(executor)
        .await?;

        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_as_str() {
        assert_eq!(Role::Admin.as_str(), "admin");
        assert_eq!(Role::Manager.as_str(), "manager");
        assert_eq!(Role::Seller.as_str(), "seller");
    }

    #[test]
    fn test_role_permissions() {
        assert!(Role::Admin.can_manage_users());
        assert!(Role::Manager.can_manage_users());
        assert!(!Role::Seller.can_manage_users());

        assert!(Role::Admin.can_create_tasks());
        assert!(Role::Manager.can_create_tasks());
        assert!(!Role::Seller.can_create_tasks());

        assert!(Role::Admin.can_manage_admins());
        assert!(!Role::Manager.can_manage_admins());
    }

    #[test]
    fn test_role_hierarchy() {
        assert!(Role::Admin.has_permission(&Role::Manager));
        assert!(Role::Manager.has_permission(&Role::Seller));
        assert!(Role::Manager.has_permission(&Role::Manager));
        assert!(!Role::Seller.has_permission(&Role::Manager));
        assert!(!Role::Manager.has_permission(&Role::Admin));
    }

    #[test]
    fn test_role_from_str() {
        assert_eq!("Admin".parse::<Role>(), Ok(Role::Admin));
        assert_eq!("gestor".parse::<Role>(), Ok(Role::Manager));
        assert_eq!("vendedor".parse::<Role>(), Ok(Role::Seller));
        assert!("owner".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_serde() {
        let json = serde_json::to_string(&Role::Manager).unwrap();
        assert_eq!(json, "\"manager\"");

        let role: Role = serde_json::from_str("\"seller\"").unwrap();
        assert_eq!(role, Role::Seller);
    }
}
