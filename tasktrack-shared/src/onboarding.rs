/// Registration, approval and session resolution
///
/// # State Machine
///
/// ```text
/// unauthenticated ──register──> pending ──approve──> approved (seller) ──update_role──> ...
///        │                         └──reject──> no profile (may register again)
///        └──register into an empty company──> approved (admin)
/// ```
///
/// Every transition that touches more than one row is a single store call
/// (`register_applicant`, `approve_pending`), so a failure never leaves an
/// account both pending and approved.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::authorization::{require_user_management, AuthzError};
use crate::auth::password::{hash_password, validate_password_strength, verify_password, PasswordError};
use crate::auth::session::Session;
use crate::models::account::{Account, CreateAccount};
use crate::models::pending_user::PendingUser;
use crate::models::profile::{Profile, Role};
use crate::store::{RegistrationOutcome, StoreError, UserStore};

/// Onboarding errors
#[derive(Debug, thiserror::Error)]
pub enum OnboardingError {
    #[error(transparent)]
    Unauthorized(#[from] AuthzError),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Not found")]
    NotFound,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid input: {0}")]
    Invalid(String),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for OnboardingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => OnboardingError::NotFound,
            StoreError::Conflict(msg) => OnboardingError::Conflict(msg),
            other => OnboardingError::Store(other),
        }
    }
}

/// Where an account stands
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AccessState {
    /// Approved profile; may act
    Approved(Profile),

    /// Registered and waiting for an admin or manager
    AwaitingApproval(PendingUser),

    /// Profile exists but approval was withdrawn
    Unapproved(Profile),

    /// Neither profile nor pending row (rejected, or registration interrupted)
    NoProfile,
}

/// Registration request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub name: String,
    pub company: String,
}

/// Registers an account into a company
///
/// The first account of a company becomes its approved admin; later ones wait
/// for approval. An existing account with neither a profile nor a pending row
/// (for example after a rejection) may register again with its password.
///
/// # Errors
///
/// - `Invalid` for a blank name or company, or a weak password
/// - `Conflict` if the email belongs to another password, or the account is
///   already pending or approved
pub async fn register<S>(
    store: &S,
    registration: Registration,
) -> Result<(Account, RegistrationOutcome), OnboardingError>
where
    S: UserStore + ?Sized,
{
    let name = registration.name.trim();
    let company_name = registration.company.trim();
    if name.is_empty() {
        return Err(OnboardingError::Invalid("name must not be empty".to_string()));
    }
    if company_name.is_empty() {
        return Err(OnboardingError::Invalid("company must not be empty".to_string()));
    }
    validate_password_strength(&registration.password).map_err(OnboardingError::Invalid)?;

    let account = match store.find_account_by_email(&registration.email).await? {
        Some(existing) => {
            if !verify_password(&registration.password, &existing.password_hash)? {
                return Err(OnboardingError::Conflict(
                    "email is already registered".to_string(),
                ));
            }
            existing
        }
        None => {
            store
                .create_account(CreateAccount {
                    email: registration.email.clone(),
                    password_hash: hash_password(&registration.password)?,
                    name: name.to_string(),
                })
                .await?
        }
    };

    let company = store.find_or_create_company(company_name).await?;
    let outcome = store.register_applicant(company.id, &account).await?;

    match &outcome {
        RegistrationOutcome::Bootstrapped(_) => {
            info!(user_id = %account.id, company_id = %company.id, "Company bootstrapped with admin")
        }
        RegistrationOutcome::Pending(_) => {
            info!(user_id = %account.id, company_id = %company.id, "Registration awaiting approval")
        }
    }

    Ok((account, outcome))
}

/// Verifies credentials and opens a session
///
/// Wrong email and wrong password produce the same error. Valid credentials
/// still fail when the account has no usable profile (see [`open_session`]).
pub async fn authenticate<S>(
    store: &S,
    email: &str,
    password: &str,
) -> Result<Session, OnboardingError>
where
    S: UserStore + ?Sized,
{
    let account = store
        .find_account_by_email(email)
        .await?
        .ok_or(OnboardingError::InvalidCredentials)?;

    if !verify_password(password, &account.password_hash)? {
        warn!(user_id = %account.id, "Login failed: wrong password");
        return Err(OnboardingError::InvalidCredentials);
    }

    let session = open_session(store, account.id).await?;
    store.touch_last_login(account.id).await?;

    Ok(session)
}

/// Looks up where an account stands
pub async fn resolve<S>(store: &S, user_id: Uuid) -> Result<AccessState, OnboardingError>
where
    S: UserStore + ?Sized,
{
    if let Some(profile) = store.find_profile(user_id).await? {
        return Ok(if profile.approved {
            AccessState::Approved(profile)
        } else {
            AccessState::Unapproved(profile)
        });
    }

    Ok(match store.find_pending(user_id).await? {
        Some(pending) => AccessState::AwaitingApproval(pending),
        None => AccessState::NoProfile,
    })
}

/// Resolves an account into a session or the reason it has none
pub async fn open_session<S>(store: &S, user_id: Uuid) -> Result<Session, OnboardingError>
where
    S: UserStore + ?Sized,
{
    match resolve(store, user_id).await? {
        AccessState::Approved(profile) => {
            Session::from_profile(&profile).ok_or(AuthzError::SessionTerminated.into())
        }
        AccessState::AwaitingApproval(_) => Err(AuthzError::PendingApproval.into()),
        AccessState::Unapproved(_) => {
            warn!(%user_id, "Session terminated for unapproved profile");
            Err(AuthzError::SessionTerminated.into())
        }
        AccessState::NoProfile => Err(AuthzError::NoProfile.into()),
    }
}

/// Profiles of the session's company (admin/manager)
pub async fn list_members<S>(store: &S, session: &Session) -> Result<Vec<Profile>, OnboardingError>
where
    S: UserStore + ?Sized,
{
    require_user_management(session)?;
    Ok(store.list_profiles(session.company_id).await?)
}

/// Pending registrations of the session's company (admin/manager)
pub async fn list_pending<S>(
    store: &S,
    session: &Session,
) -> Result<Vec<PendingUser>, OnboardingError>
where
    S: UserStore + ?Sized,
{
    require_user_management(session)?;
    Ok(store.list_pending_users(session.company_id).await?)
}

/// Promotes a pending registration to an approved seller
///
/// Happens at most once; a repeated call is `NotFound`.
pub async fn approve<S>(
    store: &S,
    session: &Session,
    pending_id: Uuid,
) -> Result<Profile, OnboardingError>
where
    S: UserStore + ?Sized,
{
    require_user_management(session)?;

    let profile = store.approve_pending(session.company_id, pending_id).await?;
    info!(user_id = %profile.id, approved_by = %session.user_id, "User approved");

    Ok(profile)
}

/// Deletes a pending registration
pub async fn reject<S>(
    store: &S,
    session: &Session,
    pending_id: Uuid,
) -> Result<PendingUser, OnboardingError>
where
    S: UserStore + ?Sized,
{
    require_user_management(session)?;

    let pending = store.reject_pending(session.company_id, pending_id).await?;
    info!(user_id = %pending.id, rejected_by = %session.user_id, "User rejected");

    Ok(pending)
}

/// Changes a member's role
///
/// Nobody changes their own role. Granting the admin role or changing an
/// admin's role requires an admin.
pub async fn update_role<S>(
    store: &S,
    session: &Session,
    user_id: Uuid,
    role: Role,
) -> Result<Profile, OnboardingError>
where
    S: UserStore + ?Sized,
{
    require_user_management(session)?;

    if user_id == session.user_id {
        return Err(AuthzError::NotAuthorized.into());
    }

    let target = store
        .find_profile(user_id)
        .await?
        .filter(|p| p.company_id == session.company_id)
        .ok_or(OnboardingError::NotFound)?;

    if (role == Role::Admin || target.role == Role::Admin) && !session.role.can_manage_admins() {
        return Err(AuthzError::InsufficientRole {
            required: Role::Admin,
            actual: session.role,
        }
        .into());
    }

    let profile = store.update_role(session.company_id, user_id, role).await?;
    info!(%user_id, role = role.as_str(), changed_by = %session.user_id, "Role changed");

    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    fn registration(email: &str, company: &str) -> Registration {
        Registration {
            email: email.to_string(),
            password: "Senha2025".to_string(),
            name: email.split('@').next().unwrap().to_string(),
            company: company.to_string(),
        }
    }

    async fn admin_session(store: &MemoryStore) -> Session {
        register(store, registration("ana@loja.com", "Loja")).await.unwrap();
        authenticate(store, "ana@loja.com", "Senha2025").await.unwrap()
    }

    async fn pending_id(store: &MemoryStore, email: &str) -> Uuid {
        let (account, outcome) = register(store, registration(email, "Loja")).await.unwrap();
        assert!(matches!(outcome, RegistrationOutcome::Pending(_)));
        account.id
    }

    #[tokio::test]
    async fn test_bootstrap_then_pending() {
        let store = MemoryStore::new();

        let (first, outcome) = register(&store, registration("ana@loja.com", "Loja")).await.unwrap();
        match outcome {
            RegistrationOutcome::Bootstrapped(profile) => {
                assert_eq!(profile.role, Role::Admin);
                assert!(profile.approved);
            }
            other => panic!("expected bootstrap, got {:?}", other),
        }
        assert!(store.find_pending(first.id).await.unwrap().is_none());

        let (second, outcome) = register(&store, registration("bia@loja.com", "Loja")).await.unwrap();
        assert!(matches!(outcome, RegistrationOutcome::Pending(_)));
        assert!(store.find_profile(second.id).await.unwrap().is_none());
        assert_eq!(
            resolve(&store, second.id).await.unwrap(),
            AccessState::AwaitingApproval(store.find_pending(second.id).await.unwrap().unwrap())
        );
    }

    #[tokio::test]
    async fn test_each_company_bootstraps_separately() {
        let store = MemoryStore::new();
        register(&store, registration("ana@loja.com", "Loja")).await.unwrap();

        let (_, outcome) = register(&store, registration("caio@outra.com", "Outra")).await.unwrap();
        assert!(matches!(outcome, RegistrationOutcome::Bootstrapped(_)));
    }

    #[tokio::test]
    async fn test_register_validates_input() {
        let store = MemoryStore::new();

        let mut weak = registration("ana@loja.com", "Loja");
        weak.password = "short".to_string();
        assert!(matches!(register(&store, weak).await, Err(OnboardingError::Invalid(_))));

        let blank = registration("ana@loja.com", "   ");
        assert!(matches!(register(&store, blank).await, Err(OnboardingError::Invalid(_))));
    }

    #[tokio::test]
    async fn test_duplicate_registration_is_conflict() {
        let store = MemoryStore::new();
        register(&store, registration("ana@loja.com", "Loja")).await.unwrap();

        // Same password: the account already has a profile
        let again = register(&store, registration("ana@loja.com", "Loja")).await;
        assert!(matches!(again, Err(OnboardingError::Conflict(_))));

        // Different password: the email is taken
        let mut other = registration("ANA@loja.com", "Loja");
        other.password = "Outra2025".to_string();
        assert!(matches!(register(&store, other).await, Err(OnboardingError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_login_states() {
        let store = MemoryStore::new();
        let admin = admin_session(&store).await;
        assert_eq!(admin.role, Role::Admin);

        let bia = pending_id(&store, "bia@loja.com").await;
        assert!(matches!(
            authenticate(&store, "bia@loja.com", "Senha2025").await,
            Err(OnboardingError::Unauthorized(AuthzError::PendingApproval))
        ));
        assert!(matches!(
            authenticate(&store, "bia@loja.com", "Errada2025").await,
            Err(OnboardingError::InvalidCredentials)
        ));
        assert!(matches!(
            authenticate(&store, "nobody@loja.com", "Senha2025").await,
            Err(OnboardingError::InvalidCredentials)
        ));

        approve(&store, &admin, bia).await.unwrap();
        let session = authenticate(&store, "bia@loja.com", "Senha2025").await.unwrap();
        assert_eq!(session.role, Role::Seller);
        assert_eq!(session.company_id, admin.company_id);
    }

    #[tokio::test]
    async fn test_unapproved_profile_terminates_session() {
        let store = MemoryStore::new();
        let admin = admin_session(&store).await;

        let mut profile = store.find_profile(admin.user_id).await.unwrap().unwrap();
        profile.approved = false;
        store.insert_profile(profile).await;

        assert!(matches!(
            open_session(&store, admin.user_id).await,
            Err(OnboardingError::Unauthorized(AuthzError::SessionTerminated))
        ));
    }

    #[tokio::test]
    async fn test_approve_exactly_once() {
        let store = MemoryStore::new();
        let admin = admin_session(&store).await;
        let bia = pending_id(&store, "bia@loja.com").await;

        let profile = approve(&store, &admin, bia).await.unwrap();
        assert_eq!(profile.role, Role::Seller);
        assert!(profile.approved);
        assert!(list_pending(&store, &admin).await.unwrap().is_empty());

        assert!(matches!(
            approve(&store, &admin, bia).await,
            Err(OnboardingError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_reject_then_register_again() {
        let store = MemoryStore::new();
        let admin = admin_session(&store).await;
        let bia = pending_id(&store, "bia@loja.com").await;

        reject(&store, &admin, bia).await.unwrap();
        assert!(list_pending(&store, &admin).await.unwrap().is_empty());
        assert!(list_members(&store, &admin)
            .await
            .unwrap()
            .iter()
            .all(|p| p.id != bia));
        assert_eq!(resolve(&store, bia).await.unwrap(), AccessState::NoProfile);
        assert!(matches!(
            authenticate(&store, "bia@loja.com", "Senha2025").await,
            Err(OnboardingError::Unauthorized(AuthzError::NoProfile))
        ));

        // The orphaned account can file a new request
        let (account, outcome) = register(&store, registration("bia@loja.com", "Loja")).await.unwrap();
        assert_eq!(account.id, bia);
        assert!(matches!(outcome, RegistrationOutcome::Pending(_)));
    }

    #[tokio::test]
    async fn test_seller_cannot_manage_users() {
        let store = MemoryStore::new();
        let admin = admin_session(&store).await;
        let bia = pending_id(&store, "bia@loja.com").await;
        approve(&store, &admin, bia).await.unwrap();
        let seller = open_session(&store, bia).await.unwrap();
        let caio = pending_id(&store, "caio@loja.com").await;

        assert!(matches!(
            approve(&store, &seller, caio).await,
            Err(OnboardingError::Unauthorized(_))
        ));
        assert!(matches!(
            reject(&store, &seller, caio).await,
            Err(OnboardingError::Unauthorized(_))
        ));
        assert!(store.find_pending(caio).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_role_change_rules() {
        let store = MemoryStore::new();
        let admin = admin_session(&store).await;

        let gil = pending_id(&store, "gil@loja.com").await;
        approve(&store, &admin, gil).await.unwrap();
        let bia = pending_id(&store, "bia@loja.com").await;
        approve(&store, &admin, bia).await.unwrap();

        let promoted = update_role(&store, &admin, gil, Role::Manager).await.unwrap();
        assert_eq!(promoted.role, Role::Manager);
        let manager = open_session(&store, gil).await.unwrap();

        // Managers cannot grant admin or touch admins
        assert!(matches!(
            update_role(&store, &manager, bia, Role::Admin).await,
            Err(OnboardingError::Unauthorized(AuthzError::InsufficientRole { .. }))
        ));
        assert!(matches!(
            update_role(&store, &manager, admin.user_id, Role::Seller).await,
            Err(OnboardingError::Unauthorized(AuthzError::InsufficientRole { .. }))
        ));

        // Nobody changes their own role
        assert!(matches!(
            update_role(&store, &admin, admin.user_id, Role::Seller).await,
            Err(OnboardingError::Unauthorized(AuthzError::NotAuthorized))
        ));

        // Unknown users are not found
        assert!(matches!(
            update_role(&store, &admin, Uuid::new_v4(), Role::Seller).await,
            Err(OnboardingError::NotFound)
        ));

        let changed = update_role(&store, &manager, bia, Role::Manager).await.unwrap();
        assert_eq!(changed.role, Role::Manager);
    }

    #[tokio::test]
    async fn test_company_isolation() {
        let store = MemoryStore::new();
        let admin = admin_session(&store).await;
        register(&store, registration("caio@outra.com", "Outra")).await.unwrap();
        let outsider = pending_id_in(&store, "duda@outra.com", "Outra").await;

        assert!(matches!(
            approve(&store, &admin, outsider).await,
            Err(OnboardingError::NotFound)
        ));
        assert!(list_pending(&store, &admin).await.unwrap().is_empty());
    }

    async fn pending_id_in(store: &MemoryStore, email: &str, company: &str) -> Uuid {
        let (account, _) = register(store, registration(email, company)).await.unwrap();
        account.id
    }
}
