/// Role-based authorization
///
/// Checks are pure functions over a [`Session`]; the session already holds the
/// freshly loaded role, so no database round trip is needed here.
///
/// # Example
///
/// ```no_run
/// use tasktrack_shared::auth::authorization::require_user_management;
/// use tasktrack_shared::auth::session::Session;
///
/// # fn example(session: &Session) -> Result<(), Box<dyn std::error::Error>> {
/// require_user_management(session)?;
/// // ... approve a pending user
/// # Ok(())
/// # }
/// ```

use super::session::Session;
use crate::models::profile::Role;

/// Authentication and authorization failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    #[error("Authentication required")]
    NotAuthenticated,

    #[error("Registration is awaiting approval")]
    PendingApproval,

    #[error("Session terminated: profile is not approved")]
    SessionTerminated,

    #[error("No profile exists for this account")]
    NoProfile,

    #[error("Insufficient permissions: requires {required}, has {actual}")]
    InsufficientRole { required: Role, actual: Role },

    #[error("Not authorized to access this resource")]
    NotAuthorized,
}

/// Requires the session's role to be at least `required`
pub fn require_role(session: &Session, required: Role) -> Result<(), AuthzError> {
    if !session.role.has_permission(&required) {
        return Err(AuthzError::InsufficientRole {
            required,
            actual: session.role,
        });
    }

    Ok(())
}

/// Admins and managers may approve, reject and re-role users
pub fn require_user_management(session: &Session) -> Result<(), AuthzError> {
    require_role(session, Role::Manager)
}

/// Admins and managers may create tasks
pub fn require_task_creation(session: &Session) -> Result<(), AuthzError> {
    if !session.role.can_create_tasks() {
        return Err(AuthzError::InsufficientRole {
            required: Role::Manager,
            actual: session.role,
        });
    }

    Ok(())
}
