/// Task visibility rules
///
/// Which tasks of a day a user may see depends only on their role:
///
/// | Role    | Scope                                                   |
/// |---------|---------------------------------------------------------|
/// | admin   | every task of the company                               |
/// | manager | tasks they created or for which they are the manager    |
/// | seller  | tasks assigned to them                                  |
///
/// The scope is a closed enum so each store translates it into one query
/// (`PgStore` into SQL, `MemoryStore` through [`TaskVisibility::matches`]).
/// Date and company are applied by the store on top of the scope.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::session::Session;
use crate::models::profile::Role;
use crate::models::task::Task;

/// Role-derived task filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum TaskVisibility {
    /// Admin: no per-user restriction
    All,

    /// Manager: `created_by == user_id || manager_id == user_id`
    Team { user_id: Uuid },

    /// Seller: `assigned_to == user_id`
    Own { user_id: Uuid },
}

impl TaskVisibility {
    /// Scope for a role acting as `user_id`
    pub fn for_role(role: Role, user_id: Uuid) -> Self {
        match role {
            Role::Admin => TaskVisibility::All,
            Role::Manager => TaskVisibility::Team { user_id },
            Role::Seller => TaskVisibility::Own { user_id },
        }
    }

    /// Scope for the session's role and user
    pub fn for_session(session: &Session) -> Self {
        Self::for_role(session.role, session.user_id)
    }

    /// The user the scope is restricted to, if any
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            TaskVisibility::All => None,
            TaskVisibility::Team { user_id } | TaskVisibility::Own { user_id } => Some(*user_id),
        }
    }

    /// Evaluates the scope against a task
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            TaskVisibility::All => true,
            TaskVisibility::Team { user_id } => {
                task.created_by == *user_id || task.manager_id == Some(*user_id)
            }
            TaskVisibility::Own { user_id } => task.assigned_to == Some(*user_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task::TaskStatus;
    use chrono::{NaiveDate, Utc};

    fn task(created_by: Uuid, assigned_to: Option<Uuid>, manager_id: Option<Uuid>) -> Task {
        Task {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            title: "Count stock".to_string(),
            description: String::new(),
            deadline: None,
            status: TaskStatus::Pending,
            date: NaiveDate::from_ymd_opt(2025, 4, 10).unwrap(),
            created_by,
            assigned_to,
            manager_id,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_for_role() {
        let user = Uuid::new_v4();

        assert_eq!(TaskVisibility::for_role(Role::Admin, user), TaskVisibility::All);
        assert_eq!(
            TaskVisibility::for_role(Role::Manager, user),
            TaskVisibility::Team { user_id: user }
        );
        assert_eq!(
            TaskVisibility::for_role(Role::Seller, user),
            TaskVisibility::Own { user_id: user }
        );
    }

    #[test]
    fn test_manager_sees_created_and_managed_tasks() {
        let manager = Uuid::new_v4();
        let other = Uuid::new_v4();
        let scope = TaskVisibility::Team { user_id: manager };

        assert!(scope.matches(&task(manager, None, None)));
        assert!(scope.matches(&task(other, None, Some(manager))));
        assert!(!scope.matches(&task(other, Some(manager), Some(other))));
    }

    #[test]
    fn test_seller_sees_only_assigned_tasks() {
        let seller = Uuid::new_v4();
        let scope = TaskVisibility::Own { user_id: seller };

        assert!(scope.matches(&task(Uuid::new_v4(), Some(seller), None)));
        assert!(!scope.matches(&task(seller, None, Some(seller))));
        assert!(!scope.matches(&task(Uuid::new_v4(), Some(Uuid::new_v4()), None)));
    }

    #[test]
    fn test_visibility_is_monotonic() {
        let user = Uuid::new_v4();
        let other = Uuid::new_v4();
        let tasks = vec![
            task(user, None, None),
            task(other, Some(user), None),
            task(other, None, Some(user)),
            task(other, Some(user), Some(user)),
            task(other, Some(other), None),
        ];

        let admin = TaskVisibility::for_role(Role::Admin, user);
        let manager = TaskVisibility::for_role(Role::Manager, user);
        let seller = TaskVisibility::for_role(Role::Seller, user);

        for t in &tasks {
            if manager.matches(t) || seller.matches(t) {
                assert!(admin.matches(t));
            }
        }

        // Assigned to the seller and managed by the manager
        let team_task = task(other, Some(user), Some(user));
        assert!(seller.matches(&team_task));
        assert!(manager.matches(&team_task));
        assert!(admin.matches(&team_task));
    }
}
