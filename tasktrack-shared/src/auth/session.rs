/// The resolved identity acting on a request
///
/// A [`Session`] only exists for an approved profile. It is built by
/// `onboarding::open_session`, inserted into request extensions by the API's
/// authentication layer, and passed explicitly into every domain function.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::profile::{Profile, Role};

/// An approved, role-bearing user of one company
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Account / profile ID
    pub user_id: Uuid,

    /// Company every operation is scoped to
    pub company_id: Uuid,

    /// Email address
    pub email: String,

    /// Display name, copied into task records
    pub name: String,

    /// Role at the time the session was resolved
    pub role: Role,
}

impl Session {
    /// Builds a session from a profile
    ///
    /// Returns `None` for profiles that are not approved.
    pub fn from_profile(profile: &Profile) -> Option<Self> {
        if !profile.approved {
            return None;
        }

        Some(Self {
            user_id: profile.id,
            company_id: profile.company_id,
            email: profile.email.clone(),
            name: profile.name.clone(),
            role: profile.role,
        })
    }
}
