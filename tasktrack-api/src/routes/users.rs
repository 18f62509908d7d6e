/// User and approval endpoints
///
/// `GET /v1/me` is open to every approved user. Everything else requires an
/// admin or manager, and only ever sees the caller's own company.

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;
use tasktrack_shared::{
    auth::session::Session,
    models::{
        pending_user::PendingUser,
        profile::{Profile, Role},
    },
    onboarding,
};
use uuid::Uuid;

/// Role change request
#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    pub role: Role,
}

/// The caller's session
pub async fn me(Extension(session): Extension<Session>) -> Json<Session> {
    Json(session)
}

/// Profiles of the caller's company
pub async fn list_users(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> ApiResult<Json<Vec<Profile>>> {
    Ok(Json(onboarding::list_members(&*state.store, &session).await?))
}

/// Registrations awaiting approval
pub async fn list_pending(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> ApiResult<Json<Vec<PendingUser>>> {
    Ok(Json(onboarding::list_pending(&*state.store, &session).await?))
}

/// Approve a registration as a seller
///
/// A second approval of the same registration is `404`.
pub async fn approve(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Profile>> {
    Ok(Json(onboarding::approve(&*state.store, &session, id).await?))
}

/// Reject a registration
pub async fn reject(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<PendingUser>> {
    Ok(Json(onboarding::reject(&*state.store, &session, id).await?))
}

/// Change a member's role
///
/// # Errors
///
/// - `403 Forbidden`: own role, or a manager touching the admin role
/// - `404 Not Found`: no such member in the caller's company
pub async fn update_role(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<RoleRequest>,
) -> ApiResult<Json<Profile>> {
    Ok(Json(
        onboarding::update_role(&*state.store, &session, user_id, req.role).await?,
    ))
}
