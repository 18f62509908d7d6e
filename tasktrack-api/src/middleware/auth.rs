/// Bearer-token authentication
///
/// Validates the access token, then resolves the account's current standing
/// from the store on every request. A token outliving an approval therefore
/// stops working as soon as the profile is unapproved or removed.
///
/// On success the resolved [`Session`] is inserted into request extensions;
/// handlers take it with `Extension<Session>`.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use tasktrack_shared::{auth::jwt, auth::session::Session, onboarding};
use tracing::debug;

use crate::{app::AppState, error::ApiError};

pub async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(&req)?;
    let claims = jwt::validate_access_token(token, state.jwt_secret())?;

    let session: Session = onboarding::open_session(&*state.store, claims.sub).await?;
    debug!(user_id = %session.user_id, role = session.role.as_str(), "Request authenticated");

    req.extensions_mut().insert(session);

    Ok(next.run(req).await)
}

fn bearer_token(req: &Request) -> Result<&str, ApiError> {
    let value = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;

    value
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::BadRequest("Expected Bearer token".to_string()))
}
