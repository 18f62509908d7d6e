/// Authentication endpoints
///
/// - `POST /v1/auth/register` - Register into a company
/// - `POST /v1/auth/login` - Login and get tokens
/// - `POST /v1/auth/refresh` - Exchange a refresh token for an access token
///
/// Registration into an empty company makes the caller its admin and returns
/// tokens right away. Registration into an existing company is accepted but
/// yields no tokens until an admin or manager approves it.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tasktrack_shared::{
    auth::{jwt, password, session::Session},
    models::profile::Role,
    onboarding::{self, Registration},
    store::RegistrationOutcome,
};
use uuid::Uuid;
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    #[validate(length(min = 1, max = 100, message = "Name must be 1 to 100 characters"))]
    pub name: String,

    /// Company to join, created if it does not exist yet
    #[validate(length(min = 1, max = 100, message = "Company must be 1 to 100 characters"))]
    pub company: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,
}

/// Tokens for an approved user
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user_id: Uuid,
    pub company_id: Uuid,
    pub role: Role,

    /// Access token (12h)
    pub access_token: String,

    /// Refresh token (30d)
    pub refresh_token: String,
}

/// Registration accepted, awaiting approval
#[derive(Debug, Serialize, Deserialize)]
pub struct PendingResponse {
    /// Always `pending_approval`
    pub status: String,
    pub user_id: Uuid,
    pub company_id: Uuid,
}

/// Refresh token request
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Refresh token response
#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    /// New access token (12h)
    pub access_token: String,
}

fn issue_tokens(state: &AppState, session: &Session) -> ApiResult<AuthResponse> {
    let access_claims = jwt::Claims::new(session.user_id, session.company_id, jwt::TokenType::Access);
    let refresh_claims =
        jwt::Claims::new(session.user_id, session.company_id, jwt::TokenType::Refresh);

    Ok(AuthResponse {
        user_id: session.user_id,
        company_id: session.company_id,
        role: session.role,
        access_token: jwt::create_token(&access_claims, state.jwt_secret())?,
        refresh_token: jwt::create_token(&refresh_claims, state.jwt_secret())?,
    })
}

/// Register into a company
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/register
/// Content-Type: application/json
///
/// {
///   "email": "ana@loja.com",
///   "password": "Senha2025",
///   "name": "Ana",
///   "company": "Loja Centro"
/// }
/// ```
///
/// # Responses
///
/// - `201 Created` with [`AuthResponse`]: first member, now the company admin
/// - `202 Accepted` with [`PendingResponse`]: awaiting approval
/// - `409 Conflict`: email registered with another password, or already
///   pending/approved
/// - `422 Unprocessable Entity`: validation failed
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<Response> {
    req.validate().map_err(ApiError::from_validation)?;

    password::validate_password_strength(&req.password)
        .map_err(|e| ApiError::invalid_field("password", e))?;

    let (account, outcome) = onboarding::register(
        &*state.store,
        Registration {
            email: req.email,
            password: req.password,
            name: req.name,
            company: req.company,
        },
    )
    .await?;

    match outcome {
        RegistrationOutcome::Bootstrapped(profile) => {
            let session = Session::from_profile(&profile).ok_or_else(|| {
                ApiError::InternalError("bootstrapped profile is not approved".to_string())
            })?;
            let body = issue_tokens(&state, &session)?;
            Ok((StatusCode::CREATED, Json(body)).into_response())
        }
        RegistrationOutcome::Pending(pending) => {
            let body = PendingResponse {
                status: "pending_approval".to_string(),
                user_id: account.id,
                company_id: pending.company_id,
            };
            Ok((StatusCode::ACCEPTED, Json(body)).into_response())
        }
    }
}

/// Login
///
/// # Errors
///
/// - `401 Unauthorized`: wrong email or password, or approval withdrawn
/// - `403 Forbidden`: registration pending (`pending_approval`) or no profile
///   (`no_profile`)
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    req.validate().map_err(ApiError::from_validation)?;

    let session = onboarding::authenticate(&*state.store, &req.email, &req.password).await?;

    Ok(Json(issue_tokens(&state, &session)?))
}

/// Exchange a refresh token for a new access token
///
/// The account's standing is checked again, so a refresh token cannot revive
/// a session whose approval was withdrawn.
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let claims = jwt::validate_refresh_token(&req.refresh_token, state.jwt_secret())?;
    let session = onboarding::open_session(&*state.store, claims.sub).await?;

    let access_claims = jwt::Claims::new(session.user_id, session.company_id, jwt::TokenType::Access);
    let access_token = jwt::create_token(&access_claims, state.jwt_secret())?;

    Ok(Json(RefreshResponse { access_token }))
}
