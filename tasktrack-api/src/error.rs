/// Error handling for the API server
///
/// Every handler returns `Result<T, ApiError>`. Domain errors convert into
/// `ApiError` through the `From` impls below, so handlers use `?` directly.
/// Responses share one body shape:
///
/// ```json
/// { "error": "forbidden", "message": "...", "details": [...] }
/// ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use tasktrack_shared::{
    auth::{authorization::AuthzError, jwt::JwtError, password::PasswordError},
    onboarding::OnboardingError,
    report::ReportError,
    store::StoreError,
    tracker::TrackerError,
};

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Unauthorized (401)
    Unauthorized(String),

    /// Approval was withdrawn while a token was still valid (401)
    SessionTerminated,

    /// Forbidden (403)
    Forbidden(String),

    /// Registration not yet approved (403)
    PendingApproval,

    /// Account has neither a profile nor a pending registration (403)
    NoProfile,

    /// Not found (404)
    NotFound(String),

    /// Conflict (409), e.g. duplicate email
    Conflict(String),

    /// Unprocessable entity (422)
    ValidationError(Vec<ValidationErrorDetail>),

    /// Internal server error (500)
    InternalError(String),

    /// Service unavailable (503)
    ServiceUnavailable(String),
}

/// Validation error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "bad_request", "no_profile")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl ApiError {
    /// Builds a 422 from `validator` errors
    pub fn from_validation(errors: validator::ValidationErrors) -> Self {
        let details = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ValidationErrorDetail {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                })
            })
            .collect();

        ApiError::ValidationError(details)
    }

    /// Builds a 422 for a single field
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        ApiError::ValidationError(vec![ValidationErrorDetail {
            field: field.to_string(),
            message: message.into(),
        }])
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::SessionTerminated => write!(f, "Session terminated"),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::PendingApproval => write!(f, "Registration is awaiting approval"),
            ApiError::NoProfile => write!(f, "No profile"),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            ApiError::SessionTerminated => (
                StatusCode::UNAUTHORIZED,
                "session_terminated",
                "Your access has been revoked; sign in again".to_string(),
                None,
            ),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg, None),
            ApiError::PendingApproval => (
                StatusCode::FORBIDDEN,
                "pending_approval",
                "Your registration is awaiting approval by an administrator".to_string(),
                None,
            ),
            ApiError::NoProfile => (
                StatusCode::FORBIDDEN,
                "no_profile",
                "This account has no profile; register into a company to continue".to_string(),
                None,
            ),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),
            ApiError::ValidationError(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::InternalError(msg) => {
                // Logged here, never exposed to clients
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
            ApiError::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                msg,
                None,
            ),
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ApiError::NotFound("Resource not found".to_string()),
            StoreError::Conflict(msg) => ApiError::Conflict(msg),
            StoreError::Database(err) => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::NotAuthenticated => {
                ApiError::Unauthorized("Authentication required".to_string())
            }
            AuthzError::PendingApproval => ApiError::PendingApproval,
            AuthzError::SessionTerminated => ApiError::SessionTerminated,
            AuthzError::NoProfile => ApiError::NoProfile,
            AuthzError::InsufficientRole { required, .. } => {
                ApiError::Forbidden(format!("Requires the {} role", required))
            }
            AuthzError::NotAuthorized => {
                ApiError::Forbidden("Not authorized to access this resource".to_string())
            }
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::CreateError(msg) => {
                ApiError::InternalError(format!("Token creation failed: {}", msg))
            }
            JwtError::Expired => ApiError::Unauthorized("Token expired".to_string()),
            JwtError::InvalidIssuer => {
                ApiError::Unauthorized("Invalid token issuer".to_string())
            }
            _ => ApiError::Unauthorized(format!("Invalid token: {}", err)),
        }
    }
}

impl From<TrackerError> for ApiError {
    fn from(err: TrackerError) -> Self {
        match err {
            TrackerError::Unauthorized(err) => err.into(),
            TrackerError::TaskNotFound => ApiError::NotFound("Task not found".to_string()),
            TrackerError::Invalid(msg) => ApiError::BadRequest(msg),
            TrackerError::Store(err) => err.into(),
        }
    }
}

impl From<OnboardingError> for ApiError {
    fn from(err: OnboardingError) -> Self {
        match err {
            OnboardingError::Unauthorized(err) => err.into(),
            OnboardingError::InvalidCredentials => {
                ApiError::Unauthorized("Invalid email or password".to_string())
            }
            OnboardingError::NotFound => ApiError::NotFound("User not found".to_string()),
            OnboardingError::Conflict(msg) => ApiError::Conflict(msg),
            OnboardingError::Invalid(msg) => ApiError::BadRequest(msg),
            OnboardingError::Password(err) => err.into(),
            OnboardingError::Store(err) => err.into(),
        }
    }
}

impl From<ReportError> for ApiError {
    fn from(err: ReportError) -> Self {
        match err {
            ReportError::InvalidRange(msg) => ApiError::BadRequest(msg),
            ReportError::UnknownMember => ApiError::NotFound("User not found".to_string()),
            ReportError::Store(err) => err.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tasktrack_shared::models::profile::Role;

    fn status_of(err: impl Into<ApiError>) -> StatusCode {
        err.into().into_response().status()
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::NotFound("Task not found".to_string());
        assert_eq!(err.to_string(), "Not found: Task not found");
    }

    #[test]
    fn test_validation_error() {
        let errors = vec![
            ValidationErrorDetail {
                field: "email".to_string(),
                message: "Invalid email format".to_string(),
            },
            ValidationErrorDetail {
                field: "password".to_string(),
                message: "Password too short".to_string(),
            },
        ];

        let err = ApiError::ValidationError(errors);
        assert_eq!(err.to_string(), "Validation failed: 2 errors");
    }

    #[test]
    fn test_authz_status_codes() {
        assert_eq!(status_of(AuthzError::NotAuthenticated), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(AuthzError::SessionTerminated), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(AuthzError::PendingApproval), StatusCode::FORBIDDEN);
        assert_eq!(status_of(AuthzError::NoProfile), StatusCode::FORBIDDEN);
        assert_eq!(status_of(AuthzError::NotAuthorized), StatusCode::FORBIDDEN);
        assert_eq!(
            status_of(AuthzError::InsufficientRole {
                required: Role::Manager,
                actual: Role::Seller,
            }),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_store_failure_is_internal() {
        assert_eq!(
            status_of(StoreError::Database(sqlx::Error::PoolTimedOut)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(status_of(StoreError::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(StoreError::Conflict("email already exists".to_string())),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_domain_errors() {
        assert_eq!(status_of(TrackerError::TaskNotFound), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(OnboardingError::InvalidCredentials),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(ReportError::InvalidRange("bad".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_of(ReportError::UnknownMember), StatusCode::NOT_FOUND);
        assert_eq!(status_of(JwtError::Expired), StatusCode::UNAUTHORIZED);
    }
}
