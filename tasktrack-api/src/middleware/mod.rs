/// Middleware for the API server
///
/// - `security`: security response headers
/// - `auth`: bearer-token authentication resolving the request's `Session`

pub mod auth;
pub mod security;
