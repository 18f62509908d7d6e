/// API route handlers, organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Registration, login, token refresh
/// - `tasks`: Day boards, task creation, status updates
/// - `users`: Current user, members, approvals, roles
/// - `reports`: Completion reports

pub mod auth;
pub mod health;
pub mod reports;
pub mod tasks;
pub mod users;
