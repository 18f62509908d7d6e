//! # TaskTrack Shared Library
//!
//! This crate contains shared types, persistence, and business logic used by
//! the TaskTrack API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models and data structures
//! - `db`: Connection pool and migrations
//! - `auth`: Authentication, sessions and authorization
//! - `store`: Data-store boundary (PostgreSQL and in-memory)
//! - `visibility`: Which tasks a session may see
//! - `tracker`: Daily board reconciliation and status changes
//! - `onboarding`: Registration, approval and role management
//! - `report`: Completion reports over task records

pub mod auth;
pub mod db;
pub mod models;
pub mod onboarding;
pub mod report;
pub mod store;
pub mod tracker;
pub mod visibility;

/// Current version of the TaskTrack shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
