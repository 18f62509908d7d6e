//! # TaskTrack API Server Library
//!
//! HTTP surface over `tasktrack-shared`: daily task boards, per-user status
//! records, registration with admin approval, and completion reports.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Authentication and security headers
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
