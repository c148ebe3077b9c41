//! API route handlers
//!
//! Handlers stay thin: request DTOs are validated here, then the work is
//! delegated to the shared model operations, and the result is wrapped in
//! the response shape the frontend expects.

pub mod auth;
pub mod dashboard;
pub mod gitlab;
pub mod health;
pub mod search;
pub mod tasks;
pub mod teams;
pub mod users;
