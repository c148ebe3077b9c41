//! # CollabMate Shared Library
//!
//! This crate contains the data models, record store, and business logic
//! shared by the CollabMate API server.
//!
//! ## Module Organization
//!
//! - `models`: User/Team/Task records and their operations (cascading
//!   deletes, membership and succession, task upsert/merge)
//! - `store`: snapshot-based record store over pluggable backends
//! - `auth`: JWT claims and password hashing
//! - `gitlab`: remote issue source and the issue-to-task importer
//! - `error`: common error taxonomy

pub mod auth;
pub mod error;
pub mod gitlab;
pub mod models;
pub mod store;

/// Current version of the CollabMate shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
