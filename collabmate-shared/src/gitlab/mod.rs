//! GitLab issue source and importer
//!
//! The importer consumes a narrow slice of the GitLab REST API (the current
//! user, project names, and project issues) through the [`source::IssueSource`]
//! trait. Production uses the reqwest-backed [`client::GitLabClient`]; tests
//! use [`source::MockIssueSource`].
//!
//! Import itself is a pure mapping (`import::issue_to_task`) followed by the
//! provenance-preserving task upsert.

pub mod client;
pub mod import;
pub mod source;
pub mod types;
