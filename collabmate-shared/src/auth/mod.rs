//! Authentication primitives
//!
//! - `jwt`: token claims, creation, and validation (including the stored
//!   `tokenVersion` staleness check)
//! - `password`: Argon2id hashing and the password strength rule
//! - `middleware`: the authenticated-request context injected by the HTTP
//!   layer

pub mod jwt;
pub mod middleware;
pub mod password;
