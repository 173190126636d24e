//! # passage_core
//!
//! Core authentication logic for Passage: password credentials, session
//! tokens, identity resolution and the delegated-login flow.

pub mod auth;
pub mod migrate;
pub mod models;
pub mod uuid;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
