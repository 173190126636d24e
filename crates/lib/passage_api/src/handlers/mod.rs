//! Request handlers.

pub mod auth;
pub mod home;
pub mod oauth;
pub mod users;
