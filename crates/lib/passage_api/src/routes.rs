//! Route paths.

pub const GET_HOME: &str = "/";
pub const POST_SIGNUP: &str = "/signup";
pub const POST_LOGIN: &str = "/login";
pub const GET_ME: &str = "/me";
pub const GET_USERS: &str = "/users";
pub const GET_GOOGLE_LOGIN: &str = "/auth/google/login";
/// Provider callback; accepts `GET` (query) and `POST` (form).
pub const GOOGLE_CALLBACK: &str = "/auth/google/callback";
