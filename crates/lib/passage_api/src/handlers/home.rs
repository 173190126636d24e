//! Home page.

/// `GET /`: plain-text welcome.
pub async fn home_handler() -> &'static str {
    "Welcome to homepage"
}
