//! Cookie service: set/clear the httpOnly anti-forgery state cookie.

use axum_extra::extract::cookie::{Cookie, SameSite};
use time::{Duration, OffsetDateTime};

/// Cookie name for the delegated-login anti-forgery state.
pub const STATE_COOKIE: &str = "oauthState";

/// Lifetime of a state cookie: 10 minutes.
pub const STATE_COOKIE_TTL: Duration = Duration::minutes(10);

/// Build the site-wide, script-inaccessible state cookie.
pub fn state_cookie(state: &str) -> Cookie<'static> {
    Cookie::build((STATE_COOKIE.to_string(), state.to_string()))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/".to_string())
        .max_age(STATE_COOKIE_TTL)
        .expires(OffsetDateTime::now_utc() + STATE_COOKIE_TTL)
        .build()
}

/// Build an empty, already-expired state cookie to clear it.
pub fn clear_state_cookie() -> Cookie<'static> {
    Cookie::build((STATE_COOKIE.to_string(), String::new()))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/".to_string())
        .max_age(Duration::ZERO)
        .expires(OffsetDateTime::UNIX_EPOCH)
        .build()
}
