//! Session cookie

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use cookie::time::OffsetDateTime;

use crate::session::Session;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "session_token";

/// Cookie set on successful login.
pub fn session_cookie(session: &Session, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, session.token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .expires(OffsetDateTime::from(session.expires_at))
        .build()
}

/// Empty cookie with an expiry in the past, overwriting the session cookie.
pub fn cleared_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .expires(OffsetDateTime::UNIX_EPOCH)
        .build()
}

/// Token from the request cookies, if any.
pub fn session_token(jar: &CookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
}
