//! Session cookie helpers

use tower_cookies::cookie::time::Duration as CookieDuration;
use tower_cookies::cookie::SameSite;
use tower_cookies::{Cookie, Cookies, Key};

use crate::store::{Session, SessionId, SessionStore, StoreResult};

pub const SESSION_COOKIE: &str = "digithr_session";

/// Session id from the signed cookie. A tampered cookie reads as absent.
pub fn session_id_from_cookies(cookies: &Cookies, key: &Key) -> Option<SessionId> {
    cookies
        .signed(key)
        .get(SESSION_COOKIE)
        .map(|c| SessionId(c.value().to_string()))
        .filter(|id| !id.0.is_empty())
}

/// Helper to get the current live session from cookies
pub fn get_session_from_cookies<S: SessionStore + ?Sized>(
    cookies: &Cookies,
    key: &Key,
    session_store: &S,
) -> StoreResult<Option<Session>> {
    match session_id_from_cookies(cookies, key) {
        Some(id) => session_store.get(&id),
        None => Ok(None),
    }
}

/// Helper to set the signed session cookie
pub fn set_session_cookie(cookies: &Cookies, key: &Key, session: &Session, secure: bool) {
    let max_age = (session.expires_at - session.created_at).num_seconds();
    let cookie = Cookie::build((SESSION_COOKIE, session.id.0.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(CookieDuration::seconds(max_age))
        .build();
    cookies.signed(key).add(cookie);
}

/// Helper to clear the session cookie
pub fn clear_session_cookie(cookies: &Cookies) {
    let cookie = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::ZERO)
        .build();
    cookies.add(cookie);
}
