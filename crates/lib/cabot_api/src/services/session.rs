//! Session cookie service: resolve or issue the signed session id cookie.
//!
//! The cookie has no max-age, so browsers drop it when they close.

use axum_extra::extract::SignedCookieJar;
use axum_extra::extract::cookie::{Cookie, Key, SameSite};
use sha2::{Digest, Sha512};
use uuid::Uuid;

/// Cookie name for the session id.
pub const SESSION_COOKIE: &str = "cabot_session";

/// Derive the 64-byte cookie signing key from a secret of any length.
pub fn cookie_key(secret: &str) -> Key {
    let digest = Sha512::digest(secret.as_bytes());
    Key::from(digest.as_slice())
}

/// Build the http-only session cookie.
pub fn session_cookie(id: Uuid) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE.to_string(), id.to_string()))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/".to_string())
        .build()
}

/// Session id from a verified cookie, if present and well-formed.
pub fn session_id(jar: &SignedCookieJar) -> Option<Uuid> {
    jar.get(SESSION_COOKIE)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
}

/// Return the caller's session id, issuing a new session cookie when the
/// request carries none (or one that fails verification).
pub fn resolve(jar: SignedCookieJar) -> (SignedCookieJar, Uuid) {
    match session_id(&jar) {
        Some(id) => (jar, id),
        None => {
            let id = Uuid::new_v4();
            (jar.add(session_cookie(id)), id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_secrets_still_yield_a_key() {
        let a = cookie_key("x");
        let b = cookie_key("x");
        assert_eq!(a.master(), b.master());
        assert_ne!(cookie_key("y").master(), a.master());
    }

    #[test]
    fn session_cookie_is_http_only_and_not_persistent() {
        let cookie = session_cookie(Uuid::nil());
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert!(cookie.max_age().is_none());
        assert!(cookie.expires().is_none());
    }

    #[test]
    fn resolve_issues_new_session_for_empty_jar() {
        let jar = SignedCookieJar::new(cookie_key("secret"));
        let (jar, id) = resolve(jar);
        assert_eq!(session_id(&jar), Some(id));
    }

    #[test]
    fn resolve_keeps_existing_session() {
        let id = Uuid::new_v4();
        let jar = SignedCookieJar::new(cookie_key("secret")).add(session_cookie(id));
        let (_, resolved) = resolve(jar);
        assert_eq!(resolved, id);
    }
}
