//! Session cookies.
//!
//! The identity provider's tokens live in HttpOnly cookies; the PKCE verifier
//! rides along in its own cookie between the sign-in request and the callback.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use ideavote_core::Session;

/// Cookie holding the provider access token.
pub const ACCESS_TOKEN_COOKIE: &str = "ideavote-access-token";
/// Cookie holding the provider refresh token.
pub const REFRESH_TOKEN_COOKIE: &str = "ideavote-refresh-token";
/// Cookie holding the PKCE verifier between sign-in and callback.
pub const CODE_VERIFIER_COOKIE: &str = "ideavote-code-verifier";

/// Build an HttpOnly, `SameSite=Lax` cookie scoped to the whole site.
fn cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

fn removal(name: &'static str) -> Cookie<'static> {
    Cookie::build(name).path("/").build()
}

/// The session carried by the request cookies, if any.
#[must_use]
pub fn from_jar(jar: &CookieJar) -> Option<Session> {
    let access_token = jar
        .get(ACCESS_TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())?;

    Some(Session {
        access_token,
        refresh_token: jar.get(REFRESH_TOKEN_COOKIE).map(|c| c.value().to_string()),
    })
}

/// Store a freshly issued session.
#[must_use]
pub fn store(jar: CookieJar, session: Session, secure: bool) -> CookieJar {
    let jar = jar.add(cookie(ACCESS_TOKEN_COOKIE, session.access_token, secure));
    match session.refresh_token {
        Some(refresh_token) => jar.add(cookie(REFRESH_TOKEN_COOKIE, refresh_token, secure)),
        None => jar.remove(removal(REFRESH_TOKEN_COOKIE)),
    }
}

/// Drop the session cookies.
#[must_use]
pub fn clear(jar: CookieJar) -> CookieJar {
    jar.remove(removal(ACCESS_TOKEN_COOKIE))
        .remove(removal(REFRESH_TOKEN_COOKIE))
}

/// Remember the PKCE verifier until the callback.
#[must_use]
pub fn store_verifier(jar: CookieJar, verifier: String, secure: bool) -> CookieJar {
    jar.add(cookie(CODE_VERIFIER_COOKIE, verifier, secure))
}

/// Take the PKCE verifier, removing it from the jar.
#[must_use]
pub fn take_verifier(jar: CookieJar) -> (CookieJar, Option<String>) {
    let verifier = jar
        .get(CODE_VERIFIER_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty());
    (jar.remove(removal(CODE_VERIFIER_COOKIE)), verifier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_and_read_session() {
        let session = Session {
            access_token: "access".to_string(),
            refresh_token: Some("refresh".to_string()),
        };
        let jar = store(CookieJar::new(), session.clone(), true);

        assert_eq!(from_jar(&jar), Some(session));
        let cookie = jar.get(ACCESS_TOKEN_COOKIE);
        assert!(cookie.is_some_and(|c| c.http_only() == Some(true) && c.secure() == Some(true)));
    }

    #[test]
    fn test_clear_removes_session() {
        let session = Session {
            access_token: "access".to_string(),
            refresh_token: None,
        };
        let jar = clear(store(CookieJar::new(), session, false));
        assert_eq!(from_jar(&jar), None);
    }

    #[test]
    fn test_take_verifier() {
        let jar = store_verifier(CookieJar::new(), "verifier".to_string(), false);
        let (jar, verifier) = take_verifier(jar);
        assert_eq!(verifier.as_deref(), Some("verifier"));
        assert!(jar.get(CODE_VERIFIER_COOKIE).is_none());
    }
}
