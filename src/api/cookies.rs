//! Cookie names and builders for sessions, CSRF and the OAuth round trip.

use axum_extra::extract::cookie::{Cookie, SameSite};

use crate::state::HttpSettings;

/// Holds the raw session token.
pub const SESSION_COOKIE: &str = "sid";
/// Readable by the SPA, echoed back in [`CSRF_HEADER`].
pub const CSRF_COOKIE: &str = "csrf_token";
pub const CSRF_HEADER: &str = "x-csrf-token";
pub const OAUTH_STATE_COOKIE: &str = "oauth_state";

const OAUTH_STATE_MAX_AGE_SECS: i64 = 600;

pub fn session_cookie(token: String, settings: &HttpSettings) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(settings.cookie_secure)
        .max_age(time::Duration::seconds(settings.session_ttl.num_seconds()))
        .build()
}

pub fn csrf_cookie(token: String, settings: &HttpSettings) -> Cookie<'static> {
    Cookie::build((CSRF_COOKIE, token))
        .path("/")
        .same_site(SameSite::Lax)
        .secure(settings.cookie_secure)
        .build()
}

pub fn oauth_state_cookie(state: String, settings: &HttpSettings) -> Cookie<'static> {
    Cookie::build((OAUTH_STATE_COOKIE, state))
        .path("/api/auth/google")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(settings.cookie_secure)
        .max_age(time::Duration::seconds(OAUTH_STATE_MAX_AGE_SECS))
        .build()
}

/// A removal cookie matching the path the named cookie was set with.
pub fn removal(name: &'static str) -> Cookie<'static> {
    let path = if name == OAUTH_STATE_COOKIE {
        "/api/auth/google"
    } else {
        "/"
    };
    Cookie::build(name).path(path).build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_attributes() {
        let settings = HttpSettings {
            cookie_secure: true,
            ..Default::default()
        };
        let cookie = session_cookie("tok".to_string(), &settings);

        assert_eq!(cookie.name(), "sid");
        assert_eq!(cookie.value(), "tok");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.max_age(), Some(time::Duration::hours(168)));
    }

    #[test]
    fn test_csrf_cookie_is_script_readable() {
        let cookie = csrf_cookie("n.s".to_string(), &HttpSettings::default());
        assert_ne!(cookie.http_only(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
    }
}
