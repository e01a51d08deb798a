use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use axum_extra::extract::cookie::{Cookie, Key, PrivateCookieJar, SameSite};
use headers::{Authorization, authorization::Bearer};
use tracing::debug;

use crate::error::LedgerError;
use crate::router::LedgerState;

pub const SESSION_COOKIE: &str = "milk_session";
const SESSION_VALUE: &str = "v1";

/// Whether the encrypted session cookie is present and intact.
pub fn has_session(jar: &PrivateCookieJar<Key>) -> bool {
    jar.get(SESSION_COOKIE)
        .is_some_and(|c| c.value() == SESSION_VALUE)
}

/// The persisted logged-in flag.
pub fn session_cookie(state: &LedgerState) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, SESSION_VALUE))
        .path("/")
        .http_only(true)
        .secure(!state.insecure_cookie)
        .same_site(SameSite::Lax)
        .max_age(state.session_ttl)
        .build()
}

pub fn clear_session(jar: PrivateCookieJar<Key>) -> PrivateCookieJar<Key> {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}

/// Guard for data routes.
/// Accepts either:
/// - the session cookie set by `POST /api/login`
/// - header: `Authorization: Bearer <pin>`
#[derive(Debug, Clone, Copy)]
pub struct RequireSession;

impl FromRequestParts<LedgerState> for RequireSession {
    type Rejection = LedgerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &LedgerState,
    ) -> Result<Self, Self::Rejection> {
        let Ok(jar) = PrivateCookieJar::<Key>::from_request_parts(parts, state).await;
        if has_session(&jar) {
            return Ok(Self);
        }

        let bearer = TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
            .await
            .ok();
        let Some(TypedHeader(Authorization(bearer))) = bearer else {
            debug!(path = %parts.uri.path(), "request without session");
            return Err(LedgerError::Unauthorized);
        };

        if state.check_pin(bearer.token()).await? {
            return Ok(Self);
        }
        Err(LedgerError::Unauthorized)
    }
}
