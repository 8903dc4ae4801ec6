//! Session cookie handling and the user extractors built on it.

use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{Uri, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::OffsetDateTime;
use tracing::debug;

use crate::application::accounts::SessionError;
use crate::domain::entities::UserRecord;
use crate::domain::visibility::Viewer;

use super::HttpState;

pub const SESSION_COOKIE: &str = "blogicum_session";
pub(super) const LOGIN_PATH: &str = "/auth/login/";

/// The signed-in user, if the request carries a valid session.
#[derive(Debug, Clone, Default)]
pub struct CurrentUser(pub Option<UserRecord>);

impl CurrentUser {
    pub fn user(&self) -> Option<&UserRecord> {
        self.0.as_ref()
    }

    pub fn viewer(&self) -> Viewer {
        match &self.0 {
            Some(user) => Viewer::User(user.id),
            None => Viewer::Anonymous,
        }
    }
}

impl FromRequestParts<HttpState> for CurrentUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &HttpState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let Some(cookie) = jar.get(SESSION_COOKIE) else {
            return Ok(CurrentUser(None));
        };

        match state.accounts.authenticate(cookie.value()).await {
            Ok(user) => Ok(CurrentUser(Some(user))),
            Err(err) => {
                let reason = match err {
                    SessionError::Invalid => "invalid",
                    SessionError::Expired => "expired",
                    SessionError::Unavailable => "unavailable",
                };
                debug!(
                    target = "blogicum::http::auth",
                    reason,
                    "session cookie ignored"
                );
                Ok(CurrentUser(None))
            }
        }
    }
}

/// A signed-in user; anonymous requests are sent to the login page.
#[derive(Debug, Clone)]
pub struct RequireUser(pub UserRecord);

impl FromRequestParts<HttpState> for RequireUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &HttpState,
    ) -> Result<Self, Self::Rejection> {
        let Ok(CurrentUser(user)) = CurrentUser::from_request_parts(parts, state).await;
        match user {
            Some(user) => Ok(RequireUser(user)),
            None => Err(login_redirect(&parts.uri).into_response()),
        }
    }
}

pub(super) fn login_redirect(uri: &Uri) -> Redirect {
    let next = uri
        .path_and_query()
        .map(|value| value.as_str())
        .unwrap_or("/");
    let encoded: String = url::form_urlencoded::byte_serialize(next.as_bytes()).collect();
    Redirect::to(&format!("{LOGIN_PATH}?next={encoded}"))
}

/// Only same-site absolute paths are accepted as a post-login target.
pub(super) fn safe_next(next: Option<&str>) -> Option<&str> {
    let next = next?.trim();
    let local = next.starts_with('/') && !next.starts_with("//") && !next.contains('\\');
    local.then_some(next)
}

pub(super) fn session_cookie(
    token: String,
    expires_at: OffsetDateTime,
    secure: bool,
) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .expires(expires_at)
        .build()
}

pub(super) fn removal_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, "")).path("/").build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{StatusCode, header::LOCATION};

    #[test]
    fn login_redirect_keeps_path_and_query() {
        let uri: Uri = "/posts/3/edit/?x=1".parse().expect("uri");
        let response = login_redirect(&uri).into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(LOCATION).and_then(|v| v.to_str().ok()),
            Some("/auth/login/?next=%2Fposts%2F3%2Fedit%2F%3Fx%3D1")
        );
    }

    #[test]
    fn only_local_paths_are_safe() {
        assert_eq!(safe_next(Some("/posts/1/")), Some("/posts/1/"));
        assert_eq!(safe_next(Some("//evil.example")), None);
        assert_eq!(safe_next(Some("https://evil.example")), None);
        assert_eq!(safe_next(Some("/\\evil")), None);
        assert_eq!(safe_next(None), None);
    }

    #[test]
    fn session_cookie_is_http_only_and_lax() {
        let cookie = session_cookie("token".into(), OffsetDateTime::now_utc(), true);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
    }
}
