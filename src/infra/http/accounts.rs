//! Sign-in, sign-out, registration and profile editing.

use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tracing::warn;

use crate::{
    application::{
        accounts::{AccountError, ProfileCommand, RegisterCommand},
        error::HttpError,
    },
    domain::{entities::UserRecord, error::FieldErrors},
    presentation::views::{
        LayoutContext, LoginTemplate, LoginView, ProfileEditTemplate, ProfileEditView,
        RegistrationTemplate, RegistrationView, render_template_response,
    },
};

use super::{
    CurrentUser, HttpState, RequireUser, SESSION_COOKIE,
    auth::{LOGIN_PATH, removal_cookie, safe_next, session_cookie},
};

const INVALID_LOGIN: &str = "Please enter a correct username and password. \
     Note that both fields may be case-sensitive.";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct NextQuery {
    next: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct LoginPayload {
    username: String,
    password: String,
    next: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct RegistrationPayload {
    username: String,
    email: String,
    password1: String,
    password2: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct ProfilePayload {
    username: String,
    first_name: String,
    last_name: String,
    email: String,
}

pub(super) async fn login_form(
    State(state): State<HttpState>,
    current: CurrentUser,
    Query(query): Query<NextQuery>,
) -> Response {
    let content = LoginView {
        next: safe_next(query.next.as_deref()).unwrap_or_default().to_string(),
        ..LoginView::default()
    };
    render_login(&state, current.user(), content, StatusCode::OK)
}

pub(super) async fn login(
    State(state): State<HttpState>,
    jar: CookieJar,
    Form(payload): Form<LoginPayload>,
) -> Result<Response, HttpError> {
    match state
        .accounts
        .sign_in(&payload.username, &payload.password)
        .await
    {
        Ok(session) => {
            let target = safe_next(Some(&payload.next))
                .map(str::to_string)
                .unwrap_or_else(|| format!("/profile/{}/", session.user.username));
            let cookie =
                session_cookie(session.token, session.expires_at, state.site.cookie_secure);
            Ok((jar.add(cookie), Redirect::to(&target)).into_response())
        }
        Err(AccountError::InvalidCredentials) => {
            let content = LoginView {
                username: payload.username,
                next: safe_next(Some(&payload.next)).unwrap_or_default().to_string(),
                error: Some(INVALID_LOGIN),
            };
            Ok(render_login(&state, None, content, StatusCode::OK))
        }
        Err(err) => Err(err.into()),
    }
}

/// Revoke the current session and drop the cookie. Accepts GET and POST.
pub(super) async fn logout(State(state): State<HttpState>, jar: CookieJar) -> Response {
    if let Some(cookie) = jar.get(SESSION_COOKIE)
        && let Err(err) = state.accounts.sign_out(cookie.value()).await
    {
        warn!(
            target = "blogicum::http::accounts",
            error = %err,
            "failed to revoke session"
        );
    }
    (jar.remove(removal_cookie()), Redirect::to("/")).into_response()
}

pub(super) async fn registration_form(
    State(state): State<HttpState>,
    current: CurrentUser,
) -> Response {
    render_registration(&state, current.user(), RegistrationView::default())
}

pub(super) async fn register(
    State(state): State<HttpState>,
    current: CurrentUser,
    Form(payload): Form<RegistrationPayload>,
) -> Result<Response, HttpError> {
    let command = RegisterCommand {
        username: payload.username.clone(),
        email: payload.email.clone(),
        password1: payload.password1,
        password2: payload.password2,
    };
    match state.accounts.register(command).await {
        Ok(_) => Ok(Redirect::to(LOGIN_PATH).into_response()),
        Err(AccountError::Invalid(errors)) => {
            let content = RegistrationView {
                username: payload.username,
                email: payload.email,
                errors,
            };
            Ok(render_registration(&state, current.user(), content))
        }
        Err(err) => Err(err.into()),
    }
}

pub(super) async fn profile_edit_form(
    State(state): State<HttpState>,
    RequireUser(user): RequireUser,
) -> Response {
    let content = ProfileEditView {
        username: user.username.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        email: user.email.clone(),
        errors: FieldErrors::new(),
    };
    render_profile_edit(&state, &user, content)
}

pub(super) async fn profile_edit(
    State(state): State<HttpState>,
    RequireUser(user): RequireUser,
    Form(payload): Form<ProfilePayload>,
) -> Result<Response, HttpError> {
    let command = ProfileCommand {
        username: payload.username.clone(),
        first_name: payload.first_name.clone(),
        last_name: payload.last_name.clone(),
        email: payload.email.clone(),
    };
    match state.accounts.update_profile(user.id, command).await {
        Ok(updated) => {
            Ok(Redirect::to(&format!("/profile/{}/", updated.username)).into_response())
        }
        Err(AccountError::Invalid(errors)) => {
            let content = ProfileEditView {
                username: payload.username,
                first_name: payload.first_name,
                last_name: payload.last_name,
                email: payload.email,
                errors,
            };
            Ok(render_profile_edit(&state, &user, content))
        }
        Err(err) => Err(err.into()),
    }
}

fn render_login(
    state: &HttpState,
    viewer: Option<&UserRecord>,
    content: LoginView,
    status: StatusCode,
) -> Response {
    let view = LayoutContext::new(state.site.chrome(viewer), "Log in", content);
    render_template_response(LoginTemplate { view }, status)
}

fn render_registration(
    state: &HttpState,
    viewer: Option<&UserRecord>,
    content: RegistrationView,
) -> Response {
    let view = LayoutContext::new(state.site.chrome(viewer), "Sign up", content);
    render_template_response(RegistrationTemplate { view }, StatusCode::OK)
}

fn render_profile_edit(state: &HttpState, user: &UserRecord, content: ProfileEditView) -> Response {
    let view = LayoutContext::new(state.site.chrome(Some(user)), "Edit profile", content);
    render_template_response(ProfileEditTemplate { view }, StatusCode::OK)
}
