mod accounts;
mod admin;
mod auth;
mod comments;
mod middleware;
mod posts;
mod public;

pub use admin::{AdminState, build_admin_router};
pub use auth::{CurrentUser, RequireUser, SESSION_COOKIE};
pub use public::{HttpState, build_router};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono_tz::Tz;

use crate::application::error::{ErrorReport, HttpError};
use crate::application::repos::RepoError;
use crate::domain::entities::UserRecord;
use crate::presentation::views::LayoutChrome;

/// Site-wide settings shared by both listeners.
#[derive(Debug, Clone)]
pub struct SiteContext {
    pub title: String,
    pub timezone: Tz,
    pub cookie_secure: bool,
}

impl SiteContext {
    pub fn chrome(&self, viewer: Option<&UserRecord>) -> LayoutChrome {
        LayoutChrome::new(self.title.clone(), viewer)
    }
}

fn db_health_response(result: Result<(), RepoError>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}

/// Numeric ids in paths; anything else is a missing page.
fn parse_id(source: &'static str, raw: &str) -> Result<i64, HttpError> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| HttpError::not_found(source, format!("`{raw}` is not an id")))
}
