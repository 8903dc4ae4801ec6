use std::error::Error as StdError;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{
    application::{
        accounts::AccountError,
        admin::{AdminTaxonomyError, ModerationError},
        comments::CommentError,
        feed::FeedError,
        posts::PostError,
        repos::RepoError,
    },
    domain::error::DomainError,
    infra::error::InfraError,
    presentation::views::render_error_response,
};

#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = Vec::new();
        messages.push(error.to_string());
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn from_message(
        source: &'static str,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source,
            status,
            messages: vec![message.into()],
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

/// An error page with a diagnostic report for the response logger.
#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    public_message: &'static str,
    report: ErrorReport,
}

impl HttpError {
    pub fn new(
        source: &'static str,
        status: StatusCode,
        public_message: &'static str,
        detail: impl Into<String>,
    ) -> Self {
        let report = ErrorReport::from_message(source, status, detail);
        Self {
            status,
            public_message,
            report,
        }
    }

    pub fn from_error(
        source: &'static str,
        status: StatusCode,
        public_message: &'static str,
        error: &dyn StdError,
    ) -> Self {
        let report = ErrorReport::from_error(source, status, error);
        Self {
            status,
            public_message,
            report,
        }
    }

    pub fn not_found(source: &'static str, detail: impl Into<String>) -> Self {
        Self::new(source, StatusCode::NOT_FOUND, "Page not found", detail)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let mut response = render_error_response(self.status, self.public_message);
        self.report.attach(&mut response);
        response
    }
}

/// Map a repository error to a consistent HTTP error for the public and admin surfaces.
pub fn repo_error_to_http(source: &'static str, err: RepoError) -> HttpError {
    match err {
        RepoError::Duplicate { constraint } => {
            HttpError::new(source, StatusCode::CONFLICT, "Duplicate record", constraint)
        }
        RepoError::NotFound => HttpError::not_found(source, "resource not found"),
        RepoError::InvalidInput { message } => {
            HttpError::new(source, StatusCode::BAD_REQUEST, "Invalid input", message)
        }
        RepoError::Integrity { message } => HttpError::new(
            source,
            StatusCode::CONFLICT,
            "Integrity constraint violated",
            message,
        ),
        RepoError::Timeout => HttpError::new(
            source,
            StatusCode::SERVICE_UNAVAILABLE,
            "Database timeout",
            "Database timeout",
        ),
        RepoError::Persistence(message) => HttpError::new(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error",
            message,
        ),
    }
}

fn invalid_form(source: &'static str, error: &dyn StdError) -> HttpError {
    HttpError::from_error(source, StatusCode::BAD_REQUEST, "Invalid form", error)
}

impl From<FeedError> for HttpError {
    fn from(error: FeedError) -> Self {
        const SOURCE: &str = "application::error::feed";
        match error {
            FeedError::NotFound(entity) => HttpError::not_found(SOURCE, format!("{entity} not found")),
            FeedError::Pagination(err) => HttpError::not_found(SOURCE, err.to_string()),
            FeedError::Repo(err) => repo_error_to_http(SOURCE, err),
        }
    }
}

impl From<PostError> for HttpError {
    fn from(error: PostError) -> Self {
        const SOURCE: &str = "application::error::posts";
        match error {
            PostError::NotFound => HttpError::not_found(SOURCE, "post not found"),
            PostError::Repo(err) => repo_error_to_http(SOURCE, err),
            err @ PostError::Invalid(_) => invalid_form(SOURCE, &err),
            PostError::Storage(err) => HttpError::from_error(
                SOURCE,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
                &err,
            ),
        }
    }
}

impl From<CommentError> for HttpError {
    fn from(error: CommentError) -> Self {
        const SOURCE: &str = "application::error::comments";
        match error {
            CommentError::NotFound => HttpError::not_found(SOURCE, "comment or post not found"),
            CommentError::Repo(err) => repo_error_to_http(SOURCE, err),
            err @ CommentError::Invalid(_) => invalid_form(SOURCE, &err),
        }
    }
}

impl From<AccountError> for HttpError {
    fn from(error: AccountError) -> Self {
        const SOURCE: &str = "application::error::accounts";
        match error {
            AccountError::NotFound => HttpError::not_found(SOURCE, "user not found"),
            AccountError::Repo(err) => repo_error_to_http(SOURCE, err),
            err @ (AccountError::Invalid(_) | AccountError::InvalidCredentials) => {
                invalid_form(SOURCE, &err)
            }
            err @ AccountError::Hashing(_) => HttpError::from_error(
                SOURCE,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
                &err,
            ),
        }
    }
}

impl From<AdminTaxonomyError> for HttpError {
    fn from(error: AdminTaxonomyError) -> Self {
        const SOURCE: &str = "application::error::admin_taxonomy";
        match error {
            AdminTaxonomyError::NotFound => HttpError::not_found(SOURCE, "record not found"),
            AdminTaxonomyError::Repo(err) => repo_error_to_http(SOURCE, err),
            err @ AdminTaxonomyError::Invalid(_) => invalid_form(SOURCE, &err),
        }
    }
}

impl From<ModerationError> for HttpError {
    fn from(error: ModerationError) -> Self {
        const SOURCE: &str = "application::error::moderation";
        match error {
            ModerationError::NotFound => HttpError::not_found(SOURCE, "record not found"),
            ModerationError::Pagination(err) => HttpError::not_found(SOURCE, err.to_string()),
            ModerationError::Repo(err) => repo_error_to_http(SOURCE, err),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Account(#[from] AccountError),
    #[error("resource not found")]
    NotFound,
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Domain(DomainError::NotFound { .. }) | AppError::NotFound => {
                StatusCode::NOT_FOUND
            }
            AppError::Domain(DomainError::Validation { .. })
            | AppError::Account(AccountError::Invalid(_)) => StatusCode::BAD_REQUEST,
            AppError::Infra(InfraError::Database { .. }) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Infra(_)
            | AppError::Account(_)
            | AppError::Domain(DomainError::Invariant { .. })
            | AppError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn presentation_message(&self) -> &'static str {
        match self {
            AppError::Domain(DomainError::NotFound { .. }) | AppError::NotFound => {
                "Page not found"
            }
            AppError::Domain(DomainError::Validation { .. })
            | AppError::Account(AccountError::Invalid(_)) => "Request could not be processed",
            AppError::Infra(InfraError::Database { .. }) => "Service temporarily unavailable",
            AppError::Infra(InfraError::Configuration { .. }) => "Service misconfigured",
            AppError::Infra(InfraError::Telemetry(_)) => "Logging subsystem could not start",
            AppError::Infra(InfraError::Uploads { .. }) => "Image storage unavailable",
            AppError::Infra(InfraError::Listener { .. }) => "Server could not start",
            AppError::Account(_)
            | AppError::Domain(DomainError::Invariant { .. })
            | AppError::Unexpected(_) => "Unexpected error occurred",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.presentation_message();
        let report = ErrorReport::from_error("application::error::AppError", status, &self);
        let mut response = render_error_response(status, message);
        report.attach(&mut response);
        response
    }
}
