use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use serde::Deserialize;
use tracing::debug;

use crate::{
    application::{comments::CommentError, error::HttpError, posts::OwnerOutcome},
    domain::{entities::UserRecord, error::FieldErrors},
    presentation::views::{
        CommentFormTemplate, CommentFormView, LayoutContext, render_template_response,
    },
};

use super::{HttpState, RequireUser, parse_id, posts::detail_redirect};

/// Only the text is read; author and post come from the session and the path.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct CommentPayload {
    text: String,
}

pub(super) async fn add_comment(
    State(state): State<HttpState>,
    RequireUser(user): RequireUser,
    Path(raw_post_id): Path<String>,
    Form(payload): Form<CommentPayload>,
) -> Result<Response, HttpError> {
    let post_id = parse_id("infra::http::comments::add_comment", &raw_post_id)?;
    match state.comments.create(user.id, post_id, &payload.text).await {
        Ok(_) => Ok(detail_redirect(post_id)),
        Err(CommentError::Invalid(errors)) => {
            debug!(
                target = "blogicum::http::comments",
                post_id,
                errors = ?errors,
                "comment rejected"
            );
            Ok(render_comment_form(
                &state,
                &user,
                create_page(post_id),
                payload.text,
                errors,
            ))
        }
        Err(err) => Err(err.into()),
    }
}

pub(super) async fn edit_form(
    State(state): State<HttpState>,
    RequireUser(user): RequireUser,
    Path((raw_post_id, raw_comment_id)): Path<(String, String)>,
) -> Result<Response, HttpError> {
    let (post_id, comment_id) =
        parse_ids("infra::http::comments::edit_form", &raw_post_id, &raw_comment_id)?;
    match state.comments.edit_form(user.id, post_id, comment_id).await? {
        OwnerOutcome::Permitted(comment) => Ok(render_comment_form(
            &state,
            &user,
            edit_page(post_id, comment_id),
            comment.text,
            FieldErrors::new(),
        )),
        OwnerOutcome::Redirect(id) => Ok(detail_redirect(id)),
    }
}

pub(super) async fn update(
    State(state): State<HttpState>,
    RequireUser(user): RequireUser,
    Path((raw_post_id, raw_comment_id)): Path<(String, String)>,
    Form(payload): Form<CommentPayload>,
) -> Result<Response, HttpError> {
    let (post_id, comment_id) =
        parse_ids("infra::http::comments::update", &raw_post_id, &raw_comment_id)?;
    match state
        .comments
        .update(user.id, post_id, comment_id, &payload.text)
        .await
    {
        Ok(OwnerOutcome::Permitted(_)) | Ok(OwnerOutcome::Redirect(_)) => {
            Ok(detail_redirect(post_id))
        }
        Err(CommentError::Invalid(errors)) => Ok(render_comment_form(
            &state,
            &user,
            edit_page(post_id, comment_id),
            payload.text,
            errors,
        )),
        Err(err) => Err(err.into()),
    }
}

pub(super) async fn delete_form(
    State(state): State<HttpState>,
    RequireUser(user): RequireUser,
    Path((raw_post_id, raw_comment_id)): Path<(String, String)>,
) -> Result<Response, HttpError> {
    let (post_id, comment_id) =
        parse_ids("infra::http::comments::delete_form", &raw_post_id, &raw_comment_id)?;
    match state
        .comments
        .delete_form(user.id, post_id, comment_id)
        .await?
    {
        OwnerOutcome::Permitted(comment) => {
            let page = CommentFormView {
                heading: "Delete comment",
                action: format!("/posts/{post_id}/delete_comment/{comment_id}/"),
                submit_label: "Delete",
                read_only: true,
                text: String::new(),
                post_href: format!("/posts/{post_id}/"),
                errors: FieldErrors::new(),
            };
            Ok(render_comment_form(&state, &user, page, comment.text, FieldErrors::new()))
        }
        OwnerOutcome::Redirect(id) => Ok(detail_redirect(id)),
    }
}

pub(super) async fn delete(
    State(state): State<HttpState>,
    RequireUser(user): RequireUser,
    Path((raw_post_id, raw_comment_id)): Path<(String, String)>,
) -> Result<Response, HttpError> {
    let (post_id, comment_id) =
        parse_ids("infra::http::comments::delete", &raw_post_id, &raw_comment_id)?;
    state.comments.delete(user.id, post_id, comment_id).await?;
    Ok(detail_redirect(post_id))
}

fn parse_ids(
    source: &'static str,
    raw_post_id: &str,
    raw_comment_id: &str,
) -> Result<(i64, i64), HttpError> {
    Ok((parse_id(source, raw_post_id)?, parse_id(source, raw_comment_id)?))
}

fn create_page(post_id: i64) -> CommentFormView {
    CommentFormView {
        heading: "Add a comment",
        action: format!("/posts/{post_id}/comment/"),
        submit_label: "Send",
        read_only: false,
        text: String::new(),
        post_href: format!("/posts/{post_id}/"),
        errors: FieldErrors::new(),
    }
}

fn edit_page(post_id: i64, comment_id: i64) -> CommentFormView {
    CommentFormView {
        heading: "Edit comment",
        action: format!("/posts/{post_id}/edit_comment/{comment_id}/"),
        submit_label: "Save",
        read_only: false,
        text: String::new(),
        post_href: format!("/posts/{post_id}/"),
        errors: FieldErrors::new(),
    }
}

fn render_comment_form(
    state: &HttpState,
    user: &UserRecord,
    page: CommentFormView,
    text: String,
    errors: FieldErrors,
) -> Response {
    let heading = page.heading;
    let content = CommentFormView {
        text,
        errors,
        ..page
    };
    let view = LayoutContext::new(state.site.chrome(Some(user)), heading, content);
    render_template_response(CommentFormTemplate { view }, StatusCode::OK)
}
