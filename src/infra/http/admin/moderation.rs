use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use crate::{
    application::{admin::AdminPostFilter, error::HttpError, pagination::PageSelector},
    presentation::{admin::views as admin_views, views::render_template_response},
};

use super::super::parse_id;
use super::AdminState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct AdminPostQuery {
    q: Option<String>,
    status: Option<String>,
    page: Option<String>,
}

impl AdminPostQuery {
    fn is_published(&self) -> Option<bool> {
        match self.status.as_deref() {
            Some("published") => Some(true),
            Some("hidden") => Some(false),
            _ => None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct AdminPageQuery {
    page: Option<String>,
}

fn page_selector(source: &'static str, raw: Option<&str>) -> Result<PageSelector, HttpError> {
    PageSelector::parse(raw).map_err(|err| HttpError::not_found(source, err.to_string()))
}

pub(super) async fn admin_posts(
    State(state): State<AdminState>,
    Query(query): Query<AdminPostQuery>,
) -> Result<Response, HttpError> {
    let page = page_selector("infra::http::admin::posts", query.page.as_deref())?;
    let filter = AdminPostFilter {
        search: query.q.clone(),
        is_published: query.is_published(),
    };
    let posts = state.moderation.list_posts(&filter, page).await?;
    let content = admin_views::AdminPostListView::new(
        &posts,
        query.q.as_deref().map(str::trim),
        filter.is_published,
        state.site.timezone,
    );
    let view = admin_views::AdminLayout::new(state.site.title.clone(), "Posts", "/posts", content);
    Ok(render_template_response(
        admin_views::AdminPostsTemplate { view },
        StatusCode::OK,
    ))
}

pub(super) async fn admin_post_publish(
    State(state): State<AdminState>,
    Path(raw_id): Path<String>,
) -> Result<Response, HttpError> {
    let id = parse_id("infra::http::admin::post_publish", &raw_id)?;
    state.moderation.toggle_post(id).await?;
    Ok(Redirect::to("/posts").into_response())
}

pub(super) async fn admin_post_delete(
    State(state): State<AdminState>,
    Path(raw_id): Path<String>,
) -> Result<Response, HttpError> {
    let id = parse_id("infra::http::admin::post_delete", &raw_id)?;
    state.moderation.delete_post(id).await?;
    Ok(Redirect::to("/posts").into_response())
}

pub(super) async fn admin_comments(
    State(state): State<AdminState>,
    Query(query): Query<AdminPageQuery>,
) -> Result<Response, HttpError> {
    let page = page_selector("infra::http::admin::comments", query.page.as_deref())?;
    let comments = state.moderation.list_comments(page).await?;
    let content = admin_views::AdminCommentListView::new(&comments, state.site.timezone);
    let view =
        admin_views::AdminLayout::new(state.site.title.clone(), "Comments", "/comments", content);
    Ok(render_template_response(
        admin_views::AdminCommentsTemplate { view },
        StatusCode::OK,
    ))
}

pub(super) async fn admin_comment_publish(
    State(state): State<AdminState>,
    Path(raw_id): Path<String>,
) -> Result<Response, HttpError> {
    let id = parse_id("infra::http::admin::comment_publish", &raw_id)?;
    state.moderation.toggle_comment(id).await?;
    Ok(Redirect::to("/comments").into_response())
}

pub(super) async fn admin_comment_delete(
    State(state): State<AdminState>,
    Path(raw_id): Path<String>,
) -> Result<Response, HttpError> {
    let id = parse_id("infra::http::admin::comment_delete", &raw_id)?;
    state.moderation.delete_comment(id).await?;
    Ok(Redirect::to("/comments").into_response())
}
