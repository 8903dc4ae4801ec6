use std::{io::ErrorKind, sync::Arc};

use axum::{
    Router,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{StatusCode, Uri},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tracing::error;

use crate::{
    application::{
        accounts::AccountService,
        comments::CommentService,
        error::HttpError,
        feed::FeedService,
        pagination::PageSelector,
        posts::PostService,
        repos::HealthRepo,
    },
    infra::{
        assets::{self, build_response},
        uploads::{UploadStorage, UploadStorageError},
    },
    presentation::views::{
        AboutTemplate, CategoryHeaderView, CategoryTemplate, CommentView, IndexTemplate,
        LayoutContext, ListingView, PostCardView, PostDetailTemplate, PostDetailView,
        ProfileHeaderView, ProfileTemplate, RulesTemplate, render_template_response,
    },
};

use super::{
    CurrentUser, SiteContext, accounts, comments, db_health_response,
    middleware::{log_responses, set_request_context},
    parse_id, posts,
};

#[derive(Clone)]
pub struct HttpState {
    pub feed: Arc<FeedService>,
    pub posts: Arc<PostService>,
    pub comments: Arc<CommentService>,
    pub accounts: Arc<AccountService>,
    pub uploads: Arc<UploadStorage>,
    pub health: Arc<dyn HealthRepo>,
    pub site: Arc<SiteContext>,
}

pub fn build_router(state: HttpState, upload_body_limit: usize) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/category/{slug}/", get(category))
        .route("/profile/edit/", get(accounts::profile_edit_form).post(accounts::profile_edit))
        .route("/profile/{username}/", get(profile))
        .route("/posts/create/", get(posts::create_form).post(posts::create))
        .route("/posts/{id}/", get(post_detail))
        .route("/posts/{id}/edit/", get(posts::edit_form).post(posts::update))
        .route("/posts/{id}/delete/", get(posts::delete_form).post(posts::delete))
        .route("/posts/{post_id}/comment/", post(comments::add_comment))
        .route(
            "/posts/{post_id}/edit_comment/{comment_id}/",
            get(comments::edit_form).post(comments::update),
        )
        .route(
            "/posts/{post_id}/delete_comment/{comment_id}/",
            get(comments::delete_form).post(comments::delete),
        )
        .route("/pages/about/", get(about))
        .route("/pages/rules/", get(rules))
        .route("/auth/login/", get(accounts::login_form).post(accounts::login))
        .route("/auth/logout/", get(accounts::logout).post(accounts::logout))
        .route(
            "/auth/registration/",
            get(accounts::registration_form).post(accounts::register),
        )
        .route("/media/{*path}", get(serve_media))
        .route("/static/{*path}", get(assets::serve_static))
        .route("/_health/db", get(public_health))
        .fallback(fallback)
        .with_state(state)
        .layer(DefaultBodyLimit::max(upload_body_limit))
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct PageQuery {
    pub(super) page: Option<String>,
}

impl PageQuery {
    pub(super) fn selector(&self, source: &'static str) -> Result<PageSelector, HttpError> {
        PageSelector::parse(self.page.as_deref())
            .map_err(|err| HttpError::not_found(source, err.to_string()))
    }
}

async fn index(
    State(state): State<HttpState>,
    current: CurrentUser,
    Query(query): Query<PageQuery>,
) -> Result<Response, HttpError> {
    const SOURCE: &str = "infra::http::public::index";

    let page = state.feed.index(query.selector(SOURCE)?).await?;
    let content = ListingView::new(&page, "/", state.site.timezone);
    let view = LayoutContext::new(state.site.chrome(current.user()), "Latest posts", content);
    Ok(render_template_response(IndexTemplate { view }, StatusCode::OK))
}

async fn category(
    State(state): State<HttpState>,
    current: CurrentUser,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Response, HttpError> {
    const SOURCE: &str = "infra::http::public::category";

    let feed = state.feed.category(&slug, query.selector(SOURCE)?).await?;
    let base = format!("/category/{}/", feed.category.slug);
    let content = ListingView::new(&feed.posts, &base, state.site.timezone);
    let view = LayoutContext::new(
        state.site.chrome(current.user()),
        feed.category.title.clone(),
        content,
    );
    let category = CategoryHeaderView {
        title: feed.category.title,
        description: feed.category.description,
    };
    Ok(render_template_response(
        CategoryTemplate { view, category },
        StatusCode::OK,
    ))
}

async fn profile(
    State(state): State<HttpState>,
    current: CurrentUser,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Response, HttpError> {
    const SOURCE: &str = "infra::http::public::profile";

    let feed = state
        .feed
        .profile(&username, current.viewer(), query.selector(SOURCE)?)
        .await?;
    let tz = state.site.timezone;
    let base = format!("/profile/{}/", feed.profile.username);
    let content = ListingView::new(&feed.posts, &base, tz);
    let view = LayoutContext::new(
        state.site.chrome(current.user()),
        format!("@{}", feed.profile.username),
        content,
    );
    let profile = ProfileHeaderView::new(&feed.profile, feed.is_owner, tz);
    Ok(render_template_response(
        ProfileTemplate { view, profile },
        StatusCode::OK,
    ))
}

async fn post_detail(
    State(state): State<HttpState>,
    current: CurrentUser,
    Path(raw_id): Path<String>,
) -> Result<Response, HttpError> {
    const SOURCE: &str = "infra::http::public::post_detail";

    let id = parse_id(SOURCE, &raw_id)?;
    let detail = state.feed.post_detail(id, current.viewer()).await?;
    let tz = state.site.timezone;
    let viewer_id = current.viewer().user_id();

    let content = PostDetailView {
        post: PostCardView::from_annotated(&detail.post, tz, time::OffsetDateTime::now_utc()),
        comments: detail
            .comments
            .iter()
            .map(|comment| CommentView::from_annotated(comment, viewer_id, tz))
            .collect(),
        is_author: detail.viewer_is_author,
        can_comment: current.user().is_some(),
    };
    let title = content.post.title.clone();
    let view = LayoutContext::new(state.site.chrome(current.user()), title, content);
    Ok(render_template_response(
        PostDetailTemplate { view },
        StatusCode::OK,
    ))
}

async fn about(State(state): State<HttpState>, current: CurrentUser) -> Response {
    let view = LayoutContext::new(state.site.chrome(current.user()), "About", ());
    render_template_response(AboutTemplate { view }, StatusCode::OK)
}

async fn rules(State(state): State<HttpState>, current: CurrentUser) -> Response {
    let view = LayoutContext::new(state.site.chrome(current.user()), "Rules", ());
    render_template_response(RulesTemplate { view }, StatusCode::OK)
}

async fn serve_media(State(state): State<HttpState>, Path(path): Path<String>) -> Response {
    const SOURCE: &str = "infra::http::public::serve_media";

    match state.uploads.read(&path).await {
        Ok(bytes) => {
            let mime = mime_guess::from_path(&path).first_or_octet_stream();
            build_response(bytes, mime, "public, max-age=604800")
        }
        Err(UploadStorageError::InvalidPath) => {
            HttpError::not_found(SOURCE, "invalid media path").into_response()
        }
        Err(UploadStorageError::Io(err)) if err.kind() == ErrorKind::NotFound => {
            HttpError::not_found(SOURCE, "media file missing").into_response()
        }
        Err(err) => {
            error!(
                target = "blogicum::http::public::media",
                path = %path,
                error = %err,
                "failed to read stored media"
            );
            HttpError::from_error(
                SOURCE,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to read uploaded file",
                &err,
            )
            .into_response()
        }
    }
}

async fn public_health(State(state): State<HttpState>) -> Response {
    db_health_response(state.health.health_check().await)
}

async fn fallback(uri: Uri) -> HttpError {
    HttpError::not_found("infra::http::public::fallback", format!("no route for {}", uri.path()))
}
