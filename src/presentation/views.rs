use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use chrono_tz::Tz;
use thiserror::Error;
use time::OffsetDateTime;

use crate::application::error::HttpError;
use crate::application::pagination::Paginated;
use crate::domain::entities::{
    AnnotatedComment, AnnotatedPost, CategoryRecord, LocationRecord, UserRecord,
};
use crate::domain::error::FieldErrors;
use crate::util::timezone;

pub const DEFAULT_SITE_TITLE: &str = "Blogicum";
const EXCERPT_WORDS: usize = 30;
const UNKNOWN_LOCATION: &str = "Planet Earth";

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
        .into()
    })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

/// Render the site error page. Falls back to plain text if the page itself fails to render.
pub fn render_error_response(status: StatusCode, message: &'static str) -> Response {
    let chrome = LayoutChrome::anonymous(DEFAULT_SITE_TITLE);
    let content = ErrorPageView::for_status(status, message);
    let view = LayoutContext::new(chrome, content.title.clone(), content);
    match (ErrorTemplate { view }).render() {
        Ok(html) => (status, Html(html)).into_response(),
        Err(_) => (status, message).into_response(),
    }
}

#[derive(Clone)]
pub struct ViewerView {
    pub username: String,
}

/// Per-request parts of the page frame.
#[derive(Clone)]
pub struct LayoutChrome {
    pub site_title: String,
    pub viewer: Option<ViewerView>,
}

impl LayoutChrome {
    pub fn new(site_title: impl Into<String>, viewer: Option<&UserRecord>) -> Self {
        Self {
            site_title: site_title.into(),
            viewer: viewer.map(|user| ViewerView {
                username: user.username.clone(),
            }),
        }
    }

    pub fn anonymous(site_title: impl Into<String>) -> Self {
        Self::new(site_title, None)
    }
}

pub struct LayoutContext<T> {
    pub site_title: String,
    pub page_title: String,
    pub viewer: Option<ViewerView>,
    pub content: T,
}

impl<T> LayoutContext<T> {
    pub fn new(chrome: LayoutChrome, page_title: impl Into<String>, content: T) -> Self {
        Self {
            site_title: chrome.site_title,
            page_title: page_title.into(),
            viewer: chrome.viewer,
            content,
        }
    }
}

#[derive(Clone)]
pub struct CategoryLinkView {
    pub title: String,
    pub slug: String,
}

#[derive(Clone)]
pub struct PostCardView {
    pub id: i64,
    pub title: String,
    pub excerpt: String,
    pub text: String,
    pub author_username: String,
    pub published: String,
    pub iso_date: String,
    pub category: Option<CategoryLinkView>,
    pub location: String,
    pub comment_count: u64,
    pub image_url: Option<String>,
    /// Notes shown to the author when the post is hidden from everyone else.
    pub notices: Vec<&'static str>,
}

impl PostCardView {
    pub fn from_annotated(post: &AnnotatedPost, tz: Tz, now: OffsetDateTime) -> Self {
        let record = &post.post;
        let mut notices = Vec::new();
        if !record.is_published {
            notices.push("Unpublished");
        }
        match post.category.as_ref() {
            Some(category) if !category.is_published => notices.push("Category unpublished"),
            None => notices.push("No category"),
            _ => {}
        }
        if record.pub_date > now {
            notices.push("Scheduled");
        }

        Self {
            id: record.id,
            title: record.title.clone(),
            excerpt: excerpt(&record.text, EXCERPT_WORDS),
            text: record.text.clone(),
            author_username: post.author.username.clone(),
            published: timezone::format_display(record.pub_date, tz),
            iso_date: timezone::format_iso(record.pub_date, tz),
            category: post
                .category
                .as_ref()
                .filter(|category| category.is_published)
                .map(|category| CategoryLinkView {
                    title: category.title.clone(),
                    slug: category.slug.clone(),
                }),
            location: post
                .location
                .as_ref()
                .filter(|location| location.is_published)
                .map(|location| location.name.clone())
                .unwrap_or_else(|| UNKNOWN_LOCATION.to_string()),
            comment_count: post.comment_count,
            image_url: record.image.as_deref().map(media_url),
            notices,
        }
    }
}

pub fn media_url(stored_path: &str) -> String {
    format!("/media/{stored_path}")
}

/// First `words` words of `text`, with an ellipsis when shortened.
pub fn excerpt(text: &str, words: usize) -> String {
    let mut parts = text.split_whitespace();
    let head: Vec<&str> = parts.by_ref().take(words).collect();
    let mut out = head.join(" ");
    if parts.next().is_some() {
        out.push_str(" …");
    }
    out
}

#[derive(Clone)]
pub struct PaginationView {
    pub number: u32,
    pub total_pages: u32,
    pub first: Option<String>,
    pub previous: Option<String>,
    pub next: Option<String>,
    pub last: Option<String>,
}

impl PaginationView {
    /// Links are `base` plus a `page` parameter; `base` may already carry a query.
    pub fn new<T>(page: &Paginated<T>, base: &str) -> Self {
        let separator = if base.contains('?') { '&' } else { '?' };
        let href = |number: u32| format!("{base}{separator}page={number}");
        Self {
            number: page.number,
            total_pages: page.total_pages,
            first: page.has_previous().then(|| href(1)),
            previous: page.previous_number().map(href),
            next: page.next_number().map(href),
            last: page.has_next().then(|| format!("{base}{separator}page=last")),
        }
    }

    pub fn is_paginated(&self) -> bool {
        self.total_pages > 1
    }
}

pub struct ListingView {
    pub posts: Vec<PostCardView>,
    pub pagination: PaginationView,
}

impl ListingView {
    pub fn new(page: &Paginated<AnnotatedPost>, base: &str, tz: Tz) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            posts: page
                .items
                .iter()
                .map(|post| PostCardView::from_annotated(post, tz, now))
                .collect(),
            pagination: PaginationView::new(page, base),
        }
    }
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub view: LayoutContext<ListingView>,
}

pub struct CategoryHeaderView {
    pub title: String,
    pub description: String,
}

#[derive(Template)]
#[template(path = "category.html")]
pub struct CategoryTemplate {
    pub view: LayoutContext<ListingView>,
    pub category: CategoryHeaderView,
}

pub struct ProfileHeaderView {
    pub username: String,
    pub full_name: String,
    pub joined: String,
    pub is_owner: bool,
}

impl ProfileHeaderView {
    pub fn new(profile: &UserRecord, is_owner: bool, tz: Tz) -> Self {
        Self {
            username: profile.username.clone(),
            full_name: profile.display_name(),
            joined: timezone::format_display(profile.created_at, tz),
            is_owner,
        }
    }
}

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
    pub view: LayoutContext<ListingView>,
    pub profile: ProfileHeaderView,
}

pub struct CommentView {
    pub id: i64,
    pub post_id: i64,
    pub text: String,
    pub author_username: String,
    pub created: String,
    pub is_author: bool,
    pub is_published: bool,
}

impl CommentView {
    pub fn from_annotated(comment: &AnnotatedComment, viewer_id: Option<i64>, tz: Tz) -> Self {
        Self {
            id: comment.comment.id,
            post_id: comment.comment.post_id,
            text: comment.comment.text.clone(),
            author_username: comment.author.username.clone(),
            created: timezone::format_display(comment.comment.created_at, tz),
            is_author: viewer_id == Some(comment.comment.author_id),
            is_published: comment.comment.is_published,
        }
    }
}

pub struct PostDetailView {
    pub post: PostCardView,
    pub comments: Vec<CommentView>,
    pub is_author: bool,
    pub can_comment: bool,
}

#[derive(Template)]
#[template(path = "detail.html")]
pub struct PostDetailTemplate {
    pub view: LayoutContext<PostDetailView>,
}

#[derive(Clone)]
pub struct ChoiceView {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// Raw post form values echoed back into the form.
#[derive(Debug, Clone, Default)]
pub struct PostFormValues {
    pub title: String,
    pub text: String,
    pub pub_date: String,
    pub category: String,
    pub location: String,
}

pub struct PostFormView {
    pub heading: &'static str,
    pub action: String,
    pub submit_label: &'static str,
    pub read_only: bool,
    pub values: PostFormValues,
    pub current_image_url: Option<String>,
    pub categories: Vec<ChoiceView>,
    pub locations: Vec<ChoiceView>,
    pub errors: FieldErrors,
}

impl PostFormView {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        heading: &'static str,
        action: String,
        submit_label: &'static str,
        read_only: bool,
        values: PostFormValues,
        current_image: Option<&str>,
        categories: &[CategoryRecord],
        locations: &[LocationRecord],
        errors: FieldErrors,
    ) -> Self {
        let categories = categories
            .iter()
            .map(|category| ChoiceView {
                value: category.id.to_string(),
                label: category.title.clone(),
                selected: values.category == category.id.to_string(),
            })
            .collect();
        let locations = locations
            .iter()
            .map(|location| ChoiceView {
                value: location.id.to_string(),
                label: location.name.clone(),
                selected: values.location == location.id.to_string(),
            })
            .collect();
        Self {
            heading,
            action,
            submit_label,
            read_only,
            current_image_url: current_image.map(media_url),
            values,
            categories,
            locations,
            errors,
        }
    }
}

#[derive(Template)]
#[template(path = "post_form.html")]
pub struct PostFormTemplate {
    pub view: LayoutContext<PostFormView>,
}

pub struct CommentFormView {
    pub heading: &'static str,
    pub action: String,
    pub submit_label: &'static str,
    pub read_only: bool,
    pub text: String,
    pub post_href: String,
    pub errors: FieldErrors,
}

#[derive(Template)]
#[template(path = "comment_form.html")]
pub struct CommentFormTemplate {
    pub view: LayoutContext<CommentFormView>,
}

#[derive(Default)]
pub struct LoginView {
    pub username: String,
    pub next: String,
    pub error: Option<&'static str>,
}

#[derive(Template)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub view: LayoutContext<LoginView>,
}

#[derive(Default)]
pub struct RegistrationView {
    pub username: String,
    pub email: String,
    pub errors: FieldErrors,
}

#[derive(Template)]
#[template(path = "auth/registration.html")]
pub struct RegistrationTemplate {
    pub view: LayoutContext<RegistrationView>,
}

#[derive(Default)]
pub struct ProfileEditView {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub errors: FieldErrors,
}

#[derive(Template)]
#[template(path = "profile_edit.html")]
pub struct ProfileEditTemplate {
    pub view: LayoutContext<ProfileEditView>,
}

#[derive(Template)]
#[template(path = "pages/about.html")]
pub struct AboutTemplate {
    pub view: LayoutContext<()>,
}

#[derive(Template)]
#[template(path = "pages/rules.html")]
pub struct RulesTemplate {
    pub view: LayoutContext<()>,
}

pub struct ErrorPageView {
    pub title: String,
    pub message: String,
}

impl ErrorPageView {
    pub fn for_status(status: StatusCode, message: &str) -> Self {
        let title = match status {
            StatusCode::NOT_FOUND => "Page not found",
            StatusCode::FORBIDDEN => "Access denied",
            status if status.is_client_error() => "Request rejected",
            _ => "Server error",
        };
        let message = match status {
            StatusCode::NOT_FOUND => {
                "The page you requested does not exist or is not available to you.".to_string()
            }
            _ => message.to_string(),
        };
        Self {
            title: title.to_string(),
            message,
        }
    }
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub view: LayoutContext<ErrorPageView>,
}
