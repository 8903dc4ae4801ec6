use askama::Template;
use chrono_tz::Tz;

use crate::application::pagination::Paginated;
use crate::domain::entities::{AnnotatedComment, AnnotatedPost, CategoryRecord, LocationRecord};
use crate::domain::error::FieldErrors;
use crate::presentation::views::{PaginationView, excerpt};
use crate::util::timezone;

const COMMENT_EXCERPT_WORDS: usize = 12;

#[derive(Clone)]
pub struct AdminNavigationItemView {
    pub label: &'static str,
    pub href: &'static str,
    pub is_active: bool,
}

#[derive(Clone)]
pub struct AdminLayout<T> {
    pub site_title: String,
    pub heading: String,
    pub navigation: Vec<AdminNavigationItemView>,
    pub content: T,
}

impl<T> AdminLayout<T> {
    pub fn new(
        site_title: impl Into<String>,
        heading: impl Into<String>,
        active_path: &str,
        content: T,
    ) -> Self {
        Self {
            site_title: site_title.into(),
            heading: heading.into(),
            navigation: navigation(active_path),
            content,
        }
    }
}

fn navigation(active_path: &str) -> Vec<AdminNavigationItemView> {
    [
        ("Dashboard", "/"),
        ("Posts", "/posts"),
        ("Comments", "/comments"),
        ("Categories", "/categories"),
        ("Locations", "/locations"),
    ]
    .into_iter()
    .map(|(label, href)| AdminNavigationItemView {
        label,
        href,
        is_active: if href == "/" {
            active_path == "/"
        } else {
            active_path.starts_with(href)
        },
    })
    .collect()
}

#[derive(Clone)]
pub struct AdminMetricView {
    pub label: &'static str,
    pub value: u64,
    pub href: &'static str,
}

#[derive(Clone)]
pub struct AdminDashboardView {
    pub metrics: Vec<AdminMetricView>,
}

#[derive(Template)]
#[template(path = "admin/dashboard.html")]
pub struct AdminDashboardTemplate {
    pub view: AdminLayout<AdminDashboardView>,
}

#[derive(Clone)]
pub struct AdminCategoryRowView {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub is_published: bool,
    pub created_at: String,
}

impl AdminCategoryRowView {
    pub fn new(record: &CategoryRecord, tz: Tz) -> Self {
        Self {
            id: record.id,
            title: record.title.clone(),
            slug: record.slug.clone(),
            is_published: record.is_published,
            created_at: timezone::format_display(record.created_at, tz),
        }
    }
}

#[derive(Template)]
#[template(path = "admin/categories.html")]
pub struct AdminCategoriesTemplate {
    pub view: AdminLayout<Vec<AdminCategoryRowView>>,
}

#[derive(Clone, Default)]
pub struct AdminCategoryFormView {
    pub action: String,
    pub title: String,
    pub description: String,
    pub slug: String,
    pub is_published: bool,
    pub errors: FieldErrors,
}

impl AdminCategoryFormView {
    pub fn blank(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            is_published: true,
            ..Self::default()
        }
    }

    pub fn from_record(action: impl Into<String>, record: &CategoryRecord) -> Self {
        Self {
            action: action.into(),
            title: record.title.clone(),
            description: record.description.clone(),
            slug: record.slug.clone(),
            is_published: record.is_published,
            errors: FieldErrors::new(),
        }
    }
}

#[derive(Template)]
#[template(path = "admin/category_form.html")]
pub struct AdminCategoryFormTemplate {
    pub view: AdminLayout<AdminCategoryFormView>,
}

#[derive(Clone)]
pub struct AdminLocationRowView {
    pub id: i64,
    pub name: String,
    pub is_published: bool,
    pub created_at: String,
}

impl AdminLocationRowView {
    pub fn new(record: &LocationRecord, tz: Tz) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
            is_published: record.is_published,
            created_at: timezone::format_display(record.created_at, tz),
        }
    }
}

#[derive(Template)]
#[template(path = "admin/locations.html")]
pub struct AdminLocationsTemplate {
    pub view: AdminLayout<Vec<AdminLocationRowView>>,
}

#[derive(Clone, Default)]
pub struct AdminLocationFormView {
    pub action: String,
    pub name: String,
    pub is_published: bool,
    pub errors: FieldErrors,
}

impl AdminLocationFormView {
    pub fn blank(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            is_published: true,
            ..Self::default()
        }
    }

    pub fn from_record(action: impl Into<String>, record: &LocationRecord) -> Self {
        Self {
            action: action.into(),
            name: record.name.clone(),
            is_published: record.is_published,
            errors: FieldErrors::new(),
        }
    }
}

#[derive(Template)]
#[template(path = "admin/location_form.html")]
pub struct AdminLocationFormTemplate {
    pub view: AdminLayout<AdminLocationFormView>,
}

/// Confirmation page shared by every admin delete action.
#[derive(Clone)]
pub struct AdminConfirmDeleteView {
    pub subject: String,
    pub action: String,
    pub cancel_href: String,
}

#[derive(Template)]
#[template(path = "admin/confirm_delete.html")]
pub struct AdminConfirmDeleteTemplate {
    pub view: AdminLayout<AdminConfirmDeleteView>,
}

#[derive(Clone)]
pub struct AdminPostRowView {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub category: String,
    pub pub_date: String,
    pub is_published: bool,
    pub comment_count: u64,
}

#[derive(Clone)]
pub struct AdminStatusFilterView {
    pub label: &'static str,
    pub href: String,
    pub is_active: bool,
}

#[derive(Clone)]
pub struct AdminPostListView {
    pub posts: Vec<AdminPostRowView>,
    pub filters: Vec<AdminStatusFilterView>,
    pub search: String,
    pub status_key: String,
    pub total_items: u64,
    pub pagination: PaginationView,
}

impl AdminPostListView {
    pub fn new(
        page: &Paginated<AnnotatedPost>,
        search: Option<&str>,
        is_published: Option<bool>,
        tz: Tz,
    ) -> Self {
        let search = search.unwrap_or_default().to_string();
        let status_key = match is_published {
            Some(true) => "published",
            Some(false) => "hidden",
            None => "",
        };
        let base = posts_query(&search, status_key);
        let filters = [("All", ""), ("Published", "published"), ("Hidden", "hidden")]
            .into_iter()
            .map(|(label, key)| AdminStatusFilterView {
                label,
                href: posts_query(&search, key),
                is_active: key == status_key,
            })
            .collect();

        Self {
            posts: page
                .items
                .iter()
                .map(|post| AdminPostRowView {
                    id: post.post.id,
                    title: post.post.title.clone(),
                    author: post.author.username.clone(),
                    category: post
                        .category
                        .as_ref()
                        .map(|category| category.title.clone())
                        .unwrap_or_else(|| "none".to_string()),
                    pub_date: timezone::format_display(post.post.pub_date, tz),
                    is_published: post.post.is_published,
                    comment_count: post.comment_count,
                })
                .collect(),
            filters,
            search,
            status_key: status_key.to_string(),
            total_items: page.total_items,
            pagination: PaginationView::new(page, &base),
        }
    }
}

fn posts_query(search: &str, status_key: &str) -> String {
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    if !search.is_empty() {
        query.append_pair("q", search);
    }
    if !status_key.is_empty() {
        query.append_pair("status", status_key);
    }
    let query = query.finish();
    if query.is_empty() {
        "/posts".to_string()
    } else {
        format!("/posts?{query}")
    }
}

#[derive(Template)]
#[template(path = "admin/posts.html")]
pub struct AdminPostsTemplate {
    pub view: AdminLayout<AdminPostListView>,
}

#[derive(Clone)]
pub struct AdminCommentRowView {
    pub id: i64,
    pub post_id: i64,
    pub author: String,
    pub excerpt: String,
    pub created_at: String,
    pub is_published: bool,
}

#[derive(Clone)]
pub struct AdminCommentListView {
    pub comments: Vec<AdminCommentRowView>,
    pub total_items: u64,
    pub pagination: PaginationView,
}

impl AdminCommentListView {
    pub fn new(page: &Paginated<AnnotatedComment>, tz: Tz) -> Self {
        Self {
            comments: page
                .items
                .iter()
                .map(|comment| AdminCommentRowView {
                    id: comment.comment.id,
                    post_id: comment.comment.post_id,
                    author: comment.author.username.clone(),
                    excerpt: excerpt(&comment.comment.text, COMMENT_EXCERPT_WORDS),
                    created_at: timezone::format_display(comment.comment.created_at, tz),
                    is_published: comment.comment.is_published,
                })
                .collect(),
            total_items: page.total_items,
            pagination: PaginationView::new(page, "/comments"),
        }
    }
}

#[derive(Template)]
#[template(path = "admin/comments.html")]
pub struct AdminCommentsTemplate {
    pub view: AdminLayout<AdminCommentListView>,
}
