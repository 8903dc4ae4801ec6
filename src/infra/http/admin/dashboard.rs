use axum::{extract::State, http::StatusCode, response::Response};

use crate::{
    application::{admin::AdminPostFilter, error::HttpError, pagination::PageSelector},
    presentation::{admin::views as admin_views, views::render_template_response},
};

use super::AdminState;

pub(super) async fn admin_dashboard(
    State(state): State<AdminState>,
) -> Result<Response, HttpError> {
    let posts = state
        .moderation
        .list_posts(&AdminPostFilter::default(), PageSelector::First)
        .await?;
    let hidden = state
        .moderation
        .list_posts(
            &AdminPostFilter {
                is_published: Some(false),
                ..AdminPostFilter::default()
            },
            PageSelector::First,
        )
        .await?;
    let comments = state.moderation.list_comments(PageSelector::First).await?;
    let categories = state.taxonomy.list_categories().await?;
    let locations = state.taxonomy.list_locations().await?;

    let content = admin_views::AdminDashboardView {
        metrics: vec![
            admin_views::AdminMetricView {
                label: "Posts",
                value: posts.total_items,
                href: "/posts",
            },
            admin_views::AdminMetricView {
                label: "Hidden posts",
                value: hidden.total_items,
                href: "/posts?status=hidden",
            },
            admin_views::AdminMetricView {
                label: "Comments",
                value: comments.total_items,
                href: "/comments",
            },
            admin_views::AdminMetricView {
                label: "Categories",
                value: categories.len() as u64,
                href: "/categories",
            },
            admin_views::AdminMetricView {
                label: "Locations",
                value: locations.len() as u64,
                href: "/locations",
            },
        ],
    };

    let view = admin_views::AdminLayout::new(state.site.title.clone(), "Dashboard", "/", content);
    Ok(render_template_response(
        admin_views::AdminDashboardTemplate { view },
        StatusCode::OK,
    ))
}
