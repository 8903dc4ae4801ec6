mod dashboard;
mod health;
mod moderation;
mod state;
mod taxonomy;

pub use state::AdminState;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::infra::assets;

use super::middleware::{log_responses, set_request_context};

pub fn build_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/", get(dashboard::admin_dashboard))
        .route("/categories", get(taxonomy::admin_categories))
        .route(
            "/categories/new",
            get(taxonomy::admin_category_new).post(taxonomy::admin_category_create),
        )
        .route(
            "/categories/{id}/edit",
            get(taxonomy::admin_category_edit).post(taxonomy::admin_category_update),
        )
        .route(
            "/categories/{id}/delete",
            get(taxonomy::admin_category_confirm_delete).post(taxonomy::admin_category_delete),
        )
        .route("/locations", get(taxonomy::admin_locations))
        .route(
            "/locations/new",
            get(taxonomy::admin_location_new).post(taxonomy::admin_location_create),
        )
        .route(
            "/locations/{id}/edit",
            get(taxonomy::admin_location_edit).post(taxonomy::admin_location_update),
        )
        .route(
            "/locations/{id}/delete",
            get(taxonomy::admin_location_confirm_delete).post(taxonomy::admin_location_delete),
        )
        .route("/posts", get(moderation::admin_posts))
        .route("/posts/{id}/publish", post(moderation::admin_post_publish))
        .route("/posts/{id}/delete", post(moderation::admin_post_delete))
        .route("/comments", get(moderation::admin_comments))
        .route(
            "/comments/{id}/publish",
            post(moderation::admin_comment_publish),
        )
        .route(
            "/comments/{id}/delete",
            post(moderation::admin_comment_delete),
        )
        .route("/_health/db", get(health::admin_health))
        .route("/static/{*path}", get(assets::serve_static))
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}
