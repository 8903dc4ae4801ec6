use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use crate::{
    application::{admin::AdminTaxonomyError, error::HttpError},
    domain::taxonomy::{CategoryDraft, LocationDraft},
    presentation::{admin::views as admin_views, views::render_template_response},
};

use super::super::parse_id;
use super::AdminState;

/// Unchecked checkboxes are absent from the submission.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct CategoryPayload {
    title: String,
    description: String,
    slug: String,
    is_published: Option<String>,
}

impl CategoryPayload {
    fn draft(&self) -> CategoryDraft {
        CategoryDraft {
            title: self.title.clone(),
            description: self.description.clone(),
            slug: self.slug.clone(),
            is_published: self.is_published.is_some(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct LocationPayload {
    name: String,
    is_published: Option<String>,
}

impl LocationPayload {
    fn draft(&self) -> LocationDraft {
        LocationDraft {
            name: self.name.clone(),
            is_published: self.is_published.is_some(),
        }
    }
}

pub(super) async fn admin_categories(
    State(state): State<AdminState>,
) -> Result<Response, HttpError> {
    let tz = state.site.timezone;
    let rows = state
        .taxonomy
        .list_categories()
        .await?
        .iter()
        .map(|record| admin_views::AdminCategoryRowView::new(record, tz))
        .collect();
    let view = admin_views::AdminLayout::new(
        state.site.title.clone(),
        "Categories",
        "/categories",
        rows,
    );
    Ok(render_template_response(
        admin_views::AdminCategoriesTemplate { view },
        StatusCode::OK,
    ))
}

pub(super) async fn admin_category_new(State(state): State<AdminState>) -> Response {
    let content = admin_views::AdminCategoryFormView::blank("/categories/new");
    render_category_form(&state, "New category", content, StatusCode::OK)
}

pub(super) async fn admin_category_create(
    State(state): State<AdminState>,
    Form(payload): Form<CategoryPayload>,
) -> Result<Response, HttpError> {
    match state.taxonomy.create_category(payload.draft()).await {
        Ok(_) => Ok(Redirect::to("/categories").into_response()),
        Err(AdminTaxonomyError::Invalid(errors)) => {
            let content = admin_views::AdminCategoryFormView {
                action: "/categories/new".to_string(),
                title: payload.title,
                description: payload.description,
                slug: payload.slug,
                is_published: payload.is_published.is_some(),
                errors,
            };
            Ok(render_category_form(
                &state,
                "New category",
                content,
                StatusCode::BAD_REQUEST,
            ))
        }
        Err(err) => Err(err.into()),
    }
}

pub(super) async fn admin_category_edit(
    State(state): State<AdminState>,
    Path(raw_id): Path<String>,
) -> Result<Response, HttpError> {
    let id = parse_id("infra::http::admin::category_edit", &raw_id)?;
    let record = state.taxonomy.category(id).await?;
    let content =
        admin_views::AdminCategoryFormView::from_record(format!("/categories/{id}/edit"), &record);
    Ok(render_category_form(
        &state,
        "Edit category",
        content,
        StatusCode::OK,
    ))
}

pub(super) async fn admin_category_update(
    State(state): State<AdminState>,
    Path(raw_id): Path<String>,
    Form(payload): Form<CategoryPayload>,
) -> Result<Response, HttpError> {
    let id = parse_id("infra::http::admin::category_update", &raw_id)?;
    match state.taxonomy.update_category(id, payload.draft()).await {
        Ok(_) => Ok(Redirect::to("/categories").into_response()),
        Err(AdminTaxonomyError::Invalid(errors)) => {
            let content = admin_views::AdminCategoryFormView {
                action: format!("/categories/{id}/edit"),
                title: payload.title,
                description: payload.description,
                slug: payload.slug,
                is_published: payload.is_published.is_some(),
                errors,
            };
            Ok(render_category_form(
                &state,
                "Edit category",
                content,
                StatusCode::BAD_REQUEST,
            ))
        }
        Err(err) => Err(err.into()),
    }
}

pub(super) async fn admin_category_confirm_delete(
    State(state): State<AdminState>,
    Path(raw_id): Path<String>,
) -> Result<Response, HttpError> {
    let id = parse_id("infra::http::admin::category_confirm_delete", &raw_id)?;
    let record = state.taxonomy.category(id).await?;
    let content = admin_views::AdminConfirmDeleteView {
        subject: format!("category \"{}\"", record.title),
        action: format!("/categories/{id}/delete"),
        cancel_href: "/categories".to_string(),
    };
    Ok(render_confirm(&state, "Delete category", "/categories", content))
}

pub(super) async fn admin_category_delete(
    State(state): State<AdminState>,
    Path(raw_id): Path<String>,
) -> Result<Response, HttpError> {
    let id = parse_id("infra::http::admin::category_delete", &raw_id)?;
    state.taxonomy.delete_category(id).await?;
    Ok(Redirect::to("/categories").into_response())
}

pub(super) async fn admin_locations(
    State(state): State<AdminState>,
) -> Result<Response, HttpError> {
    let tz = state.site.timezone;
    let rows = state
        .taxonomy
        .list_locations()
        .await?
        .iter()
        .map(|record| admin_views::AdminLocationRowView::new(record, tz))
        .collect();
    let view =
        admin_views::AdminLayout::new(state.site.title.clone(), "Locations", "/locations", rows);
    Ok(render_template_response(
        admin_views::AdminLocationsTemplate { view },
        StatusCode::OK,
    ))
}

pub(super) async fn admin_location_new(State(state): State<AdminState>) -> Response {
    let content = admin_views::AdminLocationFormView::blank("/locations/new");
    render_location_form(&state, "New location", content, StatusCode::OK)
}

pub(super) async fn admin_location_create(
    State(state): State<AdminState>,
    Form(payload): Form<LocationPayload>,
) -> Result<Response, HttpError> {
    match state.taxonomy.create_location(payload.draft()).await {
        Ok(_) => Ok(Redirect::to("/locations").into_response()),
        Err(AdminTaxonomyError::Invalid(errors)) => {
            let content = admin_views::AdminLocationFormView {
                action: "/locations/new".to_string(),
                name: payload.name,
                is_published: payload.is_published.is_some(),
                errors,
            };
            Ok(render_location_form(
                &state,
                "New location",
                content,
                StatusCode::BAD_REQUEST,
            ))
        }
        Err(err) => Err(err.into()),
    }
}

pub(super) async fn admin_location_edit(
    State(state): State<AdminState>,
    Path(raw_id): Path<String>,
) -> Result<Response, HttpError> {
    let id = parse_id("infra::http::admin::location_edit", &raw_id)?;
    let record = state.taxonomy.location(id).await?;
    let content =
        admin_views::AdminLocationFormView::from_record(format!("/locations/{id}/edit"), &record);
    Ok(render_location_form(
        &state,
        "Edit location",
        content,
        StatusCode::OK,
    ))
}

pub(super) async fn admin_location_update(
    State(state): State<AdminState>,
    Path(raw_id): Path<String>,
    Form(payload): Form<LocationPayload>,
) -> Result<Response, HttpError> {
    let id = parse_id("infra::http::admin::location_update", &raw_id)?;
    match state.taxonomy.update_location(id, payload.draft()).await {
        Ok(_) => Ok(Redirect::to("/locations").into_response()),
        Err(AdminTaxonomyError::Invalid(errors)) => {
            let content = admin_views::AdminLocationFormView {
                action: format!("/locations/{id}/edit"),
                name: payload.name,
                is_published: payload.is_published.is_some(),
                errors,
            };
            Ok(render_location_form(
                &state,
                "Edit location",
                content,
                StatusCode::BAD_REQUEST,
            ))
        }
        Err(err) => Err(err.into()),
    }
}

pub(super) async fn admin_location_confirm_delete(
    State(state): State<AdminState>,
    Path(raw_id): Path<String>,
) -> Result<Response, HttpError> {
    let id = parse_id("infra::http::admin::location_confirm_delete", &raw_id)?;
    let record = state.taxonomy.location(id).await?;
    let content = admin_views::AdminConfirmDeleteView {
        subject: format!("location \"{}\"", record.name),
        action: format!("/locations/{id}/delete"),
        cancel_href: "/locations".to_string(),
    };
    Ok(render_confirm(&state, "Delete location", "/locations", content))
}

pub(super) async fn admin_location_delete(
    State(state): State<AdminState>,
    Path(raw_id): Path<String>,
) -> Result<Response, HttpError> {
    let id = parse_id("infra::http::admin::location_delete", &raw_id)?;
    state.taxonomy.delete_location(id).await?;
    Ok(Redirect::to("/locations").into_response())
}

fn render_category_form(
    state: &AdminState,
    heading: &str,
    content: admin_views::AdminCategoryFormView,
    status: StatusCode,
) -> Response {
    let view =
        admin_views::AdminLayout::new(state.site.title.clone(), heading, "/categories", content);
    render_template_response(admin_views::AdminCategoryFormTemplate { view }, status)
}

fn render_location_form(
    state: &AdminState,
    heading: &str,
    content: admin_views::AdminLocationFormView,
    status: StatusCode,
) -> Response {
    let view =
        admin_views::AdminLayout::new(state.site.title.clone(), heading, "/locations", content);
    render_template_response(admin_views::AdminLocationFormTemplate { view }, status)
}

fn render_confirm(
    state: &AdminState,
    heading: &str,
    active_path: &str,
    content: admin_views::AdminConfirmDeleteView,
) -> Response {
    let view = admin_views::AdminLayout::new(state.site.title.clone(), heading, active_path, content);
    render_template_response(admin_views::AdminConfirmDeleteTemplate { view }, StatusCode::OK)
}
