//! Author-only post pages: create, edit and delete.

use axum::{
    extract::{Multipart, Path, State, multipart::MultipartError},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use chrono_tz::Tz;
use time::OffsetDateTime;

use crate::{
    application::{
        error::HttpError,
        posts::{ImageUpload, OwnerOutcome, PostError, PostForm},
    },
    domain::{
        entities::{PostRecord, UserRecord},
        error::FieldErrors,
        posts::PostInput,
    },
    presentation::views::{
        LayoutContext, PostFormTemplate, PostFormValues, PostFormView, render_template_response,
    },
    util::timezone,
};

use super::{HttpState, RequireUser, parse_id};

const CLEAR_IMAGE_FIELD: &str = "image-clear";

struct PostFormPage {
    heading: &'static str,
    action: String,
    submit_label: &'static str,
    read_only: bool,
}

pub(super) async fn create_form(
    State(state): State<HttpState>,
    RequireUser(user): RequireUser,
) -> Result<Response, HttpError> {
    let values = PostFormValues {
        pub_date: timezone::format_input(OffsetDateTime::now_utc(), state.site.timezone),
        ..PostFormValues::default()
    };
    render_form(&state, &user, create_page(), values, None, FieldErrors::new()).await
}

pub(super) async fn create(
    State(state): State<HttpState>,
    RequireUser(user): RequireUser,
    multipart: Multipart,
) -> Result<Response, HttpError> {
    const SOURCE: &str = "infra::http::posts::create";

    let (values, form) = read_post_form(multipart, state.site.timezone)
        .await
        .map_err(|err| bad_multipart(SOURCE, &err))?;

    match state.posts.create(user.id, form).await {
        Ok(_) => Ok(profile_redirect(&user.username)),
        Err(PostError::Invalid(errors)) => {
            render_form(&state, &user, create_page(), values, None, errors).await
        }
        Err(err) => Err(err.into()),
    }
}

pub(super) async fn edit_form(
    State(state): State<HttpState>,
    RequireUser(user): RequireUser,
    Path(raw_id): Path<String>,
) -> Result<Response, HttpError> {
    let id = parse_id("infra::http::posts::edit_form", &raw_id)?;
    match state.posts.edit_form(user.id, id).await? {
        OwnerOutcome::Permitted(post) => {
            let values = values_from_record(&post, state.site.timezone);
            let image = post.image.clone();
            render_form(&state, &user, edit_page(id), values, image.as_deref(), FieldErrors::new())
                .await
        }
        OwnerOutcome::Redirect(post_id) => Ok(detail_redirect(post_id)),
    }
}

pub(super) async fn update(
    State(state): State<HttpState>,
    RequireUser(user): RequireUser,
    Path(raw_id): Path<String>,
    multipart: Multipart,
) -> Result<Response, HttpError> {
    const SOURCE: &str = "infra::http::posts::update";

    let id = parse_id(SOURCE, &raw_id)?;
    let (values, form) = read_post_form(multipart, state.site.timezone)
        .await
        .map_err(|err| bad_multipart(SOURCE, &err))?;

    match state.posts.update(user.id, id, form).await {
        Ok(OwnerOutcome::Permitted(post)) => Ok(detail_redirect(post.id)),
        Ok(OwnerOutcome::Redirect(post_id)) => Ok(detail_redirect(post_id)),
        Err(PostError::Invalid(errors)) => {
            let current = match state.posts.edit_form(user.id, id).await? {
                OwnerOutcome::Permitted(post) => post.image,
                OwnerOutcome::Redirect(post_id) => return Ok(detail_redirect(post_id)),
            };
            render_form(&state, &user, edit_page(id), values, current.as_deref(), errors).await
        }
        Err(err) => Err(err.into()),
    }
}

/// The confirmation page shows the post form read-only.
pub(super) async fn delete_form(
    State(state): State<HttpState>,
    RequireUser(user): RequireUser,
    Path(raw_id): Path<String>,
) -> Result<Response, HttpError> {
    let id = parse_id("infra::http::posts::delete_form", &raw_id)?;
    match state.posts.delete_form(user.id, id).await? {
        OwnerOutcome::Permitted(post) => {
            let values = values_from_record(&post, state.site.timezone);
            let page = PostFormPage {
                heading: "Delete post",
                action: format!("/posts/{id}/delete/"),
                submit_label: "Delete",
                read_only: true,
            };
            render_form(&state, &user, page, values, post.image.as_deref(), FieldErrors::new())
                .await
        }
        OwnerOutcome::Redirect(post_id) => Ok(detail_redirect(post_id)),
    }
}

pub(super) async fn delete(
    State(state): State<HttpState>,
    RequireUser(user): RequireUser,
    Path(raw_id): Path<String>,
) -> Result<Response, HttpError> {
    let id = parse_id("infra::http::posts::delete", &raw_id)?;
    match state.posts.delete(user.id, id).await? {
        OwnerOutcome::Permitted(()) => Ok(profile_redirect(&user.username)),
        OwnerOutcome::Redirect(post_id) => Ok(detail_redirect(post_id)),
    }
}

fn create_page() -> PostFormPage {
    PostFormPage {
        heading: "New post",
        action: "/posts/create/".to_string(),
        submit_label: "Publish",
        read_only: false,
    }
}

fn edit_page(id: i64) -> PostFormPage {
    PostFormPage {
        heading: "Edit post",
        action: format!("/posts/{id}/edit/"),
        submit_label: "Save",
        read_only: false,
    }
}

async fn render_form(
    state: &HttpState,
    user: &UserRecord,
    page: PostFormPage,
    values: PostFormValues,
    current_image: Option<&str>,
    errors: FieldErrors,
) -> Result<Response, HttpError> {
    let choices = state.posts.form_choices().await?;
    let content = PostFormView::new(
        page.heading,
        page.action,
        page.submit_label,
        page.read_only,
        values,
        current_image,
        &choices.categories,
        &choices.locations,
        errors,
    );
    let view = LayoutContext::new(state.site.chrome(Some(user)), page.heading, content);
    Ok(render_template_response(PostFormTemplate { view }, StatusCode::OK))
}

fn values_from_record(post: &PostRecord, tz: Tz) -> PostFormValues {
    PostFormValues {
        title: post.title.clone(),
        text: post.text.clone(),
        pub_date: timezone::format_input(post.pub_date, tz),
        category: post.category_id.map(|id| id.to_string()).unwrap_or_default(),
        location: post.location_id.map(|id| id.to_string()).unwrap_or_default(),
    }
}

/// Decode the multipart post form into echo values and the typed form.
async fn read_post_form(
    mut multipart: Multipart,
    tz: Tz,
) -> Result<(PostFormValues, PostForm), MultipartError> {
    let mut values = PostFormValues::default();
    let mut image = None;
    let mut clear_image = false;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await?;
                if !filename.is_empty() && !data.is_empty() {
                    image = Some(ImageUpload { filename, data });
                }
            }
            CLEAR_IMAGE_FIELD => {
                clear_image = !field.text().await?.is_empty();
            }
            "title" => values.title = field.text().await?,
            "text" => values.text = field.text().await?,
            "pub_date" => values.pub_date = field.text().await?,
            "category" => values.category = field.text().await?,
            "location" => values.location = field.text().await?,
            _ => {}
        }
    }

    let input = PostInput {
        title: values.title.clone(),
        text: values.text.clone(),
        pub_date: timezone::parse_input(&values.pub_date, tz),
        category_id: parse_choice(&values.category),
        location_id: parse_choice(&values.location),
    };
    Ok((
        values,
        PostForm {
            input,
            image,
            clear_image,
        },
    ))
}

fn parse_choice(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}

fn bad_multipart(source: &'static str, err: &MultipartError) -> HttpError {
    HttpError::new(
        source,
        err.status(),
        "Invalid form submission",
        err.body_text(),
    )
}

fn profile_redirect(username: &str) -> Response {
    Redirect::to(&format!("/profile/{username}/")).into_response()
}

pub(super) fn detail_redirect(post_id: i64) -> Response {
    Redirect::to(&format!("/posts/{post_id}/")).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn choices_parse_ids_only() {
        assert_eq!(parse_choice(" 7 "), Some(7));
        assert_eq!(parse_choice(""), None);
        assert_eq!(parse_choice("seven"), None);
    }

    #[test]
    fn record_values_use_site_timezone() {
        let post = PostRecord {
            id: 1,
            title: "T".into(),
            text: "body".into(),
            pub_date: time::macros::datetime!(2024-05-01 12:00 UTC),
            image: None,
            author_id: 1,
            location_id: None,
            category_id: Some(3),
            is_published: true,
            created_at: time::macros::datetime!(2024-05-01 12:00 UTC),
        };
        let values = values_from_record(&post, chrono_tz::Europe::Moscow);
        assert_eq!(values.pub_date, "2024-05-01T15:00");
        assert_eq!(values.category, "3");
        assert_eq!(values.location, "");
    }
}
