//! Creating, editing and deleting posts on behalf of their authors.

use std::sync::Arc;

use bytes::Bytes;
use metrics::counter;
use thiserror::Error;
use tracing::{info, warn};

use crate::application::repos::{
    CategoriesRepo, CreatePostParams, LocationsRepo, PostsRepo, PostsWriteRepo, RepoError,
    UpdatePostParams,
};
use crate::domain::entities::{CategoryRecord, LocationRecord, PostRecord};
use crate::domain::error::FieldErrors;
use crate::domain::posts::{PostDraft, PostInput};
use crate::domain::visibility::{Ownership, ownership};
use crate::infra::uploads::{UploadStorage, UploadStorageError, inspect_image};

pub const METRIC_POSTS_CREATED_TOTAL: &str = "blogicum_posts_created_total";

const INVALID_CHOICE: &str = "Select a valid choice. That choice is not one of the available choices.";
const INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";

/// Result of an action that only the author of a post or comment may perform.
#[derive(Debug, Clone, PartialEq)]
pub enum OwnerOutcome<T> {
    Permitted(T),
    /// The actor is not the author; send them to the detail page of this post.
    Redirect(i64),
}

impl<T> OwnerOutcome<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> OwnerOutcome<U> {
        match self {
            OwnerOutcome::Permitted(value) => OwnerOutcome::Permitted(f(value)),
            OwnerOutcome::Redirect(post_id) => OwnerOutcome::Redirect(post_id),
        }
    }
}

#[derive(Debug, Error)]
pub enum PostError {
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    Storage(#[from] UploadStorageError),
    #[error("post form is invalid")]
    Invalid(FieldErrors),
    #[error("post not found")]
    NotFound,
}

#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub data: Bytes,
}

/// A submitted post form.
#[derive(Debug, Clone, Default)]
pub struct PostForm {
    pub input: PostInput,
    pub image: Option<ImageUpload>,
    pub clear_image: bool,
}

/// Categories and locations offered by the post form.
#[derive(Debug, Clone, Default)]
pub struct PostFormChoices {
    pub categories: Vec<CategoryRecord>,
    pub locations: Vec<LocationRecord>,
}

#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostsRepo>,
    writer: Arc<dyn PostsWriteRepo>,
    categories: Arc<dyn CategoriesRepo>,
    locations: Arc<dyn LocationsRepo>,
    uploads: Arc<UploadStorage>,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        writer: Arc<dyn PostsWriteRepo>,
        categories: Arc<dyn CategoriesRepo>,
        locations: Arc<dyn LocationsRepo>,
        uploads: Arc<UploadStorage>,
    ) -> Self {
        Self {
            posts,
            writer,
            categories,
            locations,
            uploads,
        }
    }

    pub async fn form_choices(&self) -> Result<PostFormChoices, PostError> {
        Ok(PostFormChoices {
            categories: self.categories.list_categories().await?,
            locations: self.locations.list_locations().await?,
        })
    }

    /// Create a post authored by `author_id`. New posts are published.
    pub async fn create(&self, author_id: i64, form: PostForm) -> Result<PostRecord, PostError> {
        let draft = self.validate(&form).await?;
        let image = self.store_image(form.image).await?;

        let post = self
            .writer
            .create_post(CreatePostParams {
                title: draft.title,
                text: draft.text,
                pub_date: draft.pub_date,
                image,
                author_id,
                location_id: draft.location_id,
                category_id: draft.category_id,
            })
            .await?;

        counter!(METRIC_POSTS_CREATED_TOTAL).increment(1);
        info!(
            target = "blogicum::application::posts",
            post_id = post.id,
            author_id,
            "post created"
        );
        Ok(post)
    }

    pub async fn edit_form(
        &self,
        actor_id: i64,
        post_id: i64,
    ) -> Result<OwnerOutcome<PostRecord>, PostError> {
        self.owned_post(actor_id, post_id).await
    }

    pub async fn update(
        &self,
        actor_id: i64,
        post_id: i64,
        form: PostForm,
    ) -> Result<OwnerOutcome<PostRecord>, PostError> {
        let current = match self.owned_post(actor_id, post_id).await? {
            OwnerOutcome::Permitted(post) => post,
            OwnerOutcome::Redirect(id) => return Ok(OwnerOutcome::Redirect(id)),
        };

        let draft = self.validate(&form).await?;
        let replaced = form.image.is_some() || form.clear_image;
        let image = match self.store_image(form.image).await? {
            Some(path) => Some(path),
            None if form.clear_image => None,
            None => current.image.clone(),
        };

        let updated = self
            .writer
            .update_post(UpdatePostParams {
                id: current.id,
                title: draft.title,
                text: draft.text,
                pub_date: draft.pub_date,
                image,
                location_id: draft.location_id,
                category_id: draft.category_id,
            })
            .await?;

        if replaced && let Some(previous) = current.image.as_deref() {
            self.remove_image(post_id, previous).await;
        }

        info!(
            target = "blogicum::application::posts",
            post_id,
            "post updated"
        );
        Ok(OwnerOutcome::Permitted(updated))
    }

    pub async fn delete_form(
        &self,
        actor_id: i64,
        post_id: i64,
    ) -> Result<OwnerOutcome<PostRecord>, PostError> {
        self.owned_post(actor_id, post_id).await
    }

    /// Delete the post, its comments and its stored image.
    pub async fn delete(
        &self,
        actor_id: i64,
        post_id: i64,
    ) -> Result<OwnerOutcome<()>, PostError> {
        let post = match self.owned_post(actor_id, post_id).await? {
            OwnerOutcome::Permitted(post) => post,
            OwnerOutcome::Redirect(id) => return Ok(OwnerOutcome::Redirect(id)),
        };

        self.writer.delete_post(post.id).await?;
        if let Some(image) = post.image.as_deref() {
            self.remove_image(post.id, image).await;
        }

        info!(
            target = "blogicum::application::posts",
            post_id,
            "post deleted"
        );
        Ok(OwnerOutcome::Permitted(()))
    }

    async fn owned_post(
        &self,
        actor_id: i64,
        post_id: i64,
    ) -> Result<OwnerOutcome<PostRecord>, PostError> {
        let post = self
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or(PostError::NotFound)?;

        match ownership(actor_id, post.author_id) {
            Ownership::Owner => Ok(OwnerOutcome::Permitted(post)),
            Ownership::NotOwner => Ok(OwnerOutcome::Redirect(post.id)),
        }
    }

    async fn validate(&self, form: &PostForm) -> Result<PostDraft, PostError> {
        let validated = form.input.clone().validate();
        let mut errors = validated.as_ref().err().cloned().unwrap_or_default();

        if let Some(category_id) = form.input.category_id
            && self.categories.find_by_id(category_id).await?.is_none()
        {
            errors.push("category", INVALID_CHOICE);
        }
        if let Some(location_id) = form.input.location_id
            && self.locations.find_by_id(location_id).await?.is_none()
        {
            errors.push("location", INVALID_CHOICE);
        }
        self.check_image(form, &mut errors);

        match validated {
            Ok(draft) if errors.is_empty() => Ok(draft),
            _ => Err(PostError::Invalid(errors)),
        }
    }

    fn check_image(&self, form: &PostForm, errors: &mut FieldErrors) {
        if let Some(upload) = form.image.as_ref()
            && inspect_image(&upload.data).is_err()
        {
            errors.push("image", INVALID_IMAGE);
        }
    }

    async fn store_image(&self, upload: Option<ImageUpload>) -> Result<Option<String>, PostError> {
        let Some(upload) = upload else {
            return Ok(None);
        };
        let stored = self
            .uploads
            .store_image(&upload.filename, upload.data)
            .await?;
        Ok(Some(stored.stored_path))
    }

    async fn remove_image(&self, post_id: i64, stored_path: &str) {
        if let Err(err) = self.uploads.delete(stored_path).await {
            warn!(
                target = "blogicum::application::posts",
                post_id,
                stored_path,
                error = %err,
                "failed to remove post image"
            );
        }
    }
}
