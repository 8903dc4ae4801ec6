//! Comment creation and author-only comment editing.

use std::sync::Arc;

use metrics::counter;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::info;

use crate::application::posts::OwnerOutcome;
use crate::application::repos::{CommentsRepo, CreateCommentParams, PostsRepo, RepoError};
use crate::domain::entities::CommentRecord;
use crate::domain::error::FieldErrors;
use crate::domain::posts::validate_comment_text;
use crate::domain::visibility::{Ownership, Viewer, can_view, ownership};

pub const METRIC_COMMENTS_CREATED_TOTAL: &str = "blogicum_comments_created_total";

#[derive(Debug, Error)]
pub enum CommentError {
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error("comment form is invalid")]
    Invalid(FieldErrors),
    #[error("comment or post not found")]
    NotFound,
}

#[derive(Clone)]
pub struct CommentService {
    posts: Arc<dyn PostsRepo>,
    comments: Arc<dyn CommentsRepo>,
}

impl CommentService {
    pub fn new(posts: Arc<dyn PostsRepo>, comments: Arc<dyn CommentsRepo>) -> Self {
        Self { posts, comments }
    }

    /// Attach a comment to `post_id` written by `author_id`.
    ///
    /// Both are taken from the request context, never from the submitted form.
    /// The post has to be visible to the author.
    pub async fn create(
        &self,
        author_id: i64,
        post_id: i64,
        text: &str,
    ) -> Result<CommentRecord, CommentError> {
        let post = self
            .posts
            .find_annotated(post_id)
            .await?
            .ok_or(CommentError::NotFound)?;
        if !can_view(
            Viewer::User(author_id),
            &post.post,
            post.category.as_ref(),
            OffsetDateTime::now_utc(),
        ) {
            return Err(CommentError::NotFound);
        }

        let text = validate_comment_text(text)
            .map_err(|err| CommentError::Invalid(FieldErrors::from(err)))?;
        let comment = self
            .comments
            .create_comment(CreateCommentParams {
                text,
                post_id: post.post.id,
                author_id,
            })
            .await?;

        counter!(METRIC_COMMENTS_CREATED_TOTAL).increment(1);
        info!(
            target = "blogicum::application::comments",
            comment_id = comment.id,
            post_id,
            author_id,
            "comment created"
        );
        Ok(comment)
    }

    pub async fn edit_form(
        &self,
        actor_id: i64,
        post_id: i64,
        comment_id: i64,
    ) -> Result<OwnerOutcome<CommentRecord>, CommentError> {
        self.owned_comment(actor_id, post_id, comment_id).await
    }

    pub async fn update(
        &self,
        actor_id: i64,
        post_id: i64,
        comment_id: i64,
        text: &str,
    ) -> Result<OwnerOutcome<CommentRecord>, CommentError> {
        let comment = match self.owned_comment(actor_id, post_id, comment_id).await? {
            OwnerOutcome::Permitted(comment) => comment,
            OwnerOutcome::Redirect(id) => return Ok(OwnerOutcome::Redirect(id)),
        };

        let text = validate_comment_text(text)
            .map_err(|err| CommentError::Invalid(FieldErrors::from(err)))?;
        let updated = self.comments.update_comment_text(comment.id, &text).await?;

        info!(
            target = "blogicum::application::comments",
            comment_id,
            post_id,
            "comment updated"
        );
        Ok(OwnerOutcome::Permitted(updated))
    }

    pub async fn delete_form(
        &self,
        actor_id: i64,
        post_id: i64,
        comment_id: i64,
    ) -> Result<OwnerOutcome<CommentRecord>, CommentError> {
        self.owned_comment(actor_id, post_id, comment_id).await
    }

    pub async fn delete(
        &self,
        actor_id: i64,
        post_id: i64,
        comment_id: i64,
    ) -> Result<OwnerOutcome<()>, CommentError> {
        let comment = match self.owned_comment(actor_id, post_id, comment_id).await? {
            OwnerOutcome::Permitted(comment) => comment,
            OwnerOutcome::Redirect(id) => return Ok(OwnerOutcome::Redirect(id)),
        };

        self.comments.delete_comment(comment.id).await?;
        info!(
            target = "blogicum::application::comments",
            comment_id,
            post_id,
            "comment deleted"
        );
        Ok(OwnerOutcome::Permitted(()))
    }

    /// A comment addressed through a different post is treated as missing.
    async fn owned_comment(
        &self,
        actor_id: i64,
        post_id: i64,
        comment_id: i64,
    ) -> Result<OwnerOutcome<CommentRecord>, CommentError> {
        let comment = self
            .comments
            .find_by_id(comment_id)
            .await?
            .filter(|comment| comment.post_id == post_id)
            .ok_or(CommentError::NotFound)?;

        match ownership(actor_id, comment.author_id) {
            Ownership::Owner => Ok(OwnerOutcome::Permitted(comment)),
            Ownership::NotOwner => Ok(OwnerOutcome::Redirect(post_id)),
        }
    }
}
