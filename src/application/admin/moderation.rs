//! Moderation of posts and comments for the admin listener.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::application::pagination::{PAGE_SIZE, PageSelector, PageWindow, Paginated, PaginationError};
use crate::application::repos::{
    CommentsRepo, PostListScope, PostQueryFilter, PostsRepo, PostsWriteRepo, RepoError,
};
use crate::domain::entities::{AnnotatedComment, AnnotatedPost, CommentRecord, PostRecord};
use crate::infra::uploads::UploadStorage;

#[derive(Debug, Error)]
pub enum ModerationError {
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    Pagination(#[from] PaginationError),
    #[error("record not found")]
    NotFound,
}

/// Filters offered by the admin post list.
#[derive(Debug, Clone, Default)]
pub struct AdminPostFilter {
    pub search: Option<String>,
    pub is_published: Option<bool>,
}

#[derive(Clone)]
pub struct ModerationService {
    posts: Arc<dyn PostsRepo>,
    writer: Arc<dyn PostsWriteRepo>,
    comments: Arc<dyn CommentsRepo>,
    uploads: Arc<UploadStorage>,
}

impl ModerationService {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        writer: Arc<dyn PostsWriteRepo>,
        comments: Arc<dyn CommentsRepo>,
        uploads: Arc<UploadStorage>,
    ) -> Self {
        Self {
            posts,
            writer,
            comments,
            uploads,
        }
    }

    pub async fn list_posts(
        &self,
        filter: &AdminPostFilter,
        page: PageSelector,
    ) -> Result<Paginated<AnnotatedPost>, ModerationError> {
        let query = PostQueryFilter {
            search: filter
                .search
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string),
            is_published: filter.is_published,
            ..PostQueryFilter::default()
        };
        let total = self
            .posts
            .count_posts(PostListScope::Unrestricted, &query)
            .await?;
        let window = PageWindow::resolve(page, total, PAGE_SIZE)?;
        let items = self
            .posts
            .list_posts(
                PostListScope::Unrestricted,
                &query,
                window.offset(),
                window.limit(),
            )
            .await?;
        Ok(Paginated::new(items, window))
    }

    pub async fn toggle_post(&self, id: i64) -> Result<PostRecord, ModerationError> {
        let post = self
            .posts
            .find_by_id(id)
            .await?
            .ok_or(ModerationError::NotFound)?;
        let updated = self
            .writer
            .set_post_published(id, !post.is_published)
            .await?;
        info!(
            target = "blogicum::application::admin::moderation",
            post_id = id,
            is_published = updated.is_published,
            "post publication toggled"
        );
        Ok(updated)
    }

    pub async fn delete_post(&self, id: i64) -> Result<(), ModerationError> {
        let post = self
            .posts
            .find_by_id(id)
            .await?
            .ok_or(ModerationError::NotFound)?;
        self.writer.delete_post(id).await?;
        if let Some(image) = post.image.as_deref()
            && let Err(err) = self.uploads.delete(image).await
        {
            warn!(
                target = "blogicum::application::admin::moderation",
                post_id = id,
                error = %err,
                "failed to remove post image"
            );
        }
        info!(
            target = "blogicum::application::admin::moderation",
            post_id = id,
            "post deleted"
        );
        Ok(())
    }

    pub async fn list_comments(
        &self,
        page: PageSelector,
    ) -> Result<Paginated<AnnotatedComment>, ModerationError> {
        let total = self.comments.count_comments().await?;
        let window = PageWindow::resolve(page, total, PAGE_SIZE)?;
        let items = self
            .comments
            .list_comments(window.offset(), window.limit())
            .await?;
        Ok(Paginated::new(items, window))
    }

    pub async fn toggle_comment(&self, id: i64) -> Result<CommentRecord, ModerationError> {
        let comment = self
            .comments
            .find_by_id(id)
            .await?
            .ok_or(ModerationError::NotFound)?;
        let updated = self
            .comments
            .set_comment_published(id, !comment.is_published)
            .await?;
        info!(
            target = "blogicum::application::admin::moderation",
            comment_id = id,
            is_published = updated.is_published,
            "comment publication toggled"
        );
        Ok(updated)
    }

    pub async fn delete_comment(&self, id: i64) -> Result<(), ModerationError> {
        self.comments
            .find_by_id(id)
            .await?
            .ok_or(ModerationError::NotFound)?;
        self.comments.delete_comment(id).await?;
        info!(
            target = "blogicum::application::admin::moderation",
            comment_id = id,
            "comment deleted"
        );
        Ok(())
    }
}
