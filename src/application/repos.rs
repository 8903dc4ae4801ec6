//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;

use crate::domain::entities::{
    AnnotatedComment, AnnotatedPost, CategoryRecord, CommentRecord, LocationRecord, PostRecord,
    SessionRecord, UserRecord,
};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Row-level restriction applied before any [`PostQueryFilter`] conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostListScope {
    /// Published posts in published categories with `pub_date <= now`.
    Public { now: OffsetDateTime },
    /// No visibility restriction. Used for an author's own profile and for moderation.
    Unrestricted,
}

#[derive(Debug, Clone, Default)]
pub struct PostQueryFilter {
    pub category_slug: Option<String>,
    pub author_id: Option<i64>,
    pub search: Option<String>,
    pub is_published: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct CreatePostParams {
    pub title: String,
    pub text: String,
    pub pub_date: OffsetDateTime,
    pub image: Option<String>,
    pub author_id: i64,
    pub location_id: Option<i64>,
    pub category_id: i64,
}

#[derive(Debug, Clone)]
pub struct UpdatePostParams {
    pub id: i64,
    pub title: String,
    pub text: String,
    pub pub_date: OffsetDateTime,
    pub image: Option<String>,
    pub location_id: Option<i64>,
    pub category_id: i64,
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    /// Posts ordered by `pub_date` descending, then id descending.
    async fn list_posts(
        &self,
        scope: PostListScope,
        filter: &PostQueryFilter,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<AnnotatedPost>, RepoError>;

    async fn count_posts(
        &self,
        scope: PostListScope,
        filter: &PostQueryFilter,
    ) -> Result<u64, RepoError>;

    async fn find_annotated(&self, id: i64) -> Result<Option<AnnotatedPost>, RepoError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<PostRecord>, RepoError>;
}

#[async_trait]
pub trait PostsWriteRepo: Send + Sync {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError>;

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError>;

    async fn set_post_published(&self, id: i64, is_published: bool)
    -> Result<PostRecord, RepoError>;

    /// Removes the post and, through the foreign key, its comments.
    async fn delete_post(&self, id: i64) -> Result<(), RepoError>;
}

#[derive(Debug, Clone)]
pub struct CreateCommentParams {
    pub text: String,
    pub post_id: i64,
    pub author_id: i64,
}

#[async_trait]
pub trait CommentsRepo: Send + Sync {
    /// Every comment of one post, ordered by `created_at` ascending. The publication
    /// flag is moderation data and does not filter this list.
    async fn list_for_post(&self, post_id: i64) -> Result<Vec<AnnotatedComment>, RepoError>;

    /// Every comment, newest first.
    async fn list_comments(
        &self,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<AnnotatedComment>, RepoError>;

    async fn count_comments(&self) -> Result<u64, RepoError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<CommentRecord>, RepoError>;

    async fn create_comment(&self, params: CreateCommentParams)
    -> Result<CommentRecord, RepoError>;

    async fn update_comment_text(&self, id: i64, text: &str) -> Result<CommentRecord, RepoError>;

    async fn set_comment_published(
        &self,
        id: i64,
        is_published: bool,
    ) -> Result<CommentRecord, RepoError>;

    async fn delete_comment(&self, id: i64) -> Result<(), RepoError>;
}

#[derive(Debug, Clone)]
pub struct CategoryParams {
    pub title: String,
    pub description: String,
    pub slug: String,
    pub is_published: bool,
}

#[async_trait]
pub trait CategoriesRepo: Send + Sync {
    /// All categories ordered by title.
    async fn list_categories(&self) -> Result<Vec<CategoryRecord>, RepoError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<CategoryRecord>, RepoError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<CategoryRecord>, RepoError>;

    async fn create_category(&self, params: CategoryParams) -> Result<CategoryRecord, RepoError>;

    async fn update_category(
        &self,
        id: i64,
        params: CategoryParams,
    ) -> Result<CategoryRecord, RepoError>;

    /// Posts filed under the category keep existing with no category.
    async fn delete_category(&self, id: i64) -> Result<(), RepoError>;
}

#[derive(Debug, Clone)]
pub struct LocationParams {
    pub name: String,
    pub is_published: bool,
}

#[async_trait]
pub trait LocationsRepo: Send + Sync {
    /// All locations ordered by name.
    async fn list_locations(&self) -> Result<Vec<LocationRecord>, RepoError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<LocationRecord>, RepoError>;

    async fn create_location(&self, params: LocationParams) -> Result<LocationRecord, RepoError>;

    async fn update_location(
        &self,
        id: i64,
        params: LocationParams,
    ) -> Result<LocationRecord, RepoError>;

    async fn delete_location(&self, id: i64) -> Result<(), RepoError>;
}

#[derive(Debug, Clone)]
pub struct CreateUserParams {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct UpdateProfileParams {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[async_trait]
pub trait UsersRepo: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<UserRecord>, RepoError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, RepoError>;

    async fn create_user(&self, params: CreateUserParams) -> Result<UserRecord, RepoError>;

    async fn update_profile(&self, params: UpdateProfileParams) -> Result<UserRecord, RepoError>;
}

#[derive(Debug, Clone)]
pub struct CreateSessionParams {
    pub user_id: i64,
    pub prefix: String,
    pub hashed_secret: Vec<u8>,
    pub expires_at: OffsetDateTime,
}

#[async_trait]
pub trait SessionsRepo: Send + Sync {
    async fn create_session(&self, params: CreateSessionParams)
    -> Result<SessionRecord, RepoError>;

    async fn find_by_prefix(&self, prefix: &str) -> Result<Option<SessionRecord>, RepoError>;

    async fn delete_session(&self, id: i64) -> Result<(), RepoError>;

    /// Returns the number of removed sessions.
    async fn delete_expired(&self, now: OffsetDateTime) -> Result<u64, RepoError>;
}

#[async_trait]
pub trait HealthRepo: Send + Sync {
    async fn health_check(&self) -> Result<(), RepoError>;
}
