//! Read side of the blog: listings, profiles and post detail.

use std::sync::Arc;

use thiserror::Error;
use time::OffsetDateTime;

use crate::application::pagination::{PAGE_SIZE, PageSelector, PageWindow, Paginated, PaginationError};
use crate::application::repos::{
    CategoriesRepo, CommentsRepo, PostListScope, PostQueryFilter, PostsRepo, RepoError, UsersRepo,
};
use crate::domain::entities::{AnnotatedComment, AnnotatedPost, CategoryRecord, UserRecord};
use crate::domain::visibility::{PostScope, Viewer, can_view};

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error(transparent)]
    Pagination(#[from] PaginationError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone)]
pub struct CategoryFeed {
    pub category: CategoryRecord,
    pub posts: Paginated<AnnotatedPost>,
}

#[derive(Debug, Clone)]
pub struct ProfileFeed {
    pub profile: UserRecord,
    pub is_owner: bool,
    pub posts: Paginated<AnnotatedPost>,
}

#[derive(Debug, Clone)]
pub struct PostDetail {
    pub post: AnnotatedPost,
    pub comments: Vec<AnnotatedComment>,
    pub viewer_is_author: bool,
}

#[derive(Clone)]
pub struct FeedService {
    posts: Arc<dyn PostsRepo>,
    categories: Arc<dyn CategoriesRepo>,
    comments: Arc<dyn CommentsRepo>,
    users: Arc<dyn UsersRepo>,
}

impl FeedService {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        categories: Arc<dyn CategoriesRepo>,
        comments: Arc<dyn CommentsRepo>,
        users: Arc<dyn UsersRepo>,
    ) -> Self {
        Self {
            posts,
            categories,
            comments,
            users,
        }
    }

    pub async fn index(&self, page: PageSelector) -> Result<Paginated<AnnotatedPost>, FeedError> {
        let scope = PostListScope::Public {
            now: OffsetDateTime::now_utc(),
        };
        self.paginate(scope, PostQueryFilter::default(), page).await
    }

    pub async fn category(&self, slug: &str, page: PageSelector) -> Result<CategoryFeed, FeedError> {
        let category = self
            .categories
            .find_by_slug(slug)
            .await?
            .filter(|category| category.is_published)
            .ok_or(FeedError::NotFound("category"))?;

        let scope = PostListScope::Public {
            now: OffsetDateTime::now_utc(),
        };
        let filter = PostQueryFilter {
            category_slug: Some(category.slug.clone()),
            ..PostQueryFilter::default()
        };
        let posts = self.paginate(scope, filter, page).await?;
        Ok(CategoryFeed { category, posts })
    }

    /// The owner sees every post they wrote; everyone else sees the public ones.
    pub async fn profile(
        &self,
        username: &str,
        viewer: Viewer,
        page: PageSelector,
    ) -> Result<ProfileFeed, FeedError> {
        let profile = self
            .users
            .find_by_username(username)
            .await?
            .ok_or(FeedError::NotFound("user"))?;

        let scope = match PostScope::for_profile(viewer, profile.id) {
            PostScope::AuthorAll { .. } => PostListScope::Unrestricted,
            PostScope::Public => PostListScope::Public {
                now: OffsetDateTime::now_utc(),
            },
        };
        let filter = PostQueryFilter {
            author_id: Some(profile.id),
            ..PostQueryFilter::default()
        };
        let posts = self.paginate(scope, filter, page).await?;

        Ok(ProfileFeed {
            is_owner: viewer.is_user(profile.id),
            profile,
            posts,
        })
    }

    pub async fn post_detail(&self, id: i64, viewer: Viewer) -> Result<PostDetail, FeedError> {
        let post = self
            .posts
            .find_annotated(id)
            .await?
            .filter(|post| {
                can_view(
                    viewer,
                    &post.post,
                    post.category.as_ref(),
                    OffsetDateTime::now_utc(),
                )
            })
            .ok_or(FeedError::NotFound("post"))?;

        let comments = self.comments.list_for_post(id).await?;
        Ok(PostDetail {
            viewer_is_author: viewer.is_user(post.post.author_id),
            post,
            comments,
        })
    }

    async fn paginate(
        &self,
        scope: PostListScope,
        filter: PostQueryFilter,
        page: PageSelector,
    ) -> Result<Paginated<AnnotatedPost>, FeedError> {
        let total = self.posts.count_posts(scope, &filter).await?;
        let window = PageWindow::resolve(page, total, PAGE_SIZE)?;
        let items = self
            .posts
            .list_posts(scope, &filter, window.offset(), window.limit())
            .await?;
        Ok(Paginated::new(items, window))
    }
}
