#![allow(dead_code)]

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, Response, header},
};
use http_body_util::BodyExt;
use sha2::{Digest, Sha256};
use tempfile::TempDir;
use time::{Duration, OffsetDateTime};
use tower::ServiceExt;

use blogicum::application::accounts::AccountService;
use blogicum::application::admin::{AdminTaxonomyService, ModerationService};
use blogicum::application::comments::CommentService;
use blogicum::application::feed::FeedService;
use blogicum::application::posts::PostService;
use blogicum::application::repos::{
    CategoriesRepo, CategoryParams, CommentsRepo, CreateCommentParams, CreatePostParams,
    CreateSessionParams, CreateUserParams, HealthRepo, LocationParams, LocationsRepo,
    PostListScope, PostQueryFilter, PostsRepo, PostsWriteRepo, RepoError, SessionsRepo,
    UpdatePostParams, UpdateProfileParams, UsersRepo,
};
use blogicum::domain::entities::{
    AnnotatedComment, AnnotatedPost, AuthorRef, CategoryRecord, CategoryRef, CommentRecord,
    LocationRecord, LocationRef, PostRecord, SessionRecord, UserRecord,
};
use blogicum::domain::visibility::is_publicly_visible;
use blogicum::infra::http::{
    AdminState, HttpState, SESSION_COOKIE, SiteContext, build_admin_router, build_router,
};
use blogicum::infra::uploads::UploadStorage;

pub const UPLOAD_LIMIT: usize = 2 * 1024 * 1024;

#[derive(Default)]
struct State {
    next_id: i64,
    users: Vec<UserRecord>,
    sessions: Vec<SessionRecord>,
    categories: Vec<CategoryRecord>,
    locations: Vec<LocationRecord>,
    posts: Vec<PostRecord>,
    comments: Vec<CommentRecord>,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn annotate(&self, post: &PostRecord) -> Option<AnnotatedPost> {
        let author = self.users.iter().find(|user| user.id == post.author_id)?;
        let category = post
            .category_id
            .and_then(|id| self.categories.iter().find(|category| category.id == id))
            .map(|category| CategoryRef {
                id: category.id,
                title: category.title.clone(),
                slug: category.slug.clone(),
                is_published: category.is_published,
            });
        let location = post
            .location_id
            .and_then(|id| self.locations.iter().find(|location| location.id == id))
            .map(|location| LocationRef {
                id: location.id,
                name: location.name.clone(),
                is_published: location.is_published,
            });
        let comment_count = self
            .comments
            .iter()
            .filter(|comment| comment.post_id == post.id)
            .count() as u64;

        Some(AnnotatedPost {
            post: post.clone(),
            author: AuthorRef {
                id: author.id,
                username: author.username.clone(),
            },
            category,
            location,
            comment_count,
        })
    }

    fn annotate_comment(&self, comment: &CommentRecord) -> Option<AnnotatedComment> {
        let author = self.users.iter().find(|user| user.id == comment.author_id)?;
        Some(AnnotatedComment {
            comment: comment.clone(),
            author: AuthorRef {
                id: author.id,
                username: author.username.clone(),
            },
        })
    }

    fn matching_posts(&self, scope: PostListScope, filter: &PostQueryFilter) -> Vec<AnnotatedPost> {
        let mut posts: Vec<AnnotatedPost> = self
            .posts
            .iter()
            .filter_map(|post| self.annotate(post))
            .filter(|annotated| match scope {
                PostListScope::Public { now } => {
                    is_publicly_visible(&annotated.post, annotated.category.as_ref(), now)
                }
                PostListScope::Unrestricted => true,
            })
            .filter(|annotated| {
                filter.category_slug.as_ref().is_none_or(|slug| {
                    annotated
                        .category
                        .as_ref()
                        .is_some_and(|category| &category.slug == slug)
                })
            })
            .filter(|annotated| {
                filter
                    .author_id
                    .is_none_or(|author_id| annotated.post.author_id == author_id)
            })
            .filter(|annotated| {
                filter.search.as_ref().is_none_or(|needle| {
                    annotated
                        .post
                        .title
                        .to_lowercase()
                        .contains(&needle.to_lowercase())
                })
            })
            .filter(|annotated| {
                filter
                    .is_published
                    .is_none_or(|flag| annotated.post.is_published == flag)
            })
            .collect();
        posts.sort_by(|a, b| {
            b.post
                .pub_date
                .cmp(&a.post.pub_date)
                .then(b.post.id.cmp(&a.post.id))
        });
        posts
    }
}

/// Repository fake covering every persistence trait of the application.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("store lock")
    }

    pub fn add_user(&self, username: &str) -> UserRecord {
        let mut state = self.lock();
        let user = UserRecord {
            id: state.next_id(),
            username: username.to_string(),
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            password_hash: String::new(),
            created_at: OffsetDateTime::now_utc(),
        };
        state.users.push(user.clone());
        user
    }

    pub fn add_category(&self, slug: &str, is_published: bool) -> CategoryRecord {
        let mut state = self.lock();
        let category = CategoryRecord {
            id: state.next_id(),
            title: format!("Category {slug}"),
            description: format!("About {slug}"),
            slug: slug.to_string(),
            is_published,
            created_at: OffsetDateTime::now_utc(),
        };
        state.categories.push(category.clone());
        category
    }

    pub fn add_location(&self, name: &str, is_published: bool) -> LocationRecord {
        let mut state = self.lock();
        let location = LocationRecord {
            id: state.next_id(),
            name: name.to_string(),
            is_published,
            created_at: OffsetDateTime::now_utc(),
        };
        state.locations.push(location.clone());
        location
    }

    pub fn add_post(&self, seed: PostSeed) -> PostRecord {
        let mut state = self.lock();
        let post = PostRecord {
            id: state.next_id(),
            title: seed.title,
            text: seed.text,
            pub_date: seed.pub_date,
            image: None,
            author_id: seed.author_id,
            location_id: seed.location_id,
            category_id: seed.category_id,
            is_published: seed.is_published,
            created_at: OffsetDateTime::now_utc(),
        };
        state.posts.push(post.clone());
        post
    }

    pub fn add_comment(&self, post_id: i64, author_id: i64, text: &str) -> CommentRecord {
        let mut state = self.lock();
        let comment = CommentRecord {
            id: state.next_id(),
            text: text.to_string(),
            post_id,
            author_id,
            is_published: true,
            created_at: OffsetDateTime::now_utc(),
        };
        state.comments.push(comment.clone());
        comment
    }

    pub fn post(&self, id: i64) -> Option<PostRecord> {
        self.lock().posts.iter().find(|post| post.id == id).cloned()
    }

    pub fn comment(&self, id: i64) -> Option<CommentRecord> {
        self.lock()
            .comments
            .iter()
            .find(|comment| comment.id == id)
            .cloned()
    }

    pub fn comments_of(&self, post_id: i64) -> Vec<CommentRecord> {
        self.lock()
            .comments
            .iter()
            .filter(|comment| comment.post_id == post_id)
            .cloned()
            .collect()
    }

    pub fn posts(&self) -> Vec<PostRecord> {
        self.lock().posts.clone()
    }

    pub fn category(&self, id: i64) -> Option<CategoryRecord> {
        self.lock()
            .categories
            .iter()
            .find(|category| category.id == id)
            .cloned()
    }

    pub fn categories(&self) -> Vec<CategoryRecord> {
        self.lock().categories.clone()
    }

    pub fn session_count(&self) -> usize {
        self.lock().sessions.len()
    }

    /// Mint a session token directly, skipping password verification.
    pub fn issue_session(&self, user_id: i64, expires_at: OffsetDateTime) -> String {
        let mut state = self.lock();
        let id = state.next_id();
        let prefix = format!("test{id:08}");
        let secret = format!("{:0>48}", id);
        let hashed_secret = Sha256::digest(secret.as_bytes()).to_vec();
        state.sessions.push(SessionRecord {
            id,
            user_id,
            prefix: prefix.clone(),
            hashed_secret,
            expires_at,
            created_at: OffsetDateTime::now_utc(),
        });
        format!("ss_{prefix}_{secret}")
    }
}

#[async_trait]
impl PostsRepo for MemoryStore {
    async fn list_posts(
        &self,
        scope: PostListScope,
        filter: &PostQueryFilter,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<AnnotatedPost>, RepoError> {
        Ok(self
            .lock()
            .matching_posts(scope, filter)
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count_posts(
        &self,
        scope: PostListScope,
        filter: &PostQueryFilter,
    ) -> Result<u64, RepoError> {
        Ok(self.lock().matching_posts(scope, filter).len() as u64)
    }

    async fn find_annotated(&self, id: i64) -> Result<Option<AnnotatedPost>, RepoError> {
        let state = self.lock();
        Ok(state
            .posts
            .iter()
            .find(|post| post.id == id)
            .and_then(|post| state.annotate(post)))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<PostRecord>, RepoError> {
        Ok(self.post(id))
    }
}

#[async_trait]
impl PostsWriteRepo for MemoryStore {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let mut state = self.lock();
        let post = PostRecord {
            id: state.next_id(),
            title: params.title,
            text: params.text,
            pub_date: params.pub_date,
            image: params.image,
            author_id: params.author_id,
            location_id: params.location_id,
            category_id: Some(params.category_id),
            is_published: true,
            created_at: OffsetDateTime::now_utc(),
        };
        state.posts.push(post.clone());
        Ok(post)
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        let mut state = self.lock();
        let post = state
            .posts
            .iter_mut()
            .find(|post| post.id == params.id)
            .ok_or(RepoError::NotFound)?;
        post.title = params.title;
        post.text = params.text;
        post.pub_date = params.pub_date;
        post.image = params.image;
        post.location_id = params.location_id;
        post.category_id = Some(params.category_id);
        Ok(post.clone())
    }

    async fn set_post_published(
        &self,
        id: i64,
        is_published: bool,
    ) -> Result<PostRecord, RepoError> {
        let mut state = self.lock();
        let post = state
            .posts
            .iter_mut()
            .find(|post| post.id == id)
            .ok_or(RepoError::NotFound)?;
        post.is_published = is_published;
        Ok(post.clone())
    }

    async fn delete_post(&self, id: i64) -> Result<(), RepoError> {
        let mut state = self.lock();
        state.posts.retain(|post| post.id != id);
        state.comments.retain(|comment| comment.post_id != id);
        Ok(())
    }
}

#[async_trait]
impl CommentsRepo for MemoryStore {
    async fn list_for_post(&self, post_id: i64) -> Result<Vec<AnnotatedComment>, RepoError> {
        let state = self.lock();
        let mut comments: Vec<AnnotatedComment> = state
            .comments
            .iter()
            .filter(|comment| comment.post_id == post_id)
            .filter_map(|comment| state.annotate_comment(comment))
            .collect();
        comments.sort_by_key(|annotated| (annotated.comment.created_at, annotated.comment.id));
        Ok(comments)
    }

    async fn list_comments(
        &self,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<AnnotatedComment>, RepoError> {
        let state = self.lock();
        let mut comments: Vec<AnnotatedComment> = state
            .comments
            .iter()
            .filter_map(|comment| state.annotate_comment(comment))
            .collect();
        comments.sort_by(|a, b| {
            b.comment
                .created_at
                .cmp(&a.comment.created_at)
                .then(b.comment.id.cmp(&a.comment.id))
        });
        Ok(comments
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count_comments(&self) -> Result<u64, RepoError> {
        Ok(self.lock().comments.len() as u64)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<CommentRecord>, RepoError> {
        Ok(self.comment(id))
    }

    async fn create_comment(
        &self,
        params: CreateCommentParams,
    ) -> Result<CommentRecord, RepoError> {
        let mut state = self.lock();
        let comment = CommentRecord {
            id: state.next_id(),
            text: params.text,
            post_id: params.post_id,
            author_id: params.author_id,
            is_published: true,
            created_at: OffsetDateTime::now_utc(),
        };
        state.comments.push(comment.clone());
        Ok(comment)
    }

    async fn update_comment_text(&self, id: i64, text: &str) -> Result<CommentRecord, RepoError> {
        let mut state = self.lock();
        let comment = state
            .comments
            .iter_mut()
            .find(|comment| comment.id == id)
            .ok_or(RepoError::NotFound)?;
        comment.text = text.to_string();
        Ok(comment.clone())
    }

    async fn set_comment_published(
        &self,
        id: i64,
        is_published: bool,
    ) -> Result<CommentRecord, RepoError> {
        let mut state = self.lock();
        let comment = state
            .comments
            .iter_mut()
            .find(|comment| comment.id == id)
            .ok_or(RepoError::NotFound)?;
        comment.is_published = is_published;
        Ok(comment.clone())
    }

    async fn delete_comment(&self, id: i64) -> Result<(), RepoError> {
        self.lock().comments.retain(|comment| comment.id != id);
        Ok(())
    }
}

#[async_trait]
impl CategoriesRepo for MemoryStore {
    async fn list_categories(&self) -> Result<Vec<CategoryRecord>, RepoError> {
        let mut categories = self.categories();
        categories.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(categories)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<CategoryRecord>, RepoError> {
        Ok(self.category(id))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<CategoryRecord>, RepoError> {
        Ok(self
            .lock()
            .categories
            .iter()
            .find(|category| category.slug == slug)
            .cloned())
    }

    async fn create_category(&self, params: CategoryParams) -> Result<CategoryRecord, RepoError> {
        let mut state = self.lock();
        if state
            .categories
            .iter()
            .any(|category| category.slug == params.slug)
        {
            return Err(RepoError::Duplicate {
                constraint: "categories_slug_key".to_string(),
            });
        }
        let category = CategoryRecord {
            id: state.next_id(),
            title: params.title,
            description: params.description,
            slug: params.slug,
            is_published: params.is_published,
            created_at: OffsetDateTime::now_utc(),
        };
        state.categories.push(category.clone());
        Ok(category)
    }

    async fn update_category(
        &self,
        id: i64,
        params: CategoryParams,
    ) -> Result<CategoryRecord, RepoError> {
        let mut state = self.lock();
        if state
            .categories
            .iter()
            .any(|category| category.slug == params.slug && category.id != id)
        {
            return Err(RepoError::Duplicate {
                constraint: "categories_slug_key".to_string(),
            });
        }
        let category = state
            .categories
            .iter_mut()
            .find(|category| category.id == id)
            .ok_or(RepoError::NotFound)?;
        category.title = params.title;
        category.description = params.description;
        category.slug = params.slug;
        category.is_published = params.is_published;
        Ok(category.clone())
    }

    async fn delete_category(&self, id: i64) -> Result<(), RepoError> {
        let mut state = self.lock();
        state.categories.retain(|category| category.id != id);
        for post in state.posts.iter_mut() {
            if post.category_id == Some(id) {
                post.category_id = None;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl LocationsRepo for MemoryStore {
    async fn list_locations(&self) -> Result<Vec<LocationRecord>, RepoError> {
        let mut locations = self.lock().locations.clone();
        locations.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(locations)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<LocationRecord>, RepoError> {
        Ok(self
            .lock()
            .locations
            .iter()
            .find(|location| location.id == id)
            .cloned())
    }

    async fn create_location(&self, params: LocationParams) -> Result<LocationRecord, RepoError> {
        let mut state = self.lock();
        let location = LocationRecord {
            id: state.next_id(),
            name: params.name,
            is_published: params.is_published,
            created_at: OffsetDateTime::now_utc(),
        };
        state.locations.push(location.clone());
        Ok(location)
    }

    async fn update_location(
        &self,
        id: i64,
        params: LocationParams,
    ) -> Result<LocationRecord, RepoError> {
        let mut state = self.lock();
        let location = state
            .locations
            .iter_mut()
            .find(|location| location.id == id)
            .ok_or(RepoError::NotFound)?;
        location.name = params.name;
        location.is_published = params.is_published;
        Ok(location.clone())
    }

    async fn delete_location(&self, id: i64) -> Result<(), RepoError> {
        let mut state = self.lock();
        state.locations.retain(|location| location.id != id);
        for post in state.posts.iter_mut() {
            if post.location_id == Some(id) {
                post.location_id = None;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl UsersRepo for MemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<UserRecord>, RepoError> {
        Ok(self.lock().users.iter().find(|user| user.id == id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, RepoError> {
        Ok(self
            .lock()
            .users
            .iter()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn create_user(&self, params: CreateUserParams) -> Result<UserRecord, RepoError> {
        let mut state = self.lock();
        if state.users.iter().any(|user| user.username == params.username) {
            return Err(RepoError::Duplicate {
                constraint: "users_username_key".to_string(),
            });
        }
        let user = UserRecord {
            id: state.next_id(),
            username: params.username,
            first_name: params.first_name,
            last_name: params.last_name,
            email: params.email,
            password_hash: params.password_hash,
            created_at: OffsetDateTime::now_utc(),
        };
        state.users.push(user.clone());
        Ok(user)
    }

    async fn update_profile(&self, params: UpdateProfileParams) -> Result<UserRecord, RepoError> {
        let mut state = self.lock();
        let user = state
            .users
            .iter_mut()
            .find(|user| user.id == params.id)
            .ok_or(RepoError::NotFound)?;
        user.username = params.username;
        user.first_name = params.first_name;
        user.last_name = params.last_name;
        user.email = params.email;
        Ok(user.clone())
    }
}

#[async_trait]
impl SessionsRepo for MemoryStore {
    async fn create_session(
        &self,
        params: CreateSessionParams,
    ) -> Result<SessionRecord, RepoError> {
        let mut state = self.lock();
        let session = SessionRecord {
            id: state.next_id(),
            user_id: params.user_id,
            prefix: params.prefix,
            hashed_secret: params.hashed_secret,
            expires_at: params.expires_at,
            created_at: OffsetDateTime::now_utc(),
        };
        state.sessions.push(session.clone());
        Ok(session)
    }

    async fn find_by_prefix(&self, prefix: &str) -> Result<Option<SessionRecord>, RepoError> {
        Ok(self
            .lock()
            .sessions
            .iter()
            .find(|session| session.prefix == prefix)
            .cloned())
    }

    async fn delete_session(&self, id: i64) -> Result<(), RepoError> {
        self.lock().sessions.retain(|session| session.id != id);
        Ok(())
    }

    async fn delete_expired(&self, now: OffsetDateTime) -> Result<u64, RepoError> {
        let mut state = self.lock();
        let before = state.sessions.len();
        state.sessions.retain(|session| session.expires_at > now);
        Ok((before - state.sessions.len()) as u64)
    }
}

#[async_trait]
impl HealthRepo for MemoryStore {
    async fn health_check(&self) -> Result<(), RepoError> {
        Ok(())
    }
}

/// Fields of a seeded post; defaults describe a publicly visible post.
pub struct PostSeed {
    pub title: String,
    pub text: String,
    pub pub_date: OffsetDateTime,
    pub author_id: i64,
    pub category_id: Option<i64>,
    pub location_id: Option<i64>,
    pub is_published: bool,
}

impl PostSeed {
    pub fn public(title: &str, author_id: i64, category_id: i64) -> Self {
        Self {
            title: title.to_string(),
            text: format!("{title} body"),
            pub_date: OffsetDateTime::now_utc() - Duration::hours(1),
            author_id,
            category_id: Some(category_id),
            location_id: None,
            is_published: true,
        }
    }
}

/// Both routers wired to one [`MemoryStore`].
pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub public: Router,
    pub admin: Router,
    _media: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::default());
        let media = tempfile::tempdir().expect("media dir");
        let uploads =
            Arc::new(UploadStorage::new(media.path().to_path_buf()).expect("upload storage"));
        let site = Arc::new(SiteContext {
            title: "Blogicum".to_string(),
            timezone: chrono_tz::UTC,
            cookie_secure: false,
        });

        let http_state = HttpState {
            feed: Arc::new(FeedService::new(
                store.clone(),
                store.clone(),
                store.clone(),
                store.clone(),
            )),
            posts: Arc::new(PostService::new(
                store.clone(),
                store.clone(),
                store.clone(),
                store.clone(),
                uploads.clone(),
            )),
            comments: Arc::new(CommentService::new(store.clone(), store.clone())),
            accounts: Arc::new(AccountService::new(
                store.clone(),
                store.clone(),
                Duration::hours(1),
            )),
            uploads: uploads.clone(),
            health: store.clone(),
            site: site.clone(),
        };
        let admin_state = AdminState {
            taxonomy: Arc::new(AdminTaxonomyService::new(store.clone(), store.clone())),
            moderation: Arc::new(ModerationService::new(
                store.clone(),
                store.clone(),
                store.clone(),
                uploads,
            )),
            health: store.clone(),
            site,
        };

        Self {
            public: build_router(http_state, UPLOAD_LIMIT),
            admin: build_admin_router(admin_state),
            store,
            _media: media,
        }
    }

    /// A user with a live session; returns the user and the session token.
    pub fn signed_in(&self, username: &str) -> (UserRecord, String) {
        let user = self.store.add_user(username);
        let token = self
            .store
            .issue_session(user.id, OffsetDateTime::now_utc() + Duration::hours(1));
        (user, token)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Response<Body> {
        let request = with_session(Request::get(uri), token)
            .body(Body::empty())
            .expect("request");
        self.public.clone().oneshot(request).await.expect("response")
    }

    pub async fn post_form(&self, uri: &str, form: &str, token: Option<&str>) -> Response<Body> {
        let request = with_session(Request::post(uri), token)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .expect("request");
        self.public.clone().oneshot(request).await.expect("response")
    }

    /// Submit text fields as `multipart/form-data`, the encoding of the post form.
    pub async fn post_multipart(
        &self,
        uri: &str,
        fields: &[(&str, &str)],
        token: Option<&str>,
    ) -> Response<Body> {
        const BOUNDARY: &str = "blogicum-test-boundary";
        let mut body = String::new();
        for (name, value) in fields {
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            ));
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));

        let request = with_session(Request::post(uri), token)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .expect("request");
        self.public.clone().oneshot(request).await.expect("response")
    }

    pub async fn admin_get(&self, uri: &str) -> Response<Body> {
        let request = Request::get(uri).body(Body::empty()).expect("request");
        self.admin.clone().oneshot(request).await.expect("response")
    }

    pub async fn admin_post(&self, uri: &str, form: &str) -> Response<Body> {
        let request = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .expect("request");
        self.admin.clone().oneshot(request).await.expect("response")
    }
}

fn with_session(
    builder: axum::http::request::Builder,
    token: Option<&str>,
) -> axum::http::request::Builder {
    match token {
        Some(token) => builder.header(header::COOKIE, format!("{SESSION_COOKIE}={token}")),
        None => builder,
    }
}

pub fn location(headers: &HeaderMap) -> &str {
    headers
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .expect("location header")
}

pub async fn body_to_string(body: Body) -> String {
    let bytes = body.collect().await.expect("collect body").to_bytes();
    String::from_utf8(bytes.to_vec()).expect("utf8 body")
}

/// Titles of the post cards on a listing page, in page order.
pub fn card_titles(html: &str) -> Vec<String> {
    html.split("<h2><a href=\"/posts/")
        .skip(1)
        .filter_map(|chunk| {
            let start = chunk.find("\">")? + 2;
            let end = chunk.find("</a></h2>")?;
            Some(chunk[start..end].to_string())
        })
        .collect()
}
