//! Repository behaviour against a real Postgres. `sqlx::test` creates a
//! scratch database per test from `DATABASE_URL`.

use sqlx::PgPool;
use time::{Duration, OffsetDateTime};

use blogicum::application::repos::{
    CategoriesRepo, CategoryParams, CommentsRepo, CreateCommentParams, CreatePostParams,
    CreateSessionParams, CreateUserParams, PostListScope, PostQueryFilter, PostsRepo,
    PostsWriteRepo, RepoError, SessionsRepo, UsersRepo,
};
use blogicum::infra::db::PostgresRepositories;

async fn user(repos: &PostgresRepositories, username: &str) -> i64 {
    repos
        .create_user(CreateUserParams {
            username: username.to_string(),
            email: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            password_hash: "unused".to_string(),
        })
        .await
        .expect("create user")
        .id
}

async fn category(repos: &PostgresRepositories, slug: &str, is_published: bool) -> i64 {
    repos
        .create_category(CategoryParams {
            title: slug.to_string(),
            description: format!("About {slug}"),
            slug: slug.to_string(),
            is_published,
        })
        .await
        .expect("create category")
        .id
}

async fn post(
    repos: &PostgresRepositories,
    title: &str,
    author_id: i64,
    category_id: i64,
    pub_date: OffsetDateTime,
) -> i64 {
    repos
        .create_post(CreatePostParams {
            title: title.to_string(),
            text: "body".to_string(),
            pub_date,
            image: None,
            author_id,
            location_id: None,
            category_id,
        })
        .await
        .expect("create post")
        .id
}

fn titles(posts: &[blogicum::domain::entities::AnnotatedPost]) -> Vec<&str> {
    posts.iter().map(|p| p.post.title.as_str()).collect()
}

#[sqlx::test(migrations = "./migrations")]
async fn public_scope_filters_rows(pool: PgPool) {
    let repos = PostgresRepositories::new(pool);
    let now = OffsetDateTime::now_utc();
    let author = user(&repos, "ann").await;
    let open = category(&repos, "travel", true).await;
    let closed = category(&repos, "secret", false).await;

    post(&repos, "visible", author, open, now - Duration::hours(2)).await;
    post(&repos, "future", author, open, now + Duration::days(1)).await;
    post(&repos, "hidden-category", author, closed, now - Duration::hours(1)).await;
    let draft = post(&repos, "draft", author, open, now - Duration::hours(3)).await;
    repos
        .set_post_published(draft, false)
        .await
        .expect("unpublish");

    let scope = PostListScope::Public { now };
    let filter = PostQueryFilter::default();
    let listed = repos
        .list_posts(scope, &filter, 0, 10)
        .await
        .expect("list");
    assert_eq!(titles(&listed), vec!["visible"]);
    assert_eq!(repos.count_posts(scope, &filter).await.expect("count"), 1);

    let all = repos
        .list_posts(PostListScope::Unrestricted, &filter, 0, 10)
        .await
        .expect("list all");
    assert_eq!(
        titles(&all),
        vec!["future", "hidden-category", "visible", "draft"]
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn comment_count_includes_moderated_comments(pool: PgPool) {
    let repos = PostgresRepositories::new(pool);
    let author = user(&repos, "ann").await;
    let open = category(&repos, "travel", true).await;
    let id = post(
        &repos,
        "alps",
        author,
        open,
        OffsetDateTime::now_utc() - Duration::hours(1),
    )
    .await;

    for text in ["one", "two"] {
        repos
            .create_comment(CreateCommentParams {
                text: text.to_string(),
                post_id: id,
                author_id: author,
            })
            .await
            .expect("comment");
    }
    let hidden = repos
        .create_comment(CreateCommentParams {
            text: "three".to_string(),
            post_id: id,
            author_id: author,
        })
        .await
        .expect("comment");
    repos
        .set_comment_published(hidden.id, false)
        .await
        .expect("hide");

    let annotated = repos
        .find_annotated(id)
        .await
        .expect("find")
        .expect("post");
    assert_eq!(annotated.comment_count, 3);

    let listed = repos.list_for_post(id).await.expect("list");
    assert_eq!(listed.len(), 3);
    assert_eq!(listed[2].comment.text, "three");
    assert!(!listed[2].comment.is_published);
}

#[sqlx::test(migrations = "./migrations")]
async fn deletes_cascade_and_detach(pool: PgPool) {
    let repos = PostgresRepositories::new(pool);
    let author = user(&repos, "ann").await;
    let open = category(&repos, "travel", true).await;
    let now = OffsetDateTime::now_utc();
    let first = post(&repos, "first", author, open, now).await;
    let second = post(&repos, "second", author, open, now).await;
    let comment = repos
        .create_comment(CreateCommentParams {
            text: "bye".to_string(),
            post_id: first,
            author_id: author,
        })
        .await
        .expect("comment");

    repos.delete_post(first).await.expect("delete post");
    assert!(
        CommentsRepo::find_by_id(&repos, comment.id)
            .await
            .expect("lookup")
            .is_none()
    );

    repos.delete_category(open).await.expect("delete category");
    let orphan = PostsRepo::find_by_id(&repos, second)
        .await
        .expect("lookup")
        .expect("post kept");
    assert_eq!(orphan.category_id, None);
}

#[sqlx::test(migrations = "./migrations")]
async fn unique_constraints_map_to_duplicate(pool: PgPool) {
    let repos = PostgresRepositories::new(pool);
    user(&repos, "ann").await;
    let err = repos
        .create_user(CreateUserParams {
            username: "ann".to_string(),
            email: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            password_hash: "unused".to_string(),
        })
        .await
        .expect_err("duplicate username");
    assert!(matches!(err, RepoError::Duplicate { .. }));

    category(&repos, "travel", true).await;
    let err = repos
        .create_category(CategoryParams {
            title: "Again".to_string(),
            description: "dup".to_string(),
            slug: "travel".to_string(),
            is_published: true,
        })
        .await
        .expect_err("duplicate slug");
    assert!(matches!(err, RepoError::Duplicate { .. }));
}

#[sqlx::test(migrations = "./migrations")]
async fn expired_sessions_are_pruned(pool: PgPool) {
    let repos = PostgresRepositories::new(pool);
    let author = user(&repos, "ann").await;
    let now = OffsetDateTime::now_utc();

    for (prefix, expires_at) in [
        ("live0000", now + Duration::hours(1)),
        ("dead0000", now - Duration::hours(1)),
    ] {
        repos
            .create_session(CreateSessionParams {
                user_id: author,
                prefix: prefix.to_string(),
                hashed_secret: vec![0; 32],
                expires_at,
            })
            .await
            .expect("session");
    }

    assert_eq!(repos.delete_expired(now).await.expect("prune"), 1);
    assert!(repos.find_by_prefix("live0000").await.expect("lookup").is_some());
    assert!(repos.find_by_prefix("dead0000").await.expect("lookup").is_none());
}
