use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;

use crate::application::repos::{
    CreatePostParams, PostListScope, PostQueryFilter, PostsRepo, PostsWriteRepo, RepoError,
    UpdatePostParams,
};
use crate::domain::entities::{AnnotatedPost, AuthorRef, CategoryRef, LocationRef, PostRecord};

use super::{PostgresRepositories, map_sqlx_error};

const POST_COLUMNS: &str = "p.id, p.title, p.text, p.pub_date, p.image, p.author_id, \
     p.location_id, p.category_id, p.is_published, p.created_at";

const ANNOTATED_FROM: &str = " FROM posts p \
     INNER JOIN users u ON u.id = p.author_id \
     LEFT JOIN categories c ON c.id = p.category_id \
     LEFT JOIN locations l ON l.id = p.location_id \
     WHERE TRUE";

#[derive(Debug, sqlx::FromRow)]
struct PostRow {
    id: i64,
    title: String,
    text: String,
    pub_date: OffsetDateTime,
    image: Option<String>,
    author_id: i64,
    location_id: Option<i64>,
    category_id: Option<i64>,
    is_published: bool,
    created_at: OffsetDateTime,
}

impl From<PostRow> for PostRecord {
    fn from(row: PostRow) -> Self {
        PostRecord {
            id: row.id,
            title: row.title,
            text: row.text,
            pub_date: row.pub_date,
            image: row.image,
            author_id: row.author_id,
            location_id: row.location_id,
            category_id: row.category_id,
            is_published: row.is_published,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AnnotatedPostRow {
    #[sqlx(flatten)]
    post: PostRow,
    author_username: String,
    category_title: Option<String>,
    category_slug: Option<String>,
    category_is_published: Option<bool>,
    location_name: Option<String>,
    location_is_published: Option<bool>,
    comment_count: i64,
}

impl TryFrom<AnnotatedPostRow> for AnnotatedPost {
    type Error = RepoError;

    fn try_from(row: AnnotatedPostRow) -> Result<Self, Self::Error> {
        let category = match (
            row.post.category_id,
            row.category_title,
            row.category_slug,
            row.category_is_published,
        ) {
            (Some(id), Some(title), Some(slug), Some(is_published)) => Some(CategoryRef {
                id,
                title,
                slug,
                is_published,
            }),
            _ => None,
        };
        let location = match (
            row.post.location_id,
            row.location_name,
            row.location_is_published,
        ) {
            (Some(id), Some(name), Some(is_published)) => Some(LocationRef {
                id,
                name,
                is_published,
            }),
            _ => None,
        };

        Ok(AnnotatedPost {
            author: AuthorRef {
                id: row.post.author_id,
                username: row.author_username,
            },
            category,
            location,
            comment_count: PostgresRepositories::convert_count(row.comment_count)?,
            post: row.post.into(),
        })
    }
}

impl PostgresRepositories {
    fn annotated_select<'q>() -> QueryBuilder<'q, Postgres> {
        let mut qb = QueryBuilder::new("SELECT ");
        qb.push(POST_COLUMNS);
        qb.push(
            ", u.username AS author_username, \
             c.title AS category_title, c.slug AS category_slug, \
             c.is_published AS category_is_published, \
             l.name AS location_name, l.is_published AS location_is_published, \
             (SELECT COUNT(*) FROM comments cm WHERE cm.post_id = p.id) \
             AS comment_count",
        );
        qb.push(ANNOTATED_FROM);
        qb
    }
}

#[async_trait]
impl PostsRepo for PostgresRepositories {
    async fn list_posts(
        &self,
        scope: PostListScope,
        filter: &PostQueryFilter,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<AnnotatedPost>, RepoError> {
        let mut qb = Self::annotated_select();
        Self::apply_scope_conditions(&mut qb, scope);
        Self::apply_post_filter(&mut qb, filter);
        qb.push(" ORDER BY p.pub_date DESC, p.id DESC LIMIT ");
        qb.push_bind(i64::from(limit.max(1)));
        qb.push(" OFFSET ");
        qb.push_bind(Self::convert_offset(offset)?);

        let rows = qb
            .build_query_as::<AnnotatedPostRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        rows.into_iter().map(AnnotatedPost::try_from).collect()
    }

    async fn count_posts(
        &self,
        scope: PostListScope,
        filter: &PostQueryFilter,
    ) -> Result<u64, RepoError> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*)");
        qb.push(ANNOTATED_FROM);
        Self::apply_scope_conditions(&mut qb, scope);
        Self::apply_post_filter(&mut qb, filter);

        let count: i64 = qb
            .build_query_scalar()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Self::convert_count(count)
    }

    async fn find_annotated(&self, id: i64) -> Result<Option<AnnotatedPost>, RepoError> {
        let mut qb = Self::annotated_select();
        qb.push(" AND p.id = ");
        qb.push_bind(id);

        let row = qb
            .build_query_as::<AnnotatedPostRow>()
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        row.map(AnnotatedPost::try_from).transpose()
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<PostRecord>, RepoError> {
        let row = sqlx::query_as::<_, PostRow>(
            "SELECT p.id, p.title, p.text, p.pub_date, p.image, p.author_id, \
             p.location_id, p.category_id, p.is_published, p.created_at \
             FROM posts p WHERE p.id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(PostRecord::from))
    }
}

const RETURNING_POST: &str = " RETURNING id, title, text, pub_date, image, author_id, \
     location_id, category_id, is_published, created_at";

#[async_trait]
impl PostsWriteRepo for PostgresRepositories {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let sql = format!(
            "INSERT INTO posts (title, text, pub_date, image, author_id, location_id, \
             category_id, is_published, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE, $8){RETURNING_POST}"
        );
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(params.title)
            .bind(params.text)
            .bind(params.pub_date)
            .bind(params.image)
            .bind(params.author_id)
            .bind(params.location_id)
            .bind(params.category_id)
            .bind(OffsetDateTime::now_utc())
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        let sql = format!(
            "UPDATE posts SET title = $2, text = $3, pub_date = $4, image = $5, \
             location_id = $6, category_id = $7 WHERE id = $1{RETURNING_POST}"
        );
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(params.id)
            .bind(params.title)
            .bind(params.text)
            .bind(params.pub_date)
            .bind(params.image)
            .bind(params.location_id)
            .bind(params.category_id)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn set_post_published(
        &self,
        id: i64,
        is_published: bool,
    ) -> Result<PostRecord, RepoError> {
        let sql = format!("UPDATE posts SET is_published = $2 WHERE id = $1{RETURNING_POST}");
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id)
            .bind(is_published)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn delete_post(&self, id: i64) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
