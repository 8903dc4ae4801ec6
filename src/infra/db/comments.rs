use async_trait::async_trait;
use time::OffsetDateTime;

use crate::application::repos::{CommentsRepo, CreateCommentParams, RepoError};
use crate::domain::entities::{AnnotatedComment, AuthorRef, CommentRecord};

use super::{PostgresRepositories, map_sqlx_error};

const RETURNING_COMMENT: &str = " RETURNING id, text, post_id, author_id, is_published, created_at";

#[derive(Debug, sqlx::FromRow)]
struct CommentRow {
    id: i64,
    text: String,
    post_id: i64,
    author_id: i64,
    is_published: bool,
    created_at: OffsetDateTime,
}

impl From<CommentRow> for CommentRecord {
    fn from(row: CommentRow) -> Self {
        CommentRecord {
            id: row.id,
            text: row.text,
            post_id: row.post_id,
            author_id: row.author_id,
            is_published: row.is_published,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AnnotatedCommentRow {
    #[sqlx(flatten)]
    comment: CommentRow,
    author_username: String,
}

impl From<AnnotatedCommentRow> for AnnotatedComment {
    fn from(row: AnnotatedCommentRow) -> Self {
        AnnotatedComment {
            author: AuthorRef {
                id: row.comment.author_id,
                username: row.author_username,
            },
            comment: row.comment.into(),
        }
    }
}

#[async_trait]
impl CommentsRepo for PostgresRepositories {
    async fn list_for_post(&self, post_id: i64) -> Result<Vec<AnnotatedComment>, RepoError> {
        let rows = sqlx::query_as::<_, AnnotatedCommentRow>(
            "SELECT cm.id, cm.text, cm.post_id, cm.author_id, cm.is_published, cm.created_at, \
             u.username AS author_username \
             FROM comments cm INNER JOIN users u ON u.id = cm.author_id \
             WHERE cm.post_id = $1 \
             ORDER BY cm.created_at ASC, cm.id ASC",
        )
        .bind(post_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(AnnotatedComment::from).collect())
    }

    async fn list_comments(
        &self,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<AnnotatedComment>, RepoError> {
        let rows = sqlx::query_as::<_, AnnotatedCommentRow>(
            "SELECT cm.id, cm.text, cm.post_id, cm.author_id, cm.is_published, cm.created_at, \
             u.username AS author_username \
             FROM comments cm INNER JOIN users u ON u.id = cm.author_id \
             ORDER BY cm.created_at DESC, cm.id DESC LIMIT $1 OFFSET $2",
        )
        .bind(i64::from(limit.max(1)))
        .bind(Self::convert_offset(offset)?)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(AnnotatedComment::from).collect())
    }

    async fn count_comments(&self) -> Result<u64, RepoError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments")
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Self::convert_count(count)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<CommentRecord>, RepoError> {
        let row = sqlx::query_as::<_, CommentRow>(
            "SELECT id, text, post_id, author_id, is_published, created_at \
             FROM comments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(CommentRecord::from))
    }

    async fn create_comment(
        &self,
        params: CreateCommentParams,
    ) -> Result<CommentRecord, RepoError> {
        let sql = format!(
            "INSERT INTO comments (text, post_id, author_id, is_published, created_at) \
             VALUES ($1, $2, $3, TRUE, $4){RETURNING_COMMENT}"
        );
        let row = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(params.text)
            .bind(params.post_id)
            .bind(params.author_id)
            .bind(OffsetDateTime::now_utc())
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn update_comment_text(&self, id: i64, text: &str) -> Result<CommentRecord, RepoError> {
        let sql = format!("UPDATE comments SET text = $2 WHERE id = $1{RETURNING_COMMENT}");
        let row = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(id)
            .bind(text)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn set_comment_published(
        &self,
        id: i64,
        is_published: bool,
    ) -> Result<CommentRecord, RepoError> {
        let sql = format!("UPDATE comments SET is_published = $2 WHERE id = $1{RETURNING_COMMENT}");
        let row = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(id)
            .bind(is_published)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn delete_comment(&self, id: i64) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
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
