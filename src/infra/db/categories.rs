use async_trait::async_trait;
use time::OffsetDateTime;

use crate::application::repos::{CategoriesRepo, CategoryParams, RepoError};
use crate::domain::entities::CategoryRecord;

use super::{PostgresRepositories, map_sqlx_error};

const CATEGORY_COLUMNS: &str = "id, title, description, slug, is_published, created_at";

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: i64,
    title: String,
    description: String,
    slug: String,
    is_published: bool,
    created_at: OffsetDateTime,
}

impl From<CategoryRow> for CategoryRecord {
    fn from(row: CategoryRow) -> Self {
        CategoryRecord {
            id: row.id,
            title: row.title,
            description: row.description,
            slug: row.slug,
            is_published: row.is_published,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl CategoriesRepo for PostgresRepositories {
    async fn list_categories(&self) -> Result<Vec<CategoryRecord>, RepoError> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY title, id");
        let rows = sqlx::query_as::<_, CategoryRow>(&sql)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(CategoryRecord::from).collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<CategoryRecord>, RepoError> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1");
        let row = sqlx::query_as::<_, CategoryRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(CategoryRecord::from))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<CategoryRecord>, RepoError> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE slug = $1");
        let row = sqlx::query_as::<_, CategoryRow>(&sql)
            .bind(slug)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(CategoryRecord::from))
    }

    async fn create_category(&self, params: CategoryParams) -> Result<CategoryRecord, RepoError> {
        let sql = format!(
            "INSERT INTO categories (title, description, slug, is_published, created_at) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {CATEGORY_COLUMNS}"
        );
        let row = sqlx::query_as::<_, CategoryRow>(&sql)
            .bind(params.title)
            .bind(params.description)
            .bind(params.slug)
            .bind(params.is_published)
            .bind(OffsetDateTime::now_utc())
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.into())
    }

    async fn update_category(
        &self,
        id: i64,
        params: CategoryParams,
    ) -> Result<CategoryRecord, RepoError> {
        let sql = format!(
            "UPDATE categories SET title = $2, description = $3, slug = $4, is_published = $5 \
             WHERE id = $1 RETURNING {CATEGORY_COLUMNS}"
        );
        let row = sqlx::query_as::<_, CategoryRow>(&sql)
            .bind(id)
            .bind(params.title)
            .bind(params.description)
            .bind(params.slug)
            .bind(params.is_published)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.into())
    }

    async fn delete_category(&self, id: i64) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
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
