use async_trait::async_trait;
use time::OffsetDateTime;

use crate::application::repos::{LocationParams, LocationsRepo, RepoError};
use crate::domain::entities::LocationRecord;

use super::{PostgresRepositories, map_sqlx_error};

#[derive(Debug, sqlx::FromRow)]
struct LocationRow {
    id: i64,
    name: String,
    is_published: bool,
    created_at: OffsetDateTime,
}

impl From<LocationRow> for LocationRecord {
    fn from(row: LocationRow) -> Self {
        LocationRecord {
            id: row.id,
            name: row.name,
            is_published: row.is_published,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl LocationsRepo for PostgresRepositories {
    async fn list_locations(&self) -> Result<Vec<LocationRecord>, RepoError> {
        let rows = sqlx::query_as::<_, LocationRow>(
            "SELECT id, name, is_published, created_at FROM locations ORDER BY name, id",
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(LocationRecord::from).collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<LocationRecord>, RepoError> {
        let row = sqlx::query_as::<_, LocationRow>(
            "SELECT id, name, is_published, created_at FROM locations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(row.map(LocationRecord::from))
    }

    async fn create_location(&self, params: LocationParams) -> Result<LocationRecord, RepoError> {
        let row = sqlx::query_as::<_, LocationRow>(
            "INSERT INTO locations (name, is_published, created_at) VALUES ($1, $2, $3) \
             RETURNING id, name, is_published, created_at",
        )
        .bind(params.name)
        .bind(params.is_published)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(row.into())
    }

    async fn update_location(
        &self,
        id: i64,
        params: LocationParams,
    ) -> Result<LocationRecord, RepoError> {
        let row = sqlx::query_as::<_, LocationRow>(
            "UPDATE locations SET name = $2, is_published = $3 WHERE id = $1 \
             RETURNING id, name, is_published, created_at",
        )
        .bind(id)
        .bind(params.name)
        .bind(params.is_published)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(row.into())
    }

    async fn delete_location(&self, id: i64) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM locations WHERE id = $1")
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
