//! Postgres-backed repository implementations.

mod categories;
mod comments;
mod locations;
mod posts;
mod sessions;
mod users;
mod util;

pub use util::map_sqlx_error;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{
    Postgres, QueryBuilder,
    postgres::{PgPool, PgPoolOptions},
    query,
};

use crate::application::repos::{HealthRepo, PostListScope, PostQueryFilter, RepoError};

#[derive(Clone)]
pub struct PostgresRepositories {
    pool: Arc<PgPool>,
}

impl PostgresRepositories {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn connect(url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
    }

    pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .map_err(Into::into)
    }

    /// Visibility predicate shared by every public listing.
    fn apply_scope_conditions<'q>(qb: &mut QueryBuilder<'q, Postgres>, scope: PostListScope) {
        match scope {
            PostListScope::Public { now } => {
                qb.push(" AND p.is_published AND c.is_published IS TRUE AND p.pub_date <= ");
                qb.push_bind(now);
            }
            PostListScope::Unrestricted => {}
        }
    }

    fn apply_post_filter<'q>(qb: &mut QueryBuilder<'q, Postgres>, filter: &'q PostQueryFilter) {
        if let Some(slug) = filter.category_slug.as_ref() {
            qb.push(" AND c.slug = ");
            qb.push_bind(slug);
        }
        if let Some(author_id) = filter.author_id {
            qb.push(" AND p.author_id = ");
            qb.push_bind(author_id);
        }
        if let Some(search) = filter.search.as_ref() {
            qb.push(" AND p.title ILIKE ");
            qb.push_bind(format!("%{}%", escape_like(search)));
        }
        if let Some(is_published) = filter.is_published {
            qb.push(" AND p.is_published = ");
            qb.push_bind(is_published);
        }
    }

    fn convert_count(value: i64) -> Result<u64, RepoError> {
        value
            .try_into()
            .map_err(|_| RepoError::from_persistence("count exceeds supported range"))
    }

    fn convert_offset(value: u64) -> Result<i64, RepoError> {
        value
            .try_into()
            .map_err(|_| RepoError::InvalidInput {
                message: "offset exceeds supported range".to_string(),
            })
    }
}

fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[async_trait]
impl HealthRepo for PostgresRepositories {
    async fn health_check(&self) -> Result<(), RepoError> {
        query("SELECT 1")
            .execute(self.pool())
            .await
            .map(|_| ())
            .map_err(map_sqlx_error)
    }
}
