//! Category and location management for the admin listener.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::application::repos::{
    CategoriesRepo, CategoryParams, LocationParams, LocationsRepo, RepoError,
};
use crate::domain::entities::{CategoryRecord, LocationRecord};
use crate::domain::error::FieldErrors;
use crate::domain::slug::{SlugAsyncError, SlugError, generate_unique_slug_async};
use crate::domain::taxonomy::{CategoryDraft, LocationDraft};

const DUPLICATE_SLUG: &str = "Category with this slug already exists.";

#[derive(Debug, Error)]
pub enum AdminTaxonomyError {
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error("form is invalid")]
    Invalid(FieldErrors),
    #[error("record not found")]
    NotFound,
}

#[derive(Clone)]
pub struct AdminTaxonomyService {
    categories: Arc<dyn CategoriesRepo>,
    locations: Arc<dyn LocationsRepo>,
}

impl AdminTaxonomyService {
    pub fn new(categories: Arc<dyn CategoriesRepo>, locations: Arc<dyn LocationsRepo>) -> Self {
        Self {
            categories,
            locations,
        }
    }

    pub async fn list_categories(&self) -> Result<Vec<CategoryRecord>, AdminTaxonomyError> {
        Ok(self.categories.list_categories().await?)
    }

    pub async fn category(&self, id: i64) -> Result<CategoryRecord, AdminTaxonomyError> {
        self.categories
            .find_by_id(id)
            .await?
            .ok_or(AdminTaxonomyError::NotFound)
    }

    /// A blank slug is derived from the title and suffixed until unique.
    pub async fn create_category(
        &self,
        draft: CategoryDraft,
    ) -> Result<CategoryRecord, AdminTaxonomyError> {
        let draft = draft.validate().map_err(AdminTaxonomyError::Invalid)?;
        let slug = self.resolve_slug(&draft, None).await?;

        let record = self
            .categories
            .create_category(CategoryParams {
                title: draft.title,
                description: draft.description,
                slug,
                is_published: draft.is_published,
            })
            .await
            .map_err(duplicate_slug)?;

        info!(
            target = "blogicum::application::admin::taxonomy",
            category_id = record.id,
            slug = %record.slug,
            "category created"
        );
        Ok(record)
    }

    pub async fn update_category(
        &self,
        id: i64,
        draft: CategoryDraft,
    ) -> Result<CategoryRecord, AdminTaxonomyError> {
        let current = self.category(id).await?;
        let draft = draft.validate().map_err(AdminTaxonomyError::Invalid)?;
        let slug = self.resolve_slug(&draft, Some(&current)).await?;

        let record = self
            .categories
            .update_category(
                id,
                CategoryParams {
                    title: draft.title,
                    description: draft.description,
                    slug,
                    is_published: draft.is_published,
                },
            )
            .await
            .map_err(duplicate_slug)?;

        info!(
            target = "blogicum::application::admin::taxonomy",
            category_id = id,
            "category updated"
        );
        Ok(record)
    }

    /// Posts of the category lose their category and drop out of public listings.
    pub async fn delete_category(&self, id: i64) -> Result<(), AdminTaxonomyError> {
        self.category(id).await?;
        self.categories.delete_category(id).await?;
        info!(
            target = "blogicum::application::admin::taxonomy",
            category_id = id,
            "category deleted"
        );
        Ok(())
    }

    pub async fn list_locations(&self) -> Result<Vec<LocationRecord>, AdminTaxonomyError> {
        Ok(self.locations.list_locations().await?)
    }

    pub async fn location(&self, id: i64) -> Result<LocationRecord, AdminTaxonomyError> {
        self.locations
            .find_by_id(id)
            .await?
            .ok_or(AdminTaxonomyError::NotFound)
    }

    pub async fn create_location(
        &self,
        draft: LocationDraft,
    ) -> Result<LocationRecord, AdminTaxonomyError> {
        let draft = draft.validate().map_err(AdminTaxonomyError::Invalid)?;
        let record = self
            .locations
            .create_location(LocationParams {
                name: draft.name,
                is_published: draft.is_published,
            })
            .await?;
        info!(
            target = "blogicum::application::admin::taxonomy",
            location_id = record.id,
            "location created"
        );
        Ok(record)
    }

    pub async fn update_location(
        &self,
        id: i64,
        draft: LocationDraft,
    ) -> Result<LocationRecord, AdminTaxonomyError> {
        self.location(id).await?;
        let draft = draft.validate().map_err(AdminTaxonomyError::Invalid)?;
        let record = self
            .locations
            .update_location(
                id,
                LocationParams {
                    name: draft.name,
                    is_published: draft.is_published,
                },
            )
            .await?;
        Ok(record)
    }

    pub async fn delete_location(&self, id: i64) -> Result<(), AdminTaxonomyError> {
        self.location(id).await?;
        self.locations.delete_location(id).await?;
        info!(
            target = "blogicum::application::admin::taxonomy",
            location_id = id,
            "location deleted"
        );
        Ok(())
    }

    async fn resolve_slug(
        &self,
        draft: &CategoryDraft,
        current: Option<&CategoryRecord>,
    ) -> Result<String, AdminTaxonomyError> {
        if !draft.slug.is_empty() {
            return Ok(draft.slug.clone());
        }
        if let Some(current) = current {
            return Ok(current.slug.clone());
        }

        let categories = self.categories.clone();
        match generate_unique_slug_async(&draft.title, move |candidate| {
            let categories = categories.clone();
            let candidate = candidate.to_string();
            async move {
                categories
                    .find_by_slug(&candidate)
                    .await
                    .map(|existing| existing.is_none())
            }
        })
        .await
        {
            Ok(slug) => Ok(slug),
            Err(SlugAsyncError::Slug(err @ SlugError::Exhausted { .. })) => {
                Err(field_error("slug", err.to_string()))
            }
            Err(SlugAsyncError::Slug(err)) => Err(field_error("title", err.to_string())),
            Err(SlugAsyncError::Predicate(err)) => Err(AdminTaxonomyError::Repo(err)),
        }
    }
}

fn field_error(field: &'static str, message: impl Into<String>) -> AdminTaxonomyError {
    let mut errors = FieldErrors::new();
    errors.push(field, message);
    AdminTaxonomyError::Invalid(errors)
}

fn duplicate_slug(err: RepoError) -> AdminTaxonomyError {
    match err {
        RepoError::Duplicate { .. } => field_error("slug", DUPLICATE_SLUG),
        other => AdminTaxonomyError::Repo(other),
    }
}
