//! Category slug validation and derivation.
//!
//! Slugs appear in `/category/{slug}/` URLs and may only contain latin
//! letters, digits, hyphens and underscores. When an administrator leaves the
//! slug blank one is derived from the title with the `slug` crate, which
//! transliterates non-latin scripts before lowercasing.

use std::future::Future;

use slug::slugify;
use thiserror::Error;

pub const MAX_SLUG_LEN: usize = 64;
const MAX_SUFFIX_ATTEMPTS: usize = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug must not be empty")]
    Empty,
    #[error("slug may only contain latin letters, digits, hyphens and underscores")]
    InvalidCharacters,
    #[error("slug must be at most {MAX_SLUG_LEN} characters")]
    TooLong,
    #[error("failed to derive slug from `{input}`")]
    Unrepresentable { input: String },
    #[error("exhausted attempts to find a unique slug for `{base}`")]
    Exhausted { base: String },
}

#[derive(Debug, Error)]
pub enum SlugAsyncError<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    #[error(transparent)]
    Slug(#[from] SlugError),
    #[error(transparent)]
    Predicate(E),
}

pub fn validate_slug(candidate: &str) -> Result<(), SlugError> {
    if candidate.is_empty() {
        return Err(SlugError::Empty);
    }
    if candidate.len() > MAX_SLUG_LEN {
        return Err(SlugError::TooLong);
    }
    if !candidate
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
    {
        return Err(SlugError::InvalidCharacters);
    }
    Ok(())
}

/// Derive a base slug from human-readable text.
pub fn derive_slug(input: &str) -> Result<String, SlugError> {
    if input.trim().is_empty() {
        return Err(SlugError::Empty);
    }

    let mut candidate = slugify(input);
    candidate.truncate(MAX_SLUG_LEN);
    let candidate = candidate.trim_end_matches('-').to_string();

    if candidate.is_empty() {
        return Err(SlugError::Unrepresentable {
            input: input.to_string(),
        });
    }

    Ok(candidate)
}

/// Produce a slug the async `is_unique` predicate accepts, suffixing `-2`, `-3`, … on collision.
pub async fn generate_unique_slug_async<F, Fut, E>(
    input: &str,
    mut is_unique: F,
) -> Result<String, SlugAsyncError<E>>
where
    F: FnMut(&str) -> Fut,
    Fut: Future<Output = Result<bool, E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    let base = derive_slug(input)?;

    if is_unique(&base).await.map_err(SlugAsyncError::Predicate)? {
        return Ok(base);
    }

    for attempt in 2..=MAX_SUFFIX_ATTEMPTS + 1 {
        let candidate = format!("{base}-{attempt}");
        if is_unique(&candidate)
            .await
            .map_err(SlugAsyncError::Predicate)?
        {
            return Ok(candidate);
        }
    }

    Err(SlugAsyncError::Slug(SlugError::Exhausted { base }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_slug_accepts_url_safe_ascii() {
        assert_eq!(validate_slug("travel_notes-2024"), Ok(()));
    }

    #[test]
    fn validate_slug_rejects_spaces_and_unicode() {
        assert_eq!(validate_slug("two words"), Err(SlugError::InvalidCharacters));
        assert_eq!(validate_slug("путешествия"), Err(SlugError::InvalidCharacters));
        assert_eq!(validate_slug(""), Err(SlugError::Empty));
    }

    #[test]
    fn derive_slug_produces_valid_slug() {
        let slug = derive_slug("Mountain Trips & Hikes").expect("slug");
        assert_eq!(slug, "mountain-trips-hikes");
        assert_eq!(validate_slug(&slug), Ok(()));
    }

    #[test]
    fn derive_slug_transliterates_cyrillic() {
        let slug = derive_slug("Путешествия").expect("slug");
        assert!(!slug.is_empty());
        assert_eq!(validate_slug(&slug), Ok(()));
    }

    #[tokio::test]
    async fn generate_unique_slug_async_appends_counter() {
        use std::sync::Arc;
        use tokio::sync::Mutex;

        let existing = Arc::new(Mutex::new(vec!["travel".to_string()]));

        let slug = generate_unique_slug_async("Travel", |candidate| {
            let existing = existing.clone();
            let candidate = candidate.to_string();
            async move {
                let guard = existing.lock().await;
                Ok::<bool, std::convert::Infallible>(!guard.contains(&candidate))
            }
        })
        .await
        .expect("unique slug");

        assert_eq!(slug, "travel-2");
    }

    #[tokio::test]
    async fn generate_unique_slug_async_exhausts() {
        let result = generate_unique_slug_async("Travel", |_| async {
            Ok::<bool, std::convert::Infallible>(false)
        })
        .await;

        assert!(matches!(
            result,
            Err(SlugAsyncError::Slug(SlugError::Exhausted { .. }))
        ));
    }
}
