//! Field rules for categories and locations.

use crate::domain::error::{DomainError, FieldErrors};
use crate::domain::posts::{required_text, validate_title};
use crate::domain::slug::validate_slug;

pub const LOCATION_NAME_MAX_LEN: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryDraft {
    pub title: String,
    pub description: String,
    /// Empty when the slug should be derived from the title.
    pub slug: String,
    pub is_published: bool,
}

impl CategoryDraft {
    pub fn validate(self) -> Result<CategoryDraft, FieldErrors> {
        let mut errors = FieldErrors::new();

        let title = validate_title(&self.title).unwrap_or_else(|err| {
            errors.extend_from(err);
            String::new()
        });
        let description = required_text("description", &self.description).unwrap_or_else(|err| {
            errors.extend_from(err);
            String::new()
        });
        let slug = self.slug.trim().to_string();
        if !slug.is_empty()
            && let Err(err) = validate_slug(&slug)
        {
            errors.push("slug", err.to_string());
        }

        errors.into_result(CategoryDraft {
            title,
            description,
            slug,
            is_published: self.is_published,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocationDraft {
    pub name: String,
    pub is_published: bool,
}

impl LocationDraft {
    pub fn validate(self) -> Result<LocationDraft, FieldErrors> {
        let name = required_text("name", &self.name).and_then(|name| {
            if name.chars().count() > LOCATION_NAME_MAX_LEN {
                Err(DomainError::validation(
                    "name",
                    format!("Ensure this value has at most {LOCATION_NAME_MAX_LEN} characters."),
                ))
            } else {
                Ok(name)
            }
        })?;

        Ok(LocationDraft {
            name,
            is_published: self.is_published,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_slug_may_be_left_blank() {
        let draft = CategoryDraft {
            title: "Travel".to_string(),
            description: "Trips".to_string(),
            slug: "  ".to_string(),
            is_published: true,
        }
        .validate()
        .expect("valid");
        assert!(draft.slug.is_empty());
    }

    #[test]
    fn category_rejects_bad_slug_and_missing_description() {
        let errors = CategoryDraft {
            title: "Travel".to_string(),
            description: String::new(),
            slug: "no spaces".to_string(),
            is_published: true,
        }
        .validate()
        .expect_err("invalid");
        assert!(errors.get("slug").is_some());
        assert!(errors.get("description").is_some());
        assert!(errors.get("title").is_none());
    }

    #[test]
    fn location_name_required() {
        let errors = LocationDraft {
            name: " ".to_string(),
            is_published: true,
        }
        .validate()
        .expect_err("blank");
        assert!(errors.get("name").is_some());
    }
}
