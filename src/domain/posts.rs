//! Field rules for posts and comments.

use time::OffsetDateTime;

use crate::domain::error::{DomainError, FieldErrors};

pub const TITLE_MAX_LEN: usize = 256;

/// Validated post fields ready to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct PostDraft {
    pub title: String,
    pub text: String,
    pub pub_date: OffsetDateTime,
    pub category_id: i64,
    pub location_id: Option<i64>,
}

/// Raw post fields as submitted, already decoded from the form encoding.
#[derive(Debug, Clone, Default)]
pub struct PostInput {
    pub title: String,
    pub text: String,
    pub pub_date: Option<OffsetDateTime>,
    pub category_id: Option<i64>,
    pub location_id: Option<i64>,
}

impl PostInput {
    pub fn validate(self) -> Result<PostDraft, FieldErrors> {
        let mut errors = FieldErrors::new();

        let title = match validate_title(&self.title) {
            Ok(title) => title,
            Err(err) => {
                errors.extend_from(err);
                String::new()
            }
        };
        let text = match required_text("text", &self.text) {
            Ok(text) => text,
            Err(err) => {
                errors.extend_from(err);
                String::new()
            }
        };
        if self.pub_date.is_none() {
            errors.push("pub_date", "Enter a valid date and time.");
        }
        if self.category_id.is_none() {
            errors.push("category", "This field is required.");
        }

        match (self.pub_date, self.category_id) {
            (Some(pub_date), Some(category_id)) if errors.is_empty() => Ok(PostDraft {
                title,
                text,
                pub_date,
                category_id,
                location_id: self.location_id,
            }),
            _ => Err(errors),
        }
    }
}

pub fn validate_title(raw: &str) -> Result<String, DomainError> {
    let title = required_text("title", raw)?;
    if title.chars().count() > TITLE_MAX_LEN {
        return Err(DomainError::validation(
            "title",
            format!("Ensure this value has at most {TITLE_MAX_LEN} characters."),
        ));
    }
    Ok(title)
}

/// Trim surrounding whitespace and reject empty values.
pub fn required_text(field: &'static str, raw: &str) -> Result<String, DomainError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(field, "This field is required."));
    }
    Ok(trimmed.to_string())
}

pub fn validate_comment_text(raw: &str) -> Result<String, DomainError> {
    required_text("text", raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> PostInput {
        PostInput {
            title: "  A walk in the hills ".to_string(),
            text: "It rained.".to_string(),
            pub_date: Some(OffsetDateTime::UNIX_EPOCH),
            category_id: Some(2),
            location_id: None,
        }
    }

    #[test]
    fn valid_input_is_trimmed() {
        let draft = input().validate().expect("valid draft");
        assert_eq!(draft.title, "A walk in the hills");
        assert_eq!(draft.category_id, 2);
    }

    #[test]
    fn missing_fields_are_reported_per_field() {
        let errors = PostInput::default().validate().expect_err("invalid");
        assert!(errors.get("title").is_some());
        assert!(errors.get("text").is_some());
        assert!(errors.get("pub_date").is_some());
        assert!(errors.get("category").is_some());
        assert!(errors.get("location").is_none());
    }

    #[test]
    fn overlong_title_is_rejected() {
        let mut raw = input();
        raw.title = "x".repeat(TITLE_MAX_LEN + 1);
        let errors = raw.validate().expect_err("too long");
        assert!(errors.get("title").is_some());
    }

    #[test]
    fn comment_text_must_not_be_blank() {
        assert!(validate_comment_text("   ").is_err());
        assert_eq!(validate_comment_text(" hi ").as_deref(), Ok("hi"));
    }
}
