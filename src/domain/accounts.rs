//! Account field rules.

use crate::domain::error::DomainError;

pub const USERNAME_MAX_LEN: usize = 150;
pub const NAME_MAX_LEN: usize = 150;
pub const EMAIL_MAX_LEN: usize = 254;
pub const PASSWORD_MIN_LEN: usize = 8;

/// Usernames allow letters, digits and `@ . + - _`.
pub fn validate_username(raw: &str) -> Result<String, DomainError> {
    let username = raw.trim();
    if username.is_empty() {
        return Err(DomainError::validation("username", "This field is required."));
    }
    if username.chars().count() > USERNAME_MAX_LEN {
        return Err(DomainError::validation(
            "username",
            format!("Ensure this value has at most {USERNAME_MAX_LEN} characters."),
        ));
    }
    if !username
        .chars()
        .all(|ch| ch.is_alphanumeric() || matches!(ch, '@' | '.' | '+' | '-' | '_'))
    {
        return Err(DomainError::validation(
            "username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        ));
    }
    Ok(username.to_string())
}

/// Empty emails are allowed; non-empty ones need a local part and a dotted domain.
pub fn validate_email(raw: &str) -> Result<String, DomainError> {
    let email = raw.trim();
    if email.is_empty() {
        return Ok(String::new());
    }
    let invalid = || DomainError::validation("email", "Enter a valid email address.");
    if email.len() > EMAIL_MAX_LEN || email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') || !domain.contains('.') {
        return Err(invalid());
    }
    if domain.starts_with('.') || domain.ends_with('.') {
        return Err(invalid());
    }
    Ok(email.to_string())
}

pub fn validate_name(field: &'static str, raw: &str) -> Result<String, DomainError> {
    let name = raw.trim();
    if name.chars().count() > NAME_MAX_LEN {
        return Err(DomainError::validation(
            field,
            format!("Ensure this value has at most {NAME_MAX_LEN} characters."),
        ));
    }
    Ok(name.to_string())
}

pub fn validate_new_password(password: &str, confirmation: &str) -> Result<(), DomainError> {
    if password.chars().count() < PASSWORD_MIN_LEN {
        return Err(DomainError::validation(
            "password1",
            format!("This password is too short. It must contain at least {PASSWORD_MIN_LEN} characters."),
        ));
    }
    if password != confirmation {
        return Err(DomainError::validation(
            "password2",
            "The two password fields didn't match.",
        ));
    }
    Ok(())
}
