//! Field rules for account and cart input.
//!
//! Each validator returns every violated field at once so a caller can fix
//! the whole form in one round trip.

use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

pub const FULL_NAME_MIN: usize = 2;
pub const FULL_NAME_MAX: usize = 50;
pub const USERNAME_MIN: usize = 3;
pub const USERNAME_MAX: usize = 15;
pub const PASSWORD_MIN: usize = 6;
pub const PROFILE_FIELD_MAX: usize = 200;
/// Longest `productId` or `category`, which together address a cart line.
pub const CART_KEY_MAX: usize = 100;
pub const CART_NAME_MAX: usize = 100;

/// One violated field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // ASCII word characters only; `\w` would admit any Unicode letter.
        Regex::new(r"^(?-u:\w)+([.-]?(?-u:\w)+)*@(?-u:\w)+([.-]?(?-u:\w)+)*(\.(?-u:\w){2,3})+$")
            .expect("valid email regex")
    })
}

fn username_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("valid username regex"))
}

/// Trims and checks the display name. Length is counted in characters.
pub fn full_name(value: &str) -> Result<String, FieldError> {
    let trimmed = value.trim();
    let len = trimmed.chars().count();
    if len < FULL_NAME_MIN {
        return Err(FieldError::new(
            "fullName",
            format!("Full name must be at least {FULL_NAME_MIN} characters"),
        ));
    }
    if len > FULL_NAME_MAX {
        return Err(FieldError::new(
            "fullName",
            format!("Full name cannot exceed {FULL_NAME_MAX} characters"),
        ));
    }
    Ok(trimmed.to_string())
}

/// Trims, lowercases and checks the email shape.
pub fn email(value: &str) -> Result<String, FieldError> {
    let normalized = value.trim().to_lowercase();
    if normalized.is_empty() {
        return Err(FieldError::new("email", "Email is required"));
    }
    if !email_regex().is_match(&normalized) {
        return Err(FieldError::new("email", "Please enter a valid email"));
    }
    Ok(normalized)
}

pub fn username(value: &str) -> Result<String, FieldError> {
    let trimmed = value.trim();
    let len = trimmed.chars().count();
    if len < USERNAME_MIN {
        return Err(FieldError::new(
            "username",
            format!("Username must be at least {USERNAME_MIN} characters"),
        ));
    }
    if len > USERNAME_MAX {
        return Err(FieldError::new(
            "username",
            format!("Username cannot exceed {USERNAME_MAX} characters"),
        ));
    }
    if !username_regex().is_match(trimmed) {
        return Err(FieldError::new(
            "username",
            "Username can only contain letters, numbers, and underscores",
        ));
    }
    Ok(trimmed.to_string())
}

/// Passwords are not trimmed; whitespace is part of the secret.
pub fn password(field: &str, value: &str) -> Result<(), FieldError> {
    if value.chars().count() < PASSWORD_MIN {
        return Err(FieldError::new(
            field,
            format!("Password must be at least {PASSWORD_MIN} characters"),
        ));
    }
    Ok(())
}

pub fn required(field: &str, value: &str) -> Result<(), FieldError> {
    if value.trim().is_empty() {
        return Err(FieldError::new(field, format!("{field} is required")));
    }
    Ok(())
}

/// Required text of at most `max` characters after trimming.
pub fn bounded(field: &str, value: &str, max: usize) -> Result<(), FieldError> {
    required(field, value)?;
    if value.trim().chars().count() > max {
        return Err(FieldError::new(
            field,
            format!("{field} cannot exceed {max} characters"),
        ));
    }
    Ok(())
}

/// Optional free-text profile field: empty clears it.
pub fn profile_text(field: &str, value: Option<&str>) -> Result<Option<String>, FieldError> {
    let Some(value) = value.map(str::trim) else {
        return Ok(None);
    };
    if value.chars().count() > PROFILE_FIELD_MAX {
        return Err(FieldError::new(
            field,
            format!("{field} cannot exceed {PROFILE_FIELD_MAX} characters"),
        ));
    }
    Ok(Some(value.to_string()))
}

/// Collects `Err` values into `errors`, yielding the `Ok` value if any.
pub fn collect<T>(result: Result<T, FieldError>, errors: &mut Vec<FieldError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            errors.push(e);
            None
        }
    }
}
