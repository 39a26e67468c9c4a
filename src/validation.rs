//! Registration form rules. Surfaces apply these before calling the gateway;
//! the gateway itself only insists on non-empty fields.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::ValidationError;

pub const MIN_USERNAME_LEN: usize = 3;
pub const MIN_PASSWORD_LEN: usize = 6;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"));

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn validate_registration(
    username: &str,
    email: &str,
    password: &str,
    confirm_password: &str,
) -> Result<(), ValidationError> {
    if username.is_empty() || email.is_empty() || password.is_empty() || confirm_password.is_empty() {
        return Err(ValidationError("All fields are required".to_string()));
    }
    if username.chars().count() < MIN_USERNAME_LEN {
        return Err(ValidationError(format!(
            "Username must be at least {} characters long",
            MIN_USERNAME_LEN
        )));
    }
    if !is_valid_email(email) {
        return Err(ValidationError("Please enter a valid email address".to_string()));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LEN
        )));
    }
    if password != confirm_password {
        return Err(ValidationError("Passwords do not match".to_string()));
    }
    Ok(())
}
