/// Input validators for auth requests
///
/// Length limits follow the `users` table columns; the password limit is
/// bcrypt's 72-byte input cap.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ValidationError;

const MAX_EMAIL_LENGTH: usize = 100; // users.email VARCHAR(100)
const MIN_EMAIL_LENGTH: usize = 5;
const MAX_NAME_LENGTH: usize = 100; // users.name VARCHAR(100)
const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_PASSWORD_LENGTH: usize = 72;

lazy_static! {
    // RFC 5322 simplified email regex (practical validation)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).expect("email regex is valid");
}

/// Validates an email address and returns it trimmed
pub fn is_valid_email(email: &str) -> Result<String, ValidationError> {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("email"));
    }

    if trimmed.len() < MIN_EMAIL_LENGTH {
        return Err(ValidationError::TooShort("email", MIN_EMAIL_LENGTH));
    }

    if trimmed.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong("email", MAX_EMAIL_LENGTH));
    }

    if !EMAIL_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("email"));
    }

    Ok(trimmed.to_string())
}

/// Validates a display name and returns it trimmed
pub fn is_valid_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("name"));
    }

    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong("name", MAX_NAME_LENGTH));
    }

    if trimmed.chars().any(|c| c.is_control()) {
        return Err(ValidationError::SuspiciousContent("name"));
    }

    Ok(trimmed.to_string())
}

/// Validates password length. Passwords are never trimmed.
pub fn is_valid_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::EmptyField("password"));
    }

    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::TooShort("password", MIN_PASSWORD_LENGTH));
    }

    // bcrypt silently ignores everything past 72 bytes
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::TooLong("password", MAX_PASSWORD_LENGTH));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_email() {
        assert!(is_valid_email("user@example.com").is_ok());
        assert!(is_valid_email("test.email@domain.co.uk").is_ok());
        assert!(is_valid_email("user+tag@example.com").is_ok());
        assert_eq!(is_valid_email("  john@example.com ").unwrap(), "john@example.com");
    }

    #[test]
    fn test_invalid_email_format() {
        assert!(is_valid_email("invalid").is_err());
        assert!(is_valid_email("user@").is_err());
        assert!(is_valid_email("@example.com").is_err());
        assert!(is_valid_email("user@@example.com").is_err());
        assert!(is_valid_email("").is_err());
    }

    #[test]
    fn test_email_length_limits() {
        let too_long = format!("{}@example.com", "a".repeat(100));
        assert!(matches!(
            is_valid_email(&too_long),
            Err(ValidationError::TooLong("email", _))
        ));
        assert!(matches!(
            is_valid_email("a@b"),
            Err(ValidationError::TooShort("email", _))
        ));
    }

    #[test]
    fn test_valid_name() {
        assert!(is_valid_name("John Doe").is_ok());
        assert!(is_valid_name("Jean-Pierre").is_ok());
        assert!(is_valid_name("O'Brien").is_ok());
    }

    #[test]
    fn test_name_length_limits() {
        assert!(is_valid_name(&"a".repeat(101)).is_err());
        assert!(is_valid_name(&"a".repeat(100)).is_ok());
        assert!(is_valid_name("   ").is_err());
    }

    #[test]
    fn test_control_characters() {
        assert!(is_valid_name("Name\0with\0null").is_err());
    }

    #[test]
    fn test_password_length() {
        assert!(is_valid_password("password123").is_ok());
        assert!(is_valid_password("short").is_err());
        assert!(is_valid_password("").is_err());
        assert!(is_valid_password(&"p".repeat(73)).is_err());
        assert!(is_valid_password(&"p".repeat(72)).is_ok());
    }
}
