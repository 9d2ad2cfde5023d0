//! Client-side checks run before any password is sent to the API.

use thiserror::Error;

/// Minimum accepted password length
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Special characters accepted (and one of which is required) in a password
pub const PASSWORD_SPECIALS: &str = "@$!%*#?&";

/// Input rejected at the UI boundary
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Passwords don't match")]
    PasswordMismatch,

    #[error(
        "Password must be at least 8 characters and include a number and special character"
    )]
    WeakPassword,

    #[error("New password must be different from your current password")]
    PasswordUnchanged,

    #[error("Invalid or expired password reset link")]
    MissingResetToken,

    #[error("{0} is required")]
    MissingField(&'static str),
}

/// Check a password against the strength rule.
///
/// At least eight characters drawn only from ASCII letters, digits and
/// [`PASSWORD_SPECIALS`], with at least one of each class.
pub fn check_password_strength(password: &str) -> Result<(), ValidationError> {
    let allowed = |c: char| c.is_ascii_alphanumeric() || PASSWORD_SPECIALS.contains(c);

    let strong = password.chars().count() >= MIN_PASSWORD_LENGTH
        && password.chars().all(allowed)
        && password.chars().any(|c| c.is_ascii_alphabetic())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| PASSWORD_SPECIALS.contains(c));

    if strong {
        Ok(())
    } else {
        Err(ValidationError::WeakPassword)
    }
}

/// Validate a new password and its confirmation
pub fn validate_new_password(password: &str, confirmation: &str) -> Result<(), ValidationError> {
    if password != confirmation {
        return Err(ValidationError::PasswordMismatch);
    }
    check_password_strength(password)
}

/// Validate the change-password form
pub fn validate_password_change(
    current: &str,
    new: &str,
    confirmation: &str,
) -> Result<(), ValidationError> {
    validate_new_password(new, confirmation)?;
    if current == new {
        return Err(ValidationError::PasswordUnchanged);
    }
    Ok(())
}

/// Validate the reset-password form; a reset link without a token is rejected first
pub fn validate_password_reset(
    token: Option<&str>,
    password: &str,
    confirmation: &str,
) -> Result<(), ValidationError> {
    match token {
        Some(token) if !token.trim().is_empty() => validate_new_password(password, confirmation),
        _ => Err(ValidationError::MissingResetToken),
    }
}

/// Reject blank required fields
pub fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::MissingField(field))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strong_password_accepted() {
        assert!(check_password_strength("abcdef1!").is_ok());
        assert!(check_password_strength("Secur3#Password").is_ok());
    }

    #[test]
    fn test_short_password_rejected() {
        assert_eq!(
            check_password_strength("ab1!"),
            Err(ValidationError::WeakPassword)
        );
    }

    #[test]
    fn test_password_missing_class_rejected() {
        assert!(check_password_strength("abcdefgh!").is_err());
        assert!(check_password_strength("12345678!").is_err());
        assert!(check_password_strength("abcdefg12").is_err());
    }

    #[test]
    fn test_password_with_disallowed_character_rejected() {
        assert!(check_password_strength("abc def1!").is_err());
        assert!(check_password_strength("abcdef1!^").is_err());
    }

    #[test]
    fn test_mismatch_reported_before_strength() {
        assert_eq!(
            validate_new_password("weak", "other"),
            Err(ValidationError::PasswordMismatch)
        );
    }

    #[test]
    fn test_change_must_differ() {
        assert_eq!(
            validate_password_change("abcdef1!", "abcdef1!", "abcdef1!"),
            Err(ValidationError::PasswordUnchanged)
        );
        assert!(validate_password_change("old", "abcdef1!", "abcdef1!").is_ok());
    }

    #[test]
    fn test_reset_requires_token() {
        assert_eq!(
            validate_password_reset(None, "abcdef1!", "abcdef1!"),
            Err(ValidationError::MissingResetToken)
        );
        assert_eq!(
            validate_password_reset(Some(" "), "abcdef1!", "abcdef1!"),
            Err(ValidationError::MissingResetToken)
        );
        assert!(validate_password_reset(Some("tok"), "abcdef1!", "abcdef1!").is_ok());
    }

    #[test]
    fn test_require() {
        assert_eq!(
            require("Email", "  "),
            Err(ValidationError::MissingField("Email"))
        );
        assert!(require("Email", "a@b.c").is_ok());
    }
}
