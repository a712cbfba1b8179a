//! Form validation rules.
//!
//! Every form in the web app and every CLI command runs its input through
//! these functions before anything reaches the backend. Each rule returns the
//! exact message shown to the user.
//!
//! Lengths are counted in characters. The "required" checks ignore
//! surrounding whitespace; the length checks do not.

use thiserror::Error;

use crate::types::{Email, EmailError, RatingValue, Role};

/// Shortest allowed display name.
pub const NAME_MIN_CHARS: usize = 20;
/// Longest allowed display name.
pub const NAME_MAX_CHARS: usize = 60;
/// Longest allowed postal address.
pub const ADDRESS_MAX_CHARS: usize = 400;
/// Shortest allowed password.
pub const PASSWORD_MIN_CHARS: usize = 8;
/// Longest allowed password.
pub const PASSWORD_MAX_CHARS: usize = 16;
/// Longest allowed store name.
pub const STORE_NAME_MAX_CHARS: usize = 100;
/// Characters that satisfy the password "special character" rule.
pub const PASSWORD_SPECIAL_CHARS: &str = "!@#$%^&*(),.?\":{}|<>";

/// A failed validation rule.
///
/// `Display` yields the user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Name is required")]
    NameRequired,
    #[error("Name must be between 20-60 characters")]
    NameLength,
    #[error("Email is required")]
    EmailRequired,
    #[error("Please enter a valid email address")]
    EmailInvalid,
    #[error("Address is required")]
    AddressRequired,
    #[error("Address must be less than 400 characters")]
    AddressTooLong,
    #[error("Password is required")]
    PasswordRequired,
    #[error("Password must be between 8-16 characters")]
    PasswordLength,
    #[error("Password must contain at least 1 uppercase letter and 1 special character")]
    PasswordComplexity,
    #[error("Rating must be between 1 and 5")]
    RatingOutOfRange,
    #[error("Store name is required")]
    StoreNameRequired,
    #[error("Store name must be less than 100 characters")]
    StoreNameTooLong,
    #[error("Invalid role selected")]
    InvalidRole,
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn char_len(value: &str) -> usize {
    value.chars().count()
}

/// Display name: required, 20-60 characters.
///
/// # Errors
///
/// [`ValidationError::NameRequired`] or [`ValidationError::NameLength`].
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    if is_blank(name) {
        return Err(ValidationError::NameRequired);
    }
    if !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&char_len(name)) {
        return Err(ValidationError::NameLength);
    }
    Ok(())
}

/// Email: required, `local@domain.tld` with no whitespace.
///
/// # Errors
///
/// [`ValidationError::EmailRequired`] or [`ValidationError::EmailInvalid`].
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    match Email::parse(email) {
        Ok(_) => Ok(()),
        Err(EmailError::Empty) => Err(ValidationError::EmailRequired),
        Err(EmailError::Malformed) => Err(ValidationError::EmailInvalid),
    }
}

/// Address: required, at most 400 characters.
///
/// # Errors
///
/// [`ValidationError::AddressRequired`] or [`ValidationError::AddressTooLong`].
pub fn validate_address(address: &str) -> Result<(), ValidationError> {
    if is_blank(address) {
        return Err(ValidationError::AddressRequired);
    }
    if char_len(address) > ADDRESS_MAX_CHARS {
        return Err(ValidationError::AddressTooLong);
    }
    Ok(())
}

/// Password: required, 8-16 characters, at least one uppercase letter and
/// one character from [`PASSWORD_SPECIAL_CHARS`].
///
/// # Errors
///
/// [`ValidationError::PasswordRequired`], [`ValidationError::PasswordLength`]
/// or [`ValidationError::PasswordComplexity`].
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if is_blank(password) {
        return Err(ValidationError::PasswordRequired);
    }
    if !(PASSWORD_MIN_CHARS..=PASSWORD_MAX_CHARS).contains(&char_len(password)) {
        return Err(ValidationError::PasswordLength);
    }
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_special = password.chars().any(|c| PASSWORD_SPECIAL_CHARS.contains(c));
    if !(has_upper && has_special) {
        return Err(ValidationError::PasswordComplexity);
    }
    Ok(())
}

/// Rating: 1 through 5 inclusive.
///
/// # Errors
///
/// [`ValidationError::RatingOutOfRange`].
pub fn validate_rating(rating: i64) -> Result<(), ValidationError> {
    RatingValue::new(rating)
        .map(|_| ())
        .map_err(|_| ValidationError::RatingOutOfRange)
}

/// Store name: required, at most 100 characters.
///
/// # Errors
///
/// [`ValidationError::StoreNameRequired`] or [`ValidationError::StoreNameTooLong`].
pub fn validate_store_name(name: &str) -> Result<(), ValidationError> {
    if is_blank(name) {
        return Err(ValidationError::StoreNameRequired);
    }
    if char_len(name) > STORE_NAME_MAX_CHARS {
        return Err(ValidationError::StoreNameTooLong);
    }
    Ok(())
}

/// Role: one of `admin`, `user`, `store_owner`.
///
/// # Errors
///
/// [`ValidationError::InvalidRole`].
pub fn validate_role(role: &str) -> Result<(), ValidationError> {
    role.parse::<Role>()
        .map(|_| ())
        .map_err(|_| ValidationError::InvalidRole)
}

/// Run a sequence of checks and return the first failure.
///
/// ```
/// use scorekeep_core::validation::{validate_form, validate_name, validate_email};
/// use scorekeep_core::ValidationError;
///
/// let result = validate_form([
///     validate_name("short"),
///     validate_email("not an email"),
/// ]);
/// assert_eq!(result, Err(ValidationError::NameLength));
/// ```
///
/// # Errors
///
/// The first [`ValidationError`] in iteration order.
pub fn validate_form<I>(checks: I) -> Result<(), ValidationError>
where
    I: IntoIterator<Item = Result<(), ValidationError>>,
{
    checks.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_boundaries() {
        assert_eq!(validate_name(""), Err(ValidationError::NameRequired));
        assert_eq!(validate_name("    "), Err(ValidationError::NameRequired));
        assert_eq!(validate_name(&"a".repeat(19)), Err(ValidationError::NameLength));
        assert_eq!(validate_name(&"a".repeat(20)), Ok(()));
        assert_eq!(validate_name(&"a".repeat(60)), Ok(()));
        assert_eq!(validate_name(&"a".repeat(61)), Err(ValidationError::NameLength));
    }

    #[test]
    fn test_name_counts_characters_not_bytes() {
        // 20 two-byte characters
        assert_eq!(validate_name(&"é".repeat(20)), Ok(()));
    }

    #[test]
    fn test_email_rules() {
        assert_eq!(validate_email(""), Err(ValidationError::EmailRequired));
        assert_eq!(validate_email("user@example"), Err(ValidationError::EmailInvalid));
        assert_eq!(validate_email("user@example.com"), Ok(()));
    }

    #[test]
    fn test_email_has_no_length_cap() {
        let long = format!("{}@example.com", "a".repeat(250));
        assert_eq!(validate_email(&long), Ok(()));
    }

    #[test]
    fn test_address_boundaries() {
        assert_eq!(validate_address(" "), Err(ValidationError::AddressRequired));
        assert_eq!(validate_address(&"x".repeat(400)), Ok(()));
        assert_eq!(
            validate_address(&"x".repeat(401)),
            Err(ValidationError::AddressTooLong)
        );
    }

    #[test]
    fn test_password_rules() {
        assert_eq!(validate_password("Aa1!aaaa"), Ok(()));
        assert_eq!(
            validate_password("aaaaaaaa"),
            Err(ValidationError::PasswordComplexity)
        );
        assert_eq!(validate_password(""), Err(ValidationError::PasswordRequired));
        assert_eq!(validate_password("A!a"), Err(ValidationError::PasswordLength));
        assert_eq!(
            validate_password("Aa1!aaaaaaaaaaaaa"),
            Err(ValidationError::PasswordLength)
        );
        assert_eq!(
            validate_password("AAAAAAAA"),
            Err(ValidationError::PasswordComplexity)
        );
        assert_eq!(
            validate_password("aaaaaaa!"),
            Err(ValidationError::PasswordComplexity)
        );
        assert_eq!(validate_password("Secret\"12"), Ok(()));
    }

    #[test]
    fn test_rating_range() {
        assert_eq!(validate_rating(0), Err(ValidationError::RatingOutOfRange));
        assert_eq!(validate_rating(1), Ok(()));
        assert_eq!(validate_rating(5), Ok(()));
        assert_eq!(validate_rating(6), Err(ValidationError::RatingOutOfRange));
    }

    #[test]
    fn test_store_name_boundaries() {
        assert_eq!(validate_store_name(""), Err(ValidationError::StoreNameRequired));
        assert_eq!(validate_store_name(&"s".repeat(100)), Ok(()));
        assert_eq!(
            validate_store_name(&"s".repeat(101)),
            Err(ValidationError::StoreNameTooLong)
        );
    }

    #[test]
    fn test_role_names() {
        assert_eq!(validate_role("admin"), Ok(()));
        assert_eq!(validate_role("user"), Ok(()));
        assert_eq!(validate_role("store_owner"), Ok(()));
        assert_eq!(validate_role("owner"), Err(ValidationError::InvalidRole));
        assert_eq!(validate_role(""), Err(ValidationError::InvalidRole));
    }

    #[test]
    fn test_form_returns_first_failure() {
        let result = validate_form([
            validate_name(&"n".repeat(25)),
            validate_email("bad"),
            validate_password("short"),
        ]);
        assert_eq!(result, Err(ValidationError::EmailInvalid));

        let ok = validate_form([validate_rating(3), validate_role("user")]);
        assert_eq!(ok, Ok(()));
    }

    #[test]
    fn test_messages_are_user_facing() {
        assert_eq!(
            ValidationError::NameLength.to_string(),
            "Name must be between 20-60 characters"
        );
        assert_eq!(
            ValidationError::RatingOutOfRange.to_string(),
            "Rating must be between 1 and 5"
        );
    }
}
