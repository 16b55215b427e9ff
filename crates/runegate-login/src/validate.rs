//! Account format rules, checked before a new account is created.
//!
//! - Username: 1–16 characters, ASCII letters, digits, `_` or `-`,
//!   starting with a letter.
//! - Password: 1–16 printable ASCII characters, no whitespace.

use crate::FormatError;

/// Longest username or password accepted, in characters.
pub const MAX_CREDENTIAL_LEN: usize = 16;

/// Checks `username` against the account name rules.
pub fn validate_username(username: &str) -> Result<(), FormatError> {
    check_length(username)?;
    if !username.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return Err(FormatError::MustStartWithLetter);
    }
    match username
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
    {
        Some(c) => Err(FormatError::InvalidCharacter(c)),
        None => Ok(()),
    }
}

/// Checks `password` against the password rules.
pub fn validate_password(password: &str) -> Result<(), FormatError> {
    check_length(password)?;
    match password.chars().find(|c| !c.is_ascii_graphic()) {
        Some(c) => Err(FormatError::InvalidCharacter(c)),
        None => Ok(()),
    }
}

fn check_length(value: &str) -> Result<(), FormatError> {
    let len = value.chars().count();
    if len == 0 {
        return Err(FormatError::Empty);
    }
    if len > MAX_CREDENTIAL_LEN {
        return Err(FormatError::TooLong {
            max: MAX_CREDENTIAL_LEN,
        });
    }
    Ok(())
}
