use thiserror::Error;

pub const USERNAME_MIN: usize = 4;
pub const USERNAME_MAX: usize = 32;
pub const PASSWORD_MIN: usize = 8;
pub const PASSWORD_MAX: usize = 32;

/// Form-level credential problems. Messages are shown to the user as-is.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("Please fill in all fields.")]
    Missing,
    #[error("Username must consist of at least 4 letters.")]
    UsernameTooShort,
    #[error("Maximum username length should not exceed 32 letters.")]
    UsernameTooLong,
    #[error("Username and password should not contain spaces.")]
    ContainsSpace,
    #[error("Password must consist of at least 8 letters.")]
    PasswordTooShort,
    #[error("Maximum password length should not exceed 32 letters.")]
    PasswordTooLong,
    #[error("Passwords do not match.")]
    Mismatch,
}

/// Checks run before anything reaches the network. `confirm` is only given on registration.
pub fn validate_credentials(username: &str, password: &str, confirm: Option<&str>) -> Result<(), CredentialError> {
    if username.is_empty() || password.is_empty() || confirm.is_some_and(str::is_empty) {
        return Err(CredentialError::Missing);
    }
    let ulen = username.chars().count();
    if ulen < USERNAME_MIN { return Err(CredentialError::UsernameTooShort); }
    if ulen > USERNAME_MAX { return Err(CredentialError::UsernameTooLong); }
    if username.contains(' ') || password.contains(' ') { return Err(CredentialError::ContainsSpace); }
    let plen = password.chars().count();
    if plen < PASSWORD_MIN { return Err(CredentialError::PasswordTooShort); }
    if plen > PASSWORD_MAX { return Err(CredentialError::PasswordTooLong); }
    if let Some(c) = confirm {
        if c != password { return Err(CredentialError::Mismatch); }
    }
    Ok(())
}
