use thiserror::Error;

use authkit::JwtError;
use authkit::PasswordError;

/// Error for UserId parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UserIdError {
    #[error("Invalid UUID format: {0}")]
    InvalidFormat(String),
}

/// Error for EmailAddress validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("Invalid email format: {0}")]
    InvalidFormat(String),
}

/// Token failures surfaced by validation and refresh verification.
///
/// `Malformed`, `SignatureInvalid`, and `Expired` apply to access tokens;
/// `NotFound`, `Revoked`, and `Expired` apply to refresh tokens.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Refresh token not found")]
    NotFound,

    #[error("Refresh token has been revoked")]
    Revoked,

    #[error("Token is expired")]
    Expired,

    #[error("Token is malformed: {0}")]
    Malformed(String),

    #[error("Token signature is invalid")]
    SignatureInvalid,
}

/// Top-level error for all credential and token lifecycle operations.
///
/// Every engine operation fails with exactly one of these kinds; transient
/// store or hashing failures propagate as `Database`/`Password` without
/// committing partial state.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    // Value object validation errors (automatically converted via #[from])
    #[error("Invalid user ID: {0}")]
    InvalidUserId(#[from] UserIdError),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    // Domain-level errors
    #[error("Email already exists: {0}")]
    EmailAlreadyExists(String),

    // Deliberately undifferentiated: unknown email, wrong password, and
    // disabled accounts all surface the same kind to avoid user enumeration.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Unsupported identity provider: {0}")]
    UnsupportedProvider(String),

    #[error("Invalid identity assertion: {0}")]
    InvalidAssertion(String),

    // Infrastructure errors
    #[error("Password error: {0}")]
    Password(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<PasswordError> for AuthError {
    fn from(err: PasswordError) -> Self {
        AuthError::Password(err.to_string())
    }
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AuthError::Token(TokenError::Expired),
            JwtError::SignatureInvalid => AuthError::Token(TokenError::SignatureInvalid),
            JwtError::Malformed(msg) => AuthError::Token(TokenError::Malformed(msg)),
            JwtError::EncodingFailed(msg) => AuthError::Unknown(msg),
        }
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        AuthError::Unknown(err.to_string())
    }
}
