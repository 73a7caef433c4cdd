use thiserror::Error;

/// Error type for access token operations.
///
/// Validation failures are split into the three kinds a caller can react
/// to differently: a token that never was one (`Malformed`), a token signed
/// with the wrong key (`SignatureInvalid`), and a genuine token past its
/// expiry (`Expired`).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum JwtError {
    #[error("Failed to encode token: {0}")]
    EncodingFailed(String),

    #[error("Token is expired")]
    Expired,

    #[error("Token signature is invalid")]
    SignatureInvalid,

    #[error("Token is malformed: {0}")]
    Malformed(String),
}
