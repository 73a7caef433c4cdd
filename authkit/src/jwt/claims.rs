use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// Claims carried by an access token.
///
/// The token is self-contained: everything a consumer needs to authorize a
/// request is in here, protected by the signature. There is no revocation
/// hook, so a token stays valid until `exp` regardless of later logouts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject: the user's email address
    pub sub: String,

    /// Names of the roles granted to the subject
    pub roles: Vec<String>,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Create claims for a subject, expiring `validity` from now.
    pub fn new(subject: impl Into<String>, roles: Vec<String>, validity: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: subject.into(),
            roles,
            iat: now.timestamp(),
            exp: (now + validity).timestamp(),
        }
    }

    /// Check whether the claims are expired at the given timestamp.
    pub fn is_expired(&self, current_timestamp: i64) -> bool {
        self.exp < current_timestamp
    }
}
