use std::sync::Arc;

use chrono::Duration;
use chrono::Utc;
use uuid::Uuid;

use crate::auth::errors::AuthError;
use crate::auth::errors::TokenError;
use crate::auth::models::RefreshToken;
use crate::auth::models::UserId;
use crate::auth::ports::RefreshTokenRepository;

/// Refresh token lifecycle: create, verify, revoke.
///
/// Token strings are UUIDv4 (122 bits of entropy) and never reused. One
/// active token per user: creation replaces the previous row in a single
/// store operation. Expiry is checked lazily at verify time; expired rows
/// are never swept, only superseded by the next login.
pub struct RefreshTokenLifecycle<RT>
where
    RT: RefreshTokenRepository,
{
    repository: Arc<RT>,
    validity: Duration,
}

impl<RT> RefreshTokenLifecycle<RT>
where
    RT: RefreshTokenRepository,
{
    pub fn new(repository: Arc<RT>, validity: Duration) -> Self {
        Self {
            repository,
            validity,
        }
    }

    /// Issue a fresh refresh token for a user, superseding any prior one.
    ///
    /// # Errors
    /// * `Database` - Store operation failed
    pub async fn create(&self, user_id: UserId) -> Result<RefreshToken, AuthError> {
        let token = RefreshToken {
            id: Uuid::new_v4(),
            token: Uuid::new_v4().to_string(),
            user_id,
            expiry_date: Utc::now() + self.validity,
            revoked: false,
        };

        self.repository.replace_for_user(token).await
    }

    /// Verify a refresh token string and return its row unchanged.
    ///
    /// Verification does not rotate or mutate the token: the same string
    /// stays usable for subsequent renewals until expiry or revocation.
    ///
    /// # Errors
    /// * `Token(NotFound)` - No row for this token string
    /// * `Token(Revoked)` - Token was explicitly revoked
    /// * `Token(Expired)` - `expiry_date` has passed
    /// * `Database` - Store operation failed
    pub async fn verify(&self, token: &str) -> Result<RefreshToken, AuthError> {
        let refresh_token = self
            .repository
            .find_by_token(token)
            .await?
            .ok_or(AuthError::Token(TokenError::NotFound))?;

        if refresh_token.revoked {
            return Err(AuthError::Token(TokenError::Revoked));
        }

        if refresh_token.is_expired(Utc::now()) {
            return Err(AuthError::Token(TokenError::Expired));
        }

        Ok(refresh_token)
    }

    /// Revoke a refresh token. Unknown tokens are a silent no-op.
    ///
    /// # Errors
    /// * `Database` - Store operation failed
    pub async fn revoke(&self, token: &str) -> Result<(), AuthError> {
        self.repository.revoke(token).await
    }
}
