use async_trait::async_trait;

use crate::auth::errors::AuthError;
use crate::auth::models::AuthTokens;
use crate::auth::models::RefreshToken;
use crate::auth::models::RegisterCommand;
use crate::auth::models::Role;
use crate::auth::models::User;
use crate::auth::models::UserId;

/// Port for the authentication engine.
///
/// The boundary layer (HTTP handlers) talks to the engine exclusively
/// through this trait.
#[async_trait]
pub trait AuthServicePort: Send + Sync + 'static {
    /// Register a new password-based account. Issues no tokens.
    ///
    /// # Errors
    /// * `EmailAlreadyExists` - Email is already registered
    /// * `Database` - Store operation failed
    async fn register(&self, command: RegisterCommand) -> Result<(), AuthError>;

    /// Authenticate with email and password and issue a token pair.
    ///
    /// A new login supersedes the user's previous refresh token but leaves
    /// already-issued access tokens valid until their own expiry.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown email, wrong password, disabled or
    ///   federated-only account (undifferentiated)
    /// * `Database` - Store operation failed
    async fn login(&self, email: &str, password: &str) -> Result<AuthTokens, AuthError>;

    /// Exchange a refresh token for a new access token.
    ///
    /// The refresh token itself is returned unchanged; it is not rotated.
    ///
    /// # Errors
    /// * `Token(NotFound | Revoked | Expired)` - Refresh token unusable
    /// * `Database` - Store operation failed
    async fn refresh_access_token(&self, refresh_token: &str) -> Result<AuthTokens, AuthError>;

    /// Revoke a refresh token. Idempotent: unknown tokens are a no-op.
    ///
    /// # Errors
    /// * `Database` - Store operation failed
    async fn logout(&self, refresh_token: &str) -> Result<(), AuthError>;

    /// Issue a token pair for an already-resolved user.
    ///
    /// Shared issuance path: password login and federated provisioning both
    /// converge here, so token shape and invariants are identical.
    ///
    /// # Errors
    /// * `Database` - Store operation failed
    async fn issue_tokens(&self, user: &User) -> Result<AuthTokens, AuthError>;
}

/// Persistence operations for the user aggregate.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Persist a new user together with its role links.
    ///
    /// # Errors
    /// * `EmailAlreadyExists` - Unique email constraint violated
    /// * `Database` - Store operation failed
    async fn create(&self, user: User) -> Result<User, AuthError>;

    /// Retrieve a user (with roles) by email address.
    ///
    /// # Errors
    /// * `Database` - Store operation failed
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError>;

    /// Retrieve a user (with roles) by identifier.
    ///
    /// # Errors
    /// * `Database` - Store operation failed
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, AuthError>;
}

/// Persistence operations for roles.
#[async_trait]
pub trait RoleRepository: Send + Sync + 'static {
    /// Fetch a role by name, creating it if absent.
    ///
    /// Must be atomic under concurrent first use: two concurrent calls for
    /// the same name yield the same single row.
    ///
    /// # Errors
    /// * `Database` - Store operation failed
    async fn get_or_create(&self, name: &str) -> Result<Role, AuthError>;
}

/// Persistence operations for refresh tokens.
#[async_trait]
pub trait RefreshTokenRepository: Send + Sync + 'static {
    /// Store a refresh token, replacing any existing row for the same user.
    ///
    /// Atomic: concurrent calls for one user can never leave two rows.
    ///
    /// # Errors
    /// * `Database` - Store operation failed
    async fn replace_for_user(&self, token: RefreshToken) -> Result<RefreshToken, AuthError>;

    /// Look up a refresh token row by its opaque token string.
    ///
    /// # Errors
    /// * `Database` - Store operation failed
    async fn find_by_token(&self, token: &str) -> Result<Option<RefreshToken>, AuthError>;

    /// Mark a refresh token revoked. No-op if the token does not exist.
    ///
    /// # Errors
    /// * `Database` - Store operation failed
    async fn revoke(&self, token: &str) -> Result<(), AuthError>;
}
