use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;

use authkit::PasswordHasher;
use authkit::TokenSigner;

use crate::auth::errors::AuthError;
use crate::auth::models::AuthTokens;
use crate::auth::models::RegisterCommand;
use crate::auth::models::User;
use crate::auth::models::UserId;
use crate::auth::models::DEFAULT_ROLE;
use crate::auth::ports::AuthServicePort;
use crate::auth::ports::RefreshTokenRepository;
use crate::auth::ports::RoleRepository;
use crate::auth::ports::UserRepository;
use crate::auth::refresh::RefreshTokenLifecycle;

/// Authentication engine: registration, password login, token refresh,
/// logout.
///
/// Composes the token signer, the refresh token lifecycle, and the stores.
/// Holds no per-request mutable state; the only shared state is the
/// immutable signing key inside `TokenSigner`.
pub struct AuthService<UR, RR, RT>
where
    UR: UserRepository,
    RR: RoleRepository,
    RT: RefreshTokenRepository,
{
    users: Arc<UR>,
    roles: Arc<RR>,
    refresh_tokens: RefreshTokenLifecycle<RT>,
    token_signer: Arc<TokenSigner>,
    password_hasher: PasswordHasher,
}

impl<UR, RR, RT> AuthService<UR, RR, RT>
where
    UR: UserRepository,
    RR: RoleRepository,
    RT: RefreshTokenRepository,
{
    /// Create a new authentication engine with injected dependencies.
    ///
    /// # Arguments
    /// * `users` / `roles` / `refresh_tokens` - Persistence adapters
    /// * `token_signer` - Process-wide signer with the durable signing key
    /// * `refresh_validity` - How long issued refresh tokens remain valid
    pub fn new(
        users: Arc<UR>,
        roles: Arc<RR>,
        refresh_tokens: Arc<RT>,
        token_signer: Arc<TokenSigner>,
        refresh_validity: Duration,
    ) -> Self {
        Self {
            users,
            roles,
            refresh_tokens: RefreshTokenLifecycle::new(refresh_tokens, refresh_validity),
            token_signer,
            password_hasher: PasswordHasher::new(),
        }
    }
}

#[async_trait]
impl<UR, RR, RT> AuthServicePort for AuthService<UR, RR, RT>
where
    UR: UserRepository,
    RR: RoleRepository,
    RT: RefreshTokenRepository,
{
    async fn register(&self, command: RegisterCommand) -> Result<(), AuthError> {
        // Duplicate emails are rejected by the store's unique constraint,
        // not a check-then-act lookup, so concurrent registrations for the
        // same address cannot both succeed.
        let role = self.roles.get_or_create(DEFAULT_ROLE).await?;

        let password_hash = self.password_hasher.hash(&command.password)?;

        let user = User {
            id: UserId::new(),
            email: command.email,
            password_hash: Some(password_hash),
            full_name: command.full_name,
            enabled: true,
            roles: vec![role],
        };

        self.users.create(user).await?;

        Ok(())
    }

    async fn login(&self, email: &str, password: &str) -> Result<AuthTokens, AuthError> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !user.enabled {
            return Err(AuthError::InvalidCredentials);
        }

        // Federated-only accounts have no hash and cannot log in with a
        // password.
        let stored_hash = user
            .password_hash
            .as_deref()
            .ok_or(AuthError::InvalidCredentials)?;

        let is_valid = self.password_hasher.verify(password, stored_hash)?;
        if !is_valid {
            return Err(AuthError::InvalidCredentials);
        }

        self.issue_tokens(&user).await
    }

    async fn refresh_access_token(&self, refresh_token: &str) -> Result<AuthTokens, AuthError> {
        let verified = self.refresh_tokens.verify(refresh_token).await?;

        let user = self
            .users
            .find_by_id(&verified.user_id)
            .await?
            .ok_or(AuthError::Token(crate::auth::errors::TokenError::NotFound))?;

        // New access token, same refresh token: no rotation on use.
        let access_token = self
            .token_signer
            .generate(user.email.as_str(), &user.role_names())?;

        Ok(AuthTokens::bearer(access_token, verified.token))
    }

    async fn logout(&self, refresh_token: &str) -> Result<(), AuthError> {
        self.refresh_tokens.revoke(refresh_token).await
    }

    async fn issue_tokens(&self, user: &User) -> Result<AuthTokens, AuthError> {
        let access_token = self
            .token_signer
            .generate(user.email.as_str(), &user.role_names())?;

        // Superseding the previous refresh token enforces single-active-
        // refresh-session semantics; it does not touch issued access tokens.
        let refresh_token = self.refresh_tokens.create(user.id).await?;

        Ok(AuthTokens::bearer(access_token, refresh_token.token))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use mockall::mock;
    use uuid::Uuid;

    use super::*;
    use crate::auth::errors::TokenError;
    use crate::auth::models::EmailAddress;
    use crate::auth::models::RefreshToken;
    use crate::auth::models::Role;

    mock! {
        pub TestUserRepository {}

        #[async_trait]
        impl UserRepository for TestUserRepository {
            async fn create(&self, user: User) -> Result<User, AuthError>;
            async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError>;
            async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, AuthError>;
        }
    }

    mock! {
        pub TestRoleRepository {}

        #[async_trait]
        impl RoleRepository for TestRoleRepository {
            async fn get_or_create(&self, name: &str) -> Result<Role, AuthError>;
        }
    }

    mock! {
        pub TestRefreshTokenRepository {}

        #[async_trait]
        impl RefreshTokenRepository for TestRefreshTokenRepository {
            async fn replace_for_user(&self, token: RefreshToken) -> Result<RefreshToken, AuthError>;
            async fn find_by_token(&self, token: &str) -> Result<Option<RefreshToken>, AuthError>;
            async fn revoke(&self, token: &str) -> Result<(), AuthError>;
        }
    }

    const SECRET: &[u8] = b"test-secret-key-for-jwt-signing-at-least-32-bytes";

    fn user_role() -> Role {
        Role {
            id: Uuid::new_v4(),
            name: DEFAULT_ROLE.to_string(),
        }
    }

    fn alice(password_hash: Option<String>) -> User {
        User {
            id: UserId::new(),
            email: EmailAddress::new("a@x.com".to_string()).unwrap(),
            password_hash,
            full_name: "Alice".to_string(),
            enabled: true,
            roles: vec![user_role()],
        }
    }

    fn service(
        users: MockTestUserRepository,
        roles: MockTestRoleRepository,
        refresh_tokens: MockTestRefreshTokenRepository,
    ) -> AuthService<MockTestUserRepository, MockTestRoleRepository, MockTestRefreshTokenRepository>
    {
        AuthService::new(
            Arc::new(users),
            Arc::new(roles),
            Arc::new(refresh_tokens),
            Arc::new(TokenSigner::new(SECRET, Duration::minutes(15))),
            Duration::days(7),
        )
    }

    fn signer() -> TokenSigner {
        TokenSigner::new(SECRET, Duration::minutes(15))
    }

    #[tokio::test]
    async fn test_register_hashes_password_and_grants_default_role() {
        let mut users = MockTestUserRepository::new();
        let mut roles = MockTestRoleRepository::new();
        let refresh_tokens = MockTestRefreshTokenRepository::new();

        roles
            .expect_get_or_create()
            .withf(|name| name == DEFAULT_ROLE)
            .times(1)
            .returning(|_| Ok(user_role()));

        users
            .expect_create()
            .withf(|user| {
                user.email.as_str() == "a@x.com"
                    && user.enabled
                    && user.role_names() == vec![DEFAULT_ROLE.to_string()]
                    && user
                        .password_hash
                        .as_deref()
                        .is_some_and(|h| h.starts_with("$argon2"))
            })
            .times(1)
            .returning(|user| Ok(user));

        let service = service(users, roles, refresh_tokens);

        let command = RegisterCommand::new(
            EmailAddress::new("a@x.com".to_string()).unwrap(),
            "pw123".to_string(),
            "Alice".to_string(),
        );

        assert!(service.register(command).await.is_ok());
    }

    #[tokio::test]
    async fn test_register_duplicate_email_fails_conflict() {
        let mut users = MockTestUserRepository::new();
        let mut roles = MockTestRoleRepository::new();
        let refresh_tokens = MockTestRefreshTokenRepository::new();

        roles
            .expect_get_or_create()
            .times(1)
            .returning(|_| Ok(user_role()));

        users.expect_create().times(1).returning(|user| {
            Err(AuthError::EmailAlreadyExists(
                user.email.as_str().to_string(),
            ))
        });

        let service = service(users, roles, refresh_tokens);

        let command = RegisterCommand::new(
            EmailAddress::new("a@x.com".to_string()).unwrap(),
            "pw123".to_string(),
            "Alice".to_string(),
        );

        let result = service.register(command).await;
        assert!(matches!(result, Err(AuthError::EmailAlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_login_success_issues_bearer_pair() {
        let hash = PasswordHasher::new().hash("pw123").unwrap();
        let user = alice(Some(hash));
        let user_id = user.id;

        let mut users = MockTestUserRepository::new();
        let roles = MockTestRoleRepository::new();
        let mut refresh_tokens = MockTestRefreshTokenRepository::new();

        users
            .expect_find_by_email()
            .withf(|email| email == "a@x.com")
            .times(1)
            .returning(move |_| Ok(Some(user.clone())));

        refresh_tokens
            .expect_replace_for_user()
            .withf(move |t| t.user_id == user_id && !t.revoked)
            .times(1)
            .returning(|token| Ok(token));

        let service = service(users, roles, refresh_tokens);

        let tokens = service.login("a@x.com", "pw123").await.unwrap();
        assert_eq!(tokens.token_type, "Bearer");
        assert!(!tokens.refresh_token.is_empty());

        let claims = signer().validate(&tokens.access_token).unwrap();
        assert_eq!(claims.sub, "a@x.com");
        assert_eq!(claims.roles, vec![DEFAULT_ROLE.to_string()]);
    }

    #[tokio::test]
    async fn test_login_wrong_password_fails_without_issuing_tokens() {
        let hash = PasswordHasher::new().hash("pw123").unwrap();
        let user = alice(Some(hash));

        let mut users = MockTestUserRepository::new();
        let roles = MockTestRoleRepository::new();
        let mut refresh_tokens = MockTestRefreshTokenRepository::new();

        users
            .expect_find_by_email()
            .times(1)
            .returning(move |_| Ok(Some(user.clone())));

        // No refresh token row may be created on a failed login
        refresh_tokens.expect_replace_for_user().times(0);

        let service = service(users, roles, refresh_tokens);

        let result = service.login("a@x.com", "wrong").await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_login_unknown_email_fails_undifferentiated() {
        let mut users = MockTestUserRepository::new();
        let roles = MockTestRoleRepository::new();
        let refresh_tokens = MockTestRefreshTokenRepository::new();

        users
            .expect_find_by_email()
            .times(1)
            .returning(|_| Ok(None));

        let service = service(users, roles, refresh_tokens);

        let result = service.login("nobody@x.com", "pw123").await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_login_federated_only_account_fails_invalid_credentials() {
        let user = alice(None);

        let mut users = MockTestUserRepository::new();
        let roles = MockTestRoleRepository::new();
        let refresh_tokens = MockTestRefreshTokenRepository::new();

        users
            .expect_find_by_email()
            .times(1)
            .returning(move |_| Ok(Some(user.clone())));

        let service = service(users, roles, refresh_tokens);

        let result = service.login("a@x.com", "pw123").await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_login_disabled_account_fails_invalid_credentials() {
        let hash = PasswordHasher::new().hash("pw123").unwrap();
        let mut user = alice(Some(hash));
        user.enabled = false;

        let mut users = MockTestUserRepository::new();
        let roles = MockTestRoleRepository::new();
        let refresh_tokens = MockTestRefreshTokenRepository::new();

        users
            .expect_find_by_email()
            .times(1)
            .returning(move |_| Ok(Some(user.clone())));

        let service = service(users, roles, refresh_tokens);

        let result = service.login("a@x.com", "pw123").await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_refresh_returns_new_access_token_and_same_refresh_token() {
        let user = alice(None);
        let user_id = user.id;

        let stored = RefreshToken {
            id: Uuid::new_v4(),
            token: Uuid::new_v4().to_string(),
            user_id,
            expiry_date: Utc::now() + Duration::days(7),
            revoked: false,
        };
        let refresh_string = stored.token.clone();

        let mut users = MockTestUserRepository::new();
        let roles = MockTestRoleRepository::new();
        let mut refresh_tokens = MockTestRefreshTokenRepository::new();

        refresh_tokens
            .expect_find_by_token()
            .times(1)
            .returning(move |_| Ok(Some(stored.clone())));

        users
            .expect_find_by_id()
            .withf(move |id| *id == user_id)
            .times(1)
            .returning(move |_| Ok(Some(user.clone())));

        let service = service(users, roles, refresh_tokens);

        let tokens = service.refresh_access_token(&refresh_string).await.unwrap();
        assert_eq!(tokens.refresh_token, refresh_string);
        assert_eq!(tokens.token_type, "Bearer");

        let claims = signer().validate(&tokens.access_token).unwrap();
        assert_eq!(claims.sub, "a@x.com");
    }

    #[tokio::test]
    async fn test_refresh_unknown_token_fails_not_found() {
        let users = MockTestUserRepository::new();
        let roles = MockTestRoleRepository::new();
        let mut refresh_tokens = MockTestRefreshTokenRepository::new();

        refresh_tokens
            .expect_find_by_token()
            .times(1)
            .returning(|_| Ok(None));

        let service = service(users, roles, refresh_tokens);

        let result = service.refresh_access_token("unknown").await;
        assert!(matches!(
            result,
            Err(AuthError::Token(TokenError::NotFound))
        ));
    }

    #[tokio::test]
    async fn test_logout_is_idempotent_for_unknown_tokens() {
        let users = MockTestUserRepository::new();
        let roles = MockTestRoleRepository::new();
        let mut refresh_tokens = MockTestRefreshTokenRepository::new();

        refresh_tokens
            .expect_revoke()
            .times(1)
            .returning(|_| Ok(()));

        let service = service(users, roles, refresh_tokens);

        assert!(service.logout("never-issued").await.is_ok());
    }

    #[tokio::test]
    async fn test_issue_tokens_supersedes_previous_refresh_token() {
        let user = alice(None);
        let user_id = user.id;

        let users = MockTestUserRepository::new();
        let roles = MockTestRoleRepository::new();
        let mut refresh_tokens = MockTestRefreshTokenRepository::new();

        // The store-level replace is called once per issuance; the upsert
        // keyed by user id is what removes the prior row.
        refresh_tokens
            .expect_replace_for_user()
            .withf(move |t| t.user_id == user_id)
            .times(2)
            .returning(|token| Ok(token));

        let service = service(users, roles, refresh_tokens);

        let first = service.issue_tokens(&user).await.unwrap();
        let second = service.issue_tokens(&user).await.unwrap();
        assert_ne!(first.refresh_token, second.refresh_token);
    }
}
