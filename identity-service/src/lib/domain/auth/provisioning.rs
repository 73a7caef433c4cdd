use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Map;
use serde_json::Value;

use crate::auth::errors::AuthError;
use crate::auth::models::EmailAddress;
use crate::auth::models::User;
use crate::auth::models::UserId;
use crate::auth::models::DEFAULT_ROLE;
use crate::auth::ports::RoleRepository;
use crate::auth::ports::UserRepository;

/// Post-handshake identity assertion from a federated provider.
///
/// The OAuth2 redirect flow itself happens upstream; by the time an
/// assertion reaches this engine the provider has already verified it.
#[derive(Debug, Clone)]
pub struct FederatedAssertion {
    pub provider: String,
    pub attributes: Map<String, Value>,
}

/// Extracts the verified email address from a provider's attribute map.
pub type AttributeExtractor = fn(&Map<String, Value>) -> Option<String>;

/// Registry of provider-specific attribute extraction rules.
///
/// Open to extension: supporting a new provider is one `register` call,
/// not a new branch in a conditional chain.
pub struct ProviderRegistry {
    extractors: HashMap<String, AttributeExtractor>,
}

fn email_attribute(attributes: &Map<String, Value>) -> Option<String> {
    attributes
        .get("email")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            extractors: HashMap::new(),
        }
    }

    /// Registry pre-populated with the providers the service ships with.
    /// Google and GitHub both expose the address under `email`.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("google", email_attribute);
        registry.register("github", email_attribute);
        registry
    }

    pub fn register(&mut self, provider: impl Into<String>, extractor: AttributeExtractor) {
        self.extractors.insert(provider.into(), extractor);
    }

    /// Extract the asserted email for a provider.
    ///
    /// # Errors
    /// * `UnsupportedProvider` - No extraction rule registered for the name
    /// * `InvalidAssertion` - The attributes carry no email
    pub fn email_for(&self, assertion: &FederatedAssertion) -> Result<String, AuthError> {
        let extractor = self
            .extractors
            .get(&assertion.provider)
            .ok_or_else(|| AuthError::UnsupportedProvider(assertion.provider.clone()))?;

        extractor(&assertion.attributes).ok_or_else(|| {
            AuthError::InvalidAssertion(format!(
                "no email attribute in assertion from {}",
                assertion.provider
            ))
        })
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Port for federated identity provisioning.
#[async_trait]
pub trait ProvisioningPort: Send + Sync + 'static {
    /// Resolve a federated assertion into a local user record.
    ///
    /// # Errors
    /// * `UnsupportedProvider` - Provider has no extraction rule
    /// * `InvalidAssertion` - Assertion carries no usable email
    /// * `Database` - Store operation failed
    async fn resolve(&self, assertion: FederatedAssertion) -> Result<User, AuthError>;
}

/// Resolves a verified provider assertion into a local user, creating a
/// federated-only account on first login.
///
/// Issuance is not handled here: the caller feeds the resolved user into
/// the authentication engine's `issue_tokens`, the same path password
/// login takes.
pub struct ProvisioningService<UR, RR>
where
    UR: UserRepository,
    RR: RoleRepository,
{
    users: Arc<UR>,
    roles: Arc<RR>,
    registry: ProviderRegistry,
}

impl<UR, RR> ProvisioningService<UR, RR>
where
    UR: UserRepository,
    RR: RoleRepository,
{
    pub fn new(users: Arc<UR>, roles: Arc<RR>, registry: ProviderRegistry) -> Self {
        Self {
            users,
            roles,
            registry,
        }
    }
}

#[async_trait]
impl<UR, RR> ProvisioningPort for ProvisioningService<UR, RR>
where
    UR: UserRepository,
    RR: RoleRepository,
{
    async fn resolve(&self, assertion: FederatedAssertion) -> Result<User, AuthError> {
        let email = self.registry.email_for(&assertion)?;
        let email = EmailAddress::new(email)?;

        if let Some(user) = self.users.find_by_email(email.as_str()).await? {
            return Ok(user);
        }

        let role = self.roles.get_or_create(DEFAULT_ROLE).await?;

        let user = User {
            id: UserId::new(),
            email: email.clone(),
            // Federated-only account: no local password
            password_hash: None,
            full_name: email.as_str().to_string(),
            enabled: true,
            roles: vec![role],
        };

        match self.users.create(user).await {
            Ok(created) => {
                tracing::info!(
                    email = %created.email,
                    provider = %assertion.provider,
                    "Provisioned federated user"
                );
                Ok(created)
            }
            // Concurrent first login for the same address: another request
            // created the row between our lookup and insert. Read the winner.
            Err(AuthError::EmailAlreadyExists(_)) => self
                .users
                .find_by_email(email.as_str())
                .await?
                .ok_or_else(|| {
                    AuthError::Unknown(format!("user {} vanished after conflict", email))
                }),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use mockall::mock;
    use serde_json::json;
    use uuid::Uuid;

    use super::*;
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

    fn assertion(provider: &str, email: &str) -> FederatedAssertion {
        let mut attributes = Map::new();
        attributes.insert("email".to_string(), json!(email));
        FederatedAssertion {
            provider: provider.to_string(),
            attributes,
        }
    }

    fn user_role() -> Role {
        Role {
            id: Uuid::new_v4(),
            name: DEFAULT_ROLE.to_string(),
        }
    }

    fn existing_user(email: &str) -> User {
        User {
            id: UserId::new(),
            email: EmailAddress::new(email.to_string()).unwrap(),
            password_hash: None,
            full_name: email.to_string(),
            enabled: true,
            roles: vec![user_role()],
        }
    }

    #[tokio::test]
    async fn test_resolve_creates_federated_only_user_on_first_login() {
        let mut users = MockTestUserRepository::new();
        let mut roles = MockTestRoleRepository::new();

        users
            .expect_find_by_email()
            .withf(|email| email == "a@x.com")
            .times(1)
            .returning(|_| Ok(None));

        roles
            .expect_get_or_create()
            .withf(|name| name == DEFAULT_ROLE)
            .times(1)
            .returning(|_| Ok(user_role()));

        users
            .expect_create()
            .withf(|user| {
                user.email.as_str() == "a@x.com"
                    && user.password_hash.is_none()
                    && user.full_name == "a@x.com"
                    && user.enabled
                    && user.role_names() == vec![DEFAULT_ROLE.to_string()]
            })
            .times(1)
            .returning(|user| Ok(user));

        let service = ProvisioningService::new(
            Arc::new(users),
            Arc::new(roles),
            ProviderRegistry::with_defaults(),
        );

        let user = service.resolve(assertion("google", "a@x.com")).await.unwrap();
        assert!(user.password_hash.is_none());
    }

    #[tokio::test]
    async fn test_resolve_returns_existing_user_unchanged() {
        let mut users = MockTestUserRepository::new();
        let roles = MockTestRoleRepository::new();

        users
            .expect_find_by_email()
            .times(1)
            .returning(|_| Ok(Some(existing_user("a@x.com"))));
        users.expect_create().times(0);

        let service = ProvisioningService::new(
            Arc::new(users),
            Arc::new(roles),
            ProviderRegistry::with_defaults(),
        );

        let user = service.resolve(assertion("github", "a@x.com")).await.unwrap();
        assert_eq!(user.email.as_str(), "a@x.com");
    }

    #[tokio::test]
    async fn test_resolve_unknown_provider_fails() {
        let users = MockTestUserRepository::new();
        let roles = MockTestRoleRepository::new();

        let service = ProvisioningService::new(
            Arc::new(users),
            Arc::new(roles),
            ProviderRegistry::with_defaults(),
        );

        let result = service.resolve(assertion("myspace", "a@x.com")).await;
        assert!(matches!(result, Err(AuthError::UnsupportedProvider(_))));
    }

    #[tokio::test]
    async fn test_resolve_assertion_without_email_fails() {
        let users = MockTestUserRepository::new();
        let roles = MockTestRoleRepository::new();

        let service = ProvisioningService::new(
            Arc::new(users),
            Arc::new(roles),
            ProviderRegistry::with_defaults(),
        );

        let bare = FederatedAssertion {
            provider: "google".to_string(),
            attributes: Map::new(),
        };

        let result = service.resolve(bare).await;
        assert!(matches!(result, Err(AuthError::InvalidAssertion(_))));
    }

    #[tokio::test]
    async fn test_resolve_concurrent_creation_reads_winner() {
        let mut users = MockTestUserRepository::new();
        let mut roles = MockTestRoleRepository::new();

        let mut lookups = 0;
        users.expect_find_by_email().times(2).returning(move |_| {
            lookups += 1;
            if lookups == 1 {
                Ok(None)
            } else {
                Ok(Some(existing_user("a@x.com")))
            }
        });

        roles
            .expect_get_or_create()
            .times(1)
            .returning(|_| Ok(user_role()));

        users
            .expect_create()
            .times(1)
            .returning(|_| Err(AuthError::EmailAlreadyExists("a@x.com".to_string())));

        let service = ProvisioningService::new(
            Arc::new(users),
            Arc::new(roles),
            ProviderRegistry::with_defaults(),
        );

        let user = service.resolve(assertion("google", "a@x.com")).await.unwrap();
        assert_eq!(user.email.as_str(), "a@x.com");
    }

    #[tokio::test]
    async fn test_registry_is_open_to_extension() {
        let mut registry = ProviderRegistry::with_defaults();
        registry.register("gitlab", |attrs| {
            attrs
                .get("primary_email")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string())
        });

        let mut attributes = Map::new();
        attributes.insert("primary_email".to_string(), json!("a@x.com"));

        let email = registry
            .email_for(&FederatedAssertion {
                provider: "gitlab".to_string(),
                attributes,
            })
            .unwrap();
        assert_eq!(email, "a@x.com");
    }
}
