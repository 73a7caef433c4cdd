use std::sync::Arc;

use authkit::TokenSigner;
use chrono::Duration;
use identity_service::auth::provisioning::ProviderRegistry;
use identity_service::auth::provisioning::ProvisioningService;
use identity_service::auth::service::AuthService;
use identity_service::config::Config;
use identity_service::inbound::http::router::create_router;
use identity_service::outbound::repositories::PostgresRefreshTokenRepository;
use identity_service::outbound::repositories::PostgresRoleRepository;
use identity_service::outbound::repositories::PostgresUserRepository;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "identity_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "identity-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        http_port = config.server.http_port,
        access_token_minutes = config.jwt.access_token_minutes,
        refresh_token_days = config.jwt.refresh_token_days,
        "Configuration loaded"
    );

    let pg_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database.url)
        .await?;
    tracing::info!(
        max_connections = 5,
        database = "postgresql",
        "Database connection pool created"
    );

    sqlx::migrate!("./migrations").run(&pg_pool).await?;
    tracing::info!(database = "postgresql", "Database migrations completed");

    // Expired refresh token rows are never swept; each lingers until the
    // user's next login replaces it. Growth is bounded by one row per user.
    tracing::info!("Refresh token store relies on per-user replacement, not sweeping");

    let token_signer = Arc::new(TokenSigner::new(
        config.jwt.secret.as_bytes(),
        Duration::minutes(config.jwt.access_token_minutes),
    ));

    let user_repository = Arc::new(PostgresUserRepository::new(pg_pool.clone()));
    let role_repository = Arc::new(PostgresRoleRepository::new(pg_pool.clone()));
    let refresh_token_repository = Arc::new(PostgresRefreshTokenRepository::new(pg_pool));

    let auth_service = Arc::new(AuthService::new(
        Arc::clone(&user_repository),
        Arc::clone(&role_repository),
        refresh_token_repository,
        Arc::clone(&token_signer),
        Duration::days(config.jwt.refresh_token_days),
    ));

    let provisioning = Arc::new(ProvisioningService::new(
        user_repository,
        role_repository,
        ProviderRegistry::with_defaults(),
    ));

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let application = create_router(auth_service, provisioning, token_signer);
    axum::serve(http_listener, application).await?;

    Ok(())
}
