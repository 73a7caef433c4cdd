use std::sync::Arc;
use std::time::Duration;

use authkit::TokenSigner;
use axum::body::Body;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::get;
use axum::routing::post;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::federated_login::federated_login;
use super::handlers::login::login;
use super::handlers::logout::logout;
use super::handlers::me::me;
use super::handlers::refresh::refresh;
use super::handlers::register::register;
use super::middleware::authenticate as auth_middleware;
use crate::auth::provisioning::ProvisioningService;
use crate::auth::service::AuthService;
use crate::outbound::repositories::PostgresRefreshTokenRepository;
use crate::outbound::repositories::PostgresRoleRepository;
use crate::outbound::repositories::PostgresUserRepository;

pub type PostgresAuthService =
    AuthService<PostgresUserRepository, PostgresRoleRepository, PostgresRefreshTokenRepository>;
pub type PostgresProvisioningService =
    ProvisioningService<PostgresUserRepository, PostgresRoleRepository>;

#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<PostgresAuthService>,
    pub provisioning: Arc<PostgresProvisioningService>,
    pub token_signer: Arc<TokenSigner>,
}

pub fn create_router(
    auth_service: Arc<PostgresAuthService>,
    provisioning: Arc<PostgresProvisioningService>,
    token_signer: Arc<TokenSigner>,
) -> Router {
    let state = AppState {
        auth_service,
        provisioning,
        token_signer,
    };

    let public_routes = Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/refresh", post(refresh))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/federated", post(federated_login));

    let protected_routes = Router::new()
        .route("/api/auth/me", get(me))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
