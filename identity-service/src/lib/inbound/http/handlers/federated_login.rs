use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::Map;
use serde_json::Value;

use super::ApiError;
use super::ApiSuccess;
use super::TokenResponseData;
use crate::auth::ports::AuthServicePort;
use crate::auth::provisioning::FederatedAssertion;
use crate::auth::provisioning::ProvisioningPort;
use crate::inbound::http::router::AppState;

/// Completes a federated login from a provider-verified assertion.
///
/// The OAuth2 handshake happens upstream; this endpoint consumes the
/// resulting attribute map, resolves (or provisions) the local user, and
/// issues tokens through the same path as password login.
pub async fn federated_login(
    State(state): State<AppState>,
    Json(body): Json<FederatedLoginRequest>,
) -> Result<ApiSuccess<TokenResponseData>, ApiError> {
    let user = state
        .provisioning
        .resolve(FederatedAssertion {
            provider: body.provider,
            attributes: body.attributes,
        })
        .await
        .map_err(ApiError::from)?;

    state
        .auth_service
        .issue_tokens(&user)
        .await
        .map_err(ApiError::from)
        .map(|tokens| ApiSuccess::new(StatusCode::OK, tokens.into()))
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FederatedLoginRequest {
    provider: String,
    attributes: Map<String, Value>,
}
