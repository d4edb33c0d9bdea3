// Copyright (c) 2026 Crossdock Maintainers
// SPDX-License-Identifier: AGPL-3.0
//! Remote-side endpoints: what a peer instance's agent transport calls
//! back into on this instance.
//!
//! All of them sit behind the internal-host guard: the transport reaches
//! this server over a loopback origin, so any request whose `Host` does not
//! reconstruct the configured internal address is answered 401 before any
//! body is inspected.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;
use tracing::warn;

use crate::application::progress::PublishError;
use crate::application::session::IssuedToken;
use crate::domain::transfer::ResourceItem;
use crate::domain::user::{Password, User};
use crate::presentation::api::{current_user, AppState};
use crate::presentation::error::ApiError;

/// The loopback-origin check. `Host` is compared against the configured
/// internal address, scheme included.
fn require_internal(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    if format!("http://{host}") != state.config.internal_address {
        return Err(ApiError::new(StatusCode::UNAUTHORIZED, "unauthorized"));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct VerifyCredentialsRequest {
    pub name: String,
    pub password: Password,
    pub access_token: String,
}

/// Resolves a delegated identity from a name/password pair, under the
/// authority of a valid temporary access token.
pub async fn verify_user_credentials(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<VerifyCredentialsRequest>,
) -> Result<Json<User>, ApiError> {
    require_internal(&state, &headers)?;

    let user = state
        .issuer
        .verify_credentials(&request.name, request.password, &request.access_token)
        .await?;
    Ok(Json(user))
}

#[derive(Debug, Deserialize)]
pub struct TokenUserRequest {
    pub access_token: String,
}

/// Resolves the identity a temporary access token is scoped to.
pub async fn token_user(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<TokenUserRequest>,
) -> Result<Json<User>, ApiError> {
    require_internal(&state, &headers)?;

    let user = state.issuer.token_user(&request.access_token).await?;
    Ok(Json(user))
}

/// Issues a short-lived delegated token for the session user. The session
/// must belong to the addressed user.
pub async fn temporary_access_token(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(user_id): Path<u32>,
) -> Result<Json<IssuedToken>, ApiError> {
    require_internal(&state, &headers)?;

    let (user, _) = current_user(&state, &headers).await?;
    if user.id != user_id {
        return Err(ApiError::forbidden());
    }

    Ok(Json(state.issuer.issue(&user)))
}

#[derive(Debug, Deserialize)]
pub struct AcceptResourcesRequest {
    pub access_token: String,
    pub items: Vec<ResourceItem>,
}

/// Destination-side validation of an incoming batch. Answers with the
/// scoped root the extraction phase should unpack under.
pub async fn accept_resources(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(user_id): Path<u32>,
    Json(request): Json<AcceptResourcesRequest>,
) -> Result<Json<String>, ApiError> {
    require_internal(&state, &headers)?;

    let user = state.issuer.token_user(&request.access_token).await?;
    if user.id != user_id {
        return Err(ApiError::forbidden());
    }

    let scoped_root = state.orchestrator.accept_destination(&user, &request.items)?;
    Ok(Json(scoped_root))
}

#[derive(Debug, Deserialize)]
pub struct ProgressEvent {
    pub message: String,
}

/// Accepts one progress message from the transport. A full channel drops
/// the message but still answers 200: progress is a best-effort hint and
/// the publisher must never stall on it.
pub async fn publish_event(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(transfer_id): Path<String>,
    Json(event): Json<ProgressEvent>,
) -> Result<StatusCode, ApiError> {
    require_internal(&state, &headers)?;

    match state.registry.publish(&transfer_id, event.message) {
        Ok(()) => Ok(StatusCode::OK),
        Err(PublishError::Lagged(id)) => {
            warn!(transfer = %id, "progress listener lagging, message dropped");
            Ok(StatusCode::OK)
        }
        Err(PublishError::NotFound(_)) => Err(ApiError::not_found()),
    }
}
