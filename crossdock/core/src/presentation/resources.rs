// Copyright (c) 2026 Crossdock Maintainers
// SPDX-License-Identifier: AGPL-3.0
//! Remote resource proxy and the source side of the copy operation.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;

use crate::application::copy::CopyReceipt;
use crate::domain::transfer::{CopyAction, ResourceItem};
use crate::presentation::agents::load_owned;
use crate::presentation::api::{current_user, AppState};
use crate::presentation::error::ApiError;

/// Relays remote resource metadata for browsing, untouched apart from the
/// unauthorized demotion.
pub async fn show_remote(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((id, path)): Path<(u32, String)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let (user, session) = current_user(&state, &headers).await?;
    let agent = load_owned(&state, &user, id).await?;

    let reply = state
        .gateway
        .get_resource(agent.id, &format!("/{path}"), &session)
        .await?;

    if reply.status == 401 {
        return Err(ApiError::new(StatusCode::FORBIDDEN, reply.error));
    }
    if reply.status != 200 {
        let status =
            StatusCode::from_u16(reply.status).unwrap_or(StatusCode::BAD_GATEWAY);
        return Err(ApiError::new(status, reply.error));
    }

    Ok(Json(reply.resource))
}

#[derive(Debug, Deserialize)]
pub struct CopyQuery {
    pub action: String,
    #[serde(default)]
    pub compress: bool,
}

/// Validates and dispatches a batch of items towards the agent. The path
/// segment is part of the route shape only; the batch travels in the body.
pub async fn source_copy(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((id, _path)): Path<(u32, String)>,
    Query(query): Query<CopyQuery>,
    Json(items): Json<Vec<ResourceItem>>,
) -> Result<Json<CopyReceipt>, ApiError> {
    let (user, session) = current_user(&state, &headers).await?;
    let agent = load_owned(&state, &user, id).await?;

    let action: CopyAction = query
        .action
        .parse()
        .map_err(|_| ApiError::new(StatusCode::NOT_IMPLEMENTED, "action not implemented"))?;

    let receipt = state
        .orchestrator
        .source_copy(&user, &agent, action, items, query.compress, &session)
        .await?;
    Ok(Json(receipt))
}
