// Copyright (c) 2026 Crossdock Maintainers
// SPDX-License-Identifier: AGPL-3.0
//! Transfer cancellation.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};

use crate::presentation::agents::load_owned;
use crate::presentation::api::{current_user, AppState};
use crate::presentation::error::ApiError;

/// Asks the remote instance to abort an in-flight transfer and drops any
/// local progress channel for it.
pub async fn cancel(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((id, transfer_id)): Path<(u32, String)>,
) -> Result<StatusCode, ApiError> {
    let (user, session) = current_user(&state, &headers).await?;
    let agent = load_owned(&state, &user, id).await?;

    state
        .orchestrator
        .cancel(&agent, &transfer_id, &session)
        .await?;
    state.registry.close(&transfer_id);
    Ok(StatusCode::NO_CONTENT)
}
