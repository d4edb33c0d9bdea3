// Copyright (c) 2026 Crossdock Maintainers
// SPDX-License-Identifier: AGPL-3.0
//! Uniform error-to-response mapping.
//!
//! Every failure leaves as `{"error": "<message>"}` with a status drawn
//! from a fixed taxonomy: 400 for validation, 403 for authorization (a
//! remote 401 is demoted upstream, so it arrives here already as a
//! forbidden variant), 404 for missing records, 409 for conflicts, 501
//! for declared stubs, the relayed remote status for remote refusals, 503
//! for unreachable remotes and 500 otherwise.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use crate::application::copy::CopyError;
use crate::application::directory::DirectoryError;
use crate::application::negotiation::NegotiationError;
use crate::application::session::SessionError;
use crate::domain::gateway::GatewayError;
use crate::domain::repository::RepositoryError;

pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn forbidden() -> Self {
        Self::new(StatusCode::FORBIDDEN, "forbidden")
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "not found")
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, message = %self.message, "request failed");
        }
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

fn remote_status(status: u16) -> StatusCode {
    StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY)
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        let message = err.to_string();
        match err {
            GatewayError::Transport(_) => Self::new(StatusCode::SERVICE_UNAVAILABLE, message),
            GatewayError::Remote { status, .. } => Self::new(remote_status(status), message),
            GatewayError::Decode(_) | GatewayError::Protocol(_) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        let message = err.to_string();
        match err {
            RepositoryError::NotFound => Self::new(StatusCode::NOT_FOUND, message),
            RepositoryError::AlreadyExists => Self::new(StatusCode::CONFLICT, message),
            RepositoryError::Storage(_) => Self::new(StatusCode::INTERNAL_SERVER_ERROR, message),
        }
    }
}

impl From<DirectoryError> for ApiError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::Invalid(inner) => Self::bad_request(inner.to_string()),
            DirectoryError::Repository(inner) => inner.into(),
        }
    }
}

impl From<NegotiationError> for ApiError {
    fn from(err: NegotiationError) -> Self {
        match err {
            NegotiationError::Invalid(inner) => Self::bad_request(inner.to_string()),
            NegotiationError::Forbidden(message) => Self::new(StatusCode::FORBIDDEN, message),
            NegotiationError::Gateway(inner) => inner.into(),
            NegotiationError::Directory(inner) => inner.into(),
        }
    }
}

impl From<CopyError> for ApiError {
    fn from(err: CopyError) -> Self {
        let message = err.to_string();
        match err {
            CopyError::BadEncoding(_) => Self::bad_request(message),
            CopyError::Denied(_) => Self::new(StatusCode::FORBIDDEN, message),
            CopyError::Unreadable(_) | CopyError::Unwritable(_) => {
                Self::new(StatusCode::FORBIDDEN, message)
            }
            CopyError::Conflict(_) => Self::new(StatusCode::CONFLICT, message),
            CopyError::NotImplemented => Self::new(StatusCode::NOT_IMPLEMENTED, message),
            CopyError::Rejected { .. } => Self::new(StatusCode::INTERNAL_SERVER_ERROR, message),
            CopyError::Gateway(inner) => inner.into(),
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        let message = err.to_string();
        match err {
            SessionError::InvalidToken | SessionError::BadCredentials => {
                Self::new(StatusCode::FORBIDDEN, message)
            }
            SessionError::Store(_) => Self::new(StatusCode::INTERNAL_SERVER_ERROR, message),
        }
    }
}

/// Remote 401s on proxied calls mean the delegated trust is insufficient,
/// not that the local caller forgot to authenticate.
pub(crate) fn demote_unauthorized(err: GatewayError) -> ApiError {
    match err {
        GatewayError::Remote {
            status: 401,
            message,
        } => ApiError::new(StatusCode::FORBIDDEN, message),
        other => other.into(),
    }
}
