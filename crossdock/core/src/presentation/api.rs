// Copyright (c) 2026 Crossdock Maintainers
// SPDX-License-Identifier: AGPL-3.0
//! Router assembly and shared request context.
//!
//! One server carries both protocol roles. The local-facing routes act for
//! a browser session resolved from the `rc_auth` cookie; the `/api/agent`
//! routes are the remote side of the protocol and are additionally guarded
//! by the internal-host check in `presentation::internal`.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::application::copy::CopyOrchestrator;
use crate::application::directory::AgentDirectory;
use crate::application::negotiation::TrustNegotiator;
use crate::application::progress::ProgressRegistry;
use crate::application::session::SessionIssuer;
use crate::domain::gateway::AgentGateway;
use crate::domain::user::{SessionVerifier, User};
use crate::presentation::error::ApiError;
use crate::presentation::{agents, internal, resources, sse, transfers};

/// Session cookie consulted by the local-facing routes and forwarded on
/// every outbound transport call.
pub const AUTH_COOKIE: &str = "rc_auth";

#[derive(Clone)]
pub struct ApiConfig {
    /// The origin under which this instance addresses itself for
    /// loopback calls, e.g. `http://127.0.0.1:8080`.
    pub internal_address: String,
    pub version: String,
}

pub struct AppState {
    pub directory: Arc<AgentDirectory>,
    pub negotiator: Arc<TrustNegotiator>,
    pub orchestrator: Arc<CopyOrchestrator>,
    pub issuer: Arc<SessionIssuer>,
    pub registry: Arc<ProgressRegistry>,
    pub gateway: Arc<dyn AgentGateway>,
    pub sessions: Arc<dyn SessionVerifier>,
    pub config: ApiConfig,
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/version", get(version))
        .route("/api/agents", get(agents::list).post(agents::create))
        .route(
            "/api/agents/{id}",
            get(agents::show).delete(agents::remove),
        )
        .route("/api/agents/{id}/version", get(agents::remote_version))
        .route("/api/agents/{id}/login", post(agents::login))
        .route(
            "/api/users/{id}/temporary-access-token",
            get(agents::temporary_access_token),
        )
        .route(
            "/api/agents/{id}/resources/{*path}",
            get(resources::show_remote).patch(resources::source_copy),
        )
        .route(
            "/api/agents/{id}/transfers/{transfer_id}",
            delete(transfers::cancel),
        )
        .route("/api/transfers/{transfer_id}/events", get(sse::events))
        .route(
            "/api/agent/verify-user-credentials",
            post(internal::verify_user_credentials),
        )
        .route("/api/agent/token-user", post(internal::token_user))
        .route(
            "/api/agent/users/{user_id}/temporary-access-token",
            get(internal::temporary_access_token),
        )
        .route(
            "/api/agent/users/{user_id}/resources",
            post(internal::accept_resources),
        )
        .route(
            "/api/agent/transfers/{transfer_id}/events",
            post(internal::publish_event),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn version(State(state): State<Arc<AppState>>) -> String {
    state.config.version.clone()
}

/// Extracts the raw session cookie value from the request headers.
pub(crate) fn session_token(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(axum::http::header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == AUTH_COOKIE).then(|| value.to_string())
    })
}

/// Resolves the acting user and hands back the session token alongside, so
/// handlers can forward it on outbound transport calls.
pub(crate) async fn current_user(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<(User, String), ApiError> {
    let token = session_token(headers).ok_or_else(ApiError::forbidden)?;
    let user = state
        .sessions
        .user_for_session(&token)
        .await
        .ok_or_else(ApiError::forbidden)?;
    Ok((user, token))
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::domain::fs::AccessProbe;
    use crate::domain::user::{AllowAll, Permissions};
    use crate::infrastructure::repositories::InMemoryAgentRepository;
    use crate::infrastructure::users::StaticUserDirectory;
    use std::path::Path;

    /// Probe that approves everything; router tests exercise the HTTP
    /// surface, not the filesystem.
    pub struct OpenProbe;

    impl AccessProbe for OpenProbe {
        fn readable(&self, _path: &Path) -> bool {
            true
        }

        fn writable(&self, _path: &Path) -> bool {
            true
        }

        fn exists(&self, _path: &Path) -> bool {
            false
        }
    }

    pub fn seeded_users() -> Arc<StaticUserDirectory> {
        let users = Arc::new(StaticUserDirectory::new(vec![
            User {
                id: 1,
                username: "ada".into(),
                scope: ".".into(),
                perm: Permissions {
                    admin: false,
                    modify: true,
                },
                password_hash: "s3cret".into(),
            },
            User {
                id: 2,
                username: "root".into(),
                perm: Permissions {
                    admin: true,
                    modify: true,
                },
                ..User::default()
            },
        ]));
        users.register_session("ada-session", 1);
        users.register_session("root-session", 2);
        users
    }

    /// Full state wired against in-memory collaborators and the given
    /// gateway.
    pub fn state_with_gateway(gateway: Arc<dyn AgentGateway>) -> Arc<AppState> {
        let users = seeded_users();
        let directory = Arc::new(AgentDirectory::new(Arc::new(
            InMemoryAgentRepository::new(),
        )));
        let negotiator = Arc::new(TrustNegotiator::new(gateway.clone(), directory.clone()));
        let orchestrator = Arc::new(CopyOrchestrator::new(
            gateway.clone(),
            Arc::new(OpenProbe),
            Arc::new(AllowAll),
            "/srv",
        ));
        let issuer = Arc::new(SessionIssuer::new(users.clone()));

        Arc::new(AppState {
            directory,
            negotiator,
            orchestrator,
            issuer,
            registry: Arc::new(ProgressRegistry::new()),
            gateway,
            sessions: users,
            config: ApiConfig {
                internal_address: "http://127.0.0.1:8080".into(),
                version: "0.4.0-test".into(),
            },
        })
    }
}
