// Copyright (c) 2026 Crossdock Maintainers
// SPDX-License-Identifier: AGPL-3.0
//! Agent CRUD, trust registration and the delegated-token proxy.
//!
//! Every record leaving these handlers went through the directory, so the
//! handshake secret is already scrubbed. Non-admins see and touch only
//! their own agents.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use crate::domain::agent::{Agent, AgentId, Lookup};
use crate::domain::user::{Password, User};
use crate::presentation::api::{current_user, AppState};
use crate::presentation::error::{demote_unauthorized, ApiError};

/// Frontend location a freshly registered agent shows up under.
const AGENTS_LOCATION: &str = "/settings/agents";

/// Loads an agent the acting user is allowed to manage.
pub(crate) async fn load_owned(
    state: &AppState,
    user: &User,
    id: u32,
) -> Result<Agent, ApiError> {
    let agent = state.directory.get(&Lookup::ById(AgentId(id))).await?;
    if agent.owner_id != user.id && !user.perm.admin {
        return Err(ApiError::forbidden());
    }
    Ok(agent)
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Agent>>, ApiError> {
    let (user, _) = current_user(&state, &headers).await?;

    let mut agents = if user.perm.admin {
        state.directory.get_all().await?
    } else {
        state.directory.find_by_owner(user.id).await?
    };
    agents.sort_by_key(|a| a.id.0);
    Ok(Json(agents))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(draft): Json<Agent>,
) -> Result<impl IntoResponse, ApiError> {
    let (user, session) = current_user(&state, &headers).await?;

    let agent = state.negotiator.register(&user, draft, &session).await?;
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, AGENTS_LOCATION)],
        Json(agent),
    ))
}

pub async fn show(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<u32>,
) -> Result<Json<Agent>, ApiError> {
    let (user, _) = current_user(&state, &headers).await?;
    let agent = load_owned(&state, &user, id).await?;
    Ok(Json(agent))
}

pub async fn remove(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<u32>,
) -> Result<StatusCode, ApiError> {
    let (user, _) = current_user(&state, &headers).await?;
    let agent = load_owned(&state, &user, id).await?;

    state.directory.delete(agent.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn remote_version(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<u32>,
) -> Result<impl IntoResponse, ApiError> {
    let (user, session) = current_user(&state, &headers).await?;
    let agent = load_owned(&state, &user, id).await?;

    let report = state.gateway.version(agent.id, &session).await;
    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub name: String,
    pub password: Password,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<u32>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Agent>, ApiError> {
    let (user, session) = current_user(&state, &headers).await?;
    let mut agent = load_owned(&state, &user, id).await?;

    state
        .negotiator
        .login(&mut agent, request.name, request.password, &session)
        .await?;
    Ok(Json(agent))
}

/// Local-facing proxy: fetches a short-lived delegated token for the
/// acting user. Users can only request tokens for themselves.
pub async fn temporary_access_token(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<u32>,
) -> Result<impl IntoResponse, ApiError> {
    let (user, session) = current_user(&state, &headers).await?;
    if user.id != id {
        return Err(ApiError::forbidden());
    }

    let grant = state
        .gateway
        .temporary_access_token(user.id, &session)
        .await
        .map_err(demote_unauthorized)?;
    Ok(Json(grant))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::agent::{RemoteUser, TokenUser};
    use crate::domain::gateway::{
        AccessTokenGrant, AgentGateway, CopyAcceptance, GatewayError, ResourceReply,
        VersionInfo, VersionReport,
    };
    use crate::domain::transfer::ResourceItem;
    use crate::presentation::api::{app, testing};
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::util::ServiceExt;

    /// Gateway that answers every handshake happily.
    struct FriendlyGateway;

    #[async_trait]
    impl AgentGateway for FriendlyGateway {
        async fn temporary_access_token(
            &self,
            _user_id: u32,
            _session: &str,
        ) -> Result<AccessTokenGrant, GatewayError> {
            Ok(AccessTokenGrant {
                token: "grant".into(),
                valid_until: 4_102_444_800,
            })
        }

        async fn token_user(
            &self,
            _user_id: u32,
            _host: &str,
            _port: &str,
            _access_token: &str,
            _session: &str,
        ) -> Result<TokenUser, GatewayError> {
            Ok(TokenUser {
                id: 6,
                name: "remote".into(),
            })
        }

        async fn exchange_keys(
            &self,
            _user_id: u32,
            _host: &str,
            _port: &str,
            _secret: &str,
            _session: &str,
        ) -> Result<(), GatewayError> {
            Ok(())
        }

        async fn remote_login(
            &self,
            _user_id: u32,
            _host: &str,
            _port: &str,
            _name: &str,
            _password: &str,
            _session: &str,
        ) -> Result<RemoteUser, GatewayError> {
            Ok(RemoteUser {
                id: 9,
                name: String::new(),
                token: "delegated".into(),
            })
        }

        async fn get_resource(
            &self,
            _agent_id: AgentId,
            _path: &str,
            _session: &str,
        ) -> Result<ResourceReply, GatewayError> {
            Ok(ResourceReply {
                status: 200,
                resource: serde_json::json!({}),
                error: String::new(),
            })
        }

        async fn remote_copy(
            &self,
            _agent_id: AgentId,
            _archive_name: &str,
            _source_root: &str,
            _session: &str,
            _items: &[ResourceItem],
            _compress: bool,
        ) -> Result<CopyAcceptance, GatewayError> {
            Ok(CopyAcceptance {
                code: 0,
                message: "accepted".into(),
            })
        }

        async fn cancel_transfer(
            &self,
            _agent_id: AgentId,
            _transfer_id: &str,
            _session: &str,
        ) -> Result<(), GatewayError> {
            Ok(())
        }

        async fn version(&self, _agent_id: AgentId, _session: &str) -> VersionReport {
            VersionReport {
                latency: "2ms".into(),
                version: VersionInfo {
                    agent: "1.2.3".into(),
                    files: "4.5.6".into(),
                },
                error: String::new(),
            }
        }
    }

    fn registration_body() -> Body {
        Body::from(
            serde_json::json!({
                "host": "peer.example",
                "port": "8080",
                "secret": "swordfish"
            })
            .to_string(),
        )
    }

    async fn register_one(app: &axum::Router) -> serde_json::Value {
        let response = app
            .clone()
            .oneshot(
                Request::post("/api/agents")
                    .header("cookie", "rc_auth=ada-session")
                    .header("content-type", "application/json")
                    .body(registration_body())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            AGENTS_LOCATION
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn registration_returns_created_without_the_secret() {
        let app = app(testing::state_with_gateway(Arc::new(FriendlyGateway)));
        let body = register_one(&app).await;
        assert_eq!(body["host"], "peer.example");
        assert!(body.get("secret").is_none());
        assert_eq!(body["remote_user"]["id"], 6);
    }

    #[tokio::test]
    async fn admin_can_inspect_and_owner_can_delete() {
        let state = testing::state_with_gateway(Arc::new(FriendlyGateway));
        let app = app(state.clone());
        let created = register_one(&app).await;
        let id = created["id"].as_u64().unwrap();

        let response = app
            .clone()
            .oneshot(
                Request::get(format!("/api/agents/{id}"))
                    .header("cookie", "rc_auth=root-session")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        // Admin may look.
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(
                Request::delete(format!("/api/agents/{id}"))
                    .header("cookie", "rc_auth=ada-session")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn missing_agent_is_not_found() {
        let app = app(testing::state_with_gateway(Arc::new(FriendlyGateway)));
        let response = app
            .oneshot(
                Request::get("/api/agents/99")
                    .header("cookie", "rc_auth=ada-session")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn token_proxy_is_restricted_to_the_acting_user() {
        let app = app(testing::state_with_gateway(Arc::new(FriendlyGateway)));

        let response = app
            .clone()
            .oneshot(
                Request::get("/api/users/2/temporary-access-token")
                    .header("cookie", "rc_auth=ada-session")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = app
            .oneshot(
                Request::get("/api/users/1/temporary-access-token")
                    .header("cookie", "rc_auth=ada-session")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn remote_version_is_served_for_owned_agents() {
        let state = testing::state_with_gateway(Arc::new(FriendlyGateway));
        let app = app(state);
        let created = register_one(&app).await;
        let id = created["id"].as_u64().unwrap();

        let response = app
            .oneshot(
                Request::get(format!("/api/agents/{id}/version"))
                    .header("cookie", "rc_auth=ada-session")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["version"]["agent"], "1.2.3");
    }
}
