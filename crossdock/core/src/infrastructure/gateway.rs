// Copyright (c) 2026 Crossdock Maintainers
// SPDX-License-Identifier: AGPL-3.0
//! HTTP implementation of [`AgentGateway`] against the co-located agent
//! transport.
//!
//! Conventions of the wire protocol:
//! - the end-user session is forwarded as the `rc_auth` cookie;
//! - outbound resource paths are percent-escaped into a single segment;
//! - every response may carry an error envelope — a non-2xx status, a
//!   non-empty `error` string, or a non-zero `code` each independently
//!   signal failure;
//! - every call is a single attempt bounded by the client-wide timeout.

use std::time::Duration;

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::domain::agent::{AgentId, RemoteUser, TokenUser};
use crate::domain::gateway::{
    AccessTokenGrant, AgentGateway, CopyAcceptance, GatewayError, ResourceReply, VersionInfo,
    VersionReport,
};
use crate::domain::transfer::ResourceItem;

/// Session cookie name shared with the remote side's session extraction.
pub const AUTH_COOKIE: &str = "rc_auth";

/// Outbound calls must not hang the calling task on an unresponsive
/// remote; the baseline design had no deadline, this one does.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Escapes a path into a single URL segment (slashes included).
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

#[derive(Debug, Deserialize)]
struct AccessTokenResponse {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    token: String,
    #[serde(default)]
    valid_until: i64,
    #[serde(default)]
    error: String,
}

#[derive(Debug, Deserialize)]
struct ExchangeKeysResponse {
    success: Option<bool>,
    #[serde(default)]
    error: String,
}

#[derive(Debug, Deserialize)]
struct TokenUserResponse {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    id: u32,
    #[serde(default)]
    name: String,
    #[serde(default)]
    error: String,
}

#[derive(Debug, Deserialize)]
struct RemoteUserResponse {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    id: u32,
    #[serde(default)]
    token: String,
    #[serde(default)]
    error: String,
}

#[derive(Debug, Deserialize)]
struct ResourceResponse {
    #[serde(default)]
    resource: serde_json::Value,
    #[serde(default)]
    error: String,
}

#[derive(Debug, Default, Deserialize)]
struct VersionResponse {
    #[serde(default)]
    latency: String,
    #[serde(default)]
    version: VersionInfo,
    #[serde(default)]
    error: String,
}

pub struct HttpAgentGateway {
    base_url: String,
    client: Client,
}

impl HttpAgentGateway {
    pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn cookie(session: &str) -> String {
        format!("{AUTH_COOKIE}={session}")
    }
}

fn send_error(err: reqwest::Error) -> GatewayError {
    if err.is_decode() {
        GatewayError::Decode(err.to_string())
    } else {
        GatewayError::Transport(err.to_string())
    }
}

fn status_text(status: StatusCode) -> String {
    status
        .canonical_reason()
        .unwrap_or("unknown status")
        .to_string()
}

/// The shared failure contract of identity-resolution responses: a non-2xx
/// status relays the remote message with its status; an error string on a
/// 2xx means the remote reached its own backend but got refused (503); a
/// non-zero code without a message is a protocol violation.
fn check_identity_envelope(
    status: StatusCode,
    code: i32,
    error: &str,
) -> Result<(), GatewayError> {
    if !status.is_success() {
        return Err(GatewayError::Remote {
            status: status.as_u16(),
            message: if error.is_empty() {
                status_text(status)
            } else {
                error.to_string()
            },
        });
    }
    if !error.is_empty() {
        return Err(GatewayError::Remote {
            status: 503,
            message: error.to_string(),
        });
    }
    if code != 0 {
        return Err(GatewayError::Protocol(format!(
            "agent transport replied with code {code}"
        )));
    }
    Ok(())
}

#[async_trait]
impl AgentGateway for HttpAgentGateway {
    async fn temporary_access_token(
        &self,
        user_id: u32,
        session: &str,
    ) -> Result<AccessTokenGrant, GatewayError> {
        let url = self.url(&format!("/api/users/{user_id}/temporary-access-token"));
        let response = self
            .client
            .get(url)
            .header(header::COOKIE, Self::cookie(session))
            .send()
            .await
            .map_err(send_error)?;

        let status = response.status();
        let body: AccessTokenResponse = response.json().await.map_err(send_error)?;
        check_identity_envelope(status, body.code, &body.error)?;

        Ok(AccessTokenGrant {
            token: body.token,
            valid_until: body.valid_until,
        })
    }

    async fn token_user(
        &self,
        user_id: u32,
        host: &str,
        port: &str,
        access_token: &str,
        session: &str,
    ) -> Result<TokenUser, GatewayError> {
        let url = self.url(&format!(
            "/api/users/{user_id}/connections/{host}/{port}/token-user"
        ));
        let response = self
            .client
            .post(url)
            .header(header::COOKIE, Self::cookie(session))
            .json(&json!({ "access_token": access_token }))
            .send()
            .await
            .map_err(send_error)?;

        let status = response.status();
        let body: TokenUserResponse = response.json().await.map_err(send_error)?;
        check_identity_envelope(status, body.code, &body.error)?;

        Ok(TokenUser {
            id: body.id,
            name: body.name,
        })
    }

    async fn exchange_keys(
        &self,
        user_id: u32,
        host: &str,
        port: &str,
        secret: &str,
        session: &str,
    ) -> Result<(), GatewayError> {
        let url = self.url(&format!("/api/users/{user_id}/connections"));
        let response = self
            .client
            .post(url)
            .header(header::COOKIE, Self::cookie(session))
            .json(&json!({ "host": host, "port": port, "secret": secret }))
            .send()
            .await
            .map_err(send_error)?;

        let status = response.status();
        let body: ExchangeKeysResponse = response.json().await.map_err(send_error)?;

        if !status.is_success() {
            return Err(GatewayError::Remote {
                status: status.as_u16(),
                message: format!("key exchange error: {}", body.error),
            });
        }

        // Success must be confirmed explicitly in the body; a bare 200 is
        // a protocol violation.
        if body.success != Some(true) {
            return Err(GatewayError::Protocol(
                "key exchange did not confirm success".to_string(),
            ));
        }

        debug!(host, port, "exchanged keys");
        Ok(())
    }

    async fn remote_login(
        &self,
        user_id: u32,
        host: &str,
        port: &str,
        name: &str,
        password: &str,
        session: &str,
    ) -> Result<RemoteUser, GatewayError> {
        let url = self.url(&format!("/api/users/{user_id}/connections/{host}/{port}/login"));
        let response = self
            .client
            .post(url)
            .header(header::COOKIE, Self::cookie(session))
            .json(&json!({ "name": name, "password": password }))
            .send()
            .await
            .map_err(send_error)?;

        let status = response.status();
        let body: RemoteUserResponse = response.json().await.map_err(send_error)?;
        check_identity_envelope(status, body.code, &body.error)?;

        Ok(RemoteUser {
            id: body.id,
            name: String::new(),
            token: body.token,
        })
    }

    async fn get_resource(
        &self,
        agent_id: AgentId,
        path: &str,
        session: &str,
    ) -> Result<ResourceReply, GatewayError> {
        let escaped = utf8_percent_encode(path, PATH_SEGMENT);
        let url = self.url(&format!("/api/agents/{agent_id}/resources/{escaped}"));
        let response = self
            .client
            .get(url)
            .header(header::COOKIE, Self::cookie(session))
            .send()
            .await
            .map_err(send_error)?;

        let status = response.status();
        let body: ResourceResponse = response.json().await.map_err(send_error)?;

        Ok(ResourceReply {
            status: status.as_u16(),
            resource: body.resource,
            error: body.error,
        })
    }

    async fn remote_copy(
        &self,
        agent_id: AgentId,
        archive_name: &str,
        source_root: &str,
        session: &str,
        items: &[ResourceItem],
        compress: bool,
    ) -> Result<CopyAcceptance, GatewayError> {
        let url = self.url(&format!("/api/agents/{agent_id}/resources/{archive_name}"));
        let response = self
            .client
            .patch(url)
            .header(header::COOKIE, Self::cookie(session))
            .json(&json!({
                "items": items,
                "compress": compress,
                "source_root": source_root,
            }))
            .send()
            .await
            .map_err(send_error)?;

        let status = response.status();
        let body: CopyAcceptance = response.json().await.map_err(send_error)?;

        if !status.is_success() {
            return Err(GatewayError::Remote {
                status: status.as_u16(),
                message: body.message,
            });
        }

        Ok(body)
    }

    async fn cancel_transfer(
        &self,
        agent_id: AgentId,
        transfer_id: &str,
        session: &str,
    ) -> Result<(), GatewayError> {
        let url = self.url(&format!("/api/agents/{agent_id}/transfers/{transfer_id}"));
        let response = self
            .client
            .delete(url)
            .header(header::COOKIE, Self::cookie(session))
            .send()
            .await
            .map_err(send_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Remote {
                status: status.as_u16(),
                message: format!("cancel transfer error: {}", status_text(status)),
            });
        }
        Ok(())
    }

    async fn version(&self, agent_id: AgentId, session: &str) -> VersionReport {
        let unknown = VersionInfo {
            agent: "unknown".to_string(),
            files: "unknown".to_string(),
        };
        let url = self.url(&format!("/api/agents/{agent_id}/version"));

        let response = match self
            .client
            .get(url)
            .header(header::COOKIE, Self::cookie(session))
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                return VersionReport {
                    latency: String::new(),
                    version: unknown,
                    error: format!("error sending agent transport request: {err}"),
                }
            }
        };

        let body: VersionResponse = match response.json().await {
            Ok(body) => body,
            Err(err) => {
                return VersionReport {
                    latency: String::new(),
                    version: unknown,
                    error: format!("decode error: {err}"),
                }
            }
        };

        if !body.error.is_empty() {
            return VersionReport {
                latency: body.latency,
                version: unknown,
                error: body.error,
            };
        }

        VersionReport {
            latency: body.latency,
            version: body.version,
            error: String::new(),
        }
    }
}
