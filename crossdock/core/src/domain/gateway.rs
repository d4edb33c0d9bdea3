// Copyright (c) 2026 Crossdock Maintainers
// SPDX-License-Identifier: AGPL-3.0
//! Outbound contract towards the co-located agent transport.
//!
//! Every remote operation crosses the trust boundary through this trait.
//! The reqwest implementation lives in `crate::infrastructure::gateway`;
//! tests substitute their own. Calls are single-attempt: no retry lives on
//! either side of this seam.

use async_trait::async_trait;

use crate::domain::agent::{AgentId, RemoteUser, TokenUser};
use crate::domain::transfer::ResourceItem;

#[derive(Debug, Clone, thiserror::Error)]
pub enum GatewayError {
    /// The request never completed (connection failure, timeout).
    #[error("error sending agent transport request: {0}")]
    Transport(String),

    /// The response body could not be decoded.
    #[error("error decoding agent transport response: {0}")]
    Decode(String),

    /// The remote answered with a failure status or error envelope; the
    /// message is relayed verbatim to the caller.
    #[error("{message}")]
    Remote { status: u16, message: String },

    /// A 2xx response that violates the protocol (e.g. a missing success
    /// flag on key exchange).
    #[error("unexpected agent transport response: {0}")]
    Protocol(String),
}

/// Short-lived delegated access token issued by the remote side.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AccessTokenGrant {
    pub token: String,
    pub valid_until: i64,
}

/// Outcome of the remote copy-acceptance call.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CopyAcceptance {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

/// Remote resource metadata relayed verbatim, along with the remote status.
#[derive(Debug, Clone)]
pub struct ResourceReply {
    pub status: u16,
    pub resource: serde_json::Value,
    pub error: String,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct VersionInfo {
    pub agent: String,
    pub files: String,
}

/// Version + latency probe result. Never fails: unreachable remotes yield
/// `"unknown"` versions and a populated error field.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct VersionReport {
    pub latency: String,
    pub version: VersionInfo,
    pub error: String,
}

#[async_trait]
pub trait AgentGateway: Send + Sync {
    /// Issue a short-lived delegated token for the given user on the
    /// remote side.
    async fn temporary_access_token(
        &self,
        user_id: u32,
        session: &str,
    ) -> Result<AccessTokenGrant, GatewayError>;

    /// Resolve the delegated identity bound to a pre-shared access token
    /// during registration.
    async fn token_user(
        &self,
        user_id: u32,
        host: &str,
        port: &str,
        access_token: &str,
        session: &str,
    ) -> Result<TokenUser, GatewayError>;

    /// Register public keys with the remote instance. Success is signalled
    /// by an explicit flag in the response body, not merely by HTTP status.
    async fn exchange_keys(
        &self,
        user_id: u32,
        host: &str,
        port: &str,
        secret: &str,
        session: &str,
    ) -> Result<(), GatewayError>;

    /// Resolve a delegated identity from name + password for an already
    /// registered agent.
    async fn remote_login(
        &self,
        user_id: u32,
        host: &str,
        port: &str,
        name: &str,
        password: &str,
        session: &str,
    ) -> Result<RemoteUser, GatewayError>;

    /// Fetch resource metadata from the remote instance.
    async fn get_resource(
        &self,
        agent_id: AgentId,
        path: &str,
        session: &str,
    ) -> Result<ResourceReply, GatewayError>;

    /// Hand a validated item batch to the remote copy-acceptance endpoint.
    async fn remote_copy(
        &self,
        agent_id: AgentId,
        archive_name: &str,
        source_root: &str,
        session: &str,
        items: &[ResourceItem],
        compress: bool,
    ) -> Result<CopyAcceptance, GatewayError>;

    /// Best-effort cancellation of an in-flight transfer.
    async fn cancel_transfer(
        &self,
        agent_id: AgentId,
        transfer_id: &str,
        session: &str,
    ) -> Result<(), GatewayError>;

    /// Version + latency probe.
    async fn version(&self, agent_id: AgentId, session: &str) -> VersionReport;
}
