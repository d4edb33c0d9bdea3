// Copyright (c) 2026 Crossdock Maintainers
// SPDX-License-Identifier: AGPL-3.0
//! Trust negotiation: the handshake that turns a host/port/secret draft
//! into a registered agent.
//!
//! State machine per attempt, terminal on first failure:
//! 1. validate input (empty secret rejected before any network call),
//! 2. resolve the delegated identity bound to the shared secret,
//! 3. exchange keys (success flag required in the body, not just a 200),
//! 4. commit — clear the secret, stamp owner and delegated identity,
//!    persist.
//!
//! No partial record is ever persisted: every remote call is single-attempt
//! and failure aborts the whole operation. A remote `401` means the caller
//! may not register against that instance, so it surfaces as a local `403`.

use std::sync::Arc;

use tracing::info;

use crate::application::directory::{AgentDirectory, DirectoryError};
use crate::domain::agent::{Agent, AgentError, AgentPatch, RemoteUser, PLACEHOLDER_TOKEN};
use crate::domain::gateway::{AgentGateway, GatewayError};
use crate::domain::user::{Password, User};

#[derive(Debug, thiserror::Error)]
pub enum NegotiationError {
    #[error(transparent)]
    Invalid(#[from] AgentError),

    /// Remote refused authorization; the caller is not allowed to register
    /// against that instance.
    #[error("{0}")]
    Forbidden(String),

    #[error(transparent)]
    Gateway(GatewayError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

/// Remote 401s are an authorization verdict on the caller, not a system
/// fault; everything else passes through.
fn demote_unauthorized(err: GatewayError) -> NegotiationError {
    match err {
        GatewayError::Remote { status: 401, message } => NegotiationError::Forbidden(message),
        other => NegotiationError::Gateway(other),
    }
}

pub struct TrustNegotiator {
    gateway: Arc<dyn AgentGateway>,
    directory: Arc<AgentDirectory>,
}

impl TrustNegotiator {
    pub fn new(gateway: Arc<dyn AgentGateway>, directory: Arc<AgentDirectory>) -> Self {
        Self { gateway, directory }
    }

    /// Run the full handshake for a registration draft and persist the
    /// resulting agent. The draft's secret is consumed; it is empty in the
    /// returned record and everywhere downstream.
    pub async fn register(
        &self,
        owner: &User,
        mut draft: Agent,
        session: &str,
    ) -> Result<Agent, NegotiationError> {
        draft.validate()?;
        if draft.secret.is_empty() {
            return Err(AgentError::EmptySecret.into());
        }

        let secret = draft.secret.take();

        let token_user = self
            .gateway
            .token_user(owner.id, &draft.host, &draft.port, secret.expose(), session)
            .await
            .map_err(demote_unauthorized)?;

        self.gateway
            .exchange_keys(owner.id, &draft.host, &draft.port, secret.expose(), session)
            .await
            .map_err(demote_unauthorized)?;

        draft.owner_id = owner.id;
        draft.remote_user = RemoteUser {
            id: token_user.id,
            name: token_user.name,
            token: PLACEHOLDER_TOKEN.to_string(),
        };

        self.directory.save(&mut draft).await?;

        info!(
            agent = %draft.id,
            address = %draft.address(),
            remote_user = draft.remote_user.id,
            "registered agent"
        );
        Ok(draft)
    }

    /// Re-resolve the delegated identity of an existing agent from a
    /// name/password login. The password is consumed here and never stored.
    pub async fn login(
        &self,
        agent: &mut Agent,
        name: String,
        mut password: Password,
        session: &str,
    ) -> Result<(), NegotiationError> {
        let password = password.take();

        let resolved = self
            .gateway
            .remote_login(
                agent.owner_id,
                &agent.host,
                &agent.port,
                &name,
                &password,
                session,
            )
            .await
            .map_err(demote_unauthorized)?;

        let remote_user = RemoteUser {
            id: resolved.id,
            name,
            token: resolved.token,
        };
        self.directory
            .update(agent, &AgentPatch::remote_user(remote_user.clone()))
            .await?;
        agent.remote_user = remote_user;

        info!(agent = %agent.id, remote_user = agent.remote_user.id, "resolved delegated identity");
        Ok(())
    }
}
