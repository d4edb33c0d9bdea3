// Copyright (c) 2026 Crossdock Maintainers
// SPDX-License-Identifier: AGPL-3.0
//! Persistence contract for the `Agent` aggregate.
//!
//! The durable entity store itself is an external collaborator; this trait
//! is the seam. Implementations: `InMemoryAgentRepository`
//! (`crate::infrastructure::repositories`) for development and tests, a
//! database-backed store in production deployments.

use async_trait::async_trait;

use crate::domain::agent::{Agent, AgentId, AgentPatch, Lookup};

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("agent not found")]
    NotFound,

    #[error("agent already exists")]
    AlreadyExists,

    #[error("storage error: {0}")]
    Storage(String),
}

#[async_trait]
pub trait AgentRepository: Send + Sync {
    /// Find one agent by ID or by host.
    async fn find(&self, lookup: &Lookup) -> Result<Option<Agent>, RepositoryError>;

    /// List every registered agent.
    async fn list_all(&self) -> Result<Vec<Agent>, RepositoryError>;

    /// List the agents registered by one local user.
    async fn find_by_owner(&self, owner_id: u32) -> Result<Vec<Agent>, RepositoryError>;

    /// Persist a new agent, assigning its ID.
    async fn save(&self, agent: &mut Agent) -> Result<(), RepositoryError>;

    /// Apply a typed partial update to an existing agent. An empty patch
    /// rewrites the whole record.
    async fn update(&self, id: AgentId, agent: &Agent, patch: &AgentPatch)
        -> Result<(), RepositoryError>;

    /// Delete an agent by ID.
    async fn delete(&self, id: AgentId) -> Result<(), RepositoryError>;
}
