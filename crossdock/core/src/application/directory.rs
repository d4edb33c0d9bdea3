// Copyright (c) 2026 Crossdock Maintainers
// SPDX-License-Identifier: AGPL-3.0
//! Agent Directory: the durable record store for trust relationships.
//!
//! Wraps the pluggable [`AgentRepository`] and enforces the persisted-secret
//! invariant on every path in and out: agents are scrubbed before they are
//! saved and again as they are returned, so a secret never survives at rest
//! even if a backend briefly stored one.
//!
//! Also keeps an in-memory last-modified timestamp per agent ID as a
//! best-effort change hint for callers; the backing store stays the source
//! of truth.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;

use crate::domain::agent::{Agent, AgentError, AgentId, AgentPatch, Lookup};
use crate::domain::repository::{AgentRepository, RepositoryError};

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error(transparent)]
    Invalid(#[from] AgentError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

pub struct AgentDirectory {
    repo: Arc<dyn AgentRepository>,
    updated: RwLock<HashMap<u32, i64>>,
}

impl AgentDirectory {
    pub fn new(repo: Arc<dyn AgentRepository>) -> Self {
        Self {
            repo,
            updated: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get(&self, lookup: &Lookup) -> Result<Agent, DirectoryError> {
        let mut agent = self
            .repo
            .find(lookup)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        agent.scrub()?;
        Ok(agent)
    }

    pub async fn get_all(&self) -> Result<Vec<Agent>, DirectoryError> {
        let mut agents = self.repo.list_all().await?;
        for agent in &mut agents {
            agent.scrub()?;
        }
        Ok(agents)
    }

    pub async fn find_by_owner(&self, owner_id: u32) -> Result<Vec<Agent>, DirectoryError> {
        let mut agents = self.repo.find_by_owner(owner_id).await?;
        for agent in &mut agents {
            agent.scrub()?;
        }
        agents.sort_by_key(|a| a.id.0);
        Ok(agents)
    }

    pub async fn save(&self, agent: &mut Agent) -> Result<(), DirectoryError> {
        agent.scrub()?;
        self.repo.save(agent).await?;
        Ok(())
    }

    pub async fn update(&self, agent: &Agent, patch: &AgentPatch) -> Result<(), DirectoryError> {
        if patch.is_empty() {
            agent.validate()?;
        } else {
            patch.validate()?;
        }

        self.repo.update(agent.id, agent, patch).await?;
        self.touch(agent.id);
        Ok(())
    }

    pub async fn delete(&self, id: AgentId) -> Result<(), DirectoryError> {
        self.repo.delete(id).await?;
        self.updated.write().remove(&id.0);
        Ok(())
    }

    /// Unix timestamp of the last update seen for this agent, 0 if none.
    pub fn last_update(&self, id: AgentId) -> i64 {
        self.updated.read().get(&id.0).copied().unwrap_or(0)
    }

    fn touch(&self, id: AgentId) {
        self.updated.write().insert(id.0, Utc::now().timestamp());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::agent::{RemoteUser, Secret, PLACEHOLDER_TOKEN};
    use crate::infrastructure::repositories::InMemoryAgentRepository;

    fn directory() -> AgentDirectory {
        AgentDirectory::new(Arc::new(InMemoryAgentRepository::new()))
    }

    fn draft(host: &str) -> Agent {
        Agent {
            owner_id: 1,
            host: host.into(),
            port: "8080".into(),
            secret: Secret::new("swordfish"),
            remote_user: RemoteUser {
                id: 4,
                name: "remote".into(),
                token: PLACEHOLDER_TOKEN.into(),
            },
            ..Agent::default()
        }
    }

    #[tokio::test]
    async fn secret_is_empty_after_save_and_get() {
        let dir = directory();
        let mut agent = draft("peer-a");
        dir.save(&mut agent).await.unwrap();
        assert!(agent.secret.is_empty());
        assert!(agent.id.is_assigned());

        let fetched = dir.get(&Lookup::ById(agent.id)).await.unwrap();
        assert!(fetched.secret.is_empty());

        for listed in dir.get_all().await.unwrap() {
            assert!(listed.secret.is_empty());
        }
    }

    #[tokio::test]
    async fn save_rejects_empty_host_or_port() {
        let dir = directory();
        let mut agent = draft("");
        assert!(matches!(
            dir.save(&mut agent).await,
            Err(DirectoryError::Invalid(AgentError::EmptyHost))
        ));

        let mut agent = draft("peer-a");
        agent.port.clear();
        assert!(matches!(
            dir.save(&mut agent).await,
            Err(DirectoryError::Invalid(AgentError::EmptyPort))
        ));
    }

    #[tokio::test]
    async fn find_by_owner_sorts_by_id() {
        let dir = directory();
        for host in ["peer-c", "peer-a", "peer-b"] {
            let mut agent = draft(host);
            dir.save(&mut agent).await.unwrap();
        }
        let agents = dir.find_by_owner(1).await.unwrap();
        let ids: Vec<u32> = agents.iter().map(|a| a.id.0).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
        assert_eq!(ids.len(), 3);
    }

    #[tokio::test]
    async fn update_touches_last_update() {
        let dir = directory();
        let mut agent = draft("peer-a");
        dir.save(&mut agent).await.unwrap();
        assert_eq!(dir.last_update(agent.id), 0);

        let patch = AgentPatch {
            port: Some("9090".into()),
            ..AgentPatch::default()
        };
        dir.update(&agent, &patch).await.unwrap();
        assert!(dir.last_update(agent.id) > 0);

        let fetched = dir.get(&Lookup::ById(agent.id)).await.unwrap();
        assert_eq!(fetched.port, "9090");
    }

    #[tokio::test]
    async fn lookup_by_host() {
        let dir = directory();
        let mut agent = draft("peer-x");
        dir.save(&mut agent).await.unwrap();

        let found = dir.get(&Lookup::ByHost("peer-x".into())).await.unwrap();
        assert_eq!(found.id, agent.id);

        let missing = dir.get(&Lookup::ByHost("peer-y".into())).await;
        assert!(matches!(
            missing,
            Err(DirectoryError::Repository(RepositoryError::NotFound))
        ));
    }
}
