// Copyright (c) 2026 Crossdock Maintainers
// SPDX-License-Identifier: AGPL-3.0
//! In-memory [`AgentRepository`] used by the development server and tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::domain::agent::{Agent, AgentId, AgentPatch, Lookup};
use crate::domain::repository::{AgentRepository, RepositoryError};

#[derive(Default)]
pub struct InMemoryAgentRepository {
    agents: RwLock<HashMap<u32, Agent>>,
    next_id: AtomicU32,
}

impl InMemoryAgentRepository {
    pub fn new() -> Self {
        Self {
            agents: RwLock::new(HashMap::new()),
            next_id: AtomicU32::new(1),
        }
    }
}

#[async_trait]
impl AgentRepository for InMemoryAgentRepository {
    async fn find(&self, lookup: &Lookup) -> Result<Option<Agent>, RepositoryError> {
        let agents = self.agents.read();
        let found = match lookup {
            Lookup::ById(id) => agents.get(&id.0).cloned(),
            Lookup::ByHost(host) => agents.values().find(|a| &a.host == host).cloned(),
        };
        Ok(found)
    }

    async fn list_all(&self) -> Result<Vec<Agent>, RepositoryError> {
        Ok(self.agents.read().values().cloned().collect())
    }

    async fn find_by_owner(&self, owner_id: u32) -> Result<Vec<Agent>, RepositoryError> {
        Ok(self
            .agents
            .read()
            .values()
            .filter(|a| a.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn save(&self, agent: &mut Agent) -> Result<(), RepositoryError> {
        let mut agents = self.agents.write();

        if agent.id.is_assigned() && agents.contains_key(&agent.id.0) {
            return Err(RepositoryError::AlreadyExists);
        }
        // One trust relationship per host.
        if agents
            .values()
            .any(|a| a.host == agent.host && a.id != agent.id)
        {
            return Err(RepositoryError::AlreadyExists);
        }

        if !agent.id.is_assigned() {
            agent.id = AgentId(self.next_id.fetch_add(1, Ordering::Relaxed));
        }
        agents.insert(agent.id.0, agent.clone());
        Ok(())
    }

    async fn update(
        &self,
        id: AgentId,
        agent: &Agent,
        patch: &AgentPatch,
    ) -> Result<(), RepositoryError> {
        let mut agents = self.agents.write();
        let stored = agents.get_mut(&id.0).ok_or(RepositoryError::NotFound)?;

        if patch.is_empty() {
            let mut replacement = agent.clone();
            replacement.id = id;
            *stored = replacement;
        } else {
            patch.apply(stored);
        }
        Ok(())
    }

    async fn delete(&self, id: AgentId) -> Result<(), RepositoryError> {
        match self.agents.write().remove(&id.0) {
            Some(_) => Ok(()),
            None => Err(RepositoryError::NotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::agent::RemoteUser;

    fn agent(host: &str) -> Agent {
        Agent {
            host: host.into(),
            port: "8080".into(),
            owner_id: 1,
            ..Agent::default()
        }
    }

    #[tokio::test]
    async fn save_assigns_sequential_ids() {
        let repo = InMemoryAgentRepository::new();
        let mut first = agent("alpha.example");
        let mut second = agent("beta.example");
        repo.save(&mut first).await.unwrap();
        repo.save(&mut second).await.unwrap();
        assert_eq!(first.id, AgentId(1));
        assert_eq!(second.id, AgentId(2));
    }

    #[tokio::test]
    async fn save_rejects_duplicate_host() {
        let repo = InMemoryAgentRepository::new();
        repo.save(&mut agent("alpha.example")).await.unwrap();
        let err = repo.save(&mut agent("alpha.example")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::AlreadyExists));
    }

    #[tokio::test]
    async fn find_by_host_and_by_id_agree() {
        let repo = InMemoryAgentRepository::new();
        let mut stored = agent("alpha.example");
        repo.save(&mut stored).await.unwrap();

        let by_id = repo.find(&Lookup::ById(stored.id)).await.unwrap().unwrap();
        let by_host = repo
            .find(&Lookup::ByHost("alpha.example".into()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_id.id, by_host.id);
    }

    #[tokio::test]
    async fn patched_update_touches_only_patched_fields() {
        let repo = InMemoryAgentRepository::new();
        let mut stored = agent("alpha.example");
        repo.save(&mut stored).await.unwrap();

        let patch = AgentPatch::remote_user(RemoteUser {
            id: 9,
            name: "io".into(),
            token: "x.0".into(),
        });
        repo.update(stored.id, &stored, &patch).await.unwrap();

        let after = repo.find(&Lookup::ById(stored.id)).await.unwrap().unwrap();
        assert_eq!(after.remote_user.id, 9);
        assert_eq!(after.host, "alpha.example");
    }

    #[tokio::test]
    async fn empty_patch_replaces_the_whole_record() {
        let repo = InMemoryAgentRepository::new();
        let mut stored = agent("alpha.example");
        repo.save(&mut stored).await.unwrap();

        let mut replacement = stored.clone();
        replacement.port = "9090".into();
        repo.update(stored.id, &replacement, &AgentPatch::default())
            .await
            .unwrap();

        let after = repo.find(&Lookup::ById(stored.id)).await.unwrap().unwrap();
        assert_eq!(after.port, "9090");
    }

    #[tokio::test]
    async fn delete_missing_agent_is_not_found() {
        let repo = InMemoryAgentRepository::new();
        let err = repo.delete(AgentId(42)).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }
}
