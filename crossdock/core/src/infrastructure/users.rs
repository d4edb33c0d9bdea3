// Copyright (c) 2026 Crossdock Maintainers
// SPDX-License-Identifier: AGPL-3.0
//! Fixed user directory for development deployments and tests.
//!
//! Production deployments implement [`UserStore`] and [`SessionVerifier`]
//! against their real account backend; this one is seeded at startup and
//! tracks sessions in memory.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::domain::user::{SessionVerifier, User, UserStore, UserStoreError};

pub struct StaticUserDirectory {
    by_id: HashMap<u32, User>,
    by_name: HashMap<String, u32>,
    sessions: RwLock<HashMap<String, u32>>,
}

impl StaticUserDirectory {
    pub fn new(users: Vec<User>) -> Self {
        let by_name = users.iter().map(|u| (u.username.clone(), u.id)).collect();
        let by_id = users.into_iter().map(|u| (u.id, u)).collect();
        Self {
            by_id,
            by_name,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Binds a session cookie value to a user for later resolution.
    pub fn register_session(&self, token: impl Into<String>, user_id: u32) {
        self.sessions.write().insert(token.into(), user_id);
    }
}

#[async_trait]
impl UserStore for StaticUserDirectory {
    async fn get_by_id(&self, id: u32) -> Result<Option<User>, UserStoreError> {
        Ok(self.by_id.get(&id).cloned())
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<User>, UserStoreError> {
        Ok(self
            .by_name
            .get(name)
            .and_then(|id| self.by_id.get(id))
            .cloned())
    }
}

#[async_trait]
impl SessionVerifier for StaticUserDirectory {
    async fn user_for_session(&self, token: &str) -> Option<User> {
        let user_id = *self.sessions.read().get(token)?;
        self.by_id.get(&user_id).cloned()
    }
}
