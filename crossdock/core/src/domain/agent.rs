// Copyright (c) 2026 Crossdock Maintainers
// SPDX-License-Identifier: AGPL-3.0
//! The `Agent` aggregate: one trusted remote instance, owned by exactly one
//! local user.
//!
//! The shared `Secret` used during the handshake is never persisted: every
//! path that stores or returns an agent runs [`Agent::scrub`] first, so the
//! at-rest invariant holds even if a backend briefly stored one.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Numeric agent identifier, assigned by the repository on first save.
/// Zero means "not yet persisted".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentId(pub u32);

impl AgentId {
    pub const UNASSIGNED: AgentId = AgentId(0);

    pub fn is_assigned(&self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Write-once shared credential used only during the handshake.
///
/// Never serialized, never logged; `Debug` renders a redaction marker.
#[derive(Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Consumes the secret, leaving the slot empty.
    pub fn take(&mut self) -> Secret {
        std::mem::take(self)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.0.is_empty() { "Secret(empty)" } else { "Secret(***)" })
    }
}

/// The delegated identity resolved on the remote side during negotiation.
///
/// `token` holds the opaque delegated credential; after a successful
/// handshake it is stamped with [`PLACEHOLDER_TOKEN`] in lieu of a real
/// password, which is write-once-use and never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteUser {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub token: String,
}

impl RemoteUser {
    /// An agent is only usable for remote operations once its delegated
    /// identity has been resolved.
    pub fn is_resolved(&self) -> bool {
        self.id != 0
    }
}

/// Transient identity returned by the remote token-user endpoint during
/// registration. Folded into the owning agent's `RemoteUser` on success,
/// discarded on failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenUser {
    pub id: u32,
    pub name: String,
}

/// Value stamped into `RemoteUser::token` once the real password has been
/// exchanged and discarded.
pub const PLACEHOLDER_TOKEN: &str = "x.0";

/// A registered trust relationship with a remote instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Agent {
    #[serde(default)]
    pub id: AgentId,
    #[serde(default)]
    pub owner_id: u32,
    pub host: String,
    pub port: String,
    #[serde(default, skip_serializing)]
    pub secret: Secret,
    #[serde(default)]
    pub remote_user: RemoteUser,
}

impl Default for AgentId {
    fn default() -> Self {
        Self::UNASSIGNED
    }
}

/// Validation errors raised before anything touches storage or the network.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AgentError {
    #[error("empty host")]
    EmptyHost,

    #[error("empty port")]
    EmptyPort,

    #[error("empty agent secret")]
    EmptySecret,
}

impl Agent {
    /// Checks the required fields and clears the secret; the storage-facing
    /// counterpart of the old field-list `Clean` routine.
    pub fn scrub(&mut self) -> Result<(), AgentError> {
        self.validate()?;
        self.secret.clear();
        Ok(())
    }

    pub fn validate(&self) -> Result<(), AgentError> {
        if self.host.is_empty() {
            return Err(AgentError::EmptyHost);
        }
        if self.port.is_empty() {
            return Err(AgentError::EmptyPort);
        }
        Ok(())
    }

    /// `host:port` address of the remote instance, for logging.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Typed partial update for an agent record. Only the populated fields are
/// validated and written; an empty patch is equivalent to a full save.
#[derive(Debug, Clone, Default)]
pub struct AgentPatch {
    pub host: Option<String>,
    pub port: Option<String>,
    pub remote_user: Option<RemoteUser>,
}

impl AgentPatch {
    pub fn is_empty(&self) -> bool {
        self.host.is_none() && self.port.is_none() && self.remote_user.is_none()
    }

    pub fn remote_user(user: RemoteUser) -> Self {
        Self {
            remote_user: Some(user),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), AgentError> {
        if matches!(self.host.as_deref(), Some("")) {
            return Err(AgentError::EmptyHost);
        }
        if matches!(self.port.as_deref(), Some("")) {
            return Err(AgentError::EmptyPort);
        }
        Ok(())
    }

    pub fn apply(&self, agent: &mut Agent) {
        if let Some(host) = &self.host {
            agent.host = host.clone();
        }
        if let Some(port) = &self.port {
            agent.port = port.clone();
        }
        if let Some(user) = &self.remote_user {
            agent.remote_user = user.clone();
        }
    }
}

/// How to look an agent up in the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    ById(AgentId),
    ByHost(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Agent {
        Agent {
            id: AgentId(3),
            owner_id: 7,
            host: "peer.example".into(),
            port: "8080".into(),
            secret: Secret::new("hunter2"),
            remote_user: RemoteUser::default(),
        }
    }

    #[test]
    fn scrub_clears_secret() {
        let mut agent = sample();
        agent.scrub().unwrap();
        assert!(agent.secret.is_empty());
    }

    #[test]
    fn scrub_rejects_missing_required_fields() {
        let mut agent = sample();
        agent.host.clear();
        assert_eq!(agent.scrub(), Err(AgentError::EmptyHost));

        let mut agent = sample();
        agent.port.clear();
        assert_eq!(agent.scrub(), Err(AgentError::EmptyPort));
    }

    #[test]
    fn secret_is_never_serialized() {
        let agent = sample();
        let json = serde_json::to_value(&agent).unwrap();
        assert!(json.get("secret").is_none());
    }

    #[test]
    fn secret_debug_is_redacted() {
        let secret = Secret::new("hunter2");
        assert_eq!(format!("{secret:?}"), "Secret(***)");
    }

    #[test]
    fn patch_validates_only_populated_fields() {
        let patch = AgentPatch {
            host: Some(String::new()),
            ..AgentPatch::default()
        };
        assert_eq!(patch.validate(), Err(AgentError::EmptyHost));

        // Absent fields are not checked.
        let patch = AgentPatch::remote_user(RemoteUser {
            id: 5,
            name: "io".into(),
            token: PLACEHOLDER_TOKEN.into(),
        });
        assert!(patch.validate().is_ok());
    }

    #[test]
    fn remote_user_resolution_gate() {
        let mut agent = sample();
        assert!(!agent.remote_user.is_resolved());
        agent.remote_user.id = 12;
        assert!(agent.remote_user.is_resolved());
    }
}
