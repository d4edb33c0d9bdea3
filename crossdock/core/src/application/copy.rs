// Copyright (c) 2026 Crossdock Maintainers
// SPDX-License-Identifier: AGPL-3.0
//! Copy orchestration: the algorithmic core.
//!
//! Two cooperating phases. The source side validates a batch of
//! source/destination items against access rules and readability probes,
//! generates the single-use transfer ID and hands the batch to the remote
//! copy-acceptance endpoint. The destination side re-validates against its
//! own rules, writability, conflict policy and modify permission, then
//! returns the scoped root the extraction phase should use — re-read at
//! acceptance time, never cached.
//!
//! Validation strictly precedes any remote call or filesystem mutation, and
//! the first failing item aborts the whole batch.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use percent_encoding::percent_decode_str;
use tracing::info;

use crate::domain::agent::Agent;
use crate::domain::fs::AccessProbe;
use crate::domain::gateway::{AgentGateway, GatewayError};
use crate::domain::transfer::{CopyAction, ResourceItem, TransferId};
use crate::domain::user::{RuleChecker, User};

/// Prefix the browsing frontend leaves on source paths; stripped before
/// the readability probe.
const FILES_PREFIX: &str = "/files";

#[derive(Debug, thiserror::Error)]
pub enum CopyError {
    #[error("invalid path encoding: {0}")]
    BadEncoding(String),

    #[error("access denied to {0}")]
    Denied(String),

    #[error("cannot read {0}")]
    Unreadable(String),

    #[error("cannot write into {0}")]
    Unwritable(String),

    #[error("destination already exists: {0}")]
    Conflict(String),

    #[error("action not implemented")]
    NotImplemented,

    /// Remote rejected the batch at application level (non-zero code
    /// despite a 2xx status); the remote message is relayed.
    #[error("{message}")]
    Rejected { message: String },

    #[error(transparent)]
    Gateway(GatewayError),
}

/// Remote 401s mean insufficient trust, not missing auth.
fn demote_unauthorized(err: GatewayError) -> CopyError {
    match err {
        GatewayError::Remote { status: 401, message } => CopyError::Denied(message),
        other => CopyError::Gateway(other),
    }
}

/// Outcome of a dispatched remote copy: the freshly generated transfer ID
/// plus the remote acceptance message.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CopyReceipt {
    pub transfer_id: TransferId,
    pub message: String,
}

pub struct CopyOrchestrator {
    gateway: Arc<dyn AgentGateway>,
    probe: Arc<dyn AccessProbe>,
    rules: Arc<dyn RuleChecker>,
    root: String,
}

impl CopyOrchestrator {
    pub fn new(
        gateway: Arc<dyn AgentGateway>,
        probe: Arc<dyn AccessProbe>,
        rules: Arc<dyn RuleChecker>,
        root: impl Into<String>,
    ) -> Self {
        Self {
            gateway,
            probe,
            rules,
            root: root.into(),
        }
    }

    /// Source-side phase: validate the batch, then dispatch it to the
    /// remote instance under a fresh transfer ID.
    pub async fn source_copy(
        &self,
        user: &User,
        agent: &Agent,
        action: CopyAction,
        mut items: Vec<ResourceItem>,
        compress: bool,
        session: &str,
    ) -> Result<CopyReceipt, CopyError> {
        self.validate_source(user, &mut items)?;

        match action {
            CopyAction::RemoteCopy => {
                let transfer_id = TransferId::new();
                let source_root = self.scoped_root(user);

                let acceptance = self
                    .gateway
                    .remote_copy(
                        agent.id,
                        transfer_id.archive_name(),
                        &source_root,
                        session,
                        &items,
                        compress,
                    )
                    .await
                    .map_err(demote_unauthorized)?;

                if acceptance.code != 0 {
                    return Err(CopyError::Rejected {
                        message: acceptance.message,
                    });
                }

                info!(
                    agent = %agent.id,
                    transfer = %transfer_id,
                    items = items.len(),
                    compress,
                    "dispatched remote copy"
                );
                Ok(CopyReceipt {
                    transfer_id,
                    message: acceptance.message,
                })
            }
            // Declared stub: callers must not assume this does anything.
            CopyAction::RemoteRename => Err(CopyError::NotImplemented),
        }
    }

    /// Destination-side phase, invoked by the source side's copy-acceptance
    /// call. Returns the scoped root the extraction phase should use.
    pub fn accept_destination(
        &self,
        user: &User,
        items: &[ResourceItem],
    ) -> Result<String, CopyError> {
        for item in items {
            let dst = decode(&item.destination)?;

            if !self.rules.check(user, &dst) {
                return Err(CopyError::Denied(dst));
            }
            if dst == "/" {
                return Err(CopyError::Denied(dst));
            }

            let dir = parent_dir(&dst);
            if !self.probe.writable(&self.resolve(user, &dir)) {
                return Err(CopyError::Unwritable(dir));
            }

            if !item.overwrite && !item.keep && self.probe.exists(&self.resolve(user, &dst)) {
                return Err(CopyError::Conflict(dst));
            }

            if item.overwrite && !user.perm.modify {
                return Err(CopyError::Denied(dst));
            }
        }

        Ok(self.scoped_root(user))
    }

    /// Best-effort cancellation, addressed purely by transfer ID.
    pub async fn cancel(
        &self,
        agent: &Agent,
        transfer_id: &str,
        session: &str,
    ) -> Result<(), CopyError> {
        self.gateway
            .cancel_transfer(agent.id, transfer_id, session)
            .await
            .map_err(demote_unauthorized)?;
        info!(agent = %agent.id, transfer = transfer_id, "cancelled transfer");
        Ok(())
    }

    fn validate_source(&self, user: &User, items: &mut [ResourceItem]) -> Result<(), CopyError> {
        for item in items.iter_mut() {
            let src = decode(&item.source)?;
            // Destinations travel decoded; sources keep their original
            // encoding for the remote side.
            item.destination = decode(&item.destination)?;

            if !self.rules.check(user, &src) {
                return Err(CopyError::Denied(src));
            }
            if src == "/" {
                return Err(CopyError::Denied(src));
            }

            let probe_path = src.strip_prefix(FILES_PREFIX).unwrap_or(&src).to_string();
            if !self.probe.readable(&self.resolve(user, &probe_path)) {
                return Err(CopyError::Unreadable(src));
            }
        }
        Ok(())
    }

    fn scoped_root(&self, user: &User) -> String {
        format!("{}{}", self.root, user.effective_scope())
    }

    fn resolve(&self, user: &User, rel: &str) -> PathBuf {
        PathBuf::from(format!("{}{}{}", self.root, user.effective_scope(), rel))
    }
}

fn decode(raw: &str) -> Result<String, CopyError> {
    percent_decode_str(raw)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|_| CopyError::BadEncoding(raw.to_string()))
}

fn parent_dir(path: &str) -> String {
    match Path::new(path).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            parent.to_string_lossy().into_owned()
        }
        _ => "/".to_string(),
    }
}
