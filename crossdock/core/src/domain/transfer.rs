// Copyright (c) 2026 Crossdock Maintainers
// SPDX-License-Identifier: AGPL-3.0
//! Transfers: single-use opaque identifiers and the item batches they move.
//!
//! A transfer exists only for the duration of a copy operation and any open
//! progress channel; it has no storage. The ID doubles as the archive base
//! name on the remote side.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque single-use transfer identifier. Freshly generated per attempt;
/// resubmitting the same logical copy produces a new ID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransferId(String);

impl TransferId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The archive base name: the ID trimmed of any stray whitespace.
    pub fn archive_name(&self) -> &str {
        self.0.trim()
    }
}

impl Default for TransferId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One source/destination pair of a copy batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceItem {
    pub source: String,
    pub destination: String,
    #[serde(default)]
    pub overwrite: bool,
    #[serde(default)]
    pub keep: bool,
}

/// Action discriminator for the source-side resource PATCH.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyAction {
    RemoteCopy,
    /// Declared but unimplemented; handlers answer 501.
    RemoteRename,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown action: {0}")]
pub struct UnknownAction(pub String);

impl FromStr for CopyAction {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "remote-copy" => Ok(CopyAction::RemoteCopy),
            "remote-rename" => Ok(CopyAction::RemoteRename),
            other => Err(UnknownAction(other.to_string())),
        }
    }
}
