// Copyright (c) 2026 Crossdock Maintainers
// SPDX-License-Identifier: AGPL-3.0
//! Current-user context and the seams to the out-of-scope account backend.
//!
//! User management, password storage and login strategies live outside this
//! core; handlers consume an already-authenticated [`User`] resolved from
//! the session cookie by a [`SessionVerifier`].

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    #[serde(default)]
    pub admin: bool,
    #[serde(default)]
    pub modify: bool,
}

/// A local end user as seen by this core. `password_hash` is the stored
/// credential consulted by [`verify_password`]; it never leaves the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct User {
    pub id: u32,
    pub username: String,
    /// Storage scope relative to the server root. `.` means "no scope".
    #[serde(default)]
    pub scope: String,
    #[serde(default)]
    pub perm: Permissions,
    #[serde(skip)]
    pub password_hash: String,
}

impl User {
    /// Scope normalised for path composition (`.` collapses to empty).
    pub fn effective_scope(&self) -> &str {
        if self.scope == "." {
            ""
        } else {
            &self.scope
        }
    }
}

/// Write-once password carried inside a request body. Taken exactly once,
/// cleared afterwards, redacted from `Debug`, never serialized.
#[derive(Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct Password(String);

impl Password {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consumes the password, leaving the slot empty.
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.0)
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

/// Constant-time credential comparison. Lengths are compared first; equal
/// lengths fall through to a constant-time byte comparison.
pub fn verify_password(candidate: &str, stored: &str) -> bool {
    candidate.as_bytes().ct_eq(stored.as_bytes()).into()
}

#[derive(Debug, thiserror::Error)]
pub enum UserStoreError {
    #[error("user store error: {0}")]
    Backend(String),
}

/// Interface to the external account backend.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_by_id(&self, id: u32) -> Result<Option<User>, UserStoreError>;

    async fn get_by_name(&self, name: &str) -> Result<Option<User>, UserStoreError>;
}

/// Resolves the `rc_auth` session cookie into the current user. Concrete
/// strategies (header-based, OIDC, no-auth) are external collaborators.
#[async_trait]
pub trait SessionVerifier: Send + Sync {
    async fn user_for_session(&self, token: &str) -> Option<User>;
}

/// Access-rule hook consulted for every source and destination path of a
/// copy operation. The full rules engine is an external collaborator.
pub trait RuleChecker: Send + Sync {
    fn check(&self, user: &User, path: &str) -> bool;
}

/// Permissive default used when no rules engine is wired in.
pub struct AllowAll;

impl RuleChecker for AllowAll {
    fn check(&self, _user: &User, _path: &str) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_take_clears_the_slot() {
        let mut password = Password::new("opensesame");
        assert_eq!(password.take(), "opensesame");
        assert!(password.is_empty());
        assert_eq!(format!("{password:?}"), "Password(***)");
    }

    #[test]
    fn verify_password_matches_exactly() {
        assert!(verify_password("s3cret", "s3cret"));
        assert!(!verify_password("s3cret", "s3cret "));
        assert!(!verify_password("", "s3cret"));
    }

    #[test]
    fn dot_scope_collapses() {
        let user = User {
            scope: ".".into(),
            ..User::default()
        };
        assert_eq!(user.effective_scope(), "");
    }
}
