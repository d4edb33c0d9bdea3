// Copyright (c) 2026 Crossdock Maintainers
// SPDX-License-Identifier: AGPL-3.0
//! Delegated session issuance, the remote side of the handshake.
//!
//! Issues short-lived opaque tokens scoped to one local user, so that
//! remote-to-remote calls never carry the end-user's primary session
//! cookie across instance boundaries, and resolves delegated identities
//! from either a token or a name/password pair. Password verification is
//! constant time.
//!
//! The HTTP endpoints fronting this service are additionally guarded by an
//! internal-host check (see `presentation::internal`).

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::domain::user::{verify_password, Password, User, UserStore, UserStoreError};

/// Lifetime of a temporary access token.
pub const TOKEN_TTL_SECONDS: i64 = 300;

#[derive(Debug, Clone, serde::Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub valid_until: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("invalid or expired access token")]
    InvalidToken,

    #[error("invalid credentials")]
    BadCredentials,

    #[error(transparent)]
    Store(#[from] UserStoreError),
}

struct TokenEntry {
    user_id: u32,
    expires_at: DateTime<Utc>,
}

pub struct SessionIssuer {
    users: Arc<dyn UserStore>,
    tokens: Mutex<HashMap<String, TokenEntry>>,
}

impl SessionIssuer {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self {
            users,
            tokens: Mutex::new(HashMap::new()),
        }
    }

    /// Issue a fresh token scoped to the given user. Expired entries are
    /// purged lazily on every issuance.
    pub fn issue(&self, user: &User) -> IssuedToken {
        let expires_at = Utc::now() + Duration::seconds(TOKEN_TTL_SECONDS);
        let token = Uuid::new_v4().simple().to_string();

        let mut tokens = self.tokens.lock();
        tokens.retain(|_, entry| entry.expires_at > Utc::now());
        tokens.insert(
            token.clone(),
            TokenEntry {
                user_id: user.id,
                expires_at,
            },
        );
        debug!(user = user.id, "issued temporary access token");

        IssuedToken {
            token,
            valid_until: expires_at.timestamp(),
        }
    }

    /// Resolve the user a valid token is scoped to.
    pub async fn token_user(&self, token: &str) -> Result<User, SessionError> {
        let user_id = {
            let tokens = self.tokens.lock();
            match tokens.get(token) {
                Some(entry) if entry.expires_at > Utc::now() => entry.user_id,
                _ => return Err(SessionError::InvalidToken),
            }
        };

        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(SessionError::InvalidToken)
    }

    /// Verify a name/password pair under the authority of a valid access
    /// token. The password is consumed and compared in constant time.
    pub async fn verify_credentials(
        &self,
        name: &str,
        mut password: Password,
        access_token: &str,
    ) -> Result<User, SessionError> {
        {
            let tokens = self.tokens.lock();
            match tokens.get(access_token) {
                Some(entry) if entry.expires_at > Utc::now() => {}
                _ => return Err(SessionError::InvalidToken),
            }
        }

        let candidate = password.take();
        let user = self
            .users
            .get_by_name(name)
            .await?
            .ok_or(SessionError::BadCredentials)?;

        if !verify_password(&candidate, &user.password_hash) {
            return Err(SessionError::BadCredentials);
        }

        Ok(user)
    }

    /// Drop a token before its natural expiry.
    pub fn revoke(&self, token: &str) {
        self.tokens.lock().remove(token);
    }
}
