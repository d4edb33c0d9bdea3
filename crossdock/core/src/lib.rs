// Copyright (c) 2026 Crossdock Maintainers
// SPDX-License-Identifier: AGPL-3.0
//! Crossdock core.
//!
//! Implements the agent trust & remote-transfer protocol: registration and
//! key exchange with remote instances, delegated identity resolution,
//! resource inspection across the trust boundary, copy orchestration with
//! conflict policy, cancellation, and progress notification.
//!
//! # Architecture
//!
//! - **domain** — aggregates, value types and the traits that seam this
//!   core off from its external collaborators (user store, rules engine,
//!   filesystem, persistence).
//! - **application** — the services: agent directory, trust negotiation,
//!   delegated session issuance, copy orchestration, progress registry.
//! - **infrastructure** — the reqwest agent-transport gateway and the
//!   in-memory repository/user-store implementations.
//! - **presentation** — the axum HTTP surface.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
