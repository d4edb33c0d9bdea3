// Copyright (c) 2026 Crossdock Maintainers
// SPDX-License-Identifier: AGPL-3.0
//! HTTP surface: the local-facing API plus the internal endpoints the
//! remote side of the protocol calls back into.

pub mod agents;
pub mod api;
pub mod error;
pub mod internal;
pub mod resources;
pub mod sse;
pub mod transfers;
