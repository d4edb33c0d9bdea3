// Copyright (c) 2026 Crossdock Maintainers
// SPDX-License-Identifier: AGPL-3.0

pub mod copy;
pub mod directory;
pub mod negotiation;
pub mod progress;
pub mod session;
