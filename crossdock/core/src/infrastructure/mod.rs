// Copyright (c) 2026 Crossdock Maintainers
// SPDX-License-Identifier: AGPL-3.0

pub mod gateway;
pub mod probe;
pub mod repositories;
pub mod users;
