// Copyright (c) 2026 Crossdock Maintainers
// SPDX-License-Identifier: AGPL-3.0

pub mod agent;
pub mod fs;
pub mod gateway;
pub mod repository;
pub mod transfer;
pub mod user;
