// Copyright (c) 2026 Crossdock Maintainers
// SPDX-License-Identifier: AGPL-3.0
//! Filesystem access probes used by copy validation.
//!
//! Copy validation asks three questions about resolved, scope-prefixed
//! paths: can the acting identity read the source, write into the
//! destination directory, and does the destination already exist. The
//! production implementation lives in `crate::infrastructure::probe`.

use std::path::Path;

pub trait AccessProbe: Send + Sync {
    fn readable(&self, path: &Path) -> bool;

    fn writable(&self, path: &Path) -> bool;

    fn exists(&self, path: &Path) -> bool;
}
