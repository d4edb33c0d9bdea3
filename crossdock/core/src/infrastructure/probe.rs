// Copyright (c) 2026 Crossdock Maintainers
// SPDX-License-Identifier: AGPL-3.0
//! [`AccessProbe`] backed by the `access(2)` syscall.
//!
//! `access` checks against the real UID, which matches the deployment model
//! here: the server runs as the user whose files it manages. Paths that
//! cannot be represented as a C string are reported inaccessible.

use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use crate::domain::fs::AccessProbe;

pub struct UnixAccessProbe;

fn access(path: &Path, mode: libc::c_int) -> bool {
    let Ok(c_path) = CString::new(path.as_os_str().as_bytes()) else {
        return false;
    };
    // Safety: c_path is a valid NUL-terminated string for the duration of
    // the call.
    unsafe { libc::access(c_path.as_ptr(), mode) == 0 }
}

impl AccessProbe for UnixAccessProbe {
    fn readable(&self, path: &Path) -> bool {
        access(path, libc::R_OK)
    }

    fn writable(&self, path: &Path) -> bool {
        access(path, libc::W_OK)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}
