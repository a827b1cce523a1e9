// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

//! The running release string used to format patch ids, grounded on the
//! `uname`/`UNAME_r` handling in `original_source/trunk/backend/facund-be.c`'s
//! `main`.

use std::io;

/// Returns the running release (`uname -r`), overridden by `UNAME_r` when
/// set (spec §6).
pub fn current_release() -> Result<String, io::Error> {
    if let Ok(over_ride) = std::env::var("UNAME_r") {
        return Ok(over_ride);
    }

    let uts = nix::sys::utsname::uname()?;
    Ok(uts.release().to_string_lossy().into_owned())
}
