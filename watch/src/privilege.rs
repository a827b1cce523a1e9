// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

//! Scoped effective-privilege elevation, addressing the REDESIGN FLAGS note
//! on the C original's brittle `seteuid(0); ...; seteuid(getuid());`
//! pairing in `facund_has_update`
//! (`original_source/trunk/backend/facund-comms.c`).
//! [`EffectivePrivilege::raise`] returns a guard whose `Drop` always
//! restores the caller's prior effective uid, even if the guarded work
//! returns early or panics.

use log::warn;
use nix::unistd::{geteuid, seteuid, Uid};

/// Holds the process at an elevated effective uid until dropped.
pub struct EffectivePrivilege {
    restore_to: Uid,
}

impl EffectivePrivilege {
    /// Raises the effective uid to `target`, no-op if already there.
    pub fn raise(target: Uid) -> Result<EffectivePrivilege, nix::Error> {
        let restore_to = geteuid();
        if restore_to != target {
            seteuid(target)?;
        }
        Ok(EffectivePrivilege { restore_to })
    }

    /// Raises to the saved-set id, 0 for this daemon -- the only elevation
    /// target spec §5 names (the watcher's stat/readlink sequence and the
    /// service-restart subprocess).
    pub fn raise_saved_set() -> Result<EffectivePrivilege, nix::Error> {
        EffectivePrivilege::raise(Uid::from_raw(0))
    }
}

impl Drop for EffectivePrivilege {
    fn drop(&mut self) {
        if geteuid() != self.restore_to {
            if let Err(e) = seteuid(self.restore_to) {
                warn!("failed to drop effective privilege back to {}: {e}", self.restore_to);
            }
        }
    }
}
