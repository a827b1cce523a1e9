// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

//! Background patch-database watcher, grounded on
//! `original_source/trunk/backend/facund-comms.c` (`facund_has_update`,
//! `look_for_updates`) and `facund-be.c` (`struct fbsd_update_db`).

mod entry;
mod error;
mod privilege;
mod refresh;
mod scheduler;
mod tag;

pub use entry::WatchEntry;
pub use error::Error;
pub use privilege::EffectivePrivilege;
pub use refresh::refresh;
pub use scheduler::{Watcher, DEFAULT_CHECK_PERIOD};
pub use tag::TagLine;
