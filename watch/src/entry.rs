// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

//! One watched patch-database directory, grounded on `struct fbsd_update_db`
//! in `original_source/trunk/backend/facund-comms.c`. The C struct marks
//! its counters `volatile`; here they are `AtomicU32` so the watcher thread
//! and the RPC handler threads never observe a torn value without a lock
//! (spec §5: "atomicity is single-word updates").

use std::fs::File;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use crate::tag::TagLine;

/// Directory freebsd-update keeps its patch database under, relative to a
/// base directory.
const UPDATE_DATA_DIR: &str = "var/db/freebsd-update";

/// The counters are independent, single-word values with nothing else a
/// reader needs to synchronize against, so `Relaxed` is sufficient.
const COUNTER_ORDERING: Ordering = Ordering::Relaxed;

/// A configured base directory and the live state of its patch database.
pub struct WatchEntry {
    /// User-facing path prefix, e.g. `/` or `/usr/jails/foo`.
    pub base: String,
    /// `<base>/var/db/freebsd-update`.
    pub dir: PathBuf,
    /// `<dir>/tag`.
    pub tag_file: PathBuf,

    tag: Mutex<Option<TagLine>>,
    next_patch: AtomicU32,
    rollback_depth: AtomicU32,
}

impl WatchEntry {
    pub fn new(base: impl Into<String>) -> WatchEntry {
        let base = base.into();
        let dir = PathBuf::from(&base).join(UPDATE_DATA_DIR);
        let tag_file = dir.join("tag");
        WatchEntry {
            base,
            dir,
            tag_file,
            tag: Mutex::new(None),
            next_patch: AtomicU32::new(0),
            rollback_depth: AtomicU32::new(0),
        }
    }

    pub fn next_patch(&self) -> u32 {
        self.next_patch.load(COUNTER_ORDERING)
    }

    pub fn rollback_depth(&self) -> u32 {
        self.rollback_depth.load(COUNTER_ORDERING)
    }

    /// The most recently parsed tag file's patch level, or `None` if no
    /// tag has ever parsed successfully.
    pub fn tag_patch(&self) -> Option<u32> {
        self.tag.lock().unwrap().as_ref().map(|t| t.patch)
    }

    /// The most recently parsed tag file's release string, or `None`.
    pub fn tag_release(&self) -> Option<String> {
        self.tag.lock().unwrap().as_ref().map(|t| t.release.clone())
    }

    pub fn has_tag(&self) -> bool {
        self.tag.lock().unwrap().is_some()
    }

    pub(crate) fn set_tag(&self, tag: Option<TagLine>) {
        *self.tag.lock().unwrap() = tag;
    }

    pub(crate) fn set_next_patch(&self, value: u32) {
        self.next_patch.store(value, COUNTER_ORDERING);
    }

    pub(crate) fn set_rollback_depth(&self, value: u32) {
        self.rollback_depth.store(value, COUNTER_ORDERING);
    }

    /// Opens a read-only handle on `dir`, used by the kqueue path to
    /// register a `VNODE` filter.
    pub fn open_dir_handle(&self) -> std::io::Result<File> {
        File::open(&self.dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_dir_and_tag_file_from_base() {
        let entry = WatchEntry::new("/");
        assert_eq!(entry.dir, PathBuf::from("/var/db/freebsd-update"));
        assert_eq!(entry.tag_file, PathBuf::from("/var/db/freebsd-update/tag"));
    }

    #[test]
    fn counters_start_at_zero_and_no_tag() {
        let entry = WatchEntry::new("/");
        assert_eq!(entry.next_patch(), 0);
        assert_eq!(entry.rollback_depth(), 0);
        assert!(!entry.has_tag());
        assert_eq!(entry.tag_patch(), None);
    }

    #[test]
    fn counters_are_independently_settable() {
        let entry = WatchEntry::new("/");
        entry.set_next_patch(7);
        entry.set_rollback_depth(3);
        assert_eq!(entry.next_patch(), 7);
        assert_eq!(entry.rollback_depth(), 3);
    }
}
