// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

//! The per-entry refresh procedure, grounded on `facund_has_update` in
//! `original_source/trunk/backend/facund-comms.c`.

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::entry::WatchEntry;
use crate::error::Error;
use crate::privilege::EffectivePrivilege;
use crate::tag::TagLine;

/// `lowercase-hex SHA-256 of (base + "\n")`, the filename fragment shared
/// by the install and rollback entry points (spec §4.5.1 step 2).
fn base_sum(base: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(base.as_bytes());
    hasher.update(b"\n");
    hex::encode(hasher.finalize())
}

/// Refreshes one entry's `next_patch`/`rollback_depth` counters in place.
/// Leaves the entry's prior state untouched on error (spec §7: "Watcher
/// refresh errors are local to one entry and one cycle").
pub fn refresh(entry: &WatchEntry) -> Result<(), Error> {
    if let Ok(contents) = fs::read_to_string(&entry.tag_file) {
        entry.set_tag(TagLine::parse_last(&contents));
    }

    let sum = base_sum(&entry.base);
    let _priv = EffectivePrivilege::raise_saved_set()?;

    let install_link = entry.dir.join(format!("{sum}-install"));
    let next_patch = if entry.has_tag() && is_symlink(&install_link) {
        entry.tag_patch().unwrap_or(0)
    } else {
        0
    };
    entry.set_next_patch(next_patch);

    let rollback_depth = walk_rollback_chain(&entry.dir, &sum)?;
    entry.set_rollback_depth(rollback_depth);

    Ok(())
}

fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false)
}

/// Walks `<dir>/<sum>-rollback`, then `<dir>/<target>/rollback`, ... while
/// each hop is a symlink, counting hops. A non-symlink or `ENOENT` ends the
/// walk cleanly; any other I/O error is fatal for this refresh (spec
/// §4.5.1 step 5).
fn walk_rollback_chain(dir: &Path, sum: &str) -> Result<u32, Error> {
    let mut current: PathBuf = dir.join(format!("{sum}-rollback"));
    let mut depth = 0u32;

    loop {
        let meta = match fs::symlink_metadata(&current) {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => break,
            Err(e) => return Err(e.into()),
        };
        if !meta.file_type().is_symlink() {
            break;
        }

        let target = fs::read_link(&current)?;
        depth += 1;
        current = dir.join(target).join("rollback");
    }

    Ok(depth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::symlink;

    fn make_base(root: &std::path::Path) -> (std::path::PathBuf, String) {
        let base = root.to_path_buf();
        let dir = base.join("var/db/freebsd-update");
        fs::create_dir_all(&dir).unwrap();
        let sum = base_sum(base.to_str().unwrap());
        (dir, sum)
    }

    fn write_tag(dir: &std::path::Path, patch: u32) {
        let line = format!(
            "freebsd-update|FreeBSD|13.2-RELEASE|{patch}|0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcd|2025-01-01\n"
        );
        fs::write(dir.join("tag"), line).unwrap();
    }

    #[test]
    fn no_install_link_means_zero_next_patch() {
        let tmp = tempfile::tempdir().unwrap();
        let entry = WatchEntry::new(tmp.path().to_str().unwrap());
        let (dir, _sum) = make_base(tmp.path());
        write_tag(&dir, 9);

        refresh(&entry).unwrap();
        assert_eq!(entry.next_patch(), 0);
    }

    #[test]
    fn install_link_present_reports_tag_patch() {
        let tmp = tempfile::tempdir().unwrap();
        let entry = WatchEntry::new(tmp.path().to_str().unwrap());
        let (dir, sum) = make_base(tmp.path());
        write_tag(&dir, 9);

        let target_dir = tmp.path().join("target");
        fs::create_dir_all(&target_dir).unwrap();
        symlink(&target_dir, dir.join(format!("{sum}-install"))).unwrap();

        refresh(&entry).unwrap();
        assert_eq!(entry.next_patch(), 9);
    }

    #[test]
    fn removing_install_link_drops_next_patch_back_to_zero() {
        let tmp = tempfile::tempdir().unwrap();
        let entry = WatchEntry::new(tmp.path().to_str().unwrap());
        let (dir, sum) = make_base(tmp.path());
        write_tag(&dir, 9);

        let link = dir.join(format!("{sum}-install"));
        let target_dir = tmp.path().join("target");
        fs::create_dir_all(&target_dir).unwrap();
        symlink(&target_dir, &link).unwrap();
        refresh(&entry).unwrap();
        assert_eq!(entry.next_patch(), 9);

        fs::remove_file(&link).unwrap();
        refresh(&entry).unwrap();
        assert_eq!(entry.next_patch(), 0);
    }

    #[test]
    fn rollback_chain_is_counted_until_enoent() {
        let tmp = tempfile::tempdir().unwrap();
        let entry = WatchEntry::new(tmp.path().to_str().unwrap());
        let (dir, sum) = make_base(tmp.path());
        write_tag(&dir, 9);

        // three-deep chain: <sum>-rollback -> step1/ -> step1/rollback -> step2/
        let step1 = dir.join("step1");
        let step2 = dir.join("step2");
        fs::create_dir_all(&step1).unwrap();
        fs::create_dir_all(&step2).unwrap();
        symlink(&step1, dir.join(format!("{sum}-rollback"))).unwrap();
        symlink(&step2, step1.join("rollback")).unwrap();
        // step2/rollback does not exist: chain ends here

        refresh(&entry).unwrap();
        assert_eq!(entry.rollback_depth(), 2);
    }

    #[test]
    fn no_rollback_link_means_zero_depth() {
        let tmp = tempfile::tempdir().unwrap();
        let entry = WatchEntry::new(tmp.path().to_str().unwrap());
        make_base(tmp.path());

        refresh(&entry).unwrap();
        assert_eq!(entry.rollback_depth(), 0);
    }
}
