// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

//! `list_updates`/`list_installed`, grounded on `facund_call_list_updates`/
//! `facund_call_list_installed` in
//! `original_source/trunk/backend/facund-comms.c`.

use facund_object::{Object, Response, ResponseCode};
use facund_watch::WatchEntry;

use super::area::parse_type_directory;

/// Builds the `[base, [patch_id, ...]]` response array, or `None` if no
/// requested base directory had anything to report -- an empty result
/// renders no body at all (matching the C original freeing the array and
/// returning a `NULL` value rather than an empty one).
fn build_response(id: Option<String>, pairs: Vec<(String, Vec<String>)>) -> Response {
    if pairs.is_empty() {
        return Response::new(id, ResponseCode::SUCCESS, "Success", None).unwrap();
    }

    let mut args = Object::new_array();
    for (base, patch_ids) in pairs {
        let mut pair = Object::new_array();

        let mut base_obj = Object::new_string();
        base_obj.set_string(base).unwrap();
        pair.array_append(base_obj).unwrap();

        let mut updates = Object::new_array();
        for patch_id in patch_ids {
            let mut item = Object::new_string();
            item.set_string(patch_id).unwrap();
            updates.array_append(item).unwrap();
        }
        pair.array_append(updates).unwrap();

        args.array_append(pair).unwrap();
    }
    Response::new(id, ResponseCode::SUCCESS, "Success", Some(args)).unwrap()
}

pub fn list_updates(
    id: Option<String>,
    arg: Option<&Object>,
    entries: &[WatchEntry],
    release: &str,
) -> Response {
    let Some(arg) = arg else {
        return Response::new(id, ResponseCode::GENERIC_FAILURE, "No data sent", None).unwrap();
    };

    let (_areas, dirs) = match parse_type_directory(arg) {
        Ok(parsed) => parsed,
        Err(msg) => return Response::new(id, ResponseCode::GENERIC_FAILURE, msg, None).unwrap(),
    };

    let mut pairs = Vec::new();
    for dir in dirs {
        let Some(entry) = entries.iter().find(|e| e.base == dir) else {
            continue;
        };
        let next_patch = entry.next_patch();
        if next_patch == 0 {
            continue;
        }
        pairs.push((dir, vec![format!("{release}-p{next_patch}")]));
    }

    build_response(id, pairs)
}

/// `level(i) = tag.patch - i + 1 - (1 if next_patch > 0 else 0)`, computed
/// with an `i64` intermediate and clamped at 0 -- resolves the unsigned
/// underflow the original's `unsigned int level -= rollback_pos - 1` can hit
/// when the rollback chain is longer than the tag's patch level (see
/// DESIGN.md).
fn rollback_patch_level(tag_patch: u32, next_patch: u32, rollback_index: u32) -> u32 {
    let mut level = tag_patch as i64 - rollback_index as i64 + 1;
    if next_patch > 0 {
        level -= 1;
    }
    level.max(0) as u32
}

pub fn list_installed(
    id: Option<String>,
    arg: Option<&Object>,
    entries: &[WatchEntry],
    release: &str,
) -> Response {
    let Some(arg) = arg else {
        return Response::new(id, ResponseCode::GENERIC_FAILURE, "No data sent", None).unwrap();
    };

    let (_areas, dirs) = match parse_type_directory(arg) {
        Ok(parsed) => parsed,
        Err(msg) => return Response::new(id, ResponseCode::GENERIC_FAILURE, msg, None).unwrap(),
    };

    let mut pairs = Vec::new();
    for dir in dirs {
        let Some(entry) = entries.iter().find(|e| e.base == dir) else {
            continue;
        };
        let rollback_depth = entry.rollback_depth();
        if rollback_depth == 0 {
            continue;
        }
        let tag_patch = entry.tag_patch().unwrap_or(0);
        let next_patch = entry.next_patch();

        let patch_ids = (0..rollback_depth)
            .map(|i| format!("{release}-p{}", rollback_patch_level(tag_patch, next_patch, i)))
            .collect();
        pairs.push((dir, patch_ids));
    }

    build_response(id, pairs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_level_saturates_instead_of_underflowing() {
        assert_eq!(rollback_patch_level(2, 0, 5), 0);
        assert_eq!(rollback_patch_level(7, 9, 0), 7);
        assert_eq!(rollback_patch_level(7, 0, 1), 7);
    }

    #[test]
    fn list_updates_skips_bases_with_nothing_to_install() {
        // a freshly constructed entry has next_patch = 0 until a refresh runs
        let entries = vec![WatchEntry::new("/")];
        let mut arg = Object::new_array();
        let mut area = Object::new_string();
        area.set_string("base").unwrap();
        arg.array_append(area).unwrap();
        let mut dirs = Object::new_string();
        dirs.set_string("/").unwrap();
        arg.array_append(dirs).unwrap();

        let resp = list_updates(Some("1".into()), Some(&arg), &entries, "13.2-RELEASE");
        assert_eq!(resp.code(), ResponseCode::SUCCESS);
        assert!(resp.value().is_none());
    }
}
