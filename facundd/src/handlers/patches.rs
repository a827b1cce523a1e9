// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

//! `install_patches`/`rollback_patches`, grounded on
//! `facund_call_install_patches`/`facund_call_rollback_patches`/
//! `facund_run_update` in
//! `original_source/trunk/backend/facund-comms.c`.

use std::process::Command;

use log::warn;

use facund_object::{Object, ObjectType, Response, ResponseCode};
use facund_watch::WatchEntry;

const FREEBSD_UPDATE: &str = "/usr/sbin/freebsd-update";

/// Parses the shared `[base_dir, patches]` argument
/// (`facund_read_directory_patchlevel`).
fn parse_directory_patchlevel(obj: &Object) -> Result<(String, Vec<String>), &'static str> {
    if obj.kind() != ObjectType::Array || obj.array_size() != 2 {
        return Err("Bad data sent");
    }
    let dir = obj.get_array_item(0).ok_or("Bad data sent")?;
    if dir.kind() != ObjectType::String {
        return Err("Bad data sent");
    }

    let patches_obj = obj.get_array_item(1).ok_or("Bad data sent")?;
    let patches = match patches_obj.kind() {
        ObjectType::String => vec![patches_obj.get_string().to_string()],
        ObjectType::Array => {
            if patches_obj.array_size() == 0 {
                return Err("Bad data sent");
            }
            patches_obj
                .array_iter()
                .map(|item| item.get_string().to_string())
                .collect()
        }
        _ => return Err("Bad data sent"),
    };

    Ok((dir.get_string().to_string(), patches))
}

/// Runs `/usr/sbin/freebsd-update -b <base> <command>`, returning whether
/// the tool exited successfully.
fn run_update(command: &str, base_dir: &str) -> bool {
    let status = Command::new(FREEBSD_UPDATE)
        .arg("-b")
        .arg(base_dir)
        .arg(command)
        .status();

    match status {
        Ok(status) => status.success(),
        Err(e) => {
            warn!("could not execute {FREEBSD_UPDATE}: {e}");
            false
        }
    }
}

fn dispatch(
    id: Option<String>,
    arg: Option<&Object>,
    entries: &[WatchEntry],
    command: &str,
    success_message: &str,
    failure_message: &str,
) -> Response {
    let Some(arg) = arg else {
        return Response::new(id, ResponseCode::GENERIC_FAILURE, "No data sent", None).unwrap();
    };

    let (base_dir, patches) = match parse_directory_patchlevel(arg) {
        Ok(parsed) => parsed,
        Err(msg) => return Response::new(id, ResponseCode::GENERIC_FAILURE, msg, None).unwrap(),
    };

    if !entries.iter().any(|e| e.base == base_dir) {
        return Response::new(id, ResponseCode::GENERIC_FAILURE, "Incorrect directory", None).unwrap();
    }

    if patches.first().map(String::as_str) != Some("base") {
        return Response::new(id, ResponseCode::GENERIC_FAILURE, "Unsupported patch", None).unwrap();
    }

    if run_update(command, &base_dir) {
        Response::new(id, ResponseCode::SUCCESS, success_message, None).unwrap()
    } else {
        Response::new(id, ResponseCode::GENERIC_FAILURE, failure_message, None).unwrap()
    }
}

pub fn install_patches(id: Option<String>, arg: Option<&Object>, entries: &[WatchEntry]) -> Response {
    dispatch(
        id,
        arg,
        entries,
        "install",
        "All updates installed",
        "Some updates failed to install",
    )
}

pub fn rollback_patches(id: Option<String>, arg: Option<&Object>, entries: &[WatchEntry]) -> Response {
    dispatch(
        id,
        arg,
        entries,
        "rollback",
        "Success",
        "Some patches failed to rollback",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn string(s: &str) -> Object {
        let mut o = Object::new_string();
        o.set_string(s).unwrap();
        o
    }

    #[test]
    fn unsupported_patch_is_rejected_before_running_anything() {
        let entries = vec![WatchEntry::new("/")];
        let mut arg = Object::new_array();
        arg.array_append(string("/")).unwrap();
        arg.array_append(string("p7")).unwrap();

        let resp = install_patches(Some("1".into()), Some(&arg), &entries);
        assert_eq!(resp.code(), ResponseCode::GENERIC_FAILURE);
        assert_eq!(resp.message(), "Unsupported patch");
    }

    #[test]
    fn unknown_directory_is_rejected() {
        let entries = vec![WatchEntry::new("/")];
        let mut arg = Object::new_array();
        arg.array_append(string("/usr/jails/other")).unwrap();
        arg.array_append(string("base")).unwrap();

        let resp = install_patches(Some("1".into()), Some(&arg), &entries);
        assert_eq!(resp.code(), ResponseCode::GENERIC_FAILURE);
        assert_eq!(resp.message(), "Incorrect directory");
    }
}
